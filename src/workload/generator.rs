//! Per-test command generation
//!
//! Every worker owns its own generator, so randomization needs no
//! synchronization.

use super::workload_type::WorkloadType;
use crate::utils::{Arg, RespEncoder};

pub const STRING_KEY: &str = "key:string";
pub const STRING_VALUE: &str = "val";
pub const GEO_KEY: &str = "key:geo";

/// Decimal places used for longitude/latitude arguments
pub const COORD_PRECISION: usize = 7;

/// Latitude bound accepted by the server's geo encoding
const MAX_LATITUDE: f64 = 85.0;

/// One command: a name and its arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: &'static str,
    pub args: Vec<Arg<'static>>,
}

impl Command {
    fn new(name: &'static str, args: Vec<Arg<'static>>) -> Self {
        Self { name, args }
    }

    /// Append this command to an encoder buffer
    pub fn encode_into(&self, encoder: &mut RespEncoder) {
        encoder.encode(self.name, &self.args);
    }
}

/// Command generator keyed by workload
pub enum CommandGenerator {
    Ping,
    Set,
    Get,
    GeoAdd { rng: fastrand::Rng },
    GeoRadius { rng: fastrand::Rng },
}

impl CommandGenerator {
    /// Build the generator for a workload.
    ///
    /// Without a seed the generator draws from entropy; with one the
    /// sequence is reproducible.
    pub fn new(workload: WorkloadType, seed: Option<u64>) -> Self {
        let rng = || match seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };

        match workload {
            WorkloadType::Ping => Self::Ping,
            WorkloadType::Set => Self::Set,
            WorkloadType::Get => Self::Get,
            WorkloadType::GeoAdd => Self::GeoAdd { rng: rng() },
            WorkloadType::GeoRadius => Self::GeoRadius { rng: rng() },
        }
    }

    /// Produce the next command
    pub fn next_command(&mut self) -> Command {
        match self {
            Self::Ping => Command::new("PING", Vec::new()),
            Self::Set => Command::new("SET", vec![Arg::Str(STRING_KEY), Arg::Str(STRING_VALUE)]),
            Self::Get => Command::new("GET", vec![Arg::Str(STRING_KEY)]),
            Self::GeoAdd { rng } => {
                let (lon, lat) = random_coordinates(rng);
                Command::new(
                    "GEOADD",
                    vec![
                        Arg::Str(GEO_KEY),
                        lon,
                        lat,
                        Arg::Int(rng.i64(0..=i64::MAX)),
                    ],
                )
            }
            Self::GeoRadius { rng } => {
                let (lon, lat) = random_coordinates(rng);
                Command::new(
                    "GEORADIUS",
                    vec![Arg::Str(GEO_KEY), lon, lat, Arg::Str("10"), Arg::Str("km")],
                )
            }
        }
    }
}

/// Longitude in [-180, 180), latitude in [-85, 85)
fn random_coordinates(rng: &mut fastrand::Rng) -> (Arg<'static>, Arg<'static>) {
    let lon = rng.f64() * 360.0 - 180.0;
    let lat = rng.f64() * (2.0 * MAX_LATITUDE) - MAX_LATITUDE;
    (
        Arg::Fixed {
            value: lon,
            precision: COORD_PRECISION,
        },
        Arg::Fixed {
            value: lat,
            precision: COORD_PRECISION,
        },
    )
}
