//! Workload definitions and command generation

pub mod generator;
pub mod workload_type;

pub use generator::{Command, CommandGenerator};
pub use workload_type::WorkloadType;
