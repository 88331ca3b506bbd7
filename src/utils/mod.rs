//! Utility modules

pub mod error;
pub mod resp;

pub use error::{BenchmarkError, ConnectionError, FailureKind, ProtocolError, Result};
pub use resp::{append_command, Arg, RespDecoder, RespEncoder, RespValue};
