//! Error types for redis-benchmark

use std::fmt;
use std::io;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum BenchmarkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Worker error: {0}")]
    Worker(String),
}

impl BenchmarkError {
    /// Classify a fatal worker error for result aggregation
    pub fn kind(&self) -> FailureKind {
        match self {
            BenchmarkError::Connection(ConnectionError::ConnectFailed { .. }) => {
                FailureKind::Connection
            }
            BenchmarkError::Connection(ConnectionError::AuthFailed(_)) => FailureKind::Auth,
            BenchmarkError::Connection(ConnectionError::Closed) => FailureKind::Io,
            BenchmarkError::Protocol(_) => FailureKind::Protocol,
            BenchmarkError::Io(_) => FailureKind::Io,
            BenchmarkError::Config(_) | BenchmarkError::Worker(_) => FailureKind::Worker,
        }
    }
}

/// Connection-related errors
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Failed to connect to {host}:{port}: {source}")]
    ConnectFailed {
        host: String,
        port: u16,
        source: io::Error,
    },

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Connection closed unexpectedly")]
    Closed,
}

/// RESP protocol errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid RESP type byte: 0x{0:02x}")]
    InvalidType(u8),

    #[error("Invalid length prefix: {0}")]
    InvalidLength(i64),

    #[error("Invalid integer in reply: {0:?}")]
    InvalidInteger(String),

    #[error("Reply line not terminated by CRLF")]
    MissingTerminator,

    #[error("Reply line exceeds {0} bytes")]
    LineTooLong(usize),

    #[error("Reply nesting exceeds {0} levels")]
    TooDeep(usize),

    #[error("Stream closed in the middle of a reply")]
    Truncated,
}

/// Category of a fatal worker error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Could not establish the connection
    Connection,
    /// AUTH rejected or unreadable
    Auth,
    /// Reply bytes did not follow RESP framing
    Protocol,
    /// Read/write failure or unexpected close
    Io,
    /// Thread spawn failure or panic
    Worker,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Connection => "connection",
            FailureKind::Auth => "auth",
            FailureKind::Protocol => "protocol",
            FailureKind::Io => "io",
            FailureKind::Worker => "worker",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Result<T> = std::result::Result<T, BenchmarkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kinds() {
        let connect = BenchmarkError::from(ConnectionError::ConnectFailed {
            host: "127.0.0.1".to_string(),
            port: 1,
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        });
        assert_eq!(connect.kind(), FailureKind::Connection);

        let auth = BenchmarkError::from(ConnectionError::AuthFailed("WRONGPASS".to_string()));
        assert_eq!(auth.kind(), FailureKind::Auth);

        let closed = BenchmarkError::from(ConnectionError::Closed);
        assert_eq!(closed.kind(), FailureKind::Io);

        let proto = BenchmarkError::from(ProtocolError::InvalidType(b'?'));
        assert_eq!(proto.kind(), FailureKind::Protocol);

        let io = BenchmarkError::from(io::Error::new(io::ErrorKind::TimedOut, "timeout"));
        assert_eq!(io.kind(), FailureKind::Io);
    }

    #[test]
    fn test_error_messages() {
        let err = BenchmarkError::from(ProtocolError::InvalidType(b'?'));
        assert_eq!(err.to_string(), "Protocol error: Invalid RESP type byte: 0x3f");
    }
}
