//! Raw TCP connection for benchmark traffic
//!
//! A connection is owned by exactly one worker. Requests are written
//! straight to the socket as one pre-encoded batch; replies are framed by a
//! `RespDecoder` sitting on a buffered reader over a clone of the socket.

use std::io::{self, BufReader, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::config::BenchmarkConfig;
use crate::utils::{ConnectionError, RespDecoder, RespEncoder, RespValue, Result};

const READ_BUF_SIZE: usize = 64 * 1024;

/// Raw connection wrapper
pub struct RawConnection {
    writer: TcpStream,
    decoder: RespDecoder<BufReader<TcpStream>>,
}

impl RawConnection {
    /// Create new TCP connection
    pub fn connect_tcp(
        host: &str,
        port: u16,
        connect_timeout: Duration,
    ) -> std::result::Result<Self, ConnectionError> {
        let connect_failed = |source: io::Error| ConnectionError::ConnectFailed {
            host: host.to_string(),
            port,
            source,
        };

        let addrs = (host, port).to_socket_addrs().map_err(connect_failed)?;

        // Try every resolved address, keep the last failure
        let mut last_err = io::Error::new(io::ErrorKind::NotFound, "No addresses found");
        let mut stream = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, connect_timeout) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => {
                    debug!("connect to {} failed: {}", addr, e);
                    last_err = e;
                }
            }
        }
        let stream = stream.ok_or_else(|| connect_failed(last_err))?;

        // Disable Nagle's algorithm
        stream.set_nodelay(true).ok();

        let reader = BufReader::with_capacity(
            READ_BUF_SIZE,
            stream.try_clone().map_err(connect_failed)?,
        );

        Ok(Self {
            writer: stream,
            decoder: RespDecoder::new(reader),
        })
    }

    /// Write an encoded batch and flush it in one go
    pub fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        self.writer.write_all(buf)?;
        self.writer.flush()
    }

    /// Consume one reply without materializing it, returning its wire size
    pub fn skip_reply(&mut self) -> Result<usize> {
        self.decoder.read_one()
    }

    /// Read a single RESP response
    pub fn read_response(&mut self) -> Result<RespValue> {
        self.decoder.decode()
    }

    /// Send command and receive response
    pub fn execute(&mut self, encoder: &RespEncoder) -> Result<RespValue> {
        self.send(encoder.as_bytes())?;
        self.read_response()
    }

    /// Send AUTH command
    pub fn authenticate(&mut self, password: &str) -> std::result::Result<(), ConnectionError> {
        let mut encoder = RespEncoder::with_capacity(64 + password.len());
        encoder.encode_command_str(&["AUTH", password]);

        let response = self
            .execute(&encoder)
            .map_err(|e| ConnectionError::AuthFailed(format!("no valid reply to AUTH: {}", e)))?;

        match response {
            RespValue::SimpleString(s) if s == "OK" => Ok(()),
            RespValue::Error(e) => Err(ConnectionError::AuthFailed(e)),
            RespValue::SimpleString(s) => Err(ConnectionError::AuthFailed(format!(
                "unexpected status reply: {}",
                s
            ))),
            other => Err(ConnectionError::AuthFailed(format!(
                "unexpected {} reply",
                other.type_name()
            ))),
        }
    }

    /// Set read timeout
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.decoder.get_ref().get_ref().set_read_timeout(timeout)
    }

    /// Set write timeout
    pub fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.writer.set_write_timeout(timeout)
    }

    /// Close both directions; errors are irrelevant at this point
    pub fn shutdown(self) {
        self.writer.shutdown(Shutdown::Both).ok();
    }
}

/// Connection factory for creating connections with common config
#[derive(Debug, Clone)]
pub struct ConnectionFactory {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl ConnectionFactory {
    pub fn from_config(config: &BenchmarkConfig) -> Self {
        Self {
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            read_timeout: Duration::from_millis(config.request_timeout_ms),
            write_timeout: Duration::from_millis(config.request_timeout_ms),
        }
    }

    /// Open a connection to host:port with socket timeouts applied.
    ///
    /// Authentication is left to the caller so it can be tracked as its own
    /// step.
    pub fn connect(
        &self,
        host: &str,
        port: u16,
    ) -> std::result::Result<RawConnection, ConnectionError> {
        let mut conn = RawConnection::connect_tcp(host, port, self.connect_timeout)?;

        // Zero durations are rejected by the socket API; treat them as "no timeout"
        conn.set_read_timeout(non_zero(self.read_timeout)).ok();
        conn.set_write_timeout(non_zero(self.write_timeout)).ok();

        Ok(conn)
    }
}

fn non_zero(timeout: Duration) -> Option<Duration> {
    if timeout.is_zero() {
        None
    } else {
        Some(timeout)
    }
}
