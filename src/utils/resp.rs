//! RESP (Redis Serialization Protocol) encoder and decoder
//!
//! Requests are always sent as arrays of bulk strings. Replies are read one
//! at a time from a buffered stream; `RespDecoder::read_one` frames a reply
//! without materializing it, which is what pipelined workers use to confirm
//! completion.

use std::io::{self, BufRead, Read};

use super::error::{BenchmarkError, ConnectionError, ProtocolError, Result};

/// Longest status/error/integer/header line accepted from a server
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Largest bulk payload accepted (matches the server-side default limit)
pub const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;

/// Maximum aggregate nesting depth
pub const MAX_DEPTH: usize = 512;

/// RESP value types
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    /// Simple string (+OK\r\n)
    SimpleString(String),
    /// Error (-ERR message\r\n)
    Error(String),
    /// Integer (:1000\r\n)
    Integer(i64),
    /// Bulk string ($6\r\nfoobar\r\n)
    BulkString(Vec<u8>),
    /// Null bulk string ($-1\r\n) or null array (*-1\r\n)
    Null,
    /// Array (*2\r\n...)
    Array(Vec<RespValue>),
}

impl RespValue {
    /// Get as string (for simple string or bulk string)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RespValue::SimpleString(s) => Some(s),
            RespValue::BulkString(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Get as array
    pub fn as_array(&self) -> Option<&[RespValue]> {
        match self {
            RespValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Short name of the reply type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            RespValue::SimpleString(_) => "simple string",
            RespValue::Error(_) => "error",
            RespValue::Integer(_) => "integer",
            RespValue::BulkString(_) => "bulk string",
            RespValue::Null => "null",
            RespValue::Array(_) => "array",
        }
    }
}

/// One command argument
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg<'a> {
    /// Literal text, sent as its UTF-8 bytes
    Str(&'a str),
    /// Integer rendered as decimal text
    Int(i64),
    /// Float rendered with a fixed number of decimals
    Fixed { value: f64, precision: usize },
}

/// Append one command to `buf` as a RESP array of bulk strings.
///
/// The array header counts the command name plus every argument. Length
/// prefixes are byte counts of the UTF-8 encoding.
pub fn append_command(buf: &mut Vec<u8>, name: &str, args: &[Arg<'_>]) {
    buf.push(b'*');
    write_int(buf, 1 + args.len() as i64);
    buf.extend_from_slice(b"\r\n");

    write_bulk(buf, name.as_bytes());
    for arg in args {
        match *arg {
            Arg::Str(s) => write_bulk(buf, s.as_bytes()),
            Arg::Int(value) => {
                let mut digits = itoa::Buffer::new();
                write_bulk(buf, digits.format(value).as_bytes());
            }
            Arg::Fixed { value, precision } => {
                let text = format!("{:.*}", precision, value);
                write_bulk(buf, text.as_bytes());
            }
        }
    }
}

#[inline]
fn write_bulk(buf: &mut Vec<u8>, data: &[u8]) {
    buf.push(b'$');
    write_int(buf, data.len() as i64);
    buf.extend_from_slice(b"\r\n");
    buf.extend_from_slice(data);
    buf.extend_from_slice(b"\r\n");
}

/// Write integer using fast itoa
#[inline]
fn write_int(buf: &mut Vec<u8>, value: i64) {
    let mut buffer = itoa::Buffer::new();
    buf.extend_from_slice(buffer.format(value).as_bytes());
}

/// RESP encoder with pre-allocated buffer
///
/// Workers keep one encoder per connection and clear it between batches so
/// a whole pipeline lands in a single contiguous write.
pub struct RespEncoder {
    buf: Vec<u8>,
}

impl RespEncoder {
    /// Create new encoder with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Clear buffer for reuse
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Get encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Encode a command with typed arguments
    pub fn encode(&mut self, name: &str, args: &[Arg<'_>]) {
        append_command(&mut self.buf, name, args);
    }

    /// Encode a command from string slices (first element is the name)
    pub fn encode_command_str(&mut self, parts: &[&str]) {
        if let Some((name, rest)) = parts.split_first() {
            let args: Vec<Arg<'_>> = rest.iter().map(|&s| Arg::Str(s)).collect();
            self.encode(name, &args);
        }
    }
}

/// RESP decoder for streaming reads
///
/// The decoder never reads past the end of the reply it is framing, so
/// consecutive calls walk a pipelined reply stream one reply at a time.
/// Nested arrays are tracked on a heap stack, so reply depth never grows
/// the thread stack.
pub struct RespDecoder<R> {
    reader: R,
    line_buf: Vec<u8>,
    /// Elements still owed by each open array, innermost last
    open_arrays: Vec<usize>,
}

impl<R: BufRead> RespDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_buf: Vec::with_capacity(256),
            open_arrays: Vec::new(),
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Consume exactly one reply, discarding its content.
    ///
    /// Returns the number of bytes the reply occupied on the wire.
    pub fn read_one(&mut self) -> Result<usize> {
        self.open_arrays.clear();
        let mut total = 0;

        loop {
            let line_len = self.read_line(total == 0)?;
            total += line_len;

            match self.line_buf[0] {
                b'+' | b'-' => {}
                b':' => {
                    self.line_int()?;
                }
                b'$' => {
                    if let Some(len) = self.bulk_len()? {
                        self.skip_payload(len)?;
                        total += len + 2;
                    }
                }
                b'*' => {
                    let depth = self.open_arrays.len();
                    if let Some(count) = self.array_len(depth)? {
                        if count > 0 {
                            self.open_arrays.push(count);
                            continue;
                        }
                    }
                }
                other => return Err(ProtocolError::InvalidType(other).into()),
            }

            // A value just ended; close every array it completes
            loop {
                let Some(left) = self.open_arrays.last_mut() else {
                    return Ok(total);
                };
                *left -= 1;
                if *left > 0 {
                    break;
                }
                self.open_arrays.pop();
            }
        }
    }

    /// Decode next RESP value from stream
    pub fn decode(&mut self) -> Result<RespValue> {
        let mut stack: Vec<(Vec<RespValue>, usize)> = Vec::new();

        loop {
            self.read_line(stack.is_empty())?;

            let mut value = match self.line_buf[0] {
                b'+' => RespValue::SimpleString(self.line_text()),
                b'-' => RespValue::Error(self.line_text()),
                b':' => RespValue::Integer(self.line_int()?),
                b'$' => match self.bulk_len()? {
                    None => RespValue::Null,
                    Some(len) => {
                        let mut data = vec![0u8; len];
                        self.reader.read_exact(&mut data).map_err(eof_as_truncated)?;
                        self.expect_crlf()?;
                        RespValue::BulkString(data)
                    }
                },
                b'*' => match self.array_len(stack.len())? {
                    None => RespValue::Null,
                    Some(0) => RespValue::Array(Vec::new()),
                    Some(count) => {
                        stack.push((Vec::with_capacity(count.min(1024)), count));
                        continue;
                    }
                },
                other => return Err(ProtocolError::InvalidType(other).into()),
            };

            // Attach the finished value to its parent, closing arrays as they fill
            loop {
                match stack.pop() {
                    None => return Ok(value),
                    Some((mut elements, count)) => {
                        elements.push(value);
                        if elements.len() < count {
                            stack.push((elements, count));
                            break;
                        }
                        value = RespValue::Array(elements);
                    }
                }
            }
        }
    }

    /// Read one CRLF-terminated line into `line_buf`, returning its length
    /// including the terminator.
    fn read_line(&mut self, at_boundary: bool) -> Result<usize> {
        self.line_buf.clear();
        let n = (&mut self.reader)
            .take(MAX_LINE_LEN as u64)
            .read_until(b'\n', &mut self.line_buf)?;

        if n == 0 {
            return Err(if at_boundary {
                ConnectionError::Closed.into()
            } else {
                ProtocolError::Truncated.into()
            });
        }

        if self.line_buf.last() != Some(&b'\n') {
            return Err(if n >= MAX_LINE_LEN {
                ProtocolError::LineTooLong(MAX_LINE_LEN).into()
            } else {
                ProtocolError::Truncated.into()
            });
        }

        if n < 3 || self.line_buf[n - 2] != b'\r' {
            // A bare "\r\n" has no type byte at all
            if n == 2 && self.line_buf[0] == b'\r' {
                return Err(ProtocolError::InvalidType(b'\r').into());
            }
            return Err(ProtocolError::MissingTerminator.into());
        }

        Ok(n)
    }

    /// Payload of the current status/error line
    fn line_text(&self) -> String {
        let content = &self.line_buf[1..self.line_buf.len() - 2];
        String::from_utf8_lossy(content).into_owned()
    }

    /// Parse the integer payload of the current line
    fn line_int(&self) -> Result<i64> {
        let content = &self.line_buf[1..self.line_buf.len() - 2];
        std::str::from_utf8(content)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| {
                ProtocolError::InvalidInteger(String::from_utf8_lossy(content).into_owned()).into()
            })
    }

    fn bulk_len(&self) -> Result<Option<usize>> {
        match self.line_int()? {
            -1 => Ok(None),
            len if !(0..=MAX_BULK_LEN).contains(&len) => {
                Err(ProtocolError::InvalidLength(len).into())
            }
            len => Ok(Some(len as usize)),
        }
    }

    fn array_len(&self, depth: usize) -> Result<Option<usize>> {
        match self.line_int()? {
            -1 => Ok(None),
            count if count < -1 => Err(ProtocolError::InvalidLength(count).into()),
            _ if depth >= MAX_DEPTH => Err(ProtocolError::TooDeep(MAX_DEPTH).into()),
            count => Ok(Some(count as usize)),
        }
    }

    fn skip_payload(&mut self, len: usize) -> Result<()> {
        let copied = io::copy(&mut (&mut self.reader).take(len as u64), &mut io::sink())?;
        if copied < len as u64 {
            return Err(ProtocolError::Truncated.into());
        }
        self.expect_crlf()
    }

    fn expect_crlf(&mut self) -> Result<()> {
        let mut crlf = [0u8; 2];
        self.reader.read_exact(&mut crlf).map_err(eof_as_truncated)?;
        if &crlf != b"\r\n" {
            return Err(ProtocolError::MissingTerminator.into());
        }
        Ok(())
    }
}

fn eof_as_truncated(err: io::Error) -> BenchmarkError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        ProtocolError::Truncated.into()
    } else {
        err.into()
    }
}
