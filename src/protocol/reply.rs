//! Response Types
//!
//! The server only ever sends three shapes back to a client:
//!
//! - `$` Bulk: `$<length>\r\n<data>\r\n` (result of `GET`)
//! - `+` Status: always `+OK\r\n` (result of `SET`)
//! - `-` Error: `-ERR <message>\r\n`
//!
//! An unset key is answered with an empty bulk (`$0\r\n\r\n`), there is no
//! null reply.

use bytes::Bytes;
use std::fmt;

/// The CRLF terminator used on the wire
pub const CRLF: &[u8] = b"\r\n";

/// Line prefixes
pub mod prefix {
    pub const STATUS: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const BULK: u8 = b'$';
    pub const MULTI_BULK: u8 = b'*';
}

/// A response to be written to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Length-prefixed, binary-safe payload.
    Bulk(Bytes),

    /// The fixed `+OK` status line.
    Ok,

    /// An error line. Holds the message only; `ERR ` is added on the wire.
    /// CR and LF inside the message are sent as spaces.
    Error(String),
}

impl Reply {
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Reply::Bulk(data.into())
    }

    /// # Example
    /// ```
    /// use linekv::protocol::Reply;
    /// let err = Reply::error("unknown command: FOO");
    /// assert_eq!(err.serialize(), b"-ERR unknown command: FOO\r\n");
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Reply::Error(message.into())
    }

    /// Serializes the reply to its wire format.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the reply into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            Reply::Bulk(data) => {
                buf.push(prefix::BULK);
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                buf.extend_from_slice(data);
                buf.extend_from_slice(CRLF);
            }
            Reply::Ok => {
                buf.push(prefix::STATUS);
                buf.extend_from_slice(b"OK");
                buf.extend_from_slice(CRLF);
            }
            Reply::Error(message) => {
                buf.push(prefix::ERROR);
                buf.extend_from_slice(b"ERR ");
                // The message may echo client bytes and must stay on one line
                buf.extend(message.bytes().map(|b| match b {
                    b'\r' | b'\n' => b' ',
                    b => b,
                }));
                buf.extend_from_slice(CRLF);
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Bulk(data) => match std::str::from_utf8(data) {
                Ok(s) => write!(f, "\"{}\"", s),
                Err(_) => write!(f, "(binary data, {} bytes)", data.len()),
            },
            Reply::Ok => write!(f, "OK"),
            Reply::Error(message) => write!(f, "(error) ERR {}", message),
        }
    }
}
