//! Request Decoder
//!
//! Reads one command at a time from any buffered async reader. Two request
//! encodings are accepted, selectable per request:
//!
//! ```text
//! Inline:      PING\r\n                 (or just PING\n)
//!
//! Multi-bulk:  *3\r\n
//!              $3\r\nSET\r\n
//!              $1\r\nk\r\n
//!              $5\r\nhello\r\n
//! ```
//!
//! An inline line is taken verbatim as a command name with no arguments; it
//! is not split into words. A multi-bulk request declares its total argument
//! count (name included, must be at least 2) and then length-prefixes every
//! argument, so payloads are binary-safe.
//!
//! ## Outcomes
//!
//! - `Ok(Some(command))` - a full command was decoded
//! - `Ok(None)` - the stream ended cleanly before a new command started
//! - `Err(ReadError::Protocol(_))` - malformed framing, should be reported to the peer
//! - `Err(ReadError::Io(_))` - transport failure, including EOF inside a multi-bulk request

use crate::protocol::command::Command;
use crate::protocol::reply::prefix;
use bytes::{Bytes, BytesMut};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Largest argument payload accepted (512 MB)
pub const MAX_ARGUMENT_SIZE: usize = 512 * 1024 * 1024;

/// Upper bound on argument slots reserved up front from a declared count
const MAX_PREALLOCATED_ARGS: u64 = 1024;

/// Malformed request framing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// `*N` where N is not an unsigned integer or is at most 1
    #[error("invalid argument count: {0}")]
    InvalidArgumentCount(String),

    /// An argument block that does not start with `$`
    #[error("expected '$', got: {0}")]
    MissingLengthPrefix(String),

    /// `$L` where L is not an unsigned integer
    #[error("invalid argument length: {0}")]
    InvalidArgumentLength(String),

    /// `$L` with L above `MAX_ARGUMENT_SIZE`
    #[error("argument too large: {size} bytes (max: {max})")]
    ArgumentTooLarge { size: u64, max: usize },
}

/// Why a command could not be read.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Reads one logical line, without its terminator.
///
/// Buffered fragments are concatenated until a `\n` shows up, so lines may be
/// longer than the reader's buffer. The `\n` and a `\r` right before it are
/// dropped. Bytes left over when the stream ends form a final line; a stream
/// that ends with nothing pending yields `None`.
pub async fn read_line<R>(reader: &mut R) -> io::Result<Option<BytesMut>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = BytesMut::new();

    loop {
        let fragment = reader.fill_buf().await?;
        if fragment.is_empty() {
            return Ok((!line.is_empty()).then_some(line));
        }

        if let Some(pos) = fragment.iter().position(|&b| b == b'\n') {
            line.extend_from_slice(&fragment[..pos]);
            reader.consume(pos + 1);

            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }
            return Ok(Some(line));
        }

        // More data follows on this line
        let n = fragment.len();
        line.extend_from_slice(fragment);
        reader.consume(n);
    }
}

/// Reads and decodes the next command from `reader`.
pub async fn read_command<R>(reader: &mut R) -> Result<Option<Command>, ReadError>
where
    R: AsyncBufRead + Unpin,
{
    let line = match read_line(reader).await? {
        Some(line) => line,
        None => return Ok(None),
    };

    if line.first() != Some(&prefix::MULTI_BULK) {
        return Ok(Some(Command::inline(line.freeze())));
    }

    let count = &line[1..];
    let argc = parse_decimal(count)
        .filter(|&n| n > 1)
        .ok_or_else(|| ParseError::InvalidArgumentCount(lossy(count)))?;

    let name = read_argument(reader).await?;
    let mut args = Vec::with_capacity((argc - 1).min(MAX_PREALLOCATED_ARGS) as usize);
    for _ in 1..argc {
        args.push(read_argument(reader).await?);
    }

    Ok(Some(Command::new(name, args)))
}

/// Reads one `$L` line plus its payload and 2-byte terminator.
async fn read_argument<R>(reader: &mut R) -> Result<Bytes, ReadError>
where
    R: AsyncBufRead + Unpin,
{
    let line = read_line(reader)
        .await?
        .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;

    let digits = match line.split_first() {
        Some((&prefix::BULK, digits)) => digits,
        _ => return Err(ParseError::MissingLengthPrefix(lossy(&line)).into()),
    };

    let len = parse_decimal(digits)
        .ok_or_else(|| ParseError::InvalidArgumentLength(lossy(digits)))?;
    if len > MAX_ARGUMENT_SIZE as u64 {
        return Err(ParseError::ArgumentTooLarge {
            size: len,
            max: MAX_ARGUMENT_SIZE,
        }
        .into());
    }

    let len = len as usize;
    // The terminator is read and thrown away without checking it is CRLF.
    let mut payload = BytesMut::zeroed(len + 2);
    reader.read_exact(&mut payload).await?;
    payload.truncate(len);

    Ok(payload.freeze())
}

/// Parses an unsigned decimal with no sign and no surrounding whitespace.
fn parse_decimal(digits: &[u8]) -> Option<u64> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
