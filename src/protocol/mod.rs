//! Wire Protocol
//!
//! Line-oriented request/response framing, a small subset of RESP.
//!
//! ## Modules
//!
//! - `command`: the decoded `Command` type
//! - `parser`: async decoder for inline and multi-bulk requests
//! - `reply`: the `Reply` enum and its wire encoding
//!
//! ## Example
//!
//! ```
//! use linekv::protocol::{read_command, Command, Reply};
//! use bytes::Bytes;
//!
//! # tokio_test::block_on(async {
//! let mut input: &[u8] = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
//! let command = read_command(&mut input).await.unwrap().unwrap();
//! assert_eq!(command, Command::new("GET", vec![Bytes::from("name")]));
//!
//! let response = Reply::bulk(Bytes::from("blue"));
//! assert_eq!(response.serialize(), b"$4\r\nblue\r\n");
//! # });
//! ```

pub mod command;
pub mod parser;
pub mod reply;

pub use command::Command;
pub use parser::{read_command, read_line, ParseError, ReadError, MAX_ARGUMENT_SIZE};
pub use reply::Reply;
