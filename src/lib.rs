//! # linekv - A Minimal Network Key-Value Store
//!
//! linekv keeps one in-memory table of byte-string keys and values and serves
//! it over TCP with a small, line-oriented subset of the Redis protocol. Only
//! two commands exist: `GET key` and `SET key value`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                             linekv                              │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐          │
//! │  │ Accept loop │───>│  Session    │───>│  Command    │          │
//! │  │ (server)    │    │ (per conn)  │    │  Handler    │          │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘          │
//! │                            │                  │                 │
//! │                            ▼                  ▼                 │
//! │                     ┌─────────────┐    ┌──────────────────────┐ │
//! │                     │  Protocol   │    │        Store         │ │
//! │                     │  decoder /  │    │ RwLock<HashMap<..>>  │ │
//! │                     │  replies    │    └──────────────────────┘ │
//! │                     └─────────────┘                             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//!
//! Requests come either inline (`PING\r\n`, the whole line is the command
//! name) or as multi-bulk (`*2\r\n$3\r\nGET\r\n$1\r\nk\r\n`). Replies are a
//! bulk value (`$5\r\nhello\r\n`), `+OK\r\n`, or `-ERR <message>\r\n`.
//!
//! ## Quick Start
//!
//! ```ignore
//! use linekv::connection::ConnectionStats;
//! use linekv::storage::Store;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(Store::new());
//!     let stats = Arc::new(ConnectionStats::new());
//!     let listener = TcpListener::bind("0.0.0.0:8080").await?;
//!
//!     linekv::server::serve(listener, store, stats).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`protocol`]: request decoding and reply encoding
//! - [`storage`]: the shared key-value table
//! - [`commands`]: `GET` / `SET` validation and execution
//! - [`connection`]: per-client session loop
//! - [`server`]: the accept loop

pub mod commands;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

pub use commands::{CommandError, CommandHandler};
pub use connection::{handle_connection, ConnectionError, ConnectionStats, Session};
pub use protocol::{read_command, Command, ParseError, ReadError, Reply};
pub use storage::Store;

/// The default port linekv listens on
pub const DEFAULT_PORT: u16 = 8080;

/// The default host linekv binds to (all interfaces)
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Version of linekv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
