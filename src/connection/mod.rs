//! Connection Module
//!
//! Per-client sessions. Every accepted connection gets its own task running a
//! `Session`; sessions share nothing except the store (through their
//! `CommandHandler`) and the `ConnectionStats` counters.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Accept loop                             │
//! │                    (server.rs)                              │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │ accept(), id += 1, spawn
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Session #id                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │ read_command│───>│  execute    │───>│ send reply  │     │
//! │  └─────────────┘    └─────────────┘    └─────────────┘     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use linekv::connection::{handle_connection, ConnectionStats};
//! use linekv::commands::CommandHandler;
//! use linekv::storage::Store;
//! use std::sync::Arc;
//!
//! let store = Arc::new(Store::new());
//! let stats = Arc::new(ConnectionStats::new());
//!
//! let (stream, _addr) = listener.accept().await?;
//! let handler = CommandHandler::new(Arc::clone(&store));
//! tokio::spawn(handle_connection(1, stream, handler, stats));
//! ```

pub mod handler;

pub use handler::{handle_connection, ConnectionError, ConnectionStats, Session};
