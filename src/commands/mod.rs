//! Command Handler Module
//!
//! Sits between the protocol decoder and the store:
//!
//! ```text
//! ┌─────────────────┐
//! │  Parser         │  (protocol module)
//! └────────┬────────┘
//!          │ Command
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! │  - Validate     │
//! │  - Execute      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ Store           │  (storage module)
//! └─────────────────┘
//! ```
//!
//! Only `GET` and `SET` exist.

pub mod handler;

pub use handler::{CommandError, CommandHandler};
