//! Storage Module
//!
//! The in-memory table every connection reads from and writes to. There is
//! no persistence and no expiry: entries live until the process exits.

pub mod store;

pub use store::{Store, StoreStats};
