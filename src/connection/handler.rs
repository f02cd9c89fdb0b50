//! Connection Session
//!
//! Each accepted connection is served by one `Session` running in its own
//! task. The session owns the stream and loops until the peer hangs up or
//! something goes wrong.
//!
//! ## Lifecycle
//!
//! ```text
//!            ┌─────────────┐
//!  accept ──>│   Reading   │<───────────────────────┐
//!            └──────┬──────┘                        │
//!                   │ command                       │
//!                   ▼                               │
//!            ┌─────────────┐  unknown command       │
//!            │ Dispatching │──── -ERR ──────────────┤
//!            └──────┬──────┘                        │
//!                   │ reply                         │
//!                   ▼                               │
//!            ┌─────────────┐                        │
//!            │ Responding  │────────────────────────┘
//!            └─────────────┘
//!
//!  Reading:     EOF before a command   -> Closed(Clean), nothing sent
//!               protocol error         -> -ERR, Closed(Error)
//!               I/O error              -> logged, Closed(Error)
//!  Dispatching: GET/SET missing args   -> -ERR, Closed(Error)
//! ```
//!
//! `Session::run` returns `Ok(())` for a clean close and the classified
//! `ConnectionError` otherwise. The stream is dropped when `run` returns, on
//! every path.

use crate::commands::{CommandError, CommandHandler};
use crate::protocol::{read_command, ParseError, ReadError, Reply};
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, trace, warn};

/// Statistics shared by all sessions
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently open connections
    pub active_connections: AtomicU64,
    /// Commands decoded successfully
    pub commands_processed: AtomicU64,
    /// Requests rejected for malformed framing
    pub protocol_errors: AtomicU64,
    /// Total bytes written back to clients
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Why a session ended without a clean close.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Read or write failure; no reply was attempted
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed framing; an error reply was sent
    #[error("protocol error: {0}")]
    Protocol(ParseError),

    /// Fatal command validation failure; an error reply was sent
    #[error("command error: {0}")]
    Command(CommandError),
}

/// Serves one client connection.
///
/// Works over any established byte stream, not only TCP.
pub struct Session<S> {
    /// Connection sequence number, for logs
    id: u64,

    /// The client stream; reads are buffered, writes pass straight through
    stream: BufReader<S>,

    command_handler: CommandHandler,

    stats: Arc<ConnectionStats>,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        id: u64,
        stream: S,
        command_handler: CommandHandler,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        Self {
            id,
            stream: BufReader::new(stream),
            command_handler,
            stats,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Runs the session to completion and releases the stream.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        self.stats.connection_opened();
        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = self.id, "Disconnected"),
            Err(ConnectionError::Io(e)) => error!(client = self.id, error = %e, "Connection error"),
            Err(e) => debug!(client = self.id, error = %e, "Closing after error reply"),
        }

        self.stats.connection_closed();
        self.log_stats();
        result
    }

    fn log_stats(&self) {
        let store = self.command_handler.store().stats();
        debug!(
            client = self.id,
            accepted = self.stats.connections_accepted.load(Ordering::Relaxed),
            active = self.stats.active_connections.load(Ordering::Relaxed),
            commands = self.stats.commands_processed.load(Ordering::Relaxed),
            protocol_errors = self.stats.protocol_errors.load(Ordering::Relaxed),
            bytes_written = self.stats.bytes_written.load(Ordering::Relaxed),
            keys = store.keys,
            gets = store.gets,
            sets = store.sets,
            "Server stats"
        );
    }

    /// The read-dispatch-respond loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            let command = match read_command(&mut self.stream).await {
                Ok(Some(command)) => command,
                Ok(None) => return Ok(()),
                Err(ReadError::Protocol(e)) => {
                    self.stats.protocol_error();
                    self.send_error(&e).await?;
                    return Err(ConnectionError::Protocol(e));
                }
                Err(ReadError::Io(e)) => return Err(ConnectionError::Io(e)),
            };

            self.stats.command_processed();
            debug!(
                client = self.id,
                command = %command.name_lossy(),
                args = command.args.len(),
                "Received command"
            );

            match self.command_handler.execute(command) {
                Ok(reply) => self.send(&reply).await?,
                Err(e) => {
                    self.send_error(&e).await?;
                    if e.is_fatal() {
                        return Err(ConnectionError::Command(e));
                    }
                }
            }
        }
    }

    /// Logs an error message, then sends it as an error reply.
    async fn send_error(&mut self, err: &impl Display) -> Result<(), ConnectionError> {
        let message = err.to_string();
        warn!(client = self.id, "Error: {}", message);
        self.send(&Reply::Error(message)).await
    }

    async fn send(&mut self, reply: &Reply) -> Result<(), ConnectionError> {
        let bytes = reply.serialize();
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(bytes.len());
        trace!(client = self.id, bytes = bytes.len(), "Sent reply");
        Ok(())
    }
}

/// Runs a session for `stream` to completion.
///
/// The outcome has already been logged by the session, so it is dropped here.
pub async fn handle_connection<S>(
    id: u64,
    stream: S,
    command_handler: CommandHandler,
    stats: Arc<ConnectionStats>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let session = Session::new(id, stream, command_handler, stats);
    let _ = session.run().await;
}
