//! Command Dispatch
//!
//! Validates a decoded `Command` and runs it against the shared `Store`.
//! Command names are matched exactly (case-sensitive).
//!
//! | Command           | Needs      | Reply             | On bad arity        |
//! |-------------------|------------|-------------------|---------------------|
//! | `GET key`         | 1 argument | bulk (empty if unset) | error, connection closes |
//! | `SET key value`   | 2 arguments| `+OK`             | error, connection closes |
//! | anything else     |            | error             | connection stays open |
//!
//! Arguments beyond the ones a command uses are ignored.

use crate::protocol::{Command, Reply};
use crate::storage::Store;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

/// A command that was decoded fine but cannot be executed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// A known command with too few arguments
    #[error("{command} expects {expected}")]
    WrongArity {
        command: &'static str,
        expected: &'static str,
    },

    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

impl CommandError {
    /// Whether the connection must be closed after reporting this error.
    ///
    /// A short argument list leaves the session in an unknown state, so it
    /// ends; an unrecognized name is just answered and the session goes on.
    pub fn is_fatal(&self) -> bool {
        match self {
            CommandError::WrongArity { .. } => true,
            CommandError::UnknownCommand(_) => false,
        }
    }
}

/// Runs commands against the shared store.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    store: Arc<Store>,
}

impl CommandHandler {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Executes a command and returns the reply to send.
    pub fn execute(&self, command: Command) -> Result<Reply, CommandError> {
        match &command.name[..] {
            b"GET" => self.cmd_get(command),
            b"SET" => self.cmd_set(command),
            _ => Err(CommandError::UnknownCommand(command.name_lossy().into_owned())),
        }
    }

    /// GET key
    fn cmd_get(&self, command: Command) -> Result<Reply, CommandError> {
        let key = command.args.first().ok_or(CommandError::WrongArity {
            command: "GET",
            expected: "1 argument",
        })?;

        let value = self.store.get(key);
        trace!(key = ?key, len = value.len(), "GET");
        Ok(Reply::Bulk(value))
    }

    /// SET key value
    fn cmd_set(&self, command: Command) -> Result<Reply, CommandError> {
        let mut args = command.args.into_iter();
        let (key, value) = match (args.next(), args.next()) {
            (Some(key), Some(value)) => (key, value),
            _ => {
                return Err(CommandError::WrongArity {
                    command: "SET",
                    expected: "2 arguments",
                })
            }
        };

        trace!(key = ?key, len = value.len(), "SET");
        self.store.set(key, value);
        Ok(Reply::Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn handler() -> CommandHandler {
        CommandHandler::new(Arc::new(Store::new()))
    }

    fn cmd(name: &'static str, args: &[&'static str]) -> Command {
        Command::new(
            name,
            args.iter().map(|a| Bytes::from_static(a.as_bytes())).collect(),
        )
    }

    #[test]
    fn test_set_then_get() {
        let handler = handler();

        assert_eq!(handler.execute(cmd("SET", &["k", "hello"])), Ok(Reply::Ok));
        assert_eq!(
            handler.execute(cmd("GET", &["k"])),
            Ok(Reply::bulk("hello"))
        );
    }

    #[test]
    fn test_get_unset_returns_empty_bulk() {
        let handler = handler();
        assert_eq!(
            handler.execute(cmd("GET", &["never-set"])),
            Ok(Reply::Bulk(Bytes::new()))
        );
    }

    #[test]
    fn test_get_without_key() {
        let err = handler().execute(cmd("GET", &[])).unwrap_err();
        assert_eq!(err.to_string(), "GET expects 1 argument");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_set_without_value() {
        let handler = handler();

        let err = handler.execute(cmd("SET", &["k"])).unwrap_err();
        assert_eq!(err.to_string(), "SET expects 2 arguments");
        assert!(err.is_fatal());
        assert!(!handler.store().contains(b"k"));

        let err = handler.execute(cmd("SET", &[])).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_unknown_command() {
        let err = handler().execute(Command::inline("FOO")).unwrap_err();
        assert_eq!(err.to_string(), "unknown command: FOO");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let err = handler().execute(cmd("get", &["k"])).unwrap_err();
        assert_eq!(err, CommandError::UnknownCommand("get".to_string()));
    }

    #[test]
    fn test_extra_arguments_ignored() {
        let handler = handler();

        assert_eq!(
            handler.execute(cmd("SET", &["k", "v", "EX", "10"])),
            Ok(Reply::Ok)
        );
        assert_eq!(
            handler.execute(cmd("GET", &["k", "other"])),
            Ok(Reply::bulk("v"))
        );
    }

    #[test]
    fn test_handlers_share_store() {
        let store = Arc::new(Store::new());
        let a = CommandHandler::new(Arc::clone(&store));
        let b = CommandHandler::new(Arc::clone(&store));

        a.execute(cmd("SET", &["shared", "yes"])).unwrap();
        assert_eq!(b.execute(cmd("GET", &["shared"])), Ok(Reply::bulk("yes")));
    }
}
