//! Decoded request type.

use bytes::Bytes;
use std::borrow::Cow;

/// One decoded request: a name plus its arguments.
///
/// For multi-bulk requests `name` is argument 0; for inline requests it is
/// the whole line and `args` is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: Bytes,
    pub args: Vec<Bytes>,
}

impl Command {
    pub fn new(name: impl Into<Bytes>, args: Vec<Bytes>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// An inline command: just a name, never any arguments.
    pub fn inline(name: impl Into<Bytes>) -> Self {
        Self::new(name, Vec::new())
    }

    /// The command name for messages and logs.
    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_has_no_args() {
        let cmd = Command::inline("PING");
        assert_eq!(cmd.name, Bytes::from("PING"));
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn test_name_lossy_replaces_invalid_utf8() {
        let cmd = Command::inline(Bytes::from_static(b"GE\xffT"));
        assert_eq!(cmd.name_lossy(), "GE\u{fffd}T");
    }
}
