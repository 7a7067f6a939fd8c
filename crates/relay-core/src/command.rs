//! Relay commands.
//!
//! A command is an opaque byte sequence carried by one newline-delimited
//! frame. The relay never interprets the payload beyond comparing it to a
//! handful of well-known literals, so the bytes are kept as-is (no UTF-8
//! requirement, no trimming).

use std::fmt;

use bytes::Bytes;

use crate::error::{CommandError, CoreResult};

/// Frame delimiter. Reserved: it can never appear inside a command.
pub const DELIMITER: u8 = b'\n';

/// A single relay command, without its trailing delimiter.
///
/// Backed by [`Bytes`], so cloning for fan-out to many sessions is a
/// reference-count bump rather than a copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Command(Bytes);

impl Command {
    /// Creates a command from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::EmbeddedDelimiter` if the bytes contain `\n`.
    pub fn new(bytes: impl Into<Bytes>) -> CoreResult<Self> {
        let bytes = bytes.into();
        match bytes.iter().position(|&b| b == DELIMITER) {
            Some(position) => Err(CommandError::EmbeddedDelimiter { position }),
            None => Ok(Self(bytes)),
        }
    }

    /// Creates a command from a static literal.
    ///
    /// # Errors
    ///
    /// Same as [`Command::new`].
    pub fn from_static(literal: &'static str) -> CoreResult<Self> {
        Self::new(Bytes::from_static(literal.as_bytes()))
    }

    /// Returns the raw command bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the command length in bytes (delimiter excluded).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the empty command (a bare `\n` on the wire).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if this command equals `literal` byte-for-byte.
    pub fn is(&self, literal: &str) -> bool {
        self.as_bytes() == literal.as_bytes()
    }

    /// Consumes the command, returning the underlying buffer.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl fmt::Display for Command {
    /// Lossy, escaped rendering for logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}

impl AsRef<[u8]> for Command {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<String> for Command {
    type Error = CommandError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Command {
    type Error = CommandError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(Bytes::copy_from_slice(s.as_bytes()))
    }
}
