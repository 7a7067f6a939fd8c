//! Domain-specific error types following panic-free policy.

use thiserror::Error;

/// Errors that can occur when building a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The frame delimiter is reserved and cannot appear inside a command
    #[error("Command contains the frame delimiter at byte {position}")]
    EmbeddedDelimiter { position: usize },
}

/// Result type for domain operations.
pub type CoreResult<T> = Result<T, CommandError>;
