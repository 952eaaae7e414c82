//! Error types for rally-netcode

use thiserror::Error;

/// Netcode error type
#[derive(Debug, Error)]
pub enum Error {
    /// `initialize` was called without a starting snapshot
    #[error("Cannot start prediction without an initial snapshot")]
    MissingInitialSnapshot,

    /// Configuration text could not be parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Error from rally-core
    #[error(transparent)]
    Core(#[from] rally_core::Error),
}

/// Result type for netcode operations
pub type Result<T> = std::result::Result<T, Error>;
