//! Error types for rally-core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// A wire message could not be read as a snapshot at all
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
