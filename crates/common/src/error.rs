//! Common error types for the probe crates.

use std::fmt;

/// A specialized Result type for probe operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for probe operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Detection error: {0}")]
    Detection(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Schedule error: {0}")]
    Schedule(String),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl fmt::Display) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new detection error.
    pub fn detection(msg: impl fmt::Display) -> Self {
        Error::Detection(msg.to_string())
    }

    /// Create a new notification error.
    pub fn notification(msg: impl fmt::Display) -> Self {
        Error::Notification(msg.to_string())
    }

    /// Create a new schedule error.
    pub fn schedule(msg: impl fmt::Display) -> Self {
        Error::Schedule(msg.to_string())
    }
}
