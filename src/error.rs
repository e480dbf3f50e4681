//! Error types for the Glaive library.
//!
//! All errors are represented by the [`GlaiveError`] enum. Only
//! [`GlaiveError::CardNotFound`] is a domain error raised by the engine itself;
//! the other variants carry failures from the card corpus, from configuration
//! files, or from combo corpus loading.
//!
//! # Examples
//!
//! ```
//! use glaive::error::{GlaiveError, Result};
//!
//! fn resolve(name: &str) -> Result<()> {
//!     Err(GlaiveError::card_not_found(name))
//! }
//!
//! match resolve("Nonexistent Card") {
//!     Ok(_) => println!("Found"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Glaive operations.
#[derive(Error, Debug)]
pub enum GlaiveError {
    /// The source card of a synergy request could not be resolved.
    #[error("Card not found: {0}")]
    CardNotFound(String),

    /// Failure reported by a card corpus implementation.
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// Invalid or unreadable configuration (scorer config, rule tables).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed combo corpus input.
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O errors while reading corpus or configuration files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Errors bubbled up from external collaborators.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with GlaiveError.
pub type Result<T> = std::result::Result<T, GlaiveError>;

impl GlaiveError {
    /// Create a new card-not-found error.
    pub fn card_not_found<S: Into<String>>(name: S) -> Self {
        GlaiveError::CardNotFound(name.into())
    }

    /// Create a new corpus error.
    pub fn corpus<S: Into<String>>(msg: S) -> Self {
        GlaiveError::Corpus(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        GlaiveError::Config(msg.into())
    }

    /// Create a new parse error.
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        GlaiveError::Parse(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        GlaiveError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        GlaiveError::Other(msg.into())
    }

    /// Whether this error means the requested card does not exist.
    pub fn is_card_not_found(&self) -> bool {
        matches!(self, GlaiveError::CardNotFound(_))
    }
}
