//! Error types for the API

use thiserror::Error;

/// Error type for API operations
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unknown voice name
    #[error("Unknown voice: {0}")]
    UnknownVoice(String),

    /// Unknown tone name
    #[error(transparent)]
    UnknownTone(#[from] crate::domain::tone::UnknownTone),

    /// Input could not be read, decoded or was empty
    #[error(transparent)]
    Input(#[from] crate::api::input::InputError),

    /// Processing error from the application layer
    #[error("Processing error: {0}")]
    Processing(#[from] crate::application::config::ProcessingError),

    /// Narration failed after the fallback attempt
    #[error(transparent)]
    Narration(#[from] crate::application::narration::NarrationError),

    /// Model backend failure surfaced at the boundary
    #[error(transparent)]
    Model(#[from] crate::domain::capabilities::ModelError),
}

/// Result type for API operations
pub type Result<T> = std::result::Result<T, Error>;
