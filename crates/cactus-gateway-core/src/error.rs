//! Error types for the Cactus gateway

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The request was well-formed JSON but cannot be served as given.
    #[error("{0}")]
    Validation(String),

    /// A required deployment setting is missing.
    #[error("{0}")]
    Config(String),

    /// The engine could not be brought up.
    #[error("Cactus inference failed: engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Cactus inference failed: {0}")]
    Engine(String),

    /// The transcription provider answered with a non-success status.
    #[error("Gemini API error: {body}")]
    Provider { status: u16, body: String },

    #[error("Transcription failed: {0}")]
    Transcription(String),
}

/// Failure domain of an [`Error`]; the HTTP layer picks a status from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ClientInput,
    Configuration,
    Engine,
    Provider,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::ClientInput,
            Error::Config(_) => ErrorKind::Configuration,
            Error::EngineUnavailable(_) | Error::Engine(_) => ErrorKind::Engine,
            Error::Provider { .. } => ErrorKind::Provider,
            Error::Transcription(_) => ErrorKind::Internal,
        }
    }

    /// Status reported by the upstream provider, if it answered at all.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Error::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
