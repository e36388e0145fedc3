//! Error types for the retreat ecosystem.

use thiserror::Error;

/// Errors that can occur in retreat operations.
#[derive(Error, Debug)]
pub enum RetreatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown record: {0}")]
    UnknownRecord(String),

    #[error(
        "Storage quota exceeded. Export your data with `retreat export backup` and free some space."
    )]
    QuotaExceeded,

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider '{0}' not found in PATH")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("Not signed in. Run `retreat auth <provider>` first.")]
    NotAuthenticated,

    #[error("ICS generation error: {0}")]
    IcsGenerate(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("{0}")]
    Board(String),

    #[error("Rate limit: {0}")]
    RateLimited(String),

    #[error("Invalid prompt: {0}")]
    InvalidPrompt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for retreat operations.
pub type RetreatResult<T> = Result<T, RetreatError>;
