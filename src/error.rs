use thiserror::Error;

/// Errors raised by the chat core.
///
/// Detection and intent analysis never fail; these cover response validation,
/// persistence and catalog loading.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
}

pub type Result<T> = std::result::Result<T, ChatError>;
