//! Error types for Lysark.

use thiserror::Error;

/// Library-level error type for Lysark operations.
#[derive(Error, Debug)]
pub enum LysarkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcript fetch failed: {0}")]
    TranscriptFetch(String),

    #[error("Model call failed: {0}")]
    ModelCall(String),

    #[error("Model response malformed: {reason}")]
    ResponseMalformed {
        reason: String,
        /// Raw model output, kept so the caller can surface it in a
        /// diagnostic slide.
        raw_output: String,
    },

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Index store error: {0}")]
    Index(String),

    #[error("No index exists for session {0}")]
    IndexMissing(String),

    #[error("Presentation rendering failed: {0}")]
    Deck(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl LysarkError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Transport-level failures are transient; malformed responses and
    /// caller mistakes are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LysarkError::ModelCall(_)
                | LysarkError::Embedding(_)
                | LysarkError::TranscriptFetch(_)
                | LysarkError::Http(_)
        )
    }
}

/// Result type alias for Lysark operations.
pub type Result<T> = std::result::Result<T, LysarkError>;
