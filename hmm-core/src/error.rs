//! # Errors
//!
//! Every fallible operation in the crate returns [`Result`]. Input-format
//! errors carry the 1-based line number so the caller can point at the
//! offending corpus line.

use thiserror::Error;

/// Errors raised while reading a corpus, estimating, decoding or loading a model.
#[derive(Debug, Error)]
pub enum HmmError {
    /// A corpus token has no `/` separator, or its word or tag part is empty.
    #[error("line {line}: malformed token {token:?} (expected word/tag)")]
    MalformedToken {
        /// 1-based line number in the corpus.
        line: usize,
        /// The token as it appeared in the input.
        token: String,
    },

    /// A corpus line contains no tokens at all.
    #[error("line {line}: sentence has no tokens")]
    MalformedLine {
        /// 1-based line number in the corpus.
        line: usize,
    },

    /// A corpus token uses the reserved sentence-start tag.
    #[error("line {line}: token {token:?} uses the reserved start tag")]
    ReservedTag { line: usize, token: String },

    /// Decoding was requested for a sentence with zero words.
    #[error("cannot decode an empty sentence")]
    EmptySentence,

    /// The model has no tags besides the start context (trained on an empty corpus).
    #[error("model has no tags to decode with")]
    DegenerateModel,

    /// No tag at the last position scored strictly above zero, so there is
    /// nothing to backtrack from. Usually a sign of floating-point underflow
    /// on a very long sentence.
    #[error("every terminal score is zero for a sentence of {length} words")]
    AllZeroTerminalScores { length: usize },

    /// The persisted model declares a format version this build cannot read.
    #[error("unsupported model format version {0}")]
    UnsupportedVersion(u32),

    /// The persisted model is structurally inconsistent.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for HMM operations.
pub type Result<T> = std::result::Result<T, HmmError>;
