//! Error types for the library.
//!
//! Hard failures surface through the [`Error`] enum; soft conditions
//! (unmappable codepoints, overfull lines) are recorded on the produced
//! values and logged instead of raised.

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building or writing a document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structurally invalid declarative input, e.g. a non-positive font
    /// size or an empty column. Raised at the boundary; fatal to the
    /// write call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Malformed TrueType file: missing required tables or inconsistent
    /// offsets. Raised on first use of the font.
    #[error("Failed to parse font: {reason}")]
    FontParse {
        /// Font name or path, if known
        name: Option<String>,
        /// Reason the parse failed
        reason: String,
    },

    /// Writing to the output sink failed. The writer is poisoned:
    /// further calls return `InternalState`.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Writer API used out of order. This indicates a bug in the
    /// calling code, not a recoverable condition.
    #[error("Writer used out of order: {0}")]
    InternalState(&'static str),
}

impl Error {
    /// Shorthand for a font parse error without a known name.
    pub(crate) fn font_parse(reason: impl Into<String>) -> Self {
        Error::FontParse {
            name: None,
            reason: reason.into(),
        }
    }
}
