//! Error taxonomy for redaction.
//!
//! [`RedactError`] names the stage a failure happened in. Per-file stages
//! (`Open`, `Search`, `Redaction`, `Save`, `InvalidInput`) are converted to
//! [`Outcome::Failed`](crate::Outcome::Failed) at the redactor boundary;
//! `Listing` ends a directory sweep early.

use std::fmt;

/// A failure while redacting a document or sweeping a directory.
#[derive(Debug, Clone, PartialEq)]
pub enum RedactError {
    /// The call was rejected before touching the document
    /// (blank phrase, output path equal to the input path).
    InvalidInput(String),
    /// The source file is missing, unreadable, encrypted, or not a PDF.
    Open(String),
    /// Locating the phrase on a page failed.
    Search {
        /// Page index (0-based).
        page: usize,
        message: String,
    },
    /// Applying a redaction on a page failed.
    Redaction {
        /// Page index (0-based).
        page: usize,
        message: String,
    },
    /// Persisting the output document failed.
    Save(String),
    /// Enumerating the directory tree failed.
    Listing(String),
}

impl RedactError {
    /// Short machine-readable name of the failing stage.
    pub fn stage(&self) -> &'static str {
        match self {
            RedactError::InvalidInput(_) => "input",
            RedactError::Open(_) => "open",
            RedactError::Search { .. } => "search",
            RedactError::Redaction { .. } => "redaction",
            RedactError::Save(_) => "save",
            RedactError::Listing(_) => "listing",
        }
    }
}

impl fmt::Display for RedactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedactError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            RedactError::Open(msg) => write!(f, "open error: {msg}"),
            RedactError::Search { page, message } => {
                write!(f, "search error on page {}: {message}", page + 1)
            }
            RedactError::Redaction { page, message } => {
                write!(f, "redaction error on page {}: {message}", page + 1)
            }
            RedactError::Save(msg) => write!(f, "save error: {msg}"),
            RedactError::Listing(msg) => write!(f, "listing error: {msg}"),
        }
    }
}

impl std::error::Error for RedactError {}
