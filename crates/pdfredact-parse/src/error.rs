//! Error types for the PDF backend.
//!
//! Uses [`thiserror`] for ergonomic error derivation. The redactor wraps a
//! [`BackendError`] with the stage it happened in (see
//! `pdfredact_core::RedactError`).

use thiserror::Error;

/// Error type for PDF backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Error from PDF parsing (structure, syntax, object resolution).
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// Error reading or writing PDF data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error resolving font or encoding information.
    #[error("font error: {0}")]
    Font(String),

    /// Error while walking or rewriting a content stream.
    #[error("content stream error: {0}")]
    Interpreter(String),

    /// The document is encrypted and cannot be rewritten.
    #[error("document is encrypted")]
    Encrypted,

    /// A page index past the end of the document.
    #[error("page index {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },
}

impl From<lopdf::Error> for BackendError {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => BackendError::Io(e),
            other => BackendError::Parse(other.to_string()),
        }
    }
}
