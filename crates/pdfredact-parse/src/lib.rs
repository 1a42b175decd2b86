//! pdfredact-parse: PDF backend for pdfredact.
//!
//! This crate implements the document side of redaction: the [`PdfBackend`]
//! trait the redactor is written against, and [`LopdfBackend`], which walks
//! page content streams to position glyphs, searches them for a phrase and
//! rewrites the streams with the matched glyphs removed. It depends on
//! pdfredact-core for shared data types.

pub mod backend;
pub mod cmap;
pub mod content;
pub mod error;
pub mod fonts;
pub mod lopdf_backend;
pub mod redact;
pub mod standard_fonts;
pub mod text_state;

pub use backend::PdfBackend;
pub use error::BackendError;
pub use lopdf_backend::{LopdfBackend, LopdfDocument, LopdfPage};
pub use pdfredact_core;
