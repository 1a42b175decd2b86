//! pdfredact-core: Backend-independent data types and algorithms.
//!
//! This crate provides the foundational types (Point, Rect, Matrix, Quad,
//! Glyph), the literal phrase search over positioned glyphs, single-byte text
//! encodings, and the outcome / error taxonomy shared by the redactor and the
//! directory sweeper. It has no required dependencies.

pub mod encoding;
pub mod error;
pub mod geometry;
pub mod options;
pub mod outcome;
pub mod search;
pub mod text;

pub use encoding::{FontEncoding, StandardEncoding, glyph_name_to_char};
pub use error::RedactError;
pub use geometry::{Matrix, Point, Quad, Rect};
pub use options::{RedactionStyle, SaveOptions};
pub use outcome::{BatchSummary, Outcome};
pub use search::{SearchMatch, SearchOptions, page_text, search_glyphs};
pub use text::Glyph;
