//! pdfredact: find a literal phrase in PDF documents and remove it.
//!
//! This is the public API facade crate. It re-exports types from
//! pdfredact-core and drives a pdfredact-parse backend.
//!
//! # Architecture
//!
//! - **pdfredact-core**: geometry, glyphs, phrase search, outcomes and errors
//! - **pdfredact-parse**: the PDF backend trait and its lopdf implementation
//! - **pdfredact** (this crate): the single-document redactor and the
//!   directory sweeper
//!
//! # Example
//!
//! ```ignore
//! use pdfredact::{Outcome, redact, redact_directory};
//!
//! let outcome = redact("pdf_test.pdf", "FULANO DA SILVA", "pdf_test_redacted.pdf");
//! assert_eq!(outcome, Outcome::Redacted);
//!
//! let summary = redact_directory("archive/", "FULANO DA SILVA", "redacted");
//! println!("{summary}");
//! ```

mod options;
mod redactor;
mod sweep;

use std::path::Path;

pub use options::{DEFAULT_SUFFIX, RedactOptions, SweepOptions};
pub use redactor::{PageMatches, Redactor};
pub use sweep::{Sweeper, output_path_for};

pub use pdfredact_core::{
    BatchSummary, Glyph, Outcome, Point, Quad, Rect, RedactError, RedactionStyle, SaveOptions,
    SearchMatch, SearchOptions,
};
pub use pdfredact_parse::{BackendError, LopdfBackend, PdfBackend};

pub use pdfredact_core;
pub use pdfredact_parse;

/// Redact every occurrence of `phrase` in `input`, writing `output`, with
/// default options.
///
/// See [`Redactor::redact`].
pub fn redact(input: impl AsRef<Path>, phrase: &str, output: impl AsRef<Path>) -> Outcome {
    Redactor::default().redact(input.as_ref(), phrase, output.as_ref())
}

/// Redact `phrase` from every PDF under `root`, writing `<stem>_<suffix>`
/// copies next to the sources, with default options.
///
/// See [`Sweeper::run`].
pub fn redact_directory(root: impl AsRef<Path>, phrase: &str, suffix: &str) -> BatchSummary {
    Sweeper::new(SweepOptions::default().with_suffix(suffix)).run(root.as_ref(), phrase)
}
