//! PDF backend trait.
//!
//! Defines the [`PdfBackend`] trait: the handful of document primitives the
//! redactor is written against. Any library that can open a document, walk
//! its pages, search a page for a literal string and remove text under a
//! region can sit behind it.

use std::io::Write;
use std::path::Path;

use pdfredact_core::{Quad, RedactionStyle, SaveOptions, SearchMatch, SearchOptions};

/// Trait abstracting the PDF operations a redaction needs.
///
/// # Associated Types
///
/// - `Document`: an open, mutable document handle.
/// - `Page`: one loaded page, including its pending redaction marks.
/// - `Error`: backend-specific error type.
///
/// # Usage
///
/// ```ignore
/// let mut doc = MyBackend::open(path)?;
/// for index in 0..MyBackend::page_count(&doc) {
///     let mut page = MyBackend::load_page(&doc, index)?;
///     for hit in MyBackend::search_page(&doc, &page, "secret", &options)? {
///         for quad in &hit.quads {
///             MyBackend::redact_region(&doc, &mut page, quad)?;
///         }
///     }
///     MyBackend::apply_redactions(&mut doc, &mut page, &style)?;
/// }
/// MyBackend::save(&mut doc, &mut writer, &SaveOptions::default())?;
/// MyBackend::close(&mut doc);
/// ```
pub trait PdfBackend {
    /// The open document type.
    type Document;

    /// A loaded page within a document.
    type Page;

    /// Backend-specific error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a valid PDF, or
    /// is encrypted.
    fn open(path: &Path) -> Result<Self::Document, Self::Error>;

    /// Return the number of pages in the document.
    fn page_count(doc: &Self::Document) -> usize;

    /// Load a page by 0-based index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range or the page content
    /// cannot be decoded.
    fn load_page(doc: &Self::Document, index: usize) -> Result<Self::Page, Self::Error>;

    /// Find every occurrence of `phrase` on the page.
    ///
    /// # Errors
    ///
    /// Returns an error if the page text cannot be extracted.
    fn search_page(
        doc: &Self::Document,
        page: &Self::Page,
        phrase: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchMatch>, Self::Error>;

    /// Mark `quad` for redaction. Nothing changes until
    /// [`apply_redactions`](Self::apply_redactions).
    ///
    /// # Errors
    ///
    /// Returns an error if the region cannot be redacted (for example a
    /// quad with non-finite coordinates).
    fn redact_region(
        doc: &Self::Document,
        page: &mut Self::Page,
        quad: &Quad,
    ) -> Result<(), Self::Error>;

    /// Remove the text under every marked region of the page and paint the
    /// regions with `style`. Returns the number of glyphs removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the page content cannot be rewritten.
    fn apply_redactions(
        doc: &mut Self::Document,
        page: &mut Self::Page,
        style: &RedactionStyle,
    ) -> Result<usize, Self::Error>;

    /// Serialize the document into `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    fn save<W: Write>(
        doc: &mut Self::Document,
        writer: &mut W,
        options: &SaveOptions,
    ) -> Result<(), Self::Error>;

    /// Release whatever the handle holds beyond its memory (files, native
    /// handles). The handle is not used again afterwards.
    fn close(_doc: &mut Self::Document) {}
}
