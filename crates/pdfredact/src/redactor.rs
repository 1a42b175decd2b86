//! Single-document redaction.
//!
//! [`Redactor`] runs the page loop: search every page for the phrase, mark
//! and apply a redaction over each match, and write the output only when at
//! least one page matched. Every failure becomes [`Outcome::Failed`] at
//! [`Redactor::redact`]; [`Redactor::try_redact`] keeps the error.

use std::fs;
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::path::Path;

use pdfredact_core::search::normalize_phrase;
use pdfredact_core::{Outcome, RedactError, RedactionStyle, SaveOptions, SearchMatch};
use pdfredact_parse::{LopdfBackend, PdfBackend};
use tracing::{debug, error, info, warn};

use crate::options::RedactOptions;

/// Matches found on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageMatches {
    /// Page index (0-based).
    pub page: usize,
    pub matches: Vec<SearchMatch>,
}

/// An open document that is closed when the guard goes out of scope,
/// whichever way the redaction ends.
struct DocumentGuard<B: PdfBackend> {
    doc: B::Document,
}

impl<B: PdfBackend> DocumentGuard<B> {
    fn open(path: &Path) -> Result<Self, RedactError> {
        B::open(path)
            .map(|doc| Self { doc })
            .map_err(|e| RedactError::Open(e.to_string()))
    }
}

impl<B: PdfBackend> Deref for DocumentGuard<B> {
    type Target = B::Document;

    fn deref(&self) -> &B::Document {
        &self.doc
    }
}

impl<B: PdfBackend> DerefMut for DocumentGuard<B> {
    fn deref_mut(&mut self) -> &mut B::Document {
        &mut self.doc
    }
}

impl<B: PdfBackend> Drop for DocumentGuard<B> {
    fn drop(&mut self) {
        B::close(&mut self.doc);
    }
}

/// Redacts a literal phrase from single documents.
///
/// Generic over the [`PdfBackend`]; [`Redactor::new`] uses [`LopdfBackend`].
///
/// # Example
///
/// ```ignore
/// use pdfredact::{Outcome, RedactOptions, Redactor};
///
/// let redactor = Redactor::new(RedactOptions::default());
/// let outcome = redactor.redact("in.pdf".as_ref(), "FULANO DA SILVA", "out.pdf".as_ref());
/// assert_eq!(outcome, Outcome::Redacted);
/// ```
pub struct Redactor<B: PdfBackend = LopdfBackend> {
    options: RedactOptions,
    _backend: PhantomData<fn() -> B>,
}

impl Redactor<LopdfBackend> {
    pub fn new(options: RedactOptions) -> Self {
        Self::with_backend(options)
    }
}

impl Default for Redactor<LopdfBackend> {
    fn default() -> Self {
        Self::new(RedactOptions::default())
    }
}

impl<B: PdfBackend> Redactor<B> {
    /// Create a redactor for an explicit backend.
    pub fn with_backend(options: RedactOptions) -> Self {
        Self {
            options,
            _backend: PhantomData,
        }
    }

    pub fn options(&self) -> &RedactOptions {
        &self.options
    }

    /// Redact every occurrence of `phrase` in `input`, writing `output`.
    ///
    /// Returns [`Outcome::Redacted`] when a redacted copy was written,
    /// [`Outcome::NotFound`] when no page contains the phrase (no file is
    /// written) and [`Outcome::Failed`] on any error (no file is written).
    pub fn redact(&self, input: &Path, phrase: &str, output: &Path) -> Outcome {
        let path = input.display();
        match self.try_redact(input, phrase, output) {
            Ok(Outcome::Redacted) => {
                info!(%path, output = %output.display(), outcome = "redacted", "redacted and saved");
                Outcome::Redacted
            }
            Ok(outcome) => {
                info!(%path, outcome = outcome.as_str(), "no text found to redact");
                outcome
            }
            Err(err) => {
                error!(%path, stage = err.stage(), error = %err, "redaction failed");
                Outcome::Failed
            }
        }
    }

    /// Like [`redact`](Self::redact), but returns the error instead of
    /// folding it into [`Outcome::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`RedactError::InvalidInput`] for a blank phrase or when
    /// `output` is `input`, and the stage-specific variant for failures
    /// while opening, searching, redacting or saving.
    pub fn try_redact(
        &self,
        input: &Path,
        phrase: &str,
        output: &Path,
    ) -> Result<Outcome, RedactError> {
        validate_phrase(phrase)?;
        if same_file(input, output) {
            return Err(RedactError::InvalidInput(format!(
                "output path {} is the input file",
                output.display()
            )));
        }

        info!(path = %input.display(), "opening document");
        let mut doc = DocumentGuard::<B>::open(input)?;
        let style = self.style_for(phrase);
        let page_count = B::page_count(&doc);
        let mut total = 0;

        for index in 0..page_count {
            debug!(page = index + 1, of = page_count, "checking page");
            let search_err = |e: B::Error| RedactError::Search {
                page: index,
                message: e.to_string(),
            };
            let redaction_err = |e: B::Error| RedactError::Redaction {
                page: index,
                message: e.to_string(),
            };

            let mut page = B::load_page(&doc, index).map_err(search_err)?;
            let hits =
                B::search_page(&doc, &page, phrase, &self.options.search).map_err(search_err)?;
            if hits.is_empty() {
                continue;
            }

            for quad in hits.iter().flat_map(|hit| &hit.quads) {
                B::redact_region(&doc, &mut page, quad).map_err(redaction_err)?;
            }
            let glyphs = B::apply_redactions(&mut doc, &mut page, &style).map_err(redaction_err)?;
            info!(page = index + 1, matches = hits.len(), glyphs, "applied redactions");
            total += hits.len();
        }

        if total == 0 {
            return Ok(Outcome::NotFound);
        }
        info!(output = %output.display(), matches = total, "saving document");
        save_atomic::<B>(&mut doc, output, &self.options.save)?;
        Ok(Outcome::Redacted)
    }

    /// Locate `phrase` in `input` without modifying anything.
    ///
    /// Only pages with at least one match are returned.
    ///
    /// # Errors
    ///
    /// Returns the stage-specific [`RedactError`] when the document cannot
    /// be opened or a page cannot be searched.
    pub fn search(&self, input: &Path, phrase: &str) -> Result<Vec<PageMatches>, RedactError> {
        validate_phrase(phrase)?;
        let doc = DocumentGuard::<B>::open(input)?;
        let mut pages = Vec::new();
        for index in 0..B::page_count(&doc) {
            let search_err = |e: B::Error| RedactError::Search {
                page: index,
                message: e.to_string(),
            };
            let page = B::load_page(&doc, index).map_err(search_err)?;
            let matches =
                B::search_page(&doc, &page, phrase, &self.options.search).map_err(search_err)?;
            if !matches.is_empty() {
                pages.push(PageMatches {
                    page: index,
                    matches,
                });
            }
        }
        Ok(pages)
    }

    /// The configured style, without a label that would itself contain the
    /// phrase (the output would then never come back `NotFound`).
    fn style_for(&self, phrase: &str) -> RedactionStyle {
        let mut style = self.options.style.clone();
        if let Some(label) = &style.label {
            let search = &self.options.search;
            let needle: String = normalize_phrase(phrase, search).into_iter().collect();
            let label: String = normalize_phrase(label, search).into_iter().collect();
            if label.contains(&needle) {
                warn!(%label, "label contains the phrase, drawing redactions without it");
                style.label = None;
            }
        }
        style
    }
}

fn validate_phrase(phrase: &str) -> Result<(), RedactError> {
    if phrase.trim().is_empty() {
        return Err(RedactError::InvalidInput("phrase is empty".to_string()));
    }
    Ok(())
}

/// Whether two paths name the same file. Paths that do not exist yet are
/// compared as given.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Serialize into a temporary file next to `output`, then rename it over
/// `output`. The temporary file is removed on every failure path.
fn save_atomic<B: PdfBackend>(
    doc: &mut B::Document,
    output: &Path,
    options: &SaveOptions,
) -> Result<(), RedactError> {
    let save_err = |e: &dyn std::fmt::Display| RedactError::Save(e.to_string());
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".pdfredact-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| save_err(&e))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        B::save(doc, &mut writer, options).map_err(|e| save_err(&e))?;
        writer.flush().map_err(|e| save_err(&e))?;
    }
    tmp.as_file().sync_all().map_err(|e| save_err(&e))?;
    tmp.persist(output).map_err(|e| save_err(&e.error))?;
    Ok(())
}
