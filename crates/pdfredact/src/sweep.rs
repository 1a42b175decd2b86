//! Recursive directory sweep.
//!
//! Every `.pdf` file under a root is redacted into a sibling file named
//! `<stem>_<suffix>.<ext>`. The file list is taken before the first document
//! is processed, so outputs written by the sweep are never swept themselves.

use std::path::{Path, PathBuf};

use pdfredact_core::{BatchSummary, Outcome, RedactError};
use pdfredact_parse::{LopdfBackend, PdfBackend};
use tracing::{error, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::options::SweepOptions;
use crate::redactor::Redactor;

/// Path of the redacted copy of `input`: `_<suffix>` inserted before the
/// extension, in the same directory.
///
/// ```
/// use std::path::Path;
/// use pdfredact::output_path_for;
///
/// let out = output_path_for(Path::new("docs/report.pdf"), "redacted");
/// assert_eq!(out, Path::new("docs/report_redacted.pdf"));
/// ```
pub fn output_path_for(input: &Path, suffix: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let name = match input.extension() {
        Some(ext) => format!("{stem}_{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{suffix}"),
    };
    input.with_file_name(name)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.as_encoded_bytes().eq_ignore_ascii_case(b"pdf"))
}

/// Redacts a phrase from every PDF under a directory tree.
pub struct Sweeper<B: PdfBackend = LopdfBackend> {
    redactor: Redactor<B>,
    options: SweepOptions,
}

impl Sweeper<LopdfBackend> {
    pub fn new(options: SweepOptions) -> Self {
        Self::with_backend(options)
    }
}

impl<B: PdfBackend> Sweeper<B> {
    pub fn with_backend(options: SweepOptions) -> Self {
        Self {
            redactor: Redactor::with_backend(options.redact.clone()),
            options,
        }
    }

    pub fn options(&self) -> &SweepOptions {
        &self.options
    }

    fn excluded(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && self
                .options
                .exclude_dirs
                .iter()
                .any(|name| entry.file_name().to_string_lossy() == name.as_str())
    }

    fn already_suffixed(&self, path: &Path) -> bool {
        let marker = format!("_{}", self.options.suffix);
        self.options.skip_suffixed
            && path
                .file_stem()
                .is_some_and(|stem| stem.to_string_lossy().ends_with(&marker))
    }

    /// Every candidate document under `root`, in file-name order.
    ///
    /// Nothing at `root` means no documents. An entry below the root that
    /// cannot be read (permission denied, a broken or looping symlink when
    /// links are followed) is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RedactError::Listing`] when the root itself cannot be read.
    pub fn list(&self, root: &Path) -> Result<Vec<PathBuf>, RedactError> {
        if root.symlink_metadata().is_err() {
            warn!(root = %root.display(), "directory does not exist");
            return Ok(Vec::new());
        }

        let walk = WalkDir::new(root)
            .follow_links(self.options.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.excluded(e));
        self.collect(walk)
    }

    fn collect(
        &self,
        entries: impl IntoIterator<Item = walkdir::Result<DirEntry>>,
    ) -> Result<Vec<PathBuf>, RedactError> {
        let mut files = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(RedactError::Listing(err.to_string()));
                }
                Err(err) => {
                    warn!(
                        path = ?err.path(),
                        depth = err.depth(),
                        error = %err,
                        "skipping unreadable entry"
                    );
                    continue;
                }
            };
            let path = entry.path();
            if entry.file_type().is_file() && is_pdf(path) && !self.already_suffixed(path) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Redact `phrase` from every document under `root`.
    ///
    /// A failing document is counted and the sweep moves on; a listing
    /// failure ends the sweep and is reported in
    /// [`BatchSummary::listing_error`].
    pub fn run(&self, root: &Path, phrase: &str) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let files = match self.list(root) {
            Ok(files) => files,
            Err(err) => {
                error!(root = %root.display(), error = %err, "fatal error during processing");
                summary.listing_error = Some(err.to_string());
                return summary;
            }
        };
        info!(root = %root.display(), count = files.len(), "found PDF files");

        for file in &files {
            let output = output_path_for(file, &self.options.suffix);
            let outcome = self.redactor.redact(file, phrase, &output);
            summary.record(outcome);
            if outcome == Outcome::Failed {
                warn!(path = %file.display(), "file skipped after error");
            }
        }

        info!(
            processed = summary.processed,
            redacted = summary.redacted,
            not_found = summary.not_found,
            errors = summary.errors,
            "processing complete"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn output_path_inserts_suffix() {
        assert_eq!(
            output_path_for(Path::new("/a/b/pdf_test.pdf"), "redacted"),
            Path::new("/a/b/pdf_test_redacted.pdf")
        );
        assert_eq!(
            output_path_for(Path::new("REPORT.PDF"), "x"),
            Path::new("REPORT_x.PDF")
        );
        assert_eq!(
            output_path_for(Path::new("archive.tar.pdf"), "x"),
            Path::new("archive.tar_x.pdf")
        );
    }

    #[test]
    fn pdf_extension_is_case_insensitive() {
        assert!(is_pdf(Path::new("a.pdf")));
        assert!(is_pdf(Path::new("a.PdF")));
        assert!(!is_pdf(Path::new("a.pdfx")));
        assert!(!is_pdf(Path::new("pdf")));
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    fn names(files: &[PathBuf], root: &Path) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn list_is_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "b.pdf");
        touch(root, "a.PDF");
        touch(root, "notes.txt");
        touch(root, "sub/deeper/c.pdf");

        let files = Sweeper::new(SweepOptions::default()).list(root).unwrap();
        assert_eq!(names(&files, root), ["a.PDF", "b.pdf", "sub/deeper/c.pdf"]);
    }

    #[test]
    fn list_applies_filters() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "a.pdf");
        touch(root, "a_redacted.pdf");
        touch(root, "skip/b.pdf");
        touch(root, "keep/c.pdf");

        let options = SweepOptions {
            exclude_dirs: vec!["skip".to_string()],
            skip_suffixed: true,
            ..SweepOptions::default()
        };
        let files = Sweeper::new(options).list(root).unwrap();
        assert_eq!(names(&files, root), ["a.pdf", "keep/c.pdf"]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_entries_below_root_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "a.pdf");
        touch(root, "sub/b.pdf");
        std::os::unix::fs::symlink(root.join("missing.pdf"), root.join("gone.pdf")).unwrap();
        std::os::unix::fs::symlink(root.join("sub/loop"), root.join("sub/loop")).unwrap();

        let options = SweepOptions {
            follow_links: true,
            ..SweepOptions::default()
        };
        let files = Sweeper::new(options).list(root).unwrap();
        assert_eq!(names(&files, root), ["a.pdf", "sub/b.pdf"]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_root_is_a_listing_error() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        std::os::unix::fs::symlink(&root, &root).unwrap();

        let sweeper = Sweeper::new(SweepOptions::default());
        assert!(matches!(sweeper.list(&root), Err(RedactError::Listing(_))));

        let summary = sweeper.run(&root, "FULANO");
        assert!(summary.listing_error.is_some());
        assert_eq!(summary.processed, 0);
        assert!(!summary.is_clean());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_documents_are_listed_only_when_following_links() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        touch(dir.path(), "elsewhere/c.pdf");
        fs::create_dir(&root).unwrap();
        std::os::unix::fs::symlink(dir.path().join("elsewhere"), root.join("linked")).unwrap();

        let files = Sweeper::new(SweepOptions::default()).list(&root).unwrap();
        assert!(files.is_empty());

        let options = SweepOptions {
            follow_links: true,
            ..SweepOptions::default()
        };
        let files = Sweeper::new(options).list(&root).unwrap();
        assert_eq!(names(&files, &root), ["linked/c.pdf"]);
    }

    #[test]
    fn missing_root_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let files = Sweeper::new(SweepOptions::default())
            .list(&dir.path().join("absent"))
            .unwrap();
        assert!(files.is_empty());
    }
}
