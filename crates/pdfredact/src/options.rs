//! Configuration for single-document redaction and directory sweeps.

use pdfredact_core::{RedactionStyle, SaveOptions, SearchOptions};

/// Suffix appended to output file stems when none is given.
pub const DEFAULT_SUFFIX: &str = "redacted";

/// Options for redacting one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RedactOptions {
    /// How the phrase is matched.
    pub search: SearchOptions,
    /// How redacted areas are painted.
    pub style: RedactionStyle,
    /// How the output is written.
    pub save: SaveOptions,
}

impl RedactOptions {
    /// Match the phrase regardless of case.
    pub fn case_insensitive(mut self) -> Self {
        self.search.case_sensitive = false;
        self
    }

    /// Draw `label` inside every redacted area.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.style.label = Some(label.into());
        self
    }

    pub fn with_fill(mut self, fill: [f32; 3]) -> Self {
        self.style.fill = fill;
        self
    }
}

/// Options for a directory sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepOptions {
    /// Inserted as `_<suffix>` before the extension of each output file.
    pub suffix: String,
    /// Directory names whose subtrees are not searched for documents.
    pub exclude_dirs: Vec<String>,
    /// Skip files whose stem already ends with `_<suffix>`.
    pub skip_suffixed: bool,
    /// Descend into symlinked directories and list symlinked files.
    pub follow_links: bool,
    /// Options applied to every document.
    pub redact: RedactOptions,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_string(),
            exclude_dirs: Vec::new(),
            skip_suffixed: false,
            follow_links: false,
            redact: RedactOptions::default(),
        }
    }
}

impl SweepOptions {
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }
}
