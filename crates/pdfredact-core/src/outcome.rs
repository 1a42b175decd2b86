//! Per-file outcome and batch summary.

use std::fmt;

/// Result of one single-document redaction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Outcome {
    /// The phrase was found and a redacted copy was written.
    Redacted,
    /// The phrase occurs on no page; nothing was written.
    NotFound,
    /// Opening, searching, redacting, or saving failed; nothing was written.
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Redacted => "redacted",
            Outcome::NotFound => "not_found",
            Outcome::Failed => "failed",
        }
    }

    /// `Redacted` and `NotFound` both count as processed.
    pub fn is_processed(&self) -> bool {
        !matches!(self, Outcome::Failed)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts accumulated over a directory sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchSummary {
    /// Files that ended `Redacted` or `NotFound`.
    pub processed: usize,
    /// Files that ended `Failed`.
    pub errors: usize,
    /// Of `processed`, files that were redacted.
    pub redacted: usize,
    /// Of `processed`, files without the phrase.
    pub not_found: usize,
    /// Set when the directory listing failed and the sweep stopped early.
    pub listing_error: Option<String>,
}

impl BatchSummary {
    /// Fold one file outcome into the counts.
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Redacted => {
                self.processed += 1;
                self.redacted += 1;
            }
            Outcome::NotFound => {
                self.processed += 1;
                self.not_found += 1;
            }
            Outcome::Failed => self.errors += 1,
        }
    }

    /// Total number of files seen.
    pub fn total(&self) -> usize {
        self.processed + self.errors
    }

    /// True when every file was processed and the listing completed.
    pub fn is_clean(&self) -> bool {
        self.errors == 0 && self.listing_error.is_none()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed: {} (redacted: {}, not found: {}), errors: {}",
            self.processed, self.redacted, self.not_found, self.errors
        )
    }
}
