use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pdfredact::{DEFAULT_SUFFIX, RedactOptions, RedactionStyle, SaveOptions};

/// Remove a literal phrase from PDF documents.
#[derive(Debug, Parser)]
#[command(name = "pdfredact", about, version)]
pub struct Cli {
    /// Log every page that is checked
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Redact a phrase from a single PDF file
    Redact {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Literal phrase to remove
        #[arg(long, env = "PDFREDACT_PHRASE")]
        phrase: String,

        /// Output path. Default: <stem>_<suffix>.pdf next to FILE
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Suffix for the default output name
        #[arg(long, env = "PDFREDACT_SUFFIX", default_value = DEFAULT_SUFFIX)]
        suffix: String,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Redact a phrase from every PDF under a directory
    Sweep {
        /// Root directory to search recursively
        #[arg(value_name = "DIR", env = "PDFREDACT_BASE_PATH")]
        dir: PathBuf,

        /// Literal phrase to remove
        #[arg(long, env = "PDFREDACT_PHRASE")]
        phrase: String,

        /// Suffix inserted before the extension of each output file
        #[arg(long, env = "PDFREDACT_SUFFIX", default_value = DEFAULT_SUFFIX)]
        suffix: String,

        /// Directory name to leave out (repeatable)
        #[arg(long = "exclude-dir", value_name = "NAME")]
        exclude_dirs: Vec<String>,

        /// Skip files whose name already ends with _<suffix>
        #[arg(long)]
        skip_suffixed: bool,

        /// Follow symbolic links while searching
        #[arg(long, short = 'L')]
        follow_links: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// List occurrences of a phrase without modifying anything
    Search {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Literal phrase to look for
        #[arg(long, env = "PDFREDACT_PHRASE")]
        phrase: String,

        /// Match regardless of case
        #[arg(long, short = 'i')]
        ignore_case: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Matching and painting options shared by `redact` and `sweep`.
#[derive(Debug, Clone, Args)]
pub struct StyleArgs {
    /// Match regardless of case
    #[arg(long, short = 'i')]
    pub ignore_case: bool,

    /// Text drawn inside every redacted area
    #[arg(long, value_name = "TEXT")]
    pub label: Option<String>,

    /// Fill color as r,g,b (0.0-1.0) or #rrggbb. Default: black
    #[arg(long, value_name = "COLOR", value_parser = parse_fill)]
    pub fill: Option<[f32; 3]>,

    /// Write streams uncompressed
    #[arg(long)]
    pub no_compress: bool,
}

impl StyleArgs {
    pub fn redact_options(&self) -> RedactOptions {
        let mut options = RedactOptions {
            save: SaveOptions {
                compress: !self.no_compress,
                ..SaveOptions::default()
            },
            ..RedactOptions::default()
        };
        if self.ignore_case {
            options = options.case_insensitive();
        }
        if let Some(label) = &self.label {
            options = options.with_label(label.clone());
        }
        if let Some(fill) = self.fill {
            options = options.with_fill(fill);
        }
        options
    }
}

fn parse_fill(value: &str) -> Result<[f32; 3], String> {
    RedactionStyle::parse_fill(value)
        .ok_or_else(|| format!("invalid color '{value}': expected r,g,b or #rrggbb"))
}

/// Output format for `search`.
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
