use std::path::Path;

use pdfredact::{Quad, Rect};
use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level follows `--verbose` and
/// `--quiet`, defaulting to `info`.
pub fn init_logging(verbose: bool, quiet: bool) {
    let default = default_filter(verbose, quiet);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn default_filter(verbose: bool, quiet: bool) -> &'static str {
    match (verbose, quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    }
}

/// Fail early with a readable message when `file` is missing.
pub fn require_file(file: &Path) -> Result<(), i32> {
    if !file.is_file() {
        eprintln!("Error: file not found: {}", file.display());
        return Err(1);
    }
    Ok(())
}

/// Bounding box of all quads of one match.
pub fn bounding_rect(quads: &[Quad]) -> Option<Rect> {
    quads
        .iter()
        .map(Quad::rect)
        .reduce(|acc, rect| acc.union(&rect))
}
