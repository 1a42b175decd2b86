use std::path::Path;

use pdfredact::{SweepOptions, Sweeper};

pub fn run(dir: &Path, phrase: &str, options: SweepOptions, json: bool) -> Result<(), i32> {
    if phrase.trim().is_empty() {
        eprintln!("Error: invalid input: phrase is empty");
        return Err(1);
    }

    let summary = Sweeper::new(options).run(dir, phrase);

    if json {
        let json_str = serde_json::to_string(&summary).map_err(|e| {
            eprintln!("Error: failed to serialize summary: {e}");
            1
        })?;
        println!("{json_str}");
    } else {
        println!("{summary}");
        if let Some(err) = &summary.listing_error {
            eprintln!("Error: {err}");
        }
    }

    if summary.is_clean() { Ok(()) } else { Err(1) }
}
