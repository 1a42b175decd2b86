use std::path::Path;

use pdfredact::{PageMatches, RedactOptions, Redactor};

use crate::cli::OutputFormat;
use crate::shared::{bounding_rect, require_file};

pub fn run(
    file: &Path,
    phrase: &str,
    options: RedactOptions,
    format: &OutputFormat,
) -> Result<(), i32> {
    require_file(file)?;
    let pages = Redactor::new(options).search(file, phrase).map_err(|e| {
        eprintln!("Error: {e}");
        1
    })?;

    match format {
        OutputFormat::Text => write_text(&pages),
        OutputFormat::Json => write_json(&pages),
    }
}

fn write_text(pages: &[PageMatches]) -> Result<(), i32> {
    println!("page\ttext\tx0\ty0\tx1\ty1");

    for page in pages {
        for m in &page.matches {
            let Some(rect) = bounding_rect(&m.quads) else {
                continue;
            };
            println!(
                "{}\t{}\t{:.2}\t{:.2}\t{:.2}\t{:.2}",
                page.page + 1,
                m.text,
                rect.x0,
                rect.y0,
                rect.x1,
                rect.y1,
            );
        }
    }

    Ok(())
}

fn write_json(pages: &[PageMatches]) -> Result<(), i32> {
    let mut all_matches = Vec::new();

    for page in pages {
        for m in &page.matches {
            all_matches.push(serde_json::json!({
                "page": page.page + 1,
                "text": m.text,
                "bbox": bounding_rect(&m.quads),
                "quads": m.quads,
            }));
        }
    }

    let json_str = serde_json::to_string(&all_matches).map_err(|e| {
        eprintln!("Error: failed to serialize matches: {e}");
        1
    })?;
    println!("{json_str}");
    Ok(())
}
