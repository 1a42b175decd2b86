use std::path::Path;

use pdfredact::{Outcome, RedactOptions, Redactor, output_path_for};

use crate::shared::require_file;

pub fn run(
    file: &Path,
    phrase: &str,
    output: Option<&Path>,
    suffix: &str,
    options: RedactOptions,
) -> Result<(), i32> {
    require_file(file)?;
    let output = match output {
        Some(path) => path.to_path_buf(),
        None => output_path_for(file, suffix),
    };

    let redactor = Redactor::new(options);
    match redactor.redact(file, phrase, &output) {
        Outcome::Redacted => {
            println!("redacted\t{}", output.display());
            Ok(())
        }
        Outcome::Failed => {
            eprintln!("Error: redaction failed for {}", file.display());
            Err(1)
        }
        outcome => {
            println!("{outcome}\t{}", file.display());
            Ok(())
        }
    }
}
