mod cli;
mod redact_cmd;
mod search_cmd;
mod shared;
mod sweep_cmd;

use clap::Parser;
use cli::Cli;
use pdfredact::{RedactOptions, SearchOptions, SweepOptions};

fn main() {
    let cli = Cli::parse();
    shared::init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        cli::Commands::Redact {
            ref file,
            ref phrase,
            ref output,
            ref suffix,
            ref style,
        } => redact_cmd::run(
            file,
            phrase,
            output.as_deref(),
            suffix,
            style.redact_options(),
        ),
        cli::Commands::Sweep {
            ref dir,
            ref phrase,
            ref suffix,
            ref exclude_dirs,
            skip_suffixed,
            follow_links,
            json,
            ref style,
        } => {
            let options = SweepOptions {
                suffix: suffix.clone(),
                exclude_dirs: exclude_dirs.clone(),
                skip_suffixed,
                follow_links,
                redact: style.redact_options(),
            };
            sweep_cmd::run(dir, phrase, options, json)
        }
        cli::Commands::Search {
            ref file,
            ref phrase,
            ignore_case,
            ref format,
        } => {
            let options = RedactOptions {
                search: SearchOptions {
                    case_sensitive: !ignore_case,
                },
                ..RedactOptions::default()
            };
            search_cmd::run(file, phrase, options, format)
        }
    };

    if let Err(code) = result {
        std::process::exit(code);
    }
}
