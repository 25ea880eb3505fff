use clap::Parser;
use laser_cli::cli::{CliError, Completion, convert_file};
use laser_cli::logging;
use std::path::PathBuf;
use std::process;
use tracing::error;

/// Convert a binary CLI file to ASCII CLI
#[derive(Parser, Debug)]
#[command(name = "cli-to-ascii", version, about)]
struct Args {
    /// Binary CLI input file
    input: PathBuf,
    /// ASCII CLI output file (created or truncated)
    output: PathBuf,
}

fn main() {
    let args = Args::parse();
    logging::init();

    match convert_file(&args.input, &args.output) {
        Ok(Completion::Completed { unknown_id, .. }) => {
            println!(
                "Converted '{}' to ASCII CLI format: '{}' (stopped at unknown command ID {})",
                args.input.display(),
                args.output.display(),
                unknown_id
            );
        }
        Ok(Completion::CompletedWithTruncation { commands, .. }) => {
            println!(
                "Successfully converted '{}' to ASCII CLI format: '{}' ({} commands)",
                args.input.display(),
                args.output.display(),
                commands
            );
        }
        Err(e @ CliError::InputNotFound(_)) => {
            error!("{}", e);
            process::exit(2);
        }
        Err(e @ (CliError::MissingBinaryMarker | CliError::MissingHeaderEnd)) => {
            error!("{}", e);
            process::exit(3);
        }
        Err(e) => {
            error!("Error converting '{}': {}", args.input.display(), e);
            process::exit(4);
        }
    }
}
