use clap::{Parser, ValueEnum};
use laser_cli::cli::{RecordWidth, parse_cli};
use laser_cli::logging;
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing::error;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Width {
    Short,
    Long,
}

impl From<Width> for RecordWidth {
    fn from(w: Width) -> Self {
        match w {
            Width::Short => RecordWidth::Short,
            Width::Long => RecordWidth::Long,
        }
    }
}

/// Parse a binary or ASCII CLI file and print it as JSON
#[derive(Parser, Debug)]
#[command(name = "cli-inspect", version, about)]
struct Args {
    /// CLI input file
    input: PathBuf,
    /// Record width the file is expected to use
    #[arg(value_enum)]
    width: Width,
}

fn main() {
    let args = Args::parse();
    logging::init();

    let bytes = match fs::read(&args.input) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Error reading input file '{}': {}", args.input.display(), e);
            process::exit(2);
        }
    };

    let parsed = match parse_cli(&bytes, args.width.into()) {
        Ok(p) => p,
        Err(e) => {
            error!("Error parsing CLI file: {}", e);
            process::exit(3);
        }
    };

    match parsed.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Error serializing CLI file: {}", e);
            process::exit(4);
        }
    }
}
