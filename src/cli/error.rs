//! Error type shared by the header scanner, decoder, driver and parser

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("the input file does not appear to be in binary CLI format (missing $$BINARY in header)")]
    MissingBinaryMarker,

    #[error("could not find $$HEADEREND in the input file")]
    MissingHeaderEnd,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("geometry at {location} appears before any $$LAYER")]
    GeometryBeforeLayer { location: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
