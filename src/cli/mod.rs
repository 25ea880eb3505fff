//! Common Layer Interface (CLI) format module
//!
//! This module reads binary CLI files, transcodes them to ASCII CLI and parses
//! either form into a layer-by-layer object model.

pub mod ascii;
pub mod collab;
pub mod convert;
pub mod decoder;
pub mod error;
pub mod header;
pub mod parser;
pub mod types;
mod wire;

// Re-export main public API
pub use ascii::{AsciiWriter, format_command};
pub use collab::{DeviceSession, LayerDrawingEmitter, export_layers};
pub use convert::{Completion, convert_file, transcode};
pub use decoder::{CommandDecoder, CommandKind};
pub use error::{CliError, Result};
pub use header::scan_header;
pub use parser::parse_cli;
pub use types::*;
