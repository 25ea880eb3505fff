//! # laser-cli
//!
//! A Rust library for Common Layer Interface (CLI) files, the per-layer
//! geometry format used by layered-manufacturing and laser-marking machines.
//!
//! ## Features
//!
//! - **Binary to ASCII**: Transcode binary CLI geometry to ASCII CLI in a single
//!   streaming pass
//! - **Structured parsing**: Read binary or ASCII CLI into layers of loops and
//!   hatches, serializable to JSON
//!
//! ## Example - Binary to ASCII
//!
//! ```rust,ignore
//! use laser_cli::cli::convert_file;
//! use std::path::Path;
//!
//! let completion = convert_file(Path::new("part.cli"), Path::new("part_ascii.cli")).unwrap();
//! println!("{} commands", completion.commands());
//! ```
//!
//! ## Example - Structured parsing
//!
//! ```rust,ignore
//! use laser_cli::cli::{RecordWidth, parse_cli};
//!
//! let bytes = std::fs::read("part.cli").unwrap();
//! let parsed = parse_cli(&bytes, RecordWidth::Long).unwrap();
//! std::fs::write("part.json", parsed.to_json().unwrap()).unwrap();
//! ```

pub mod cli;
pub mod logging;

// Re-export commonly used items
pub use cli::{CliError, Completion, ParsedCliFile, RecordWidth, convert_file, parse_cli, transcode};
