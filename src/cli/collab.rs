//! Contracts for the tools that consume parsed CLI data
//!
//! Drawing export and machine control live outside this crate. These traits
//! describe what they accept so callers can plug their own implementations in.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use super::error::Result;
use super::types::{CliLayer, ParsedCliFile};

/// Writes one vector drawing per layer: one polyline entity per loop and one
/// line entity per hatch segment.
pub trait LayerDrawingEmitter {
    /// Emit `layer` and return the path of the written drawing.
    fn emit_layer(&mut self, index: usize, layer: &CliLayer) -> Result<PathBuf>;
}

/// Hand every layer of `parsed` to `emitter` in order, stopping at the first error.
pub fn export_layers<E: LayerDrawingEmitter>(
    parsed: &ParsedCliFile,
    emitter: &mut E,
) -> Result<Vec<PathBuf>> {
    parsed
        .layers
        .iter()
        .enumerate()
        .map(|(index, layer)| {
            let path = emitter.emit_layer(index, layer)?;
            debug!(index, path = %path.display(), "exported layer drawing");
            Ok(path)
        })
        .collect()
}

/// Stateful session with a marking device.
pub trait DeviceSession {
    fn connect(&mut self, address: &str, port: u16) -> bool;
    fn disconnect(&mut self);
    /// Device status bitmask
    fn status(&self) -> u32;
    fn import_drawing(&mut self, path: &std::path::Path, id: &str, flags: u32) -> bool;
    fn start_execution(&mut self) -> bool;
    fn wait_for_completion(&mut self, timeout: Duration) -> bool;
    fn emergency_stop(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::error::CliError;
    use crate::cli::types::CliHeader;

    struct RecordingEmitter {
        heights: Vec<f32>,
        fail_at: Option<usize>,
    }

    impl LayerDrawingEmitter for RecordingEmitter {
        fn emit_layer(&mut self, index: usize, layer: &CliLayer) -> Result<PathBuf> {
            if self.fail_at == Some(index) {
                return Err(CliError::Io(std::io::Error::other("cannot write drawing")));
            }
            self.heights.push(layer.height);
            Ok(PathBuf::from(format!("layer_{}.dxf", index)))
        }
    }

    fn parsed(heights: &[f32]) -> ParsedCliFile {
        ParsedCliFile {
            header: CliHeader {
                binary: true,
                units: 1.0,
                version: 0.0,
                aligned: false,
                layers: None,
            },
            layers: heights.iter().map(|h| CliLayer::new(*h)).collect(),
        }
    }

    #[test]
    fn test_export_layers_in_order() {
        let mut emitter = RecordingEmitter {
            heights: Vec::new(),
            fail_at: None,
        };
        let paths = export_layers(&parsed(&[0.1, 0.2, 0.3]), &mut emitter).unwrap();
        assert_eq!(emitter.heights, vec![0.1, 0.2, 0.3]);
        assert_eq!(paths[2], PathBuf::from("layer_2.dxf"));
    }

    #[test]
    fn test_export_layers_stops_at_error() {
        let mut emitter = RecordingEmitter {
            heights: Vec::new(),
            fail_at: Some(1),
        };
        assert!(export_layers(&parsed(&[0.1, 0.2, 0.3]), &mut emitter).is_err());
        assert_eq!(emitter.heights, vec![0.1]);
    }
}
