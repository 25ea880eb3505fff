//! Structured CLI parser
//!
//! Builds the whole-file object graph (header summary plus layers of loops and
//! hatches) from either binary or ASCII CLI bytes. Binary geometry goes through
//! the same [`CommandDecoder`] as the transcoder, so termination rules match.

use std::io::Cursor;

use tracing::{debug, warn};

use super::decoder::CommandDecoder;
use super::error::{CliError, Result};
use super::header::{directive_number, scan_header, starts_with_ignore_case};
use super::types::{
    CliHatches, CliHeader, CliLayer, CliLoop, Command, Header, ParsedCliFile, RecordWidth,
};

const VERSION_PREFIX: &str = "$$VERSION/";
const LAYERS_PREFIX: &str = "$$LAYERS/";
const ALIGN_MARKER: &str = "$$ALIGN";

/// Summarise the header directives the structured model exposes.
fn summarize_header(header: &Header) -> CliHeader {
    let mut version = 0.0;
    let mut aligned = false;
    let mut layers = None;

    for line in &header.lines {
        if starts_with_ignore_case(line, VERSION_PREFIX) {
            if let Some(v) = directive_number(line) {
                // 200 means version 2.00
                version = (v / 100.0) as f32;
            }
        } else if starts_with_ignore_case(line, LAYERS_PREFIX) {
            layers = line
                .split('/')
                .nth(1)
                .and_then(|s| s.trim().parse::<usize>().ok());
        } else if starts_with_ignore_case(line, ALIGN_MARKER) {
            aligned = true;
        }
    }

    CliHeader {
        binary: header.binary,
        units: header.units.divisor(),
        version,
        aligned,
        layers,
    }
}

/// Accumulates commands into layers.
struct LayerBuilder {
    layers: Vec<CliLayer>,
}

impl LayerBuilder {
    fn new() -> Self {
        Self { layers: Vec::new() }
    }

    fn start_layer(&mut self, height: f32) {
        self.layers.push(CliLayer::new(height));
    }

    fn current(&mut self, location: impl FnOnce() -> String) -> Result<&mut CliLayer> {
        self.layers
            .last_mut()
            .ok_or_else(|| CliError::GeometryBeforeLayer {
                location: location(),
            })
    }

    fn push_command(&mut self, command: Command, offset: u64) -> Result<()> {
        let location = || format!("byte offset {}", offset);
        match command {
            Command::LayerReal { z } => self.start_layer(z),
            Command::LayerScaled { z, .. } => self.start_layer(z as f32),
            Command::PolylineShort(p) | Command::PolylineLong(p) => {
                let points = p
                    .points
                    .iter()
                    .flat_map(|pt| [pt.x as f32, pt.y as f32])
                    .collect();
                self.current(location)?.loops.push(CliLoop {
                    id: p.id,
                    dir: p.direction,
                    points,
                });
            }
            Command::HatchesShort(h) | Command::HatchesLong(h) => {
                let points = h
                    .segments
                    .iter()
                    .flat_map(|s| [s.sx as f32, s.sy as f32, s.ex as f32, s.ey as f32])
                    .collect();
                self.current(location)?.hatches.push(CliHatches { id: h.id, points });
            }
            Command::Unknown { .. } => {}
        }
        Ok(())
    }
}

fn parse_binary_geometry(bytes: &[u8], header: &Header, hint: RecordWidth) -> Result<Vec<CliLayer>> {
    let start = usize::try_from(header.geometry_offset)
        .unwrap_or(bytes.len())
        .min(bytes.len());
    let mut decoder = CommandDecoder::new(&bytes[start..], header.units, header.geometry_offset);
    let mut builder = LayerBuilder::new();
    let mut warned = false;

    loop {
        let offset = decoder.offset();
        let Some(command) = decoder.next().transpose()? else {
            break;
        };

        if let Some(width) = command.width()
            && width != hint
            && !warned
        {
            warn!(
                expected = %hint,
                found = %width,
                offset,
                "record width differs from the requested width, decoding by command id"
            );
            warned = true;
        }

        builder.push_command(command, offset)?;
    }

    Ok(builder.layers)
}

fn parse_ints<const N: usize>(fields: &[&str], line: usize) -> Result<[i64; N]> {
    let mut values = [0i64; N];
    for (i, value) in values.iter_mut().enumerate() {
        let field = fields.get(i).ok_or_else(|| CliError::Malformed {
            line,
            reason: format!("expected at least {} integer fields", N),
        })?;
        *value = field.trim().parse().map_err(|_| CliError::Malformed {
            line,
            reason: format!("invalid integer '{}'", field.trim()),
        })?;
    }
    Ok(values)
}

/// Number of coordinate fields that `count` items of `per_item` values occupy.
fn coordinate_count(count: i64, per_item: usize, line: usize) -> Result<usize> {
    usize::try_from(count.max(0))
        .ok()
        .and_then(|n| n.checked_mul(per_item))
        .ok_or_else(|| CliError::Malformed {
            line,
            reason: "point count out of range".to_string(),
        })
}

fn parse_reals(fields: &[&str], expected: usize, line: usize) -> Result<Vec<f32>> {
    if fields.len() != expected {
        return Err(CliError::Malformed {
            line,
            reason: format!("expected {} coordinates, found {}", expected, fields.len()),
        });
    }
    fields
        .iter()
        .map(|s| {
            s.trim().parse::<f32>().map_err(|_| CliError::Malformed {
                line,
                reason: format!("invalid number '{}'", s.trim()),
            })
        })
        .collect()
}

/// Split `$$NAME/params` into its upper-cased name and the parameter text.
fn split_command(text: &str) -> (String, &str) {
    match text.split_once('/') {
        Some((name, params)) => (name.to_ascii_uppercase(), params),
        None => (text.to_ascii_uppercase(), ""),
    }
}

fn parse_ascii_geometry(bytes: &[u8], header: &Header) -> Result<Vec<CliLayer>> {
    let start = usize::try_from(header.geometry_offset)
        .unwrap_or(bytes.len())
        .min(bytes.len());
    let text = String::from_utf8_lossy(&bytes[start..]);
    let first_line = header.lines.len() + 1;

    let mut builder = LayerBuilder::new();
    let mut in_geometry = false;

    for (index, raw) in text.lines().enumerate() {
        let line = first_line + index;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }

        let (name, params) = split_command(trimmed);
        let location = || format!("line {}", line);

        match name.as_str() {
            "$$GEOMETRYSTART" => in_geometry = true,
            "$$GEOMETRYEND" => break,
            _ if !in_geometry => debug!(line, "ignoring text outside the geometry section"),
            "$$LAYER" => {
                let z = params.trim().parse::<f32>().map_err(|_| CliError::Malformed {
                    line,
                    reason: format!("invalid layer height '{}'", params.trim()),
                })?;
                builder.start_layer(z);
            }
            "$$POLYLINE" => {
                let fields: Vec<&str> = params.split(',').collect();
                let [id, dir, count] = parse_ints::<3>(&fields, line)?;
                let expected = coordinate_count(count, 2, line)?;
                let points = parse_reals(&fields[3..], expected, line)?;
                builder.current(location)?.loops.push(CliLoop { id, dir, points });
            }
            "$$HATCHES" => {
                let fields: Vec<&str> = params.split(',').collect();
                let [id, count] = parse_ints::<2>(&fields, line)?;
                let expected = coordinate_count(count, 4, line)?;
                let points = parse_reals(&fields[2..], expected, line)?;
                builder.current(location)?.hatches.push(CliHatches { id, points });
            }
            other => debug!(line, command = other, "skipping unsupported command"),
        }
    }

    Ok(builder.layers)
}

/// Parse binary or ASCII CLI bytes into the structured model.
///
/// `hint` names the record width the caller expects. Binary records are always
/// decoded by their command id; a mismatch against the hint is only logged.
pub fn parse_cli(bytes: &[u8], hint: RecordWidth) -> Result<ParsedCliFile> {
    let header = scan_header(&mut Cursor::new(bytes))?;
    if !header.header_end_found {
        return Err(CliError::MissingHeaderEnd);
    }

    let layers = if header.binary {
        parse_binary_geometry(bytes, &header, hint)?
    } else {
        parse_ascii_geometry(bytes, &header)?
    };

    let parsed = ParsedCliFile {
        header: summarize_header(&header),
        layers,
    };
    debug!(
        binary = parsed.header.binary,
        layers = parsed.layers.len(),
        "parsed CLI file"
    );
    Ok(parsed)
}

impl ParsedCliFile {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
