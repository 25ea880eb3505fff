use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Scale factor converting stored integer coordinates to real-world units.
///
/// Never zero: a zero or unparseable `$$UNITS` override leaves the default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Units {
    divisor: f64,
}

impl Units {
    /// Build from a raw divisor, falling back to `1.0` when it is zero or not finite.
    pub fn new(divisor: f64) -> Self {
        Self::default().with_override(divisor)
    }

    pub fn divisor(&self) -> f64 {
        self.divisor
    }

    /// Returns `self` unchanged unless `divisor` is a usable value.
    pub fn with_override(self, divisor: f64) -> Self {
        if divisor != 0.0 && divisor.is_finite() {
            Self { divisor }
        } else {
            self
        }
    }

    /// Convert a short-format stored value to real units.
    pub fn scale(&self, raw: u16) -> f64 {
        f64::from(raw) / self.divisor
    }
}

impl Default for Units {
    fn default() -> Self {
        Self { divisor: 1.0 }
    }
}

/// Binary record width: 16-bit integers (scaled) or 32-bit ints/floats (unscaled)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordWidth {
    Short,
    Long,
}

impl FromStr for RecordWidth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "short" => Ok(RecordWidth::Short),
            "long" => Ok(RecordWidth::Long),
            other => Err(format!("unknown record width '{}', expected short or long", other)),
        }
    }
}

impl fmt::Display for RecordWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordWidth::Short => f.write_str("short"),
            RecordWidth::Long => f.write_str("long"),
        }
    }
}

/// Parsed header of a CLI file
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Header lines in file order, `$$BINARY` already rewritten to `$$ASCII`
    pub lines: Vec<String>,
    pub units: Units,
    pub binary: bool,
    pub header_end_found: bool,
    /// Byte offset immediately after the `$$HEADEREND` line ending
    pub geometry_offset: u64,
}

/// One decoded point of a polyline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// One decoded hatch segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub sx: f64,
    pub sy: f64,
    pub ex: f64,
    pub ey: f64,
}

/// Polyline record. Integer fields are widened so both widths share one type.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub id: i64,
    pub direction: i64,
    pub count: i64,
    pub points: Vec<Point>,
}

/// Hatches record
#[derive(Debug, Clone, PartialEq)]
pub struct Hatches {
    pub id: i64,
    pub count: i64,
    pub segments: Vec<Segment>,
}

/// A single decoded geometry command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Id 127, Z already real-valued
    LayerReal { z: f32 },
    /// Id 128, Z already divided by the units divisor
    LayerScaled { z_raw: u16, z: f64 },
    PolylineShort(Polyline),
    PolylineLong(Polyline),
    HatchesShort(Hatches),
    HatchesLong(Hatches),
    /// Unrecognised id; decoding stops here
    Unknown { id: u8, offset: u64 },
}

impl Command {
    /// Width of the record, `None` for layer and unknown commands
    pub fn width(&self) -> Option<RecordWidth> {
        match self {
            Command::PolylineShort(_) | Command::HatchesShort(_) => Some(RecordWidth::Short),
            Command::PolylineLong(_) | Command::HatchesLong(_) => Some(RecordWidth::Long),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Command::Unknown { .. })
    }
}

/// Why the geometry stream ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// End of file exactly at a command boundary
    Clean,
    /// End of file inside a record that started at `offset`
    Truncated { offset: u64 },
}

/// One step of the geometry stream: a command, or the explicit end marker
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Command(Command),
    End(StreamEnd),
}

/// Header section of the structured model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliHeader {
    pub binary: bool,
    pub units: f64,
    pub version: f32,
    pub aligned: bool,
    pub layers: Option<usize>,
}

/// Boundary loop in a layer; `points` is flat `[x0, y0, x1, y1, ...]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliLoop {
    pub id: i64,
    pub dir: i64,
    pub points: Vec<f32>,
}

/// Hatch set in a layer; `points` is flat `[sx, sy, ex, ey, ...]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliHatches {
    pub id: i64,
    pub points: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliLayer {
    pub height: f32,
    pub loops: Vec<CliLoop>,
    pub hatches: Vec<CliHatches>,
}

impl CliLayer {
    pub fn new(height: f32) -> Self {
        Self {
            height,
            loops: Vec::new(),
            hatches: Vec::new(),
        }
    }
}

/// Structured object graph of a whole CLI file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedCliFile {
    pub header: CliHeader,
    pub layers: Vec<CliLayer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_default() {
        assert_eq!(Units::default().divisor(), 1.0);
    }

    #[test]
    fn test_units_ignores_zero_override() {
        let units = Units::new(2.0).with_override(0.0);
        assert_eq!(units.divisor(), 2.0);
        assert_eq!(Units::new(0.0).divisor(), 1.0);
    }

    #[test]
    fn test_units_ignores_non_finite() {
        assert_eq!(Units::new(f64::NAN).divisor(), 1.0);
        assert_eq!(Units::new(f64::INFINITY).divisor(), 1.0);
    }

    #[test]
    fn test_units_scale() {
        assert_eq!(Units::new(2.0).scale(20000), 10000.0);
    }

    #[test]
    fn test_record_width_from_str() {
        assert_eq!("short".parse::<RecordWidth>(), Ok(RecordWidth::Short));
        assert_eq!("LONG".parse::<RecordWidth>(), Ok(RecordWidth::Long));
        assert!("medium".parse::<RecordWidth>().is_err());
    }
}
