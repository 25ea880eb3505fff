//! Binary geometry decoder
//!
//! Pulls one command at a time from the bytes following the header. Each step
//! reads a single id byte, looks the id up in [`COMMAND_TABLE`] and decodes
//! exactly the payload that command declares. Running out of input is reported
//! as [`Record::End`], never as an error.

use std::io::Read;

use tracing::{debug, warn};

use super::error::{CliError, Result};
use super::types::{Command, Hatches, Point, Polyline, Record, Segment, StreamEnd, Units};
use super::wire::{WireError, WireReader, WireResult};

/// Binary command variants, keyed by their one-byte id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    LayerReal,
    LayerScaled,
    PolylineShort,
    PolylineLong,
    HatchesShort,
    HatchesLong,
}

pub const COMMAND_TABLE: [(u8, CommandKind); 6] = [
    (127, CommandKind::LayerReal),
    (128, CommandKind::LayerScaled),
    (129, CommandKind::PolylineShort),
    (130, CommandKind::PolylineLong),
    (131, CommandKind::HatchesShort),
    (132, CommandKind::HatchesLong),
];

impl CommandKind {
    pub fn from_id(id: u8) -> Option<Self> {
        COMMAND_TABLE
            .iter()
            .find(|(known, _)| *known == id)
            .map(|(_, kind)| *kind)
    }

    fn decode<R: Read>(self, wire: &mut WireReader<R>, units: Units) -> WireResult<Command> {
        match self {
            CommandKind::LayerReal => Ok(Command::LayerReal { z: wire.f32_be()? }),
            CommandKind::LayerScaled => {
                let z_raw = wire.u16_be()?;
                Ok(Command::LayerScaled {
                    z_raw,
                    z: units.scale(z_raw),
                })
            }
            CommandKind::PolylineShort => decode_polyline_short(wire, units).map(Command::PolylineShort),
            CommandKind::PolylineLong => decode_polyline_long(wire).map(Command::PolylineLong),
            CommandKind::HatchesShort => decode_hatches_short(wire, units).map(Command::HatchesShort),
            CommandKind::HatchesLong => decode_hatches_long(wire).map(Command::HatchesLong),
        }
    }
}

fn decode_polyline_short<R: Read>(wire: &mut WireReader<R>, units: Units) -> WireResult<Polyline> {
    let id = wire.u16_be()?;
    let direction = wire.u16_be()?;
    let count = wire.u16_be()?;

    let mut points = Vec::new();
    for _ in 0..count {
        let x = units.scale(wire.u16_be()?);
        let y = units.scale(wire.u16_be()?);
        points.push(Point { x, y });
    }

    Ok(Polyline {
        id: id.into(),
        direction: direction.into(),
        count: count.into(),
        points,
    })
}

// Long-format coordinates are stored as real values and are not divided by the units divisor.
fn decode_polyline_long<R: Read>(wire: &mut WireReader<R>) -> WireResult<Polyline> {
    let id = wire.i32_be()?;
    let direction = wire.i32_be()?;
    let count = wire.i32_be()?;

    let mut points = Vec::new();
    for _ in 0..count.max(0) {
        let x = f64::from(wire.f32_be()?);
        let y = f64::from(wire.f32_be()?);
        points.push(Point { x, y });
    }

    Ok(Polyline {
        id: id.into(),
        direction: direction.into(),
        count: count.into(),
        points,
    })
}

fn decode_hatches_short<R: Read>(wire: &mut WireReader<R>, units: Units) -> WireResult<Hatches> {
    let id = wire.u16_be()?;
    let count = wire.u16_be()?;

    let mut segments = Vec::new();
    for _ in 0..count {
        let sx = units.scale(wire.u16_be()?);
        let sy = units.scale(wire.u16_be()?);
        let ex = units.scale(wire.u16_be()?);
        let ey = units.scale(wire.u16_be()?);
        segments.push(Segment { sx, sy, ex, ey });
    }

    Ok(Hatches {
        id: id.into(),
        count: count.into(),
        segments,
    })
}

fn decode_hatches_long<R: Read>(wire: &mut WireReader<R>) -> WireResult<Hatches> {
    let id = wire.i32_be()?;
    let count = wire.i32_be()?;

    let mut segments = Vec::new();
    for _ in 0..count.max(0) {
        let sx = f64::from(wire.f32_be()?);
        let sy = f64::from(wire.f32_be()?);
        let ex = f64::from(wire.f32_be()?);
        let ey = f64::from(wire.f32_be()?);
        segments.push(Segment { sx, sy, ex, ey });
    }

    Ok(Hatches {
        id: id.into(),
        count: count.into(),
        segments,
    })
}

/// Lazy, finite, non-restartable stream of geometry commands.
///
/// The stream finishes after an [`Command::Unknown`], at end of input, or on an
/// I/O error. Once finished, [`CommandDecoder::next_record`] keeps returning
/// `Record::End(StreamEnd::Clean)` and the iterator yields `None`.
pub struct CommandDecoder<R> {
    wire: WireReader<R>,
    units: Units,
    finished: bool,
}

impl<R: Read> CommandDecoder<R> {
    /// `reader` must already be positioned at `offset`, the start of the geometry.
    pub fn new(reader: R, units: Units, offset: u64) -> Self {
        Self {
            wire: WireReader::new(reader, offset),
            units,
            finished: false,
        }
    }

    /// Absolute offset of the next unread byte
    pub fn offset(&self) -> u64 {
        self.wire.offset()
    }

    pub fn next_record(&mut self) -> Result<Record> {
        if self.finished {
            return Ok(Record::End(StreamEnd::Clean));
        }

        let start = self.wire.offset();
        let id = match self.wire.command_id() {
            Ok(Some(id)) => id,
            Ok(None) => {
                self.finished = true;
                debug!(offset = start, "geometry stream ended at command boundary");
                return Ok(Record::End(StreamEnd::Clean));
            }
            Err(e) => return Err(self.fail(e, start)),
        };

        let Some(kind) = CommandKind::from_id(id) else {
            self.finished = true;
            warn!(id, offset = start, "unknown or unsupported binary command id, stopping");
            return Ok(Record::Command(Command::Unknown { id, offset: start }));
        };

        match kind.decode(&mut self.wire, self.units) {
            Ok(command) => Ok(Record::Command(command)),
            Err(WireError::Eof) => {
                self.finished = true;
                warn!(id, offset = start, "geometry stream truncated inside a record");
                Ok(Record::End(StreamEnd::Truncated { offset: start }))
            }
            Err(e) => Err(self.fail(e, start)),
        }
    }

    fn fail(&mut self, e: WireError, offset: u64) -> CliError {
        self.finished = true;
        match e {
            WireError::Io(e) => CliError::Io(e),
            // id byte reads never report Eof, but keep the mapping total
            WireError::Eof => CliError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("unexpected end of geometry at offset {}", offset),
            )),
        }
    }
}

impl<R: Read> Iterator for CommandDecoder<R> {
    type Item = Result<Command>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_record() {
            Ok(Record::Command(command)) => Some(Ok(command)),
            Ok(Record::End(_)) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
