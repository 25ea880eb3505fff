//! ASCII CLI emitter

use std::fmt::Write as _;
use std::io::Write;

use super::error::Result;
use super::types::{Command, Hatches, Header, Polyline};

pub const GEOMETRY_START: &str = "$$GEOMETRYSTART";
pub const GEOMETRY_END: &str = "$$GEOMETRYEND";

/// Format a number with 6 decimal places
///
/// Rust's float formatting never consults the locale, so the decimal point is always `.`.
fn f(n: f64) -> String {
    format!("{:.6}", n)
}

/// Replace anything outside 7-bit ASCII with `?`
pub fn to_ascii_lossy(line: &str) -> String {
    line.chars()
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect()
}

fn format_polyline(p: &Polyline) -> String {
    let mut line = format!("$$POLYLINE/{},{},{}", p.id, p.direction, p.count);
    for point in &p.points {
        let _ = write!(line, ",{},{}", f(point.x), f(point.y));
    }
    line
}

fn format_hatches(h: &Hatches) -> String {
    let mut line = format!("$$HATCHES/{},{}", h.id, h.count);
    for s in &h.segments {
        let _ = write!(
            line,
            ",{},{},{},{}",
            f(s.sx),
            f(s.sy),
            f(s.ex),
            f(s.ey)
        );
    }
    line
}

/// Render one command as a single ASCII CLI line (without line ending)
pub fn format_command(command: &Command) -> String {
    match command {
        Command::LayerReal { z } => format!("$$LAYER/{}", f(f64::from(*z))),
        Command::LayerScaled { z, .. } => format!("$$LAYER/{}", f(*z)),
        Command::PolylineShort(p) | Command::PolylineLong(p) => format_polyline(p),
        Command::HatchesShort(h) | Command::HatchesLong(h) => format_hatches(h),
        Command::Unknown { id, .. } => format!(
            "$$COMMENT/Unknown binary command ID {} encountered during conversion.",
            id
        ),
    }
}

/// Streaming writer for the ASCII form of a CLI file.
///
/// Lines are written as they arrive; nothing is retained between commands.
pub struct AsciiWriter<W: Write> {
    out: W,
    accepting: bool,
    written: usize,
}

impl<W: Write> AsciiWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            accepting: true,
            written: 0,
        }
    }

    /// Write the header lines followed by the geometry-start marker
    pub fn write_header(&mut self, header: &Header) -> Result<()> {
        for line in &header.lines {
            writeln!(self.out, "{}", to_ascii_lossy(line))?;
        }
        writeln!(self.out, "{}", GEOMETRY_START)?;
        Ok(())
    }

    /// Write one command. Returns `false` once an unknown command has closed
    /// the stream; later commands are dropped.
    pub fn write_command(&mut self, command: &Command) -> Result<bool> {
        if !self.accepting {
            return Ok(false);
        }
        writeln!(self.out, "{}", format_command(command))?;
        self.written += 1;
        if command.is_terminal() {
            self.accepting = false;
        }
        Ok(true)
    }

    /// Number of command lines written so far, including an unknown-command comment
    pub fn commands_written(&self) -> usize {
        self.written
    }

    /// Close the geometry section and flush
    pub fn finish(mut self) -> Result<W> {
        writeln!(self.out, "{}", GEOMETRY_END)?;
        self.out.flush()?;
        Ok(self.out)
    }

    /// Best-effort close used when the run is aborting; errors are ignored.
    pub fn abandon(mut self) -> W {
        let _ = writeln!(self.out, "{}", GEOMETRY_END);
        let _ = self.out.flush();
        self.out
    }
}
