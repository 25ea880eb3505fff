//! Header scanner
//!
//! Reads the text header of a CLI file line by line over raw bytes, so the
//! geometry offset is the reader's own cursor after the `$$HEADEREND` line
//! ending rather than anything reconstructed from decoded strings.

use std::io::{self, BufRead};

use tracing::debug;

use super::error::{CliError, Result};
use super::types::{Header, Units};

pub const UNITS_PREFIX: &str = "$$UNITS/";
pub const BINARY_MARKER: &str = "$$BINARY";
pub const ASCII_MARKER: &str = "$$ASCII";
pub const HEADER_END: &str = "$$HEADEREND";

/// Case-insensitive ASCII prefix test that never splits a multi-byte char
pub(crate) fn starts_with_ignore_case(line: &str, prefix: &str) -> bool {
    line.len() >= prefix.len()
        && line.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Numeric field of a `$$NAME/value` directive, parsed with `.` as decimal point
pub(crate) fn directive_number(line: &str) -> Option<f64> {
    line.split('/').nth(1)?.trim().parse::<f64>().ok()
}

/// Read one line of raw bytes into `line`, excluding its terminator.
///
/// Accepts `\n`, `\r\n` and a lone `\r`. Returns the number of bytes consumed
/// from the reader including the terminator; `0` means end of input.
fn read_raw_line<R: BufRead>(reader: &mut R, line: &mut Vec<u8>) -> io::Result<usize> {
    let mut consumed = 0;

    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Ok(consumed);
        }

        match available.iter().position(|&b| b == b'\n' || b == b'\r') {
            Some(i) => {
                line.extend_from_slice(&available[..i]);
                let ending = available[i];
                reader.consume(i + 1);
                consumed += i + 1;

                if ending == b'\r' {
                    let next = reader.fill_buf()?;
                    if next.first() == Some(&b'\n') {
                        reader.consume(1);
                        consumed += 1;
                    }
                }
                return Ok(consumed);
            }
            None => {
                let n = available.len();
                line.extend_from_slice(available);
                reader.consume(n);
                consumed += n;
            }
        }
    }
}

/// Scan the header from the start of `reader`.
///
/// Stops right after the `$$HEADEREND` line, or at end of input. The returned
/// header records whether the binary marker and terminator were seen; use
/// [`Header::ensure_binary`] to turn their absence into an error.
pub fn scan_header<R: BufRead>(reader: &mut R) -> Result<Header> {
    let mut lines = Vec::new();
    let mut units = Units::default();
    let mut binary = false;
    let mut header_end_found = false;
    let mut offset: u64 = 0;
    let mut raw = Vec::new();

    loop {
        raw.clear();
        let consumed = read_raw_line(reader, &mut raw)?;
        if consumed == 0 {
            break;
        }
        offset += consumed as u64;

        let line = String::from_utf8_lossy(&raw).into_owned();

        if starts_with_ignore_case(&line, UNITS_PREFIX) {
            if let Some(value) = directive_number(&line) {
                units = units.with_override(value);
            }
            lines.push(line);
        } else if starts_with_ignore_case(&line, BINARY_MARKER) {
            binary = true;
            lines.push(ASCII_MARKER.to_string());
        } else if starts_with_ignore_case(&line, HEADER_END) {
            lines.push(line);
            header_end_found = true;
            break;
        } else {
            lines.push(line);
        }
    }

    debug!(
        lines = lines.len(),
        divisor = units.divisor(),
        binary,
        header_end_found,
        offset,
        "scanned header"
    );

    Ok(Header {
        lines,
        units,
        binary,
        header_end_found,
        geometry_offset: offset,
    })
}

impl Header {
    /// Fails unless the header declares binary geometry and was terminated.
    pub fn ensure_binary(&self) -> Result<()> {
        if !self.binary {
            return Err(CliError::MissingBinaryMarker);
        }
        if !self.header_end_found {
            return Err(CliError::MissingHeaderEnd);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scan(bytes: &[u8]) -> Header {
        scan_header(&mut Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn test_offset_after_lf_terminator() {
        let header = scan(b"$$HEADERSTART\n$$BINARY\n$$HEADEREND\n\x7f");
        assert!(header.binary);
        assert!(header.header_end_found);
        assert_eq!(header.geometry_offset, 35);
        assert_eq!(
            header.lines,
            vec!["$$HEADERSTART", "$$ASCII", "$$HEADEREND"]
        );
    }

    #[test]
    fn test_offset_after_crlf_terminator() {
        let header = scan(b"$$BINARY\r\n$$HEADEREND\r\n\x80\x00\x01");
        assert_eq!(header.geometry_offset, 23);
        assert_eq!(header.lines, vec!["$$ASCII", "$$HEADEREND"]);
    }

    #[test]
    fn test_offset_after_lone_cr_terminator() {
        let header = scan(b"$$BINARY\r$$HEADEREND\r\x7f");
        assert_eq!(header.geometry_offset, 21);
    }

    #[test]
    fn test_offset_counts_multibyte_text() {
        // "é" is two bytes in UTF-8
        let header = scan("$$LABEL/é\n$$BINARY\n$$HEADEREND\n".as_bytes());
        assert_eq!(header.geometry_offset, 32);
        assert_eq!(header.lines[0], "$$LABEL/é");
    }

    #[test]
    fn test_terminator_is_case_insensitive() {
        let header = scan(b"$$binary\n$$headerend\n");
        assert!(header.binary);
        assert!(header.header_end_found);
        assert_eq!(header.lines[1], "$$headerend");
    }

    #[test]
    fn test_units_override() {
        let header = scan(b"$$UNITS/2.0\n$$BINARY\n$$HEADEREND\n");
        assert_eq!(header.units.divisor(), 2.0);
        assert_eq!(header.lines[0], "$$UNITS/2.0");
    }

    #[test]
    fn test_units_prefix_is_case_insensitive() {
        let header = scan(b"$$units/2\n$$binary\n$$headerend\n");
        assert_eq!(header.units.divisor(), 2.0);
        assert_eq!(header.lines[0], "$$units/2");
    }

    #[test]
    fn test_units_zero_is_ignored() {
        let header = scan(b"$$UNITS/0\n$$BINARY\n$$HEADEREND\n");
        assert_eq!(header.units.divisor(), 1.0);
    }

    #[test]
    fn test_units_unparseable_is_ignored() {
        let header = scan(b"$$UNITS/0,005\n$$BINARY\n$$HEADEREND\n");
        assert_eq!(header.units.divisor(), 1.0);
        let header = scan(b"$$UNITS/\n$$BINARY\n$$HEADEREND\n");
        assert_eq!(header.units.divisor(), 1.0);
    }

    #[test]
    fn test_missing_marker_and_terminator() {
        let header = scan(b"$$UNITS/1\n$$HEADEREND\n");
        assert!(matches!(
            header.ensure_binary(),
            Err(CliError::MissingBinaryMarker)
        ));

        let header = scan(b"$$BINARY\n$$UNITS/1\n");
        assert!(!header.header_end_found);
        assert!(matches!(
            header.ensure_binary(),
            Err(CliError::MissingHeaderEnd)
        ));
    }

    #[test]
    fn test_stops_reading_at_terminator() {
        let mut cursor = Cursor::new(&b"$$BINARY\n$$HEADEREND\n\x7f\x41\x48\x00\x00"[..]);
        let header = scan_header(&mut cursor).unwrap();
        assert_eq!(cursor.position(), header.geometry_offset);
    }
}
