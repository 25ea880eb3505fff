//! Binary to ASCII transcoding driver
//!
//! Runs the header scanner, then pulls commands from the decoder and pushes
//! them to the ASCII writer one at a time:
//!
//! ```text
//! Idle -> HeaderRead -> Aborted                      (no $$BINARY / no $$HEADEREND)
//!                    -> Streaming -> Completed       (unknown command id)
//!                                 -> CompletedWithTruncation (end of input)
//!                                 -> Aborted         (I/O failure, output closed best-effort)
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{info, warn};

use super::ascii::AsciiWriter;
use super::decoder::CommandDecoder;
use super::error::{CliError, Result};
use super::header::scan_header;
use super::types::{Command, Header, Record, StreamEnd};

/// How a successful run finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Stopped at an unknown command id; its diagnostic comment was written
    Completed {
        unknown_id: u8,
        offset: u64,
        commands: usize,
    },
    /// Input ran out. `partial_record` is set when it ended inside a record.
    CompletedWithTruncation { partial_record: bool, commands: usize },
}

impl Completion {
    /// Number of geometry commands written, not counting a diagnostic comment
    pub fn commands(&self) -> usize {
        match self {
            Completion::Completed { commands, .. } => *commands,
            Completion::CompletedWithTruncation { commands, .. } => *commands,
        }
    }
}

/// Scan the header from the start of `reader` and require binary geometry.
pub fn read_binary_header<R: BufRead + Seek>(reader: &mut R) -> Result<Header> {
    reader.seek(SeekFrom::Start(0))?;
    let header = scan_header(reader)?;
    header.ensure_binary()?;
    Ok(header)
}

fn pump<R: Read, W: Write>(
    decoder: &mut CommandDecoder<R>,
    writer: &mut AsciiWriter<W>,
) -> Result<Completion> {
    loop {
        match decoder.next_record()? {
            Record::Command(command) => {
                writer.write_command(&command)?;
                if let Command::Unknown { id, offset } = command {
                    return Ok(Completion::Completed {
                        unknown_id: id,
                        offset,
                        commands: writer.commands_written() - 1,
                    });
                }
            }
            Record::End(end) => {
                return Ok(Completion::CompletedWithTruncation {
                    partial_record: matches!(end, StreamEnd::Truncated { .. }),
                    commands: writer.commands_written(),
                });
            }
        }
    }
}

/// Write the ASCII form of an already scanned binary file to `out`.
///
/// The geometry section is closed on every path; when an I/O error aborts the
/// run the close is best-effort and the error is returned.
pub fn stream_geometry<R: Read + Seek, W: Write>(
    header: &Header,
    reader: &mut R,
    out: W,
) -> Result<Completion> {
    reader.seek(SeekFrom::Start(header.geometry_offset))?;

    let mut writer = AsciiWriter::new(out);
    let mut decoder = CommandDecoder::new(&mut *reader, header.units, header.geometry_offset);

    let result = writer
        .write_header(header)
        .and_then(|_| pump(&mut decoder, &mut writer));

    match result {
        Ok(completion) => {
            writer.finish()?;
            Ok(completion)
        }
        Err(e) => {
            writer.abandon();
            Err(e)
        }
    }
}

/// Transcode a binary CLI stream to ASCII in one pass.
///
/// Nothing is written to `out` when the header is rejected.
pub fn transcode<R: BufRead + Seek, W: Write>(reader: &mut R, out: W) -> Result<Completion> {
    let header = read_binary_header(reader)?;
    stream_geometry(&header, reader, out)
}

/// Convert the binary CLI file at `input` into an ASCII CLI file at `output`.
///
/// `output` is created (or truncated) only once the input header is accepted.
pub fn convert_file(input: &Path, output: &Path) -> Result<Completion> {
    if !input.is_file() {
        return Err(CliError::InputNotFound(input.to_path_buf()));
    }

    let mut reader = BufReader::new(File::open(input)?);
    let header = read_binary_header(&mut reader)?;

    let out = BufWriter::new(File::create(output)?);
    let completion = stream_geometry(&header, &mut reader, out)?;

    match completion {
        Completion::Completed {
            unknown_id, offset, ..
        } => warn!(
            id = unknown_id,
            offset,
            commands = completion.commands(),
            "stopped at unknown command"
        ),
        Completion::CompletedWithTruncation { partial_record, .. } => info!(
            partial_record,
            commands = completion.commands(),
            "reached end of geometry stream"
        ),
    }
    info!(
        input = %input.display(),
        output = %output.display(),
        "converted to ASCII CLI"
    );

    Ok(completion)
}
