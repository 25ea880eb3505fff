//! Big-endian field reader for binary CLI records

use std::io::{self, ErrorKind, Read};

/// Why a field could not be read
#[derive(Debug)]
pub(crate) enum WireError {
    /// Input ended before the field was complete
    Eof,
    Io(io::Error),
}

impl From<io::Error> for WireError {
    fn from(e: io::Error) -> Self {
        if e.kind() == ErrorKind::UnexpectedEof {
            WireError::Eof
        } else {
            WireError::Io(e)
        }
    }
}

pub(crate) type WireResult<T> = std::result::Result<T, WireError>;

/// Reads fixed-width fields and tracks the absolute stream offset.
pub(crate) struct WireReader<R> {
    inner: R,
    offset: u64,
}

impl<R: Read> WireReader<R> {
    pub fn new(inner: R, offset: u64) -> Self {
        Self { inner, offset }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn array<const N: usize>(&mut self) -> WireResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf)?;
        self.offset += N as u64;
        Ok(buf)
    }

    /// Next command id, or `None` at a clean end of input
    pub fn command_id(&mut self) -> WireResult<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.offset += 1;
                    return Ok(Some(buf[0]));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn u16_be(&mut self) -> WireResult<u16> {
        self.array::<2>().map(u16::from_be_bytes)
    }

    pub fn i32_be(&mut self) -> WireResult<i32> {
        self.array::<4>().map(i32::from_be_bytes)
    }

    pub fn f32_be(&mut self) -> WireResult<f32> {
        self.array::<4>().map(f32::from_be_bytes)
    }
}
