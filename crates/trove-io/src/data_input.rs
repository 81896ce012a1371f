use crate::error::IoError;
use alloc::string::String;
use alloc::vec::Vec;
use log::trace;

/// Sequential big-endian reads from an in-memory byte array.
///
/// Every read advances the position. Reads that run past the end fail with
/// [`IoError::UnexpectedEof`] and leave the position untouched.
pub trait ByteArrayDataInput {
    fn read_fully(&mut self, buf: &mut [u8]) -> Result<(), IoError>;

    /// Skips up to `n` bytes, returning how many were actually skipped.
    fn skip_bytes(&mut self, n: usize) -> usize;

    fn read_bool(&mut self) -> Result<bool, IoError>;
    fn read_u8(&mut self) -> Result<u8, IoError>;
    fn read_i8(&mut self) -> Result<i8, IoError>;
    fn read_i16(&mut self) -> Result<i16, IoError>;
    fn read_u16(&mut self) -> Result<u16, IoError>;

    /// Reads one UTF-16 code unit.
    fn read_char(&mut self) -> Result<u16, IoError>;

    fn read_i32(&mut self) -> Result<i32, IoError>;
    fn read_i64(&mut self) -> Result<i64, IoError>;
    fn read_f32(&mut self) -> Result<f32, IoError>;
    fn read_f64(&mut self) -> Result<f64, IoError>;

    /// Reads bytes as Latin-1 up to `\n`, `\r` or `\r\n`. Returns `None` when
    /// no bytes remain.
    fn read_line(&mut self) -> Option<String>;

    /// Reads a u16 length prefix followed by that many bytes of modified
    /// UTF-8.
    fn read_utf(&mut self) -> Result<String, IoError>;
}

/// [`ByteArrayDataInput`] over a borrowed slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

/// Creates a reader over `bytes` starting at `start`.
pub fn new_data_input(bytes: &[u8], start: usize) -> Result<ByteReader<'_>, IoError> {
    if start > bytes.len() {
        return Err(IoError::OffsetOutOfBounds {
            offset: start,
            len: bytes.len(),
        });
    }
    Ok(ByteReader { bytes, pos: start })
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], IoError> {
        let mut buf = [0u8; N];
        self.read_fully(&mut buf)?;
        Ok(buf)
    }
}

impl ByteArrayDataInput for ByteReader<'_> {
    fn read_fully(&mut self, buf: &mut [u8]) -> Result<(), IoError> {
        if buf.len() > self.remaining() {
            return Err(IoError::UnexpectedEof {
                needed: buf.len(),
                remaining: self.remaining(),
            });
        }
        buf.copy_from_slice(&self.bytes[self.pos..self.pos + buf.len()]);
        self.pos += buf.len();
        Ok(())
    }

    fn skip_bytes(&mut self, n: usize) -> usize {
        let skipped = n.min(self.remaining());
        self.pos += skipped;
        skipped
    }

    fn read_bool(&mut self) -> Result<bool, IoError> {
        Ok(self.read_u8()? != 0)
    }

    fn read_u8(&mut self) -> Result<u8, IoError> {
        Ok(self.take::<1>()?[0])
    }

    fn read_i8(&mut self) -> Result<i8, IoError> {
        Ok(self.read_u8()? as i8)
    }

    fn read_i16(&mut self) -> Result<i16, IoError> {
        self.take().map(i16::from_be_bytes)
    }

    fn read_u16(&mut self) -> Result<u16, IoError> {
        self.take().map(u16::from_be_bytes)
    }

    fn read_char(&mut self) -> Result<u16, IoError> {
        self.read_u16()
    }

    fn read_i32(&mut self) -> Result<i32, IoError> {
        self.take().map(i32::from_be_bytes)
    }

    fn read_i64(&mut self) -> Result<i64, IoError> {
        self.take().map(i64::from_be_bytes)
    }

    fn read_f32(&mut self) -> Result<f32, IoError> {
        self.take().map(f32::from_be_bytes)
    }

    fn read_f64(&mut self) -> Result<f64, IoError> {
        self.take().map(f64::from_be_bytes)
    }

    fn read_line(&mut self) -> Option<String> {
        if self.remaining() == 0 {
            return None;
        }
        let mut line = String::new();
        while let Some(&b) = self.bytes.get(self.pos) {
            self.pos += 1;
            match b {
                b'\n' => break,
                b'\r' => {
                    if self.bytes.get(self.pos) == Some(&b'\n') {
                        self.pos += 1;
                    }
                    break;
                }
                _ => line.push(char::from(b)),
            }
        }
        Some(line)
    }

    fn read_utf(&mut self) -> Result<String, IoError> {
        let start = self.pos;
        let len = self.read_u16()? as usize;
        if len > self.remaining() {
            let remaining = self.remaining();
            self.pos = start;
            return Err(IoError::UnexpectedEof {
                needed: len,
                remaining,
            });
        }

        let body_start = self.pos;
        let body = &self.bytes[body_start..body_start + len];
        match decode_modified_utf8(body) {
            Ok(s) => {
                self.pos += len;
                Ok(s)
            }
            Err(offset) => {
                trace!("rejecting modified UTF-8 at byte {}", body_start + offset);
                self.pos = start;
                Err(IoError::MalformedUtf(body_start + offset))
            }
        }
    }
}

// On failure returns the offset of the offending byte within `body`.
fn decode_modified_utf8(body: &[u8]) -> Result<String, usize> {
    // Each UTF-16 unit with the offset of its first byte.
    let mut units: Vec<(u16, usize)> = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        let b0 = body[i];
        let continuation = |at: usize| match body.get(at) {
            Some(&b) if b & 0xC0 == 0x80 => Ok((b & 0x3F) as u16),
            _ => Err(at),
        };
        match b0 >> 4 {
            0x0..=0x7 => {
                units.push((b0 as u16, i));
                i += 1;
            }
            0xC | 0xD => {
                let b1 = continuation(i + 1)?;
                units.push((((b0 as u16 & 0x1F) << 6) | b1, i));
                i += 2;
            }
            0xE => {
                let b1 = continuation(i + 1)?;
                let b2 = continuation(i + 2)?;
                units.push((((b0 as u16 & 0x0F) << 12) | (b1 << 6) | b2, i));
                i += 3;
            }
            _ => return Err(i),
        }
    }

    let mut out = String::with_capacity(units.len());
    let mut consumed = 0;
    for decoded in char::decode_utf16(units.iter().map(|&(unit, _)| unit)) {
        match decoded {
            Ok(c) => {
                consumed += c.len_utf16();
                out.push(c);
            }
            Err(_) => return Err(units.get(consumed).map_or(0, |&(_, at)| at)),
        }
    }
    Ok(out)
}
