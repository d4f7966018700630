//! Cursor over a script buffer.

use crate::error::DecodeError;
use crate::op::{Color, Point};

pub struct ScriptReader<'src> {
    bytes: &'src [u8],
    pos: usize,
}

impl<'src> ScriptReader<'src> {
    pub const fn new(bytes: &'src [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub const fn offset(&self) -> usize {
        self.pos
    }

    pub const fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Reads the next opcode. The caller checks `remaining() >= 2` first, so
    /// `None` only comes back on an exhausted buffer.
    pub fn opcode(&mut self) -> Option<u16> {
        let bytes: &'src [u8] = self.bytes;
        let tag = bytes.get(self.pos..self.pos + 2)?;
        self.pos += 2;
        Some(u16::from_be_bytes([tag[0], tag[1]]))
    }

    /// Opens the operand section of one record. `offset` is where its opcode
    /// started and is reported in every error raised through the record.
    pub fn record(&mut self, op: &'static str, offset: usize) -> Record<'_, 'src> {
        Record {
            reader: self,
            op,
            offset,
        }
    }
}

/// Operand reader scoped to one record.
pub struct Record<'rd, 'src> {
    reader: &'rd mut ScriptReader<'src>,
    op: &'static str,
    offset: usize,
}

impl<'src> Record<'_, 'src> {
    fn truncated(&self, needed: usize) -> DecodeError {
        DecodeError::Truncated {
            op: self.op,
            offset: self.offset,
            needed,
            available: self.reader.remaining(),
        }
    }

    /// Fails unless at least `len` operand bytes remain. Fixed layouts check
    /// their full size up front so the error reports the whole record.
    pub fn require(&self, len: usize) -> Result<(), DecodeError> {
        if self.reader.remaining() < len {
            return Err(self.truncated(len));
        }
        Ok(())
    }

    pub fn invalid(&self, value: u32) -> DecodeError {
        DecodeError::InvalidOperand {
            op: self.op,
            offset: self.offset,
            value,
        }
    }

    pub fn sprite_overflow(&self, count: u32) -> DecodeError {
        DecodeError::SpriteOverflow {
            offset: self.offset,
            count,
        }
    }

    pub fn take(&mut self, len: usize) -> Result<&'src [u8], DecodeError> {
        let bytes: &'src [u8] = self.reader.bytes;
        let start = self.reader.pos;
        let slice = start
            .checked_add(len)
            .and_then(|end| bytes.get(start..end))
            .ok_or_else(|| self.truncated(len))?;
        self.reader.pos += len;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        self.take(len).map(|_| ())
    }

    pub fn u16(&mut self) -> Result<u16, DecodeError> {
        let raw = self.take(2)?;
        Ok(u16::from_be_bytes([raw[0], raw[1]]))
    }

    pub fn u32(&mut self) -> Result<u32, DecodeError> {
        let raw = self.take(4)?;
        Ok(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    pub fn f32(&mut self) -> Result<f32, DecodeError> {
        self.u32().map(f32::from_bits)
    }

    pub fn point(&mut self) -> Result<Point, DecodeError> {
        let x = self.f32()?;
        let y = self.f32()?;
        Ok(Point::new(x, y))
    }

    pub fn color(&mut self) -> Result<Color, DecodeError> {
        let raw = self.take(4)?;
        Ok(Color::rgba(raw[0], raw[1], raw[2], raw[3]))
    }

    /// String payload of `len` bytes followed by zero padding to a 4-byte
    /// boundary. Invalid UTF-8 is replaced, not rejected.
    pub fn padded_string(&mut self, len: usize) -> Result<String, DecodeError> {
        let pad = padding(len);
        self.require(len + pad)?;
        let raw = self.take(len)?;
        self.skip(pad)?;
        Ok(String::from_utf8_lossy(raw).into_owned())
    }

    /// `u16` length prefix followed by a padded string.
    pub fn prefixed_string(&mut self) -> Result<String, DecodeError> {
        let len = usize::from(self.u16()?);
        self.padded_string(len)
    }
}

/// Zero bytes that follow a string of `len` bytes on the wire.
pub const fn padding(len: usize) -> usize {
    (4 - (len % 4)) % 4
}
