//! Byte cursor over one script buffer.
//!
//! Integers are little-endian and sized by [`ArgType::size`]. Strings run to
//! the next zero byte, which is consumed but not returned; each byte maps to
//! one Latin-1 character.

use actorscript_types::{ArgType, ArgValue};
use thiserror::Error;

/// Failure while reading from a script buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A read needed more bytes than remain.
    #[error("buffer overrun at offset {offset}: needed {needed} byte(s), buffer is {len} long")]
    Overrun {
        offset: usize,
        needed: usize,
        len: usize,
    },
}

pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Forward-only reader.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Start reading at `pos`.
    pub fn at(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Byte under the cursor, without consuming it.
    pub fn peek_u8(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        let [b] = self.take::<1>()?;
        Ok(b)
    }

    /// Read one value of the given wire type and advance past it.
    pub fn read(&mut self, ty: ArgType) -> DecodeResult<ArgValue> {
        let n = match ty {
            ArgType::Int8 => i8::from_le_bytes(self.take::<1>()?) as i64,
            ArgType::Uint8 => u8::from_le_bytes(self.take::<1>()?) as i64,
            ArgType::Int16 => i16::from_le_bytes(self.take::<2>()?) as i64,
            ArgType::Uint16 => u16::from_le_bytes(self.take::<2>()?) as i64,
            ArgType::Int32 => i32::from_le_bytes(self.take::<4>()?) as i64,
            ArgType::Uint32 => u32::from_le_bytes(self.take::<4>()?) as i64,
            ArgType::String => return self.read_string().map(ArgValue::Text),
        };
        Ok(ArgValue::Number(n))
    }

    fn read_string(&mut self) -> DecodeResult<String> {
        let rest = self.bytes.get(self.pos..).unwrap_or(&[]);
        let Some(end) = rest.iter().position(|&b| b == 0) else {
            return Err(self.overrun(rest.len() + 1));
        };
        let text = rest[..end].iter().map(|&b| b as char).collect();
        self.pos += end + 1;
        Ok(text)
    }

    fn take<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let end = self.pos + N;
        let slice = self.bytes.get(self.pos..end).ok_or_else(|| self.overrun(N))?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.pos = end;
        Ok(out)
    }

    fn overrun(&self, needed: usize) -> DecodeError {
        DecodeError::Overrun {
            offset: self.pos,
            needed,
            len: self.bytes.len(),
        }
    }
}
