//! Writes the same wire types the [`Decoder`](crate::Decoder) reads.
//!
//! Used to assemble scripts in tests and tools.

use actorscript_types::ArgType;

#[derive(Debug, Clone, Default)]
pub struct Encoder {
    bytes: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current length, which is also the offset of the next byte written.
    pub fn position(&self) -> usize {
        self.bytes.len()
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.bytes.push(v);
        self
    }

    pub fn i8(&mut self, v: i8) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i16(&mut self, v: i16) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// Latin-1 text plus the zero terminator. Characters above U+00FF are
    /// written as `?`.
    pub fn string(&mut self, s: &str) -> &mut Self {
        self.bytes
            .extend(s.chars().map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?')));
        self.bytes.push(0);
        self
    }

    /// Write a number with the width and signedness of `ty`, truncating.
    /// Strings take the number's decimal form.
    pub fn value(&mut self, ty: ArgType, n: i64) -> &mut Self {
        match ty {
            ArgType::Int8 => self.i8(n as i8),
            ArgType::Uint8 => self.u8(n as u8),
            ArgType::Int16 => self.i16(n as i16),
            ArgType::Uint16 => self.u16(n as u16),
            ArgType::Int32 => self.i32(n as i32),
            ArgType::Uint32 => self.u32(n as u32),
            ArgType::String => self.string(&n.to_string()),
        }
    }

    /// Overwrite a previously written u16, for patching forward jumps.
    pub fn patch_u16(&mut self, at: usize, v: u16) -> &mut Self {
        if let Some(slot) = self.bytes.get_mut(at..at + 2) {
            slot.copy_from_slice(&v.to_le_bytes());
        }
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chained_writes() {
        let bytes = Encoder::new().u8(0x0C).u16(0x1234).string("hi").finish();
        assert_eq!(bytes, vec![0x0C, 0x34, 0x12, b'h', b'i', 0]);
    }

    #[test]
    fn test_patch_forward_jump() {
        let mut e = Encoder::new();
        e.u8(0x0F);
        let slot = e.position();
        e.u16(0);
        e.u8(0x10);
        let target = e.position() as u16;
        e.patch_u16(slot, target);
        assert_eq!(e.as_bytes(), &[0x0F, 4, 0, 0x10]);
    }
}
