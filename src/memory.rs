//! Byte-addressable memory serviced on behalf of the clocked model.
//!
//! All multi-byte values are packed and unpacked little-endian through
//! `to_le_bytes`/`from_le_bytes`; there is no reinterpretation of buffers.
//! Every access is bounds checked against `[base, base + size)` before any
//! byte is touched, so a failed access never leaves a partial write behind.

use std::fmt::Write as _;

use log::debug;

use crate::error::{Result, SimError};

/// Default stack headroom appended after a loaded image.
pub const DEFAULT_STACK_BYTES: usize = 0x3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AccessWidth {
    Byte = 1,
    Half = 2,
    Word = 4,
}

impl AccessWidth {
    pub const fn bytes(self) -> usize {
        self as usize
    }
}

/// Size code driven on the model's `mem_size` bus.
///
/// The low two bits select the width (`1 << code`), bit 2 marks the load as
/// unsigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MemSize {
    Byte = 0b000,
    Half = 0b001,
    Word = 0b010,
    ByteUnsigned = 0b100,
    HalfUnsigned = 0b101,
}

impl MemSize {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0b000 => Ok(MemSize::Byte),
            0b001 => Ok(MemSize::Half),
            0b010 => Ok(MemSize::Word),
            0b100 => Ok(MemSize::ByteUnsigned),
            0b101 => Ok(MemSize::HalfUnsigned),
            _ => Err(SimError::InvalidSizeCode { code }),
        }
    }

    pub fn width(self) -> AccessWidth {
        match self {
            MemSize::Byte | MemSize::ByteUnsigned => AccessWidth::Byte,
            MemSize::Half | MemSize::HalfUnsigned => AccessWidth::Half,
            MemSize::Word => AccessWidth::Word,
        }
    }

    pub fn signed(self) -> bool {
        matches!(self, MemSize::Byte | MemSize::Half)
    }
}

/// Contiguous memory region starting at `base`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSpace {
    bytes: Vec<u8>,
    base: u32,
}

impl AddressSpace {
    /// A zero-filled region of `size` bytes starting at `base`.
    pub fn new(size: usize, base: u32) -> Self {
        Self {
            bytes: vec![0; size],
            base,
        }
    }

    /// A region holding `image` followed by `extra_reserve` zero bytes.
    pub fn with_image(image: &[u8], extra_reserve: usize, base: u32) -> Self {
        let mut space = Self::new(0, base);
        space.load_image(image, extra_reserve, Some(base));
        space
    }

    /// Replaces the contents with `image` plus `extra_reserve` bytes of
    /// zeroed headroom. `base` is only changed when one is given.
    pub fn load_image(&mut self, image: &[u8], extra_reserve: usize, base: Option<u32>) {
        self.bytes.clear();
        self.bytes.reserve(image.len() + extra_reserve);
        self.bytes.extend_from_slice(image);
        self.bytes.resize(image.len() + extra_reserve, 0);
        if let Some(base) = base {
            self.base = base;
        }
        debug!(
            "loaded {} byte image at 0x{:08x} with {} bytes of headroom",
            image.len(),
            self.base,
            extra_reserve
        );
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Highest 16-byte aligned address that still leaves a word below the end.
    pub fn stack_top(&self) -> u32 {
        // Bytes past 2^32 have no address.
        let end = (u64::from(self.base) + self.bytes.len() as u64).min(1 << 32);
        let top = end.saturating_sub(4) / 16 * 16;
        top.max(u64::from(self.base)) as u32
    }

    /// Translates `address` into a buffer offset for an access of `len` bytes.
    fn offset(&self, address: u32, len: usize) -> Result<usize> {
        let start = u64::from(address);
        let base = u64::from(self.base);
        let end = base + self.bytes.len() as u64;
        if start < base || start + len as u64 > end {
            return Err(SimError::OutOfRange {
                address,
                width: len,
                base: self.base,
                size: self.bytes.len(),
            });
        }
        Ok((start - base) as usize)
    }

    pub fn load(&self, address: u32, width: AccessWidth, signed: bool) -> Result<u32> {
        let len = width.bytes();
        let offset = self.offset(address, len)?;

        let mut raw = [0u8; 4];
        raw[..len].copy_from_slice(&self.bytes[offset..offset + len]);
        let word = u32::from_le_bytes(raw);

        Ok(match (width, signed) {
            (AccessWidth::Byte, true) => word as u8 as i8 as i32 as u32,
            (AccessWidth::Half, true) => word as u16 as i16 as i32 as u32,
            _ => word,
        })
    }

    pub fn store(&mut self, address: u32, width: AccessWidth, value: u32) -> Result<()> {
        let len = width.bytes();
        let offset = self.offset(address, len)?;
        self.bytes[offset..offset + len].copy_from_slice(&value.to_le_bytes()[..len]);
        Ok(())
    }

    /// Load using the model's size code.
    pub fn load_sized(&self, address: u32, size: MemSize) -> Result<u32> {
        self.load(address, size.width(), size.signed())
    }

    /// Store using the model's size code. Signedness is irrelevant for stores.
    pub fn store_sized(&mut self, address: u32, size: MemSize, value: u32) -> Result<()> {
        self.store(address, size.width(), value)
    }

    pub fn read_bytes(&self, address: u32, len: usize) -> Result<&[u8]> {
        let offset = self.offset(address, len)?;
        Ok(&self.bytes[offset..offset + len])
    }

    pub fn write_bytes(&mut self, address: u32, data: &[u8]) -> Result<()> {
        let offset = self.offset(address, data.len())?;
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Renders the buffer eight bytes per row as ` xx:c`, with `.` standing
    /// in for bytes that have no graphic representation.
    pub fn hexdump(&self) -> String {
        let mut out = String::from("Memory dump");
        for (i, byte) in self.bytes.iter().enumerate() {
            if i % 8 == 0 {
                out.push('\n');
            }
            let shown = if byte.is_ascii_graphic() {
                *byte as char
            } else {
                '.'
            };
            let _ = write!(out, " {byte:02x}:{shown}");
        }
        out.push('\n');
        out
    }
}
