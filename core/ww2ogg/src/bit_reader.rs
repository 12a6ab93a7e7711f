//! Bit-level readers for Vorbis data.
//!
//! Vorbis packs fields LSB-first within each byte; these readers produce
//! bits in that order from a stream or a byte slice and keep count of how
//! many bits have been consumed.

use crate::error::{Ww2OggError, Ww2OggResult};
use std::io::Read;

/// Trait for reading bits from a source.
pub trait BitRead {
    /// Read a single bit.
    fn read_bit(&mut self) -> Ww2OggResult<bool>;

    /// Total number of bits read so far.
    fn total_bits_read(&self) -> u64;

    /// Read `count` bits (at most 32), first bit landing at the LSB.
    fn read_bits(&mut self, count: u8) -> Ww2OggResult<u32> {
        if count > 32 {
            return Err(Ww2OggError::parse("Cannot read more than 32 bits at once"));
        }

        let mut value = 0u32;
        for i in 0..count {
            if self.read_bit()? {
                value |= 1u32 << i;
            }
        }
        Ok(value)
    }
}

/// Bit reader over any [`Read`] source.
pub struct BitReader<R: Read> {
    inner: R,
    current: u8,
    // Bits of `current` not yet handed out.
    remaining: u8,
    consumed: u64,
}

impl<R: Read> BitReader<R> {
    /// Create a new reader starting at the source's current position.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            current: 0,
            remaining: 0,
            consumed: 0,
        }
    }
}

impl<R: Read> BitRead for BitReader<R> {
    fn read_bit(&mut self) -> Ww2OggResult<bool> {
        if self.remaining == 0 {
            let mut buf = [0u8; 1];
            self.inner
                .read_exact(&mut buf)
                .map_err(|_| Ww2OggError::end_of_stream("Out of bits"))?;
            self.current = buf[0];
            self.remaining = 8;
        }

        let bit = self.current & 1 != 0;
        self.current >>= 1;
        self.remaining -= 1;
        self.consumed += 1;
        Ok(bit)
    }

    fn total_bits_read(&self) -> u64 {
        self.consumed
    }
}

/// Bit reader over an in-memory byte slice.
pub struct BitSliceReader<'a> {
    data: &'a [u8],
    // Absolute bit position from the start of `data`.
    pos: usize,
}

impl<'a> BitSliceReader<'a> {
    /// Create a new reader over `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl BitRead for BitSliceReader<'_> {
    fn read_bit(&mut self) -> Ww2OggResult<bool> {
        let byte = self
            .data
            .get(self.pos >> 3)
            .ok_or_else(|| Ww2OggError::end_of_stream("Out of bits"))?;
        let bit = byte >> (self.pos & 7) & 1 != 0;
        self.pos += 1;
        Ok(bit)
    }

    fn total_bits_read(&self) -> u64 {
        self.pos as u64
    }
}
