// SPDX-License-Identifier: Apache-2.0

//! Byte source abstraction consumed by the parsers.
//!
//! The codecs never assume seekability: input is pulled one byte (or one
//! chunk) at a time, and end-of-input is signalled in-band.

/// A pull-based source of bytes.
///
/// Implemented for `&[u8]` out of the box; callers with streaming inputs
/// (UARTs, sockets, files) implement this themselves.
pub trait Reader {
    /// Pulls the next byte, or `None` at end of input.
    fn read(&mut self) -> Option<u8>;

    /// Fills as much of `buf` as possible, returning the number of bytes
    /// read. A return value smaller than `buf.len()` means end of input.
    fn read_n(&mut self, buf: &mut [u8]) -> usize {
        let mut count = 0;
        while count < buf.len() {
            match self.read() {
                Some(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                None => break,
            }
        }
        count
    }
}

impl Reader for &[u8] {
    fn read(&mut self) -> Option<u8> {
        let (&byte, rest) = self.split_first()?;
        *self = rest;
        Some(byte)
    }

    fn read_n(&mut self, buf: &mut [u8]) -> usize {
        let count = buf.len().min(self.len());
        buf[..count].copy_from_slice(&self[..count]);
        *self = &self[count..];
        count
    }
}

impl<R: Reader + ?Sized> Reader for &mut R {
    fn read(&mut self) -> Option<u8> {
        (**self).read()
    }

    fn read_n(&mut self, buf: &mut [u8]) -> usize {
        (**self).read_n(buf)
    }
}

/// A reader over a borrowed slice that tracks its position.
#[derive(Debug)]
pub struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    /// Creates a new reader over the given data.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl Reader for SliceReader<'_> {
    fn read(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    fn read_n(&mut self, buf: &mut [u8]) -> usize {
        let remaining = &self.data[self.pos.min(self.data.len())..];
        let count = buf.len().min(remaining.len());
        buf[..count].copy_from_slice(&remaining[..count]);
        self.pos += count;
        count
    }
}
