// SPDX-License-Identifier: Apache-2.0

//! Byte sink abstraction consumed by the serializers.

use alloc::vec::Vec;

/// A push-based sink of bytes.
///
/// Returns the number of bytes actually written; a short write stops the
/// serializer's byte count from growing but is otherwise not an error, so
/// fixed-size sinks simply truncate.
pub trait Writer {
    /// Writes `bytes`, returning how many were accepted.
    fn write(&mut self, bytes: &[u8]) -> usize;
}

impl Writer for Vec<u8> {
    fn write(&mut self, bytes: &[u8]) -> usize {
        self.extend_from_slice(bytes);
        bytes.len()
    }
}

impl<W: Writer + ?Sized> Writer for &mut W {
    fn write(&mut self, bytes: &[u8]) -> usize {
        (**self).write(bytes)
    }
}

/// A sink that discards bytes and counts them; backs the `measure_*`
/// entry points.
#[derive(Debug, Default)]
pub struct CountingWriter {
    count: usize,
}

impl CountingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes written so far.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl Writer for CountingWriter {
    fn write(&mut self, bytes: &[u8]) -> usize {
        self.count += bytes.len();
        bytes.len()
    }
}

/// A sink over a caller-supplied buffer; writes past the end are dropped.
#[derive(Debug)]
pub struct SliceWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of bytes written so far.
    pub fn written(&self) -> usize {
        self.pos
    }
}

impl Writer for SliceWriter<'_> {
    fn write(&mut self, bytes: &[u8]) -> usize {
        let room = self.buf.len() - self.pos;
        let count = bytes.len().min(room);
        self.buf[self.pos..self.pos + count].copy_from_slice(&bytes[..count]);
        self.pos += count;
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_writer() {
        let mut out = Vec::new();
        assert_eq!(out.write(b"abc"), 3);
        assert_eq!(out.write(b"de"), 2);
        assert_eq!(out, b"abcde");
    }

    #[test]
    fn test_counting_writer() {
        let mut out = CountingWriter::new();
        out.write(b"hello");
        out.write(b", world");
        assert_eq!(out.count(), 12);
    }

    #[test]
    fn test_slice_writer_truncates() {
        let mut buf = [0u8; 4];
        let mut out = SliceWriter::new(&mut buf);
        assert_eq!(out.write(b"abc"), 3);
        assert_eq!(out.write(b"def"), 1);
        assert_eq!(out.written(), 4);
        assert_eq!(&buf, b"abcd");
    }
}
