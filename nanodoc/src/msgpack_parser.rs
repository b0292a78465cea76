// SPDX-License-Identifier: Apache-2.0

//! MessagePack parser: single-pass type-byte dispatch building directly
//! into a [`Document`].
//!
//! All multi-byte lengths and numbers are big-endian per the MessagePack
//! specification. `bin` payloads and `ext` values are stored opaquely and
//! re-emitted by the MsgPack serializer; map keys must be strings.
//! Length prefixes are never trusted blindly: payloads are read
//! incrementally, so a huge declared length on a short input fails with
//! [`Error::IncompleteInput`] instead of a giant allocation.

use alloc::vec::Vec;

use crate::document::{Document, ValueId};
use crate::error::{Error, Result};
use crate::input::Reader;
use crate::variant::{FloatValue, IntValue, UintValue};
use crate::DEFAULT_NESTING_LIMIT;

/// Knobs for one MsgPack parse.
#[derive(Debug, Clone)]
pub struct MsgPackParseOptions {
    /// Maximum container depth before the parser fails with
    /// [`Error::TooDeep`].
    pub nesting_limit: usize,
}

impl Default for MsgPackParseOptions {
    fn default() -> Self {
        MsgPackParseOptions {
            nesting_limit: DEFAULT_NESTING_LIMIT,
        }
    }
}

/// Parses one MessagePack value from `input` into `doc`, replacing its
/// previous content. Bytes after the first complete value are left
/// unconsumed, so concatenated streams can be read value by value.
pub fn parse_msgpack<R: Reader>(doc: &mut Document, input: R) -> Result<()> {
    parse_msgpack_with(doc, input, &MsgPackParseOptions::default())
}

/// [`parse_msgpack`] with explicit options.
pub fn parse_msgpack_with<R: Reader>(
    doc: &mut Document,
    input: R,
    options: &MsgPackParseOptions,
) -> Result<()> {
    doc.set_null(doc.root());
    let root = doc.root();
    let mut parser = MsgPackParser {
        doc,
        input,
        scratch: Vec::new(),
    };
    parser.parse_document(root, options.nesting_limit)
}

struct MsgPackParser<'d, R: Reader> {
    doc: &'d mut Document,
    input: R,
    scratch: Vec<u8>,
}

impl<R: Reader> MsgPackParser<'_, R> {
    fn parse_document(&mut self, root: ValueId, limit: usize) -> Result<()> {
        let first = self.input.read().ok_or(Error::EmptyInput)?;
        self.parse_value(first, root, limit)
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.input.read().ok_or(Error::IncompleteInput)
    }

    fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        if self.input.read_n(&mut buf) != 2 {
            return Err(Error::IncompleteInput);
        }
        Ok(u16::from_be_bytes(buf))
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        if self.input.read_n(&mut buf) != 4 {
            return Err(Error::IncompleteInput);
        }
        Ok(u32::from_be_bytes(buf))
    }

    fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        if self.input.read_n(&mut buf) != 8 {
            return Err(Error::IncompleteInput);
        }
        Ok(u64::from_be_bytes(buf))
    }

    /// Reads `len` payload bytes into the scratch buffer, chunk by chunk
    /// so a hostile length prefix cannot trigger a giant reservation.
    fn read_payload(&mut self, len: usize) -> Result<()> {
        self.scratch.clear();
        let mut chunk = [0u8; 64];
        let mut remaining = len;
        while remaining > 0 {
            let take = remaining.min(chunk.len());
            let got = self.input.read_n(&mut chunk[..take]);
            if got == 0 {
                return Err(Error::IncompleteInput);
            }
            self.scratch.extend_from_slice(&chunk[..got]);
            remaining -= got;
        }
        Ok(())
    }

    fn parse_value(&mut self, type_byte: u8, id: ValueId, limit: usize) -> Result<()> {
        match type_byte {
            0x00..=0x7F => self.doc.set_uint(id, type_byte as UintValue),
            0x80..=0x8F => return self.parse_map(id, (type_byte & 0x0F) as usize, limit),
            0x90..=0x9F => return self.parse_array(id, (type_byte & 0x0F) as usize, limit),
            0xA0..=0xBF => {
                self.read_payload((type_byte & 0x1F) as usize)?;
                self.store_string(id)?;
            }
            0xC0 => self.doc.set_null(id),
            0xC2 => self.doc.set_bool(id, false),
            0xC3 => self.doc.set_bool(id, true),
            0xC4 => {
                let len = self.read_u8()? as usize;
                self.read_payload(len)?;
                self.store_binary(id)?;
            }
            0xC5 => {
                let len = self.read_u16()? as usize;
                self.read_payload(len)?;
                self.store_binary(id)?;
            }
            0xC6 => {
                let len = self.read_u32()? as usize;
                self.read_payload(len)?;
                self.store_binary(id)?;
            }
            0xC7 => {
                let len = self.read_u8()? as usize;
                self.parse_ext(id, len)?;
            }
            0xC8 => {
                let len = self.read_u16()? as usize;
                self.parse_ext(id, len)?;
            }
            0xC9 => {
                let len = self.read_u32()? as usize;
                self.parse_ext(id, len)?;
            }
            0xCA => {
                let bits = self.read_u32()?;
                self.doc.set_float(id, f32::from_bits(bits) as FloatValue);
            }
            0xCB => {
                let bits = self.read_u64()?;
                self.doc.set_float(id, f64::from_bits(bits) as FloatValue);
            }
            0xCC => {
                let value = self.read_u8()?;
                self.doc.set_uint(id, value as UintValue);
            }
            0xCD => {
                let value = self.read_u16()?;
                self.doc.set_uint(id, value as UintValue);
            }
            0xCE => {
                let value = self.read_u32()?;
                self.doc.store_u64(id, value as u64);
            }
            0xCF => {
                let value = self.read_u64()?;
                self.doc.store_u64(id, value);
            }
            0xD0 => {
                let value = self.read_u8()? as i8;
                self.doc.set_int(id, value as IntValue);
            }
            0xD1 => {
                let value = self.read_u16()? as i16;
                self.doc.set_int(id, value as IntValue);
            }
            0xD2 => {
                let value = self.read_u32()? as i32;
                self.doc.store_i64(id, value as i64);
            }
            0xD3 => {
                let value = self.read_u64()? as i64;
                self.doc.store_i64(id, value);
            }
            0xD4..=0xD8 => {
                let len = 1usize << (type_byte - 0xD4);
                self.parse_ext(id, len)?;
            }
            0xD9 => {
                let len = self.read_u8()? as usize;
                self.read_payload(len)?;
                self.store_string(id)?;
            }
            0xDA => {
                let len = self.read_u16()? as usize;
                self.read_payload(len)?;
                self.store_string(id)?;
            }
            0xDB => {
                let len = self.read_u32()? as usize;
                self.read_payload(len)?;
                self.store_string(id)?;
            }
            0xDC => {
                let len = self.read_u16()? as usize;
                return self.parse_array(id, len, limit);
            }
            0xDD => {
                let len = self.read_u32()? as usize;
                return self.parse_array(id, len, limit);
            }
            0xDE => {
                let len = self.read_u16()? as usize;
                return self.parse_map(id, len, limit);
            }
            0xDF => {
                let len = self.read_u32()? as usize;
                return self.parse_map(id, len, limit);
            }
            0xE0..=0xFF => self.doc.set_int(id, type_byte as i8 as IntValue),
            // 0xC1 is permanently reserved.
            0xC1 => return Err(Error::InvalidInput),
        }
        Ok(())
    }

    fn store_string(&mut self, id: ValueId) -> Result<()> {
        let payload = core::mem::take(&mut self.scratch);
        let result = self.doc.set_str_bytes(id, &payload);
        self.scratch = payload;
        result
    }

    fn store_binary(&mut self, id: ValueId) -> Result<()> {
        let payload = core::mem::take(&mut self.scratch);
        let result = self.doc.set_extension(id, None, &payload);
        self.scratch = payload;
        result
    }

    fn parse_ext(&mut self, id: ValueId, len: usize) -> Result<()> {
        let code = self.read_u8()? as i8;
        self.read_payload(len)?;
        let payload = core::mem::take(&mut self.scratch);
        let result = self.doc.set_extension(id, Some(code), &payload);
        self.scratch = payload;
        result
    }

    fn parse_array(&mut self, id: ValueId, len: usize, limit: usize) -> Result<()> {
        if limit == 0 {
            return Err(Error::TooDeep);
        }
        self.doc.to_array(id);
        for _ in 0..len {
            let element = self.doc.add_element(id)?;
            let type_byte = self.read_u8()?;
            self.parse_value(type_byte, element, limit - 1)?;
        }
        Ok(())
    }

    fn parse_map(&mut self, id: ValueId, len: usize, limit: usize) -> Result<()> {
        if limit == 0 {
            return Err(Error::TooDeep);
        }
        self.doc.to_object(id);
        for _ in 0..len {
            let key_byte = self.read_u8()?;
            let key_len = match key_byte {
                0xA0..=0xBF => (key_byte & 0x1F) as usize,
                0xD9 => self.read_u8()? as usize,
                0xDA => self.read_u16()? as usize,
                0xDB => self.read_u32()? as usize,
                // Map keys must be strings.
                _ => return Err(Error::InvalidInput),
            };
            self.read_payload(key_len)?;
            let key = core::mem::take(&mut self.scratch);
            let member = self.doc.add_member_bytes(id, &key);
            self.scratch = key;
            let member = member?;
            let type_byte = self.read_u8()?;
            self.parse_value(type_byte, member, limit - 1)?;
        }
        Ok(())
    }
}
