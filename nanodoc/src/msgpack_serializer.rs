// SPDX-License-Identifier: Apache-2.0

//! MessagePack serializer. Every value is emitted in its smallest
//! encoding: integers shrink to fixint/uint8/... as their magnitude
//! allows, and a float whose value is exactly an integer is demoted to
//! the integer encodings. Opaque binary and extension payloads captured
//! by the parser are re-emitted unchanged.

use alloc::vec::Vec;

use crate::document::{Document, ValueId};
use crate::output::{CountingWriter, Writer};
use crate::variant::{FloatValue, VariantData};

/// Serializes `doc` as MessagePack, returning the number of bytes
/// written.
pub fn serialize_msgpack<W: Writer>(doc: &Document, output: &mut W) -> usize {
    let mut serializer = MsgPackSerializer {
        doc,
        output,
        written: 0,
    };
    serializer.serialize_value(doc.root());
    serializer.written
}

/// The number of bytes [`serialize_msgpack`] would produce.
pub fn measure_msgpack(doc: &Document) -> usize {
    let mut counter = CountingWriter::new();
    serialize_msgpack(doc, &mut counter)
}

/// Serializes `doc` to a freshly allocated byte vector.
pub fn to_msgpack_vec(doc: &Document) -> Vec<u8> {
    let mut out = Vec::new();
    serialize_msgpack(doc, &mut out);
    out
}

struct MsgPackSerializer<'d, 'o, W: Writer> {
    doc: &'d Document,
    output: &'o mut W,
    written: usize,
}

impl<W: Writer> MsgPackSerializer<'_, '_, W> {
    fn emit(&mut self, bytes: &[u8]) {
        self.written += self.output.write(bytes);
    }

    fn emit_byte(&mut self, byte: u8) {
        self.emit(&[byte]);
    }

    fn serialize_value(&mut self, id: ValueId) {
        match self.doc.data(id) {
            VariantData::Null => self.emit_byte(0xC0),
            VariantData::Bool(false) => self.emit_byte(0xC2),
            VariantData::Bool(true) => self.emit_byte(0xC3),
            VariantData::Int(i) => self.serialize_i64(i as i64),
            VariantData::Uint(u) => self.serialize_u64(u as u64),
            VariantData::Float(f) => self.serialize_float(f),
            VariantData::OwnedStr(s) | VariantData::RawStr(s) => {
                let bytes = self.doc.string_bytes(s);
                self.serialize_string(bytes);
            }
            VariantData::LinkedStr(s) => self.serialize_string(s.as_bytes()),
            VariantData::Extension { code, data } => {
                let payload = self.doc.string_bytes(data);
                match code {
                    None => self.serialize_binary(payload),
                    Some(code) => self.serialize_ext(code, payload),
                }
            }
            VariantData::Array(col) => {
                self.serialize_array_header(self.doc.size(id));
                let mut cur = col.head;
                while !cur.is_nil() {
                    self.serialize_value(ValueId(cur));
                    cur = self.doc.chain_next(cur);
                }
            }
            VariantData::Object(col) => {
                self.serialize_map_header(self.doc.size(id));
                let mut cur = col.head;
                while !cur.is_nil() {
                    let value = self.doc.chain_next(cur);
                    if value.is_nil() {
                        break;
                    }
                    match self.doc.chain_data(cur) {
                        VariantData::OwnedStr(s) => {
                            let bytes = self.doc.string_bytes(s);
                            self.serialize_string(bytes);
                        }
                        VariantData::LinkedStr(s) => self.serialize_string(s.as_bytes()),
                        _ => self.serialize_string(b""),
                    }
                    self.serialize_value(ValueId(value));
                    cur = self.doc.chain_next(value);
                }
            }
        }
    }

    fn serialize_u64(&mut self, value: u64) {
        if value < 0x80 {
            self.emit_byte(value as u8);
        } else if value <= u8::MAX as u64 {
            self.emit(&[0xCC, value as u8]);
        } else if value <= u16::MAX as u64 {
            self.emit_byte(0xCD);
            self.emit(&(value as u16).to_be_bytes());
        } else if value <= u32::MAX as u64 {
            self.emit_byte(0xCE);
            self.emit(&(value as u32).to_be_bytes());
        } else {
            self.emit_byte(0xCF);
            self.emit(&value.to_be_bytes());
        }
    }

    fn serialize_i64(&mut self, value: i64) {
        if value >= 0 {
            self.serialize_u64(value as u64);
        } else if value >= -32 {
            self.emit_byte(value as u8);
        } else if value >= i8::MIN as i64 {
            self.emit(&[0xD0, value as u8]);
        } else if value >= i16::MIN as i64 {
            self.emit_byte(0xD1);
            self.emit(&(value as i16).to_be_bytes());
        } else if value >= i32::MIN as i64 {
            self.emit_byte(0xD2);
            self.emit(&(value as i32).to_be_bytes());
        } else {
            self.emit_byte(0xD3);
            self.emit(&value.to_be_bytes());
        }
    }

    fn serialize_float(&mut self, value: FloatValue) {
        // Integral values in integer range demote to the integer
        // encodings, which are never larger.
        if value.is_finite() && value == (value as i128 as FloatValue) {
            let wide = value as i128;
            if wide >= 0 && wide <= u64::MAX as i128 {
                return self.serialize_u64(wide as u64);
            }
            if wide < 0 && wide >= i64::MIN as i128 {
                return self.serialize_i64(wide as i64);
            }
        }
        #[cfg(feature = "double")]
        {
            // Prefer float32 when the value survives the narrowing.
            let narrowed = value as f32;
            if narrowed as f64 == value || value.is_nan() {
                self.emit_byte(0xCA);
                self.emit(&narrowed.to_bits().to_be_bytes());
            } else {
                self.emit_byte(0xCB);
                self.emit(&value.to_bits().to_be_bytes());
            }
        }
        #[cfg(not(feature = "double"))]
        {
            self.emit_byte(0xCA);
            self.emit(&value.to_bits().to_be_bytes());
        }
    }

    fn serialize_string(&mut self, bytes: &[u8]) {
        let len = bytes.len();
        if len < 32 {
            self.emit_byte(0xA0 | len as u8);
        } else if len <= u8::MAX as usize {
            self.emit(&[0xD9, len as u8]);
        } else if len <= u16::MAX as usize {
            self.emit_byte(0xDA);
            self.emit(&(len as u16).to_be_bytes());
        } else {
            self.emit_byte(0xDB);
            self.emit(&(len as u32).to_be_bytes());
        }
        self.emit(bytes);
    }

    fn serialize_binary(&mut self, payload: &[u8]) {
        let len = payload.len();
        if len <= u8::MAX as usize {
            self.emit(&[0xC4, len as u8]);
        } else if len <= u16::MAX as usize {
            self.emit_byte(0xC5);
            self.emit(&(len as u16).to_be_bytes());
        } else {
            self.emit_byte(0xC6);
            self.emit(&(len as u32).to_be_bytes());
        }
        self.emit(payload);
    }

    fn serialize_ext(&mut self, code: i8, payload: &[u8]) {
        match payload.len() {
            1 => self.emit_byte(0xD4),
            2 => self.emit_byte(0xD5),
            4 => self.emit_byte(0xD6),
            8 => self.emit_byte(0xD7),
            16 => self.emit_byte(0xD8),
            len if len <= u8::MAX as usize => self.emit(&[0xC7, len as u8]),
            len if len <= u16::MAX as usize => {
                self.emit_byte(0xC8);
                self.emit(&(len as u16).to_be_bytes());
            }
            len => {
                self.emit_byte(0xC9);
                self.emit(&(len as u32).to_be_bytes());
            }
        }
        self.emit_byte(code as u8);
        self.emit(payload);
    }

    fn serialize_array_header(&mut self, len: usize) {
        if len < 16 {
            self.emit_byte(0x90 | len as u8);
        } else if len <= u16::MAX as usize {
            self.emit_byte(0xDC);
            self.emit(&(len as u16).to_be_bytes());
        } else {
            self.emit_byte(0xDD);
            self.emit(&(len as u32).to_be_bytes());
        }
    }

    fn serialize_map_header(&mut self, len: usize) {
        if len < 16 {
            self.emit_byte(0x80 | len as u8);
        } else if len <= u16::MAX as usize {
            self.emit_byte(0xDE);
            self.emit(&(len as u16).to_be_bytes());
        } else {
            self.emit_byte(0xDF);
            self.emit(&(len as u32).to_be_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msgpack_parser::parse_msgpack;
    use test_log::test;

    #[test]
    fn test_smallest_integer_encoding() {
        let mut doc = Document::new(512);
        let root = doc.root();

        doc.set_uint(root, 7);
        assert_eq!(to_msgpack_vec(&doc), [0x07]);
        doc.set_uint(root, 300);
        assert_eq!(to_msgpack_vec(&doc), [0xCD, 0x01, 0x2C]);
        doc.set_uint(root, 70000);
        assert_eq!(to_msgpack_vec(&doc), [0xCE, 0x00, 0x01, 0x11, 0x70]);
        doc.set_int(root, -1);
        assert_eq!(to_msgpack_vec(&doc), [0xFF]);
        doc.set_int(root, -200);
        assert_eq!(to_msgpack_vec(&doc), [0xD1, 0xFF, 0x38]);
    }

    #[test]
    fn test_integral_float_demotes() {
        let mut doc = Document::new(512);
        doc.set_float(doc.root(), 256.0);
        assert_eq!(to_msgpack_vec(&doc), [0xCD, 0x01, 0x00]);
        doc.set_float(doc.root(), -2.0);
        assert_eq!(to_msgpack_vec(&doc), [0xFE]);
    }

    #[test]
    fn test_fractional_float_stays_float() {
        let mut doc = Document::new(512);
        doc.set_float(doc.root(), 2.5);
        // 2.5 survives the f32 narrowing
        assert_eq!(to_msgpack_vec(&doc), [0xCA, 0x40, 0x20, 0x00, 0x00]);
    }

    #[cfg(feature = "double")]
    #[test]
    fn test_float64_when_narrowing_loses() {
        let mut doc = Document::new(512);
        doc.set_float(doc.root(), 1.1);
        let bytes = to_msgpack_vec(&doc);
        assert_eq!(bytes[0], 0xCB);
        assert_eq!(bytes.len(), 9);
        assert_eq!(f64::from_be_bytes(bytes[1..].try_into().unwrap()), 1.1);
    }

    #[test]
    fn test_containers_and_strings() {
        let mut doc = Document::new(1024);
        let root = doc.root();
        doc.to_object(root);
        let a = doc.add_member(root, "a").unwrap();
        doc.to_array(a);
        let el = doc.add_element(a).unwrap();
        doc.set_uint(el, 1);
        let el = doc.add_element(a).unwrap();
        doc.set_str(el, "x").unwrap();

        assert_eq!(
            to_msgpack_vec(&doc),
            [0x81, 0xA1, b'a', 0x92, 0x01, 0xA1, b'x']
        );
    }

    #[test]
    fn test_round_trip() {
        let mut doc = Document::new(2048);
        crate::parse_json(&mut doc, br#"{"a":[1,2,{"b":true}],"s":"hi"}"#.as_slice()).unwrap();

        let bytes = to_msgpack_vec(&doc);
        let mut back = Document::new(2048);
        parse_msgpack(&mut back, bytes.as_slice()).unwrap();
        assert_eq!(doc, back);
        assert_eq!(measure_msgpack(&doc), bytes.len());
    }

    #[test]
    fn test_ext_round_trip() {
        let mut doc = Document::new(512);
        doc.set_extension(doc.root(), Some(5), &[1, 2, 3, 4]).unwrap();
        let bytes = to_msgpack_vec(&doc);
        assert_eq!(bytes, [0xD6, 0x05, 1, 2, 3, 4]);

        let mut back = Document::new(512);
        parse_msgpack(&mut back, bytes.as_slice()).unwrap();
        assert_eq!(back.as_bytes(back.root()), Some(&[1, 2, 3, 4][..]));
    }

    #[test]
    fn test_bin_payload() {
        let mut doc = Document::new(512);
        doc.set_extension(doc.root(), None, &[0xDE, 0xAD]).unwrap();
        assert_eq!(to_msgpack_vec(&doc), [0xC4, 0x02, 0xDE, 0xAD]);
    }
}
