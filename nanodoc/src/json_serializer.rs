// SPDX-License-Identifier: Apache-2.0

//! JSON serializer: walks the document tree and emits compact or
//! pretty-printed text through a [`Writer`].
//!
//! Output is locale-free and uses the minimal escape for each byte.
//! Strings holding passed-through lone surrogates (WTF-8 bytes) are
//! re-escaped so the output is always valid JSON text. Non-finite floats
//! serialize as `null` unless the extension literals are enabled.

use alloc::vec::Vec;

use crate::document::{Document, ValueId};
use crate::escape::{decode_wtf8_surrogate, escape_char};
use crate::number_format::{float_parts, format_padded, format_u64};
use crate::output::{CountingWriter, Writer};
use crate::variant::{FloatValue, VariantData};

/// Knobs for one JSON serialization.
#[derive(Debug, Clone, Default)]
pub struct JsonSerializeOptions {
    /// Indent with two spaces and break lines between items.
    pub pretty: bool,
    /// Emit `NaN` instead of `null` for NaN floats.
    pub nan_as_literal: bool,
    /// Emit `Infinity`/`-Infinity` instead of `null` for infinite floats.
    pub infinity_as_literal: bool,
}

/// Serializes `doc` as compact JSON, returning the number of bytes
/// written (which is less than the document's text size only if the
/// writer truncates).
pub fn serialize_json<W: Writer>(doc: &Document, output: &mut W) -> usize {
    serialize_json_with(doc, output, &JsonSerializeOptions::default())
}

/// Serializes `doc` with two-space indentation.
pub fn serialize_json_pretty<W: Writer>(doc: &Document, output: &mut W) -> usize {
    let options = JsonSerializeOptions {
        pretty: true,
        ..JsonSerializeOptions::default()
    };
    serialize_json_with(doc, output, &options)
}

/// [`serialize_json`] with explicit options.
pub fn serialize_json_with<W: Writer>(
    doc: &Document,
    output: &mut W,
    options: &JsonSerializeOptions,
) -> usize {
    let mut serializer = JsonSerializer {
        doc,
        output,
        options,
        written: 0,
    };
    serializer.serialize_value(doc.root(), 0);
    serializer.written
}

/// The number of bytes [`serialize_json`] would produce, without writing
/// them anywhere.
pub fn measure_json(doc: &Document) -> usize {
    let mut counter = CountingWriter::new();
    serialize_json(doc, &mut counter)
}

/// The number of bytes [`serialize_json_pretty`] would produce.
pub fn measure_json_pretty(doc: &Document) -> usize {
    let mut counter = CountingWriter::new();
    serialize_json_pretty(doc, &mut counter)
}

/// Serializes `doc` to a freshly allocated byte vector.
pub fn to_json_vec(doc: &Document) -> Vec<u8> {
    let mut out = Vec::new();
    serialize_json(doc, &mut out);
    out
}

/// Pretty-printing [`to_json_vec`].
pub fn to_json_vec_pretty(doc: &Document) -> Vec<u8> {
    let mut out = Vec::new();
    serialize_json_pretty(doc, &mut out);
    out
}

struct JsonSerializer<'d, 'o, W: Writer> {
    doc: &'d Document,
    output: &'o mut W,
    options: &'o JsonSerializeOptions,
    written: usize,
}

impl<W: Writer> JsonSerializer<'_, '_, W> {
    fn emit(&mut self, bytes: &[u8]) {
        self.written += self.output.write(bytes);
    }

    fn newline_indent(&mut self, depth: usize) {
        self.emit(b"\r\n");
        for _ in 0..depth {
            self.emit(b"  ");
        }
    }

    fn serialize_value(&mut self, id: ValueId, depth: usize) {
        match self.doc.data(id) {
            VariantData::Null | VariantData::Extension { .. } => self.emit(b"null"),
            VariantData::Bool(true) => self.emit(b"true"),
            VariantData::Bool(false) => self.emit(b"false"),
            VariantData::Int(i) => self.serialize_int(i),
            VariantData::Uint(u) => {
                let mut buf = [0u8; 20];
                let digits = format_u64(u as u64, &mut buf);
                self.emit(digits);
            }
            VariantData::Float(f) => self.serialize_float(f),
            VariantData::OwnedStr(s) => {
                let bytes = self.doc.string_bytes(s);
                self.serialize_string(bytes);
            }
            VariantData::LinkedStr(s) => self.serialize_string(s.as_bytes()),
            VariantData::RawStr(s) => {
                let bytes = self.doc.string_bytes(s);
                self.emit(bytes);
            }
            VariantData::Array(col) => {
                self.emit(b"[");
                let mut cur = col.head;
                let mut first = true;
                while !cur.is_nil() {
                    if !first {
                        self.emit(b",");
                    }
                    first = false;
                    if self.options.pretty {
                        self.newline_indent(depth + 1);
                    }
                    self.serialize_value(ValueId(cur), depth + 1);
                    cur = self.doc.chain_next(cur);
                }
                if self.options.pretty && !first {
                    self.newline_indent(depth);
                }
                self.emit(b"]");
            }
            VariantData::Object(col) => {
                self.emit(b"{");
                let mut cur = col.head;
                let mut first = true;
                while !cur.is_nil() {
                    let value = self.doc.chain_next(cur);
                    if value.is_nil() {
                        break;
                    }
                    if !first {
                        self.emit(b",");
                    }
                    first = false;
                    if self.options.pretty {
                        self.newline_indent(depth + 1);
                    }
                    match self.doc.chain_data(cur) {
                        VariantData::OwnedStr(s) => {
                            let bytes = self.doc.string_bytes(s);
                            self.serialize_string(bytes);
                        }
                        VariantData::LinkedStr(s) => self.serialize_string(s.as_bytes()),
                        _ => self.emit(b"\"\""),
                    }
                    self.emit(if self.options.pretty {
                        b": ".as_slice()
                    } else {
                        b":".as_slice()
                    });
                    self.serialize_value(ValueId(value), depth + 1);
                    cur = self.doc.chain_next(value);
                }
                if self.options.pretty && !first {
                    self.newline_indent(depth);
                }
                self.emit(b"}");
            }
        }
    }

    fn serialize_int(&mut self, value: crate::variant::IntValue) {
        let mut buf = [0u8; 20];
        if value < 0 {
            self.emit(b"-");
            let digits = format_u64((value as i64).unsigned_abs(), &mut buf);
            self.emit(digits);
        } else {
            let digits = format_u64(value as u64, &mut buf);
            self.emit(digits);
        }
    }

    fn serialize_float(&mut self, value: FloatValue) {
        if value.is_nan() {
            self.emit(if self.options.nan_as_literal {
                b"NaN".as_slice()
            } else {
                b"null".as_slice()
            });
            return;
        }
        if value.is_infinite() {
            if !self.options.infinity_as_literal {
                self.emit(b"null");
            } else if value < 0.0 {
                self.emit(b"-Infinity");
            } else {
                self.emit(b"Infinity");
            }
            return;
        }
        let mut value = value;
        if value.is_sign_negative() {
            self.emit(b"-");
            value = -value;
        }
        let parts = float_parts(value);
        let mut buf = [0u8; 20];
        let digits = format_u64(parts.integral, &mut buf);
        self.emit(digits);
        if parts.decimal_places > 0 {
            self.emit(b".");
            let mut buf = [0u8; 20];
            let digits = format_padded(parts.decimal, parts.decimal_places, &mut buf);
            self.emit(digits);
        } else if parts.exponent == 0 {
            // Keep the value recognizably a float.
            self.emit(b".0");
        }
        if parts.exponent != 0 {
            self.emit(b"e");
            let exponent = if parts.exponent < 0 {
                self.emit(b"-");
                -(parts.exponent as i32) as u64
            } else {
                parts.exponent as u64
            };
            let mut buf = [0u8; 20];
            let digits = format_u64(exponent, &mut buf);
            self.emit(digits);
        }
    }

    /// Quotes and escapes one string. WTF-8 surrogate sequences are
    /// re-escaped so the emitted text is valid JSON.
    fn serialize_string(&mut self, bytes: &[u8]) {
        self.emit(b"\"");
        let mut start = 0;
        let mut index = 0;
        while index < bytes.len() {
            let byte = bytes[index];
            if let Some(escaped) = escape_char(byte) {
                self.emit(&bytes[start..index]);
                self.emit(&[b'\\', escaped]);
                index += 1;
                start = index;
            } else if byte < 0x20 {
                self.emit(&bytes[start..index]);
                self.emit_unicode_escape(byte as u32);
                index += 1;
                start = index;
            } else if byte == 0xED {
                if let Some(codepoint) = decode_wtf8_surrogate(&bytes[index..]) {
                    self.emit(&bytes[start..index]);
                    self.emit_unicode_escape(codepoint);
                    index += 3;
                    start = index;
                } else {
                    index += 1;
                }
            } else {
                index += 1;
            }
        }
        self.emit(&bytes[start..]);
        self.emit(b"\"");
    }

    fn emit_unicode_escape(&mut self, codepoint: u32) {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let escape = [
            b'\\',
            b'u',
            HEX[(codepoint >> 12 & 0xF) as usize],
            HEX[(codepoint >> 8 & 0xF) as usize],
            HEX[(codepoint >> 4 & 0xF) as usize],
            HEX[(codepoint & 0xF) as usize],
        ];
        self.emit(&escape);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_parser::parse_json;
    use crate::LinkedStr;
    use test_log::test;

    fn json_of(doc: &Document) -> String {
        String::from_utf8(to_json_vec(doc)).unwrap()
    }

    #[test]
    fn test_scalars() {
        let mut doc = Document::new(512);
        let root = doc.root();

        doc.set_null(root);
        assert_eq!(json_of(&doc), "null");
        doc.set_bool(root, true);
        assert_eq!(json_of(&doc), "true");
        doc.set_uint(root, 42);
        assert_eq!(json_of(&doc), "42");
        doc.set_int(root, -7);
        assert_eq!(json_of(&doc), "-7");
        doc.set_str(root, "hi").unwrap();
        assert_eq!(json_of(&doc), "\"hi\"");
    }

    #[test]
    fn test_float_formatting() {
        let mut doc = Document::new(512);
        let root = doc.root();

        doc.set_float(root, 3.25);
        assert_eq!(json_of(&doc), "3.25");
        doc.set_float(root, 100.0);
        assert_eq!(json_of(&doc), "100.0");
        doc.set_float(root, -0.5);
        assert_eq!(json_of(&doc), "-0.5");
        doc.set_float(root, 1e20);
        assert_eq!(json_of(&doc), "1e20");
        doc.set_float(root, 1e-7);
        assert_eq!(json_of(&doc), "1e-7");
    }

    #[test]
    fn test_nonfinite_defaults_to_null() {
        let mut doc = Document::new(512);
        let root = doc.root();
        doc.set_float(root, crate::FloatValue::NAN);
        assert_eq!(json_of(&doc), "null");
        doc.set_float(root, crate::FloatValue::NEG_INFINITY);
        assert_eq!(json_of(&doc), "null");

        let options = JsonSerializeOptions {
            nan_as_literal: true,
            infinity_as_literal: true,
            ..JsonSerializeOptions::default()
        };
        let mut out = Vec::new();
        serialize_json_with(&doc, &mut out, &options);
        assert_eq!(out, b"-Infinity");
    }

    #[test]
    fn test_string_escapes() {
        let mut doc = Document::new(512);
        doc.set_str(doc.root(), "a\"b\\c\nd\te").unwrap();
        assert_eq!(json_of(&doc), r#""a\"b\\c\nd\te""#);
    }

    #[test]
    fn test_control_byte_escapes() {
        let mut doc = Document::new(512);
        doc.set_str(doc.root(), "\u{1}x").unwrap();
        assert_eq!(json_of(&doc), r#""\u0001x""#);
    }

    #[test]
    fn test_collections() {
        let mut doc = Document::new(2048);
        parse_json(&mut doc, br#"{"a":[1,2,{"b":true}],"c":null}"#.as_slice()).unwrap();
        assert_eq!(json_of(&doc), r#"{"a":[1,2,{"b":true}],"c":null}"#);
    }

    #[test]
    fn test_pretty_layout() {
        let mut doc = Document::new(1024);
        parse_json(&mut doc, br#"{"a":[1,2],"b":{}}"#.as_slice()).unwrap();
        let pretty = String::from_utf8(to_json_vec_pretty(&doc)).unwrap();
        assert_eq!(
            pretty,
            "{\r\n  \"a\": [\r\n    1,\r\n    2\r\n  ],\r\n  \"b\": {}\r\n}"
        );
        assert_eq!(measure_json_pretty(&doc), pretty.len());
    }

    #[test]
    fn test_raw_json_verbatim() {
        let mut doc = Document::new(512);
        doc.set_raw_json(doc.root(), "[1,2,3]").unwrap();
        assert_eq!(json_of(&doc), "[1,2,3]");
    }

    #[test]
    fn test_linked_strings() {
        let mut doc = Document::new(512);
        let root = doc.root();
        doc.to_object(root);
        let member = doc.add_member_linked(root, "key").unwrap();
        doc.set(member, LinkedStr("value")).unwrap();
        assert_eq!(json_of(&doc), r#"{"key":"value"}"#);
    }

    #[test]
    fn test_measure_matches_output() {
        let mut doc = Document::new(1024);
        parse_json(&mut doc, br#"{"n":3.25,"s":"x\ny"}"#.as_slice()).unwrap();
        assert_eq!(measure_json(&doc), to_json_vec(&doc).len());
    }

    #[test]
    fn test_truncating_writer_reports_short_count() {
        let mut doc = Document::new(512);
        doc.set_str(doc.root(), "a long enough string").unwrap();
        let mut buf = [0u8; 8];
        let mut writer = crate::SliceWriter::new(&mut buf);
        let written = serialize_json(&doc, &mut writer);
        assert_eq!(written, 8);
    }
}
