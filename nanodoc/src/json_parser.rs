// SPDX-License-Identifier: Apache-2.0

//! Pull-based JSON parser building directly into a [`Document`].
//!
//! The grammar is JSON plus the common relaxations: single-quoted strings,
//! unquoted object keys, `NaN`/`Infinity` literals, and (opt-in) `//` and
//! `/* */` comments. Strings may contain `\uXXXX` escapes with surrogate
//! pairs recombined; a lone surrogate is stored as its WTF-8 bytes rather
//! than rejected. Input exhaustion inside a value reports
//! [`Error::IncompleteInput`], a byte that cannot continue any production
//! reports [`Error::InvalidInput`].

use alloc::vec::Vec;

use crate::document::{Document, ValueId};
use crate::error::{Error, Result};
use crate::escape::{
    combine_surrogates, encode_utf8, hex_digit, is_high_surrogate, is_low_surrogate,
    unescape_char,
};
use crate::input::Reader;
use crate::number_parse::{parse_number, ParsedNumber};
use crate::DEFAULT_NESTING_LIMIT;

/// Knobs for one JSON parse.
#[derive(Debug, Clone)]
pub struct JsonParseOptions {
    /// Maximum container depth before the parser fails with
    /// [`Error::TooDeep`].
    pub nesting_limit: usize,
    /// Accept `//` line and `/* */` block comments between tokens.
    pub allow_comments: bool,
    /// Decode `\uXXXX` escapes to UTF-8. When off, the escape text is kept
    /// verbatim in the stored string.
    pub decode_unicode_escapes: bool,
}

impl Default for JsonParseOptions {
    fn default() -> Self {
        JsonParseOptions {
            nesting_limit: DEFAULT_NESTING_LIMIT,
            allow_comments: false,
            decode_unicode_escapes: true,
        }
    }
}

/// Parses JSON text from `input` into `doc`, replacing its previous
/// content. The error describes the first problem found; whatever was
/// built before it stays in the document, so a failed parse of truncated
/// input still exposes the leading complete values.
pub fn parse_json<R: Reader>(doc: &mut Document, input: R) -> Result<()> {
    parse_json_with(doc, input, &JsonParseOptions::default())
}

/// [`parse_json`] with explicit options.
pub fn parse_json_with<R: Reader>(
    doc: &mut Document,
    input: R,
    options: &JsonParseOptions,
) -> Result<()> {
    doc.set_null(doc.root());
    let root = doc.root();
    let mut parser = JsonParser {
        doc,
        input,
        peeked: None,
        scratch: Vec::new(),
        options,
    };
    parser.parse_document(root)
}

struct JsonParser<'d, 'o, R: Reader> {
    doc: &'d mut Document,
    input: R,
    peeked: Option<u8>,
    scratch: Vec<u8>,
    options: &'o JsonParseOptions,
}

fn is_token_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'+' | b'-' | b'.' | b'_')
}

/// True when `token` could still become a keyword with more input; used to
/// tell a truncated `tru` from a malformed `trux`.
fn is_keyword_prefix(token: &[u8]) -> bool {
    let body = match token {
        [b'-', rest @ ..] | [b'+', rest @ ..] => rest,
        t => t,
    };
    if body.is_empty() {
        return false;
    }
    [&b"true"[..], b"false", b"null", b"NaN", b"Infinity"]
        .iter()
        .any(|kw| kw.len() > body.len() && kw.starts_with(body))
}

impl<R: Reader> JsonParser<'_, '_, R> {
    fn next(&mut self) -> Option<u8> {
        self.peeked.take().or_else(|| self.input.read())
    }

    fn peek(&mut self) -> Option<u8> {
        if self.peeked.is_none() {
            self.peeked = self.input.read();
        }
        self.peeked
    }

    /// Skips whitespace (and comments when enabled), returning the next
    /// significant byte without consuming it.
    fn skip_to_significant(&mut self) -> Result<Option<u8>> {
        loop {
            match self.peek() {
                None => return Ok(None),
                Some(b' ' | b'\t' | b'\n' | b'\r') => {
                    self.next();
                }
                Some(b'/') if self.options.allow_comments => {
                    self.next();
                    self.skip_comment()?;
                }
                Some(byte) => return Ok(Some(byte)),
            }
        }
    }

    fn skip_comment(&mut self) -> Result<()> {
        match self.next() {
            Some(b'/') => {
                while let Some(byte) = self.next() {
                    if byte == b'\n' {
                        break;
                    }
                }
                Ok(())
            }
            Some(b'*') => {
                let mut star = false;
                loop {
                    match self.next() {
                        Some(b'/') if star => return Ok(()),
                        Some(byte) => star = byte == b'*',
                        None => return Err(Error::IncompleteInput),
                    }
                }
            }
            Some(_) => Err(Error::InvalidInput),
            None => Err(Error::IncompleteInput),
        }
    }

    fn parse_document(&mut self, root: ValueId) -> Result<()> {
        if self.skip_to_significant()?.is_none() {
            return Err(Error::EmptyInput);
        }
        self.parse_value(root, self.options.nesting_limit)?;
        match self.skip_to_significant()? {
            None => Ok(()),
            Some(_) => Err(Error::InvalidInput),
        }
    }

    fn parse_value(&mut self, id: ValueId, limit: usize) -> Result<()> {
        let byte = self
            .skip_to_significant()?
            .ok_or(Error::IncompleteInput)?;
        match byte {
            b'{' => self.parse_object(id, limit),
            b'[' => self.parse_array(id, limit),
            b'"' | b'\'' => {
                self.next();
                self.parse_string(byte)?;
                self.doc.set_str_bytes(id, &self.scratch)?;
                Ok(())
            }
            b if is_token_char(b) => self.parse_token(id),
            _ => Err(Error::InvalidInput),
        }
    }

    fn parse_array(&mut self, id: ValueId, limit: usize) -> Result<()> {
        if limit == 0 {
            return Err(Error::TooDeep);
        }
        self.next(); // consume '['
        self.doc.to_array(id);

        match self.skip_to_significant()? {
            Some(b']') => {
                self.next();
                return Ok(());
            }
            Some(_) => {}
            None => return Err(Error::IncompleteInput),
        }
        loop {
            let element = self.doc.add_element(id)?;
            self.parse_value(element, limit - 1)?;
            match self.skip_to_significant()? {
                Some(b',') => {
                    self.next();
                }
                Some(b']') => {
                    self.next();
                    return Ok(());
                }
                Some(_) => return Err(Error::InvalidInput),
                None => return Err(Error::IncompleteInput),
            }
        }
    }

    fn parse_object(&mut self, id: ValueId, limit: usize) -> Result<()> {
        if limit == 0 {
            return Err(Error::TooDeep);
        }
        self.next(); // consume '{'
        self.doc.to_object(id);

        match self.skip_to_significant()? {
            Some(b'}') => {
                self.next();
                return Ok(());
            }
            Some(_) => {}
            None => return Err(Error::IncompleteInput),
        }
        loop {
            self.parse_key()?;
            match self.skip_to_significant()? {
                Some(b':') => {
                    self.next();
                }
                Some(_) => return Err(Error::InvalidInput),
                None => return Err(Error::IncompleteInput),
            }
            // Duplicate keys resolve to the same member, so the last
            // value wins.
            let key = core::mem::take(&mut self.scratch);
            let member = self.doc.add_member_bytes(id, &key)?;
            self.scratch = key;
            self.parse_value(member, limit - 1)?;
            match self.skip_to_significant()? {
                Some(b',') => {
                    self.next();
                }
                Some(b'}') => {
                    self.next();
                    return Ok(());
                }
                Some(_) => return Err(Error::InvalidInput),
                None => return Err(Error::IncompleteInput),
            }
        }
    }

    /// Parses a member key into the scratch buffer: a quoted string or a
    /// bare identifier.
    fn parse_key(&mut self) -> Result<()> {
        match self.skip_to_significant()? {
            Some(quote @ (b'"' | b'\'')) => {
                self.next();
                self.parse_string(quote)
            }
            Some(b) if is_token_char(b) => {
                self.scratch.clear();
                while let Some(byte) = self.peek() {
                    if !is_token_char(byte) {
                        break;
                    }
                    self.scratch.push(byte);
                    self.next();
                }
                Ok(())
            }
            Some(_) => Err(Error::InvalidInput),
            None => Err(Error::IncompleteInput),
        }
    }

    /// Parses the body of a quoted string (opening quote already consumed)
    /// into the scratch buffer.
    fn parse_string(&mut self, quote: u8) -> Result<()> {
        self.scratch.clear();
        loop {
            let byte = self.next().ok_or(Error::IncompleteInput)?;
            if byte == quote {
                return Ok(());
            }
            if byte != b'\\' {
                self.scratch.push(byte);
                continue;
            }
            let escape = self.next().ok_or(Error::IncompleteInput)?;
            if escape == b'u' {
                if !self.options.decode_unicode_escapes {
                    self.scratch.extend_from_slice(b"\\u");
                    continue;
                }
                self.parse_unicode_escape()?;
            } else {
                let unescaped = unescape_char(escape).ok_or(Error::InvalidInput)?;
                self.scratch.push(unescaped);
            }
        }
    }

    fn read_hex4(&mut self) -> Result<u32> {
        let mut value = 0;
        for _ in 0..4 {
            let byte = self.next().ok_or(Error::IncompleteInput)?;
            let digit = hex_digit(byte).ok_or(Error::InvalidInput)?;
            value = value << 4 | digit;
        }
        Ok(value)
    }

    /// Handles `\uXXXX` after the `\u` has been consumed, recombining
    /// surrogate pairs and passing lone surrogates through as WTF-8.
    fn parse_unicode_escape(&mut self) -> Result<()> {
        let mut buf = [0u8; 4];
        let mut codepoint = self.read_hex4()?;
        loop {
            if !is_high_surrogate(codepoint) {
                // BMP characters and lone low surrogates encode directly.
                self.scratch.extend_from_slice(encode_utf8(codepoint, &mut buf));
                return Ok(());
            }
            // A high surrogate: pairs with a following \uXXXX low half.
            if self.peek() != Some(b'\\') {
                self.scratch.extend_from_slice(encode_utf8(codepoint, &mut buf));
                return Ok(());
            }
            self.next();
            if self.peek() != Some(b'u') {
                // An ordinary escape follows the lone high surrogate.
                self.scratch.extend_from_slice(encode_utf8(codepoint, &mut buf));
                let escape = self.next().ok_or(Error::IncompleteInput)?;
                let unescaped = unescape_char(escape).ok_or(Error::InvalidInput)?;
                self.scratch.push(unescaped);
                return Ok(());
            }
            self.next();
            let second = self.read_hex4()?;
            if is_low_surrogate(second) {
                let combined = combine_surrogates(codepoint, second);
                self.scratch.extend_from_slice(encode_utf8(combined, &mut buf));
                return Ok(());
            }
            // Not a pair: keep the high half as WTF-8 and reconsider the
            // second escape on its own.
            self.scratch.extend_from_slice(encode_utf8(codepoint, &mut buf));
            codepoint = second;
        }
    }

    /// Parses an unquoted token: a keyword or a number.
    fn parse_token(&mut self, id: ValueId) -> Result<()> {
        self.scratch.clear();
        let mut hit_eof = true;
        while let Some(byte) = self.peek() {
            if !is_token_char(byte) {
                hit_eof = false;
                break;
            }
            self.scratch.push(byte);
            self.next();
        }
        match self.scratch.as_slice() {
            b"true" => {
                self.doc.set_bool(id, true);
                return Ok(());
            }
            b"false" => {
                self.doc.set_bool(id, false);
                return Ok(());
            }
            b"null" => {
                self.doc.set_null(id);
                return Ok(());
            }
            _ => {}
        }
        match parse_number(&self.scratch) {
            Some(ParsedNumber::Int(i)) => {
                self.doc.set_int(id, i);
                Ok(())
            }
            Some(ParsedNumber::Uint(u)) => {
                self.doc.set_uint(id, u);
                Ok(())
            }
            Some(ParsedNumber::Float(f)) => {
                self.doc.set_float(id, f);
                Ok(())
            }
            None if hit_eof && is_keyword_prefix(&self.scratch) => Err(Error::IncompleteInput),
            None => Err(Error::InvalidInput),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::ValueType;
    use test_log::test;

    fn parse(doc: &mut Document, text: &str) -> Result<()> {
        parse_json(doc, text.as_bytes())
    }

    #[test]
    fn test_scalars() {
        let mut doc = Document::new(512);
        let root = doc.root();

        parse(&mut doc, "42").unwrap();
        assert_eq!(doc.as_uint(root), 42);
        parse(&mut doc, "-1").unwrap();
        assert_eq!(doc.as_int(root), -1);
        parse(&mut doc, "3.25").unwrap();
        assert_eq!(doc.as_float(root), 3.25);
        parse(&mut doc, "true").unwrap();
        assert!(doc.as_bool(root));
        parse(&mut doc, "null").unwrap();
        assert!(doc.is_null(root));
        parse(&mut doc, "\"hi\"").unwrap();
        assert_eq!(doc.as_str(root), Some("hi"));
    }

    #[test]
    fn test_nested_structure() {
        let mut doc = Document::new(2048);
        parse(&mut doc, r#"{"a":[1,2,{"b":true}],"c":null}"#).unwrap();
        let root = doc.root();
        let a = doc.get_member(root, "a").unwrap();
        assert_eq!(doc.size(a), 3);
        let third = doc.get_element(a, 2).unwrap();
        assert!(doc.as_bool(doc.get_member(third, "b").unwrap()));
        assert!(doc.is_null(doc.get_member(root, "c").unwrap()));
    }

    #[test]
    fn test_relaxed_syntax() {
        let mut doc = Document::new(512);
        parse(&mut doc, r#"{key: 'value', other_1: 2}"#).unwrap();
        let root = doc.root();
        assert_eq!(doc.as_str(doc.get_member(root, "key").unwrap()), Some("value"));
        assert_eq!(doc.as_uint(doc.get_member(root, "other_1").unwrap()), 2);
    }

    #[test]
    fn test_comments_opt_in() {
        let text = "[1, // one\n 2 /* two */, 3]";
        let mut doc = Document::new(512);
        assert_eq!(parse(&mut doc, text), Err(Error::InvalidInput));

        let options = JsonParseOptions {
            allow_comments: true,
            ..JsonParseOptions::default()
        };
        parse_json_with(&mut doc, text.as_bytes(), &options).unwrap();
        assert_eq!(doc.size(doc.root()), 3);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let options = JsonParseOptions {
            allow_comments: true,
            ..JsonParseOptions::default()
        };
        let mut doc = Document::new(512);
        assert_eq!(
            parse_json_with(&mut doc, b"[1 /* never closed".as_slice(), &options),
            Err(Error::IncompleteInput)
        );
    }

    #[test]
    fn test_error_classification() {
        let mut doc = Document::new(512);
        assert_eq!(parse(&mut doc, ""), Err(Error::EmptyInput));
        assert_eq!(parse(&mut doc, "   "), Err(Error::EmptyInput));
        assert_eq!(parse(&mut doc, "{\"a\":1,"), Err(Error::IncompleteInput));
        assert_eq!(parse(&mut doc, "{\"a\":1,}"), Err(Error::InvalidInput));
        assert_eq!(parse(&mut doc, "[1,2"), Err(Error::IncompleteInput));
        assert_eq!(parse(&mut doc, "[1,,2]"), Err(Error::InvalidInput));
        assert_eq!(parse(&mut doc, "tru"), Err(Error::IncompleteInput));
        assert_eq!(parse(&mut doc, "trux"), Err(Error::InvalidInput));
        assert_eq!(parse(&mut doc, "\"open"), Err(Error::IncompleteInput));
        assert_eq!(parse(&mut doc, "1 2"), Err(Error::InvalidInput));
    }

    #[test]
    fn test_failure_keeps_partial_tree() {
        let mut doc = Document::new(512);
        assert_eq!(parse(&mut doc, r#"{"a":1,"b":"#), Err(Error::IncompleteInput));
        // The members parsed before the cut stay accessible.
        assert_eq!(doc.value_type(doc.root()), ValueType::Object);
        assert_eq!(doc.as_uint(doc.get_member(doc.root(), "a").unwrap()), 1);
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let mut doc = Document::new(512);
        parse(&mut doc, r#"{"k":1,"k":2}"#).unwrap();
        assert_eq!(doc.size(doc.root()), 1);
        assert_eq!(doc.as_uint(doc.get_member(doc.root(), "k").unwrap()), 2);
    }

    #[test]
    fn test_unicode_escapes() {
        let mut doc = Document::new(512);
        parse(&mut doc, r#""\u00e9\u20ac""#).unwrap();
        assert_eq!(doc.as_str(doc.root()), Some("é€"));

        // Surrogate pair recombination
        parse(&mut doc, r#""\ud83d\ude00""#).unwrap();
        assert_eq!(doc.as_str(doc.root()), Some("😀"));
    }

    #[test]
    fn test_lone_surrogate_passthrough() {
        let mut doc = Document::new(512);
        parse(&mut doc, r#""\ud800""#).unwrap();
        // Stored as WTF-8: not valid UTF-8, surfaced as bytes.
        assert_eq!(doc.as_str(doc.root()), None);
        assert_eq!(doc.as_bytes(doc.root()), Some(&[0xED, 0xA0, 0x80][..]));
    }

    #[test]
    fn test_unicode_decoding_disabled() {
        let options = JsonParseOptions {
            decode_unicode_escapes: false,
            ..JsonParseOptions::default()
        };
        let mut doc = Document::new(512);
        parse_json_with(&mut doc, br#""\u0041""#.as_slice(), &options).unwrap();
        assert_eq!(doc.as_str(doc.root()), Some("\\u0041"));
    }

    #[test]
    fn test_nan_and_infinity_literals() {
        let mut doc = Document::new(512);
        parse(&mut doc, "[NaN, Infinity, -Infinity]").unwrap();
        let root = doc.root();
        assert!(doc.as_float(doc.get_element(root, 0).unwrap()).is_nan());
        assert_eq!(
            doc.as_float(doc.get_element(root, 1).unwrap()),
            crate::FloatValue::INFINITY
        );
        assert_eq!(
            doc.as_float(doc.get_element(root, 2).unwrap()),
            crate::FloatValue::NEG_INFINITY
        );
    }

    #[test]
    fn test_nesting_limit() {
        let mut doc = Document::new(4096);
        assert_eq!(parse(&mut doc, &"[".repeat(11)), Err(Error::TooDeep));

        let balanced = "[".repeat(10) + &"]".repeat(10);
        parse(&mut doc, &balanced).unwrap();
        assert_eq!(doc.nesting(doc.root()), 10);

        let options = JsonParseOptions {
            nesting_limit: 2,
            ..JsonParseOptions::default()
        };
        assert_eq!(
            parse_json_with(&mut doc, b"[[[1]]]".as_slice(), &options),
            Err(Error::TooDeep)
        );
    }

    #[test]
    fn test_memory_exhaustion_is_reported() {
        let mut doc = Document::new(64);
        let big = alloc::format!("[{}]", "1,".repeat(200) + "1");
        assert_eq!(parse(&mut doc, &big), Err(Error::NoMemory));
        assert!(doc.overflowed());
        // The elements that fit before the overflow remain.
        assert_eq!(doc.value_type(doc.root()), ValueType::Array);

        // clear() resets the overflow latch and parsing works again.
        doc.clear();
        assert!(!doc.overflowed());
        parse(&mut doc, "[1]").unwrap();
        assert_eq!(doc.value_type(doc.root()), ValueType::Array);
    }
}
