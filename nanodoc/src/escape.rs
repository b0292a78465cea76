// SPDX-License-Identifier: Apache-2.0

//! Escape-sequence helpers shared by the JSON parser and serializer:
//! the simple-escape table in both directions, hex digits, and the
//! UTF-16 surrogate logic including the lenient lone-surrogate passthrough.

/// Maps the character following a backslash to the unescaped byte.
pub(crate) fn unescape_char(escape_char: u8) -> Option<u8> {
    match escape_char {
        b'n' => Some(b'\n'),
        b't' => Some(b'\t'),
        b'r' => Some(b'\r'),
        b'\\' => Some(b'\\'),
        b'"' => Some(b'"'),
        b'\'' => Some(b'\''),
        b'/' => Some(b'/'),
        b'b' => Some(0x08),
        b'f' => Some(0x0C),
        _ => None,
    }
}

/// Maps a byte to the character that follows the backslash when escaping,
/// or `None` if the byte needs no escape. The serializer uses the same
/// table the parser accepts.
pub(crate) fn escape_char(byte: u8) -> Option<u8> {
    match byte {
        b'\n' => Some(b'n'),
        b'\t' => Some(b't'),
        b'\r' => Some(b'r'),
        b'\\' => Some(b'\\'),
        b'"' => Some(b'"'),
        0x08 => Some(b'b'),
        0x0C => Some(b'f'),
        _ => None,
    }
}

/// Numeric value of a hex digit, or `None` if the byte is not one.
pub(crate) fn hex_digit(byte: u8) -> Option<u32> {
    match byte {
        b'0'..=b'9' => Some((byte - b'0') as u32),
        b'a'..=b'f' => Some((byte - b'a' + 10) as u32),
        b'A'..=b'F' => Some((byte - b'A' + 10) as u32),
        _ => None,
    }
}

pub(crate) fn is_high_surrogate(codepoint: u32) -> bool {
    (0xD800..=0xDBFF).contains(&codepoint)
}

pub(crate) fn is_low_surrogate(codepoint: u32) -> bool {
    (0xDC00..=0xDFFF).contains(&codepoint)
}

/// Combines a high/low surrogate pair per the UTF-16 specification.
/// Callers must have checked both halves.
pub(crate) fn combine_surrogates(high: u32, low: u32) -> u32 {
    0x10000 + ((high & 0x3FF) << 10) + (low & 0x3FF)
}

/// Encodes a codepoint as UTF-8 into `buf`, returning the encoded bytes.
///
/// Unlike `char::encode_utf8` this also encodes lone surrogates (as the
/// corresponding 3-byte sequence, i.e. WTF-8): malformed surrogates in the
/// input are passed through, not rejected.
pub(crate) fn encode_utf8(codepoint: u32, buf: &mut [u8; 4]) -> &[u8] {
    if codepoint < 0x80 {
        buf[0] = codepoint as u8;
        &buf[..1]
    } else if codepoint < 0x800 {
        buf[0] = 0xC0 | (codepoint >> 6) as u8;
        buf[1] = 0x80 | (codepoint & 0x3F) as u8;
        &buf[..2]
    } else if codepoint < 0x10000 {
        buf[0] = 0xE0 | (codepoint >> 12) as u8;
        buf[1] = 0x80 | ((codepoint >> 6) & 0x3F) as u8;
        buf[2] = 0x80 | (codepoint & 0x3F) as u8;
        &buf[..3]
    } else {
        buf[0] = 0xF0 | (codepoint >> 18) as u8;
        buf[1] = 0x80 | ((codepoint >> 12) & 0x3F) as u8;
        buf[2] = 0x80 | ((codepoint >> 6) & 0x3F) as u8;
        buf[3] = 0x80 | (codepoint & 0x3F) as u8;
        &buf[..4]
    }
}

/// Decodes a WTF-8 encoded surrogate starting at `bytes[0]`, if present.
/// Used by the serializer to re-escape passed-through surrogates.
pub(crate) fn decode_wtf8_surrogate(bytes: &[u8]) -> Option<u32> {
    if bytes.len() < 3 || bytes[0] != 0xED {
        return None;
    }
    if !(0xA0..=0xBF).contains(&bytes[1]) || !(0x80..=0xBF).contains(&bytes[2]) {
        return None;
    }
    Some(0xD000 | ((bytes[1] as u32 & 0x3F) << 6) | (bytes[2] as u32 & 0x3F))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_escapes_are_inverse() {
        for c in [b'n', b't', b'r', b'\\', b'"', b'b', b'f'] {
            let unescaped = unescape_char(c).unwrap();
            assert_eq!(escape_char(unescaped), Some(c));
        }
        // Forward slash and single quote unescape but are never escaped on output.
        assert_eq!(unescape_char(b'/'), Some(b'/'));
        assert_eq!(escape_char(b'/'), None);
        assert_eq!(unescape_char(b'\''), Some(b'\''));
        assert_eq!(escape_char(b'\''), None);
        assert_eq!(unescape_char(b'x'), None);
    }

    #[test]
    fn test_hex_digits() {
        assert_eq!(hex_digit(b'0'), Some(0));
        assert_eq!(hex_digit(b'9'), Some(9));
        assert_eq!(hex_digit(b'a'), Some(10));
        assert_eq!(hex_digit(b'F'), Some(15));
        assert_eq!(hex_digit(b'g'), None);
    }

    #[test]
    fn test_surrogate_combination() {
        // U+1F600 GRINNING FACE = D83D DE00
        assert!(is_high_surrogate(0xD83D));
        assert!(is_low_surrogate(0xDE00));
        assert_eq!(combine_surrogates(0xD83D, 0xDE00), 0x1F600);
    }

    #[test]
    fn test_utf8_encoding_lengths() {
        let mut buf = [0u8; 4];
        assert_eq!(encode_utf8(b'A' as u32, &mut buf), b"A");
        assert_eq!(encode_utf8(0xE9, &mut buf), "é".as_bytes());
        assert_eq!(encode_utf8(0x20AC, &mut buf), "€".as_bytes());
        assert_eq!(encode_utf8(0x1F600, &mut buf), "😀".as_bytes());
    }

    #[test]
    fn test_lone_surrogate_round_trips_through_wtf8() {
        let mut buf = [0u8; 4];
        let encoded = encode_utf8(0xD800, &mut buf);
        assert_eq!(encoded.len(), 3);
        assert_eq!(decode_wtf8_surrogate(encoded), Some(0xD800));
        assert!(core::str::from_utf8(encoded).is_err());

        let encoded = encode_utf8(0xDFFF, &mut buf);
        assert_eq!(decode_wtf8_surrogate(encoded), Some(0xDFFF));
    }

    #[test]
    fn test_wtf8_decode_rejects_ordinary_utf8() {
        assert_eq!(decode_wtf8_surrogate("한".as_bytes()), None); // 0xED 0x95 0x9C
        assert_eq!(decode_wtf8_surrogate(b"abc"), None);
    }
}
