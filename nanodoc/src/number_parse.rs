// SPDX-License-Identifier: Apache-2.0

//! The single number scanner shared by the JSON codec.
//!
//! One pass classifies a token as a signed integer, an unsigned integer, or
//! a float. Integral values that overflow the configured integer width are
//! promoted to the floating representation, and mantissa digits beyond what
//! the accumulator can hold are absorbed into the exponent rather than
//! silently truncated.

use crate::variant::{FloatValue, IntValue, UintValue};

/// Result of scanning one numeric token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ParsedNumber {
    Int(IntValue),
    Uint(UintValue),
    Float(FloatValue),
}

/// Parses a complete numeric token, including the `NaN`/`Infinity`
/// extensions. Returns `None` for anything that is not a number.
pub(crate) fn parse_number(token: &[u8]) -> Option<ParsedNumber> {
    let (negative, digits) = match token {
        [] => return None,
        [b'-', rest @ ..] => (true, rest),
        [b'+', rest @ ..] => (false, rest),
        _ => (false, token),
    };

    match digits {
        b"NaN" => return Some(ParsedNumber::Float(FloatValue::NAN)),
        b"Infinity" => {
            let inf = if negative {
                FloatValue::NEG_INFINITY
            } else {
                FloatValue::INFINITY
            };
            return Some(ParsedNumber::Float(inf));
        }
        _ => {}
    }

    let mut mantissa: u64 = 0;
    let mut exponent: i32 = 0;
    let mut is_float = false;
    let mut saw_digit = false;
    let mut rest = digits;

    // Integral part. Once the accumulator is full, remaining digits shift
    // the exponent instead.
    while let Some((&byte, tail)) = rest.split_first() {
        let digit = match byte {
            b'0'..=b'9' => (byte - b'0') as u64,
            _ => break,
        };
        saw_digit = true;
        match mantissa.checked_mul(10).and_then(|m| m.checked_add(digit)) {
            Some(value) => mantissa = value,
            None => {
                exponent += 1;
                is_float = true;
            }
        }
        rest = tail;
    }

    // Fractional part.
    if let Some((b'.', tail)) = rest.split_first() {
        is_float = true;
        rest = tail;
        while let Some((&byte, tail)) = rest.split_first() {
            let digit = match byte {
                b'0'..=b'9' => (byte - b'0') as u64,
                _ => break,
            };
            saw_digit = true;
            if let Some(value) = mantissa.checked_mul(10).and_then(|m| m.checked_add(digit)) {
                mantissa = value;
                exponent -= 1;
            }
            // Digits beyond the accumulator's precision are dropped; their
            // weight is already below 1 ulp of the mantissa.
            rest = tail;
        }
    }

    if !saw_digit {
        return None;
    }

    // Exponent part.
    if let Some((&e, tail)) = rest.split_first() {
        if e != b'e' && e != b'E' {
            return None;
        }
        is_float = true;
        let (exp_negative, mut exp_rest) = match tail {
            [b'-', r @ ..] => (true, r),
            [b'+', r @ ..] => (false, r),
            r => (false, r),
        };
        if exp_rest.is_empty() {
            return None;
        }
        let mut exp_value: i32 = 0;
        while let Some((&byte, t)) = exp_rest.split_first() {
            let digit = match byte {
                b'0'..=b'9' => (byte - b'0') as i32,
                _ => return None,
            };
            exp_value = (exp_value * 10 + digit).min(10_000);
            exp_rest = t;
        }
        exponent += if exp_negative { -exp_value } else { exp_value };
    } else if !rest.is_empty() {
        return None;
    }

    if !is_float && exponent == 0 {
        if negative {
            // Building from the unsigned mantissa handles IntValue::MIN.
            if mantissa <= IntValue::MAX as u64 {
                return Some(ParsedNumber::Int(-(mantissa as IntValue)));
            }
            if mantissa == IntValue::MAX as u64 + 1 {
                return Some(ParsedNumber::Int(IntValue::MIN));
            }
        } else if mantissa <= UintValue::MAX as u64 {
            return Some(ParsedNumber::Uint(mantissa as UintValue));
        }
    }

    let mut value = make_float(mantissa as FloatValue, exponent);
    if negative {
        value = -value;
    }
    Some(ParsedNumber::Float(value))
}

/// Computes `mantissa * 10^exponent` by repeated squaring over a power
/// table, saturating to infinity/zero at the extremes.
pub(crate) fn make_float(mantissa: FloatValue, exponent: i32) -> FloatValue {
    #[cfg(feature = "double")]
    const POWERS: [FloatValue; 9] = [1e1, 1e2, 1e4, 1e8, 1e16, 1e32, 1e64, 1e128, 1e256];
    #[cfg(not(feature = "double"))]
    const POWERS: [FloatValue; 6] = [1e1, 1e2, 1e4, 1e8, 1e16, 1e32];

    let mut value = mantissa;
    let mut remaining = exponent.unsigned_abs();
    let mut index = 0;
    while remaining != 0 && index < POWERS.len() {
        if remaining & 1 != 0 {
            if exponent >= 0 {
                value *= POWERS[index];
            } else {
                value /= POWERS[index];
            }
        }
        remaining >>= 1;
        index += 1;
    }
    if remaining != 0 && value != 0.0 {
        // Exponent beyond the table saturates.
        value = if exponent >= 0 {
            FloatValue::INFINITY
        } else {
            0.0
        };
    }
    value
}
