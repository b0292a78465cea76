// SPDX-License-Identifier: Apache-2.0

//! Locale-free number formatting for the JSON serializer.
//!
//! Integers are printed digit by digit. Floats are split into integral,
//! decimal, and exponent parts: the decimal-places count derives from the
//! value's magnitude, and values beyond the exponentiation thresholds
//! switch to `<mantissa>e<exponent>` form. The output round-trips through
//! the number scanner but is not guaranteed to be the shortest form.

use crate::variant::FloatValue;

/// Decimal digits kept after the point before rounding.
#[cfg(feature = "double")]
const DECIMAL_PLACES: usize = 9;
#[cfg(not(feature = "double"))]
const DECIMAL_PLACES: usize = 6;

#[cfg(feature = "double")]
const DECIMAL_FACTOR: FloatValue = 1e9;
#[cfg(not(feature = "double"))]
const DECIMAL_FACTOR: FloatValue = 1e6;

/// Magnitudes at or above this are printed in exponential form.
const POSITIVE_EXPONENTIATION_THRESHOLD: FloatValue = 1e7;
/// Positive magnitudes at or below this are printed in exponential form.
const NEGATIVE_EXPONENTIATION_THRESHOLD: FloatValue = 1e-5;

#[cfg(feature = "double")]
const POWERS: [FloatValue; 9] = [1e1, 1e2, 1e4, 1e8, 1e16, 1e32, 1e64, 1e128, 1e256];
#[cfg(not(feature = "double"))]
const POWERS: [FloatValue; 6] = [1e1, 1e2, 1e4, 1e8, 1e16, 1e32];

/// A finite, non-negative float split for printing.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct FloatParts {
    pub integral: u64,
    pub decimal: u32,
    pub decimal_places: usize,
    pub exponent: i16,
}

/// Scales `value` into printable range, returning the base-10 exponent
/// taken out of it.
fn normalize(value: &mut FloatValue) -> i16 {
    let mut exponent: i16 = 0;
    if *value >= POSITIVE_EXPONENTIATION_THRESHOLD {
        for index in (0..POWERS.len()).rev() {
            if *value >= POWERS[index] {
                *value /= POWERS[index];
                exponent += 1 << index;
            }
        }
    }
    if *value > 0.0 && *value <= NEGATIVE_EXPONENTIATION_THRESHOLD {
        for index in (0..POWERS.len()).rev() {
            if *value * POWERS[index] < 10.0 {
                *value *= POWERS[index];
                exponent -= 1 << index;
            }
        }
    }
    exponent
}

/// Splits a finite `value >= 0` into parts. The caller handles sign,
/// NaN, and infinities.
pub(crate) fn float_parts(mut value: FloatValue) -> FloatParts {
    let exponent = normalize(&mut value);

    let mut integral = value as u64;
    let mut remainder = value - integral as FloatValue;

    remainder *= DECIMAL_FACTOR;
    let mut decimal = remainder as u32;
    remainder -= decimal as FloatValue;

    // Round half up.
    if remainder >= 0.5 {
        decimal += 1;
        if decimal as FloatValue >= DECIMAL_FACTOR {
            decimal = 0;
            integral += 1;
            if exponent != 0 && integral >= 10 {
                return FloatParts {
                    integral: 1,
                    decimal: 0,
                    decimal_places: 0,
                    exponent: exponent + 1,
                };
            }
        }
    }

    let mut decimal_places = DECIMAL_PLACES;
    while decimal_places > 0 && decimal % 10 == 0 {
        decimal /= 10;
        decimal_places -= 1;
    }
    if decimal == 0 {
        decimal_places = 0;
    }

    FloatParts {
        integral,
        decimal,
        decimal_places,
        exponent,
    }
}

/// Formats an unsigned integer into `buf`, returning the digits.
pub(crate) fn format_u64(mut value: u64, buf: &mut [u8; 20]) -> &[u8] {
    let mut pos = buf.len();
    loop {
        pos -= 1;
        buf[pos] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            break;
        }
    }
    &buf[pos..]
}

/// Formats `value` zero-padded to exactly `width` digits.
pub(crate) fn format_padded(mut value: u32, width: usize, buf: &mut [u8; 20]) -> &[u8] {
    let mut pos = buf.len();
    for _ in 0..width {
        pos -= 1;
        buf[pos] = b'0' + (value % 10) as u8;
        value /= 10;
    }
    &buf[pos..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_format_u64() {
        let mut buf = [0u8; 20];
        assert_eq!(format_u64(0, &mut buf), b"0");
        let mut buf = [0u8; 20];
        assert_eq!(format_u64(42, &mut buf), b"42");
        let mut buf = [0u8; 20];
        assert_eq!(format_u64(u64::MAX, &mut buf), b"18446744073709551615");
    }

    #[test]
    fn test_format_padded() {
        let mut buf = [0u8; 20];
        assert_eq!(format_padded(5, 3, &mut buf), b"005");
        let mut buf = [0u8; 20];
        assert_eq!(format_padded(123, 3, &mut buf), b"123");
    }

    #[test]
    fn test_small_value_stays_fixed_point() {
        let parts = float_parts(3.14);
        assert_eq!(parts.integral, 3);
        assert_eq!(parts.exponent, 0);
        assert_eq!(parts.decimal, 14);
        assert_eq!(parts.decimal_places, 2);
    }

    #[test]
    fn test_integral_float() {
        let parts = float_parts(100.0);
        assert_eq!(parts.integral, 100);
        assert_eq!(parts.decimal_places, 0);
        assert_eq!(parts.exponent, 0);
    }

    #[test]
    fn test_large_value_goes_exponential() {
        let parts = float_parts(1e20);
        assert_eq!(parts.integral, 1);
        assert_eq!(parts.decimal_places, 0);
        assert_eq!(parts.exponent, 20);
    }

    #[test]
    fn test_tiny_value_goes_exponential() {
        let parts = float_parts(1e-7);
        assert_eq!(parts.integral, 1);
        assert_eq!(parts.decimal_places, 0);
        assert_eq!(parts.exponent, -7);
    }

    #[test]
    fn test_below_threshold_stays_fixed() {
        // 1e-4 is above the negative threshold; printed as 0.0001
        let parts = float_parts(0.0001);
        assert_eq!(parts.integral, 0);
        assert_eq!(parts.exponent, 0);
        assert_eq!(parts.decimal, 1);
        assert_eq!(parts.decimal_places, 4);
    }
}
