// SPDX-License-Identifier: Apache-2.0

//! Conversions between Rust values and document values.
//!
//! [`IntoVariant`] and [`FromVariant`] are the open seams users extend to
//! store their own types. Plain extraction (`get::<i32>`) answers with the
//! type's zero value on any mismatch; `get::<Option<T>>` distinguishes
//! "absent or not representable" from a real value.

use crate::document::{Document, ValueId};
use crate::error::Result;
use crate::variant::{FloatValue, VariantData};

/// Marks a string the document stores by reference instead of copying.
/// The `'static` bound is what makes zero-copy storage sound.
#[derive(Debug, Clone, Copy)]
pub struct LinkedStr(pub &'static str);

/// Pre-serialized JSON the serializer emits verbatim, without quoting or
/// escaping. The caller is responsible for its validity.
#[derive(Debug, Clone, Copy)]
pub struct RawJson<T>(pub T);

/// A value that can be stored into a document slot.
pub trait IntoVariant {
    fn store_into(self, doc: &mut Document, id: ValueId) -> Result<()>;
}

/// A value that can be read back out of a document slot.
pub trait FromVariant<'a>: Sized {
    fn extract(doc: &'a Document, id: ValueId) -> Self;
}

impl Document {
    /// Stores any convertible value at `id`.
    pub fn set<T: IntoVariant>(&mut self, id: ValueId, value: T) -> Result<()> {
        value.store_into(self, id)
    }

    /// Extracts the value at `id` as `T`, with `T`'s mismatch default.
    pub fn get<'a, T: FromVariant<'a>>(&'a self, id: ValueId) -> T {
        T::extract(self, id)
    }
}

impl IntoVariant for bool {
    fn store_into(self, doc: &mut Document, id: ValueId) -> Result<()> {
        doc.set_bool(id, self);
        Ok(())
    }
}

macro_rules! into_variant_signed {
    ($($t:ty),*) => {$(
        impl IntoVariant for $t {
            fn store_into(self, doc: &mut Document, id: ValueId) -> Result<()> {
                doc.store_i64(id, self as i64);
                Ok(())
            }
        }
    )*};
}
into_variant_signed!(i8, i16, i32, i64);

macro_rules! into_variant_unsigned {
    ($($t:ty),*) => {$(
        impl IntoVariant for $t {
            fn store_into(self, doc: &mut Document, id: ValueId) -> Result<()> {
                doc.store_u64(id, self as u64);
                Ok(())
            }
        }
    )*};
}
into_variant_unsigned!(u8, u16, u32, u64);

macro_rules! into_variant_float {
    ($($t:ty),*) => {$(
        impl IntoVariant for $t {
            fn store_into(self, doc: &mut Document, id: ValueId) -> Result<()> {
                doc.set_float(id, self as FloatValue);
                Ok(())
            }
        }
    )*};
}
into_variant_float!(f32, f64);

impl IntoVariant for &str {
    fn store_into(self, doc: &mut Document, id: ValueId) -> Result<()> {
        doc.set_str(id, self)
    }
}

impl IntoVariant for LinkedStr {
    fn store_into(self, doc: &mut Document, id: ValueId) -> Result<()> {
        doc.set_linked_str(id, self.0);
        Ok(())
    }
}

impl IntoVariant for RawJson<&str> {
    fn store_into(self, doc: &mut Document, id: ValueId) -> Result<()> {
        doc.set_raw_json(id, self.0)
    }
}

impl IntoVariant for () {
    fn store_into(self, doc: &mut Document, id: ValueId) -> Result<()> {
        doc.set_null(id);
        Ok(())
    }
}

impl IntoVariant for &Document {
    /// Deep-copies another document's tree into the slot.
    fn store_into(self, doc: &mut Document, id: ValueId) -> Result<()> {
        crate::document::deep_copy(self, self.root(), doc, id)
    }
}

impl<T: IntoVariant> IntoVariant for Option<T> {
    fn store_into(self, doc: &mut Document, id: ValueId) -> Result<()> {
        match self {
            Some(value) => value.store_into(doc, id),
            None => {
                doc.set_null(id);
                Ok(())
            }
        }
    }
}

/// The numeric content of a slot as a wide integer, if it holds an
/// integer-valued number (including floats with no fractional part).
fn integral_value(data: VariantData) -> Option<i128> {
    match data {
        VariantData::Int(i) => Some(i as i128),
        VariantData::Uint(u) => Some(u as i128),
        VariantData::Float(f) => {
            if f.is_finite() && f == (f as i128 as FloatValue) {
                Some(f as i128)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn float_value(data: VariantData) -> Option<FloatValue> {
    match data {
        VariantData::Int(i) => Some(i as FloatValue),
        VariantData::Uint(u) => Some(u as FloatValue),
        VariantData::Float(f) => Some(f),
        _ => None,
    }
}

impl<'a> FromVariant<'a> for bool {
    fn extract(doc: &'a Document, id: ValueId) -> Self {
        doc.as_bool(id)
    }
}

impl<'a> FromVariant<'a> for Option<bool> {
    fn extract(doc: &'a Document, id: ValueId) -> Self {
        match doc.data(id) {
            VariantData::Bool(b) => Some(b),
            _ => None,
        }
    }
}

macro_rules! from_variant_int {
    ($($t:ty),*) => {$(
        impl<'a> FromVariant<'a> for $t {
            fn extract(doc: &'a Document, id: ValueId) -> Self {
                <Option<$t>>::extract(doc, id).unwrap_or(0)
            }
        }

        impl<'a> FromVariant<'a> for Option<$t> {
            /// `Some` only when the stored number is exactly representable.
            fn extract(doc: &'a Document, id: ValueId) -> Self {
                integral_value(doc.data(id)).and_then(|wide| <$t>::try_from(wide).ok())
            }
        }
    )*};
}
from_variant_int!(i8, i16, i32, i64, u8, u16, u32, u64);

macro_rules! from_variant_float {
    ($($t:ty),*) => {$(
        impl<'a> FromVariant<'a> for $t {
            fn extract(doc: &'a Document, id: ValueId) -> Self {
                <Option<$t>>::extract(doc, id).unwrap_or(0.0)
            }
        }

        impl<'a> FromVariant<'a> for Option<$t> {
            fn extract(doc: &'a Document, id: ValueId) -> Self {
                float_value(doc.data(id)).map(|f| f as $t)
            }
        }
    )*};
}
from_variant_float!(f32, f64);

impl<'a> FromVariant<'a> for &'a str {
    fn extract(doc: &'a Document, id: ValueId) -> Self {
        doc.as_str(id).unwrap_or("")
    }
}

impl<'a> FromVariant<'a> for Option<&'a str> {
    fn extract(doc: &'a Document, id: ValueId) -> Self {
        doc.as_str(id)
    }
}

impl<'a> FromVariant<'a> for Option<&'a [u8]> {
    fn extract(doc: &'a Document, id: ValueId) -> Self {
        doc.as_bytes(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_roundtrip_scalars() {
        let mut doc = Document::new(256);
        let root = doc.root();

        doc.set(root, 42i32).unwrap();
        assert_eq!(doc.get::<i32>(root), 42);
        assert_eq!(doc.get::<u64>(root), 42);

        doc.set(root, -1i8).unwrap();
        assert_eq!(doc.get::<i32>(root), -1);
        assert_eq!(doc.get::<Option<u32>>(root), None);

        doc.set(root, true).unwrap();
        assert!(doc.get::<bool>(root));
        assert_eq!(doc.get::<Option<i32>>(root), None);
    }

    #[test]
    fn test_mismatch_defaults() {
        let mut doc = Document::new(256);
        let root = doc.root();
        doc.set(root, "text").unwrap();
        assert_eq!(doc.get::<i32>(root), 0);
        assert_eq!(doc.get::<f64>(root), 0.0);
        assert!(!doc.get::<bool>(root));
        assert_eq!(doc.get::<&str>(root), "text");
    }

    #[test]
    fn test_representability() {
        let mut doc = Document::new(256);
        let root = doc.root();

        doc.set(root, 10_000_000_000.0f64).unwrap();
        assert_eq!(doc.get::<Option<i32>>(root), None);
        assert_eq!(doc.get::<Option<i64>>(root), Some(10_000_000_000));
        assert_eq!(doc.get::<Option<f64>>(root), Some(1e10));

        doc.set(root, 2.5f64).unwrap();
        assert_eq!(doc.get::<Option<i64>>(root), None);
        assert_eq!(doc.get::<Option<f64>>(root), Some(2.5));
    }

    #[test]
    fn test_option_none_stores_null() {
        let mut doc = Document::new(256);
        let root = doc.root();
        doc.set(root, Option::<i32>::None).unwrap();
        assert!(doc.is_null(root));
        doc.set(root, Some(7i32)).unwrap();
        assert_eq!(doc.get::<i32>(root), 7);
    }

    #[test]
    fn test_nested_document_copy() {
        let mut inner = Document::new(512);
        inner.to_object(inner.root());
        let m = inner.add_member(inner.root(), "x").unwrap();
        inner.set(m, 1i32).unwrap();

        let mut outer = Document::new(1024);
        outer.to_array(outer.root());
        let el = outer.add_element(outer.root()).unwrap();
        outer.set(el, &inner).unwrap();

        let copied = outer.get_element(outer.root(), 0).unwrap();
        assert_eq!(outer.as_int(outer.get_member(copied, "x").unwrap()), 1);
    }

    // One store/extract round trip per primitive width.
    macro_rules! int_round_trip_tests {
        ($($t:ty),*) => {$(
            paste::paste! {
                #[test]
                fn [<test_round_trip_ $t>]() {
                    let mut doc = Document::new(256);
                    let root = doc.root();
                    doc.set(root, <$t>::MAX).unwrap();
                    assert_eq!(doc.get::<Option<$t>>(root), Some(<$t>::MAX));
                    doc.set(root, <$t>::MIN).unwrap();
                    assert_eq!(doc.get::<Option<$t>>(root), Some(<$t>::MIN));
                }
            }
        )*};
    }
    int_round_trip_tests!(i8, i16, i32, u8, u16, u32);

    #[test]
    fn test_linked_str_is_zero_copy() {
        let mut doc = Document::new(256);
        let root = doc.root();
        doc.set(root, LinkedStr("static text")).unwrap();
        assert_eq!(doc.memory_usage(), 0);
        assert_eq!(doc.get::<&str>(root), "static text");
    }
}
