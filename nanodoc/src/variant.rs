// SPDX-License-Identifier: Apache-2.0

//! The tagged-value model: one arena slot interpreted according to its
//! active tag, plus the linked-chain representation of arrays and objects.

use crate::arena::SlotId;
use crate::strings::StringId;

// Integer and float widths are selected at build time.
#[cfg(feature = "int32")]
pub type IntValue = i32;
#[cfg(feature = "int32")]
pub type UintValue = u32;
#[cfg(feature = "int64")]
pub type IntValue = i64;
#[cfg(feature = "int64")]
pub type UintValue = u64;

#[cfg(feature = "double")]
pub type FloatValue = f64;
#[cfg(not(feature = "double"))]
pub type FloatValue = f32;

/// Head/tail pair of slot indices forming a singly-linked chain.
///
/// An array chains one slot per element. An object chain alternates
/// key-slot/value-slot pairs. There is no cached element count; `size()`
/// walks the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Collection {
    pub head: SlotId,
    pub tail: SlotId,
}

impl Collection {
    pub const EMPTY: Collection = Collection {
        head: SlotId::NIL,
        tail: SlotId::NIL,
    };
}

/// One tagged value. The discriminant determines which payload is valid;
/// nothing else may be read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum VariantData {
    Null,
    Bool(bool),
    Int(IntValue),
    Uint(UintValue),
    Float(FloatValue),
    /// Interned, reference-counted string.
    OwnedStr(StringId),
    /// By-reference string known to outlive the document; zero-copy.
    LinkedStr(&'static str),
    /// Pre-serialized content emitted verbatim by the serializers.
    RawStr(StringId),
    /// Opaque MsgPack binary (`code == None`) or extension payload.
    Extension { code: Option<i8>, data: StringId },
    Array(Collection),
    Object(Collection),
}

/// One fixed-size storage unit in the arena: a tagged value plus the link
/// used when the slot is a member of a collection chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Slot {
    pub data: VariantData,
    pub next: SlotId,
}

impl Slot {
    pub const fn null() -> Self {
        Slot {
            data: VariantData::Null,
            next: SlotId::NIL,
        }
    }
}

/// The active tag of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Null,
    Bool,
    Int,
    Uint,
    Float,
    Str,
    /// Pre-serialized content; see [`crate::RawJson`].
    Raw,
    /// Opaque MsgPack binary/extension payload.
    Extension,
    Array,
    Object,
}

impl VariantData {
    pub fn value_type(&self) -> ValueType {
        match self {
            VariantData::Null => ValueType::Null,
            VariantData::Bool(_) => ValueType::Bool,
            VariantData::Int(_) => ValueType::Int,
            VariantData::Uint(_) => ValueType::Uint,
            VariantData::Float(_) => ValueType::Float,
            VariantData::OwnedStr(_) | VariantData::LinkedStr(_) => ValueType::Str,
            VariantData::RawStr(_) => ValueType::Raw,
            VariantData::Extension { .. } => ValueType::Extension,
            VariantData::Array(_) => ValueType::Array,
            VariantData::Object(_) => ValueType::Object,
        }
    }
}

/// A typed view of a value for pattern matching.
///
/// Collections carry the handle they were viewed through so navigation can
/// continue via [`crate::Document`] methods.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypedValue<'a> {
    Null,
    Bool(bool),
    Int(IntValue),
    Uint(UintValue),
    Float(FloatValue),
    /// A valid UTF-8 string.
    Str(&'a str),
    /// String content that is not valid UTF-8 (e.g. a passed-through lone
    /// surrogate), or an opaque binary/extension payload.
    Bytes(&'a [u8]),
    Array(crate::ValueId),
    Object(crate::ValueId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_mapping() {
        assert_eq!(VariantData::Null.value_type(), ValueType::Null);
        assert_eq!(VariantData::Bool(true).value_type(), ValueType::Bool);
        assert_eq!(VariantData::Int(-1).value_type(), ValueType::Int);
        assert_eq!(VariantData::Uint(1).value_type(), ValueType::Uint);
        assert_eq!(VariantData::Float(0.5).value_type(), ValueType::Float);
        assert_eq!(VariantData::LinkedStr("x").value_type(), ValueType::Str);
        assert_eq!(
            VariantData::Array(Collection::EMPTY).value_type(),
            ValueType::Array
        );
    }

    #[test]
    fn test_slot_is_small() {
        // The whole point of the slot arena is a compact fixed-size record.
        assert!(core::mem::size_of::<Slot>() <= 32);
    }
}
