// SPDX-License-Identifier: Apache-2.0

//! The document: one resource manager plus one root value, with the
//! id-based construction and inspection API the codecs build on.
//!
//! Values are addressed by [`ValueId`] handles, never by reference, so the
//! arena stays free to grow and compact. All mutating operations allocate
//! through the owning resource manager and release whatever string or
//! collection resources the overwritten value held.

use crate::arena::SlotId;
use crate::error::{Error, Result};
use crate::resource::ResourceManager;
use crate::strings::StringId;
use crate::variant::{
    Collection, FloatValue, IntValue, Slot, TypedValue, UintValue, ValueType, VariantData,
};

/// Handle to one value inside a [`Document`].
///
/// Ids are only meaningful for the document that produced them and are
/// invalidated by `clear`, `garbage_collect`, and by removing the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueId(pub(crate) SlotId);

/// A JSON/MsgPack document holding one value tree inside a fixed memory
/// budget.
pub struct Document {
    resources: ResourceManager,
    root: Slot,
}

impl Document {
    /// Creates a document with the given byte capacity, rounded up to the
    /// arena's allocation granularity.
    pub fn new(capacity: usize) -> Self {
        Document {
            resources: ResourceManager::new(capacity),
            root: Slot::null(),
        }
    }

    /// The root value; always valid, starts as null.
    pub fn root(&self) -> ValueId {
        ValueId(SlotId::ROOT)
    }

    fn slot(&self, id: ValueId) -> &Slot {
        if id.0 == SlotId::ROOT {
            &self.root
        } else {
            self.resources.slot(id.0)
        }
    }

    fn slot_mut(&mut self, id: ValueId) -> &mut Slot {
        if id.0 == SlotId::ROOT {
            &mut self.root
        } else {
            self.resources.slot_mut(id.0)
        }
    }

    pub(crate) fn data(&self, id: ValueId) -> VariantData {
        self.slot(id).data
    }

    pub(crate) fn string_bytes(&self, id: StringId) -> &[u8] {
        self.resources.string_bytes(id)
    }

    pub(crate) fn chain_next(&self, slot: SlotId) -> SlotId {
        self.resources.slot(slot).next
    }

    pub(crate) fn chain_data(&self, slot: SlotId) -> VariantData {
        self.resources.slot(slot).data
    }

    /// The active tag of a value.
    pub fn value_type(&self, id: ValueId) -> ValueType {
        self.data(id).value_type()
    }

    /// A typed view for pattern matching; strings resolve through the
    /// interner, collections carry their handle for further navigation.
    pub fn typed(&self, id: ValueId) -> TypedValue<'_> {
        match self.data(id) {
            VariantData::Null => TypedValue::Null,
            VariantData::Bool(b) => TypedValue::Bool(b),
            VariantData::Int(i) => TypedValue::Int(i),
            VariantData::Uint(u) => TypedValue::Uint(u),
            VariantData::Float(f) => TypedValue::Float(f),
            VariantData::LinkedStr(s) => TypedValue::Str(s),
            VariantData::OwnedStr(s) | VariantData::RawStr(s) => {
                let bytes = self.resources.string_bytes(s);
                match core::str::from_utf8(bytes) {
                    Ok(s) => TypedValue::Str(s),
                    Err(_) => TypedValue::Bytes(bytes),
                }
            }
            VariantData::Extension { data, .. } => {
                TypedValue::Bytes(self.resources.string_bytes(data))
            }
            VariantData::Array(_) => TypedValue::Array(id),
            VariantData::Object(_) => TypedValue::Object(id),
        }
    }

    // ----- resource release -----

    /// Releases every string and slot reachable from `data`. The data copy
    /// itself is already detached from its slot by the caller.
    fn release_data(&mut self, data: VariantData) {
        match data {
            VariantData::OwnedStr(s) | VariantData::RawStr(s) => {
                self.resources.release_string(s);
            }
            VariantData::Extension { data: s, .. } => {
                self.resources.release_string(s);
            }
            VariantData::Array(col) | VariantData::Object(col) => {
                let mut cur = col.head;
                while !cur.is_nil() {
                    let slot = *self.resources.slot(cur);
                    self.release_data(slot.data);
                    self.resources.free_slot(cur);
                    cur = slot.next;
                }
            }
            _ => {}
        }
    }

    fn set_data(&mut self, id: ValueId, data: VariantData) {
        let old = core::mem::replace(&mut self.slot_mut(id).data, data);
        self.release_data(old);
    }

    // ----- scalar setters -----

    pub fn set_null(&mut self, id: ValueId) {
        self.set_data(id, VariantData::Null);
    }

    pub fn set_bool(&mut self, id: ValueId, value: bool) {
        self.set_data(id, VariantData::Bool(value));
    }

    pub fn set_int(&mut self, id: ValueId, value: IntValue) {
        self.set_data(id, VariantData::Int(value));
    }

    pub fn set_uint(&mut self, id: ValueId, value: UintValue) {
        self.set_data(id, VariantData::Uint(value));
    }

    pub fn set_float(&mut self, id: ValueId, value: FloatValue) {
        self.set_data(id, VariantData::Float(value));
    }

    /// Stores an `i64`, picking the narrowest representation: unsigned when
    /// non-negative, signed when it fits, float otherwise.
    pub(crate) fn store_i64(&mut self, id: ValueId, value: i64) {
        if value >= 0 {
            self.store_u64(id, value as u64);
        } else if value >= IntValue::MIN as i64 {
            self.set_int(id, value as IntValue);
        } else {
            self.set_float(id, value as FloatValue);
        }
    }

    pub(crate) fn store_u64(&mut self, id: ValueId, value: u64) {
        if value <= UintValue::MAX as u64 {
            self.set_uint(id, value as UintValue);
        } else {
            self.set_float(id, value as FloatValue);
        }
    }

    /// Copies the string into the interner. On failure the value is left
    /// null and the overflow flag is set.
    pub fn set_str(&mut self, id: ValueId, value: &str) -> Result<()> {
        self.set_str_bytes(id, value.as_bytes())
    }

    pub(crate) fn set_str_bytes(&mut self, id: ValueId, bytes: &[u8]) -> Result<()> {
        match self.resources.save_string(bytes) {
            Ok(s) => {
                self.set_data(id, VariantData::OwnedStr(s));
                Ok(())
            }
            Err(e) => {
                self.set_null(id);
                Err(e)
            }
        }
    }

    /// Stores a string by reference, zero-copy. The caller guarantees the
    /// string outlives the document; `'static` makes that structural.
    pub fn set_linked_str(&mut self, id: ValueId, value: &'static str) {
        self.set_data(id, VariantData::LinkedStr(value));
    }

    /// Stores pre-serialized content that the serializers emit verbatim.
    pub fn set_raw_json(&mut self, id: ValueId, value: &str) -> Result<()> {
        match self.resources.save_string(value.as_bytes()) {
            Ok(s) => {
                self.set_data(id, VariantData::RawStr(s));
                Ok(())
            }
            Err(e) => {
                self.set_null(id);
                Err(e)
            }
        }
    }

    /// Stores an opaque MsgPack binary (`code == None`) or extension
    /// payload.
    pub(crate) fn set_extension(
        &mut self,
        id: ValueId,
        code: Option<i8>,
        payload: &[u8],
    ) -> Result<()> {
        match self.resources.save_string(payload) {
            Ok(s) => {
                self.set_data(id, VariantData::Extension { code, data: s });
                Ok(())
            }
            Err(e) => {
                self.set_null(id);
                Err(e)
            }
        }
    }

    // ----- collections -----

    /// Converts the value to an empty array, releasing whatever it held.
    pub fn to_array(&mut self, id: ValueId) {
        self.set_data(id, VariantData::Array(Collection::EMPTY));
    }

    /// Converts the value to an empty object, releasing whatever it held.
    pub fn to_object(&mut self, id: ValueId) {
        self.set_data(id, VariantData::Object(Collection::EMPTY));
    }

    fn append_to_chain(&mut self, id: ValueId, first: SlotId, last: SlotId) {
        let col = match self.data(id) {
            VariantData::Array(c) | VariantData::Object(c) => c,
            _ => return,
        };
        if col.tail.is_nil() {
            let col = Collection { head: first, tail: last };
            self.write_collection(id, col);
        } else {
            self.resources.slot_mut(col.tail).next = first;
            let col = Collection { head: col.head, tail: last };
            self.write_collection(id, col);
        }
    }

    fn write_collection(&mut self, id: ValueId, col: Collection) {
        let slot = self.slot_mut(id);
        slot.data = match slot.data {
            VariantData::Array(_) => VariantData::Array(col),
            VariantData::Object(_) => VariantData::Object(col),
            other => other,
        };
    }

    /// Appends a new null element to an array, in O(1) via the tail link.
    pub fn add_element(&mut self, array: ValueId) -> Result<ValueId> {
        match self.data(array) {
            VariantData::Array(_) => {}
            _ => return Err(Error::InvalidInput),
        }
        let slot = self.resources.allocate_slot()?;
        self.append_to_chain(array, slot, slot);
        Ok(ValueId(slot))
    }

    /// The `index`-th element of an array; O(n) chain walk.
    pub fn get_element(&self, array: ValueId, index: usize) -> Option<ValueId> {
        let col = match self.data(array) {
            VariantData::Array(c) => c,
            _ => return None,
        };
        let mut cur = col.head;
        for _ in 0..index {
            if cur.is_nil() {
                return None;
            }
            cur = self.resources.slot(cur).next;
        }
        if cur.is_nil() {
            None
        } else {
            Some(ValueId(cur))
        }
    }

    /// Splices the `index`-th element out of an array and frees it.
    pub fn remove_element(&mut self, array: ValueId, index: usize) {
        let col = match self.data(array) {
            VariantData::Array(c) => c,
            _ => return,
        };
        let mut prev = SlotId::NIL;
        let mut cur = col.head;
        for _ in 0..index {
            if cur.is_nil() {
                return;
            }
            prev = cur;
            cur = self.resources.slot(cur).next;
        }
        if cur.is_nil() {
            return;
        }
        let removed = *self.resources.slot(cur);
        if prev.is_nil() {
            self.write_collection(
                array,
                Collection {
                    head: removed.next,
                    tail: if col.tail == cur { SlotId::NIL } else { col.tail },
                },
            );
        } else {
            self.resources.slot_mut(prev).next = removed.next;
            self.write_collection(
                array,
                Collection {
                    head: col.head,
                    tail: if col.tail == cur { prev } else { col.tail },
                },
            );
        }
        self.release_data(removed.data);
        self.resources.free_slot(cur);
    }

    fn key_matches(&self, key_data: VariantData, key: &[u8]) -> bool {
        match key_data {
            VariantData::OwnedStr(s) => self.resources.string_bytes(s) == key,
            VariantData::LinkedStr(s) => s.as_bytes() == key,
            _ => false,
        }
    }

    /// Looks up a member's value slot by key; O(n) scan over the
    /// alternating key/value chain.
    pub fn get_member(&self, object: ValueId, key: &str) -> Option<ValueId> {
        self.get_member_bytes(object, key.as_bytes())
    }

    pub(crate) fn get_member_bytes(&self, object: ValueId, key: &[u8]) -> Option<ValueId> {
        let col = match self.data(object) {
            VariantData::Object(c) => c,
            _ => return None,
        };
        let mut cur = col.head;
        while !cur.is_nil() {
            let key_slot = *self.resources.slot(cur);
            let value = key_slot.next;
            if value.is_nil() {
                return None;
            }
            if self.key_matches(key_slot.data, key) {
                return Some(ValueId(value));
            }
            cur = self.resources.slot(value).next;
        }
        None
    }

    /// Returns the member's value, adding a null member if the key is not
    /// present. The key is copied into the interner.
    pub fn add_member(&mut self, object: ValueId, key: &str) -> Result<ValueId> {
        self.add_member_bytes(object, key.as_bytes())
    }

    pub(crate) fn add_member_bytes(&mut self, object: ValueId, key: &[u8]) -> Result<ValueId> {
        match self.data(object) {
            VariantData::Object(_) => {}
            _ => return Err(Error::InvalidInput),
        }
        if let Some(existing) = self.get_member_bytes(object, key) {
            return Ok(existing);
        }
        let key_string = self.resources.save_string(key)?;
        self.add_member_pair(object, VariantData::OwnedStr(key_string))
            .map_err(|e| {
                self.resources.release_string(key_string);
                e
            })
    }

    /// Like [`add_member`] but stores the key by reference, zero-copy.
    pub fn add_member_linked(&mut self, object: ValueId, key: &'static str) -> Result<ValueId> {
        match self.data(object) {
            VariantData::Object(_) => {}
            _ => return Err(Error::InvalidInput),
        }
        if let Some(existing) = self.get_member_bytes(object, key.as_bytes()) {
            return Ok(existing);
        }
        self.add_member_pair(object, VariantData::LinkedStr(key))
    }

    fn add_member_pair(&mut self, object: ValueId, key_data: VariantData) -> Result<ValueId> {
        let key_slot = self.resources.allocate_slot()?;
        let value_slot = match self.resources.allocate_slot() {
            Ok(id) => id,
            Err(e) => {
                self.resources.free_slot(key_slot);
                return Err(e);
            }
        };
        {
            let key = self.resources.slot_mut(key_slot);
            key.data = key_data;
            key.next = value_slot;
        }
        self.append_to_chain(object, key_slot, value_slot);
        Ok(ValueId(value_slot))
    }

    /// Removes a member by key: splices the key/value pair out of the
    /// chain and frees both slots.
    pub fn remove_member(&mut self, object: ValueId, key: &str) {
        let col = match self.data(object) {
            VariantData::Object(c) => c,
            _ => return,
        };
        let mut prev_value = SlotId::NIL;
        let mut cur = col.head;
        while !cur.is_nil() {
            let key_slot = *self.resources.slot(cur);
            let value = key_slot.next;
            if value.is_nil() {
                return;
            }
            let value_slot = *self.resources.slot(value);
            if self.key_matches(key_slot.data, key.as_bytes()) {
                if prev_value.is_nil() {
                    self.write_collection(
                        object,
                        Collection {
                            head: value_slot.next,
                            tail: if col.tail == value { SlotId::NIL } else { col.tail },
                        },
                    );
                } else {
                    self.resources.slot_mut(prev_value).next = value_slot.next;
                    self.write_collection(
                        object,
                        Collection {
                            head: col.head,
                            tail: if col.tail == value { prev_value } else { col.tail },
                        },
                    );
                }
                self.release_data(key_slot.data);
                self.release_data(value_slot.data);
                self.resources.free_slot(cur);
                self.resources.free_slot(value);
                return;
            }
            prev_value = value;
            cur = value_slot.next;
        }
    }

    /// Element count of an array, member count of an object, zero for
    /// scalars. O(n): the chain carries no cached count.
    pub fn size(&self, id: ValueId) -> usize {
        let col = match self.data(id) {
            VariantData::Array(c) => return self.chain_len(c),
            VariantData::Object(c) => c,
            _ => return 0,
        };
        self.chain_len(col) / 2
    }

    fn chain_len(&self, col: Collection) -> usize {
        let mut count = 0;
        let mut cur = col.head;
        while !cur.is_nil() {
            count += 1;
            cur = self.resources.slot(cur).next;
        }
        count
    }

    /// Maximum depth of any reachable collection; a scalar is 0, `[]` is 1,
    /// `[[]]` is 2. Diagnostic only: the parsers enforce the limit.
    pub fn nesting(&self, id: ValueId) -> usize {
        self.data_nesting(self.data(id))
    }

    fn data_nesting(&self, data: VariantData) -> usize {
        match data {
            VariantData::Array(col) | VariantData::Object(col) => {
                let mut deepest = 0;
                let mut cur = col.head;
                while !cur.is_nil() {
                    let slot = *self.resources.slot(cur);
                    deepest = deepest.max(self.data_nesting(slot.data));
                    cur = slot.next;
                }
                deepest + 1
            }
            _ => 0,
        }
    }

    // ----- typed accessors (mismatches yield type-appropriate defaults) -----

    pub fn is_null(&self, id: ValueId) -> bool {
        matches!(self.data(id), VariantData::Null)
    }

    pub fn as_bool(&self, id: ValueId) -> bool {
        matches!(self.data(id), VariantData::Bool(true))
    }

    pub fn as_int(&self, id: ValueId) -> IntValue {
        match self.data(id) {
            VariantData::Int(i) => i,
            VariantData::Uint(u) if u <= IntValue::MAX as UintValue => u as IntValue,
            VariantData::Float(f)
                if f >= IntValue::MIN as FloatValue && f <= IntValue::MAX as FloatValue =>
            {
                f as IntValue
            }
            _ => 0,
        }
    }

    pub fn as_uint(&self, id: ValueId) -> UintValue {
        match self.data(id) {
            VariantData::Uint(u) => u,
            VariantData::Int(i) if i >= 0 => i as UintValue,
            VariantData::Float(f) if f >= 0.0 && f <= UintValue::MAX as FloatValue => {
                f as UintValue
            }
            _ => 0,
        }
    }

    pub fn as_float(&self, id: ValueId) -> FloatValue {
        match self.data(id) {
            VariantData::Float(f) => f,
            VariantData::Int(i) => i as FloatValue,
            VariantData::Uint(u) => u as FloatValue,
            _ => 0.0,
        }
    }

    /// String content, or `None` if the value is not a string or holds
    /// bytes that are not valid UTF-8 (a passed-through lone surrogate).
    pub fn as_str(&self, id: ValueId) -> Option<&str> {
        match self.typed(id) {
            TypedValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Raw bytes of a string or opaque binary/extension payload.
    pub fn as_bytes(&self, id: ValueId) -> Option<&[u8]> {
        match self.data(id) {
            VariantData::OwnedStr(s) | VariantData::RawStr(s) => {
                Some(self.resources.string_bytes(s))
            }
            VariantData::LinkedStr(s) => Some(s.as_bytes()),
            VariantData::Extension { data, .. } => Some(self.resources.string_bytes(data)),
            _ => None,
        }
    }

    // ----- lifecycle -----

    /// Discards the whole tree, resets the overflow flag, and keeps pool
    /// storage for reuse, so peak memory does not grow across repeated
    /// clear/parse cycles.
    pub fn clear(&mut self) {
        self.root = Slot::null();
        self.resources.clear();
    }

    /// Byte capacity of the memory budget.
    pub fn capacity(&self) -> usize {
        self.resources.capacity()
    }

    /// Bytes currently charged against the budget.
    pub fn memory_usage(&self) -> usize {
        self.resources.used()
    }

    /// True once any allocation has failed; stays true until [`clear`].
    pub fn overflowed(&self) -> bool {
        self.resources.overflowed()
    }

    /// Compacts the arena's backing storage; call when the document is
    /// final and not expected to grow.
    pub fn shrink_to_fit(&mut self) {
        self.resources.shrink_to_fit();
    }

    /// Rebuilds the document in a fresh arena of the same capacity,
    /// dropping free-list fragmentation and unreferenced interner slots.
    /// On failure the document is left untouched.
    pub fn garbage_collect(&mut self) -> Result<()> {
        log::debug!("garbage collecting document ({} bytes used)", self.memory_usage());
        let mut fresh = Document::new(self.capacity());
        let dst_root = fresh.root();
        deep_copy(self, self.root(), &mut fresh, dst_root)?;
        *self = fresh;
        Ok(())
    }

    // ----- codec delegates -----

    /// Parses JSON text from `input` into this document, replacing its
    /// previous content.
    pub fn parse_json<R: crate::Reader>(&mut self, input: R) -> Result<()> {
        crate::parse_json(self, input)
    }

    /// Parses MsgPack bytes from `input` into this document, replacing its
    /// previous content.
    pub fn parse_msgpack<R: crate::Reader>(&mut self, input: R) -> Result<()> {
        crate::parse_msgpack(self, input)
    }

    /// Serializes this document as compact JSON, returning the bytes
    /// written.
    pub fn serialize_json<W: crate::Writer>(&self, output: &mut W) -> usize {
        crate::serialize_json(self, output)
    }

    /// Serializes this document as MsgPack, returning the bytes written.
    pub fn serialize_msgpack<W: crate::Writer>(&self, output: &mut W) -> usize {
        crate::serialize_msgpack(self, output)
    }
}

/// Deep-copies `src_id` (in `src`) over `dst_id` (in `dst`), duplicating
/// every reachable string into the destination's own interner.
pub(crate) fn deep_copy(
    src: &Document,
    src_id: ValueId,
    dst: &mut Document,
    dst_id: ValueId,
) -> Result<()> {
    match src.data(src_id) {
        VariantData::Null => dst.set_null(dst_id),
        VariantData::Bool(b) => dst.set_bool(dst_id, b),
        VariantData::Int(i) => dst.set_int(dst_id, i),
        VariantData::Uint(u) => dst.set_uint(dst_id, u),
        VariantData::Float(f) => dst.set_float(dst_id, f),
        VariantData::LinkedStr(s) => dst.set_linked_str(dst_id, s),
        VariantData::OwnedStr(s) => {
            let bytes = src.string_bytes(s);
            dst.set_str_bytes(dst_id, bytes)?;
        }
        VariantData::RawStr(s) => {
            let bytes = src.string_bytes(s);
            match dst.resources.save_string(bytes) {
                Ok(copied) => dst.set_data(dst_id, VariantData::RawStr(copied)),
                Err(e) => {
                    dst.set_null(dst_id);
                    return Err(e);
                }
            }
        }
        VariantData::Extension { code, data } => {
            let bytes = src.string_bytes(data);
            dst.set_extension(dst_id, code, bytes)?;
        }
        VariantData::Array(col) => {
            dst.to_array(dst_id);
            let mut cur = col.head;
            while !cur.is_nil() {
                let child = dst.add_element(dst_id)?;
                deep_copy(src, ValueId(cur), dst, child)?;
                cur = src.chain_next(cur);
            }
        }
        VariantData::Object(col) => {
            dst.to_object(dst_id);
            let mut cur = col.head;
            while !cur.is_nil() {
                let key_data = src.chain_data(cur);
                let value = src.chain_next(cur);
                if value.is_nil() {
                    break;
                }
                let child = match key_data {
                    VariantData::LinkedStr(s) => dst.add_member_linked(dst_id, s)?,
                    VariantData::OwnedStr(s) => {
                        let key = src.string_bytes(s);
                        dst.add_member_bytes(dst_id, key)?
                    }
                    _ => return Err(Error::InvalidInput),
                };
                deep_copy(src, ValueId(value), dst, child)?;
                cur = src.chain_next(value);
            }
        }
    }
    Ok(())
}

impl Clone for Document {
    /// Deep copy into an independent arena of the same capacity. If the
    /// copy overflows, the clone holds a partial tree and reports
    /// `overflowed()`, mirroring a failed parse.
    fn clone(&self) -> Self {
        let mut copy = Document::new(self.capacity());
        let dst_root = copy.root();
        let _ = deep_copy(self, self.root(), &mut copy, dst_root);
        copy
    }
}

fn variant_eq(a_doc: &Document, a: VariantData, b_doc: &Document, b: VariantData) -> bool {
    fn numeric(data: VariantData) -> Option<FloatValue> {
        match data {
            VariantData::Int(i) => Some(i as FloatValue),
            VariantData::Uint(u) => Some(u as FloatValue),
            VariantData::Float(f) => Some(f),
            _ => None,
        }
    }

    match (a, b) {
        (VariantData::Null, VariantData::Null) => true,
        (VariantData::Bool(x), VariantData::Bool(y)) => x == y,
        (VariantData::Extension { code: ca, data: da }, VariantData::Extension { code: cb, data: db }) => {
            ca == cb && a_doc.string_bytes(da) == b_doc.string_bytes(db)
        }
        (VariantData::Array(x), VariantData::Array(y))
        | (VariantData::Object(x), VariantData::Object(y)) => {
            let mut ca = x.head;
            let mut cb = y.head;
            while !ca.is_nil() && !cb.is_nil() {
                if !variant_eq(a_doc, a_doc.chain_data(ca), b_doc, b_doc.chain_data(cb)) {
                    return false;
                }
                ca = a_doc.chain_next(ca);
                cb = b_doc.chain_next(cb);
            }
            ca.is_nil() && cb.is_nil()
        }
        _ => {
            // Strings compare by content regardless of owned/linked/raw
            // storage; numbers compare by value across tags.
            let a_str = string_content(a_doc, a);
            let b_str = string_content(b_doc, b);
            if let (Some(x), Some(y)) = (a_str, b_str) {
                return x == y;
            }
            if let (Some(x), Some(y)) = (numeric(a), numeric(b)) {
                return x == y;
            }
            false
        }
    }
}

fn string_content(doc: &Document, data: VariantData) -> Option<&[u8]> {
    match data {
        VariantData::OwnedStr(s) | VariantData::RawStr(s) => Some(doc.string_bytes(s)),
        VariantData::LinkedStr(s) => Some(s.as_bytes()),
        _ => None,
    }
}

impl PartialEq for Document {
    /// Structural equality: same shape, keys, and values. Numbers compare
    /// by value across integer/float tags, which is what the codecs'
    /// narrowing re-encodings require. Object members compare in insertion
    /// order: two objects with the same pairs in a different order are not
    /// equal, matching the order both serializers emit.
    fn eq(&self, other: &Self) -> bool {
        variant_eq(self, self.data(self.root()), other, other.data(other.root()))
    }
}

struct DebugValue<'a> {
    doc: &'a Document,
    id: ValueId,
}

impl core::fmt::Debug for DebugValue<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let doc = self.doc;
        match doc.data(self.id) {
            VariantData::Null => f.write_str("null"),
            VariantData::Bool(b) => write!(f, "{}", b),
            VariantData::Int(i) => write!(f, "{}", i),
            VariantData::Uint(u) => write!(f, "{}", u),
            VariantData::Float(x) => write!(f, "{:?}", x),
            VariantData::OwnedStr(s) | VariantData::RawStr(s) => {
                fmt_str_bytes(f, doc.string_bytes(s))
            }
            VariantData::LinkedStr(s) => write!(f, "{:?}", s),
            VariantData::Extension { code, data } => {
                write!(f, "ext({:?}, {:?})", code, doc.string_bytes(data))
            }
            VariantData::Array(col) => {
                let mut list = f.debug_list();
                let mut cur = col.head;
                while !cur.is_nil() {
                    list.entry(&DebugValue { doc, id: ValueId(cur) });
                    cur = doc.chain_next(cur);
                }
                list.finish()
            }
            VariantData::Object(col) => {
                let mut map = f.debug_map();
                let mut cur = col.head;
                while !cur.is_nil() {
                    let value = doc.chain_next(cur);
                    if value.is_nil() {
                        break;
                    }
                    let key = DebugValue { doc, id: ValueId(cur) };
                    map.entry(&key, &DebugValue { doc, id: ValueId(value) });
                    cur = doc.chain_next(value);
                }
                map.finish()
            }
        }
    }
}

fn fmt_str_bytes(f: &mut core::fmt::Formatter<'_>, bytes: &[u8]) -> core::fmt::Result {
    match core::str::from_utf8(bytes) {
        Ok(s) => write!(f, "{:?}", s),
        Err(_) => write!(f, "{:?}", bytes),
    }
}

impl core::fmt::Debug for Document {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Document")
            .field(&DebugValue {
                doc: self,
                id: self.root(),
            })
            .finish()
    }
}
