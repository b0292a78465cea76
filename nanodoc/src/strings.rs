// SPDX-License-Identifier: Apache-2.0

//! The string interner: deduplicating, reference-counted string storage
//! shared by all values in a document.
//!
//! Nodes live outside the value arena but are charged to the same byte
//! budget. The maximum string length is bounded by the configured length
//! field width (`strlen8`/`strlen16`/`strlen32`).

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::resource::Budget;

#[cfg(feature = "strlen8")]
pub(crate) type StrLen = u8;
#[cfg(feature = "strlen16")]
pub(crate) type StrLen = u16;
#[cfg(feature = "strlen32")]
pub(crate) type StrLen = u32;

/// Longest string the interner accepts; exceeding it fails allocation.
pub(crate) const MAX_STRING_LEN: usize = StrLen::MAX as usize;

/// Handle to one interned string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StringId(u32);

struct StringNode {
    bytes: Box<[u8]>,
    refs: u32,
}

/// Fixed per-node bookkeeping charged to the budget on top of the content
/// bytes: length field, refcount, and one terminator byte.
const NODE_COST: usize = core::mem::size_of::<StrLen>() + core::mem::size_of::<u32>() + 1;

fn node_cost(len: usize) -> usize {
    NODE_COST + len
}

/// Content-deduplicating table of refcounted string nodes.
pub(crate) struct StringInterner {
    nodes: Vec<Option<StringNode>>,
    free: Vec<u32>,
}

impl StringInterner {
    pub fn new() -> Self {
        StringInterner {
            nodes: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Returns an existing node with identical content (bumping its
    /// refcount) or allocates a new one. `None` means the string is too
    /// long or the budget is exhausted.
    pub fn intern(&mut self, bytes: &[u8], budget: &mut Budget) -> Option<StringId> {
        if bytes.len() > MAX_STRING_LEN {
            return None;
        }
        for (index, node) in self.nodes.iter_mut().enumerate() {
            if let Some(node) = node {
                if &*node.bytes == bytes {
                    node.refs += 1;
                    return Some(StringId(index as u32));
                }
            }
        }
        if !budget.try_charge(node_cost(bytes.len())) {
            return None;
        }
        let node = StringNode {
            bytes: bytes.into(),
            refs: 1,
        };
        let id = match self.free.pop() {
            Some(index) => {
                self.nodes[index as usize] = Some(node);
                index
            }
            None => {
                self.nodes.push(Some(node));
                (self.nodes.len() - 1) as u32
            }
        };
        Some(StringId(id))
    }

    /// Decrements the refcount; the node's storage is freed when it
    /// reaches zero.
    pub fn release(&mut self, id: StringId, budget: &mut Budget) {
        let entry = &mut self.nodes[id.0 as usize];
        if let Some(node) = entry {
            node.refs -= 1;
            if node.refs == 0 {
                budget.refund(node_cost(node.bytes.len()));
                *entry = None;
                self.free.push(id.0);
            }
        }
    }

    pub fn get(&self, id: StringId) -> &[u8] {
        match &self.nodes[id.0 as usize] {
            Some(node) => &node.bytes,
            None => &[],
        }
    }

    #[cfg(test)]
    pub fn refs(&self, id: StringId) -> u32 {
        self.nodes[id.0 as usize].as_ref().map_or(0, |n| n.refs)
    }

    /// Releases every node unconditionally.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
    }

    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
        self.free.shrink_to_fit();
    }

    /// Live node count, for diagnostics.
    #[cfg(test)]
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_interning_deduplicates() {
        let mut pool = StringInterner::new();
        let mut budget = Budget::new(4096);

        let a = pool.intern(b"hello", &mut budget).unwrap();
        let used = budget.used();
        let b = pool.intern(b"hello", &mut budget).unwrap();

        // Same node, refcount bumped, zero extra bytes charged.
        assert_eq!(a, b);
        assert_eq!(pool.refs(a), 2);
        assert_eq!(budget.used(), used);

        let c = pool.intern(b"world", &mut budget).unwrap();
        assert_ne!(a, c);
        assert_eq!(pool.node_count(), 2);
    }

    #[test]
    fn test_release_frees_at_zero() {
        let mut pool = StringInterner::new();
        let mut budget = Budget::new(4096);

        let id = pool.intern(b"key", &mut budget).unwrap();
        pool.intern(b"key", &mut budget).unwrap();

        pool.release(id, &mut budget);
        assert_eq!(pool.refs(id), 1);
        pool.release(id, &mut budget);
        assert_eq!(pool.node_count(), 0);
        assert_eq!(budget.used(), 0);
    }

    #[test]
    fn test_node_slot_reuse() {
        let mut pool = StringInterner::new();
        let mut budget = Budget::new(4096);

        let a = pool.intern(b"first", &mut budget).unwrap();
        pool.release(a, &mut budget);
        let b = pool.intern(b"second", &mut budget).unwrap();
        assert_eq!(a, b); // freed index recycled
        assert_eq!(pool.get(b), b"second");
    }

    #[test]
    fn test_length_cap() {
        let mut pool = StringInterner::new();
        let mut budget = Budget::new(usize::MAX);
        let too_long = alloc::vec![b'x'; MAX_STRING_LEN + 1];
        assert_eq!(pool.intern(&too_long, &mut budget), None);
    }

    #[test]
    fn test_budget_exhaustion() {
        let mut pool = StringInterner::new();
        let mut budget = Budget::new(8);
        assert_eq!(pool.intern(b"this string is far too big", &mut budget), None);
    }

    #[test]
    fn test_embedded_nul_distinct() {
        let mut pool = StringInterner::new();
        let mut budget = Budget::new(4096);
        let a = pool.intern(b"ab", &mut budget).unwrap();
        let b = pool.intern(b"ab\0", &mut budget).unwrap();
        // Dedup is exact byte equality; a trailing NUL is content.
        assert_ne!(a, b);
    }
}
