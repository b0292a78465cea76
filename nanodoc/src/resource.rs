// SPDX-License-Identifier: Apache-2.0

//! The resource manager: composes the value arena and the string interner
//! over one byte budget, and tracks the sticky overflow flag the codecs
//! consult instead of exception handling.

use crate::arena::{SlotId, SlotPool, SLOT_COST};
use crate::error::{Error, Result};
use crate::strings::{StringId, StringInterner};
use crate::variant::Slot;

/// The byte budget shared by slots and strings. Freeing refunds; retained
/// pool storage is treated as cache and is not re-charged.
pub(crate) struct Budget {
    capacity: usize,
    used: usize,
}

impl Budget {
    pub fn new(capacity: usize) -> Self {
        Budget { capacity, used: 0 }
    }

    pub fn try_charge(&mut self, bytes: usize) -> bool {
        match self.used.checked_add(bytes) {
            Some(total) if total <= self.capacity => {
                self.used = total;
                true
            }
            _ => false,
        }
    }

    pub fn refund(&mut self, bytes: usize) {
        self.used = self.used.saturating_sub(bytes);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }
}

/// Rounds a requested capacity up to the arena's allocation granularity
/// (the slot size).
pub(crate) fn round_capacity(bytes: usize) -> usize {
    match bytes.checked_add(SLOT_COST - 1) {
        Some(padded) => padded - padded % SLOT_COST,
        None => bytes - bytes % SLOT_COST,
    }
}

pub(crate) struct ResourceManager {
    budget: Budget,
    arena: SlotPool,
    strings: StringInterner,
    overflowed: bool,
}

impl ResourceManager {
    pub fn new(capacity: usize) -> Self {
        ResourceManager {
            budget: Budget::new(round_capacity(capacity)),
            arena: SlotPool::new(),
            strings: StringInterner::new(),
            overflowed: false,
        }
    }

    /// Allocates one value slot. After the first failure the manager is
    /// overflowed and every further attempt fails fast until [`clear`].
    pub fn allocate_slot(&mut self) -> Result<SlotId> {
        if self.overflowed {
            return Err(Error::NoMemory);
        }
        match self.arena.allocate(&mut self.budget) {
            Some(id) => Ok(id),
            None => {
                log::debug!("resource pool overflowed (capacity {})", self.budget.capacity());
                self.overflowed = true;
                Err(Error::NoMemory)
            }
        }
    }

    pub fn free_slot(&mut self, id: SlotId) {
        self.arena.free(id, &mut self.budget);
    }

    pub fn slot(&self, id: SlotId) -> &Slot {
        self.arena.get(id)
    }

    pub fn slot_mut(&mut self, id: SlotId) -> &mut Slot {
        self.arena.get_mut(id)
    }

    /// Interns a string, deduplicating against existing nodes.
    pub fn save_string(&mut self, bytes: &[u8]) -> Result<StringId> {
        if self.overflowed {
            return Err(Error::NoMemory);
        }
        match self.strings.intern(bytes, &mut self.budget) {
            Some(id) => Ok(id),
            None => {
                log::debug!("string pool overflowed (len {})", bytes.len());
                self.overflowed = true;
                Err(Error::NoMemory)
            }
        }
    }

    pub fn release_string(&mut self, id: StringId) {
        self.strings.release(id, &mut self.budget);
    }

    pub fn string_bytes(&self, id: StringId) -> &[u8] {
        self.strings.get(id)
    }

    /// Discards all values and strings, keeps pool storage for reuse, and
    /// resets the overflow flag.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.strings.clear();
        self.budget.reset();
        self.overflowed = false;
    }

    pub fn shrink_to_fit(&mut self) {
        self.arena.shrink_to_fit();
        self.strings.shrink_to_fit();
    }

    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    pub fn capacity(&self) -> usize {
        self.budget.capacity()
    }

    pub fn used(&self) -> usize {
        self.budget.used()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_capacity_rounding() {
        assert_eq!(round_capacity(0), 0);
        assert_eq!(round_capacity(1), SLOT_COST);
        assert_eq!(round_capacity(SLOT_COST), SLOT_COST);
        assert_eq!(round_capacity(SLOT_COST + 1), SLOT_COST * 2);
    }

    #[test]
    fn test_overflow_is_sticky() {
        let mut res = ResourceManager::new(SLOT_COST);
        assert!(res.allocate_slot().is_ok());
        assert_eq!(res.allocate_slot(), Err(Error::NoMemory));
        assert!(res.overflowed());

        // Even with room freed, allocation fails fast until clear().
        res.free_slot(SlotId(0));
        assert_eq!(res.allocate_slot(), Err(Error::NoMemory));

        res.clear();
        assert!(!res.overflowed());
        assert!(res.allocate_slot().is_ok());
    }

    #[test]
    fn test_string_failure_sets_overflow() {
        let mut res = ResourceManager::new(SLOT_COST);
        assert!(res
            .save_string(b"a string that cannot possibly fit in one slot's budget")
            .is_err());
        assert!(res.overflowed());
    }
}
