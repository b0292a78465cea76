// SPDX-License-Identifier: Apache-2.0

//! The value arena: a growable list of fixed-capacity slot pools.
//!
//! Slots are addressed by [`SlotId`], never by memory address, so pools can
//! be grown and the backing storage compacted without touching existing
//! references. Released slots are recycled through an intrusive LIFO free
//! list threaded through the slots' own `next` field.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::resource::Budget;
use crate::variant::Slot;

/// Slots per pool. Pools never move once allocated, so growth is O(1) and
/// never relocates existing slots.
pub(crate) const POOL_CAPACITY: usize = 64;

/// Pool-list capacity reserved up front; the list capacity doubles when
/// exhausted.
pub(crate) const INITIAL_POOL_COUNT: usize = 4;

/// Bytes charged to the budget per live slot.
pub(crate) const SLOT_COST: usize = core::mem::size_of::<Slot>();

/// Index of one slot in the pool list. The only form of internal reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotId(pub(crate) u32);

impl SlotId {
    /// Sentinel meaning "no slot".
    pub(crate) const NIL: SlotId = SlotId(u32::MAX);
    /// Reserved id for the document's inline root slot; never handed out
    /// by the arena.
    pub(crate) const ROOT: SlotId = SlotId(u32::MAX - 1);
    /// Highest id the arena may hand out; keeps the sentinels unambiguous.
    const MAX_INDEX: u32 = u32::MAX - 2;

    pub(crate) fn is_nil(self) -> bool {
        self == Self::NIL
    }
}

struct Pool {
    slots: Box<[Slot]>,
    usage: usize,
}

impl Pool {
    fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::new();
        slots.resize(capacity, Slot::null());
        Pool {
            slots: slots.into_boxed_slice(),
            usage: 0,
        }
    }
}

/// The pool list plus the free list of recycled slots.
pub(crate) struct SlotPool {
    pools: Vec<Pool>,
    /// Pool currently being filled; earlier pools are full (or were reset
    /// by `clear`).
    active: usize,
    free_head: SlotId,
}

impl SlotPool {
    pub fn new() -> Self {
        SlotPool {
            pools: Vec::with_capacity(INITIAL_POOL_COUNT),
            active: 0,
            free_head: SlotId::NIL,
        }
    }

    /// Returns a free slot, preferring the most recently released one, then
    /// the last pool's unused tail, then growing the pool list. `None` means
    /// the budget is exhausted or the id space is full.
    pub fn allocate(&mut self, budget: &mut Budget) -> Option<SlotId> {
        if !budget.try_charge(SLOT_COST) {
            return None;
        }
        if let Some(id) = self.pop_free() {
            return Some(id);
        }
        match self.allocate_from_tail() {
            Some(id) => Some(id),
            None => {
                budget.refund(SLOT_COST);
                None
            }
        }
    }

    fn pop_free(&mut self) -> Option<SlotId> {
        if self.free_head.is_nil() {
            return None;
        }
        let id = self.free_head;
        let slot = self.get_mut(id);
        let next = slot.next;
        *slot = Slot::null();
        self.free_head = next;
        Some(id)
    }

    fn allocate_from_tail(&mut self) -> Option<SlotId> {
        while self.active < self.pools.len()
            && self.pools[self.active].usage == self.pools[self.active].slots.len()
        {
            self.active += 1;
        }
        if self.active == self.pools.len() {
            self.add_pool()?;
        }
        let pool = &mut self.pools[self.active];
        let id = SlotId((self.active * POOL_CAPACITY + pool.usage) as u32);
        pool.usage += 1;
        Some(id)
    }

    fn add_pool(&mut self) -> Option<()> {
        let first_id = self.pools.len().checked_mul(POOL_CAPACITY)?;
        if first_id as u64 > SlotId::MAX_INDEX as u64 {
            return None;
        }
        // The pool that would straddle the sentinel range is shrunk so that
        // SlotId::NIL and SlotId::ROOT stay unambiguous.
        let remaining = (SlotId::MAX_INDEX as u64 - first_id as u64 + 1) as usize;
        let capacity = POOL_CAPACITY.min(remaining);
        if self.pools.len() == self.pools.capacity() {
            // Geometric doubling of the pool-list capacity.
            let grow = self.pools.capacity().max(INITIAL_POOL_COUNT);
            self.pools.reserve_exact(grow);
        }
        log::trace!("arena: adding pool {} ({} slots)", self.pools.len(), capacity);
        self.pools.push(Pool::with_capacity(capacity));
        Some(())
    }

    /// Pushes the slot onto the free list. The arena never inspects slot
    /// contents; releasing resources the slot referenced is the caller's
    /// responsibility, as is never freeing the same slot twice.
    pub fn free(&mut self, id: SlotId, budget: &mut Budget) {
        let head = self.free_head;
        let slot = self.get_mut(id);
        slot.data = crate::variant::VariantData::Null;
        slot.next = head;
        self.free_head = id;
        budget.refund(SLOT_COST);
    }

    /// O(1) lookup by splitting the index into (pool number, offset).
    pub fn get(&self, id: SlotId) -> &Slot {
        let index = id.0 as usize;
        &self.pools[index / POOL_CAPACITY].slots[index % POOL_CAPACITY]
    }

    pub fn get_mut(&mut self, id: SlotId) -> &mut Slot {
        let index = id.0 as usize;
        &mut self.pools[index / POOL_CAPACITY].slots[index % POOL_CAPACITY]
    }

    /// Resets every pool to empty and discards the free list. Pool storage
    /// is kept for reuse, so a subsequent parse of similar input allocates
    /// nothing new.
    pub fn clear(&mut self) {
        for pool in &mut self.pools {
            pool.usage = 0;
            for slot in pool.slots.iter_mut() {
                *slot = Slot::null();
            }
        }
        self.active = 0;
        self.free_head = SlotId::NIL;
    }

    /// Compacts the last pool's backing storage to exactly the slots in
    /// use. Called when a document is finalized and not expected to grow.
    pub fn shrink_to_fit(&mut self) {
        if let Some(pool) = self.pools.last_mut() {
            if pool.usage < pool.slots.len() {
                let mut shrunk = Vec::with_capacity(pool.usage);
                shrunk.extend_from_slice(&pool.slots[..pool.usage]);
                pool.slots = shrunk.into_boxed_slice();
            }
        }
        self.pools.shrink_to_fit();
    }

    /// Total slots across all pools (allocated storage, not live values).
    #[cfg(test)]
    pub fn total_slots(&self) -> usize {
        self.pools.iter().map(|p| p.slots.len()).sum()
    }
}
