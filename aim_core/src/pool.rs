//! Fixed-capacity object pools.
//!
//! A pool pre-warms every slot at construction and never grows. Slots are
//! addressed by a [`SlotHandle`] carrying the slot index plus a generation
//! counter, so a handle kept past its release cannot touch the slot's next
//! occupant.

use crate::error::PoolError;

/// Something a pool can hold and wipe back to its resting state.
pub trait Poolable: Default {
    /// Clear all fields to defaults before the slot is reused
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Index + generation reference to a pool slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SlotHandle {
    index: u32,
    generation: u32,
}

impl SlotHandle {
    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// A reusable instance plus its in-use flag
#[derive(Debug, Clone)]
pub struct PoolSlot<T> {
    item: T,
    in_use: bool,
    generation: u32,
}

impl<T> PoolSlot<T> {
    pub fn item(&self) -> &T {
        &self.item
    }

    pub fn in_use(&self) -> bool {
        self.in_use
    }
}

#[derive(Debug, Clone)]
pub struct Pool<T> {
    name: &'static str,
    slots: Vec<PoolSlot<T>>,
    free: Vec<u32>, // Stack of free slot indices
}

impl<T: Poolable> Pool<T> {
    /// Pre-warm `capacity` slots
    pub fn with_capacity(name: &'static str, capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| PoolSlot {
                item: T::default(),
                in_use: false,
                generation: 0,
            })
            .collect();
        // Reversed so the lowest index is handed out first
        let free = (0..capacity as u32).rev().collect();
        Self { name, slots, free }
    }

    /// Take a free slot. Never allocates.
    pub fn acquire(&mut self) -> Result<SlotHandle, PoolError> {
        let index = self.free.pop().ok_or(PoolError::Exhausted {
            pool: self.name,
            capacity: self.slots.len(),
        })?;
        let slot = &mut self.slots[index as usize];
        debug_assert!(!slot.in_use, "free list held an in-use slot");
        slot.in_use = true;
        Ok(SlotHandle {
            index,
            generation: slot.generation,
        })
    }

    /// Return a slot to the pool.
    ///
    /// Idempotent: releasing a stale or already-free handle does nothing and
    /// returns false.
    pub fn release(&mut self, handle: SlotHandle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index()) else {
            return false;
        };
        if !slot.in_use || slot.generation != handle.generation {
            return false;
        }
        slot.item.reset();
        slot.in_use = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        true
    }

    /// Release every slot still in use
    pub fn release_all(&mut self) -> usize {
        let mut released = 0;
        for index in 0..self.slots.len() {
            if let Some(handle) = self.handle_at(index) {
                if self.release(handle) {
                    released += 1;
                }
            }
        }
        released
    }
}

impl<T> Pool<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn in_use_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn get(&self, handle: SlotHandle) -> Option<&T> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.in_use && slot.generation == handle.generation)
            .map(|slot| &slot.item)
    }

    pub fn get_mut(&mut self, handle: SlotHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.in_use && slot.generation == handle.generation)
            .map(|slot| &mut slot.item)
    }

    /// Current handle of an occupied slot
    pub fn handle_at(&self, index: usize) -> Option<SlotHandle> {
        self.slots
            .get(index)
            .filter(|slot| slot.in_use)
            .map(|slot| SlotHandle {
                index: index as u32,
                generation: slot.generation,
            })
    }

    pub fn slots(&self) -> &[PoolSlot<T>] {
        &self.slots
    }

    /// Occupied slots in index order
    pub fn iter(&self) -> impl Iterator<Item = (SlotHandle, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.in_use)
            .map(|(index, slot)| {
                (
                    SlotHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    &slot.item,
                )
            })
    }

    /// Occupied slots in index order, mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SlotHandle, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, slot)| slot.in_use)
            .map(|(index, slot)| {
                (
                    SlotHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    &mut slot.item,
                )
            })
    }
}
