/// Fixed-capacity slot table with generational handles
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use log::warn;

/// Largest supported table capacity.
///
/// Raw slot indices 253, 254 and 255 are reserved ("unused", "freed" and
/// "error") by the 8-bit handle encoding the hardware-facing side uses.
pub const MAX_SLOTS: usize = 253;

/// Typed reference to a slot. Carries the slot's generation so that a handle
/// kept across a free is rejected instead of aliasing whatever reuses the slot.
pub struct Handle<T> {
    index: u8,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: u8, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    pub fn index(self) -> u8 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}#{})", self.index, self.generation)
    }
}

impl<T> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

pub struct SlotTable<T> {
    slots: Vec<Slot<T>>,
    len: usize,
}

impl<T> SlotTable<T> {
    /// Capacities above [`MAX_SLOTS`] are clamped with a warning.
    pub fn new(capacity: usize) -> Self {
        if capacity > MAX_SLOTS {
            warn!(
                "Requested {} slots; clamping to the {} an 8-bit handle can address.",
                capacity, MAX_SLOTS
            );
        }
        let capacity = capacity.min(MAX_SLOTS);
        let slots = (0..capacity)
            .map(|_| Slot {
                generation: 0,
                value: None,
            })
            .collect();
        Self { slots, len: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len >= self.slots.len()
    }

    /// Store `value` in the first unoccupied slot. Hands the value back when
    /// the table is full.
    pub fn insert(&mut self, value: T) -> Result<Handle<T>, T> {
        let Some(index) = self.slots.iter().position(|slot| slot.value.is_none()) else {
            return Err(value);
        };

        let slot = &mut self.slots[index];
        slot.value = Some(value);
        self.len += 1;

        Ok(Handle::new(index as u8, slot.generation))
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }

        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.len -= 1;
        Some(value)
    }

    /// Empty every slot. Outstanding handles become stale.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        self.len = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|value| (Handle::new(index as u8, slot.generation), value))
        })
    }
}
