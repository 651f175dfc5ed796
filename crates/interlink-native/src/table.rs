//! Generational slot table mapping owner handles to weak owner references.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::{NativeError, NativeResult};
use crate::handle::{MAX_SLOT_INDEX, OwnerHandle, next_generation};

type ErasedOwner = Weak<dyn Any + Send + Sync>;

struct Slot {
    generation: usize,
    owner: Option<ErasedOwner>,
}

/// Result of resolving a handle.
pub enum Lookup<T> {
    /// The owner is alive and of the requested type.
    Found(Arc<T>),
    /// The handle is current but the owner has been dropped.
    Released,
    /// The owner is alive but is not a `T`.
    TypeMismatch,
    /// No owner was ever registered under this handle, or it was removed.
    Unknown,
}

impl<T> fmt::Debug for Lookup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Lookup::Found(_) => "Found",
            Lookup::Released => "Released",
            Lookup::TypeMismatch => "TypeMismatch",
            Lookup::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// Slot arena of type-erased weak owner references.
///
/// Removing an entry bumps its slot's generation, so handles issued before the
/// removal resolve to [`Lookup::Unknown`] even after the slot is reused.
/// The table is not synchronized; the runtime wraps it in a lock.
pub struct HandleTable {
    slots: Vec<Slot>,
    free: Vec<usize>,
    len: usize,
    capacity: usize,
}

impl HandleTable {
    /// Create a table holding at most `capacity` owners.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_SLOT_INDEX.saturating_add(1));
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            capacity,
        }
    }

    /// Register `owner`, keeping only a weak reference to it.
    ///
    /// # Errors
    ///
    /// Returns [`NativeError::TableFull`] when every slot is occupied.
    pub fn insert<T>(&mut self, owner: &Arc<T>) -> NativeResult<OwnerHandle>
    where
        T: Any + Send + Sync,
    {
        let weak: Weak<T> = Arc::downgrade(owner);
        let weak: ErasedOwner = weak;

        let index = match self.free.pop() {
            Some(index) => index,
            None if self.slots.len() < self.capacity => {
                self.slots.push(Slot {
                    generation: 1,
                    owner: None,
                });
                self.slots.len().saturating_sub(1)
            }
            None => return Err(NativeError::table_full(self.capacity)),
        };

        let slot = self
            .slots
            .get_mut(index)
            .ok_or_else(|| NativeError::table_full(self.capacity))?;
        slot.owner = Some(weak);
        let generation = slot.generation;
        self.len = self.len.saturating_add(1);

        OwnerHandle::new(index, generation).ok_or_else(|| NativeError::table_full(self.capacity))
    }

    /// Resolve `handle` to a strong reference of type `T`.
    #[must_use]
    pub fn get<T>(&self, handle: OwnerHandle) -> Lookup<T>
    where
        T: Any + Send + Sync,
    {
        let Some(owner) = self
            .slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.owner.as_ref())
        else {
            return Lookup::Unknown;
        };

        match owner.upgrade() {
            None => Lookup::Released,
            Some(owner) => match owner.downcast::<T>() {
                Ok(owner) => Lookup::Found(owner),
                Err(_) => Lookup::TypeMismatch,
            },
        }
    }

    /// Whether `handle` refers to a current entry (alive or not).
    #[must_use]
    pub fn contains(&self, handle: OwnerHandle) -> bool {
        self.slots
            .get(handle.index())
            .is_some_and(|slot| slot.generation == handle.generation() && slot.owner.is_some())
    }

    /// Remove the entry for `handle`. Returns `false` for stale or unknown handles.
    pub fn remove(&mut self, handle: OwnerHandle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index()) else {
            return false;
        };
        if slot.generation != handle.generation() || slot.owner.is_none() {
            return false;
        }
        Self::vacate(slot);
        self.free.push(handle.index());
        self.len = self.len.saturating_sub(1);
        true
    }

    /// Remove entries whose owners have been dropped; returns how many.
    pub fn purge_released(&mut self) -> usize {
        let mut purged = 0usize;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let released = slot
                .owner
                .as_ref()
                .is_some_and(|owner| owner.strong_count() == 0);
            if released {
                Self::vacate(slot);
                self.free.push(index);
                purged = purged.saturating_add(1);
            }
        }
        self.len = self.len.saturating_sub(purged);
        purged
    }

    /// Remove every entry, invalidating all issued handles.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.owner.is_some() {
                Self::vacate(slot);
                self.free.push(index);
            }
        }
        self.len = 0;
    }

    fn vacate(slot: &mut Slot) {
        slot.owner = None;
        slot.generation = next_generation(slot.generation);
    }

    /// Number of registered owners, including ones already dropped but not purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no owner is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of owners.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl fmt::Debug for HandleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleTable")
            .field("len", &self.len)
            .field("slots", &self.slots.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
