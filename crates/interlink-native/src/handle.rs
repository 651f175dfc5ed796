//! Opaque owner handles and their context-pointer encoding.
//!
//! The device library hands back whatever `void *` it was given when the
//! callback was registered. Instead of a retained pointer to the owner, that
//! value carries an [`OwnerHandle`]: a slot index in the low half of a `usize`
//! and a generation counter in the high half. The pointer is never
//! dereferenced; it only transports the bits.
//!
//! # Generation width
//!
//! A slot's generation changes every time the slot is reused, so a stale
//! context is recognised until the same slot has been reused
//! [`MAX_GENERATION`] times. That is about four billion reuses on 64-bit
//! targets but only 65 535 on 32-bit targets. On a 32-bit target a device
//! library that holds a context across 65 535 register and release cycles of
//! the same slot can reach the owner now living there. Unregister native
//! callbacks before releasing their owner to rule this out.

use std::ffi::c_void;
use std::fmt;
use std::num::NonZeroUsize;

/// Number of bits used for the slot index.
pub const SLOT_BITS: u32 = usize::BITS / 2;

const SLOT_MASK: usize = (1 << SLOT_BITS) - 1;

/// Largest slot index representable in a handle.
pub const MAX_SLOT_INDEX: usize = SLOT_MASK;

/// Largest generation before it wraps back to 1.
///
/// `u32::MAX` on 64-bit targets and `u16::MAX` on 32-bit targets.
pub const MAX_GENERATION: usize = usize::MAX >> SLOT_BITS;

/// Stable identifier of one registered owner.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerHandle(NonZeroUsize);

impl OwnerHandle {
    /// Compose a handle. `None` if `index` is out of range or `generation` is
    /// zero or out of range.
    #[must_use]
    pub fn new(index: usize, generation: usize) -> Option<Self> {
        if index > MAX_SLOT_INDEX || generation == 0 || generation > MAX_GENERATION {
            return None;
        }
        NonZeroUsize::new((generation << SLOT_BITS) | index).map(Self)
    }

    /// Slot index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0.get() & SLOT_MASK
    }

    /// Generation of the slot when the handle was issued.
    #[must_use]
    pub fn generation(self) -> usize {
        self.0.get() >> SLOT_BITS
    }

    /// Raw bits.
    #[must_use]
    pub fn to_raw(self) -> usize {
        self.0.get()
    }

    /// Rebuild from raw bits. Zero and zero-generation values are rejected.
    #[must_use]
    pub fn from_raw(raw: usize) -> Option<Self> {
        let handle = NonZeroUsize::new(raw).map(Self)?;
        (handle.generation() != 0).then_some(handle)
    }

    /// Encode as the context pointer handed to the device library.
    #[must_use]
    pub fn as_context(self) -> *mut c_void {
        std::ptr::without_provenance_mut(self.to_raw())
    }

    /// Decode a context pointer received from the device library.
    #[must_use]
    pub fn from_context(context: *const c_void) -> Option<Self> {
        Self::from_raw(context.addr())
    }
}

/// Generation following `generation`, skipping zero on wrap-around.
pub(crate) fn next_generation(generation: usize) -> usize {
    if generation >= MAX_GENERATION {
        1
    } else {
        generation.saturating_add(1)
    }
}

impl fmt::Debug for OwnerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerHandle")
            .field("index", &self.index())
            .field("generation", &self.generation())
            .finish()
    }
}

impl fmt::Display for OwnerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}
