//! Subscription tokens.
//!
//! A [`Handler`] is returned by every `subscribe` call. Its only capability is
//! removing the registration it stands for. It holds a weak reference to the
//! hub's registration list, so a token that outlives its hub is harmless.

use std::fmt;
use std::sync::Weak;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    pub(crate) fn next() -> Self {
        Self(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler#{}", self.0)
    }
}

/// Removal side of a hub, erased over the callback type.
pub(crate) trait Detach: Send + Sync {
    fn detach(&self, id: HandlerId) -> bool;
    fn contains(&self, id: HandlerId) -> bool;
}

/// Token for one registration on a hub.
///
/// Dropping a `Handler` does not unsubscribe; call [`Handler::remove`] or the
/// hub's `unsubscribe`, or convert it with [`Handler::into_guard`].
#[derive(Clone)]
pub struct Handler {
    id: HandlerId,
    bound: bool,
    hub: Weak<dyn Detach>,
}

impl Handler {
    pub(crate) fn new(id: HandlerId, bound: bool, hub: Weak<dyn Detach>) -> Self {
        Self { id, bound, hub }
    }

    /// Identifier of this registration.
    #[must_use]
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Whether this registration is bound to a target through a weak reference.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Whether the registration is still present in its hub.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.hub.upgrade().is_some_and(|hub| hub.contains(self.id))
    }

    /// Remove this registration from the hub that created it.
    ///
    /// Idempotent: removing twice, or after the hub was dropped, does nothing.
    pub fn remove(&self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.detach(self.id);
        }
    }

    /// Wrap the token so the registration is removed when the guard drops.
    #[must_use]
    pub fn into_guard(self) -> HandlerGuard {
        HandlerGuard { handler: self }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("id", &self.id)
            .field("bound", &self.bound)
            .field("hub_alive", &(self.hub.strong_count() > 0))
            .finish()
    }
}

/// Scope guard that removes its registration on drop.
#[must_use = "dropping the guard immediately unsubscribes the handler"]
#[derive(Debug)]
pub struct HandlerGuard {
    handler: Handler,
}

impl HandlerGuard {
    /// The guarded token.
    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

impl Drop for HandlerGuard {
    fn drop(&mut self) {
        self.handler.remove();
    }
}
