//! Registration list shared by every hub variant.
//!
//! The list is copy-on-write: subscribe and unsubscribe replace the vector
//! under a write lock, broadcast clones the outer `Arc` under a read lock and
//! iterates it without holding any lock.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::handler::{Detach, Handler, HandlerId};

/// How a registration relates to its subscriber.
pub(crate) enum Binding {
    Free,
    Bound(Weak<dyn Any + Send + Sync>),
}

impl Binding {
    pub(crate) fn bound_to<T: Any + Send + Sync>(target: &Arc<T>) -> Self {
        let weak: Weak<T> = Arc::downgrade(target);
        let weak: Weak<dyn Any + Send + Sync> = weak;
        Binding::Bound(weak)
    }

    fn is_released(&self) -> bool {
        match self {
            Binding::Free => false,
            Binding::Bound(target) => target.strong_count() == 0,
        }
    }
}

/// One registration. `callback` returns `false` when a bound target is gone.
pub(crate) struct Entry<F: ?Sized> {
    id: HandlerId,
    active: AtomicBool,
    binding: Binding,
    callback: Box<F>,
}

impl<F: ?Sized> Entry<F> {
    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

type Registrations<F> = Arc<Vec<Arc<Entry<F>>>>;

pub(crate) struct HubCore<F: ?Sized> {
    name: &'static str,
    entries: RwLock<Registrations<F>>,
}

impl<F> HubCore<F>
where
    F: ?Sized + Send + Sync + 'static,
{
    pub(crate) fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            entries: RwLock::new(Arc::new(Vec::new())),
        })
    }

    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn attach(self: &Arc<Self>, binding: Binding, callback: Box<F>) -> Handler {
        let id = HandlerId::next();
        let bound = matches!(binding, Binding::Bound(_));
        let entry = Arc::new(Entry {
            id,
            active: AtomicBool::new(true),
            binding,
            callback,
        });

        let count = {
            let mut entries = self.entries.write();
            let list = Arc::make_mut(&mut *entries);
            list.push(entry);
            list.len()
        };

        tracing::debug!(
            event = self.name,
            handler_id = id.get(),
            bound,
            count,
            "handler subscribed"
        );

        let weak_self: Weak<Self> = Arc::downgrade(self);
        let hub: Weak<dyn Detach> = weak_self;
        Handler::new(id, bound, hub)
    }

    pub(crate) fn remove(&self, id: HandlerId) -> bool {
        let removed = {
            let mut entries = self.entries.write();
            match entries.iter().position(|entry| entry.id == id) {
                Some(index) => {
                    let list = Arc::make_mut(&mut *entries);
                    let entry = list.remove(index);
                    entry.deactivate();
                    true
                }
                None => false,
            }
        };

        if removed {
            tracing::debug!(event = self.name, handler_id = id.get(), "handler unsubscribed");
        }
        removed
    }

    pub(crate) fn clear(&self) {
        let previous = {
            let mut entries = self.entries.write();
            std::mem::replace(&mut *entries, Arc::new(Vec::new()))
        };
        for entry in previous.iter() {
            entry.deactivate();
        }
        tracing::debug!(event = self.name, removed = previous.len(), "all handlers unsubscribed");
    }

    /// Drop bound registrations whose targets no longer exist.
    pub(crate) fn purge_released(&self) -> usize {
        let mut entries = self.entries.write();
        if !entries.iter().any(|entry| entry.binding.is_released()) {
            return 0;
        }

        let list = Arc::make_mut(&mut *entries);
        let before = list.len();
        list.retain(|entry| {
            let released = entry.binding.is_released();
            if released {
                entry.deactivate();
            }
            !released
        });
        let purged = before.saturating_sub(list.len());
        drop(entries);

        tracing::debug!(event = self.name, purged, "purged handlers with released targets");
        purged
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub(crate) fn has(&self, id: HandlerId) -> bool {
        self.entries.read().iter().any(|entry| entry.id == id)
    }

    /// Invoke every active registration of the current snapshot, in order.
    pub(crate) fn dispatch(&self, mut invoke: impl FnMut(&F) -> bool) {
        let snapshot = Arc::clone(&*self.entries.read());
        tracing::trace!(event = self.name, handlers = snapshot.len(), "broadcast");

        let mut released = 0usize;
        for entry in snapshot.iter() {
            if !entry.is_active() {
                continue;
            }
            if !invoke(&*entry.callback) {
                released = released.saturating_add(1);
            }
        }

        // Entries whose targets are gone are dropped here so that transient
        // subscribers do not accumulate.
        if released > 0 {
            tracing::trace!(
                event = self.name,
                released,
                "skipped handlers with released targets"
            );
            self.purge_released();
        }
    }
}

impl<F> Detach for HubCore<F>
where
    F: ?Sized + Send + Sync + 'static,
{
    fn detach(&self, id: HandlerId) -> bool {
        self.remove(id)
    }

    fn contains(&self, id: HandlerId) -> bool {
        self.has(id)
    }
}

impl<F: ?Sized> fmt::Debug for HubCore<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubCore")
            .field("name", &self.name)
            .field("handlers", &self.entries.read().len())
            .finish()
    }
}
