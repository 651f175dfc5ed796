//! Notification-only hub: broadcasts the sender and nothing else.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::handler::Handler;
use crate::hub::{Binding, HubCore};

type Callback<S> = dyn Fn(&S) -> bool + Send + Sync;

/// Event hub carrying only the sender, used for attach, detach and similar
/// notifications.
pub struct SimpleEvent<S> {
    core: Arc<HubCore<Callback<S>>>,
}

impl<S: 'static> SimpleEvent<S> {
    /// Create an empty hub. `name` identifies the event in logs.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            core: HubCore::new(name),
        }
    }

    /// Register a free-standing handler.
    pub fn subscribe<F>(&self, handler: F) -> Handler
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.core.attach(
            Binding::Free,
            Box::new(move |sender: &S| {
                handler(sender);
                true
            }),
        )
    }

    /// Register a handler bound to `target` through a weak reference.
    pub fn subscribe_bound<T, F>(&self, target: &Arc<T>, handler: F) -> Handler
    where
        T: Any + Send + Sync,
        F: Fn(&T, &S) + Send + Sync + 'static,
    {
        let weak = Arc::downgrade(target);
        self.core.attach(
            Binding::bound_to(target),
            Box::new(move |sender: &S| {
                let Some(target) = weak.upgrade() else {
                    return false;
                };
                handler(&target, sender);
                true
            }),
        )
    }

    /// Remove the registration behind `handler`. Unknown tokens are ignored.
    pub fn unsubscribe(&self, handler: &Handler) {
        self.core.remove(handler.id());
    }

    /// Remove every registration.
    pub fn unsubscribe_all(&self) {
        self.core.clear();
    }

    /// Notify every registered handler in subscription order.
    pub fn broadcast(&self, sender: &S) {
        self.core.dispatch(|callback| callback(sender));
    }

    /// Remove bound registrations whose targets were dropped.
    ///
    /// Broadcast already drops them as it meets them; this clears them
    /// without waiting for the next broadcast.
    pub fn purge_released(&self) -> usize {
        self.core.purge_released()
    }

    /// Whether `handler` is currently registered on this hub.
    #[must_use]
    pub fn contains(&self, handler: &Handler) -> bool {
        self.core.has(handler.id())
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.core.len()
    }

    /// True when nothing is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Event name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.core.name()
    }
}

impl<S> fmt::Debug for SimpleEvent<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SimpleEvent").field(&self.core).finish()
    }
}
