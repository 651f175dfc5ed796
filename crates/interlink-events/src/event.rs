//! Standard hub: broadcasts a sender together with a typed payload.
//!
//! The payload may be a single value or a record of several named fields,
//! which is how multi-value device events (for example a spatial sensor's
//! acceleration, angular rate and timestamp) are delivered.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::handler::Handler;
use crate::hub::{Binding, HubCore};

type Callback<S, D> = dyn Fn(&S, &D) -> bool + Send + Sync;

/// Event hub carrying `(sender, data)`.
///
/// # Example
///
/// ```rust
/// use interlink_events::Event;
/// use std::sync::{Arc, Mutex};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Reading {
///     value: i32,
///     label: String,
/// }
///
/// let changed: Event<u32, Reading> = Event::new("reading_changed");
/// let log = Arc::new(Mutex::new(Vec::new()));
///
/// let sink = Arc::clone(&log);
/// changed.subscribe(move |sender, reading| {
///     if let Ok(mut log) = sink.lock() {
///         log.push((*sender, reading.value));
///     }
/// });
///
/// changed.broadcast(&1, &Reading { value: 42, label: "x".into() });
/// assert_eq!(log.lock().map(|l| l.clone()).unwrap_or_default(), vec![(1, 42)]);
/// ```
pub struct Event<S, D> {
    core: Arc<HubCore<Callback<S, D>>>,
}

impl<S, D> Event<S, D>
where
    S: 'static,
    D: 'static,
{
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
        F: Fn(&S, &D) + Send + Sync + 'static,
    {
        self.core.attach(
            Binding::Free,
            Box::new(move |sender: &S, data: &D| {
                handler(sender, data);
                true
            }),
        )
    }

    /// Register a handler bound to `target`.
    ///
    /// The hub keeps only a weak reference to `target`. Each broadcast upgrades
    /// it and calls `handler(&target, sender, data)`; once the target has been
    /// dropped the registration is skipped silently.
    pub fn subscribe_bound<T, F>(&self, target: &Arc<T>, handler: F) -> Handler
    where
        T: Any + Send + Sync,
        F: Fn(&T, &S, &D) + Send + Sync + 'static,
    {
        let weak = Arc::downgrade(target);
        self.core.attach(
            Binding::bound_to(target),
            Box::new(move |sender: &S, data: &D| match weak.upgrade() {
                Some(target) => {
                    handler(&target, sender, data);
                    true
                }
                None => false,
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

    /// Deliver `(sender, data)` to every registered handler in subscription order.
    ///
    /// Called by the native callback adapter. A panicking handler is not
    /// caught here and aborts the rest of this broadcast.
    pub fn broadcast(&self, sender: &S, data: &D) {
        self.core.dispatch(|callback| callback(sender, data));
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

impl<S, D> fmt::Debug for Event<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Event").field(&self.core).finish()
    }
}
