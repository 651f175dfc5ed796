//! Process-wide hubs with no sender.
//!
//! Some device-library events are not tied to a channel instance: network
//! server discovery, library-wide errors, and so on. Their hubs live in a
//! `static` and the native callback for them must be registered with the
//! device library exactly once per process. [`EventInit`] carries that
//! one-time guarantee.
//!
//! ```rust
//! use interlink_events::{EventInit, StaticEvent};
//! use std::sync::LazyLock;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! static REGISTRATIONS: AtomicUsize = AtomicUsize::new(0);
//! static SERVER_ADDED_INIT: EventInit = EventInit::new();
//! static SERVER_ADDED: LazyLock<StaticEvent<String>> = LazyLock::new(|| {
//!     StaticEvent::with_initializer("server_added", &SERVER_ADDED_INIT, || {
//!         REGISTRATIONS.fetch_add(1, Ordering::SeqCst);
//!     })
//! });
//!
//! SERVER_ADDED.subscribe(|name| assert_eq!(name, "hub0"));
//! SERVER_ADDED.broadcast(&"hub0".to_string());
//! assert_eq!(REGISTRATIONS.load(Ordering::SeqCst), 1);
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::Once;

use crate::handler::Handler;
use crate::hub::{Binding, HubCore};

type Callback<D> = dyn Fn(&D) -> bool + Send + Sync;

/// One-time initializer guard shared by every construction of a static hub.
pub struct EventInit {
    once: Once,
}

impl EventInit {
    /// A guard that has not run yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { once: Once::new() }
    }

    /// Whether the initializer has completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.once.state().done()
    }

    /// Run `init` unless it already ran for this guard.
    ///
    /// Concurrent callers block until the first one finishes.
    ///
    /// # Panics
    ///
    /// Panics if a previous initializer for this guard panicked.
    pub fn run(&self, init: impl FnOnce()) {
        self.once.call_once(init);
    }
}

impl Default for EventInit {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventInit")
            .field("completed", &self.is_completed())
            .finish()
    }
}

/// Event hub carrying only a payload, associated with a module rather than
/// a channel instance.
pub struct StaticEvent<D> {
    core: Arc<HubCore<Callback<D>>>,
}

impl<D: 'static> StaticEvent<D> {
    /// Create an empty hub with no initializer.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            core: HubCore::new(name),
        }
    }

    /// Create an empty hub, running `init` first if `guard` has not run yet.
    ///
    /// # Panics
    ///
    /// Panics if a previous initializer for `guard` panicked.
    pub fn with_initializer(
        name: &'static str,
        guard: &'static EventInit,
        init: impl FnOnce(),
    ) -> Self {
        guard.run(|| {
            tracing::debug!(event = name, "running static event initializer");
            init();
        });
        Self::new(name)
    }

    /// Register a free-standing handler.
    pub fn subscribe<F>(&self, handler: F) -> Handler
    where
        F: Fn(&D) + Send + Sync + 'static,
    {
        self.core.attach(
            Binding::Free,
            Box::new(move |data: &D| {
                handler(data);
                true
            }),
        )
    }

    /// Register a handler bound to `target` through a weak reference.
    pub fn subscribe_bound<T, F>(&self, target: &Arc<T>, handler: F) -> Handler
    where
        T: Any + Send + Sync,
        F: Fn(&T, &D) + Send + Sync + 'static,
    {
        let weak = Arc::downgrade(target);
        self.core.attach(
            Binding::bound_to(target),
            Box::new(move |data: &D| {
                if let Some(target) = weak.upgrade() {
                    handler(&target, data);
                    true
                } else {
                    false
                }
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

    /// Deliver `data` to every registered handler in subscription order.
    pub fn broadcast(&self, data: &D) {
        self.core.dispatch(|callback| callback(data));
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

impl<D> fmt::Debug for StaticEvent<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StaticEvent").field(&self.core).finish()
    }
}
