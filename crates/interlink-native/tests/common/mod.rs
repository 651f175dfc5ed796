//! In-process stand-in for the device library's callback registry.
//!
//! Stores `(callback, context)` pairs the way the C library does and fires
//! them from whichever thread calls `fire_*`. Contexts are kept as plain
//! addresses; the library never dereferences them.

#![allow(dead_code, reason = "shared across test binaries")]

use std::ffi::c_void;

use interlink_native::DispatchOutcome;
use parking_lot::{Mutex, const_mutex};

/// Position-change callback: `(channel, context, position)`.
pub type PositionChangeFn = extern "C" fn(*mut c_void, *mut c_void, i64);

/// Server-discovery callback: `(context, server_id)`.
pub type ServerAddedFn = extern "C" fn(*mut c_void, u32);

#[derive(Clone, Copy)]
struct Registration<F> {
    callback: F,
    context: usize,
}

/// Fake device library with per-channel position callbacks and one
/// library-wide server discovery callback.
pub struct FakeDeviceLibrary {
    position_change: Mutex<Vec<(usize, Registration<PositionChangeFn>)>>,
    server_added: Mutex<Option<Registration<ServerAddedFn>>>,
    server_added_registrations: Mutex<usize>,
}

impl FakeDeviceLibrary {
    pub const fn new() -> Self {
        Self {
            position_change: const_mutex(Vec::new()),
            server_added: const_mutex(None),
            server_added_registrations: const_mutex(0),
        }
    }

    /// Install or clear (`None`) the position callback for `channel`.
    pub fn set_on_position_change(
        &self,
        channel: usize,
        callback: Option<PositionChangeFn>,
        context: *mut c_void,
    ) {
        let mut registrations = self.position_change.lock();
        registrations.retain(|(registered, _)| *registered != channel);
        if let Some(callback) = callback {
            registrations.push((
                channel,
                Registration {
                    callback,
                    context: context.addr(),
                },
            ));
        }
    }

    /// Simulate the device reporting a new position on `channel`.
    ///
    /// Returns `false` if no callback is registered for the channel.
    pub fn fire_position_change(&self, channel: usize, position: i64) -> bool {
        let registration = self
            .position_change
            .lock()
            .iter()
            .find(|(registered, _)| *registered == channel)
            .map(|(_, registration)| *registration);

        // The lock is released before calling out, as the real library does.
        let Some(registration) = registration else {
            return false;
        };
        (registration.callback)(
            std::ptr::without_provenance_mut(channel),
            std::ptr::without_provenance_mut(registration.context),
            position,
        );
        true
    }

    pub fn set_on_server_added(&self, callback: Option<ServerAddedFn>, context: *mut c_void) {
        *self.server_added.lock() = callback.map(|callback| Registration {
            callback,
            context: context.addr(),
        });
        if callback.is_some() {
            let mut count = self.server_added_registrations.lock();
            *count = count.saturating_add(1);
        }
    }

    pub fn fire_server_added(&self, server_id: u32) -> bool {
        let registration = *self.server_added.lock();
        let Some(registration) = registration else {
            return false;
        };
        (registration.callback)(
            std::ptr::without_provenance_mut(registration.context),
            server_id,
        );
        true
    }

    /// How many times a server discovery callback was installed.
    pub fn server_added_registrations(&self) -> usize {
        *self.server_added_registrations.lock()
    }

    pub fn has_server_added_callback(&self) -> bool {
        self.server_added.lock().is_some()
    }
}

/// Outcomes reported by trampolines, keyed by channel.
pub struct OutcomeLog {
    entries: Mutex<Vec<(usize, DispatchOutcome)>>,
}

impl OutcomeLog {
    pub const fn new() -> Self {
        Self {
            entries: const_mutex(Vec::new()),
        }
    }

    pub fn record(&self, channel: usize, outcome: DispatchOutcome) {
        self.entries.lock().push((channel, outcome));
    }

    /// Most recent outcome for `channel`.
    pub fn last(&self, channel: usize) -> Option<DispatchOutcome> {
        self.entries
            .lock()
            .iter()
            .rev()
            .find(|(recorded, _)| *recorded == channel)
            .map(|(_, outcome)| *outcome)
    }
}
