//! Callback adapter: turns a context value from the device library back into
//! an owner and runs the typed event dispatch for it.
//!
//! An `extern "C"` trampoline registered with the device library forwards its
//! `void *` context here together with a closure that marshals the native
//! payload and broadcasts it on the owner's hub:
//!
//! ```rust
//! use std::ffi::c_void;
//! use interlink_native::prelude::*;
//!
//! struct VoltageInput {
//!     voltage_changed: Event<VoltageInput, f64>,
//! }
//!
//! extern "C" fn on_voltage_change(_handle: *mut c_void, context: *mut c_void, voltage: f64) {
//!     dispatch_global::<VoltageInput, _>(context, |input| {
//!         input.voltage_changed.broadcast(input, &voltage);
//!     });
//! }
//! # let _ = on_voltage_change;
//! ```

use std::any::{Any, type_name};
use std::ffi::c_void;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::handle::OwnerHandle;
use crate::runtime::Runtime;
use crate::table::Lookup;

/// What happened to one callback from the device library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchOutcome {
    /// The owner was found and the dispatch closure ran to completion.
    Delivered,
    /// Null, unknown, or stale context value.
    InvalidContext,
    /// The owner is registered but has already been dropped.
    OwnerReleased,
    /// The owner is alive but is not of the type the trampoline expects.
    TypeMismatch,
    /// The runtime has been shut down.
    RuntimeFinalized,
    /// The dispatch closure panicked; the panic was caught and logged.
    HandlerPanicked,
}

impl DispatchOutcome {
    /// Whether the dispatch closure ran to completion.
    #[must_use]
    pub fn is_delivered(self) -> bool {
        self == Self::Delivered
    }

    /// Stable name for logs and metrics labels.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::InvalidContext => "invalid_context",
            Self::OwnerReleased => "owner_released",
            Self::TypeMismatch => "type_mismatch",
            Self::RuntimeFinalized => "runtime_finalized",
            Self::HandlerPanicked => "handler_panicked",
        }
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Runtime {
    /// Resolve `context` to an owner of type `T` and call `f` with it.
    ///
    /// No runtime lock is held while `f` runs, so `f` may register owners or
    /// dispatch again. The owner is kept alive for the duration of the call.
    ///
    /// With [`catch_panics`](crate::RuntimeConfig::catch_panics) set, a panic
    /// in `f` is caught, logged and reported as
    /// [`DispatchOutcome::HandlerPanicked`]; otherwise it propagates.
    pub fn dispatch<T, F>(&self, context: *const c_void, f: F) -> DispatchOutcome
    where
        T: Any + Send + Sync,
        F: FnOnce(&T),
    {
        if self.is_finalized() {
            tracing::trace!(context = ?context, "dispatch after shutdown dropped");
            return DispatchOutcome::RuntimeFinalized;
        }

        let Some(handle) = OwnerHandle::from_context(context) else {
            self.report_stale(context, DispatchOutcome::InvalidContext);
            return DispatchOutcome::InvalidContext;
        };

        let owner = match self.lookup::<T>(handle) {
            Lookup::Found(owner) => owner,
            Lookup::Released => {
                tracing::debug!(handle = %handle, "dispatch to released owner skipped");
                return DispatchOutcome::OwnerReleased;
            }
            Lookup::TypeMismatch => {
                tracing::warn!(
                    handle = %handle,
                    expected = type_name::<T>(),
                    "dispatch with owner of unexpected type"
                );
                return DispatchOutcome::TypeMismatch;
            }
            // Shutdown may have cleared the table since the check above.
            Lookup::Unknown if self.is_finalized() => return DispatchOutcome::RuntimeFinalized,
            Lookup::Unknown => {
                self.report_stale(context, DispatchOutcome::InvalidContext);
                return DispatchOutcome::InvalidContext;
            }
        };

        if !self.config().catch_panics {
            f(&owner);
            return DispatchOutcome::Delivered;
        }

        match panic::catch_unwind(AssertUnwindSafe(|| f(&owner))) {
            Ok(()) => {
                tracing::trace!(handle = %handle, "callback delivered");
                DispatchOutcome::Delivered
            }
            Err(payload) => {
                tracing::error!(
                    handle = %handle,
                    owner_type = type_name::<T>(),
                    panic = panic_message(payload.as_ref()),
                    "event handler panicked inside native callback"
                );
                DispatchOutcome::HandlerPanicked
            }
        }
    }

    fn report_stale(&self, context: *const c_void, outcome: DispatchOutcome) {
        if self.config().log_stale_dispatch {
            tracing::warn!(
                context = ?context,
                outcome = %outcome,
                "native callback with unknown or stale context"
            );
        }
    }
}

/// Dispatch through [`Runtime::global`].
///
/// This is what `extern "C"` trampolines call.
pub fn dispatch_global<T, F>(context: *const c_void, f: F) -> DispatchOutcome
where
    T: Any + Send + Sync,
    F: FnOnce(&T),
{
    Runtime::global().dispatch(context, f)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
