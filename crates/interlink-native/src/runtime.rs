//! Process-wide native runtime: owner registry, lifecycle and finalizers.
//!
//! The device library is initialized once per process and finalized once.
//! [`Runtime`] mirrors that lifecycle: [`Runtime::global`] constructs it lazily
//! on first use, and [`Runtime::shutdown`] finalizes it for good. A finalized
//! runtime rejects new owners and drops every callback it receives.

use std::any::Any;
use std::ffi::c_void;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};

use crate::config::RuntimeConfig;
use crate::error::{NativeError, NativeResult};
use crate::handle::OwnerHandle;
use crate::table::{HandleTable, Lookup};

type Finalizer = Box<dyn FnOnce() + Send>;

static GLOBAL: OnceLock<Runtime> = OnceLock::new();

/// Lifecycle state of a [`Runtime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    /// Accepting owners and delivering callbacks.
    Running,
    /// Shut down; stays this way.
    Finalized,
}

struct Inner {
    state: RuntimeState,
    table: HandleTable,
}

/// Owner registry and lifecycle for the native callback bridge.
///
/// `Send + Sync`, so it can live in a `static`.
pub struct Runtime {
    config: RuntimeConfig,
    inner: RwLock<Inner>,
    // Finalizers are only `Send`; a mutex keeps the runtime `Sync`.
    finalizers: Mutex<Vec<(&'static str, Finalizer)>>,
}

impl Runtime {
    /// Create a standalone runtime.
    ///
    /// Most code uses [`Runtime::global`]; standalone runtimes are for
    /// embedding several device libraries or for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn new(config: RuntimeConfig) -> NativeResult<Self> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    fn from_validated(config: RuntimeConfig) -> Self {
        let table = HandleTable::with_capacity(config.max_owners);
        Self {
            config,
            inner: RwLock::new(Inner {
                state: RuntimeState::Running,
                table,
            }),
            finalizers: Mutex::new(Vec::new()),
        }
    }

    /// The process-wide runtime, constructed with default configuration on
    /// first use unless [`Runtime::init_global`] ran earlier.
    pub fn global() -> &'static Runtime {
        GLOBAL.get_or_init(|| {
            tracing::debug!("initializing global native runtime with defaults");
            Self::from_validated(RuntimeConfig::default())
        })
    }

    /// Construct the global runtime with `config`.
    ///
    /// Returns `Ok(false)` if the global runtime already existed; it is never
    /// replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn init_global(config: RuntimeConfig) -> NativeResult<bool> {
        config.validate()?;
        let mut installed = false;
        GLOBAL.get_or_init(|| {
            installed = true;
            Self::from_validated(config)
        });
        if installed {
            tracing::debug!("global native runtime initialized");
        }
        Ok(installed)
    }

    /// Register `owner` so the device library can reach it through a context value.
    ///
    /// The runtime keeps only a weak reference. The returned guard removes the
    /// entry when dropped; keep it for as long as the device library may call
    /// back with its context.
    ///
    /// # Errors
    ///
    /// Returns [`NativeError::Finalized`] after shutdown and
    /// [`NativeError::TableFull`] when the table is at capacity.
    pub fn register_owner<T>(&self, owner: &Arc<T>) -> NativeResult<OwnerRegistration<'_>>
    where
        T: Any + Send + Sync,
    {
        let handle = {
            let mut inner = self.inner.write();
            if inner.state == RuntimeState::Finalized {
                return Err(NativeError::Finalized);
            }
            inner.table.insert(owner)?
        };

        tracing::debug!(
            handle = %handle,
            owner_type = std::any::type_name::<T>(),
            "owner registered"
        );
        Ok(OwnerRegistration {
            runtime: self,
            handle,
        })
    }

    /// Remove the owner behind `handle`. Returns `false` for unknown handles.
    pub fn unregister_owner(&self, handle: OwnerHandle) -> bool {
        let removed = self.inner.write().table.remove(handle);
        if removed {
            tracing::debug!(handle = %handle, "owner unregistered");
        }
        removed
    }

    /// Resolve `handle` without dispatching.
    #[must_use]
    pub fn lookup<T>(&self, handle: OwnerHandle) -> Lookup<T>
    where
        T: Any + Send + Sync,
    {
        let inner = self.inner.read();
        if inner.state == RuntimeState::Finalized {
            return Lookup::Unknown;
        }
        inner.table.get(handle)
    }

    /// Register `finalizer` to run once during [`Runtime::shutdown`].
    ///
    /// Static event initializers use this to unregister their native callback.
    /// Finalizers run in reverse registration order.
    ///
    /// # Errors
    ///
    /// Returns [`NativeError::Finalized`] if the runtime was already shut
    /// down; `finalizer` is dropped without running.
    pub fn on_shutdown<F>(&self, name: &'static str, finalizer: F) -> NativeResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        // Holding the list across the state check orders this against the
        // take in `shutdown`.
        let mut finalizers = self.finalizers.lock();
        if self.state() == RuntimeState::Finalized {
            tracing::warn!(finalizer = name, "finalizer registered after shutdown ignored");
            return Err(NativeError::Finalized);
        }
        finalizers.push((name, Box::new(finalizer)));
        Ok(())
    }

    /// Finalize the runtime.
    ///
    /// Idempotent. Clears the owner table, so every context value handed out so
    /// far becomes stale, then runs the registered finalizers.
    pub fn shutdown(&self) {
        {
            let mut inner = self.inner.write();
            if inner.state == RuntimeState::Finalized {
                return;
            }
            inner.state = RuntimeState::Finalized;
            inner.table.clear();
        }
        let finalizers = std::mem::take(&mut *self.finalizers.lock());

        tracing::info!(finalizers = finalizers.len(), "native runtime shutting down");
        for (name, finalizer) in finalizers.into_iter().rev() {
            tracing::debug!(finalizer = name, "running finalizer");
            finalizer();
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RuntimeState {
        self.inner.read().state
    }

    /// Whether [`Runtime::shutdown`] has run.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.state() == RuntimeState::Finalized
    }

    /// Number of registered owners.
    #[must_use]
    pub fn owner_count(&self) -> usize {
        self.inner.read().table.len()
    }

    /// Remove entries whose owners were dropped without unregistering.
    pub fn purge_released(&self) -> usize {
        self.inner.write().table.purge_released()
    }

    /// Configuration this runtime was built with.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let finalizers = self.finalizers.lock().len();
        let inner = self.inner.read();
        f.debug_struct("Runtime")
            .field("state", &inner.state)
            .field("table", &inner.table)
            .field("finalizers", &finalizers)
            .field("config", &self.config)
            .finish()
    }
}

/// Registration of one owner with a [`Runtime`].
///
/// Dropping it removes the owner, after which callbacks carrying its context
/// are ignored.
#[must_use = "dropping the registration unregisters the owner immediately"]
pub struct OwnerRegistration<'rt> {
    runtime: &'rt Runtime,
    handle: OwnerHandle,
}

impl OwnerRegistration<'_> {
    /// Handle of the registered owner.
    pub fn handle(&self) -> OwnerHandle {
        self.handle
    }

    /// Context value to hand to the device library when enabling callbacks.
    pub fn context(&self) -> *mut c_void {
        self.handle.as_context()
    }

    /// Unregister now. Equivalent to dropping the registration.
    pub fn release(self) {}
}

impl Drop for OwnerRegistration<'_> {
    fn drop(&mut self) {
        self.runtime.unregister_owner(self.handle);
    }
}

impl fmt::Debug for OwnerRegistration<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerRegistration")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
