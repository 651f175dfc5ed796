//! Runtime configuration.

use serde::{Deserialize, Serialize};

use crate::error::{NativeError, NativeResult};
use crate::handle::MAX_SLOT_INDEX;

/// Configuration for a [`Runtime`](crate::Runtime).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum number of owners registered at once.
    pub max_owners: usize,
    /// Catch and log handler panics at the callback boundary instead of
    /// letting them unwind into the device library's thread.
    pub catch_panics: bool,
    /// Warn when the device library calls back with an unknown or stale context.
    pub log_stale_dispatch: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_owners: 4096,
            catch_panics: true,
            log_stale_dispatch: true,
        }
    }
}

impl RuntimeConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_owners` is zero or exceeds what a handle can address.
    pub fn validate(&self) -> NativeResult<()> {
        if self.max_owners == 0 {
            return Err(NativeError::invalid_configuration(
                "max_owners must be greater than 0",
            ));
        }
        if self.max_owners > MAX_SLOT_INDEX {
            return Err(NativeError::invalid_configuration(format!(
                "max_owners must not exceed {MAX_SLOT_INDEX}"
            )));
        }
        Ok(())
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> RuntimeConfigBuilder {
        RuntimeConfigBuilder::default()
    }
}

/// Builder for `RuntimeConfig`.
#[derive(Debug, Default)]
pub struct RuntimeConfigBuilder {
    config: RuntimeConfig,
}

impl RuntimeConfigBuilder {
    /// Set the owner table capacity.
    #[must_use]
    pub fn max_owners(mut self, max_owners: usize) -> Self {
        self.config.max_owners = max_owners;
        self
    }

    /// Set whether handler panics are caught at the callback boundary.
    #[must_use]
    pub fn catch_panics(mut self, catch: bool) -> Self {
        self.config.catch_panics = catch;
        self
    }

    /// Set whether stale-context dispatches are logged.
    #[must_use]
    pub fn log_stale_dispatch(mut self, log: bool) -> Self {
        self.config.log_stale_dispatch = log;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> NativeResult<RuntimeConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
