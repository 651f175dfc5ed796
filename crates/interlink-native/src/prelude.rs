//! Prelude for interlink-native.
//!
//! Brings the runtime, dispatch entry points and the event hub types into
//! scope, which is everything a channel binding usually needs.

pub use crate::adapter::{DispatchOutcome, dispatch_global};
pub use crate::config::RuntimeConfig;
pub use crate::error::{NativeError, NativeResult};
pub use crate::handle::OwnerHandle;
pub use crate::runtime::{OwnerRegistration, Runtime};

pub use interlink_events::prelude::*;
