//! # interlink-native
//!
//! Bridge between the device library's C callbacks and Interlink event hubs.
//!
//! The device library reports events by calling a registered `extern "C"`
//! function with an opaque `void *` context. This crate makes that context
//! safe to hand out:
//!
//! - Owners (channel objects) are registered with a [`Runtime`], which keeps
//!   only a weak reference and hands back an [`OwnerRegistration`].
//! - The registration's [`context`](OwnerRegistration::context) encodes an
//!   [`OwnerHandle`] (slot index plus generation), never a pointer to the
//!   owner. A late callback for a dropped or unregistered owner resolves to
//!   nothing instead of a dangling object.
//! - Trampolines call [`dispatch_global`], which resolves the owner, runs the
//!   typed broadcast and catches handler panics before they reach the foreign
//!   frame.
//!
//! The process-wide [`Runtime::global`] is created lazily and finalized once by
//! [`Runtime::shutdown`]. Static hubs register their native unregistration with
//! [`Runtime::on_shutdown`].
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use interlink_native::prelude::*;
//!
//! struct DigitalInput {
//!     state_changed: Event<DigitalInput, bool>,
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let runtime = Runtime::new(RuntimeConfig::default())?;
//! let input = Arc::new(DigitalInput { state_changed: Event::new("state_changed") });
//!
//! let edges = Arc::new(AtomicU32::new(0));
//! let counter = Arc::clone(&edges);
//! input.state_changed.subscribe(move |_input, state| {
//!     if *state {
//!         counter.fetch_add(1, Ordering::Relaxed);
//!     }
//! });
//!
//! let registration = runtime.register_owner(&input)?;
//! let context = registration.context();
//!
//! // What the native trampoline does when the device reports a rising edge.
//! let outcome = runtime.dispatch::<DigitalInput, _>(context, |input| {
//!     input.state_changed.broadcast(input, &true);
//! });
//! assert_eq!(outcome, DispatchOutcome::Delivered);
//! assert_eq!(edges.load(Ordering::Relaxed), 1);
//!
//! // After disabling events the same context is ignored.
//! registration.release();
//! let outcome = runtime.dispatch::<DigitalInput, _>(context, |_| {});
//! assert_eq!(outcome, DispatchOutcome::InvalidContext);
//! # Ok(())
//! # }
//! ```

#![deny(
    unsafe_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod adapter;
pub mod config;
pub mod error;
pub mod handle;
pub mod runtime;
pub mod table;

pub mod prelude;

pub use interlink_events as events;

pub use adapter::{DispatchOutcome, dispatch_global};
pub use config::{RuntimeConfig, RuntimeConfigBuilder};
pub use error::{NativeError, NativeResult};
pub use handle::OwnerHandle;
pub use runtime::{OwnerRegistration, Runtime, RuntimeState};
pub use table::{HandleTable, Lookup};
