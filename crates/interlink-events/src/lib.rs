//! # interlink-events
//!
//! Multi-subscriber event hubs for Interlink device channels.
//!
//! Every channel object (motor controller, voltage input, digital output, ...)
//! owns one hub per event it can raise. Application code subscribes handlers to
//! a hub; the native callback adapter in `interlink-native` broadcasts payloads
//! into it when the device library reports an event.
//!
//! ## Hub variants
//!
//! | Type | Payload | Typical use |
//! |------|---------|-------------|
//! | [`SimpleEvent<S>`] | sender only | attach / detach notifications |
//! | [`Event<S, D>`] | sender and data | value changes, state changes |
//! | [`StaticEvent<D>`] | data only | process-wide events such as server discovery |
//!
//! ## Handler forms
//!
//! - **Free**: a plain closure, alive until unsubscribed.
//! - **Bound**: a closure bound to a target through a [`std::sync::Weak`]
//!   reference. Once the target is dropped the handler becomes a silent no-op,
//!   so a subscriber that forgets to unsubscribe never breaks the broadcaster.
//!   The next broadcast that meets it removes the registration.
//!
//! ## Guarantees
//!
//! - Handlers run in subscription order.
//! - A broadcast iterates a snapshot of the registration list and holds no lock
//!   while handlers run; handlers may subscribe or unsubscribe re-entrantly.
//! - Once [`Handler::remove`] (or `unsubscribe`) returns, no broadcast that
//!   starts afterwards invokes the handler. A handler removed during an
//!   in-flight broadcast is skipped if that broadcast has not reached it yet.
//! - Panics raised by handlers are not caught here. They propagate to the
//!   caller of `broadcast`; the native adapter is where they are caught and
//!   logged.
//!
//! ## Example
//!
//! ```rust
//! use interlink_events::prelude::*;
//! use std::sync::{Arc, Mutex};
//!
//! struct Encoder;
//!
//! let position_changed: Event<Encoder, i64> = Event::new("position_changed");
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let log = Arc::clone(&seen);
//! let handler = position_changed.subscribe(move |_encoder, position| {
//!     if let Ok(mut log) = log.lock() {
//!         log.push(*position);
//!     }
//! });
//!
//! position_changed.broadcast(&Encoder, &42);
//! handler.remove();
//! position_changed.broadcast(&Encoder, &7);
//!
//! assert_eq!(seen.lock().map(|log| log.clone()).unwrap_or_default(), vec![42]);
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

mod hub;

pub mod event;
pub mod handler;
pub mod simple;
pub mod static_event;

pub mod prelude;

pub use event::Event;
pub use handler::{Handler, HandlerGuard, HandlerId};
pub use simple::SimpleEvent;
pub use static_event::{EventInit, StaticEvent};
