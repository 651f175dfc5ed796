//! Prelude for interlink-events.
//!
//! ```rust
//! use interlink_events::prelude::*;
//!
//! let attached: SimpleEvent<&'static str> = SimpleEvent::new("attach");
//! let handler = attached.subscribe(|serial| assert_eq!(*serial, "MC-1"));
//! attached.broadcast(&"MC-1");
//! handler.remove();
//! ```

pub use crate::event::Event;
pub use crate::handler::{Handler, HandlerGuard, HandlerId};
pub use crate::simple::SimpleEvent;
pub use crate::static_event::{EventInit, StaticEvent};
