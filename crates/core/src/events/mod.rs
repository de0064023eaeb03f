//! Change notifications.
//!
//! Every successful mutation publishes a [`ChangeEvent`]; live listeners
//! receive it over a broadcast channel. Events are fire-and-forget: nothing
//! is persisted and a slow listener only loses its own backlog.

mod hub;

pub use hub::{ChangeAction, ChangeEvent, EventHub, ResourceKind, EVENT_BUFFER};
