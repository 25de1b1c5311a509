//! Domain events.
//!
//! Aggregates in this workspace decide by emitting events; the application
//! layer logs and applies them.

pub mod event;

pub use event::Event;
