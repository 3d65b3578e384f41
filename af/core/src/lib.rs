#![no_std]
#![forbid(unsafe_code)]

//! # af-core
//!
//! Core types, traits, and abstractions for the active-object framework.
//! This crate provides the foundation for building event-driven, hierarchical
//! state machine applications: signals, events with type-erased payloads,
//! reply correlation headers, and tick conversions.

extern crate alloc;

use core::fmt;

pub mod events;
pub mod replyable;
pub mod time;

pub use events::{Event, Signal};
pub use replyable::{ReplyableRequest, ReplyableResponse};
pub use time::{ms_to_ticks, TICK_HZ};

#[cfg(test)]
mod tests;

/// Framework version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Unique identifier for an active object.
///
/// Identities are plain numbers rather than references: a stored id is a weak
/// handle resolved at post time, so a vanished recipient is a delivery error
/// for the sender to log, never a dangling pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveObjectId(pub u8);

impl ActiveObjectId {
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ActiveObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AO({})", self.0)
    }
}
