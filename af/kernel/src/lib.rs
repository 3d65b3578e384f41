#![cfg_attr(not(feature = "std"), no_std)]

//! # af-kernel
//!
//! Cooperative active-object kernel. Active objects own a bounded event queue
//! and a behavior (usually a hierarchical state machine from `af-hsm`); the
//! kernel delivers one event at a time to the highest-priority object with
//! work pending, running each handler to completion. There are no blocking
//! calls anywhere: waiting is modeled as a state with an armed time event.
//!
//! Delivery guarantees: events from one sender to one recipient arrive in
//! FIFO order, and a self-posted event lands behind everything already
//! pending for that object. Deferred events are recalled to the *front* of
//! the owner's queue, which preserves FIFO order across a defer/recall cycle.

extern crate alloc;

pub mod active;
pub mod kernel;
mod sync;
pub mod time;
pub mod timings;

pub use active::{
    defer, recall, ActiveBehavior, ActiveObject, ActiveObjectRef, ActiveRunnable, AoPort,
    Behavior, HsmActive, DEFAULT_QUEUE_CAPACITY,
};
pub use kernel::{Kernel, KernelBuilder, KernelError};
pub use time::{TickClock, TimeEvent, TimeEventError, TimerWheel};
pub use timings::{AoTimings, Phase, TimingSnapshot};

#[cfg(test)]
mod tests;
