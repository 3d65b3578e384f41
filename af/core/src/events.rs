//! Event and signal primitives.
//!
//! Events are lightweight messages identified by an integral signal. An event
//! optionally carries a payload behind an `Arc`, so posting an event to
//! several recipients shares one allocation and ownership questions reduce to
//! reference counting. Payload-free events are plain values and cost nothing
//! to clone, which makes them safe to reuse for timer expiries and
//! self-posted action signals.

use alloc::sync::Arc;
use core::any::Any;
use core::fmt;

/// Identifier for an event signal.
///
/// A signal is a small integer in a 16-bit space. The bottom of the space
/// belongs to the dispatch engine, which drives state handlers with the
/// `INIT`/`ENTRY`/`EXIT` actions and discovers the state tree with `EMPTY`
/// probes; applications lay out their own vocabulary upward from
/// [`Signal::USER`], typically as `Signal::USER.offset(n)` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signal(pub u16);

impl Signal {
    /// Initial transition of a state machine.
    pub const INIT: Signal = Signal(0);
    /// Delivered on state entry.
    pub const ENTRY: Signal = Signal(1);
    /// Delivered on state exit.
    pub const EXIT: Signal = Signal(2);
    /// Probes a state for its superstate.
    pub const EMPTY: Signal = Signal(3);

    /// First signal value available to applications.
    pub const USER: Signal = Signal(4);

    /// The signal `steps` places above this one. Lets a signal table be
    /// anchored at a base (`USER`, or a local base above the public range)
    /// and numbered relative to it.
    pub const fn offset(self, steps: u16) -> Signal {
        Signal(self.0 + steps)
    }

    /// True for the dispatch-engine signals (`INIT`, `ENTRY`, `EXIT`,
    /// `EMPTY`) that application handlers must never be sent directly.
    pub const fn is_probe(self) -> bool {
        matches!(self.0, 0..=3)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "signal {:#x}", self.0)
    }
}

/// Type-erased event payload.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Event envelope delivered to active objects.
///
/// Ownership of a posted event transfers to the recipient's queue; the `Arc`
/// payload stands in for a pool-allocated event body, with the clone given to
/// each subscriber of a published signal sharing the same allocation.
#[derive(Clone)]
pub struct Event {
    signal: Signal,
    payload: Option<Payload>,
}

impl Event {
    /// Create a static event that carries no payload.
    pub const fn new(signal: Signal) -> Self {
        Self {
            signal,
            payload: None,
        }
    }

    /// Create an event carrying `payload`.
    pub fn with_payload<T: Any + Send + Sync>(signal: Signal, payload: T) -> Self {
        Self {
            signal,
            payload: Some(Arc::new(payload)),
        }
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    /// Borrow the payload as a `T`, if the event carries one of that type.
    pub fn payload<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.payload.as_ref()?.downcast_ref::<T>()
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("signal", &self.signal)
            .field("payload", &self.payload.is_some())
            .finish()
    }
}
