#![no_std]
#![forbid(unsafe_code)]

//! # af-hsm
//!
//! Hierarchical state machine engine implementing UML statechart semantics:
//! entry and exit actions, state nesting with event bubbling, and transitions
//! that exit up to the least common ancestor of source and target before
//! entering down to the target.
//!
//! States are plain functions over a concrete context type `C` (the active
//! object's data). A handler reports how it treated an event through
//! [`StateReturn`]; returning `Super` delegates to the parent state, which is
//! also how the engine discovers the state tree (via [`Signal::EMPTY`]
//! probes).

use af_core::{Event, Signal};
use thiserror::Error;

#[cfg(test)]
extern crate std;

mod transition;


/// Maximum nesting depth for hierarchical states.
pub const MAX_STATE_DEPTH: usize = 8;

/// State handler function over the context type `C`.
pub type StateHandler<C> = fn(&mut C, &Event) -> StateReturn<C>;

/// Outcome of dispatching an event to a state handler.
pub enum StateReturn<C> {
    /// Event was consumed in this state.
    Handled,
    /// Event was recognized but deliberately not consumed; dispatch stops.
    Unhandled,
    /// Delegate the event to the parent state.
    Super(StateHandler<C>),
    /// Transition to a new state.
    Transition(StateHandler<C>),
    /// Initial transition into a substate (valid from `INIT` only).
    Initial(StateHandler<C>),
}

// fn pointers are Copy for any C; a derive would demand C: Copy.
impl<C> Clone for StateReturn<C> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<C> Copy for StateReturn<C> {}

/// Errors surfaced by the dispatch engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HsmError {
    #[error("initial pseudo-state did not produce a transition")]
    MissingInitialTransition,
    #[error("initial transition outside of state machine init")]
    InvalidTransition,
    #[error("state nesting exceeds MAX_STATE_DEPTH")]
    DepthExceeded,
}

/// The root of every state tree. Silently ignores whatever reaches it.
pub fn top<C>(_ctx: &mut C, _event: &Event) -> StateReturn<C> {
    StateReturn::Unhandled
}

/// Compare two state handlers for identity.
pub fn same_state<C>(a: StateHandler<C>, b: StateHandler<C>) -> bool {
    a as usize == b as usize
}

/// Hierarchical state machine over the context type `C`.
///
/// The machine stores only the current leaf handler; parent relationships are
/// discovered on demand by probing handlers with [`Signal::EMPTY`].
pub struct Hsm<C> {
    state: StateHandler<C>,
}

impl<C> Hsm<C> {
    /// Create a state machine whose first dispatchable state is produced by
    /// `initial`, the initial pseudo-state handler.
    pub const fn new(initial: StateHandler<C>) -> Self {
        Self { state: initial }
    }

    /// Current leaf state.
    pub fn state(&self) -> StateHandler<C> {
        self.state
    }

    /// True when `handler` is the current leaf or one of its ancestors.
    pub fn is_in(&self, ctx: &mut C, handler: StateHandler<C>) -> bool {
        let (path, depth) = self.state_path(ctx, self.state);
        path[..depth].iter().any(|&s| same_state(s, handler))
    }

    /// Run the initial pseudo-state and enter the target state.
    ///
    /// The pseudo-state handler receives [`Signal::INIT`]; it performs one
    /// time setup (subscriptions, status defaults) and must return the first
    /// real state via `Transition` (or `Initial`). Entry actions run from the
    /// outermost ancestor down to the target, then any nested initial
    /// transitions are taken.
    pub fn init(&mut self, ctx: &mut C) -> Result<(), HsmError> {
        let evt = Event::new(Signal::INIT);
        match (self.state)(ctx, &evt) {
            StateReturn::Transition(target) | StateReturn::Initial(target) => {
                self.enter_from_root(ctx, target);
                self.state = target;
                self.drill_initial(ctx);
                Ok(())
            }
            _ => Err(HsmError::MissingInitialTransition),
        }
    }

    /// Dispatch one event, bubbling from the current leaf toward the root
    /// until a handler consumes it or requests a transition.
    pub fn dispatch(&mut self, ctx: &mut C, event: &Event) -> Result<(), HsmError> {
        let mut s = self.state;
        loop {
            match (s)(ctx, event) {
                StateReturn::Handled | StateReturn::Unhandled => return Ok(()),
                StateReturn::Super(parent) => s = parent,
                StateReturn::Transition(target) => {
                    self.transition(ctx, s, target);
                    return Ok(());
                }
                StateReturn::Initial(_) => return Err(HsmError::InvalidTransition),
            }
        }
    }
}
