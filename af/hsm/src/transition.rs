//! Transition execution: exit up to the least common ancestor, enter down to
//! the target, then take any nested initial transitions.

use af_core::{Event, Signal};

use crate::{same_state, top, Hsm, StateHandler, StateReturn, MAX_STATE_DEPTH};

impl<C> Hsm<C> {
    /// Ask a state for its superstate with an `EMPTY` probe.
    fn parent_of(ctx: &mut C, state: StateHandler<C>) -> Option<StateHandler<C>> {
        let probe = Event::new(Signal::EMPTY);
        match (state)(ctx, &probe) {
            StateReturn::Super(parent) => Some(parent),
            _ => None,
        }
    }

    /// Path from `state` up to the root, `state` first.
    pub(crate) fn state_path(
        &self,
        ctx: &mut C,
        state: StateHandler<C>,
    ) -> ([StateHandler<C>; MAX_STATE_DEPTH], usize) {
        let mut path = [state; MAX_STATE_DEPTH];
        let mut depth = 1;
        let mut s = state;
        while depth < MAX_STATE_DEPTH {
            match Self::parent_of(ctx, s) {
                Some(parent) => {
                    path[depth] = parent;
                    depth += 1;
                    s = parent;
                }
                None => break,
            }
        }
        (path, depth)
    }

    fn send_entry(ctx: &mut C, state: StateHandler<C>) {
        let evt = Event::new(Signal::ENTRY);
        let _ = (state)(ctx, &evt);
    }

    fn send_exit(ctx: &mut C, state: StateHandler<C>) {
        let evt = Event::new(Signal::EXIT);
        let _ = (state)(ctx, &evt);
    }

    /// Enter every state on the path from the root down to `target`.
    pub(crate) fn enter_from_root(&mut self, ctx: &mut C, target: StateHandler<C>) {
        let (path, depth) = self.state_path(ctx, target);
        for &state in path[..depth].iter().rev() {
            if !same_state(state, top::<C> as StateHandler<C>) {
                Self::send_entry(ctx, state);
            }
        }
    }

    /// Follow `INIT` returns from the current state down into nested
    /// substates until a state has no initial transition.
    pub(crate) fn drill_initial(&mut self, ctx: &mut C) {
        let evt = Event::new(Signal::INIT);
        loop {
            match (self.state)(ctx, &evt) {
                StateReturn::Initial(child) | StateReturn::Transition(child) => {
                    self.enter_between(ctx, self.state, child);
                    self.state = child;
                }
                _ => return,
            }
        }
    }

    /// Enter the chain of states strictly below `ancestor` down to `target`.
    fn enter_between(&mut self, ctx: &mut C, ancestor: StateHandler<C>, target: StateHandler<C>) {
        let (path, depth) = self.state_path(ctx, target);
        let cut = path[..depth]
            .iter()
            .position(|&s| same_state(s, ancestor))
            .unwrap_or(depth);
        for &state in path[..cut].iter().rev() {
            Self::send_entry(ctx, state);
        }
    }

    /// Execute a transition requested by `source` (the handling state, which
    /// may be an ancestor of the current leaf) toward `target`.
    pub(crate) fn transition(&mut self, ctx: &mut C, source: StateHandler<C>, target: StateHandler<C>) {
        // Exit from the current leaf up to (not including) the handling state.
        let mut s = self.state;
        while !same_state(s, source) {
            Self::send_exit(ctx, s);
            match Self::parent_of(ctx, s) {
                Some(parent) => s = parent,
                None => break,
            }
        }

        if same_state(source, target) {
            // Self-transition: exit and re-enter.
            Self::send_exit(ctx, source);
            Self::send_entry(ctx, target);
        } else {
            let (src_path, src_depth) = self.state_path(ctx, source);
            let (tgt_path, tgt_depth) = self.state_path(ctx, target);

            // Least common ancestor of source and target.
            let mut lca = None;
            'outer: for &s in src_path[..src_depth].iter() {
                for &t in tgt_path[..tgt_depth].iter() {
                    if same_state(s, t) {
                        lca = Some(s);
                        break 'outer;
                    }
                }
            }

            // Exit from source up to (not including) the LCA.
            for &state in src_path[..src_depth].iter() {
                match lca {
                    Some(l) if same_state(state, l) => break,
                    _ => Self::send_exit(ctx, state),
                }
            }

            // Enter from just below the LCA down to the target.
            let cut = match lca {
                Some(l) => tgt_path[..tgt_depth]
                    .iter()
                    .position(|&s| same_state(s, l))
                    .unwrap_or(tgt_depth),
                None => tgt_depth,
            };
            for &state in tgt_path[..cut].iter().rev() {
                if !same_state(state, top::<C> as StateHandler<C>) {
                    Self::send_entry(ctx, state);
                }
            }
        }

        self.state = target;
        self.drill_initial(ctx);
    }
}
