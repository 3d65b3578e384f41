//! Software time events.
//!
//! A [`TimeEvent`] is owned by an active object and posts its signal to the
//! owner's queue when it expires. Arming an already-armed event replaces the
//! prior arm; disarming an unarmed event is a no-op. The [`TimerWheel`]
//! advances every registered event by one tick and also drives the shared
//! [`TickClock`] used for timing statistics.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};

use af_core::{ActiveObjectId, Event, Signal};
use thiserror::Error;

use crate::kernel::{Kernel, KernelError};
use crate::sync::Lock;

#[derive(Debug, Error)]
pub enum TimeEventError {
    #[error(transparent)]
    Kernel(#[from] KernelError),
}

/// Monotonic tick counter shared between the wheel and timing consumers.
#[derive(Clone)]
pub struct TickClock {
    ticks: Arc<AtomicU64>,
}

impl TickClock {
    pub fn new() -> Self {
        Self {
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn now(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    fn advance(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}

struct TimeEventInner {
    target: ActiveObjectId,
    signal: Signal,
    remaining: u64,
    interval: Option<u64>,
    armed: bool,
}

/// One-shot or periodic software timer bound to an active object.
pub struct TimeEvent {
    inner: Lock<TimeEventInner>,
}

impl TimeEvent {
    pub fn new(target: ActiveObjectId, signal: Signal) -> Arc<Self> {
        Arc::new(Self {
            inner: Lock::new(TimeEventInner {
                target,
                signal,
                remaining: 0,
                interval: None,
                armed: false,
            }),
        })
    }

    /// Arm as a one-shot firing after `timeout_ticks`. Replaces any prior
    /// arm.
    pub fn arm(&self, timeout_ticks: u64) {
        let mut inner = self.inner.lock();
        inner.remaining = timeout_ticks;
        inner.interval = None;
        inner.armed = true;
    }

    /// Arm with a first expiry after `timeout_ticks` and a repeat every
    /// `interval_ticks` thereafter.
    pub fn arm_periodic(&self, timeout_ticks: u64, interval_ticks: u64) {
        let mut inner = self.inner.lock();
        inner.remaining = timeout_ticks;
        inner.interval = Some(interval_ticks);
        inner.armed = true;
    }

    /// Disarm. A no-op when the event is not armed.
    pub fn disarm(&self) {
        let mut inner = self.inner.lock();
        inner.armed = false;
        inner.remaining = 0;
    }

    pub fn is_armed(&self) -> bool {
        self.inner.lock().armed
    }

    fn tick(&self) -> Option<(ActiveObjectId, Event)> {
        let mut inner = self.inner.lock();
        if !inner.armed {
            return None;
        }

        if inner.remaining > 0 {
            inner.remaining -= 1;
        }

        if inner.remaining == 0 {
            let target = inner.target;
            inner.armed = inner.interval.is_some();
            if let Some(period) = inner.interval {
                inner.remaining = period;
            }
            let event = Event::new(inner.signal);
            Some((target, event))
        } else {
            None
        }
    }
}

/// Advances registered time events once per framework tick.
pub struct TimerWheel {
    kernel: Arc<Kernel>,
    events: Lock<Vec<Arc<TimeEvent>>>,
    clock: TickClock,
}

impl TimerWheel {
    pub fn new(kernel: Arc<Kernel>) -> Self {
        Self::with_clock(kernel, TickClock::new())
    }

    pub fn with_clock(kernel: Arc<Kernel>, clock: TickClock) -> Self {
        Self {
            kernel,
            events: Lock::new(Vec::new()),
            clock,
        }
    }

    pub fn register(&self, event: Arc<TimeEvent>) {
        self.events.lock().push(event);
    }

    pub fn clock(&self) -> TickClock {
        self.clock.clone()
    }

    /// Advance one tick, posting expiry signals to their owners.
    pub fn tick(&self) -> Result<(), TimeEventError> {
        self.clock.advance();
        let events: Vec<Arc<TimeEvent>> = self.events.lock().clone();
        for event in events {
            if let Some((target, evt)) = event.tick() {
                self.kernel.post(target, evt)?;
            }
        }
        Ok(())
    }

    /// Advance `n` ticks, draining the kernel after each so expiries are
    /// processed in tick order.
    pub fn tick_and_run(&self, n: u64) -> Result<(), TimeEventError> {
        for _ in 0..n {
            self.tick()?;
            self.kernel.run_until_idle();
        }
        Ok(())
    }
}
