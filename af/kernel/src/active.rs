//! Active objects: bounded event queue plus a behavior, driven by the kernel.
//!
//! Two flavors are provided. [`HsmActive`] wraps a hierarchical state machine
//! from `af-hsm` and is what drivers are built on. [`ActiveObject`] runs a
//! flat [`ActiveBehavior`] and suits simple reactive collaborators (test
//! doubles, bridges).
//!
//! Both own their context behind a mutex so the kernel can hold `Arc`s to
//! type-erased [`ActiveRunnable`] objects while handlers get `&mut` access to
//! their own data. Handlers reach the rest of the system through the
//! [`AoPort`] stored in their context.

use alloc::sync::{Arc, Weak};

use af_core::{ActiveObjectId, Event, Signal};
use af_hsm::{Hsm, StateHandler};
use heapless::Deque;

use crate::kernel::{Kernel, KernelError};
use crate::sync::Lock;

/// Default main-queue capacity for an active object.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Handle a context uses from inside run-to-completion handlers.
///
/// The port holds a weak reference to the kernel so the boot-time wiring
/// (kernel owns objects, objects talk back through their port) does not form
/// a strong cycle. Operations on a torn-down kernel fail with
/// [`KernelError::Detached`]; callers treat that as a logged drop.
pub struct AoPort {
    id: ActiveObjectId,
    kernel: Lock<Option<Weak<Kernel>>>,
}

impl AoPort {
    pub fn new(id: ActiveObjectId) -> Self {
        Self {
            id,
            kernel: Lock::new(None),
        }
    }

    pub fn id(&self) -> ActiveObjectId {
        self.id
    }

    pub(crate) fn attach(&self, kernel: Weak<Kernel>) {
        *self.kernel.lock() = Some(kernel);
    }

    fn kernel(&self) -> Result<Arc<Kernel>, KernelError> {
        self.kernel
            .lock()
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or(KernelError::Detached)
    }

    /// Post an event to another active object's queue.
    pub fn post(&self, target: ActiveObjectId, event: Event) -> Result<(), KernelError> {
        self.kernel()?.post(target, event)
    }

    /// Post an event to this object's own queue, behind anything pending.
    pub fn post_self(&self, event: Event) -> Result<(), KernelError> {
        self.kernel()?.post(self.id, event)
    }

    /// Post an event to the front of this object's own queue. Used by the
    /// deferral recall so a recalled request is dispatched before any newer
    /// arrivals.
    pub fn post_self_front(&self, event: Event) -> Result<(), KernelError> {
        self.kernel()?.post_front(self.id, event)
    }

    /// Publish an event to every subscriber of its signal.
    pub fn publish(&self, event: &Event) -> Result<(), KernelError> {
        self.kernel()?.publish(event);
        Ok(())
    }

    pub fn subscribe(&self, signal: Signal) -> Result<(), KernelError> {
        self.kernel()?.subscribe(self.id, signal);
        Ok(())
    }

    pub fn unsubscribe(&self, signal: Signal) -> Result<(), KernelError> {
        self.kernel()?.unsubscribe(self.id, signal);
        Ok(())
    }
}

/// Implemented by every active-object context so the framework can reach its
/// port (for kernel attachment and identity).
pub trait Behavior: Send + 'static {
    fn port(&self) -> &AoPort;
}

/// Flat event handler for non-hierarchical active objects.
pub trait ActiveBehavior: Behavior {
    /// One-time setup once the kernel is attached (subscriptions, initial
    /// posts).
    fn on_start(&mut self) {}

    /// Process one event to completion.
    fn on_event(&mut self, event: &Event);
}

/// Object-safe interface the kernel drives.
pub trait ActiveRunnable: Send + Sync {
    fn id(&self) -> ActiveObjectId;
    fn priority(&self) -> u8;
    fn attach(&self, kernel: Weak<Kernel>);
    fn start(&self);
    fn dispatch_one(&self) -> bool;
    fn has_events(&self) -> bool;
    fn post(&self, event: Event) -> Result<(), KernelError>;
    fn post_front(&self, event: Event) -> Result<(), KernelError>;
}

pub type ActiveObjectRef = Arc<dyn ActiveRunnable>;

/// Active object running a hierarchical state machine over the context `C`.
pub struct HsmActive<C: Behavior, const QUEUE: usize = DEFAULT_QUEUE_CAPACITY> {
    id: ActiveObjectId,
    priority: u8,
    hsm: Lock<Hsm<C>>,
    ctx: Lock<C>,
    queue: Lock<Deque<Event, QUEUE>>,
}

impl<C: Behavior, const QUEUE: usize> HsmActive<C, QUEUE> {
    /// Create an active object whose state machine starts in the `initial`
    /// pseudo-state. The object's identity is taken from the context's port.
    pub fn new(priority: u8, initial: StateHandler<C>, ctx: C) -> Arc<Self> {
        let id = ctx.port().id();
        Arc::new(Self {
            id,
            priority,
            hsm: Lock::new(Hsm::new(initial)),
            ctx: Lock::new(ctx),
            queue: Lock::new(Deque::new()),
        })
    }

    /// Run a closure against the context. Intended for supervision and test
    /// probes, not for mutating state the machine owns.
    pub fn with_ctx<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(&self.ctx.lock())
    }

    /// True when `handler` is the current state or an ancestor of it.
    pub fn is_in(&self, handler: StateHandler<C>) -> bool {
        let hsm = self.hsm.lock();
        let mut ctx = self.ctx.lock();
        hsm.is_in(&mut ctx, handler)
    }
}

impl<C: Behavior, const QUEUE: usize> ActiveRunnable for HsmActive<C, QUEUE> {
    fn id(&self) -> ActiveObjectId {
        self.id
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    fn attach(&self, kernel: Weak<Kernel>) {
        self.ctx.lock().port().attach(kernel);
    }

    fn start(&self) {
        let mut hsm = self.hsm.lock();
        let mut ctx = self.ctx.lock();
        if let Err(err) = hsm.init(&mut ctx) {
            log::error!("{}: state machine init failed: {err}", self.id);
        }
    }

    fn dispatch_one(&self) -> bool {
        let event = self.queue.lock().pop_front();
        match event {
            Some(event) => {
                let mut hsm = self.hsm.lock();
                let mut ctx = self.ctx.lock();
                if let Err(err) = hsm.dispatch(&mut ctx, &event) {
                    log::error!("{}: dispatch of {} failed: {err}", self.id, event.signal());
                }
                true
            }
            None => false,
        }
    }

    fn has_events(&self) -> bool {
        !self.queue.lock().is_empty()
    }

    fn post(&self, event: Event) -> Result<(), KernelError> {
        self.queue
            .lock()
            .push_back(event)
            .map_err(|_| KernelError::QueueFull)
    }

    fn post_front(&self, event: Event) -> Result<(), KernelError> {
        self.queue
            .lock()
            .push_front(event)
            .map_err(|_| KernelError::QueueFull)
    }
}

/// Active object running a flat [`ActiveBehavior`].
pub struct ActiveObject<B: ActiveBehavior, const QUEUE: usize = DEFAULT_QUEUE_CAPACITY> {
    id: ActiveObjectId,
    priority: u8,
    behavior: Lock<B>,
    queue: Lock<Deque<Event, QUEUE>>,
}

impl<B: ActiveBehavior, const QUEUE: usize> ActiveObject<B, QUEUE> {
    pub fn new(priority: u8, behavior: B) -> Arc<Self> {
        let id = behavior.port().id();
        Arc::new(Self {
            id,
            priority,
            behavior: Lock::new(behavior),
            queue: Lock::new(Deque::new()),
        })
    }

    pub fn with_behavior<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        f(&mut self.behavior.lock())
    }
}

impl<B: ActiveBehavior, const QUEUE: usize> ActiveRunnable for ActiveObject<B, QUEUE> {
    fn id(&self) -> ActiveObjectId {
        self.id
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    fn attach(&self, kernel: Weak<Kernel>) {
        self.behavior.lock().port().attach(kernel);
    }

    fn start(&self) {
        self.behavior.lock().on_start();
    }

    fn dispatch_one(&self) -> bool {
        let event = self.queue.lock().pop_front();
        match event {
            Some(event) => {
                self.behavior.lock().on_event(&event);
                true
            }
            None => false,
        }
    }

    fn has_events(&self) -> bool {
        !self.queue.lock().is_empty()
    }

    fn post(&self, event: Event) -> Result<(), KernelError> {
        self.queue
            .lock()
            .push_back(event)
            .map_err(|_| KernelError::QueueFull)
    }

    fn post_front(&self, event: Event) -> Result<(), KernelError> {
        self.queue
            .lock()
            .push_front(event)
            .map_err(|_| KernelError::QueueFull)
    }
}

/// Park an event in a bounded deferral queue. Returns `false` when the queue
/// is full; the event is untouched and the caller decides how to fail.
pub fn defer<const N: usize>(queue: &mut Deque<Event, N>, event: &Event) -> bool {
    queue.push_back(event.clone()).is_ok()
}

/// Recall the oldest deferred event by reposting it to the front of the
/// owner's main queue. Returns `Ok(false)` when nothing was deferred.
pub fn recall<const N: usize>(
    port: &AoPort,
    queue: &mut Deque<Event, N>,
) -> Result<bool, KernelError> {
    match queue.pop_front() {
        Some(event) => {
            port.post_self_front(event)?;
            Ok(true)
        }
        None => Ok(false),
    }
}
