//! Cooperative kernel and publish/subscribe event routing.

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;

use af_core::{ActiveObjectId, Event, Signal};
use thiserror::Error;

use crate::active::ActiveObjectRef;
use crate::sync::Lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KernelError {
    #[error("active object {0} not registered")]
    NotFound(ActiveObjectId),
    #[error("event queue full")]
    QueueFull,
    #[error("kernel has been torn down")]
    Detached,
}

/// Collects active objects before the kernel is sealed.
pub struct KernelBuilder {
    objects: Vec<ActiveObjectRef>,
}

impl KernelBuilder {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
        }
    }

    pub fn register(mut self, object: ActiveObjectRef) -> Self {
        self.objects.push(object);
        self
    }

    pub fn build(mut self) -> Arc<Kernel> {
        self.objects.sort_by_key(|ao| ao.priority());
        Arc::new(Kernel::new(self.objects))
    }
}

impl Default for KernelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-threaded cooperative scheduler. Each call to [`Kernel::dispatch_once`]
/// runs exactly one event to completion on the highest-priority active object
/// with work pending.
pub struct Kernel {
    objects: Vec<ActiveObjectRef>,
    by_id: BTreeMap<ActiveObjectId, ActiveObjectRef>,
    subscriptions: Lock<BTreeMap<Signal, Vec<ActiveObjectId>>>,
}

impl Kernel {
    pub fn builder() -> KernelBuilder {
        KernelBuilder::new()
    }

    fn new(objects: Vec<ActiveObjectRef>) -> Self {
        let mut by_id = BTreeMap::new();
        for ao in &objects {
            by_id.insert(ao.id(), Arc::clone(ao));
        }
        Self {
            objects,
            by_id,
            subscriptions: Lock::new(BTreeMap::new()),
        }
    }

    /// Attach every registered object to this kernel and run its startup
    /// (initial transitions, subscriptions).
    pub fn start(self: &Arc<Self>) {
        for ao in &self.objects {
            ao.attach(Arc::downgrade(self));
        }
        for ao in &self.objects {
            ao.start();
        }
    }

    /// Post `event` to the back of `target`'s queue (FIFO delivery).
    pub fn post(&self, target: ActiveObjectId, event: Event) -> Result<(), KernelError> {
        self.by_id
            .get(&target)
            .ok_or(KernelError::NotFound(target))?
            .post(event)
    }

    /// Post `event` to the front of `target`'s queue. Reserved for the
    /// deferral recall path.
    pub fn post_front(&self, target: ActiveObjectId, event: Event) -> Result<(), KernelError> {
        self.by_id
            .get(&target)
            .ok_or(KernelError::NotFound(target))?
            .post_front(event)
    }

    /// Deliver `event` to every subscriber of its signal, FIFO per
    /// subscriber. A full subscriber queue drops that copy with a warning;
    /// other subscribers still receive theirs.
    pub fn publish(&self, event: &Event) {
        let targets: Vec<ActiveObjectId> = {
            let subs = self.subscriptions.lock();
            subs.get(&event.signal()).cloned().unwrap_or_default()
        };
        for target in targets {
            if let Err(err) = self.post(target, event.clone()) {
                log::warn!(
                    "publish of {} to {target} dropped: {err}",
                    event.signal()
                );
            }
        }
    }

    /// Subscribe `id` to `signal`. Subscribing twice is a no-op.
    pub fn subscribe(&self, id: ActiveObjectId, signal: Signal) {
        let mut subs = self.subscriptions.lock();
        let entry = subs.entry(signal).or_default();
        if !entry.contains(&id) {
            entry.push(id);
        }
    }

    /// Remove `id`'s subscription to `signal`. Unsubscribing when not
    /// subscribed is a no-op.
    pub fn unsubscribe(&self, id: ActiveObjectId, signal: Signal) {
        let mut subs = self.subscriptions.lock();
        if let Some(entry) = subs.get_mut(&signal) {
            entry.retain(|sub| *sub != id);
        }
    }

    /// Run one event on the highest-priority object with work pending.
    /// Returns `false` when the whole system is idle.
    pub fn dispatch_once(&self) -> bool {
        let candidate = self
            .objects
            .iter()
            .rev()
            .find(|ao| ao.has_events())
            .cloned();
        match candidate {
            Some(ao) => ao.dispatch_one(),
            None => false,
        }
    }

    /// Dispatch until every queue is empty.
    pub fn run_until_idle(&self) {
        while self.dispatch_once() {}
    }
}
