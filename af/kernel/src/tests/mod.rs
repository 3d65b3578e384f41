mod time;

use std::sync::{Arc, Mutex};

use af_core::{ActiveObjectId, Event, Signal};

use crate::active::{ActiveBehavior, ActiveObject, AoPort, Behavior};

/// Records every signal delivered to it.
pub(crate) struct Collector {
    port: AoPort,
    pub events: Arc<Mutex<Vec<Signal>>>,
}

impl Collector {
    pub fn new(id: ActiveObjectId) -> Self {
        Self {
            port: AoPort::new(id),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn probe(&self) -> Arc<Mutex<Vec<Signal>>> {
        self.events.clone()
    }
}

impl Behavior for Collector {
    fn port(&self) -> &AoPort {
        &self.port
    }
}

impl ActiveBehavior for Collector {
    fn on_event(&mut self, event: &Event) {
        self.events.lock().unwrap().push(event.signal());
    }
}

pub(crate) fn collector_ao(
    id: u8,
    priority: u8,
) -> (
    Arc<ActiveObject<Collector>>,
    Arc<Mutex<Vec<Signal>>>,
) {
    let collector = Collector::new(ActiveObjectId::new(id));
    let probe = collector.probe();
    (ActiveObject::new(priority, collector), probe)
}
