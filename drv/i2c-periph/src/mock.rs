//! Scripted in-process I2C controller for tests and demos.
//!
//! Plays the role of the controller AO: consumes `I2C_COMM_REQUEST` events
//! and answers each according to a pre-loaded script. With an empty script it
//! completes every request with no read-back data.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use af_core::{ActiveObjectId, Event};
use af_kernel::{ActiveBehavior, ActiveObject, AoPort, Behavior};

use crate::config::QUEUE_SIZE;
use crate::events::{DataBuf, I2cCommComplete, I2cCommError, I2cCommRequest, I2cOp};
use crate::signals;

/// What to do with the next controller request.
#[derive(Debug, Clone)]
pub enum MockAction {
    /// Reply with a completion carrying `data` as the read-back bytes.
    Complete(DataBuf),
    /// Reply with a bus error carrying the given HAL code.
    Error(i32),
    /// Swallow the request so the caller's lockup timer fires.
    Silent,
}

/// Summary of one request the mock received, for assertions.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub requester: ActiveObjectId,
    pub request_id: u32,
    pub addr: u8,
    pub op: I2cOp,
    pub reg: u8,
    pub tx: DataBuf,
    pub rx_len: usize,
}

/// Cloneable probe into the mock's script and request log.
#[derive(Clone)]
pub struct MockHandle {
    script: Arc<Mutex<VecDeque<MockAction>>>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl MockHandle {
    pub fn enqueue(&self, action: MockAction) {
        self.script.lock().unwrap().push_back(action);
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn seen_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

pub struct MockController {
    port: AoPort,
    script: Arc<Mutex<VecDeque<MockAction>>>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl MockController {
    pub fn new(id: ActiveObjectId) -> (Self, MockHandle) {
        let script = Arc::new(Mutex::new(VecDeque::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handle = MockHandle {
            script: script.clone(),
            seen: seen.clone(),
        };
        (
            Self {
                port: AoPort::new(id),
                script,
                seen,
            },
            handle,
        )
    }

    pub fn spawn(self, priority: u8) -> Arc<ActiveObject<Self, QUEUE_SIZE>> {
        ActiveObject::new(priority, self)
    }
}

impl Behavior for MockController {
    fn port(&self) -> &AoPort {
        &self.port
    }
}

impl ActiveBehavior for MockController {
    fn on_event(&mut self, event: &Event) {
        if event.signal() != signals::I2C_COMM_REQUEST {
            return;
        }
        let Some(req) = event.payload::<I2cCommRequest>() else {
            return;
        };

        if let Some(txn) = req.transactions.first() {
            self.seen.lock().unwrap().push(SeenRequest {
                requester: req.reply.requester,
                request_id: req.reply.request_id,
                addr: req.addr,
                op: txn.op,
                reg: txn.reg_addr,
                tx: txn.tx.clone(),
                rx_len: txn.rx_len,
            });
        }

        let action = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(MockAction::Complete(DataBuf::new()));

        let reply = match action {
            MockAction::Complete(data) => Event::with_payload(
                signals::I2C_COMM_COMPLETE,
                I2cCommComplete {
                    reply: req.reply.response(),
                    data,
                },
            ),
            MockAction::Error(hal_error) => Event::with_payload(
                signals::I2C_COMM_ERROR,
                I2cCommError {
                    reply: req.reply.response(),
                    hal_error,
                },
            ),
            MockAction::Silent => return,
        };
        if let Err(err) = self.port.post(req.reply.requester, reply) {
            log::warn!("mock i2c: reply to {} dropped: {err}", req.reply.requester);
        }
    }
}
