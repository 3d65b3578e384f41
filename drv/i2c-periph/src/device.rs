//! Low-level device driver active object.
//!
//! Owns the I2C transaction lifecycle for a single slave: serializes one
//! transaction at a time, tags each with a fresh transaction id, enforces the
//! lockup/retry discipline, and reports completion to the requester through
//! an id-correlated reply.
//!
//! One starting state:
//! - `initial`: the initial pseudo-state (subscriptions, status defaults)
//!
//! One super state:
//! - `backstop`: handler for uncaught or error-case signals
//!
//! Four children of the backstop:
//! - `disabled`: bounces all requests, waits for an enable signal
//! - `starting`: enable received, waiting to reach the idle state
//! - `enabled`: device ready; reports to the supervisor, moves to idle
//! - `error`: fatal error state; only enable or disable leave it
//!
//! Children of `enabled`:
//! - `idle`: the normal inactive state
//! - `busy`: superstate bounding an in-flight transaction with a watchdog
//!   - `read` / `write`: the transaction in progress

use std::sync::Arc;

use af_core::{ms_to_ticks, ActiveObjectId, Event, ReplyableRequest, ReplyableResponse, Signal};
use af_hsm::{top, StateReturn};
use af_kernel::{AoPort, Behavior, HsmActive, TimeEvent, TimerWheel};
use heapless::Vec;

use crate::config::{
    DEVICE_BUSY_TIME_MS, DEVICE_INIT_LOCKUP_TIME_MS, I2C_ACTIVE_RETRIES, LOCKUP_TIME_MS,
    MAX_I2C_TRANSACTIONS, QUEUE_SIZE, STARTING_DEBUG_LEVEL,
};
use crate::debug_out;
use crate::error::{DriverError, GenericError, Severity, Subsystem};
use crate::events::{
    BusId, DataBuf, DebugLevel, DeviceErrorReply, DeviceReadRequest, DeviceResponse,
    DeviceWriteRequest, I2cBusStatusEvent, I2cCommComplete, I2cCommError, I2cCommRequest, I2cOp,
    I2cTransaction, RegAddrMode, TransferBuffer,
};
use crate::retry::RetryCounter;
use crate::signals;
use crate::DriverStatus;

/// Human-readable name used in logs and published error reports.
pub const DEVICE_NAME: &str = "i2c-dev";

/// Signals for use in local context only. These never leave the owning AO.
mod sig {
    use af_core::Signal;

    use crate::signals::LOCAL_SIG_BASE;

    pub const TIMEOUT: Signal = LOCAL_SIG_BASE.offset(0);
    pub const BUSY_TIMEOUT: Signal = LOCAL_SIG_BASE.offset(1);
    pub const ACTION_ENTER_IDLE: Signal = LOCAL_SIG_BASE.offset(2);
    pub const RETRY: Signal = LOCAL_SIG_BASE.offset(3);
    pub const START_RW: Signal = LOCAL_SIG_BASE.offset(4);
}

/// Device-level active object context.
pub struct DeviceAo {
    port: AoPort,
    /// Lockup detection for a dispatched transaction (and for startup).
    lockup_timer: Arc<TimeEvent>,
    /// Outer watchdog bounding total time in the busy superstate.
    busy_timer: Arc<TimeEvent>,
    /// The I2C controller AO servicing our transaction requests.
    controller: ActiveObjectId,
    slave_addr: u8,
    status: DriverStatus,
    debug_level: u32,
    /// Id of the in-flight I2C transaction; replies must echo it.
    transaction_id: u32,
    operation: I2cOp,
    /// AO whose request we are servicing, with its original request id.
    requester: Option<ActiveObjectId>,
    request_id: u32,
    read_buf: TransferBuffer,
    read_len: usize,
    write_buf: TransferBuffer,
    retries: RetryCounter,
    last_error: Option<DriverError>,
    last_hal_error: Option<i32>,
}

impl Behavior for DeviceAo {
    fn port(&self) -> &AoPort {
        &self.port
    }
}

impl DeviceAo {
    pub fn new(id: ActiveObjectId, controller: ActiveObjectId, slave_addr: u8) -> Self {
        Self {
            lockup_timer: TimeEvent::new(id, sig::TIMEOUT),
            busy_timer: TimeEvent::new(id, sig::BUSY_TIMEOUT),
            port: AoPort::new(id),
            controller,
            slave_addr,
            status: DriverStatus::Unknown,
            debug_level: STARTING_DEBUG_LEVEL,
            transaction_id: 0,
            operation: I2cOp::Read,
            requester: None,
            request_id: 0,
            read_buf: TransferBuffer::default(),
            read_len: 0,
            write_buf: TransferBuffer::default(),
            retries: RetryCounter::new(I2C_ACTIVE_RETRIES),
            last_error: None,
            last_hal_error: None,
        }
    }

    /// Wrap the context in an active object starting at [`DeviceAo::initial`].
    pub fn spawn(self, priority: u8) -> Arc<HsmActive<Self, QUEUE_SIZE>> {
        HsmActive::new(priority, Self::initial, self)
    }

    /// Register both watchdog timers with the system timer wheel.
    pub fn register_timers(ao: &HsmActive<Self, QUEUE_SIZE>, wheel: &TimerWheel) {
        ao.with_ctx(|me| {
            wheel.register(me.lockup_timer.clone());
            wheel.register(me.busy_timer.clone());
        });
    }

    pub fn status(&self) -> DriverStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<DriverError> {
        self.last_error
    }

    pub fn last_hal_error(&self) -> Option<i32> {
        self.last_hal_error
    }

    pub fn transaction_id(&self) -> u32 {
        self.transaction_id
    }

    pub fn debug_level(&self) -> u32 {
        self.debug_level
    }

    // -----------------------------------------------------------------------
    // State handlers
    // -----------------------------------------------------------------------

    /// Initial pseudo-state: subscribe and fall into `disabled`.
    pub fn initial(me: &mut Self, _e: &Event) -> StateReturn<Self> {
        if let Err(err) = me.port.subscribe(signals::I2C_BUS_STATUS) {
            log::warn!("{DEVICE_NAME}: bus status subscription failed: {err}");
        }
        me.status = DriverStatus::Disabled;
        StateReturn::Transition(Self::disabled)
    }

    /// Backstop handles signals not caught by substates.
    pub fn backstop(me: &mut Self, e: &Event) -> StateReturn<Self> {
        match e.signal() {
            // Hierarchy discovery probe; must always delegate upward.
            Signal::EMPTY => StateReturn::Super(top),
            Signal::INIT | Signal::ENTRY | Signal::EXIT => StateReturn::Handled,
            // If the internal bus stops being ready, fall back to disabled.
            signals::I2C_BUS_STATUS => match e.payload::<I2cBusStatusEvent>() {
                Some(evt) if !evt.status.internal_ready() => {
                    me.status = DriverStatus::Disabled;
                    StateReturn::Transition(Self::disabled)
                }
                _ => StateReturn::Handled,
            },
            // Can arrive at any point; answer from here.
            signals::DEVICE_REQ_STATUS => {
                me.publish_status();
                StateReturn::Handled
            }
            signals::DEVICE_DISABLE | signals::DEVICE_STOP => {
                debug_out!(me, 1, "{DEVICE_NAME}: driver disabled");
                me.status = DriverStatus::Disabled;
                StateReturn::Transition(Self::disabled)
            }
            signals::DEBUG_LEVEL => {
                if let Some(lvl) = e.payload::<DebugLevel>() {
                    me.debug_level = lvl.new_level;
                    debug_out!(me, 1, "{DEVICE_NAME}: debug level set to {}", lvl.new_level);
                }
                StateReturn::Handled
            }
            other => {
                debug_out!(
                    me,
                    1,
                    "{DEVICE_NAME}: ignoring unhandled signal {} ({other})",
                    signals::signal_name(other)
                );
                StateReturn::Super(top)
            }
        }
    }

    /// Wait for an enable signal from the supervisor.
    pub fn disabled(me: &mut Self, e: &Event) -> StateReturn<Self> {
        match e.signal() {
            Signal::ENTRY => {
                me.status = DriverStatus::Disabled;
                me.publish_status();
                StateReturn::Handled
            }
            Signal::EXIT => StateReturn::Handled,
            signals::DEVICE_ENABLE => {
                debug_out!(me, 1, "{DEVICE_NAME}: driver starting");
                StateReturn::Transition(Self::starting)
            }
            signals::DEVICE_DISABLE => {
                debug_out!(me, 1, "{DEVICE_NAME}: device already disabled");
                StateReturn::Handled
            }
            signals::DEVICE_READ | signals::DEVICE_WRITE => {
                debug_out!(
                    me,
                    1,
                    "{DEVICE_NAME}: device is disabled, cannot complete {}",
                    signals::signal_name(e.signal())
                );
                StateReturn::Handled
            }
            // Already disabled; a not-ready bus changes nothing.
            signals::I2C_BUS_STATUS => StateReturn::Handled,
            _ => StateReturn::Super(Self::backstop),
        }
    }

    /// Enable received; kick off the move to idle under a startup watchdog.
    pub fn starting(me: &mut Self, e: &Event) -> StateReturn<Self> {
        match e.signal() {
            Signal::ENTRY => {
                me.retries.reset();
                me.lockup_timer.arm(ms_to_ticks(DEVICE_INIT_LOCKUP_TIME_MS));
                me.post_self_logged(Event::new(sig::ACTION_ENTER_IDLE));
                StateReturn::Handled
            }
            Signal::EXIT => {
                me.lockup_timer.disarm();
                StateReturn::Handled
            }
            sig::ACTION_ENTER_IDLE => StateReturn::Transition(Self::idle),
            sig::RETRY => {
                me.lockup_timer.arm(ms_to_ticks(DEVICE_INIT_LOCKUP_TIME_MS));
                me.post_self_logged(Event::new(sig::ACTION_ENTER_IDLE));
                StateReturn::Handled
            }
            sig::TIMEOUT => {
                if me.try_retry() {
                    StateReturn::Handled
                } else {
                    debug_out!(me, 1, "{DEVICE_NAME}: too many timeouts during startup, giving up");
                    StateReturn::Transition(Self::error)
                }
            }
            signals::DEVICE_ENABLE => {
                debug_out!(me, 1, "{DEVICE_NAME}: device is already starting");
                StateReturn::Handled
            }
            _ => StateReturn::Super(Self::backstop),
        }
    }

    /// Device ready and available.
    pub fn enabled(me: &mut Self, e: &Event) -> StateReturn<Self> {
        match e.signal() {
            Signal::ENTRY => {
                debug_out!(me, 1, "{DEVICE_NAME}: driver enabled");
                me.status = DriverStatus::Enabled;
                me.publish_status();
                me.post_self_logged(Event::new(sig::ACTION_ENTER_IDLE));
                StateReturn::Handled
            }
            Signal::EXIT => StateReturn::Handled,
            sig::ACTION_ENTER_IDLE => StateReturn::Transition(Self::idle),
            signals::DEVICE_ENABLE => {
                debug_out!(me, 2, "{DEVICE_NAME}: already enabled");
                StateReturn::Handled
            }
            _ => StateReturn::Super(Self::backstop),
        }
    }

    /// The normal inactive state; waits for read and write requests.
    pub fn idle(me: &mut Self, e: &Event) -> StateReturn<Self> {
        match e.signal() {
            Signal::ENTRY => {
                me.status = DriverStatus::Enabled;
                // Fresh operation sequence: ids restart at 1, full retry
                // budget.
                me.transaction_id = 0;
                me.retries.reset();
                StateReturn::Handled
            }
            Signal::EXIT => StateReturn::Handled,
            signals::DEVICE_WRITE => match e.payload::<DeviceWriteRequest>() {
                Some(req) => {
                    debug_out!(me, 1, "{DEVICE_NAME}: received write request");
                    me.operation = I2cOp::Write;
                    me.requester = Some(req.reply.requester);
                    me.request_id = req.reply.request_id;
                    me.write_buf = TransferBuffer {
                        reg: req.reg,
                        data: req.data.clone(),
                    };
                    StateReturn::Transition(Self::write)
                }
                None => {
                    log::warn!("{DEVICE_NAME}: malformed write request dropped");
                    StateReturn::Handled
                }
            },
            signals::DEVICE_READ => match e.payload::<DeviceReadRequest>() {
                Some(req) => {
                    debug_out!(me, 1, "{DEVICE_NAME}: received read request");
                    me.operation = I2cOp::Read;
                    me.requester = Some(req.reply.requester);
                    me.request_id = req.reply.request_id;
                    me.read_buf = TransferBuffer {
                        reg: req.reg,
                        data: DataBuf::new(),
                    };
                    me.read_len = req.len;
                    StateReturn::Transition(Self::read)
                }
                None => {
                    log::warn!("{DEVICE_NAME}: malformed read request dropped");
                    StateReturn::Handled
                }
            },
            _ => StateReturn::Super(Self::enabled),
        }
    }

    /// Superstate bounding an in-flight transaction. Requests arriving here
    /// are protocol violations (the API level defers instead); they are
    /// rejected with a busy reply.
    pub fn busy(me: &mut Self, e: &Event) -> StateReturn<Self> {
        match e.signal() {
            Signal::ENTRY => {
                me.busy_timer.arm(ms_to_ticks(DEVICE_BUSY_TIME_MS));
                StateReturn::Handled
            }
            Signal::EXIT => {
                me.busy_timer.disarm();
                StateReturn::Handled
            }
            signals::DEVICE_WRITE | signals::DEVICE_READ => {
                me.publish_error(DriverError::Busy, Severity::Warning);
                me.last_error = Some(DriverError::Busy);
                let reply = e
                    .payload::<DeviceReadRequest>()
                    .map(|r| r.reply)
                    .or_else(|| e.payload::<DeviceWriteRequest>().map(|r| r.reply));
                if let Some(reply) = reply {
                    me.error_reply(reply.requester, reply.request_id, DriverError::Busy);
                }
                StateReturn::Handled
            }
            sig::BUSY_TIMEOUT => {
                if me.try_retry() {
                    debug_out!(me, 1, "{DEVICE_NAME}: busy watchdog expired, retrying");
                    me.busy_timer.arm(ms_to_ticks(DEVICE_BUSY_TIME_MS));
                    StateReturn::Handled
                } else {
                    me.operation_timeout()
                }
            }
            // A kick-off action from a previous `enabled` entry is stale once
            // a transfer is in flight; letting it bubble would abort the
            // transaction.
            sig::ACTION_ENTER_IDLE => StateReturn::Handled,
            _ => StateReturn::Super(Self::enabled),
        }
    }

    /// Transaction in progress: register read.
    pub fn read(me: &mut Self, e: &Event) -> StateReturn<Self> {
        match e.signal() {
            Signal::ENTRY => {
                me.lockup_timer.arm(ms_to_ticks(LOCKUP_TIME_MS));
                me.post_self_logged(Event::new(sig::START_RW));
                StateReturn::Handled
            }
            Signal::EXIT => {
                me.lockup_timer.disarm();
                StateReturn::Handled
            }
            sig::START_RW => {
                me.operation = I2cOp::Read;
                me.i2c_comm_req();
                StateReturn::Handled
            }
            sig::RETRY => {
                me.lockup_timer.arm(ms_to_ticks(LOCKUP_TIME_MS));
                me.i2c_comm_req();
                StateReturn::Handled
            }
            _ => Self::transfer_common(me, e),
        }
    }

    /// Transaction in progress: register write.
    pub fn write(me: &mut Self, e: &Event) -> StateReturn<Self> {
        match e.signal() {
            Signal::ENTRY => {
                me.lockup_timer.arm(ms_to_ticks(LOCKUP_TIME_MS));
                me.post_self_logged(Event::new(sig::START_RW));
                StateReturn::Handled
            }
            Signal::EXIT => {
                me.lockup_timer.disarm();
                StateReturn::Handled
            }
            sig::START_RW => {
                me.operation = I2cOp::Write;
                me.i2c_comm_req();
                StateReturn::Handled
            }
            sig::RETRY => {
                me.lockup_timer.arm(ms_to_ticks(LOCKUP_TIME_MS));
                me.i2c_comm_req();
                StateReturn::Handled
            }
            _ => Self::transfer_common(me, e),
        }
    }

    /// Fatal error condition. The supervisor is alerted; only an explicit
    /// enable (restart) or disable leaves this state.
    pub fn error(me: &mut Self, e: &Event) -> StateReturn<Self> {
        match e.signal() {
            Signal::ENTRY => {
                me.status = DriverStatus::FatalError;
                me.publish_status();
                StateReturn::Handled
            }
            Signal::EXIT => StateReturn::Handled,
            signals::DEVICE_ENABLE => {
                debug_out!(me, 1, "{DEVICE_NAME}: driver starting from fatal error state");
                StateReturn::Transition(Self::starting)
            }
            signals::DEVICE_DISABLE => {
                debug_out!(me, 1, "{DEVICE_NAME}: driver disabling");
                StateReturn::Transition(Self::disabled)
            }
            signals::DEVICE_READ | signals::DEVICE_WRITE => {
                debug_out!(me, 1, "{DEVICE_NAME}: in error state, request ignored");
                StateReturn::Handled
            }
            _ => StateReturn::Super(Self::backstop),
        }
    }

    // -----------------------------------------------------------------------
    // Shared transfer handling
    // -----------------------------------------------------------------------

    /// Completion, error, and timeout handling common to `read` and `write`.
    fn transfer_common(me: &mut Self, e: &Event) -> StateReturn<Self> {
        match e.signal() {
            signals::I2C_COMM_COMPLETE => match e.payload::<I2cCommComplete>() {
                Some(rsp) if rsp.reply.matches(me.transaction_id) => me.complete_transaction(rsp),
                Some(_) => me.mismatched_reply(),
                None => {
                    log::warn!("{DEVICE_NAME}: malformed completion reply dropped");
                    StateReturn::Handled
                }
            },
            signals::I2C_COMM_ERROR => match e.payload::<I2cCommError>() {
                Some(err) if err.reply.matches(me.transaction_id) => me.comm_error(err),
                Some(_) => me.mismatched_reply(),
                None => {
                    log::warn!("{DEVICE_NAME}: malformed error reply dropped");
                    StateReturn::Handled
                }
            },
            sig::TIMEOUT => {
                if me.try_retry() {
                    debug_out!(me, 1, "{DEVICE_NAME}: transfer timed out, retrying");
                    StateReturn::Handled
                } else {
                    me.operation_timeout()
                }
            }
            _ => StateReturn::Super(Self::busy),
        }
    }

    /// Matched completion: reply to the requester and return to idle.
    fn complete_transaction(&mut self, rsp: &I2cCommComplete) -> StateReturn<Self> {
        self.lockup_timer.disarm();
        debug_out!(self, 2, "{DEVICE_NAME}: received i2c response to transfer");

        let buffer = match self.operation {
            I2cOp::Read => {
                self.read_buf.data.clear();
                let take = rsp.data.len().min(self.read_len);
                // Capacities match; the copy cannot overflow.
                let _ = self.read_buf.data.extend_from_slice(&rsp.data[..take]);
                self.read_buf.clone()
            }
            I2cOp::Write => self.write_buf.clone(),
        };

        if let Some(requester) = self.requester {
            let evt = Event::with_payload(
                signals::DEVICE_RESPONSE,
                DeviceResponse {
                    reply: ReplyableResponse::new(self.request_id),
                    op: self.operation,
                    buffer,
                },
            );
            if let Err(err) = self.port.post(requester, evt) {
                log::warn!("{DEVICE_NAME}: response to {requester} dropped: {err}");
            }
        }
        StateReturn::Transition(Self::idle)
    }

    /// A reply for a transaction we no longer own. The replyable scheme
    /// allows several outstanding ids per sender; this driver keeps exactly
    /// one, so a mismatch almost certainly means a late reply from a retried
    /// or timed-out transaction. Warn and stay put.
    fn mismatched_reply(&mut self) -> StateReturn<Self> {
        self.publish_error(DriverError::MismatchRespId, Severity::Warning);
        self.last_error = Some(DriverError::MismatchRespId);
        StateReturn::Handled
    }

    /// Matched error reply: surface it and give up on the device.
    fn comm_error(&mut self, err: &I2cCommError) -> StateReturn<Self> {
        self.lockup_timer.disarm();
        debug_out!(self, 1, "{DEVICE_NAME}: got communication error during transfer");

        self.publish_error(DriverError::I2cError(err.hal_error), Severity::Error);
        self.last_error = Some(DriverError::I2cError(err.hal_error));
        self.last_hal_error = Some(err.hal_error);
        if let Some(requester) = self.requester {
            self.error_reply(requester, self.request_id, DriverError::I2cError(err.hal_error));
        }
        StateReturn::Transition(Self::error)
    }

    /// Retry budget exhausted on a transfer: surface the timeout and return
    /// to idle. A single timed-out operation is not fatal.
    fn operation_timeout(&mut self) -> StateReturn<Self> {
        self.publish_error(DriverError::I2cTimeout, Severity::Error);
        self.last_error = Some(DriverError::I2cTimeout);
        if let Some(requester) = self.requester {
            self.error_reply(requester, self.request_id, DriverError::I2cTimeout);
        }
        StateReturn::Transition(Self::idle)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn try_retry(&mut self) -> bool {
        let granted = self.retries.try_retry(&self.port, sig::RETRY);
        if !granted {
            debug_out!(
                self,
                1,
                "{DEVICE_NAME}: maximum number of retries ({}) reached",
                self.retries.count()
            );
        }
        granted
    }

    /// Dispatch the in-flight operation to the I2C controller, tagged with a
    /// fresh transaction id.
    fn i2c_comm_req(&mut self) {
        self.transaction_id += 1;

        let transaction = match self.operation {
            I2cOp::Read => {
                debug_out!(
                    self,
                    1,
                    "{DEVICE_NAME}: dispatching read request to i2c, reg {:#04x}",
                    self.read_buf.reg
                );
                I2cTransaction {
                    reg_addr_mode: RegAddrMode::UseRegAddr,
                    op: I2cOp::Read,
                    reg_addr: self.read_buf.reg,
                    tx: DataBuf::new(),
                    rx_len: self.read_len,
                    nak_expected: false,
                }
            }
            I2cOp::Write => {
                debug_out!(
                    self,
                    1,
                    "{DEVICE_NAME}: dispatching write request to i2c, reg {:#04x}",
                    self.write_buf.reg
                );
                I2cTransaction {
                    reg_addr_mode: RegAddrMode::UseRegAddr,
                    op: I2cOp::Write,
                    reg_addr: self.write_buf.reg,
                    tx: self.write_buf.data.clone(),
                    rx_len: 0,
                    nak_expected: false,
                }
            }
        };

        let mut transactions: Vec<I2cTransaction, MAX_I2C_TRANSACTIONS> = Vec::new();
        // Capacity is at least one; a single transaction always fits.
        let _ = transactions.push(transaction);

        let request = I2cCommRequest {
            reply: ReplyableRequest::new(self.port.id(), self.transaction_id),
            bus: BusId::Internal,
            addr: self.slave_addr,
            transactions,
        };
        let evt = Event::with_payload(signals::I2C_COMM_REQUEST, request);
        if let Err(err) = self.port.post(self.controller, evt) {
            log::warn!("{DEVICE_NAME}: i2c request to {} dropped: {err}", self.controller);
        }
    }

    /// Announce the current status on the publish/subscribe bus.
    fn publish_status(&self) {
        let signal = match self.status {
            DriverStatus::Enabled => signals::DEVICE_READY_REPORT,
            DriverStatus::Disabled => signals::DEVICE_DISABLE_REPORT,
            DriverStatus::Unknown | DriverStatus::FatalError => signals::DEVICE_ERROR_REPORT,
        };
        if let Err(err) = self.port.publish(&Event::new(signal)) {
            log::warn!("{DEVICE_NAME}: status publish dropped: {err}");
        }
    }

    fn publish_error(&self, error: DriverError, severity: Severity) {
        debug_out!(self, 2, "{DEVICE_NAME}: error reported, code {:#04x}", error.code());
        let evt = Event::with_payload(
            signals::GENERIC_ERROR_REPORT,
            GenericError {
                code: error.code(),
                ao_name: DEVICE_NAME,
                severity,
                subsystem: Subsystem::Device,
                extra: 0,
            },
        );
        if let Err(err) = self.port.publish(&evt) {
            log::warn!("{DEVICE_NAME}: error publish dropped: {err}");
        }
    }

    /// Correlated error reply to a requester. A vanished requester is a
    /// logged drop, never a failure.
    fn error_reply(&self, requester: ActiveObjectId, request_id: u32, error: DriverError) {
        let evt = Event::with_payload(
            signals::DEVICE_ERROR_REPLY,
            DeviceErrorReply {
                reply: ReplyableResponse::new(request_id),
                error,
            },
        );
        if let Err(err) = self.port.post(requester, evt) {
            log::warn!("{DEVICE_NAME}: error reply to {requester} dropped: {err}");
        }
    }

    fn post_self_logged(&self, event: Event) {
        let signal = event.signal();
        if let Err(err) = self.port.post_self(event) {
            log::error!("{DEVICE_NAME}: self-post of {signal} failed: {err}");
        }
    }
}
