//! High-level API driver active object.
//!
//! Presents the enable/disable/read/write/status contract to clients and
//! shields them from transient device state. Requests are forwarded to the
//! device level one at a time; requests arriving while one is in flight are
//! parked in a bounded deferral queue and recalled in FIFO order.
//!
//! The state skeleton mirrors the device level minus the read/write leaves:
//! `backstop` over `disabled`, `starting`, `error`, and `enabled` with `idle`
//! and `busy` children.
//!
//! The deferral capacity is a const generic so overflow behavior can be
//! tested at small sizes; production instances use
//! [`DEFERRED_QUEUE_SIZE`](crate::config::DEFERRED_QUEUE_SIZE).

use std::sync::Arc;

use af_core::{ms_to_ticks, ActiveObjectId, Event, ReplyableRequest, ReplyableResponse, Signal};
use af_hsm::{top, StateReturn};
use af_kernel::{
    defer, recall, AoPort, AoTimings, Behavior, HsmActive, Phase, TickClock, TimeEvent,
    TimerWheel, TimingSnapshot,
};

use crate::config::{
    API_BUSY_TIME_MS, API_INIT_LOCKUP_TIME_MS, DEFERRED_QUEUE_SIZE, QUEUE_SIZE,
    STARTING_DEBUG_LEVEL,
};
use crate::debug_out;
use crate::error::{DriverError, GenericError, Severity, Subsystem};
use crate::events::{
    ApiErrorReply, ApiReadRequest, ApiResponse, ApiWriteRequest, DebugLevel, DeviceErrorReply,
    DeviceReadRequest, DeviceResponse, DeviceWriteRequest, I2cOp,
};
use crate::signals;
use crate::DriverStatus;

/// Human-readable name used in logs and published error reports.
pub const API_NAME: &str = "i2c-api";

/// Signals for use in local context only. These never leave the owning AO.
mod sig {
    use af_core::Signal;

    use crate::signals::LOCAL_SIG_BASE;

    pub const TIMEOUT: Signal = LOCAL_SIG_BASE.offset(0);
    pub const BUSY_TIMEOUT: Signal = LOCAL_SIG_BASE.offset(1);
    pub const START_INIT: Signal = LOCAL_SIG_BASE.offset(2);
    pub const RETRY: Signal = LOCAL_SIG_BASE.offset(3);
}

/// API-level active object context, generic over the deferral capacity.
pub struct ApiAo<const DEFER: usize = DEFERRED_QUEUE_SIZE> {
    port: AoPort,
    lockup_timer: Arc<TimeEvent>,
    busy_timer: Arc<TimeEvent>,
    /// The device-level AO this driver sits on.
    device: ActiveObjectId,
    status: DriverStatus,
    debug_level: u32,
    /// Client whose request is in flight, with its original request id.
    requester: Option<ActiveObjectId>,
    client_req_id: u32,
    operation: I2cOp,
    /// Monotonic id for requests this AO sends down to the device level.
    own_req_id: u32,
    deferred: heapless::Deque<Event, DEFER>,
    timings: AoTimings,
    clock: TickClock,
    last_error: Option<DriverError>,
}

impl<const DEFER: usize> Behavior for ApiAo<DEFER> {
    fn port(&self) -> &AoPort {
        &self.port
    }
}

impl<const DEFER: usize> ApiAo<DEFER> {
    pub fn new(id: ActiveObjectId, device: ActiveObjectId, clock: TickClock) -> Self {
        Self {
            lockup_timer: TimeEvent::new(id, sig::TIMEOUT),
            busy_timer: TimeEvent::new(id, sig::BUSY_TIMEOUT),
            port: AoPort::new(id),
            device,
            status: DriverStatus::Unknown,
            debug_level: STARTING_DEBUG_LEVEL,
            requester: None,
            client_req_id: 0,
            operation: I2cOp::Read,
            own_req_id: 0,
            deferred: heapless::Deque::new(),
            timings: AoTimings::new(),
            clock,
            last_error: None,
        }
    }

    /// Wrap the context in an active object starting at [`ApiAo::initial`].
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

    pub fn debug_level(&self) -> u32 {
        self.debug_level
    }

    /// True while a forwarded request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.timings.phase() == Phase::Busy
    }

    /// Idle/busy accumulators for supervision.
    pub fn active_counts(&self) -> TimingSnapshot {
        self.timings.snapshot(self.clock.now())
    }

    // -----------------------------------------------------------------------
    // State handlers
    // -----------------------------------------------------------------------

    /// Initial pseudo-state: subscribe to the device level's reports.
    pub fn initial(me: &mut Self, _e: &Event) -> StateReturn<Self> {
        for signal in [
            signals::DEVICE_DISABLE_REPORT,
            signals::DEVICE_READY_REPORT,
            signals::DEVICE_ERROR_REPORT,
        ] {
            if let Err(err) = me.port.subscribe(signal) {
                log::warn!("{API_NAME}: subscription to {signal} failed: {err}");
            }
        }
        me.status = DriverStatus::Disabled;
        StateReturn::Transition(Self::disabled)
    }

    /// Backstop handles signals not caught by substates.
    pub fn backstop(me: &mut Self, e: &Event) -> StateReturn<Self> {
        match e.signal() {
            Signal::EMPTY => StateReturn::Super(top),
            Signal::INIT | Signal::ENTRY | Signal::EXIT => StateReturn::Handled,
            signals::DEBUG_LEVEL => {
                if let Some(lvl) = e.payload::<DebugLevel>() {
                    me.debug_level = lvl.new_level;
                    debug_out!(me, 1, "{API_NAME}: debug level set to {}", lvl.new_level);
                }
                StateReturn::Handled
            }
            signals::API_REQ_STATUS => {
                me.publish_status();
                StateReturn::Handled
            }
            // Unconditional disable: forward it down and fall back.
            signals::API_DISABLE => {
                debug_out!(me, 1, "{API_NAME}: driver disabled");
                me.status = DriverStatus::Disabled;
                me.post_device_logged(Event::new(signals::DEVICE_DISABLE));
                StateReturn::Transition(Self::disabled)
            }
            // The device level went fatal underneath us.
            signals::DEVICE_ERROR_REPORT => {
                debug_out!(me, 1, "{API_NAME}: caught device error report in backstop");
                me.status = DriverStatus::FatalError;
                me.last_error = Some(DriverError::DeviceUnavailable);
                me.publish_error(DriverError::DeviceUnavailable, Severity::Error);
                StateReturn::Transition(Self::error)
            }
            other => {
                debug_out!(
                    me,
                    1,
                    "{API_NAME}: ignoring unhandled signal {} ({other})",
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
                let now = me.clock.now();
                me.timings.set_idle(now);
                me.status = DriverStatus::Disabled;
                me.publish_status();
                StateReturn::Handled
            }
            Signal::EXIT => StateReturn::Handled,
            signals::API_ENABLE => {
                debug_out!(me, 1, "{API_NAME}: driver starting");
                StateReturn::Transition(Self::starting)
            }
            signals::API_DISABLE => {
                debug_out!(me, 1, "{API_NAME}: device already disabled");
                StateReturn::Handled
            }
            signals::API_READ | signals::API_WRITE => {
                debug_out!(me, 1, "{API_NAME}: driver is disabled, request dropped");
                StateReturn::Handled
            }
            signals::DEVICE_DISABLE_REPORT => StateReturn::Handled,
            _ => StateReturn::Super(Self::backstop),
        }
    }

    /// Enable the device level and wait for it to report ready.
    pub fn starting(me: &mut Self, e: &Event) -> StateReturn<Self> {
        match e.signal() {
            Signal::ENTRY => {
                let now = me.clock.now();
                me.timings.set_busy(now);
                if let Err(err) = me.port.subscribe(signals::DEVICE_READY_REPORT) {
                    log::warn!("{API_NAME}: ready report subscription failed: {err}");
                }
                me.post_self_logged(Event::new(sig::START_INIT));
                StateReturn::Handled
            }
            Signal::EXIT => {
                me.lockup_timer.disarm();
                StateReturn::Handled
            }
            sig::START_INIT | sig::RETRY => {
                me.lockup_timer.arm(ms_to_ticks(API_INIT_LOCKUP_TIME_MS));
                me.post_device_logged(Event::new(signals::DEVICE_ENABLE));
                StateReturn::Handled
            }
            signals::DEVICE_READY_REPORT => {
                if let Err(err) = me.port.unsubscribe(signals::DEVICE_READY_REPORT) {
                    log::warn!("{API_NAME}: ready report unsubscribe failed: {err}");
                }
                debug_out!(me, 1, "{API_NAME}: low level driver active, moving to idle");
                StateReturn::Transition(Self::idle)
            }
            signals::DEVICE_ERROR_REPORT => {
                debug_out!(me, 1, "{API_NAME}: low level driver not available, enable failed");
                me.publish_error(DriverError::DeviceUnavailable, Severity::Error);
                me.status = DriverStatus::FatalError;
                me.last_error = Some(DriverError::DeviceUnavailable);
                StateReturn::Transition(Self::error)
            }
            sig::TIMEOUT => {
                debug_out!(me, 1, "{API_NAME}: startup timed out, enable failed");
                me.publish_error(DriverError::ApiTimeout, Severity::Error);
                me.status = DriverStatus::FatalError;
                me.last_error = Some(DriverError::ApiTimeout);
                StateReturn::Transition(Self::error)
            }
            signals::API_ENABLE => {
                debug_out!(me, 1, "{API_NAME}: driver is already starting");
                StateReturn::Handled
            }
            _ => StateReturn::Super(Self::backstop),
        }
    }

    /// All subsystems ready and available.
    pub fn enabled(me: &mut Self, e: &Event) -> StateReturn<Self> {
        match e.signal() {
            Signal::ENTRY => {
                me.lockup_timer.disarm();
                debug_out!(me, 1, "{API_NAME}: driver enabled");
                me.status = DriverStatus::Enabled;
                me.publish_status();
                StateReturn::Handled
            }
            Signal::EXIT => StateReturn::Handled,
            signals::API_ENABLE => {
                debug_out!(me, 1, "{API_NAME}: driver already enabled");
                StateReturn::Handled
            }
            _ => StateReturn::Super(Self::backstop),
        }
    }

    /// Normal inactive state: accepts client requests and forwards them.
    pub fn idle(me: &mut Self, e: &Event) -> StateReturn<Self> {
        match e.signal() {
            Signal::ENTRY => {
                let now = me.clock.now();
                me.timings.set_idle(now);
                me.status = DriverStatus::Enabled;
                // Drain one parked request, if any survived a busy spell.
                if let Err(err) = recall(&me.port, &mut me.deferred) {
                    log::warn!("{API_NAME}: deferred event recall failed: {err}");
                }
                StateReturn::Handled
            }
            Signal::EXIT => StateReturn::Handled,
            signals::API_READ => match e.payload::<ApiReadRequest>() {
                Some(req) => me.forward_read(req),
                None => {
                    log::warn!("{API_NAME}: malformed read request dropped");
                    StateReturn::Handled
                }
            },
            signals::API_WRITE => match e.payload::<ApiWriteRequest>() {
                Some(req) => me.forward_write(req),
                None => {
                    log::warn!("{API_NAME}: malformed write request dropped");
                    StateReturn::Handled
                }
            },
            _ => StateReturn::Super(Self::enabled),
        }
    }

    /// A forwarded request is outstanding; park new arrivals.
    pub fn busy(me: &mut Self, e: &Event) -> StateReturn<Self> {
        match e.signal() {
            Signal::ENTRY => {
                let now = me.clock.now();
                me.timings.set_busy(now);
                me.busy_timer.arm(ms_to_ticks(API_BUSY_TIME_MS));
                StateReturn::Handled
            }
            Signal::EXIT => {
                me.busy_timer.disarm();
                StateReturn::Handled
            }
            signals::API_READ | signals::API_WRITE => {
                if !defer(&mut me.deferred, e) {
                    debug_out!(
                        me,
                        1,
                        "{API_NAME}: queue full, could not defer {}",
                        signals::signal_name(e.signal())
                    );
                    me.last_error = Some(DriverError::QueueFull);
                    me.publish_error(DriverError::QueueFull, Severity::Error);
                    // Synchronous rejection so the client is never left
                    // waiting.
                    if let Some(reply) = Self::client_reply_header(e) {
                        me.error_reply(reply.requester, reply.request_id, DriverError::QueueFull);
                    }
                }
                StateReturn::Handled
            }
            signals::DEVICE_RESPONSE => match e.payload::<DeviceResponse>() {
                Some(rsp) if rsp.reply.matches(me.own_req_id) => me.complete_request(rsp),
                Some(_) => me.mismatched_reply(),
                None => {
                    log::warn!("{API_NAME}: malformed device response dropped");
                    StateReturn::Handled
                }
            },
            signals::DEVICE_ERROR_REPLY => match e.payload::<DeviceErrorReply>() {
                Some(rsp) if rsp.reply.matches(me.own_req_id) => {
                    let error = rsp.error;
                    me.fail_request(error)
                }
                Some(_) => me.mismatched_reply(),
                None => {
                    log::warn!("{API_NAME}: malformed device error reply dropped");
                    StateReturn::Handled
                }
            },
            sig::BUSY_TIMEOUT => {
                // Busy for too long; surface the fault and free the driver.
                // A late reply is filtered by id correlation.
                me.publish_error(DriverError::BusyTimeout, Severity::Error);
                me.last_error = Some(DriverError::BusyTimeout);
                if let Some(requester) = me.requester {
                    me.error_reply(requester, me.client_req_id, DriverError::BusyTimeout);
                }
                StateReturn::Transition(Self::idle)
            }
            _ => StateReturn::Super(Self::enabled),
        }
    }

    /// Fatal error state; terminal until an explicit enable or disable.
    pub fn error(me: &mut Self, e: &Event) -> StateReturn<Self> {
        match e.signal() {
            Signal::ENTRY => {
                let now = me.clock.now();
                me.timings.set_idle(now);
                me.status = DriverStatus::FatalError;
                me.publish_status();
                StateReturn::Handled
            }
            Signal::EXIT => StateReturn::Handled,
            signals::API_ENABLE => {
                debug_out!(me, 1, "{API_NAME}: driver starting from error state");
                StateReturn::Transition(Self::starting)
            }
            signals::API_DISABLE => {
                debug_out!(me, 1, "{API_NAME}: disabling from error state");
                me.post_device_logged(Event::new(signals::DEVICE_DISABLE));
                StateReturn::Transition(Self::disabled)
            }
            signals::API_READ | signals::API_WRITE => {
                debug_out!(me, 1, "{API_NAME}: in error state, request dropped");
                StateReturn::Handled
            }
            _ => StateReturn::Super(Self::backstop),
        }
    }

    // -----------------------------------------------------------------------
    // Forwarding and completion
    // -----------------------------------------------------------------------

    fn forward_read(&mut self, req: &ApiReadRequest) -> StateReturn<Self> {
        debug_out!(self, 1, "{API_NAME}: forwarding read request, reg {:#04x}", req.reg);
        self.own_req_id += 1;
        let down = DeviceReadRequest {
            reply: ReplyableRequest::new(self.port.id(), self.own_req_id),
            reg: req.reg,
            len: req.len,
        };
        self.forward(req.reply, I2cOp::Read, Event::with_payload(signals::DEVICE_READ, down))
    }

    fn forward_write(&mut self, req: &ApiWriteRequest) -> StateReturn<Self> {
        debug_out!(self, 1, "{API_NAME}: forwarding write request, reg {:#04x}", req.reg);
        self.own_req_id += 1;
        let down = DeviceWriteRequest {
            reply: ReplyableRequest::new(self.port.id(), self.own_req_id),
            reg: req.reg,
            data: req.data.clone(),
        };
        self.forward(req.reply, I2cOp::Write, Event::with_payload(signals::DEVICE_WRITE, down))
    }

    fn forward(
        &mut self,
        client: ReplyableRequest,
        op: I2cOp,
        event: Event,
    ) -> StateReturn<Self> {
        match self.port.post(self.device, event) {
            Ok(()) => {
                self.requester = Some(client.requester);
                self.client_req_id = client.request_id;
                self.operation = op;
                StateReturn::Transition(Self::busy)
            }
            Err(err) => {
                // The device level is unreachable; fail the request in place
                // rather than wedging in busy.
                log::warn!("{API_NAME}: forward to {} failed: {err}", self.device);
                self.last_error = Some(DriverError::DeviceUnavailable);
                self.error_reply(client.requester, client.request_id, DriverError::DeviceUnavailable);
                StateReturn::Handled
            }
        }
    }

    /// Matched success from below: forward it up and recall one parked
    /// request.
    fn complete_request(&mut self, rsp: &DeviceResponse) -> StateReturn<Self> {
        debug_out!(self, 2, "{API_NAME}: received device response");
        if let Some(requester) = self.requester.take() {
            let evt = Event::with_payload(
                signals::API_RESPONSE,
                ApiResponse {
                    reply: ReplyableResponse::new(self.client_req_id),
                    op: self.operation,
                    buffer: rsp.buffer.clone(),
                },
            );
            if let Err(err) = self.port.post(requester, evt) {
                log::warn!("{API_NAME}: response to {requester} dropped: {err}");
            }
        }
        StateReturn::Transition(Self::idle)
    }

    /// Matched error from below: forward it up and recall one parked
    /// request. Fatal device errors arrive separately as a published error
    /// report and are handled in the backstop.
    fn fail_request(&mut self, error: DriverError) -> StateReturn<Self> {
        debug_out!(self, 1, "{API_NAME}: device reported {error}");
        self.last_error = Some(error);
        if let Some(requester) = self.requester.take() {
            self.error_reply(requester, self.client_req_id, error);
        }
        StateReturn::Transition(Self::idle)
    }

    fn mismatched_reply(&mut self) -> StateReturn<Self> {
        self.publish_error(DriverError::MismatchRespId, Severity::Warning);
        self.last_error = Some(DriverError::MismatchRespId);
        StateReturn::Handled
    }

    /// Extract the client's reply header from a read or write request event.
    fn client_reply_header(e: &Event) -> Option<ReplyableRequest> {
        e.payload::<ApiReadRequest>()
            .map(|r| r.reply)
            .or_else(|| e.payload::<ApiWriteRequest>().map(|r| r.reply))
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn publish_status(&self) {
        let signal = match self.status {
            DriverStatus::Enabled => signals::API_READY_REPORT,
            DriverStatus::Disabled => signals::API_DISABLE_REPORT,
            DriverStatus::Unknown | DriverStatus::FatalError => signals::API_ERROR_REPORT,
        };
        if let Err(err) = self.port.publish(&Event::new(signal)) {
            log::warn!("{API_NAME}: status publish dropped: {err}");
        }
    }

    fn publish_error(&self, error: DriverError, severity: Severity) {
        debug_out!(self, 2, "{API_NAME}: error reported, code {:#04x}", error.code());
        let evt = Event::with_payload(
            signals::GENERIC_ERROR_REPORT,
            GenericError {
                code: error.code(),
                ao_name: API_NAME,
                severity,
                subsystem: Subsystem::Api,
                extra: 0,
            },
        );
        if let Err(err) = self.port.publish(&evt) {
            log::warn!("{API_NAME}: error publish dropped: {err}");
        }
    }

    fn error_reply(&self, requester: ActiveObjectId, request_id: u32, error: DriverError) {
        let evt = Event::with_payload(
            signals::API_ERROR_REPLY,
            ApiErrorReply {
                reply: ReplyableResponse::new(request_id),
                error,
            },
        );
        if let Err(err) = self.port.post(requester, evt) {
            log::warn!("{API_NAME}: error reply to {requester} dropped: {err}");
        }
    }

    fn post_device_logged(&self, event: Event) {
        if let Err(err) = self.port.post(self.device, event) {
            log::warn!("{API_NAME}: post to device level failed: {err}");
        }
    }

    fn post_self_logged(&self, event: Event) {
        let signal = event.signal();
        if let Err(err) = self.port.post_self(event) {
            log::error!("{API_NAME}: self-post of {signal} failed: {err}");
        }
    }
}
