//! Shared test rig: a scripted controller, the driver AOs, and a client that
//! records everything it receives.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use af_core::{ActiveObjectId, Event, ReplyableRequest};
use af_kernel::{
    ActiveBehavior, ActiveObject, AoPort, Behavior, HsmActive, Kernel, TimerWheel,
};
use drv_i2c_periph::api::ApiAo;
use drv_i2c_periph::config::{DEFERRED_QUEUE_SIZE, QUEUE_SIZE, SLAVE_ADDRESS};
use drv_i2c_periph::device::DeviceAo;
use drv_i2c_periph::mock::{MockController, MockHandle};
use drv_i2c_periph::signals;
use drv_i2c_periph::{
    ApiErrorReply, ApiReadRequest, ApiResponse, ApiWriteRequest, DataBuf, DeviceErrorReply,
    DeviceReadRequest, DeviceResponse, DeviceWriteRequest, DriverError, GenericError, I2cOp,
    Severity, Subsystem,
};

pub const CLIENT: ActiveObjectId = ActiveObjectId::new(1);
pub const API: ActiveObjectId = ActiveObjectId::new(2);
pub const DEVICE: ActiveObjectId = ActiveObjectId::new(3);
pub const I2C: ActiveObjectId = ActiveObjectId::new(4);

/// Everything the test client sees, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    DeviceResponse {
        request_id: u32,
        op: I2cOp,
        reg: u8,
        data: Vec<u8>,
    },
    DeviceError {
        request_id: u32,
        error: DriverError,
    },
    ApiResponse {
        request_id: u32,
        op: I2cOp,
        reg: u8,
        data: Vec<u8>,
    },
    ApiError {
        request_id: u32,
        error: DriverError,
    },
    GenericError {
        code: i32,
        severity: Severity,
        subsystem: Subsystem,
    },
    Report(&'static str),
}

pub type ObservedLog = Arc<Mutex<Vec<Observed>>>;

/// Client AO: posts requests, records replies and published reports.
pub struct TestClient {
    port: AoPort,
    observed: ObservedLog,
}

impl TestClient {
    pub fn new(id: ActiveObjectId) -> (Self, ObservedLog) {
        let observed: ObservedLog = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                port: AoPort::new(id),
                observed: observed.clone(),
            },
            observed,
        )
    }
}

impl Behavior for TestClient {
    fn port(&self) -> &AoPort {
        &self.port
    }
}

impl ActiveBehavior for TestClient {
    fn on_start(&mut self) {
        for signal in [
            signals::GENERIC_ERROR_REPORT,
            signals::DEVICE_READY_REPORT,
            signals::DEVICE_DISABLE_REPORT,
            signals::DEVICE_ERROR_REPORT,
            signals::API_READY_REPORT,
            signals::API_DISABLE_REPORT,
            signals::API_ERROR_REPORT,
        ] {
            self.port.subscribe(signal).unwrap();
        }
    }

    fn on_event(&mut self, event: &Event) {
        let mut log = self.observed.lock().unwrap();
        match event.signal() {
            signals::DEVICE_RESPONSE => {
                let rsp = event.payload::<DeviceResponse>().unwrap();
                log.push(Observed::DeviceResponse {
                    request_id: rsp.reply.request_id,
                    op: rsp.op,
                    reg: rsp.buffer.reg,
                    data: rsp.buffer.data.to_vec(),
                });
            }
            signals::DEVICE_ERROR_REPLY => {
                let rsp = event.payload::<DeviceErrorReply>().unwrap();
                log.push(Observed::DeviceError {
                    request_id: rsp.reply.request_id,
                    error: rsp.error,
                });
            }
            signals::API_RESPONSE => {
                let rsp = event.payload::<ApiResponse>().unwrap();
                log.push(Observed::ApiResponse {
                    request_id: rsp.reply.request_id,
                    op: rsp.op,
                    reg: rsp.buffer.reg,
                    data: rsp.buffer.data.to_vec(),
                });
            }
            signals::API_ERROR_REPLY => {
                let rsp = event.payload::<ApiErrorReply>().unwrap();
                log.push(Observed::ApiError {
                    request_id: rsp.reply.request_id,
                    error: rsp.error,
                });
            }
            signals::GENERIC_ERROR_REPORT => {
                let err = event.payload::<GenericError>().unwrap();
                log.push(Observed::GenericError {
                    code: err.code,
                    severity: err.severity,
                    subsystem: err.subsystem,
                });
            }
            other => log.push(Observed::Report(signals::signal_name(other))),
        }
    }
}

pub fn buf(bytes: &[u8]) -> DataBuf {
    DataBuf::from_slice(bytes).unwrap()
}

/// Filtered views over the observation log.
pub fn generic_errors(log: &ObservedLog) -> Vec<(i32, Severity, Subsystem)> {
    log.lock()
        .unwrap()
        .iter()
        .filter_map(|o| match o {
            Observed::GenericError {
                code,
                severity,
                subsystem,
            } => Some((*code, *severity, *subsystem)),
            _ => None,
        })
        .collect()
}

pub fn replies(log: &ObservedLog) -> Vec<Observed> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|o| !matches!(o, Observed::GenericError { .. } | Observed::Report(_)))
        .cloned()
        .collect()
}

pub fn reports(log: &ObservedLog) -> Vec<&'static str> {
    log.lock()
        .unwrap()
        .iter()
        .filter_map(|o| match o {
            Observed::Report(name) => Some(*name),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Device-level rig (client talks straight to the device AO)
// ---------------------------------------------------------------------------

pub struct DeviceRig {
    pub kernel: Arc<Kernel>,
    pub wheel: TimerWheel,
    pub device: Arc<HsmActive<DeviceAo, QUEUE_SIZE>>,
    pub mock: MockHandle,
    pub observed: ObservedLog,
}

pub fn device_rig() -> DeviceRig {
    let (mock, mock_handle) = MockController::new(I2C);
    let mock_ao = mock.spawn(4);
    let device = DeviceAo::new(DEVICE, I2C, SLAVE_ADDRESS).spawn(3);
    let (client, observed) = TestClient::new(CLIENT);
    let client_ao: Arc<ActiveObject<TestClient, QUEUE_SIZE>> = ActiveObject::new(1, client);

    let kernel = Kernel::builder()
        .register(client_ao)
        .register(device.clone())
        .register(mock_ao)
        .build();
    let wheel = TimerWheel::new(kernel.clone());
    DeviceAo::register_timers(&device, &wheel);
    kernel.start();
    kernel.run_until_idle();

    DeviceRig {
        kernel,
        wheel,
        device,
        mock: mock_handle,
        observed,
    }
}

impl DeviceRig {
    pub fn enable(&self) {
        self.kernel
            .post(DEVICE, Event::new(signals::DEVICE_ENABLE))
            .unwrap();
        self.kernel.run_until_idle();
    }

    pub fn post_read(&self, request_id: u32, reg: u8, len: usize) {
        let req = DeviceReadRequest {
            reply: ReplyableRequest::new(CLIENT, request_id),
            reg,
            len,
        };
        self.kernel
            .post(DEVICE, Event::with_payload(signals::DEVICE_READ, req))
            .unwrap();
        self.kernel.run_until_idle();
    }

    pub fn post_write(&self, request_id: u32, reg: u8, data: &[u8]) {
        let req = DeviceWriteRequest {
            reply: ReplyableRequest::new(CLIENT, request_id),
            reg,
            data: buf(data),
        };
        self.kernel
            .post(DEVICE, Event::with_payload(signals::DEVICE_WRITE, req))
            .unwrap();
        self.kernel.run_until_idle();
    }
}

// ---------------------------------------------------------------------------
// Full-chain rig (client -> api -> device -> mock controller)
// ---------------------------------------------------------------------------

pub struct ChainRig<const DEFER: usize> {
    pub kernel: Arc<Kernel>,
    pub wheel: TimerWheel,
    pub api: Arc<HsmActive<ApiAo<DEFER>, QUEUE_SIZE>>,
    pub device: Arc<HsmActive<DeviceAo, QUEUE_SIZE>>,
    pub mock: MockHandle,
    pub observed: ObservedLog,
}

pub fn chain_rig<const DEFER: usize>() -> ChainRig<DEFER> {
    let (mock, mock_handle) = MockController::new(I2C);
    let mock_ao = mock.spawn(4);
    let device = DeviceAo::new(DEVICE, I2C, SLAVE_ADDRESS).spawn(3);
    let (client, observed) = TestClient::new(CLIENT);
    let client_ao: Arc<ActiveObject<TestClient, QUEUE_SIZE>> = ActiveObject::new(1, client);

    let kernel_builder = Kernel::builder()
        .register(client_ao)
        .register(device.clone())
        .register(mock_ao);

    // The API AO needs the wheel's clock, which needs the kernel; build the
    // clock first and share it.
    let clock = af_kernel::TickClock::new();
    let api = ApiAo::<DEFER>::new(API, DEVICE, clock.clone()).spawn(2);
    let kernel = kernel_builder.register(api.clone()).build();

    let wheel = TimerWheel::with_clock(kernel.clone(), clock);
    DeviceAo::register_timers(&device, &wheel);
    ApiAo::register_timers(&api, &wheel);
    kernel.start();
    kernel.run_until_idle();

    ChainRig {
        kernel,
        wheel,
        api,
        device,
        mock: mock_handle,
        observed,
    }
}

// ---------------------------------------------------------------------------
// API-only rig: the device id is never registered, so downward posts vanish.
// Used for startup-failure scenarios that need the device to stay silent.
// ---------------------------------------------------------------------------

pub struct ApiOnlyRig {
    pub kernel: Arc<Kernel>,
    pub wheel: TimerWheel,
    pub api: Arc<HsmActive<ApiAo<DEFERRED_QUEUE_SIZE>, QUEUE_SIZE>>,
    pub observed: ObservedLog,
}

pub fn api_only_rig() -> ApiOnlyRig {
    let (client, observed) = TestClient::new(CLIENT);
    let client_ao: Arc<ActiveObject<TestClient, QUEUE_SIZE>> = ActiveObject::new(1, client);

    let clock = af_kernel::TickClock::new();
    let api = ApiAo::<DEFERRED_QUEUE_SIZE>::new(API, DEVICE, clock.clone()).spawn(2);
    let kernel = Kernel::builder()
        .register(client_ao)
        .register(api.clone())
        .build();
    let wheel = TimerWheel::with_clock(kernel.clone(), clock);
    ApiAo::register_timers(&api, &wheel);
    kernel.start();
    kernel.run_until_idle();

    ApiOnlyRig {
        kernel,
        wheel,
        api,
        observed,
    }
}

impl<const DEFER: usize> ChainRig<DEFER> {
    pub fn enable(&self) {
        self.kernel
            .post(API, Event::new(signals::API_ENABLE))
            .unwrap();
        self.kernel.run_until_idle();
    }

    pub fn post_read(&self, request_id: u32, reg: u8, len: usize) {
        let req = ApiReadRequest {
            reply: ReplyableRequest::new(CLIENT, request_id),
            reg,
            len,
        };
        self.kernel
            .post(API, Event::with_payload(signals::API_READ, req))
            .unwrap();
    }

    pub fn post_write(&self, request_id: u32, reg: u8, data: &[u8]) {
        let req = ApiWriteRequest {
            reply: ReplyableRequest::new(CLIENT, request_id),
            reg,
            data: buf(data),
        };
        self.kernel
            .post(API, Event::with_payload(signals::API_WRITE, req))
            .unwrap();
    }
}
