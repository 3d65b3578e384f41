//! Loopback demo for the two-layer I2C driver template.
//!
//! Wires a client, the API and device driver AOs, and the scripted controller
//! onto one cooperative kernel, then runs an enable / read / write sequence
//! and prints what comes back. Run with `RUST_LOG=debug` to watch the state
//! machines talk.

use std::sync::{Arc, Mutex};

use anyhow::Result;

use af_core::{ActiveObjectId, Event, ReplyableRequest};
use af_kernel::{ActiveBehavior, ActiveObject, AoPort, Behavior, Kernel, TickClock, TimerWheel};
use drv_i2c_periph::api::ApiAo;
use drv_i2c_periph::config::{DEFERRED_QUEUE_SIZE, SLAVE_ADDRESS};
use drv_i2c_periph::device::DeviceAo;
use drv_i2c_periph::mock::{MockAction, MockController};
use drv_i2c_periph::signals;
use drv_i2c_periph::{ApiErrorReply, ApiReadRequest, ApiResponse, ApiWriteRequest, DataBuf};

const CLIENT: ActiveObjectId = ActiveObjectId::new(1);
const API: ActiveObjectId = ActiveObjectId::new(2);
const DEVICE: ActiveObjectId = ActiveObjectId::new(3);
const I2C: ActiveObjectId = ActiveObjectId::new(4);

/// Demo client: fires requests and prints every reply it receives.
struct DemoClient {
    port: AoPort,
    completed: Arc<Mutex<u32>>,
}

impl Behavior for DemoClient {
    fn port(&self) -> &AoPort {
        &self.port
    }
}

impl ActiveBehavior for DemoClient {
    fn on_start(&mut self) {
        for signal in [signals::API_READY_REPORT, signals::GENERIC_ERROR_REPORT] {
            if let Err(err) = self.port.subscribe(signal) {
                log::warn!("demo client: subscribe failed: {err}");
            }
        }
    }

    fn on_event(&mut self, event: &Event) {
        match event.signal() {
            signals::API_READY_REPORT => println!("client: api driver reports ready"),
            signals::API_RESPONSE => {
                if let Some(rsp) = event.payload::<ApiResponse>() {
                    println!(
                        "client: request {} completed, {:?} reg {:#04x} data {:02x?}",
                        rsp.reply.request_id,
                        rsp.op,
                        rsp.buffer.reg,
                        rsp.buffer.data.as_slice()
                    );
                    *self.completed.lock().unwrap() += 1;
                }
            }
            signals::API_ERROR_REPLY => {
                if let Some(rsp) = event.payload::<ApiErrorReply>() {
                    println!(
                        "client: request {} failed: {}",
                        rsp.reply.request_id, rsp.error
                    );
                }
            }
            signals::GENERIC_ERROR_REPORT => {
                if let Some(err) = event.payload::<drv_i2c_periph::GenericError>() {
                    println!(
                        "client: {} reported error code {:#04x} ({:?})",
                        err.ao_name, err.code, err.severity
                    );
                }
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let completed = Arc::new(Mutex::new(0u32));
    let client = DemoClient {
        port: AoPort::new(CLIENT),
        completed: completed.clone(),
    };
    let client_ao = ActiveObject::<_, 10>::new(1, client);

    let (mock, script) = MockController::new(I2C);
    let mock_ao = mock.spawn(4);
    let device = DeviceAo::new(DEVICE, I2C, SLAVE_ADDRESS).spawn(3);

    let clock = TickClock::new();
    let api = ApiAo::<DEFERRED_QUEUE_SIZE>::new(API, DEVICE, clock.clone()).spawn(2);

    let kernel = Kernel::builder()
        .register(client_ao)
        .register(api.clone())
        .register(device.clone())
        .register(mock_ao)
        .build();
    let wheel = TimerWheel::with_clock(kernel.clone(), clock);
    DeviceAo::register_timers(&device, &wheel);
    ApiAo::register_timers(&api, &wheel);
    kernel.start();
    kernel.run_until_idle();

    println!("enabling the driver chain...");
    kernel.post(API, Event::new(signals::API_ENABLE))?;
    kernel.run_until_idle();

    // A register read answered with two bytes of "sensor" data.
    script.enqueue(MockAction::Complete(
        DataBuf::from_slice(&[0xAB, 0xCD]).expect("fits"),
    ));
    kernel.post(
        API,
        Event::with_payload(
            signals::API_READ,
            ApiReadRequest {
                reply: ReplyableRequest::new(CLIENT, 1),
                reg: 0x10,
                len: 2,
            },
        ),
    )?;
    kernel.run_until_idle();

    // A register write; the first attempt is swallowed so the retry path
    // shows up in the debug log.
    script.enqueue(MockAction::Silent);
    kernel.post(
        API,
        Event::with_payload(
            signals::API_WRITE,
            ApiWriteRequest {
                reply: ReplyableRequest::new(CLIENT, 2),
                reg: 0x20,
                data: DataBuf::from_slice(&[0x5A]).expect("fits"),
            },
        ),
    )?;
    kernel.run_until_idle();
    wheel.tick_and_run(25)?;

    let done = *completed.lock().unwrap();
    println!(
        "done: {done} request(s) completed, controller saw {} transaction(s)",
        script.seen_count()
    );
    api.with_ctx(|a| {
        let counts = a.active_counts();
        println!(
            "api timings: {} idle tick(s), {} busy tick(s), {} busy spell(s)",
            counts.idle_ticks, counts.busy_ticks, counts.busy_entries
        );
    });
    Ok(())
}
