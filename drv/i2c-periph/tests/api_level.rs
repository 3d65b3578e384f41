//! Full-chain scenarios: client -> API AO -> device AO -> controller.

mod common;

use af_core::Event;
use common::{buf, chain_rig, generic_errors, replies, reports, Observed, API, DEVICE};
use drv_i2c_periph::api::ApiAo;
use drv_i2c_periph::config::DEFERRED_QUEUE_SIZE;
use drv_i2c_periph::device::DeviceAo;
use drv_i2c_periph::mock::MockAction;
use drv_i2c_periph::signals;
use drv_i2c_periph::{DriverError, DriverStatus, I2cOp, Severity, Subsystem};

#[test]
fn enable_walks_the_chain_and_reports_ready() {
    let rig = chain_rig::<DEFERRED_QUEUE_SIZE>();
    assert!(rig.api.is_in(ApiAo::disabled));

    rig.enable();

    assert!(rig.api.is_in(ApiAo::idle));
    assert!(rig.device.is_in(DeviceAo::idle));
    assert_eq!(rig.api.with_ctx(|a| a.status()), DriverStatus::Enabled);
    assert!(reports(&rig.observed).contains(&"API_READY_REPORT"));
    assert!(!rig.api.with_ctx(|a| a.is_busy()));
}

#[test]
fn round_trip_read_through_the_chain() {
    let rig = chain_rig::<DEFERRED_QUEUE_SIZE>();
    rig.enable();

    rig.mock.enqueue(MockAction::Complete(buf(&[0xAB, 0xCD])));
    rig.post_read(9, 0x10, 2);
    rig.kernel.run_until_idle();

    assert_eq!(
        replies(&rig.observed),
        vec![Observed::ApiResponse {
            request_id: 9,
            op: I2cOp::Read,
            reg: 0x10,
            data: vec![0xAB, 0xCD],
        }]
    );
    assert!(generic_errors(&rig.observed).is_empty());
    assert!(rig.api.is_in(ApiAo::idle));
    assert!(!rig.api.with_ctx(|a| a.is_busy()));
}

#[test]
fn round_trip_write_through_the_chain() {
    let rig = chain_rig::<DEFERRED_QUEUE_SIZE>();
    rig.enable();

    rig.post_write(12, 0x20, &[0x01, 0x02]);
    rig.kernel.run_until_idle();

    assert_eq!(
        replies(&rig.observed),
        vec![Observed::ApiResponse {
            request_id: 12,
            op: I2cOp::Write,
            reg: 0x20,
            data: vec![0x01, 0x02],
        }]
    );
    let seen = rig.mock.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].op, I2cOp::Write);
    assert_eq!(seen[0].tx.as_slice(), &[0x01, 0x02]);
}

#[test]
fn busy_requests_defer_and_recall_in_fifo_order() {
    // Deferral capacity 2 so the fourth request overflows.
    let rig = chain_rig::<2>();
    rig.enable();

    // Keep the first transaction pending so the API AO stays busy.
    rig.mock.enqueue(MockAction::Silent);
    rig.post_read(11, 0x01, 1);
    rig.post_read(12, 0x02, 1);
    rig.post_read(13, 0x03, 1);
    rig.post_read(14, 0x04, 1);
    rig.kernel.run_until_idle();

    assert!(rig.api.with_ctx(|a| a.is_busy()));
    // The overflowing client gets a synchronous rejection; nothing else has
    // completed yet.
    assert_eq!(
        replies(&rig.observed),
        vec![Observed::ApiError {
            request_id: 14,
            error: DriverError::QueueFull,
        }]
    );
    assert_eq!(
        generic_errors(&rig.observed),
        vec![(
            DriverError::QueueFull.code(),
            Severity::Error,
            Subsystem::Api
        )]
    );

    // Complete the stuck transaction: the device retries after its lockup
    // window and the default script answers everything from there.
    rig.wheel.tick_and_run(20).unwrap();

    let completed = replies(&rig.observed);
    assert_eq!(completed.len(), 4);
    let in_order: Vec<u32> = completed
        .iter()
        .filter_map(|o| match o {
            Observed::ApiResponse { request_id, .. } => Some(*request_id),
            _ => None,
        })
        .collect();
    assert_eq!(in_order, vec![11, 12, 13]);
    assert!(rig.api.is_in(ApiAo::idle));
}

#[test]
fn device_error_reply_fails_request_then_chain_goes_fatal() {
    let rig = chain_rig::<DEFERRED_QUEUE_SIZE>();
    rig.enable();

    rig.mock.enqueue(MockAction::Error(0x42));
    rig.post_read(7, 0x04, 1);
    rig.kernel.run_until_idle();

    // The in-flight request fails upward with the bus error...
    assert_eq!(
        replies(&rig.observed),
        vec![Observed::ApiError {
            request_id: 7,
            error: DriverError::I2cError(0x42),
        }]
    );
    // ...and the device's fatal report drags the API level into error.
    assert!(rig.device.is_in(DeviceAo::error));
    assert!(rig.api.is_in(ApiAo::error));
    assert_eq!(rig.api.with_ctx(|a| a.status()), DriverStatus::FatalError);
    assert_eq!(
        rig.api.with_ctx(|a| a.last_error()),
        Some(DriverError::DeviceUnavailable)
    );
    assert!(reports(&rig.observed).contains(&"API_ERROR_REPORT"));

    // Terminal until an explicit enable restarts both layers.
    rig.post_read(8, 0x04, 1);
    rig.kernel.run_until_idle();
    assert_eq!(replies(&rig.observed).len(), 1);

    rig.enable();
    assert!(rig.api.is_in(ApiAo::idle));
    assert!(rig.device.is_in(DeviceAo::idle));
}

#[test]
fn busy_watchdog_frees_a_wedged_request() {
    let rig = chain_rig::<DEFERRED_QUEUE_SIZE>();
    rig.enable();

    // Disable the device level underneath the API level; forwarded requests
    // now vanish without a reply.
    rig.kernel
        .post(DEVICE, Event::new(signals::DEVICE_DISABLE))
        .unwrap();
    rig.kernel.run_until_idle();
    assert!(rig.device.is_in(DeviceAo::disabled));
    assert!(rig.api.is_in(ApiAo::idle));

    rig.post_read(21, 0x01, 1);
    rig.kernel.run_until_idle();
    assert!(rig.api.with_ctx(|a| a.is_busy()));

    rig.wheel.tick_and_run(250).unwrap();

    assert_eq!(
        replies(&rig.observed),
        vec![Observed::ApiError {
            request_id: 21,
            error: DriverError::BusyTimeout,
        }]
    );
    assert!(generic_errors(&rig.observed).contains(&(
        DriverError::BusyTimeout.code(),
        Severity::Error,
        Subsystem::Api
    )));
    assert!(rig.api.is_in(ApiAo::idle));
}

#[test]
fn startup_times_out_into_fatal_error_when_the_device_never_answers() {
    // The rig's device id is never registered, so the downward enable is a
    // logged drop and nothing ever reports ready.
    let rig = common::api_only_rig();
    rig.kernel.post(API, Event::new(signals::API_ENABLE)).unwrap();
    rig.kernel.run_until_idle();
    assert!(rig.api.is_in(ApiAo::starting));

    rig.wheel.tick_and_run(1_000).unwrap();

    assert!(rig.api.is_in(ApiAo::error));
    assert_eq!(rig.api.with_ctx(|a| a.status()), DriverStatus::FatalError);
    assert_eq!(
        rig.api.with_ctx(|a| a.last_error()),
        Some(DriverError::ApiTimeout)
    );
    assert!(generic_errors(&rig.observed).contains(&(
        DriverError::ApiTimeout.code(),
        Severity::Error,
        Subsystem::Api
    )));
}

#[test]
fn device_error_report_during_startup_fails_the_enable() {
    let rig = common::api_only_rig();
    rig.kernel.post(API, Event::new(signals::API_ENABLE)).unwrap();
    rig.kernel.run_until_idle();
    assert!(rig.api.is_in(ApiAo::starting));

    // The device level announces a fatal error instead of readiness.
    rig.kernel
        .publish(&Event::new(signals::DEVICE_ERROR_REPORT));
    rig.kernel.run_until_idle();

    assert!(rig.api.is_in(ApiAo::error));
    assert_eq!(
        rig.api.with_ctx(|a| a.last_error()),
        Some(DriverError::DeviceUnavailable)
    );
    assert!(reports(&rig.observed).contains(&"API_ERROR_REPORT"));
}
