use af_core::{ActiveObjectId, Signal};

use super::collector_ao;
use crate::kernel::Kernel;
use crate::time::{TimeEvent, TimerWheel};

#[test]
fn time_event_fires_after_timeout_ticks() {
    let (ao, probe) = collector_ao(1, 1);
    let kernel = Kernel::builder().register(ao).build();
    kernel.start();

    let wheel = TimerWheel::new(kernel.clone());
    let timer = TimeEvent::new(ActiveObjectId::new(1), Signal(0x10));
    wheel.register(timer.clone());

    timer.arm(3);
    wheel.tick_and_run(2).unwrap();
    assert!(probe.lock().unwrap().is_empty());

    wheel.tick_and_run(1).unwrap();
    assert_eq!(*probe.lock().unwrap(), vec![Signal(0x10)]);
    assert!(!timer.is_armed());
}

#[test]
fn rearming_replaces_the_pending_expiry() {
    let (ao, probe) = collector_ao(1, 1);
    let kernel = Kernel::builder().register(ao).build();
    kernel.start();

    let wheel = TimerWheel::new(kernel.clone());
    let timer = TimeEvent::new(ActiveObjectId::new(1), Signal(0x11));
    wheel.register(timer.clone());

    timer.arm(2);
    wheel.tick_and_run(1).unwrap();
    timer.arm(5);
    wheel.tick_and_run(4).unwrap();
    assert!(probe.lock().unwrap().is_empty());

    wheel.tick_and_run(1).unwrap();
    assert_eq!(probe.lock().unwrap().len(), 1);
}

#[test]
fn disarm_is_a_no_op_when_unarmed() {
    let timer = TimeEvent::new(ActiveObjectId::new(1), Signal(0x12));
    assert!(!timer.is_armed());
    timer.disarm();
    assert!(!timer.is_armed());

    timer.arm(1);
    timer.disarm();
    assert!(!timer.is_armed());
}

#[test]
fn disarmed_timer_never_fires() {
    let (ao, probe) = collector_ao(1, 1);
    let kernel = Kernel::builder().register(ao).build();
    kernel.start();

    let wheel = TimerWheel::new(kernel.clone());
    let timer = TimeEvent::new(ActiveObjectId::new(1), Signal(0x13));
    wheel.register(timer.clone());

    timer.arm(2);
    wheel.tick_and_run(1).unwrap();
    timer.disarm();
    wheel.tick_and_run(5).unwrap();

    assert!(probe.lock().unwrap().is_empty());
}

#[test]
fn periodic_timer_keeps_firing() {
    let (ao, probe) = collector_ao(1, 1);
    let kernel = Kernel::builder().register(ao).build();
    kernel.start();

    let wheel = TimerWheel::new(kernel.clone());
    let timer = TimeEvent::new(ActiveObjectId::new(1), Signal(0x14));
    wheel.register(timer.clone());

    timer.arm_periodic(2, 3);
    wheel.tick_and_run(2).unwrap();
    assert_eq!(probe.lock().unwrap().len(), 1);
    wheel.tick_and_run(3).unwrap();
    assert_eq!(probe.lock().unwrap().len(), 2);
    assert!(timer.is_armed());
}

#[test]
fn wheel_clock_counts_ticks() {
    let (ao, _probe) = collector_ao(1, 1);
    let kernel = Kernel::builder().register(ao).build();
    kernel.start();

    let wheel = TimerWheel::new(kernel.clone());
    let clock = wheel.clock();
    assert_eq!(clock.now(), 0);
    wheel.tick_and_run(7).unwrap();
    assert_eq!(clock.now(), 7);
}
