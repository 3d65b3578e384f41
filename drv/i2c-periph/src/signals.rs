//! Signal vocabulary shared by the driver AOs, their clients, and the I2C
//! controller.
//!
//! Public signals are allocated sequentially from [`Signal::USER`]. Each AO
//! additionally uses a handful of local signals (timer expiries and
//! self-posted actions) numbered from [`LOCAL_SIG_BASE`]; local events never
//! leave the owning AO's queue, so the two AOs may reuse the same values.

use af_core::Signal;

const fn user(steps: u16) -> Signal {
    Signal::USER.offset(steps)
}

// Device-level AO, inbound.
pub const DEVICE_ENABLE: Signal = user(0);
pub const DEVICE_DISABLE: Signal = user(1);
pub const DEVICE_READ: Signal = user(2);
pub const DEVICE_WRITE: Signal = user(3);
pub const DEVICE_REQ_STATUS: Signal = user(4);
pub const DEVICE_STOP: Signal = user(5);

// Device-level AO, outbound (published status or correlated replies).
pub const DEVICE_READY_REPORT: Signal = user(6);
pub const DEVICE_DISABLE_REPORT: Signal = user(7);
pub const DEVICE_ERROR_REPORT: Signal = user(8);
pub const DEVICE_RESPONSE: Signal = user(9);
pub const DEVICE_ERROR_REPLY: Signal = user(10);

// API-level AO, inbound.
pub const API_ENABLE: Signal = user(11);
pub const API_DISABLE: Signal = user(12);
pub const API_READ: Signal = user(13);
pub const API_WRITE: Signal = user(14);
pub const API_REQ_STATUS: Signal = user(15);

// API-level AO, outbound.
pub const API_READY_REPORT: Signal = user(16);
pub const API_DISABLE_REPORT: Signal = user(17);
pub const API_ERROR_REPORT: Signal = user(18);
pub const API_RESPONSE: Signal = user(19);
pub const API_ERROR_REPLY: Signal = user(20);

// I2C controller collaborator.
pub const I2C_COMM_REQUEST: Signal = user(21);
pub const I2C_COMM_COMPLETE: Signal = user(22);
pub const I2C_COMM_ERROR: Signal = user(23);
pub const I2C_BUS_STATUS: Signal = user(24);

// Observability.
pub const GENERIC_ERROR_REPORT: Signal = user(25);
pub const DEBUG_LEVEL: Signal = user(26);

/// First signal value available for AO-local use.
pub const LOCAL_SIG_BASE: Signal = user(27);

/// Human-readable name for a public signal, for log output.
pub fn signal_name(signal: Signal) -> &'static str {
    match signal {
        DEVICE_ENABLE => "DEVICE_ENABLE",
        DEVICE_DISABLE => "DEVICE_DISABLE",
        DEVICE_READ => "DEVICE_READ",
        DEVICE_WRITE => "DEVICE_WRITE",
        DEVICE_REQ_STATUS => "DEVICE_REQ_STATUS",
        DEVICE_STOP => "DEVICE_STOP",
        DEVICE_READY_REPORT => "DEVICE_READY_REPORT",
        DEVICE_DISABLE_REPORT => "DEVICE_DISABLE_REPORT",
        DEVICE_ERROR_REPORT => "DEVICE_ERROR_REPORT",
        DEVICE_RESPONSE => "DEVICE_RESPONSE",
        DEVICE_ERROR_REPLY => "DEVICE_ERROR_REPLY",
        API_ENABLE => "API_ENABLE",
        API_DISABLE => "API_DISABLE",
        API_READ => "API_READ",
        API_WRITE => "API_WRITE",
        API_REQ_STATUS => "API_REQ_STATUS",
        API_READY_REPORT => "API_READY_REPORT",
        API_DISABLE_REPORT => "API_DISABLE_REPORT",
        API_ERROR_REPORT => "API_ERROR_REPORT",
        API_RESPONSE => "API_RESPONSE",
        API_ERROR_REPLY => "API_ERROR_REPLY",
        I2C_COMM_REQUEST => "I2C_COMM_REQUEST",
        I2C_COMM_COMPLETE => "I2C_COMM_COMPLETE",
        I2C_COMM_ERROR => "I2C_COMM_ERROR",
        I2C_BUS_STATUS => "I2C_BUS_STATUS",
        GENERIC_ERROR_REPORT => "GENERIC_ERROR_REPORT",
        DEBUG_LEVEL => "DEBUG_LEVEL",
        _ => "UNKNOWN",
    }
}
