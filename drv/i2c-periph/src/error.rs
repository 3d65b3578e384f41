//! Error kinds observed by the driver state machines.

use thiserror::Error;

/// Everything the two HSMs can report. Hardware-level detail beyond the HAL
/// code is deliberately out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DriverError {
    /// No reply from the I2C controller inside the lockup window, retries
    /// exhausted.
    #[error("i2c transaction timed out")]
    I2cTimeout,
    /// The controller reported a bus error with the given HAL code.
    #[error("i2c bus error (hal code {0:#x})")]
    I2cError(i32),
    /// A reply's echoed id did not match the in-flight transaction. Warning
    /// only; the reply is discarded.
    #[error("mismatched response id")]
    MismatchRespId,
    /// A request arrived while a transaction was already in flight.
    #[error("device busy")]
    Busy,
    /// The deferral queue overflowed; the request was not accepted.
    #[error("deferral queue full")]
    QueueFull,
    /// The busy-state watchdog expired.
    #[error("busy state timed out")]
    BusyTimeout,
    /// The device level reported a fatal error during API startup or
    /// operation.
    #[error("device level unavailable")]
    DeviceUnavailable,
    /// The API level's startup watchdog expired.
    #[error("api level timed out")]
    ApiTimeout,
}

impl DriverError {
    /// Stable numeric code carried in published error reports. `I2cError`
    /// forwards the HAL code unchanged.
    pub const fn code(self) -> i32 {
        match self {
            DriverError::I2cTimeout => 0x11,
            DriverError::I2cError(hal) => hal,
            DriverError::MismatchRespId => 0x12,
            DriverError::Busy => 0x13,
            DriverError::QueueFull => 0x14,
            DriverError::BusyTimeout => 0x15,
            DriverError::DeviceUnavailable => 0x16,
            DriverError::ApiTimeout => 0x17,
        }
    }
}

/// How bad a published error is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// Which driver layer published an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    Device,
    Api,
}

/// Payload of the published `GENERIC_ERROR_REPORT` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericError {
    pub code: i32,
    pub ao_name: &'static str,
    pub severity: Severity,
    pub subsystem: Subsystem,
    pub extra: u32,
}
