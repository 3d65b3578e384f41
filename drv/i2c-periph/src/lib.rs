//! # drv-i2c-periph
//!
//! Two-layer driver template for an I2C-attached peripheral, built as a pair
//! of active objects on the `af-kernel` cooperative scheduler.
//!
//! The low-level [`device`] AO owns the I2C transaction lifecycle against a
//! single slave address: it serializes one transaction at a time, enforces a
//! timeout-and-retry discipline, and reports completion to the requester
//! through an id-correlated reply. The high-level [`api`] AO mirrors the
//! device lifecycle, presents the enable/disable/read/write/status contract
//! to the rest of the firmware, and defers client requests that arrive while
//! a transaction is in flight.
//!
//! Both state machines share the same skeleton rooted at a backstop
//! superstate:
//!
//! ```text
//! backstop
//! |-- disabled
//! |-- starting
//! |-- error
//! `-- enabled
//!     |-- idle
//!     `-- busy
//!         |-- read   (device only)
//!         `-- write  (device only)
//! ```
//!
//! The backstop catches status queries, debug-level updates, the
//! unconditional disable, and unknown signals (logged and dropped, never
//! fatal). All waiting is modeled as a state with an armed time event; no
//! handler blocks.

pub mod api;
pub mod config;
pub mod device;
pub mod error;
pub mod events;
mod retry;
pub mod signals;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{DriverError, GenericError, Severity, Subsystem};
pub use events::{
    ApiErrorReply, ApiReadRequest, ApiResponse, ApiWriteRequest, BusId, DataBuf,
    DeviceErrorReply, DeviceReadRequest, DeviceResponse, DeviceWriteRequest, DebugLevel,
    I2cBusStatus, I2cBusStatusEvent, I2cCommComplete, I2cCommError, I2cCommRequest, I2cOp,
    I2cTransaction, RegAddrMode, TransferBuffer,
};

/// Driver lifecycle status shared by both active objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverStatus {
    #[default]
    Unknown,
    Disabled,
    Enabled,
    FatalError,
}

/// Gate a debug message on the owning AO's verbosity threshold. A message at
/// level N is emitted only when N is at or below the AO's current
/// `debug_level`, which the `DEBUG_LEVEL` signal updates at runtime.
macro_rules! debug_out {
    ($me:expr, $lvl:expr, $($arg:tt)*) => {
        if $lvl <= $me.debug_level {
            log::debug!($($arg)*);
        }
    };
}
pub(crate) use debug_out;
