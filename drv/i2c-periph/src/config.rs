//! Compile-time configuration for the driver template.

/// 7-bit slave address of the peripheral. Template default; concrete drivers
/// pass their own address to the device AO constructor.
pub const SLAVE_ADDRESS: u8 = 0x48;

/// Main event-queue capacity for each driver AO.
pub const QUEUE_SIZE: usize = 10;

/// Client requests held while the API AO is busy. Overflow is reported to
/// the client as a `QueueFull` error.
pub const DEFERRED_QUEUE_SIZE: usize = 5;

/// Data buffer capacity, sized to the peripheral's register file.
pub const BUFFER_SIZE: usize = 20;

/// Transactions per I2C controller request.
pub const MAX_I2C_TRANSACTIONS: usize = 4;

/// Per-operation watchdog for a dispatched I2C transaction.
pub const LOCKUP_TIME_MS: u32 = 20;

/// Startup watchdogs. The API level waits on the device level, so its bound
/// is the larger one.
pub const DEVICE_INIT_LOCKUP_TIME_MS: u32 = 500;
pub const API_INIT_LOCKUP_TIME_MS: u32 = 1_000;

/// Outer bound on time spent in the busy superstate, regardless of inner
/// progress. Chosen as an absolute maximum: a single-register transaction
/// including timeouts and retries finishes well inside it.
pub const DEVICE_BUSY_TIME_MS: u32 = 100;
pub const API_BUSY_TIME_MS: u32 = 250;

/// Retry budget per operation; crossing it forces the error path.
pub const I2C_ACTIVE_RETRIES: u8 = 10;

/// Power-up debug verbosity threshold for both AOs.
pub const STARTING_DEBUG_LEVEL: u32 = 1;
