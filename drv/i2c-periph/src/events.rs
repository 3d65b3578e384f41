//! Event payloads exchanged between clients, the driver AOs, and the I2C
//! controller.
//!
//! Transactional payloads embed a [`ReplyableRequest`] or
//! [`ReplyableResponse`] header; replies echo the request id so stale replies
//! from retried or timed-out transactions can be discarded by id comparison.

use af_core::{ReplyableRequest, ReplyableResponse};
use heapless::Vec;

use crate::config::{BUFFER_SIZE, MAX_I2C_TRANSACTIONS};
use crate::error::DriverError;

/// Data buffer sized to the peripheral's register file.
pub type DataBuf = Vec<u8, BUFFER_SIZE>;

/// Direction of an I2C transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum I2cOp {
    #[default]
    Read,
    Write,
}

/// Buffer descriptor: a register address plus the bytes moved to or from it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransferBuffer {
    pub reg: u8,
    pub data: DataBuf,
}

/// Raise or lower the receiving AO's debug verbosity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugLevel {
    pub new_level: u32,
}

// ---------------------------------------------------------------------------
// Device-level AO contract
// ---------------------------------------------------------------------------

/// Read `len` bytes starting at register `reg`.
#[derive(Debug, Clone)]
pub struct DeviceReadRequest {
    pub reply: ReplyableRequest,
    pub reg: u8,
    pub len: usize,
}

/// Write `data` starting at register `reg`.
#[derive(Debug, Clone)]
pub struct DeviceWriteRequest {
    pub reply: ReplyableRequest,
    pub reg: u8,
    pub data: DataBuf,
}

/// Successful completion of a device-level request, posted back to the
/// original requester with its request id echoed.
#[derive(Debug, Clone)]
pub struct DeviceResponse {
    pub reply: ReplyableResponse,
    pub op: I2cOp,
    pub buffer: TransferBuffer,
}

/// Failed completion of a device-level request.
#[derive(Debug, Clone)]
pub struct DeviceErrorReply {
    pub reply: ReplyableResponse,
    pub error: DriverError,
}

// ---------------------------------------------------------------------------
// API-level AO contract
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ApiReadRequest {
    pub reply: ReplyableRequest,
    pub reg: u8,
    pub len: usize,
}

#[derive(Debug, Clone)]
pub struct ApiWriteRequest {
    pub reply: ReplyableRequest,
    pub reg: u8,
    pub data: DataBuf,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub reply: ReplyableResponse,
    pub op: I2cOp,
    pub buffer: TransferBuffer,
}

#[derive(Debug, Clone)]
pub struct ApiErrorReply {
    pub reply: ReplyableResponse,
    pub error: DriverError,
}

// ---------------------------------------------------------------------------
// I2C controller collaborator contract
// ---------------------------------------------------------------------------

/// Which physical bus the controller should drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusId {
    Internal,
    External,
}

/// Whether a transaction addresses a device register first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegAddrMode {
    UseRegAddr,
    NoRegAddr,
}

/// One transfer within a controller request.
#[derive(Debug, Clone)]
pub struct I2cTransaction {
    pub reg_addr_mode: RegAddrMode,
    pub op: I2cOp,
    pub reg_addr: u8,
    /// Bytes to send for a write; empty for a read.
    pub tx: DataBuf,
    /// Bytes expected back for a read; zero for a write.
    pub rx_len: usize,
    pub nak_expected: bool,
}

/// Replyable request posted to the I2C controller AO.
#[derive(Debug, Clone)]
pub struct I2cCommRequest {
    pub reply: ReplyableRequest,
    pub bus: BusId,
    pub addr: u8,
    pub transactions: Vec<I2cTransaction, MAX_I2C_TRANSACTIONS>,
}

/// Controller completion reply. Read-back bytes travel in the reply.
#[derive(Debug, Clone)]
pub struct I2cCommComplete {
    pub reply: ReplyableResponse,
    pub data: DataBuf,
}

/// Controller error reply carrying the HAL error code.
#[derive(Debug, Clone)]
pub struct I2cCommError {
    pub reply: ReplyableResponse,
    pub hal_error: i32,
}

/// Published bus readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cBusStatus {
    NoneReady,
    InternalOnlyReady,
    ExternalOnlyReady,
    BothReady,
}

/// Payload of the published `I2C_BUS_STATUS` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cBusStatusEvent {
    pub status: I2cBusStatus,
}

impl I2cBusStatus {
    /// True when the internal bus (the one this template drives) is usable.
    pub fn internal_ready(self) -> bool {
        matches!(self, I2cBusStatus::InternalOnlyReady | I2cBusStatus::BothReady)
    }
}
