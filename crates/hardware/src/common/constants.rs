//! Global System Constants.
//!
//! This module defines system-wide constants used across the simulator. It includes:
//! 1. **Memory Constants:** Cache-line and page sizes with their shift amounts.
//! 2. **System Constants:** Core count for the simulated system.
//! 3. **Simulation Constants:** Thresholds and intervals for simulation control.

/// Cache-line (block) size in bytes.
///
/// Every request handled by the memory controller addresses exactly one
/// block; line addresses are physical addresses shifted right by
/// [`LOG2_BLOCK_SIZE`].
pub const BLOCK_SIZE: u64 = 64;

/// Number of bits to shift to convert between byte and line addresses.
pub const LOG2_BLOCK_SIZE: u32 = BLOCK_SIZE.ilog2();

/// Page size in bytes (4KB).
pub const PAGE_SIZE: u64 = 4096;

/// Number of bits to shift to convert between bytes and pages.
pub const LOG2_PAGE_SIZE: u32 = PAGE_SIZE.ilog2();

/// Number of simulated CPU cores feeding the memory system.
pub const NUM_CPUS: usize = 1;

/// Default number of cycles without a completed request (while requests
/// are pending) before the deadlock heartbeat aborts the simulation.
///
/// The worst-case service time of a single request is bounded by the
/// queue depth times the row-conflict latency, a few tens of thousands
/// of cycles under the default configuration; this threshold sits well
/// above it.
pub const HANG_DETECTION_THRESHOLD: u64 = 50_000;

/// Number of cycles between status update messages during long CLI runs.
pub const STATUS_UPDATE_INTERVAL: u64 = 5_000_000;
