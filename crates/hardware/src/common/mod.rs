//! Common types and constants shared across the simulator.

/// Physical and line address newtypes.
pub mod addr;
/// System-wide constants (block size, page size, simulation thresholds).
pub mod constants;
/// Configuration and simulation error types.
pub mod error;

pub use addr::{LineAddr, PhysAddr};
pub use error::{ConfigError, SimError};
