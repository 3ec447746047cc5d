//! Configuration and Simulation error definitions.
//!
//! This module defines the error handling for the simulator. It provides:
//! 1. **Configuration Errors:** Fatal inconsistencies detected at controller construction.
//! 2. **Simulation Errors:** Conditions that abort a running simulation, such as the
//!    deadlock heartbeat.
//!
//! Queue-full backpressure is not an error; it is reported through
//! [`EnqueueResult`](crate::mem::controller::EnqueueResult). Invalid addresses are
//! programming errors and panic at the decoder.

use thiserror::Error;

/// Fatal configuration errors detected when a controller is constructed.
///
/// Any of these indicates an inconsistent hardware description; there is no
/// meaningful way to continue, so construction fails instead of producing a
/// controller with undefined address decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The address field widths of one memory kind exceed the addressable space.
    #[error("{kind} address fields plus block offset need {bits} bits; must stay below 64")]
    AddressWidthOverflow {
        /// Memory kind name (`"HBM"` or `"DDR"`).
        kind: &'static str,
        /// Total bits required by the configured field widths.
        bits: u32,
    },

    /// The declared capacity does not match the product of the geometry counts.
    #[error("{kind} geometry covers {derived} bytes but capacity_bytes declares {declared}")]
    CapacityMismatch {
        /// Memory kind name (`"HBM"` or `"DDR"`).
        kind: &'static str,
        /// Capacity derived from channels x ranks x banks x rows x columns x block size.
        derived: u64,
        /// Capacity declared in the configuration.
        declared: u64,
    },

    /// A geometry count is not a power of two, so shift/mask decoding cannot
    /// cover the address space exactly.
    #[error("{kind} {field} count {count} is not a power of two")]
    NotPowerOfTwo {
        /// Memory kind name (`"HBM"` or `"DDR"`).
        kind: &'static str,
        /// Field name (e.g. `"banks"`).
        field: &'static str,
        /// Offending count.
        count: u64,
    },

    /// Both memory kinds are configured with zero capacity.
    #[error("at least one of HBM and DDR must have nonzero capacity")]
    NoMemory,

    /// A request queue is configured with zero entries.
    #[error("{queue} queue size must be nonzero")]
    ZeroQueue {
        /// Queue name (`"read"` or `"write"`).
        queue: &'static str,
    },

    /// The write watermarks are not ordered `low < high <= wq_size`.
    #[error("write watermarks out of order: low {low} must be below high {high}, high at most {wq_size}")]
    WatermarkOrder {
        /// Low (exit) watermark.
        low: usize,
        /// High (entry) watermark.
        high: usize,
        /// Write queue capacity.
        wq_size: usize,
    },

    /// The DRAM I/O frequency is zero.
    #[error("io frequency must be nonzero")]
    ZeroFrequency,

    /// The channel width does not divide the block size, so the burst length
    /// is not a whole number of transfers.
    #[error("channel width {width} bytes must divide the {block} byte block size")]
    ChannelWidth {
        /// Configured channel width in bytes.
        width: u64,
        /// Block size in bytes.
        block: u64,
    },
}

/// Errors that abort a running simulation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// The deadlock heartbeat fired: requests are pending but none completed
    /// for the configured number of cycles. Per-channel state has been dumped
    /// through `tracing::error!` before this is returned.
    #[error("no forward progress for {stalled} cycles at cycle {cycle} with {pending} requests pending")]
    Deadlock {
        /// Cycle at which the heartbeat fired.
        cycle: u64,
        /// Number of cycles without a completion.
        stalled: u64,
        /// Requests sitting in queues when the heartbeat fired.
        pending: usize,
    },
}
