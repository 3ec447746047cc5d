//! Hybrid memory-system simulator library.
//!
//! This crate implements a cycle-accurate simulator for a hybrid memory
//! system with the following:
//! 1. **Address space:** One flat physical space shared by an on-package HBM
//!    region and an off-chip DDR region, HBM first.
//! 2. **Controller:** Per-channel read/write queues, bank request tables with
//!    open-page row buffers, FR-FCFS scheduling restricted by a
//!    watermark-driven read/write mode, and a single-holder data bus.
//! 3. **Timing:** Picosecond DRAM parameters (tRP, tRCD, tCAS, bus
//!    turnaround) derived once into integer cycle counts.
//! 4. **Simulation:** An `Operable` clock substrate, an owning `Simulator`
//!    with a deadlock heartbeat, and structured statistics.

/// Common types and constants (addresses, errors, block size).
pub mod common;
/// Simulator configuration (defaults, hierarchical config structures).
pub mod config;
/// The memory system: decoder, queues, banks, channels, controller facade.
pub mod mem;
/// Simulation driving: `Operable` trait and `Simulator`.
pub mod sim;
/// Statistics collection (per-channel counters, service accounting).
pub mod stats;

/// Root configuration type; use `MemoryConfig::default()` or deserialize from JSON.
pub use crate::config::MemoryConfig;
/// The hybrid controller; construct with `MemoryController::new`.
pub use crate::mem::controller::MemoryController;
/// Top-level simulator; owns the controller and the cycle base.
pub use crate::sim::simulator::Simulator;
