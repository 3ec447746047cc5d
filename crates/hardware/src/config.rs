//! Configuration system for the memory-system simulator.
//!
//! This module defines all configuration structures used to parameterize the
//! controller. It provides:
//! 1. **Defaults:** Baseline hardware constants (HBM and DDR geometry, DRAM timing, queues).
//! 2. **Structures:** Hierarchical config for the two memory kinds, timing, and queues.
//! 3. **JSON surface:** Deserialization through serde for driver programs.
//!
//! Validation happens at controller construction, not at deserialization: an
//! inconsistent geometry is a fatal [`ConfigError`](crate::common::ConfigError)
//! from [`MemoryController::new`](crate::mem::controller::MemoryController::new).

use serde::Deserialize;

/// Default configuration constants for the simulator.
///
/// These values describe a 256 MiB on-package HBM region in front of a
/// 1 GiB off-chip DDR region, both on a 3200 MHz I/O clock.
mod defaults {
    /// Number of independent HBM channels.
    pub const HBM_CHANNELS: u64 = 8;

    /// Banks per HBM channel (HBM has no rank level).
    pub const HBM_BANKS: u64 = 8;

    /// Rows per HBM bank.
    pub const HBM_ROWS: u64 = 1024;

    /// Cache-line columns per HBM row.
    pub const HBM_COLUMNS: u64 = 64;

    /// Total HBM capacity in bytes (256 MiB).
    ///
    /// Must equal channels x banks x rows x columns x block size; a
    /// mismatch is a fatal configuration error.
    pub const HBM_CAPACITY: u64 = 256 * 1024 * 1024;

    /// Number of independent DDR channels.
    pub const DDR_CHANNELS: u64 = 1;

    /// Ranks per DDR channel.
    pub const DDR_RANKS: u64 = 1;

    /// Banks per DDR rank.
    pub const DDR_BANKS: u64 = 8;

    /// Rows per DDR bank.
    pub const DDR_ROWS: u64 = 32768;

    /// Cache-line columns per DDR row.
    pub const DDR_COLUMNS: u64 = 64;

    /// Total DDR capacity in bytes (1 GiB).
    pub const DDR_CAPACITY: u64 = 1024 * 1024 * 1024;

    /// DRAM I/O frequency in MHz. 3200 MHz corresponds to DDR5-class parts.
    pub const DRAM_IO_FREQ: u64 = 3200;

    /// Data-bus width of one channel in bytes.
    ///
    /// A 64-byte line streams out in `64 / 8 = 8` bus cycles.
    pub const DRAM_CHANNEL_WIDTH: u64 = 8;

    /// Precharge latency in picoseconds (12.5 ns).
    pub const T_RP_PS: u64 = 12_500;

    /// Row-activate latency in picoseconds (12.5 ns).
    pub const T_RCD_PS: u64 = 12_500;

    /// Column-access latency in picoseconds (12.5 ns).
    pub const T_CAS_PS: u64 = 12_500;

    /// Read/write bus turnaround penalty in picoseconds (7.5 ns).
    pub const DBUS_TURN_AROUND_PS: u64 = 7_500;

    /// Read queue entries per channel.
    pub const DRAM_RQ_SIZE: usize = 64;

    /// Write queue entries per channel.
    pub const DRAM_WQ_SIZE: usize = 64;
}

/// Root configuration for the memory system.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use hmsim_core::config::MemoryConfig;
///
/// let config = MemoryConfig::default();
/// assert_eq!(config.hbm.channels, 8);
/// assert_eq!(config.queues.wq_size, 64);
/// ```
///
/// Deserializing from JSON (any field may be omitted to take its default):
///
/// ```
/// use hmsim_core::config::MemoryConfig;
///
/// let json = r#"{
///     "hbm": { "capacity_bytes": 0 },
///     "ddr": {
///         "channels": 2,
///         "ranks": 1,
///         "banks": 8,
///         "rows": 32768,
///         "columns": 64,
///         "capacity_bytes": 2147483648
///     },
///     "timing": { "io_freq_mhz": 1600 },
///     "queues": { "rq_size": 32, "wq_size": 32 }
/// }"#;
///
/// let config = MemoryConfig::from_json(json).unwrap();
/// assert_eq!(config.ddr.channels, 2);
/// assert_eq!(config.timing.io_freq_mhz, 1600);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemoryConfig {
    /// On-package HBM region (decoded first; the flat address space starts here).
    #[serde(default)]
    pub hbm: HbmConfig,
    /// Off-chip DDR region (addresses at and above the HBM capacity).
    #[serde(default)]
    pub ddr: DdrConfig,
    /// DRAM timing parameters and I/O frequency.
    #[serde(default)]
    pub timing: TimingConfig,
    /// Per-channel queue sizes and write-burst watermarks.
    #[serde(default)]
    pub queues: QueueConfig,
}

impl MemoryConfig {
    /// Parses a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error when the document is
    /// malformed. Semantic validation happens later, at controller
    /// construction.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Geometry of the HBM region.
///
/// HBM has no rank level; a channel is divided directly into banks.
/// Setting `capacity_bytes` to zero disables the region entirely, which
/// turns the hybrid controller into a plain DDR controller.
#[derive(Debug, Clone, Deserialize)]
pub struct HbmConfig {
    /// Number of independent channels.
    #[serde(default = "HbmConfig::default_channels")]
    pub channels: u64,

    /// Banks per channel.
    #[serde(default = "HbmConfig::default_banks")]
    pub banks: u64,

    /// Rows per bank.
    #[serde(default = "HbmConfig::default_rows")]
    pub rows: u64,

    /// Cache-line columns per row.
    #[serde(default = "HbmConfig::default_columns")]
    pub columns: u64,

    /// Total capacity in bytes; zero disables the region.
    #[serde(default = "HbmConfig::default_capacity")]
    pub capacity_bytes: u64,
}

impl HbmConfig {
    /// Returns the default HBM channel count.
    fn default_channels() -> u64 {
        defaults::HBM_CHANNELS
    }

    /// Returns the default HBM banks per channel.
    fn default_banks() -> u64 {
        defaults::HBM_BANKS
    }

    /// Returns the default HBM rows per bank.
    fn default_rows() -> u64 {
        defaults::HBM_ROWS
    }

    /// Returns the default HBM columns per row.
    fn default_columns() -> u64 {
        defaults::HBM_COLUMNS
    }

    /// Returns the default HBM capacity in bytes.
    fn default_capacity() -> u64 {
        defaults::HBM_CAPACITY
    }
}

impl Default for HbmConfig {
    fn default() -> Self {
        Self {
            channels: defaults::HBM_CHANNELS,
            banks: defaults::HBM_BANKS,
            rows: defaults::HBM_ROWS,
            columns: defaults::HBM_COLUMNS,
            capacity_bytes: defaults::HBM_CAPACITY,
        }
    }
}

/// Geometry of the DDR region.
///
/// Setting `capacity_bytes` to zero disables the region, leaving an
/// HBM-only system.
#[derive(Debug, Clone, Deserialize)]
pub struct DdrConfig {
    /// Number of independent channels.
    #[serde(default = "DdrConfig::default_channels")]
    pub channels: u64,

    /// Ranks per channel.
    #[serde(default = "DdrConfig::default_ranks")]
    pub ranks: u64,

    /// Banks per rank.
    #[serde(default = "DdrConfig::default_banks")]
    pub banks: u64,

    /// Rows per bank.
    #[serde(default = "DdrConfig::default_rows")]
    pub rows: u64,

    /// Cache-line columns per row.
    #[serde(default = "DdrConfig::default_columns")]
    pub columns: u64,

    /// Total capacity in bytes; zero disables the region.
    #[serde(default = "DdrConfig::default_capacity")]
    pub capacity_bytes: u64,
}

impl DdrConfig {
    /// Returns the default DDR channel count.
    fn default_channels() -> u64 {
        defaults::DDR_CHANNELS
    }

    /// Returns the default DDR ranks per channel.
    fn default_ranks() -> u64 {
        defaults::DDR_RANKS
    }

    /// Returns the default DDR banks per rank.
    fn default_banks() -> u64 {
        defaults::DDR_BANKS
    }

    /// Returns the default DDR rows per bank.
    fn default_rows() -> u64 {
        defaults::DDR_ROWS
    }

    /// Returns the default DDR columns per row.
    fn default_columns() -> u64 {
        defaults::DDR_COLUMNS
    }

    /// Returns the default DDR capacity in bytes.
    fn default_capacity() -> u64 {
        defaults::DDR_CAPACITY
    }
}

impl Default for DdrConfig {
    fn default() -> Self {
        Self {
            channels: defaults::DDR_CHANNELS,
            ranks: defaults::DDR_RANKS,
            banks: defaults::DDR_BANKS,
            rows: defaults::DDR_ROWS,
            columns: defaults::DDR_COLUMNS,
            capacity_bytes: defaults::DDR_CAPACITY,
        }
    }
}

/// DRAM timing parameters.
///
/// Latencies are carried as integer picoseconds so that the cycle
/// derivation in [`DramTiming`](crate::mem::timing::DramTiming) is exact
/// integer arithmetic; `12.5 ns` is written `12_500`.
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    /// I/O clock frequency in MHz.
    #[serde(default = "TimingConfig::default_io_freq")]
    pub io_freq_mhz: u64,

    /// Data-bus width of one channel in bytes.
    #[serde(default = "TimingConfig::default_channel_width")]
    pub channel_width_bytes: u64,

    /// Precharge latency (tRP) in picoseconds.
    #[serde(default = "TimingConfig::default_t_rp")]
    pub t_rp_ps: u64,

    /// Row-activate latency (tRCD) in picoseconds.
    #[serde(default = "TimingConfig::default_t_rcd")]
    pub t_rcd_ps: u64,

    /// Column-access latency (tCAS) in picoseconds.
    #[serde(default = "TimingConfig::default_t_cas")]
    pub t_cas_ps: u64,

    /// Read/write data-bus turnaround penalty in picoseconds.
    #[serde(default = "TimingConfig::default_turn_around")]
    pub turn_around_ps: u64,
}

impl TimingConfig {
    /// Returns the default I/O frequency in MHz.
    fn default_io_freq() -> u64 {
        defaults::DRAM_IO_FREQ
    }

    /// Returns the default channel width in bytes.
    fn default_channel_width() -> u64 {
        defaults::DRAM_CHANNEL_WIDTH
    }

    /// Returns the default precharge latency in picoseconds.
    fn default_t_rp() -> u64 {
        defaults::T_RP_PS
    }

    /// Returns the default activate latency in picoseconds.
    fn default_t_rcd() -> u64 {
        defaults::T_RCD_PS
    }

    /// Returns the default column-access latency in picoseconds.
    fn default_t_cas() -> u64 {
        defaults::T_CAS_PS
    }

    /// Returns the default bus turnaround penalty in picoseconds.
    fn default_turn_around() -> u64 {
        defaults::DBUS_TURN_AROUND_PS
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            io_freq_mhz: defaults::DRAM_IO_FREQ,
            channel_width_bytes: defaults::DRAM_CHANNEL_WIDTH,
            t_rp_ps: defaults::T_RP_PS,
            t_rcd_ps: defaults::T_RCD_PS,
            t_cas_ps: defaults::T_CAS_PS,
            turn_around_ps: defaults::DBUS_TURN_AROUND_PS,
        }
    }
}

/// Per-channel queue sizes and write-burst watermarks.
///
/// The watermarks default to the classic fractions of the write-queue
/// size (enter at 7/8 full, leave below 6/8, drain at least 1/4 per
/// burst) but are exposed as independent knobs so that hysteresis
/// behavior can be tested directly.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Read queue entries per channel.
    #[serde(default = "QueueConfig::default_rq_size")]
    pub rq_size: usize,

    /// Write queue entries per channel.
    #[serde(default = "QueueConfig::default_wq_size")]
    pub wq_size: usize,

    /// Occupancy at which a channel enters write mode; defaults to
    /// `wq_size * 7 / 8`.
    #[serde(default)]
    pub write_high_wm: Option<usize>,

    /// Occupancy below which a channel may leave write mode; defaults to
    /// `wq_size * 6 / 8`.
    #[serde(default)]
    pub write_low_wm: Option<usize>,

    /// Minimum writes drained per burst before leaving write mode while
    /// writes remain; defaults to `wq_size / 4`.
    #[serde(default)]
    pub min_writes_per_switch: Option<usize>,
}

impl QueueConfig {
    /// Returns the default read queue size.
    fn default_rq_size() -> usize {
        defaults::DRAM_RQ_SIZE
    }

    /// Returns the default write queue size.
    fn default_wq_size() -> usize {
        defaults::DRAM_WQ_SIZE
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            rq_size: defaults::DRAM_RQ_SIZE,
            wq_size: defaults::DRAM_WQ_SIZE,
            write_high_wm: None,
            write_low_wm: None,
            min_writes_per_switch: None,
        }
    }
}
