//! DRAM timing constants derived from the configuration.
//!
//! Latencies are configured in picoseconds and converted once, at
//! construction, to integer cycle counts of the I/O clock. The conversion
//! rounds up: a latency that does not land on a cycle boundary costs the
//! whole next cycle.

use crate::common::constants::BLOCK_SIZE;
use crate::common::error::ConfigError;
use crate::config::TimingConfig;

/// DRAM timing constants in I/O clock cycles.
///
/// Derived once per controller with [`DramTiming::derive`]; every latency
/// used by the channel engine comes from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DramTiming {
    /// Precharge latency (close the open row).
    pub t_rp: u64,
    /// Activate latency (open a row into the row buffer).
    pub t_rcd: u64,
    /// Column-access latency (column address to first data bit).
    pub t_cas: u64,
    /// Data-bus reversal penalty applied on each read/write mode switch.
    pub turn_around: u64,
    /// Cycles the data bus is occupied returning one cache line
    /// (`BLOCK_SIZE / channel_width`).
    pub return_time: u64,
}

impl DramTiming {
    /// Derives cycle-granular timing from picosecond parameters.
    ///
    /// A picosecond latency `ps` on an `f` MHz clock spans
    /// `ps * f / 1_000_000` cycles; the division rounds up so ties break
    /// toward the longer interval.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroFrequency`] when `io_freq_mhz` is zero and
    /// [`ConfigError::ChannelWidth`] when the channel width is zero or does
    /// not divide the block size.
    pub fn derive(cfg: &TimingConfig) -> Result<Self, ConfigError> {
        if cfg.io_freq_mhz == 0 {
            return Err(ConfigError::ZeroFrequency);
        }
        if cfg.channel_width_bytes == 0 || !BLOCK_SIZE.is_multiple_of(cfg.channel_width_bytes) {
            return Err(ConfigError::ChannelWidth {
                width: cfg.channel_width_bytes,
                block: BLOCK_SIZE,
            });
        }

        let cycles = |ps: u64| (ps * cfg.io_freq_mhz).div_ceil(1_000_000);

        Ok(Self {
            t_rp: cycles(cfg.t_rp_ps),
            t_rcd: cycles(cfg.t_rcd_ps),
            t_cas: cycles(cfg.t_cas_ps),
            turn_around: cycles(cfg.turn_around_ps),
            return_time: BLOCK_SIZE / cfg.channel_width_bytes,
        })
    }
}
