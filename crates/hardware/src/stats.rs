//! Simulation statistics collection.
//!
//! This module tracks performance counters for the memory system. It provides:
//! 1. **Per-channel counters:** Row-buffer hits and misses per queue, write-queue
//!    rejections, write forwards, and data-bus congestion.
//! 2. **Service accounting:** Total service time and completed request count,
//!    from which the average memory access time is derived.
//! 3. **Aggregation:** Kind-level sums assembled by the controller facade.
//!
//! The core exposes structured counters only; formatting is left to the
//! caller (the CLI prints them, tests assert on them).

/// Counters owned by one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Reads issued that found their row open.
    pub rq_row_buffer_hit: u64,
    /// Reads issued that had to activate (and possibly precharge) first.
    pub rq_row_buffer_miss: u64,
    /// Writes issued that found their row open.
    pub wq_row_buffer_hit: u64,
    /// Writes issued that had to activate (and possibly precharge) first.
    pub wq_row_buffer_miss: u64,
    /// Writebacks rejected because the write queue was full.
    pub wq_full: u64,
    /// Reads serviced directly from a pending writeback in the write queue.
    pub wq_forward: u64,
    /// Cycles requests spent waiting on an occupied data bus, including
    /// turnaround reservations.
    pub dbus_cycle_congested: u64,
    /// Number of times a request or mode switch found the data bus occupied.
    pub dbus_count_congested: u64,
}

impl ChannelStats {
    /// Adds another channel's counters into this one.
    pub fn accumulate(&mut self, other: &Self) {
        self.rq_row_buffer_hit += other.rq_row_buffer_hit;
        self.rq_row_buffer_miss += other.rq_row_buffer_miss;
        self.wq_row_buffer_hit += other.wq_row_buffer_hit;
        self.wq_row_buffer_miss += other.wq_row_buffer_miss;
        self.wq_full += other.wq_full;
        self.wq_forward += other.wq_forward;
        self.dbus_cycle_congested += other.dbus_cycle_congested;
        self.dbus_count_congested += other.dbus_count_congested;
    }

    /// Average cycles of bus congestion per congested event, or `None` when
    /// the bus was never found occupied.
    pub fn avg_congested_cycles(&self) -> Option<f64> {
        if self.dbus_count_congested == 0 {
            None
        } else {
            Some(self.dbus_cycle_congested as f64 / self.dbus_count_congested as f64)
        }
    }
}

/// Global service-time accounting across all channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceStats {
    /// Sum over completed requests of `completion_cycle - arrival_cycle`.
    pub total_service_time: u64,
    /// Number of requests that completed through a bank access.
    pub total_issued: u64,
}

impl ServiceStats {
    /// Average memory access time in cycles; zero before any completion.
    pub fn average_memory_access_time(&self) -> f64 {
        if self.total_issued == 0 {
            0.0
        } else {
            self.total_service_time as f64 / self.total_issued as f64
        }
    }
}

/// Aggregated view of the whole memory system, produced by
/// [`MemoryController::aggregate_stats`](crate::mem::controller::MemoryController::aggregate_stats).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Global service accounting.
    pub service: ServiceStats,
    /// Sum of all HBM channel counters.
    pub hbm: ChannelStats,
    /// Sum of all DDR channel counters.
    pub ddr: ChannelStats,
}
