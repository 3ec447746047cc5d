//! Per-channel scheduling engine.
//!
//! Each channel steps once per simulated cycle, in this order:
//! 1. **Completion drain:** If the active request's data return has finished,
//!    fire its callbacks, free its bank slot (keeping the open row), and
//!    account service time.
//! 2. **Selection:** With no request in flight, scan the queue for the
//!    current mode and pick a candidate, preferring row-buffer hits and
//!    breaking ties by arrival order (FR-FCFS restricted by mode).
//! 3. **Issue:** Bind the candidate to its bank slot, charge the applicable
//!    precharge/activate/CAS latencies, and reserve the data bus for the
//!    return burst no earlier than `dbus_cycle_available`.
//! 4. **Mode arbitration:** Enter write mode at the high watermark (or when
//!    reads dry up); leave only after the minimum burst has drained and
//!    occupancy fell below the low watermark, or the write queue emptied.
//! 5. **Turnaround:** Every mode switch reserves the bus for the reversal
//!    penalty and counts congestion.
//!
//! At most one request is in flight per channel; bank slots additionally
//! remember their open row across completions (open-page policy).

use tracing::{debug, trace};

use crate::common::error::ConfigError;
use crate::config::QueueConfig;
use crate::mem::bank::{BankTable, Binding, QueueOrigin};
use crate::mem::decode::MemoryKind;
use crate::mem::packet::Completion;
use crate::mem::queue::RequestQueue;
use crate::mem::timing::DramTiming;
use crate::stats::{ChannelStats, ServiceStats};

/// Write-burst watermark thresholds, validated at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watermarks {
    /// Write-queue occupancy at which a channel enters write mode.
    pub high: usize,
    /// Occupancy below which a channel may leave write mode.
    pub low: usize,
    /// Minimum writes drained per burst before leaving while writes remain.
    pub min_writes: usize,
}

impl Watermarks {
    /// Derives the thresholds from the queue configuration, applying the
    /// default fractions (7/8, 6/8, 1/4 of the write-queue size) where no
    /// override is given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroQueue`] for empty queues and
    /// [`ConfigError::WatermarkOrder`] unless `low < high <= wq_size`.
    pub fn from_config(cfg: &QueueConfig) -> Result<Self, ConfigError> {
        if cfg.rq_size == 0 {
            return Err(ConfigError::ZeroQueue { queue: "read" });
        }
        if cfg.wq_size == 0 {
            return Err(ConfigError::ZeroQueue { queue: "write" });
        }
        let high = cfg.write_high_wm.unwrap_or(cfg.wq_size * 7 / 8);
        let low = cfg.write_low_wm.unwrap_or(cfg.wq_size * 6 / 8);
        let min_writes = cfg.min_writes_per_switch.unwrap_or(cfg.wq_size / 4);
        if low >= high || high > cfg.wq_size {
            return Err(ConfigError::WatermarkOrder {
                low,
                high,
                wq_size: cfg.wq_size,
            });
        }
        Ok(Self {
            high,
            low,
            min_writes,
        })
    }
}

/// One memory channel: its queues, bank table, data bus, and mode state.
#[derive(Debug)]
pub struct Channel {
    /// Backing-store kind this channel belongs to (diagnostics only).
    pub kind: MemoryKind,
    /// Channel index within the kind (diagnostics only).
    pub index: u64,
    /// Read queue; holds demand reads, translations, and prefetches.
    pub rq: RequestQueue,
    /// Write queue; holds writebacks.
    pub wq: RequestQueue,
    /// Bank request table (`ranks * banks` slots for DDR, `banks` for HBM).
    pub banks: BankTable,
    /// Earliest cycle the data bus can begin the next return burst.
    pub dbus_cycle_available: u64,
    /// Whether the channel is currently draining writes.
    pub write_mode: bool,
    /// Per-channel counters.
    pub stats: ChannelStats,
    active: Option<usize>,
    writes_this_burst: usize,
}

impl Channel {
    /// Creates an idle channel in read mode.
    pub fn new(kind: MemoryKind, index: u64, bank_slots: usize, queues: &QueueConfig) -> Self {
        Self {
            kind,
            index,
            rq: RequestQueue::new(queues.rq_size),
            wq: RequestQueue::new(queues.wq_size),
            banks: BankTable::new(bank_slots),
            dbus_cycle_available: 0,
            write_mode: false,
            stats: ChannelStats::default(),
            active: None,
            writes_this_burst: 0,
        }
    }

    /// Bank index of the request currently in flight, if any.
    #[inline]
    pub const fn active_bank(&self) -> Option<usize> {
        self.active
    }

    /// Requests sitting in both queues, including the one in flight.
    #[inline]
    pub const fn pending(&self) -> usize {
        self.rq.occupancy() + self.wq.occupancy()
    }

    /// Advances the channel by one cycle.
    pub fn step(&mut self, now: u64, timing: &DramTiming, wm: &Watermarks, service: &mut ServiceStats) {
        self.drain(now, service);
        if self.active.is_none() {
            if let Some(queue_slot) = self.select() {
                self.issue(now, timing, queue_slot);
            }
        }
        self.arbitrate_mode(now, timing, wm);
    }

    /// Completes the active request once its data return has finished.
    fn drain(&mut self, now: u64, service: &mut ServiceStats) {
        let Some(bank_idx) = self.active else {
            return;
        };
        if self.banks.slot(bank_idx).event_cycle > now {
            return;
        }

        let slot = self.banks.slot_mut(bank_idx);
        let row_buffer_hit = slot.row_buffer_hit;
        let Some(Binding { origin, queue_slot }) = slot.release() else {
            self.active = None;
            return;
        };
        self.active = None;

        let queue = match origin {
            QueueOrigin::Read => &mut self.rq,
            QueueOrigin::Write => &mut self.wq,
        };
        let Some(entry) = queue.remove(queue_slot) else {
            return;
        };

        match (origin, row_buffer_hit) {
            (QueueOrigin::Read, true) => self.stats.rq_row_buffer_hit += 1,
            (QueueOrigin::Read, false) => self.stats.rq_row_buffer_miss += 1,
            (QueueOrigin::Write, true) => self.stats.wq_row_buffer_hit += 1,
            (QueueOrigin::Write, false) => self.stats.wq_row_buffer_miss += 1,
        }
        if origin == QueueOrigin::Write {
            self.writes_this_burst += 1;
        }

        service.total_issued += 1;
        service.total_service_time += now.saturating_sub(entry.pkt.arrival_cycle);

        trace!(
            kind = self.kind.name(),
            channel = self.index,
            bank = bank_idx,
            address = %entry.pkt.address,
            cycle = now,
            row_buffer_hit,
            "request completed"
        );

        let completion = Completion {
            address: entry.pkt.address,
            kind: entry.pkt.kind,
            cycle: now,
        };
        if !entry.pkt.forget_on_complete {
            for callback in entry.pkt.to_return {
                callback(&completion);
            }
        }
    }

    /// Picks the next queue entry for the current mode, or `None` when the
    /// mode's queue has no schedulable entry.
    fn select(&self) -> Option<usize> {
        let queue = if self.write_mode { &self.wq } else { &self.rq };

        let mut best: Option<(bool, u64, usize)> = None;
        for (idx, entry) in queue.iter() {
            let slot = self.banks.slot(entry.bank_slot);
            if slot.valid {
                continue;
            }
            let hit = slot.open_row == Some(entry.row);
            // Row hits beat misses; within a class the oldest arrival wins.
            let better = match best {
                None => true,
                Some((best_hit, best_seq, _)) => {
                    (hit && !best_hit) || (hit == best_hit && entry.seq < best_seq)
                }
            };
            if better {
                best = Some((hit, entry.seq, idx));
            }
        }
        best.map(|(_, _, idx)| idx)
    }

    /// Binds a queue entry to its bank, charging precharge/activate/CAS and
    /// reserving the data bus for the return burst.
    fn issue(&mut self, now: u64, timing: &DramTiming, queue_slot: usize) {
        let (origin, queue) = if self.write_mode {
            (QueueOrigin::Write, &self.wq)
        } else {
            (QueueOrigin::Read, &self.rq)
        };
        let Some(entry) = queue.get(queue_slot) else {
            return;
        };
        let (bank_idx, row, address) = (entry.bank_slot, entry.row, entry.pkt.address);

        let slot = self.banks.slot_mut(bank_idx);
        let hit = slot.open_row == Some(row);
        let conflict = matches!(slot.open_row, Some(open) if open != row);

        let mut delay = timing.t_cas;
        if conflict {
            delay += timing.t_rp;
        }
        if !hit {
            delay += timing.t_rcd;
        }

        let cas_done = now + delay;
        let return_start = cas_done.max(self.dbus_cycle_available);
        if return_start > cas_done {
            self.stats.dbus_cycle_congested += return_start - cas_done;
            self.stats.dbus_count_congested += 1;
        }
        let done = return_start + timing.return_time;

        slot.valid = true;
        slot.row_buffer_hit = hit;
        slot.open_row = Some(row);
        slot.event_cycle = done;
        slot.binding = Some(Binding { origin, queue_slot });
        self.dbus_cycle_available = done;
        self.active = Some(bank_idx);

        trace!(
            kind = self.kind.name(),
            channel = self.index,
            bank = bank_idx,
            address = %address,
            cycle = now,
            row_buffer_hit = hit,
            completes = done,
            "request issued"
        );
    }

    /// Applies the write-burst watermark hysteresis after scheduling.
    fn arbitrate_mode(&mut self, now: u64, timing: &DramTiming, wm: &Watermarks) {
        let wq_occ = self.wq.occupancy();
        let rq_occ = self.rq.occupancy();

        if !self.write_mode {
            if wq_occ >= wm.high || (rq_occ == 0 && wq_occ > 0) {
                self.write_mode = true;
                self.writes_this_burst = 0;
                self.reserve_turnaround(now, timing);
                debug!(
                    kind = self.kind.name(),
                    channel = self.index,
                    cycle = now,
                    wq_occ,
                    rq_occ,
                    "entering write mode"
                );
            }
        } else if wq_occ == 0
            || (rq_occ > 0 && wq_occ < wm.low && self.writes_this_burst >= wm.min_writes)
        {
            self.write_mode = false;
            self.reserve_turnaround(now, timing);
            debug!(
                kind = self.kind.name(),
                channel = self.index,
                cycle = now,
                wq_occ,
                rq_occ,
                drained = self.writes_this_burst,
                "leaving write mode"
            );
        }
    }

    /// Reserves the data bus for the reversal penalty on a mode switch.
    fn reserve_turnaround(&mut self, now: u64, timing: &DramTiming) {
        if self.dbus_cycle_available > now {
            self.stats.dbus_cycle_congested += self.dbus_cycle_available - now;
            self.stats.dbus_count_congested += 1;
        }
        self.dbus_cycle_available = self.dbus_cycle_available.max(now) + timing.turn_around;
    }
}
