//! Hybrid memory-controller facade.
//!
//! This module ties the decoder, queues, and channel engines together. It
//! provides:
//! 1. **Enqueue operations:** `add_rq`, `add_wq`, and `add_pq` route packets to
//!    the owning channel, coalesce duplicates, forward reads from pending
//!    writes, and report backpressure without blocking.
//! 2. **Occupancy queries:** Current count and capacity of a channel's queues,
//!    addressed the way upstream caches address them.
//! 3. **Cycle stepping:** `operate` advances every channel of both memory
//!    kinds once per simulated cycle.
//! 4. **Statistics:** Aggregated per-kind counters and the average memory
//!    access time.

use tracing::error;

use crate::common::addr::LineAddr;
use crate::common::error::ConfigError;
use crate::config::MemoryConfig;
use crate::mem::channel::{Channel, Watermarks};
use crate::mem::decode::{DecodedAddr, Geometry, MemoryKind};
use crate::mem::packet::{Completion, Packet};
use crate::mem::timing::DramTiming;
use crate::sim::operable::Operable;
use crate::stats::{MemoryStats, ServiceStats};

/// Queue selector for occupancy and size queries.
///
/// The discriminants match the codes upstream caches pass on the wire:
/// `1` read, `2` write, `3` prefetch. Prefetches live in the read queue, so
/// [`QueueKind::Prefetch`] aliases [`QueueKind::Read`] everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum QueueKind {
    /// Read queue (demand reads, translations, prefetches).
    Read = 1,
    /// Write queue (writebacks).
    Write = 2,
    /// Prefetch queue; aliased to the read queue in this configuration.
    Prefetch = 3,
}

impl QueueKind {
    /// Maps a wire code to a queue kind.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Read),
            2 => Some(Self::Write),
            3 => Some(Self::Prefetch),
            _ => None,
        }
    }
}

/// Outcome of an enqueue operation.
///
/// The numeric contract with upstream callers is preserved by
/// [`EnqueueResult::code`]: non-negative for queued work, `-2` when the
/// request produced no new work, `-1` when the caller must retry later.
#[derive(Debug)]
#[must_use]
pub enum EnqueueResult {
    /// The packet was appended; carries the queue occupancy after insertion.
    Queued(usize),
    /// The packet was folded into an entry already covering its line.
    Merged,
    /// A read was serviced immediately from a pending writeback.
    Forwarded,
    /// The queue is full; the packet is handed back for the caller to retry
    /// on a later cycle.
    Full(Packet),
}

impl EnqueueResult {
    /// The integer code upstream caches consume.
    pub const fn code(&self) -> i32 {
        match self {
            Self::Queued(occupancy) => *occupancy as i32,
            Self::Merged | Self::Forwarded => -2,
            Self::Full(_) => -1,
        }
    }
}

/// The hybrid DDR+HBM memory controller.
///
/// Owns every channel of both kinds, the validated geometry, and the derived
/// timing; stepped once per simulated cycle through [`Operable`].
#[derive(Debug)]
pub struct MemoryController {
    geometry: Geometry,
    timing: DramTiming,
    watermarks: Watermarks,
    hbm: Vec<Channel>,
    ddr: Vec<Channel>,
    service: ServiceStats,
    cycle: u64,
}

impl MemoryController {
    /// Builds a controller from a configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the geometry, timing, or watermark
    /// configuration is inconsistent (see [`Geometry::from_config`],
    /// [`DramTiming::derive`], and [`Watermarks::from_config`]).
    pub fn new(cfg: &MemoryConfig) -> Result<Self, ConfigError> {
        let geometry = Geometry::from_config(cfg)?;
        let timing = DramTiming::derive(&cfg.timing)?;
        let watermarks = Watermarks::from_config(&cfg.queues)?;

        let build = |kind: MemoryKind| -> Vec<Channel> {
            let slots = geometry.bank_slots(kind) as usize;
            (0..geometry.channels(kind))
                .map(|i| Channel::new(kind, i, slots, &cfg.queues))
                .collect()
        };

        Ok(Self {
            hbm: build(MemoryKind::Hbm),
            ddr: build(MemoryKind::Ddr),
            geometry,
            timing,
            watermarks,
            service: ServiceStats::default(),
            cycle: 0,
        })
    }

    /// The validated geometry backing the address decoder.
    pub const fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// The derived cycle-granular timing constants.
    pub const fn timing(&self) -> &DramTiming {
        &self.timing
    }

    /// The active watermark thresholds.
    pub const fn watermarks(&self) -> &Watermarks {
        &self.watermarks
    }

    /// The cycle the next `operate` call will simulate.
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// The channels of the given memory kind.
    pub fn channels(&self, kind: MemoryKind) -> &[Channel] {
        match kind {
            MemoryKind::Hbm => &self.hbm,
            MemoryKind::Ddr => &self.ddr,
        }
    }

    fn channel_mut(&mut self, decoded: &DecodedAddr) -> &mut Channel {
        let list = match decoded.kind {
            MemoryKind::Hbm => &mut self.hbm,
            MemoryKind::Ddr => &mut self.ddr,
        };
        &mut list[decoded.channel as usize]
    }

    /// Enqueues a read (demand load, RFO, translation, or prefetch).
    ///
    /// In order: a pending writeback to the same line services the read
    /// immediately (forwarding); an existing read-queue entry for the line
    /// absorbs the callbacks (and is upgraded to a demand kind if the
    /// incoming request is demand work); otherwise the packet is appended,
    /// or rejected when the read queue is full.
    ///
    /// # Panics
    ///
    /// Panics when the packet's line address is outside the configured
    /// address space.
    pub fn add_rq(&mut self, pkt: Packet) -> EnqueueResult {
        let decoded = self.geometry.decode(pkt.address);
        let bank_slot = decoded.bank_slot(&self.geometry);
        let now = self.cycle;
        let channel = self.channel_mut(&decoded);

        if channel.wq.find_addr(pkt.address).is_some() {
            channel.stats.wq_forward += 1;
            let completion = Completion {
                address: pkt.address,
                kind: pkt.kind,
                cycle: now,
            };
            if !pkt.forget_on_complete {
                for callback in pkt.to_return {
                    callback(&completion);
                }
            }
            return EnqueueResult::Forwarded;
        }

        if let Some(slot) = channel.rq.find_addr(pkt.address) {
            if let Some(entry) = channel.rq.get_mut(slot) {
                if pkt.kind.is_demand() && !entry.pkt.kind.is_demand() {
                    entry.pkt.kind = pkt.kind;
                }
                entry.pkt.forget_on_complete &= pkt.forget_on_complete;
                entry.pkt.to_return.extend(pkt.to_return);
            }
            return EnqueueResult::Merged;
        }

        match channel.rq.insert(pkt, bank_slot, decoded.row) {
            Ok(_) => EnqueueResult::Queued(channel.rq.occupancy()),
            Err(pkt) => EnqueueResult::Full(pkt),
        }
    }

    /// Enqueues a writeback.
    ///
    /// A duplicate writeback to a line already pending is subsumed by the
    /// existing entry. A full write queue rejects the packet and counts the
    /// rejection.
    ///
    /// # Panics
    ///
    /// Panics when the packet's line address is outside the configured
    /// address space.
    pub fn add_wq(&mut self, pkt: Packet) -> EnqueueResult {
        let decoded = self.geometry.decode(pkt.address);
        let bank_slot = decoded.bank_slot(&self.geometry);
        let channel = self.channel_mut(&decoded);

        if let Some(slot) = channel.wq.find_addr(pkt.address) {
            if let Some(entry) = channel.wq.get_mut(slot) {
                entry.pkt.forget_on_complete &= pkt.forget_on_complete;
                entry.pkt.to_return.extend(pkt.to_return);
            }
            return EnqueueResult::Merged;
        }

        match channel.wq.insert(pkt, bank_slot, decoded.row) {
            Ok(_) => EnqueueResult::Queued(channel.wq.occupancy()),
            Err(pkt) => {
                channel.stats.wq_full += 1;
                EnqueueResult::Full(pkt)
            }
        }
    }

    /// Enqueues a prefetch.
    ///
    /// Prefetch priority equals read priority, so this is the read path with
    /// the same coalescing.
    ///
    /// # Panics
    ///
    /// Panics when the packet's line address is outside the configured
    /// address space.
    pub fn add_pq(&mut self, pkt: Packet) -> EnqueueResult {
        self.add_rq(pkt)
    }

    /// Current occupancy of the queue owning `addr`.
    ///
    /// # Panics
    ///
    /// Panics when the line address is outside the configured address space.
    pub fn get_occupancy(&self, kind: QueueKind, addr: LineAddr) -> usize {
        let decoded = self.geometry.decode(addr);
        let channel = &self.channels(decoded.kind)[decoded.channel as usize];
        match kind {
            QueueKind::Read | QueueKind::Prefetch => channel.rq.occupancy(),
            QueueKind::Write => channel.wq.occupancy(),
        }
    }

    /// Capacity of the queue owning `addr`.
    ///
    /// # Panics
    ///
    /// Panics when the line address is outside the configured address space.
    pub fn get_size(&self, kind: QueueKind, addr: LineAddr) -> usize {
        let decoded = self.geometry.decode(addr);
        let channel = &self.channels(decoded.kind)[decoded.channel as usize];
        match kind {
            QueueKind::Read | QueueKind::Prefetch => channel.rq.capacity(),
            QueueKind::Write => channel.wq.capacity(),
        }
    }

    /// Steps every channel of both memory kinds by one cycle.
    pub fn operate(&mut self) {
        let now = self.cycle;
        for channel in self.hbm.iter_mut().chain(self.ddr.iter_mut()) {
            channel.step(now, &self.timing, &self.watermarks, &mut self.service);
        }
        self.cycle = now + 1;
    }

    /// Requests sitting in any queue of any channel, including in-flight ones.
    pub fn pending_requests(&self) -> usize {
        self.hbm
            .iter()
            .chain(self.ddr.iter())
            .map(Channel::pending)
            .sum()
    }

    /// Requests completed through a bank access so far.
    pub const fn completed_requests(&self) -> u64 {
        self.service.total_issued
    }

    /// Average service time in cycles over all completed requests.
    pub fn average_memory_access_time(&self) -> f64 {
        self.service.average_memory_access_time()
    }

    /// Aggregates per-channel counters into kind-level sums.
    pub fn aggregate_stats(&self) -> MemoryStats {
        let mut stats = MemoryStats {
            service: self.service,
            ..MemoryStats::default()
        };
        for channel in &self.hbm {
            stats.hbm.accumulate(&channel.stats);
        }
        for channel in &self.ddr {
            stats.ddr.accumulate(&channel.stats);
        }
        stats
    }

    /// Dumps per-channel state through `tracing::error!`.
    ///
    /// Called by the deadlock heartbeat before the simulation aborts.
    pub fn dump_state(&self) {
        for channel in self.hbm.iter().chain(self.ddr.iter()) {
            let open_banks = channel
                .banks
                .iter()
                .filter(|(_, slot)| slot.open_row.is_some())
                .count();
            error!(
                kind = channel.kind.name(),
                channel = channel.index,
                write_mode = channel.write_mode,
                rq_occupancy = channel.rq.occupancy(),
                wq_occupancy = channel.wq.occupancy(),
                active_bank = ?channel.active_bank(),
                open_banks,
                dbus_cycle_available = channel.dbus_cycle_available,
                "channel state at heartbeat"
            );
        }
    }
}

impl Operable for MemoryController {
    fn next_operate_cycle(&self) -> u64 {
        self.cycle
    }

    fn operate(&mut self) {
        Self::operate(self);
    }
}
