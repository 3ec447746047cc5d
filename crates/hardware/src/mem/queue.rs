//! Bounded request queues with stable entry handles.
//!
//! Each channel owns one read queue and one write queue. Entries live in a
//! fixed-capacity slot arena: a slot index handed out at insertion stays
//! valid until that exact entry is removed, so a bank binding can reference
//! its queue entry without caring about other insertions or removals. FIFO
//! age is tracked with a monotone sequence number, not the slot index.

use crate::common::addr::LineAddr;
use crate::mem::packet::Packet;

/// One queued request plus the coordinates the scheduler needs every cycle.
///
/// The bank slot index and row are decoded once at enqueue so the per-cycle
/// scan does not re-run the address decoder.
#[derive(Debug)]
pub struct QueueEntry {
    /// The request itself.
    pub pkt: Packet,
    /// Arrival order within this queue; lower is older.
    pub seq: u64,
    /// Flattened bank-slot index within the owning channel.
    pub bank_slot: usize,
    /// Row index within the bank.
    pub row: u64,
}

/// A fixed-capacity request queue backed by a slot arena.
#[derive(Debug)]
pub struct RequestQueue {
    slots: Vec<Option<QueueEntry>>,
    occupancy: usize,
    next_seq: u64,
}

impl RequestQueue {
    /// Creates an empty queue with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            occupancy: 0,
            next_seq: 0,
        }
    }

    /// Queue capacity in entries.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied entries.
    #[inline]
    pub const fn occupancy(&self) -> usize {
        self.occupancy
    }

    /// Whether no free slot remains.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.occupancy == self.slots.len()
    }

    /// Whether the queue holds no entries.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.occupancy == 0
    }

    /// Inserts a packet, returning the stable slot index.
    ///
    /// # Errors
    ///
    /// When the queue is full the packet is handed back so the caller can
    /// retry on a later cycle.
    pub fn insert(&mut self, pkt: Packet, bank_slot: usize, row: u64) -> Result<usize, Packet> {
        let Some(idx) = self.slots.iter().position(Option::is_none) else {
            return Err(pkt);
        };
        let seq = self.next_seq;
        self.next_seq += 1;
        self.slots[idx] = Some(QueueEntry {
            pkt,
            seq,
            bank_slot,
            row,
        });
        self.occupancy += 1;
        Ok(idx)
    }

    /// Finds the slot holding the given line address, if any.
    pub fn find_addr(&self, addr: LineAddr) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|e| e.pkt.address == addr))
    }

    /// Returns the entry in the given slot.
    pub fn get(&self, idx: usize) -> Option<&QueueEntry> {
        self.slots.get(idx)?.as_ref()
    }

    /// Returns the entry in the given slot, mutably.
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut QueueEntry> {
        self.slots.get_mut(idx)?.as_mut()
    }

    /// Removes and returns the entry in the given slot.
    pub fn remove(&mut self, idx: usize) -> Option<QueueEntry> {
        let entry = self.slots.get_mut(idx)?.take();
        if entry.is_some() {
            self.occupancy -= 1;
        }
        entry
    }

    /// Iterates over occupied slots as `(slot_index, entry)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &QueueEntry)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|e| (i, e)))
    }
}
