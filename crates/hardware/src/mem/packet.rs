//! Request packets and completion callbacks.
//!
//! This module defines the contract between the cache hierarchy and the
//! memory controller. It provides:
//! 1. **Packets:** The request unit consumed by the enqueue operations.
//! 2. **Kinds:** Demand reads, prefetches, writebacks, and translations.
//! 3. **Completion:** Callback records invoked exactly once per packet when
//!    the controller finishes servicing it.

use std::fmt;

use crate::common::addr::LineAddr;

/// The kind of memory request a packet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Demand load miss.
    Load,
    /// Read-for-ownership (store miss bringing the line in exclusively).
    Rfo,
    /// Speculative prefetch; queued with read priority.
    Prefetch,
    /// Dirty-line writeback from an upper cache level.
    Writeback,
    /// Page-walk read issued by the address-translation machinery.
    Translation,
}

impl RequestKind {
    /// Whether this kind represents demand work (a core is waiting on it).
    ///
    /// A demand read merging into a pending prefetch upgrades the pending
    /// entry to the demand kind.
    pub const fn is_demand(self) -> bool {
        matches!(self, Self::Load | Self::Rfo | Self::Translation)
    }
}

/// The record handed to each return callback when a request completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Line address the request covered.
    pub address: LineAddr,
    /// Kind the request completed as (merges may have upgraded it).
    pub kind: RequestKind,
    /// Cycle at which the data finished returning on the channel bus.
    pub cycle: u64,
}

/// A completion callback: a function plus whatever caller state it captured,
/// stored by value in the packet and invoked exactly once.
pub type ReturnCallback = Box<dyn FnOnce(&Completion) + Send>;

/// A cache-line request submitted to the memory controller.
///
/// The controller consumes the address, kind, arrival cycle, and callbacks;
/// any payload data stays with the caller.
pub struct Packet {
    /// Block-aligned line address.
    pub address: LineAddr,
    /// Request kind.
    pub kind: RequestKind,
    /// Cycle the request was created, used for service-time statistics.
    pub arrival_cycle: u64,
    /// When set, completion discards the callbacks instead of invoking them
    /// (fire-and-forget prefetches).
    pub forget_on_complete: bool,
    /// Callbacks fired on completion; merges fold additional callbacks in.
    pub to_return: Vec<ReturnCallback>,
}

impl Packet {
    /// Creates a packet with no callbacks attached.
    pub fn new(address: LineAddr, kind: RequestKind, arrival_cycle: u64) -> Self {
        Self {
            address,
            kind,
            arrival_cycle,
            forget_on_complete: false,
            to_return: Vec::new(),
        }
    }

    /// Attaches a completion callback, builder style.
    #[must_use]
    pub fn with_callback(mut self, callback: ReturnCallback) -> Self {
        self.to_return.push(callback);
        self
    }

    /// Marks the packet fire-and-forget, builder style.
    #[must_use]
    pub fn forgettable(mut self) -> Self {
        self.forget_on_complete = true;
        self
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("address", &self.address)
            .field("kind", &self.kind)
            .field("arrival_cycle", &self.arrival_cycle)
            .field("forget_on_complete", &self.forget_on_complete)
            .field("callbacks", &self.to_return.len())
            .finish()
    }
}
