//! Physical and Line Address types.
//!
//! This module defines strong types for byte-granular physical addresses and
//! cache-line-granular addresses to prevent accidental mixing of the two
//! granularities. It provides the following:
//! 1. **Type Safety:** Distinguishes byte addresses from line addresses at compile time.
//! 2. **Conversion:** Shift helpers between the two granularities.
//! 3. **Decoder Integration:** [`LineAddr`] is the primary input of the address decoder.

use super::constants::LOG2_BLOCK_SIZE;

/// A byte-granular physical address.
///
/// Physical addresses are what the cache hierarchy works with before
/// aligning to a cache line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhysAddr(pub u64);

/// A cache-line-granular address (physical address right-shifted by
/// `log2(BLOCK_SIZE)`).
///
/// All requests entering the memory controller carry line addresses; the
/// address decoder maps them onto channel, rank, bank, row, and column
/// coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineAddr(pub u64);

impl PhysAddr {
    /// Creates a new physical address from a raw 64-bit value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(&self) -> u64 {
        self.0
    }

    /// Returns the cache line containing this byte address.
    #[inline(always)]
    pub const fn line(&self) -> LineAddr {
        LineAddr(self.0 >> LOG2_BLOCK_SIZE)
    }
}

impl LineAddr {
    /// Creates a new line address from a raw 64-bit value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit line-address value.
    #[inline(always)]
    pub const fn val(&self) -> u64 {
        self.0
    }

    /// Returns the byte address of the first byte of this line.
    #[inline(always)]
    pub const fn phys(&self) -> PhysAddr {
        PhysAddr(self.0 << LOG2_BLOCK_SIZE)
    }
}

impl std::fmt::Display for LineAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
