//! Address decoding for the flat HBM+DDR physical address space.
//!
//! This module maps cache-line addresses onto DRAM coordinates. It provides:
//! 1. **Kind selection:** Lines below the HBM capacity are HBM; the rest are DDR.
//! 2. **Field extraction:** Channel, rank, bank, row, and column from configured widths.
//! 3. **Inverse encoding:** [`Geometry::compose`] rebuilds the line address from
//!    its coordinates, which pins the decode down as a bijection.
//!
//! Field widths are `log2(count)` over the configured counts, so every count
//! must be a power of two; this is validated when the [`Geometry`] is built.
//!
//! Bit layout of a line address, least-significant field rightmost:
//!
//! ```text
//! HBM:  | row | column | bank | channel |
//! DDR:  | row | rank | column | bank | channel |   (after subtracting HBM lines)
//! ```

use crate::common::addr::LineAddr;
use crate::common::constants::{BLOCK_SIZE, LOG2_BLOCK_SIZE};
use crate::common::error::ConfigError;
use crate::config::{DdrConfig, HbmConfig, MemoryConfig};

/// The two backing-store kinds sharing the flat address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryKind {
    /// On-package high-bandwidth memory; the address space starts here.
    Hbm,
    /// Off-chip DDR memory, beginning at the HBM capacity.
    Ddr,
}

impl MemoryKind {
    /// Returns the kind name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hbm => "HBM",
            Self::Ddr => "DDR",
        }
    }
}

/// Fully decoded coordinates of one cache line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedAddr {
    /// Which backing store the line lives in.
    pub kind: MemoryKind,
    /// Channel index within the kind.
    pub channel: u64,
    /// Rank index; always zero for HBM.
    pub rank: u64,
    /// Bank index within the rank (DDR) or channel (HBM).
    pub bank: u64,
    /// Row index within the bank.
    pub row: u64,
    /// Cache-line column index within the row.
    pub column: u64,
}

/// Per-kind field widths and shift amounts, precomputed at construction.
#[derive(Debug, Clone, Copy, Default)]
struct KindLayout {
    channels: u64,
    ranks: u64,
    banks: u64,
    rows: u64,
    columns: u64,
    lines: u64,
    channel_shift: u32,
    channel_width: u32,
    bank_shift: u32,
    bank_width: u32,
    column_shift: u32,
    column_width: u32,
    rank_shift: u32,
    rank_width: u32,
    row_shift: u32,
    row_width: u32,
}

impl KindLayout {
    fn field(addr: u64, shift: u32, width: u32) -> u64 {
        (addr >> shift) & ((1u64 << width) - 1)
    }
}

/// Validated memory geometry: counts, derived field layouts, and the kind
/// boundary in the flat line-address space.
///
/// All decode operations are pure and total over `0..total_lines`; a line
/// address at or beyond `total_lines` is upstream corruption and panics.
#[derive(Debug, Clone)]
pub struct Geometry {
    hbm: KindLayout,
    ddr: KindLayout,
}

/// Width in bits of a field indexing `count` items.
///
/// Counts are validated as powers of two, so this is exact.
fn width_of(count: u64) -> u32 {
    if count <= 1 { 0 } else { count.ilog2() }
}

fn check_power_of_two(
    kind: &'static str,
    field: &'static str,
    count: u64,
) -> Result<(), ConfigError> {
    if count == 0 || !count.is_power_of_two() {
        return Err(ConfigError::NotPowerOfTwo { kind, field, count });
    }
    Ok(())
}

impl Geometry {
    /// Builds and validates the geometry from a configuration.
    ///
    /// A kind with zero declared capacity is disabled and contributes no
    /// address space.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a count is not a power of two, the
    /// field widths exceed a 64-bit line address, the declared capacity does
    /// not match the geometry product, or both kinds are disabled.
    pub fn from_config(cfg: &MemoryConfig) -> Result<Self, ConfigError> {
        let hbm = Self::hbm_layout(&cfg.hbm)?;
        let ddr = Self::ddr_layout(&cfg.ddr)?;
        if hbm.lines == 0 && ddr.lines == 0 {
            return Err(ConfigError::NoMemory);
        }
        Ok(Self { hbm, ddr })
    }

    fn hbm_layout(cfg: &HbmConfig) -> Result<KindLayout, ConfigError> {
        if cfg.capacity_bytes == 0 {
            return Ok(KindLayout::default());
        }
        check_power_of_two("HBM", "channels", cfg.channels)?;
        check_power_of_two("HBM", "banks", cfg.banks)?;
        check_power_of_two("HBM", "rows", cfg.rows)?;
        check_power_of_two("HBM", "columns", cfg.columns)?;

        let channel_width = width_of(cfg.channels);
        let bank_width = width_of(cfg.banks);
        let column_width = width_of(cfg.columns);
        let row_width = width_of(cfg.rows);

        let bits = channel_width + bank_width + column_width + row_width + LOG2_BLOCK_SIZE;
        if bits >= 64 {
            return Err(ConfigError::AddressWidthOverflow { kind: "HBM", bits });
        }

        let lines = cfg.channels * cfg.banks * cfg.rows * cfg.columns;
        let derived = lines * BLOCK_SIZE;
        if derived != cfg.capacity_bytes {
            return Err(ConfigError::CapacityMismatch {
                kind: "HBM",
                derived,
                declared: cfg.capacity_bytes,
            });
        }

        Ok(KindLayout {
            channels: cfg.channels,
            ranks: 1,
            banks: cfg.banks,
            rows: cfg.rows,
            columns: cfg.columns,
            lines,
            channel_shift: 0,
            channel_width,
            bank_shift: channel_width,
            bank_width,
            column_shift: channel_width + bank_width,
            column_width,
            rank_shift: 0,
            rank_width: 0,
            row_shift: channel_width + bank_width + column_width,
            row_width,
        })
    }

    fn ddr_layout(cfg: &DdrConfig) -> Result<KindLayout, ConfigError> {
        if cfg.capacity_bytes == 0 {
            return Ok(KindLayout::default());
        }
        check_power_of_two("DDR", "channels", cfg.channels)?;
        check_power_of_two("DDR", "ranks", cfg.ranks)?;
        check_power_of_two("DDR", "banks", cfg.banks)?;
        check_power_of_two("DDR", "rows", cfg.rows)?;
        check_power_of_two("DDR", "columns", cfg.columns)?;

        let channel_width = width_of(cfg.channels);
        let bank_width = width_of(cfg.banks);
        let column_width = width_of(cfg.columns);
        let rank_width = width_of(cfg.ranks);
        let row_width = width_of(cfg.rows);

        let bits =
            channel_width + bank_width + column_width + rank_width + row_width + LOG2_BLOCK_SIZE;
        if bits >= 64 {
            return Err(ConfigError::AddressWidthOverflow { kind: "DDR", bits });
        }

        let lines = cfg.channels * cfg.ranks * cfg.banks * cfg.rows * cfg.columns;
        let derived = lines * BLOCK_SIZE;
        if derived != cfg.capacity_bytes {
            return Err(ConfigError::CapacityMismatch {
                kind: "DDR",
                derived,
                declared: cfg.capacity_bytes,
            });
        }

        Ok(KindLayout {
            channels: cfg.channels,
            ranks: cfg.ranks,
            banks: cfg.banks,
            rows: cfg.rows,
            columns: cfg.columns,
            lines,
            channel_shift: 0,
            channel_width,
            bank_shift: channel_width,
            bank_width,
            column_shift: channel_width + bank_width,
            column_width,
            rank_shift: channel_width + bank_width + column_width,
            rank_width,
            row_shift: channel_width + bank_width + column_width + rank_width,
            row_width,
        })
    }

    /// Number of cache lines in the HBM region (the kind boundary).
    #[inline]
    pub const fn hbm_lines(&self) -> u64 {
        self.hbm.lines
    }

    /// Total number of cache lines across both regions.
    #[inline]
    pub const fn total_lines(&self) -> u64 {
        self.hbm.lines + self.ddr.lines
    }

    /// Number of channels of the given kind.
    pub const fn channels(&self, kind: MemoryKind) -> u64 {
        match kind {
            MemoryKind::Hbm => self.hbm.channels,
            MemoryKind::Ddr => self.ddr.channels,
        }
    }

    /// Number of bank slots per channel of the given kind
    /// (`ranks * banks` for DDR, `banks` for HBM).
    pub const fn bank_slots(&self, kind: MemoryKind) -> u64 {
        match kind {
            MemoryKind::Hbm => self.hbm.banks,
            MemoryKind::Ddr => self.ddr.ranks * self.ddr.banks,
        }
    }

    /// Which backing store owns the given line.
    ///
    /// # Panics
    ///
    /// Panics when the line address is outside the configured address space;
    /// such an address indicates upstream corruption.
    pub fn kind_of(&self, addr: LineAddr) -> MemoryKind {
        self.check(addr);
        if addr.val() < self.hbm.lines {
            MemoryKind::Hbm
        } else {
            MemoryKind::Ddr
        }
    }

    /// Decodes a line address into its full coordinates.
    ///
    /// # Panics
    ///
    /// Panics when the line address is outside the configured address space.
    pub fn decode(&self, addr: LineAddr) -> DecodedAddr {
        let kind = self.kind_of(addr);
        let (layout, local) = match kind {
            MemoryKind::Hbm => (&self.hbm, addr.val()),
            MemoryKind::Ddr => (&self.ddr, addr.val() - self.hbm.lines),
        };
        DecodedAddr {
            kind,
            channel: KindLayout::field(local, layout.channel_shift, layout.channel_width),
            rank: KindLayout::field(local, layout.rank_shift, layout.rank_width),
            bank: KindLayout::field(local, layout.bank_shift, layout.bank_width),
            row: KindLayout::field(local, layout.row_shift, layout.row_width),
            column: KindLayout::field(local, layout.column_shift, layout.column_width),
        }
    }

    /// Rebuilds the line address from decoded coordinates (the inverse of
    /// [`Geometry::decode`]).
    ///
    /// # Panics
    ///
    /// Panics when a coordinate is outside its configured count.
    pub fn compose(&self, d: &DecodedAddr) -> LineAddr {
        let layout = match d.kind {
            MemoryKind::Hbm => &self.hbm,
            MemoryKind::Ddr => &self.ddr,
        };
        assert!(
            d.channel < layout.channels
                && d.rank < layout.ranks
                && d.bank < layout.banks
                && d.row < layout.rows
                && d.column < layout.columns,
            "{} coordinate out of range: {d:?}",
            d.kind.name(),
        );
        let local = (d.channel << layout.channel_shift)
            | (d.rank << layout.rank_shift)
            | (d.bank << layout.bank_shift)
            | (d.row << layout.row_shift)
            | (d.column << layout.column_shift);
        match d.kind {
            MemoryKind::Hbm => LineAddr::new(local),
            MemoryKind::Ddr => LineAddr::new(local + self.hbm.lines),
        }
    }

    /// Channel index of the given line.
    ///
    /// # Panics
    ///
    /// Panics when the line address is outside the configured address space.
    pub fn channel(&self, addr: LineAddr) -> u64 {
        self.decode(addr).channel
    }

    /// Bank index of the given line.
    ///
    /// # Panics
    ///
    /// Panics when the line address is outside the configured address space.
    pub fn bank(&self, addr: LineAddr) -> u64 {
        self.decode(addr).bank
    }

    /// Row index of the given line.
    ///
    /// # Panics
    ///
    /// Panics when the line address is outside the configured address space.
    pub fn row(&self, addr: LineAddr) -> u64 {
        self.decode(addr).row
    }

    /// Column index of the given line.
    ///
    /// # Panics
    ///
    /// Panics when the line address is outside the configured address space.
    pub fn column(&self, addr: LineAddr) -> u64 {
        self.decode(addr).column
    }

    /// Rank index of the given DDR line.
    ///
    /// # Panics
    ///
    /// Panics when the line address is outside the configured address space
    /// or resolves to HBM, which has no rank level.
    pub fn rank(&self, addr: LineAddr) -> u64 {
        let d = self.decode(addr);
        assert!(
            d.kind == MemoryKind::Ddr,
            "rank requested for HBM line {addr}",
        );
        d.rank
    }

    fn check(&self, addr: LineAddr) {
        assert!(
            addr.val() < self.total_lines(),
            "line address {addr} outside the configured {} lines",
            self.total_lines(),
        );
    }
}

impl DecodedAddr {
    /// Flattened bank-slot index within the owning channel
    /// (`rank * banks + bank`).
    pub fn bank_slot(&self, geometry: &Geometry) -> usize {
        let banks = match self.kind {
            MemoryKind::Hbm => geometry.hbm.banks,
            MemoryKind::Ddr => geometry.ddr.banks,
        };
        (self.rank * banks + self.bank) as usize
    }
}
