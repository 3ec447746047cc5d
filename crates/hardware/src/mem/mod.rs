//! The hybrid memory system: decoder, queues, banks, channels, and facade.

/// Per-channel bank request table and in-flight bindings.
pub mod bank;
/// Per-channel scheduling engine and write-burst watermarks.
pub mod channel;
/// Controller facade: enqueue, occupancy queries, cycle stepping, stats.
pub mod controller;
/// Address decoding over the flat HBM+DDR space.
pub mod decode;
/// Request packets, kinds, and completion callbacks.
pub mod packet;
/// Bounded request queues with stable entry handles.
pub mod queue;
/// Cycle-granular DRAM timing derivation.
pub mod timing;

pub use controller::{EnqueueResult, MemoryController, QueueKind};
pub use decode::{DecodedAddr, Geometry, MemoryKind};
pub use packet::{Completion, Packet, RequestKind, ReturnCallback};
pub use timing::DramTiming;
