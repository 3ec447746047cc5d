//! Request Queue Unit Tests.
//!
//! Verifies capacity bounds, stable slot handles across removals, address
//! lookup, and arrival-order sequencing.

use hmsim_core::common::addr::LineAddr;
use hmsim_core::mem::packet::{Packet, RequestKind};
use hmsim_core::mem::queue::RequestQueue;

fn pkt(addr: u64) -> Packet {
    Packet::new(LineAddr::new(addr), RequestKind::Load, 0)
}

#[test]
fn insert_up_to_capacity_then_reject() {
    let mut q = RequestQueue::new(4);
    for i in 0..4 {
        assert!(q.insert(pkt(i), 0, 0).is_ok());
    }
    assert_eq!(q.occupancy(), 4);
    assert!(q.is_full());
    assert!(q.insert(pkt(99), 0, 0).is_err());
    assert_eq!(q.occupancy(), 4);
}

#[test]
fn slot_handles_stay_valid_across_removals() {
    let mut q = RequestQueue::new(4);
    let a = q.insert(pkt(0xa), 0, 0).unwrap();
    let b = q.insert(pkt(0xb), 0, 0).unwrap();
    let c = q.insert(pkt(0xc), 0, 0).unwrap();

    let removed = q.remove(b).unwrap();
    assert_eq!(removed.pkt.address, LineAddr::new(0xb));

    // The surviving handles still name their original entries.
    assert_eq!(q.get(a).unwrap().pkt.address, LineAddr::new(0xa));
    assert_eq!(q.get(c).unwrap().pkt.address, LineAddr::new(0xc));
    assert_eq!(q.occupancy(), 2);
}

#[test]
fn freed_slots_are_reused() {
    let mut q = RequestQueue::new(2);
    let a = q.insert(pkt(1), 0, 0).unwrap();
    let _ = q.insert(pkt(2), 0, 0).unwrap();
    let _ = q.remove(a).unwrap();
    assert!(q.insert(pkt(3), 0, 0).is_ok());
    assert!(q.is_full());
}

#[test]
fn find_addr_locates_pending_entries() {
    let mut q = RequestQueue::new(4);
    let _ = q.insert(pkt(0x10), 0, 0);
    let idx = q.insert(pkt(0x20), 0, 0).unwrap();
    assert_eq!(q.find_addr(LineAddr::new(0x20)), Some(idx));
    assert_eq!(q.find_addr(LineAddr::new(0x30)), None);
}

#[test]
fn sequence_numbers_follow_arrival_order_across_slot_reuse() {
    let mut q = RequestQueue::new(2);
    let a = q.insert(pkt(1), 0, 0).unwrap();
    let b = q.insert(pkt(2), 0, 0).unwrap();
    let _ = q.remove(a).unwrap();
    // Reuses slot 0, but its sequence number is newer than slot 1's.
    let c = q.insert(pkt(3), 0, 0).unwrap();
    assert_eq!(c, a);
    assert!(q.get(c).unwrap().seq > q.get(b).unwrap().seq);
}

#[test]
fn remove_of_empty_slot_is_none() {
    let mut q = RequestQueue::new(2);
    assert!(q.remove(1).is_none());
    assert!(q.remove(5).is_none());
    assert!(q.is_empty());
}
