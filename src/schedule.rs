//! The per-node set of slotframes, and the active-cell selection rule
//! that answers "which cell is active at ASN A?" (§4.2).

use std::collections::BTreeMap;

use crate::asn::AbsoluteSlotNumber;
use crate::cell::{Cell, NeighborId};
use crate::error::CoreError;
use crate::slotframe::Slotframe;

/// Host-provided per-neighbor queue depth, consulted by the cell
/// tie-break in §4.2. Grounded on the teacher's `MacNeighbor` trait,
/// which exposes host-owned per-neighbor stats through a narrow
/// interface rather than letting the scheduler own neighbor state.
pub trait NeighborQueue {
    /// Number of packets currently queued for `neighbor`.
    fn queue_size(&self, neighbor: NeighborId) -> usize;
}

/// Mapping `handle -> Slotframe`, ordered by handle ascending (lower
/// handle = higher priority), per §3.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    slotframes: BTreeMap<u16, Slotframe>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and insert a new slotframe of the given size under `handle`.
    pub fn add_slotframe(&mut self, handle: u16, rule_name: &'static str, size: u16) -> &mut Slotframe {
        self.slotframes
            .insert(handle, Slotframe::new(handle, rule_name, size));
        self.slotframes.get_mut(&handle).unwrap()
    }

    pub fn slotframe(&self, handle: u16) -> Option<&Slotframe> {
        self.slotframes.get(&handle)
    }

    pub fn slotframe_mut(&mut self, handle: u16) -> Option<&mut Slotframe> {
        self.slotframes.get_mut(&handle)
    }

    pub fn remove_slotframe(&mut self, handle: u16) -> Option<Slotframe> {
        self.slotframes.remove(&handle)
    }

    /// Select the active cell at the given ASN across every slotframe,
    /// per §4.2:
    ///
    /// 1. Prefer the candidate in the lowest-handle slotframe.
    /// 2. Within one slotframe, if neither candidate has `Tx`, return the
    ///    first candidate (both are `Rx`; either will do).
    /// 3. Otherwise prefer the candidate whose neighbor has the larger
    ///    queue size; ties return the first (`a`).
    ///
    /// Stable and idempotent: calling twice with no intervening mutation
    /// returns the same cell.
    pub fn select(&self, asn: AbsoluteSlotNumber, queue: &dyn NeighborQueue) -> Option<Cell> {
        for slotframe in self.slotframes.values() {
            let timeslot = asn % slotframe.size;
            let mut candidates = slotframe.cells().iter().filter(|c| c.timeslot == timeslot);
            let Some(&first) = candidates.next() else {
                continue;
            };
            let best = candidates.fold(first, |a, &b| select_best(a, b, queue));
            return Some(best);
        }
        None
    }
}

/// Pairwise reduction of two candidate cells within the same slotframe
/// and timeslot, per §4.2/§9(b). Ties (including "neither has Tx")
/// return `a`.
pub fn select_best(a: Cell, b: Cell, queue: &dyn NeighborQueue) -> Cell {
    if !a.has_tx() && !b.has_tx() {
        return a;
    }
    let qa = queue.queue_size(a.neighbor_id);
    let qb = queue.queue_size(b.neighbor_id);
    if qb > qa {
        b
    } else {
        a
    }
}

/// Add a cell at the given slotframe, surfacing [`CoreError`] the way
/// the rule engine's callbacks do (§4.5): the caller logs and continues
/// rather than aborting the node.
pub fn try_add_cell(
    schedule: &mut Schedule,
    handle: u16,
    options: crate::cell::CellOptions,
    cell_type: crate::cell::CellType,
    neighbor_id: NeighborId,
    timeslot: u16,
    channel_offset: u16,
    keep_old: bool,
) -> Result<Cell, CoreError> {
    let sf = schedule
        .slotframe_mut(handle)
        .expect("slotframe handle must be bound before use");
    sf.add_cell(options, cell_type, neighbor_id, timeslot, channel_offset, keep_old)
}
