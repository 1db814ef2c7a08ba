//! A single scheduled link: `(timeslot, channel_offset, slotframe_handle,
//! options, type, neighbor_id)`, per §3.

use bitflags::bitflags;

bitflags! {
    /// Cell option bitset, per §3/§4.1: `Tx = 1`, `Rx = 2`, `Shared = 4`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CellOptions: u8 {
        const TX = 0b001;
        const RX = 0b010;
        const SHARED = 0b100;
    }
}

/// Cell type, per §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    Normal,
    Advertising,
    AdvertisingOnly,
}

/// `neighbor_id ∈ ℤ ∪ {Broadcast, EB}`, per §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NeighborId {
    /// A specific neighbor, by 16-bit id.
    Id(u16),
    Broadcast,
    Eb,
}

impl NeighborId {
    /// A cell is "dedicated" when its neighbor is not the broadcast id,
    /// per §4.1.
    pub fn is_dedicated(&self) -> bool {
        !matches!(self, NeighborId::Broadcast)
    }
}

/// A single scheduled link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub timeslot: u16,
    pub channel_offset: u16,
    pub slotframe_handle: u16,
    pub options: CellOptions,
    pub cell_type: CellType,
    pub neighbor_id: NeighborId,
}

impl Cell {
    /// Whether this cell carries the `Tx` option.
    pub fn has_tx(&self) -> bool {
        self.options.contains(CellOptions::TX)
    }

    /// Whether this cell carries the `Rx` option.
    pub fn has_rx(&self) -> bool {
        self.options.contains(CellOptions::RX)
    }
}
