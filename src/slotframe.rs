//! An ordered collection of cells of fixed period, per §3/§4.1.

use crate::cell::{Cell, CellOptions, CellType, NeighborId};
use crate::error::CoreError;

/// `(handle, rule_name, size, cells)`, per §3.
#[derive(Debug, Clone)]
pub struct Slotframe {
    pub handle: u16,
    pub rule_name: &'static str,
    pub size: u16,
    cells: Vec<Cell>,
}

impl Slotframe {
    pub fn new(handle: u16, rule_name: &'static str, size: u16) -> Self {
        Self {
            handle,
            rule_name,
            size,
            cells: Vec::new(),
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Add a cell at `(timeslot, channel_offset)`. If `timeslot >= size`,
    /// fails with [`CoreError::InvalidTimeslot`] and installs nothing. If
    /// `keep_old` is false, any existing cells at the same
    /// `(timeslot, channel_offset)` are removed first; the new cell is
    /// then appended, per §4.1.
    pub fn add_cell(
        &mut self,
        options: CellOptions,
        cell_type: CellType,
        neighbor_id: NeighborId,
        timeslot: u16,
        channel_offset: u16,
        keep_old: bool,
    ) -> Result<Cell, CoreError> {
        if timeslot >= self.size {
            return Err(CoreError::InvalidTimeslot {
                handle: self.handle,
                timeslot,
                size: self.size,
            });
        }

        if !keep_old {
            self.cells
                .retain(|c| !(c.timeslot == timeslot && c.channel_offset == channel_offset));
        }

        let cell = Cell {
            timeslot,
            channel_offset,
            slotframe_handle: self.handle,
            options,
            cell_type,
            neighbor_id,
        };
        self.cells.push(cell);
        Ok(cell)
    }

    /// First cell matching `(timeslot, channel_offset)`, or none.
    pub fn get_cell(&self, timeslot: u16, channel_offset: u16) -> Option<Cell> {
        self.cells
            .iter()
            .find(|c| c.timeslot == timeslot && c.channel_offset == channel_offset)
            .copied()
    }

    /// Remove every cell at `timeslot`, regardless of channel offset.
    /// Returns whether any cell was removed.
    pub fn remove_cell_by_timeslot(&mut self, timeslot: u16) -> bool {
        let before = self.cells.len();
        self.cells.retain(|c| c.timeslot != timeslot);
        self.cells.len() != before
    }

    /// Remove every cell at `(timeslot, channel_offset)`. Returns whether
    /// any cell was removed.
    pub fn remove_cell_by_timeslot_and_co(&mut self, timeslot: u16, channel_offset: u16) -> bool {
        let before = self.cells.len();
        self.cells
            .retain(|c| !(c.timeslot == timeslot && c.channel_offset == channel_offset));
        self.cells.len() != before
    }

    /// Remove every cell at `(timeslot, channel_offset)` whose options
    /// exactly match `options`. Returns whether any cell was removed.
    pub fn remove_cell_by_timeslot_co_and_options(
        &mut self,
        timeslot: u16,
        channel_offset: u16,
        options: CellOptions,
    ) -> bool {
        let before = self.cells.len();
        self.cells.retain(|c| {
            !(c.timeslot == timeslot && c.channel_offset == channel_offset && c.options == options)
        });
        self.cells.len() != before
    }
}
