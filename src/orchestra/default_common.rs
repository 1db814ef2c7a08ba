//! Rule 1: default common (§4.4). The fallback rule: every outgoing
//! packet that no other rule claims lands on the shared common cell at
//! timeslot 0. Configured last.

use crate::cell::{CellOptions, NeighborId};
use crate::packet::{Packet, PacketAttrs};

use super::{Rule, RuleContext, RuleQuery};

pub struct DefaultCommonRule {
    handle: u16,
    size: u16,
}

impl DefaultCommonRule {
    pub fn new() -> Self {
        Self { handle: 0, size: 0 }
    }
}

impl Rule for DefaultCommonRule {
    fn name(&self) -> &'static str {
        "default_common"
    }

    fn init(&mut self, ctx: &mut RuleContext, handle: u16) {
        self.handle = handle;
        self.size = ctx.config.common_shared_period;
        let cell_type = ctx.config.common_shared_type;
        let sf = ctx
            .schedule
            .add_slotframe(handle, self.name(), ctx.config.common_shared_period);
        if let Err(e) = sf.add_cell(
            CellOptions::TX | CellOptions::RX | CellOptions::SHARED,
            cell_type,
            NeighborId::Broadcast,
            0,
            ctx.config.default_common_channel_offset,
            false,
        ) {
            crate::warn!("default_common: {e}");
        }
        ctx.state.sf_common = Some(handle);
    }

    fn select_packet(&self, _ctx: &RuleQuery, _pkt: &Packet) -> Option<PacketAttrs> {
        Some(PacketAttrs {
            slotframe: Some(self.handle),
            timeslot: Some(0),
            channel_offset: None,
        })
    }

    fn get_sf_size(&self) -> u16 {
        self.size
    }
}
