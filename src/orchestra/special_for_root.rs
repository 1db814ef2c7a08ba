//! Rule 5: special-for-root (§4.4). Gives every node a slot towards
//! each known RPL root; a coordinator additionally keeps a dedicated
//! receive-only slotframe open on its own channel offset.

use crate::addr::{id_to_addr, Addr};
use crate::cell::{CellOptions, CellType, NeighborId};
use crate::packet::{FrameType, Packet, PacketAttrs};

use super::{co, Rule, RuleContext, RuleQuery};

/// `handle | 0x8000`, the tag the coordinator-only receive slotframe
/// uses so it never collides with a regular rule handle (§4.4).
const COORDINATOR_HANDLE_TAG: u16 = 0x8000;

pub struct SpecialForRootRule {
    handle: u16,
    size: u16,
}

impl SpecialForRootRule {
    pub fn new() -> Self {
        Self { handle: 0, size: 0 }
    }

    fn install_coordinator_rx(&self, ctx: &mut RuleContext) {
        let co_self = co(ctx.config, ctx.addr);
        let coordinator_handle = self.handle | COORDINATOR_HANDLE_TAG;
        let sf = ctx
            .schedule
            .add_slotframe(coordinator_handle, self.name(), 1);
        if let Err(e) = sf.add_cell(CellOptions::RX, CellType::Normal, NeighborId::Broadcast, 0, co_self, false) {
            crate::warn!("special_for_root: {e}");
        }
    }
}

impl Rule for SpecialForRootRule {
    fn name(&self) -> &'static str {
        "special_for_root"
    }

    fn init(&mut self, ctx: &mut RuleContext, handle: u16) {
        self.handle = handle;
        self.size = ctx.config.root_period;
        ctx.schedule
            .add_slotframe(handle, self.name(), ctx.config.root_period);
        ctx.state.sf_to_root = Some(handle);

        if ctx.is_coordinator {
            self.install_coordinator_rx(ctx);
        }
    }

    fn select_packet(&self, ctx: &RuleQuery, pkt: &Packet) -> Option<PacketAttrs> {
        if ctx.is_coordinator || pkt.frame_type != FrameType::Data {
            return None;
        }
        let dst = pkt.destination?;
        if !ctx.state.known_roots.contains(&dst.id()) {
            return None;
        }
        let ts = ((ctx.config.hash1)(ctx.addr) % ctx.config.root_period as u32) as u16;
        Some(PacketAttrs {
            slotframe: Some(self.handle),
            timeslot: Some(ts),
            channel_offset: Some(co(ctx.config, dst)),
        })
    }

    /// Root removal is explicitly unsupported (§4.4, §9 Open Question
    /// (a)): `is_added == false` is a no-op.
    fn root_updated(&mut self, ctx: &mut RuleContext, root_id: u16, is_added: bool) {
        if !is_added {
            return;
        }
        let ts = ((ctx.config.hash1)(ctx.addr) % ctx.config.root_period as u32) as u16;
        let offset = co(ctx.config, id_to_addr(root_id));
        if let Some(sf) = ctx.schedule.slotframe_mut(self.handle) {
            if let Err(e) = sf.add_cell(
                CellOptions::TX | CellOptions::SHARED,
                CellType::Normal,
                NeighborId::Broadcast,
                ts,
                offset,
                false,
            ) {
                crate::warn!("special_for_root: {e}");
            }
        }
    }

    fn on_become_root(&mut self, ctx: &mut RuleContext) {
        self.install_coordinator_rx(ctx);
    }

    fn get_sf_size(&self) -> u16 {
        self.size
    }
}
