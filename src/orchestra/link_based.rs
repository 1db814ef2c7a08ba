//! Rule 6: link-based (§4.4). Like unicast storing, but installs a pair
//! of directional cells per neighbor keyed by `H2(src, dst)` instead of
//! a single shared slot keyed by `H1`; the two directions can collide
//! with other neighbors' cells and so are kept with `keep_old = true`.

use crate::addr::Addr;
use crate::cell::{CellOptions, CellType, NeighborId};
use crate::packet::{FrameType, Packet, PacketAttrs};

use super::{co, has_neighbor_link, is_root_bound, Rule, RuleContext, RuleQuery};

fn directional_timeslots(ctx: &RuleContext, other: Addr) -> (u16, u16) {
    let t_tx = ((ctx.config.hash2)(ctx.addr, other) % ctx.config.unicast_period as u32) as u16;
    let t_rx = ((ctx.config.hash2)(other, ctx.addr) % ctx.config.unicast_period as u32) as u16;
    (t_tx, t_rx)
}

/// Install the Tx/Rx cell pair for `other`, per §4.4: a Tx cell at
/// `H2(self, other) mod UnicastPeriod` and an Rx cell at
/// `H2(other, self) mod UnicastPeriod`, both at `Co(self)`, both kept
/// alongside whatever else already occupies those slots.
fn install(ctx: &mut RuleContext, handle: u16, other: Addr) {
    let (t_tx, t_rx) = directional_timeslots(ctx, other);
    let co_self = co(ctx.config, ctx.addr);
    let Some(sf) = ctx.schedule.slotframe_mut(handle) else {
        return;
    };
    if let Err(e) = sf.add_cell(
        CellOptions::TX | CellOptions::SHARED,
        CellType::Normal,
        NeighborId::Broadcast,
        t_tx,
        co_self,
        true,
    ) {
        crate::warn!("link_based: {e}");
    }
    if let Err(e) = sf.add_cell(CellOptions::RX, CellType::Normal, NeighborId::Broadcast, t_rx, co_self, true) {
        crate::warn!("link_based: {e}");
    }
}

/// Remove exactly the cells [`install`] added for `other`, matching on
/// `(timeslot, channel_offset, options)` per §4.4.
fn uninstall(ctx: &mut RuleContext, handle: u16, other: Addr) {
    let (t_tx, t_rx) = directional_timeslots(ctx, other);
    let co_self = co(ctx.config, ctx.addr);
    let Some(sf) = ctx.schedule.slotframe_mut(handle) else {
        return;
    };
    sf.remove_cell_by_timeslot_co_and_options(t_tx, co_self, CellOptions::TX | CellOptions::SHARED);
    sf.remove_cell_by_timeslot_co_and_options(t_rx, co_self, CellOptions::RX);
}

pub struct LinkBasedRule {
    handle: u16,
    size: u16,
}

impl LinkBasedRule {
    pub fn new() -> Self {
        Self { handle: 0, size: 0 }
    }
}

impl Rule for LinkBasedRule {
    fn name(&self) -> &'static str {
        "link_based"
    }

    fn init(&mut self, ctx: &mut RuleContext, handle: u16) {
        self.handle = handle;
        self.size = ctx.config.unicast_period;
        ctx.schedule
            .add_slotframe(handle, self.name(), ctx.config.unicast_period);
        ctx.state.sf_unicast = Some(handle);
    }

    fn select_packet(&self, ctx: &RuleQuery, pkt: &Packet) -> Option<PacketAttrs> {
        if pkt.frame_type != FrameType::Data {
            return None;
        }
        let nexthop = pkt.nexthop?;
        if is_root_bound(ctx, pkt) {
            return None;
        }
        if !has_neighbor_link(ctx, nexthop) {
            return None;
        }
        let ts = ((ctx.config.hash2)(ctx.addr, nexthop) % ctx.config.unicast_period as u32) as u16;
        Some(PacketAttrs {
            slotframe: Some(self.handle),
            timeslot: Some(ts),
            channel_offset: Some(co(ctx.config, ctx.addr)),
        })
    }

    fn new_time_source(&mut self, ctx: &mut RuleContext, old: Option<Addr>, new: Option<Addr>) {
        if let Some(old_addr) = old {
            uninstall(ctx, self.handle, old_addr);
        }
        if let Some(new_addr) = new {
            install(ctx, self.handle, new_addr);
        }
    }

    fn child_added(&mut self, ctx: &mut RuleContext, addr: Addr) {
        install(ctx, self.handle, addr);
    }

    fn child_removed(&mut self, ctx: &mut RuleContext, addr: Addr) {
        uninstall(ctx, self.handle, addr);
    }

    fn get_sf_size(&self) -> u16 {
        self.size
    }
}
