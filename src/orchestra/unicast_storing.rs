//! Rule 4: unicast per neighbor, RPL storing (§4.4). On init, every node
//! opens its own slot at `(H1(self)%UnicastPeriod, Co(self))`; a
//! per-neighbor dedicated slot is then opened for the current parent and
//! every direct child. The mode (receiver-based or sender-based)
//! decides who owns which option on the shared slot.

use crate::addr::{id_to_addr, Addr};
use crate::cell::{CellOptions, CellType, NeighborId};
use crate::packet::{FrameType, Packet, PacketAttrs};

use super::{co, has_neighbor_link, is_root_bound, unicast_timeslot, Rule, RuleContext, RuleQuery};

fn self_cell_options(ctx: &RuleContext) -> CellOptions {
    if ctx.config.unicast_sender_based {
        CellOptions::TX | ctx.config.unicast_slot_shared_flag
    } else {
        CellOptions::RX
    }
}

fn opposite_direction_options(ctx: &RuleContext) -> CellOptions {
    if ctx.config.unicast_sender_based {
        CellOptions::RX
    } else {
        CellOptions::TX | ctx.config.unicast_slot_shared_flag
    }
}

/// `add_uc_cell(addr)`, per §4.4: install (or refresh) `addr`'s dedicated
/// unicast cell. The base options are the *opposite* direction's, since
/// this cell is `addr`'s cell, not our own (receiver-based: we transmit
/// to it; sender-based: we receive from it); `self_cell_options` is
/// OR-ed in only when `addr` happens to share our own timeslot.
fn add_uc_cell(ctx: &mut RuleContext, handle: u16, addr: Addr) {
    let t = unicast_timeslot(ctx.config, addr);
    let self_ts = unicast_timeslot(ctx.config, ctx.addr);
    let co_self = co(ctx.config, ctx.addr);

    let mut opts = opposite_direction_options(ctx);
    if t == self_ts {
        opts |= self_cell_options(ctx);
    }

    let Some(sf) = ctx.schedule.slotframe_mut(handle) else {
        return;
    };
    if let Err(e) = sf.add_cell(opts, CellType::Normal, NeighborId::Broadcast, t, co_self, false) {
        crate::warn!("unicast_storing: {e}");
    }
}

/// `remove_uc_cell(addr)`, per §4.4: drop `addr`'s dedicated unicast
/// cell unless the timeslot is still needed by the current parent, by a
/// direct child, or is our own receive/transmit slot (in which case it
/// is re-installed in its self-only form rather than deleted).
fn remove_uc_cell(ctx: &mut RuleContext, handle: u16, addr: Addr) {
    let t = unicast_timeslot(ctx.config, addr);
    let self_ts = unicast_timeslot(ctx.config, ctx.addr);
    let co_self = co(ctx.config, ctx.addr);

    {
        let Some(sf) = ctx.schedule.slotframe(handle) else {
            return;
        };
        if sf.get_cell(t, co_self).is_none() {
            return;
        }
    }

    if let Some(parent) = ctx.state.parent_addr {
        if unicast_timeslot(ctx.config, parent) == t {
            return;
        }
    }
    if ctx
        .routing
        .direct_routes()
        .any(|route| unicast_timeslot(ctx.config, id_to_addr(route.nexthop_id)) == t)
    {
        return;
    }

    if t == self_ts {
        let opts = self_cell_options(ctx);
        if let Some(sf) = ctx.schedule.slotframe_mut(handle) {
            if let Err(e) = sf.add_cell(opts, CellType::Normal, NeighborId::Broadcast, t, co_self, false) {
                crate::warn!("unicast_storing: {e}");
            }
        }
        return;
    }

    if let Some(sf) = ctx.schedule.slotframe_mut(handle) {
        sf.remove_cell_by_timeslot_and_co(t, co_self);
    }
}

pub struct UnicastStoringRule {
    handle: u16,
    size: u16,
}

impl UnicastStoringRule {
    pub fn new() -> Self {
        Self { handle: 0, size: 0 }
    }
}

impl Rule for UnicastStoringRule {
    fn name(&self) -> &'static str {
        "unicast_storing"
    }

    fn init(&mut self, ctx: &mut RuleContext, handle: u16) {
        self.handle = handle;
        self.size = ctx.config.unicast_period;
        let self_ts = unicast_timeslot(ctx.config, ctx.addr);
        let co_self = co(ctx.config, ctx.addr);
        let opts = self_cell_options(ctx);

        let sf = ctx
            .schedule
            .add_slotframe(handle, self.name(), ctx.config.unicast_period);
        if let Err(e) = sf.add_cell(opts, CellType::Normal, NeighborId::Broadcast, self_ts, co_self, false) {
            crate::warn!("unicast_storing: {e}");
        }
        ctx.state.sf_unicast = Some(handle);
    }

    fn select_packet(&self, ctx: &RuleQuery, pkt: &Packet) -> Option<PacketAttrs> {
        if pkt.frame_type != FrameType::Data {
            return None;
        }
        let nexthop = pkt.nexthop?;
        let dst = pkt.destination?;
        if is_root_bound(ctx, pkt) {
            return None;
        }
        if !has_neighbor_link(ctx, nexthop) {
            return None;
        }

        let hashed = if ctx.config.unicast_sender_based {
            ctx.addr
        } else {
            dst
        };
        Some(PacketAttrs {
            slotframe: Some(self.handle),
            timeslot: Some(unicast_timeslot(ctx.config, hashed)),
            channel_offset: Some(co(ctx.config, dst)),
        })
    }

    fn new_time_source(&mut self, ctx: &mut RuleContext, old: Option<Addr>, new: Option<Addr>) {
        if let Some(old_addr) = old {
            remove_uc_cell(ctx, self.handle, old_addr);
        }
        if let Some(new_addr) = new {
            add_uc_cell(ctx, self.handle, new_addr);
        }
    }

    fn child_added(&mut self, ctx: &mut RuleContext, addr: Addr) {
        add_uc_cell(ctx, self.handle, addr);
    }

    fn child_removed(&mut self, ctx: &mut RuleContext, addr: Addr) {
        remove_uc_cell(ctx, self.handle, addr);
    }

    fn get_sf_size(&self) -> u16 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::orchestra::OrchestraState;
    use crate::routing::RoutingTable;
    use crate::schedule::Schedule;

    fn addr(last: u8) -> Addr {
        Addr([0, 0, 0, 0, 0, 0, 0, last])
    }

    #[test]
    fn two_node_storing_receiver_based_scenario() {
        // Scenario 1: UnicastPeriod=17. Node 1 (coordinator) gets a
        // receive cell at (H1(addr1)%17, Co(addr1)) = (1, 2); node 2 at
        // (2, 3). After node 2's parent becomes node 1, node 2 also gets
        // a Tx cell at (1, 3).
        // The scenario's literal (timeslot, channel_offset) pairs only
        // come out to (1, 2) / (2, 3) with MinCO=1; the default of 2
        // (§6) would shift both channel offsets up by one.
        let mut config = Config::default();
        config.unicast_period = 17;
        config.unicast_min_channel_offset = 1;
        config.unicast_max_channel_offset = 255;
        config.finalize();

        let node1 = addr(1);
        let node2 = addr(2);

        let mut sched1 = Schedule::new();
        let mut routing1 = RoutingTable::new();
        let mut state1 = OrchestraState::default();
        let mut rule1 = UnicastStoringRule::new();
        {
            let mut ctx = RuleContext {
                addr: node1,
                id: node1.id(),
                is_coordinator: true,
                config: &config,
                schedule: &mut sched1,
                routing: &mut routing1,
                state: &mut state1,
            };
            rule1.init(&mut ctx, 2);
        }
        let cell1 = sched1.slotframe(2).unwrap().get_cell(1, 2).unwrap();
        assert!(cell1.has_rx());

        let mut sched2 = Schedule::new();
        let mut routing2 = RoutingTable::new();
        let mut state2 = OrchestraState::default();
        let mut rule2 = UnicastStoringRule::new();
        {
            let mut ctx = RuleContext {
                addr: node2,
                id: node2.id(),
                is_coordinator: false,
                config: &config,
                schedule: &mut sched2,
                routing: &mut routing2,
                state: &mut state2,
            };
            rule2.init(&mut ctx, 2);
        }
        let cell2 = sched2.slotframe(2).unwrap().get_cell(2, 3).unwrap();
        assert!(cell2.has_rx());

        {
            let mut ctx = RuleContext {
                addr: node2,
                id: node2.id(),
                is_coordinator: false,
                config: &config,
                schedule: &mut sched2,
                routing: &mut routing2,
                state: &mut state2,
            };
            rule2.new_time_source(&mut ctx, None, Some(node1));
        }
        let tx_cell = sched2.slotframe(2).unwrap().get_cell(1, 3).unwrap();
        assert!(tx_cell.has_tx());
    }

    #[test]
    fn remove_uc_cell_leaves_only_the_self_cell_when_no_longer_needed() {
        let mut config = Config::default();
        config.unicast_period = 17;
        config.finalize();
        let self_addr = addr(1);
        let other = addr(9);

        let mut schedule = Schedule::new();
        let mut routing = RoutingTable::new();
        let mut state = OrchestraState::default();
        let mut rule = UnicastStoringRule::new();
        {
            let mut ctx = RuleContext {
                addr: self_addr,
                id: self_addr.id(),
                is_coordinator: false,
                config: &config,
                schedule: &mut schedule,
                routing: &mut routing,
                state: &mut state,
            };
            rule.init(&mut ctx, 4);
            let before = ctx.schedule.slotframe(4).unwrap().cells().to_vec();
            add_uc_cell(&mut ctx, 4, other);
            remove_uc_cell(&mut ctx, 4, other);
            let after = ctx.schedule.slotframe(4).unwrap().cells().to_vec();
            assert_eq!(before, after, "only the self cell installed at init should remain");
        }
    }

    #[test]
    fn unicast_period_one_installs_exactly_one_rx_cell_at_co_self() {
        // §8 boundary behaviour: UnicastPeriod=1 maps every node to
        // timeslot 0; the receiver-based storing rule installs exactly
        // one Rx cell per node at (0, Co(self)).
        let mut config = Config::default();
        config.unicast_period = 1;
        config.finalize();
        let self_addr = addr(1);

        let mut schedule = Schedule::new();
        let mut routing = RoutingTable::new();
        let mut state = OrchestraState::default();
        let mut rule = UnicastStoringRule::new();
        let mut ctx = RuleContext {
            addr: self_addr,
            id: self_addr.id(),
            is_coordinator: false,
            config: &config,
            schedule: &mut schedule,
            routing: &mut routing,
            state: &mut state,
        };
        rule.init(&mut ctx, 4);

        let sf = ctx.schedule.slotframe(4).unwrap();
        assert_eq!(sf.cells().len(), 1);
        let cell = sf.get_cell(0, co(&config, self_addr)).unwrap();
        assert!(cell.has_rx());
        assert!(!cell.has_tx());
    }

    #[test]
    fn parent_still_required_keeps_cell() {
        let mut config = Config::default();
        config.unicast_period = 17;
        config.finalize();
        let self_addr = addr(1);
        let parent = addr(9);

        let mut schedule = Schedule::new();
        let mut routing = RoutingTable::new();
        let mut state = OrchestraState::default();
        state.parent_addr = Some(parent);
        let mut rule = UnicastStoringRule::new();
        {
            let mut ctx = RuleContext {
                addr: self_addr,
                id: self_addr.id(),
                is_coordinator: false,
                config: &config,
                schedule: &mut schedule,
                routing: &mut routing,
                state: &mut state,
            };
            rule.init(&mut ctx, 4);
            add_uc_cell(&mut ctx, 4, parent);
            remove_uc_cell(&mut ctx, 4, parent);
        }

        assert!(!schedule.slotframe(4).unwrap().cells().is_empty());
    }
}
