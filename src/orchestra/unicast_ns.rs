//! Rule 3: unicast per neighbor, RPL non-storing (§4.4). Every node gets
//! one shared Tx/Rx slot per timeslot of the unicast slotframe, with its
//! own slot additionally open for Rx.

use crate::cell::{CellOptions, CellType, NeighborId};
use crate::packet::{FrameType, Packet, PacketAttrs};

use super::{co, is_root_bound, unicast_timeslot, Rule, RuleContext, RuleQuery};

pub struct UnicastNsRule {
    handle: u16,
    size: u16,
}

impl UnicastNsRule {
    pub fn new() -> Self {
        Self { handle: 0, size: 0 }
    }
}

impl Rule for UnicastNsRule {
    fn name(&self) -> &'static str {
        "unicast_ns"
    }

    fn init(&mut self, ctx: &mut RuleContext, handle: u16) {
        self.handle = handle;
        self.size = ctx.config.unicast_period;
        let self_ts = unicast_timeslot(ctx.config, ctx.addr);
        let co_self = co(ctx.config, ctx.addr);

        let sf = ctx
            .schedule
            .add_slotframe(handle, self.name(), ctx.config.unicast_period);
        for i in 0..ctx.config.unicast_period {
            let mut opts = CellOptions::SHARED | CellOptions::TX;
            if i == self_ts {
                opts |= CellOptions::RX;
            }
            if let Err(e) = sf.add_cell(opts, CellType::Normal, NeighborId::Broadcast, i, co_self, true) {
                crate::warn!("unicast_ns: {e}");
            }
        }
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
        Some(PacketAttrs {
            slotframe: Some(self.handle),
            timeslot: Some(unicast_timeslot(ctx.config, nexthop)),
            channel_offset: Some(co(ctx.config, nexthop)),
        })
    }

    fn get_sf_size(&self) -> u16 {
        self.size
    }
}
