//! Rule 2: EB-per-time-source (§4.4). Every node owns a distinct
//! enhanced-beacon timeslot derived from its own address; the rule keeps
//! a receive cell open on its current parent's beacon slot.

use crate::addr::Addr;
use crate::cell::{CellOptions, CellType, NeighborId};
use crate::config::Config;
use crate::packet::{FrameType, Packet, PacketAttrs};

use super::{Rule, RuleContext, RuleQuery};

/// Sentinel returned by [`eb_get_node_timeslot`] when `EBPeriod == 0`
/// (§8 boundary behaviour): no EB cell exists for anyone.
pub const NO_TIMESLOT: u32 = 0xFFFF_FFFF;

/// `H1(addr) mod EBPeriod`, or [`NO_TIMESLOT`] if `EBPeriod == 0`.
pub fn eb_get_node_timeslot(config: &Config, addr: Addr) -> u32 {
    if config.eb_period == 0 {
        return NO_TIMESLOT;
    }
    (config.hash1)(addr) % config.eb_period as u32
}

pub struct EbPerTimeSourceRule {
    handle: u16,
    size: u16,
    t_self: u32,
}

impl EbPerTimeSourceRule {
    pub fn new() -> Self {
        Self {
            handle: 0,
            size: 0,
            t_self: NO_TIMESLOT,
        }
    }
}

impl Rule for EbPerTimeSourceRule {
    fn name(&self) -> &'static str {
        "eb_per_time_source"
    }

    fn init(&mut self, ctx: &mut RuleContext, handle: u16) {
        self.handle = handle;
        self.size = ctx.config.eb_period;
        self.t_self = eb_get_node_timeslot(ctx.config, ctx.addr);

        let sf = ctx
            .schedule
            .add_slotframe(handle, self.name(), ctx.config.eb_period);
        ctx.state.sf_eb = Some(handle);

        if self.t_self == NO_TIMESLOT {
            return;
        }
        if let Err(e) = sf.add_cell(
            CellOptions::TX,
            CellType::AdvertisingOnly,
            NeighborId::Broadcast,
            self.t_self as u16,
            ctx.config.eb_channel_offset,
            false,
        ) {
            crate::warn!("eb_per_time_source: {e}");
        }
    }

    fn select_packet(&self, _ctx: &RuleQuery, pkt: &Packet) -> Option<PacketAttrs> {
        if pkt.frame_type != FrameType::Beacon || self.t_self == NO_TIMESLOT {
            return None;
        }
        Some(PacketAttrs {
            slotframe: Some(self.handle),
            timeslot: Some(self.t_self as u16),
            channel_offset: None,
        })
    }

    fn new_time_source(&mut self, ctx: &mut RuleContext, old: Option<Addr>, new: Option<Addr>) {
        let Some(sf) = ctx.schedule.slotframe_mut(self.handle) else {
            return;
        };

        if let Some(old_addr) = old {
            let t_old = eb_get_node_timeslot(ctx.config, old_addr);
            if t_old != NO_TIMESLOT {
                let ts = t_old as u16;
                if self.t_self != NO_TIMESLOT && ts == self.t_self as u16 {
                    if let Err(e) = sf.add_cell(
                        CellOptions::TX,
                        CellType::AdvertisingOnly,
                        NeighborId::Broadcast,
                        ts,
                        ctx.config.eb_channel_offset,
                        false,
                    ) {
                        crate::warn!("eb_per_time_source: {e}");
                    }
                } else {
                    sf.remove_cell_by_timeslot(ts);
                }
            }
        }

        if let Some(new_addr) = new {
            let t_new = eb_get_node_timeslot(ctx.config, new_addr);
            if t_new != NO_TIMESLOT {
                let ts = t_new as u16;
                let mut opts = CellOptions::RX;
                if self.t_self != NO_TIMESLOT && ts == self.t_self as u16 {
                    opts |= CellOptions::TX;
                }
                if let Err(e) = sf.add_cell(
                    opts,
                    CellType::AdvertisingOnly,
                    NeighborId::Broadcast,
                    ts,
                    ctx.config.eb_channel_offset,
                    false,
                ) {
                    crate::warn!("eb_per_time_source: {e}");
                }
            }
        }
    }

    fn get_sf_size(&self) -> u16 {
        self.size
    }
}
