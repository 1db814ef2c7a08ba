//! The Orchestra autonomous scheduler: five composable rules (§4.4) plus
//! the dispatch glue that installs/updates cells on routing events and
//! picks `(slotframe, timeslot, channel_offset)` for outgoing packets.
//!
//! Each rule is its own module, mirroring how the teacher splits
//! `tsch/{frame, frame_buffer, neighbor, slotframe}` into one file per
//! concern under one `tsch` module.

mod default_common;
mod eb_per_time_source;
mod link_based;
mod special_for_root;
mod unicast_ns;
mod unicast_storing;

use std::collections::BTreeSet;

use crate::addr::Addr;
use crate::config::Config;
use crate::packet::{Packet, PacketAttrs};
use crate::routing::RoutingTable;
use crate::schedule::Schedule;

pub use default_common::DefaultCommonRule;
pub use eb_per_time_source::{eb_get_node_timeslot, EbPerTimeSourceRule, NO_TIMESLOT};
pub use link_based::LinkBasedRule;
pub use special_for_root::SpecialForRootRule;
pub use unicast_ns::UnicastNsRule;
pub use unicast_storing::UnicastStoringRule;

/// Cross-rule state a node's scheduler keeps, per §3 "node scheduler
/// state": parent tracking, known roots, and the slotframe handles each
/// rule binds at `init` so other rules (and the host) can find them by
/// name rather than by re-deriving the handle.
#[derive(Debug, Default)]
pub struct OrchestraState {
    pub parent_addr: Option<Addr>,
    pub parent_knows_us: bool,
    pub known_roots: BTreeSet<u16>,
    pub sf_common: Option<u16>,
    pub sf_eb: Option<u16>,
    pub sf_unicast: Option<u16>,
    pub sf_to_root: Option<u16>,
}

/// Mutable context a rule callback other than `select_packet` gets: the
/// node's identity, its (read-only after `finalize`) configuration, and
/// mutable access to its schedule, routing table and the cross-rule
/// state above.
pub struct RuleContext<'a> {
    pub addr: Addr,
    pub id: u16,
    pub is_coordinator: bool,
    pub config: &'a Config,
    pub schedule: &'a mut Schedule,
    pub routing: &'a mut RoutingTable,
    pub state: &'a mut OrchestraState,
}

/// Read-only counterpart of [`RuleContext`], used by `select_packet`:
/// picking a packet's cell never mutates the schedule or routing table.
pub struct RuleQuery<'a> {
    pub addr: Addr,
    pub id: u16,
    pub is_coordinator: bool,
    pub config: &'a Config,
    pub schedule: &'a Schedule,
    pub routing: &'a RoutingTable,
    pub state: &'a OrchestraState,
}

/// A single Orchestra rule, per §4.4: "a record of callbacks". Every
/// callback but `init` and `select_packet` is optional and defaults to a
/// no-op, matching the spec's "missing callback is a no-op" note (§9).
pub trait Rule: Send {
    /// The rule's name, as it appears in `OrchestraRules`.
    fn name(&self) -> &'static str;

    /// Create the rule's slotframe(s) and initial cells under `handle`.
    fn init(&mut self, ctx: &mut RuleContext, handle: u16);

    /// Pick `(slotframe, timeslot, channel_offset)` for `pkt`, or `None`
    /// if this rule does not handle it.
    fn select_packet(&self, ctx: &RuleQuery, pkt: &Packet) -> Option<PacketAttrs>;

    fn new_time_source(&mut self, _ctx: &mut RuleContext, _old: Option<Addr>, _new: Option<Addr>) {}
    fn child_added(&mut self, _ctx: &mut RuleContext, _addr: Addr) {}
    fn child_removed(&mut self, _ctx: &mut RuleContext, _addr: Addr) {}
    fn root_updated(&mut self, _ctx: &mut RuleContext, _root_id: u16, _is_added: bool) {}
    /// Fired when this node transitions into the coordinator role after
    /// `init` already ran (§6 `on_node_becomes_root`). Not part of the
    /// spec's callback list verbatim: it is the only way to apply the
    /// coordinator-only branch of rule 5's `init` retroactively, so it is
    /// added as one more optional, no-op-by-default callback in the same
    /// style as the rest (see `DESIGN.md`).
    fn on_become_root(&mut self, _ctx: &mut RuleContext) {}

    /// The slotframe size this rule installed at `init`.
    fn get_sf_size(&self) -> u16;
}

/// Look up a rule constructor by `OrchestraRules` name. Returns `None`
/// for a name that isn't one of the six registered rules; the caller
/// logs [`crate::error::CoreError::UnknownRule`] and skips it (§7).
pub fn make_rule(name: &str) -> Option<Box<dyn Rule>> {
    match name {
        "default_common" => Some(Box::new(DefaultCommonRule::new())),
        "eb_per_time_source" => Some(Box::new(EbPerTimeSourceRule::new())),
        "unicast_ns" => Some(Box::new(UnicastNsRule::new())),
        "unicast_storing" => Some(Box::new(UnicastStoringRule::new())),
        "link_based" => Some(Box::new(LinkBasedRule::new())),
        "special_for_root" => Some(Box::new(SpecialForRootRule::new())),
        _ => None,
    }
}

/// The Orchestra engine itself: the ordered rule list plus the
/// cross-rule state of [`OrchestraState`].
#[derive(Default)]
pub struct Orchestra {
    pub(crate) rules: Vec<Box<dyn Rule>>,
    pub state: OrchestraState,
}

impl Orchestra {
    /// Rules in configured order, for inspection/testing.
    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }
}

/// `Co(addr) = H1(addr) mod (MaxCO - MinCO + 1) + MinCO`, per §4.4,
/// shared by every rule that places per-neighbor unicast cells.
pub(crate) fn co(config: &Config, addr: Addr) -> u16 {
    let span = (config.unicast_max_channel_offset - config.unicast_min_channel_offset) as u32 + 1;
    let hashed = (config.hash1)(addr) % span;
    hashed as u16 + config.unicast_min_channel_offset
}

/// `H1(addr) mod UnicastPeriod`, the timeslot a neighbor's unicast cell
/// lands on (§4.4, rules 3/4/6).
pub(crate) fn unicast_timeslot(config: &Config, addr: Addr) -> u16 {
    ((config.hash1)(addr) % config.unicast_period as u32) as u16
}

/// Whether `pkt` is addressed to a known root and a root-specific
/// slotframe is active for it, in which case rules 3/4/6 defer to rule 5
/// (§4.4: "no active root schedule").
pub(crate) fn is_root_bound(ctx: &RuleQuery, pkt: &Packet) -> bool {
    ctx.state.sf_to_root.is_some()
        && pkt
            .destination_id()
            .map_or(false, |dst| ctx.state.known_roots.contains(&dst))
}

/// A neighbor "has a unicast cell", per §4.4 rule 4: it is the current
/// parent (and either sender-based addressing is in use, or the parent
/// has ACKed our DAO), or it is a direct child (a route whose next hop
/// is itself). Shared by rules 4 and 6, which install cells under the
/// same condition.
pub(crate) fn has_neighbor_link(ctx: &RuleQuery, addr: Addr) -> bool {
    if ctx.state.parent_addr == Some(addr) {
        return ctx.config.unicast_sender_based || ctx.state.parent_knows_us;
    }
    let id = addr.id();
    ctx.routing.direct_routes().any(|route| route.nexthop_id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_rule_rejects_unknown_names() {
        assert!(make_rule("default_common").is_some());
        assert!(make_rule("not_a_real_rule").is_none());
    }

    #[test]
    fn co_formula() {
        let mut cfg = Config::default();
        cfg.unicast_min_channel_offset = 2;
        cfg.unicast_max_channel_offset = 255;
        let addr = Addr([0, 0, 0, 0, 0, 0, 0, 10]);
        assert_eq!(co(&cfg, addr), 10 % 254 + 2);
    }
}
