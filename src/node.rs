//! `NodeState`: the per-node aggregate that wires the schedule, routing
//! table and Orchestra rule engine together and exposes the downward
//! interface (§6) the surrounding simulator drives.

use crate::addr::Addr;
use crate::config::Config;
use crate::orchestra::{make_rule, Orchestra, Rule, RuleContext, RuleQuery};
use crate::packet::{Packet, PacketAttrs};
use crate::routing::RoutingTable;
use crate::schedule::Schedule;

/// Everything a single simulated node carries in this core: its
/// identity, its (finalized) configuration, its TSCH schedule, its
/// routing table, and the Orchestra engine that keeps them in sync.
///
/// This is the crate's `Node` aggregate (`SPEC_FULL.md` §1.1): the
/// teacher wires PHY, MAC and upper layers behind an async `TschDevice`;
/// here the PHY and upper-layer collaborators are external (§6) and this
/// struct just holds the three subsystems the core is responsible for.
pub struct NodeState {
    pub addr: Addr,
    pub id: u16,
    pub is_coordinator: bool,
    pub config: Config,
    pub schedule: Schedule,
    pub routing: RoutingTable,
    pub orchestra: Orchestra,
}

impl NodeState {
    /// Build a node's state. `config` is finalized (§9 "global
    /// configuration") before being stored; callers never need to call
    /// [`Config::finalize`] themselves.
    pub fn new(addr: Addr, is_coordinator: bool, mut config: Config) -> Self {
        config.finalize();
        Self {
            addr,
            id: addr.id(),
            is_coordinator,
            config,
            schedule: Schedule::new(),
            routing: RoutingTable::new(),
            orchestra: Orchestra::default(),
        }
    }

    /// Build the configured rule list and run each rule's `init`,
    /// installing its slotframes and initial cells (§6 `node_init`).
    /// Rule names in `config.orchestra_rules` that aren't registered are
    /// logged and skipped (§7 `UnknownRule`); the node proceeds with the
    /// remaining rules.
    pub fn init(&mut self) {
        let mut rules: Vec<Box<dyn Rule>> = Vec::new();
        for name in &self.config.orchestra_rules {
            match make_rule(name) {
                Some(rule) => rules.push(rule),
                None => crate::warn!("unknown Orchestra rule {name:?}; skipping"),
            }
        }
        self.orchestra.rules = rules;

        let NodeState {
            addr,
            id,
            is_coordinator,
            config,
            schedule,
            routing,
            orchestra,
        } = self;
        let mut ctx = RuleContext {
            addr: *addr,
            id: *id,
            is_coordinator: *is_coordinator,
            config,
            schedule,
            routing,
            state: &mut orchestra.state,
        };
        for (index, rule) in orchestra.rules.iter_mut().enumerate() {
            let handle = (index + 1) as u16;
            rule.init(&mut ctx, handle);
        }
    }

    /// Borrow every field but `orchestra.rules` as a [`RuleContext`] and
    /// hand it, together with the rule list, to `f`. Splitting the
    /// borrow this way is what lets callbacks mutate the schedule/routing
    /// table/cross-rule state while also iterating the rule list that
    /// lives in the same `orchestra` field.
    fn with_rules<R>(&mut self, f: impl FnOnce(&mut RuleContext, &mut [Box<dyn Rule>]) -> R) -> R {
        let NodeState {
            addr,
            id,
            is_coordinator,
            config,
            schedule,
            routing,
            orchestra,
        } = self;
        let mut ctx = RuleContext {
            addr: *addr,
            id: *id,
            is_coordinator: *is_coordinator,
            config,
            schedule,
            routing,
            state: &mut orchestra.state,
        };
        f(&mut ctx, &mut orchestra.rules)
    }

    /// §6 `on_new_time_source`: the MAC-layer time source (= the RPL
    /// parent, per §4.5's explicit caveat) changed. Resets
    /// "parent-knows-us" per §3, then dispatches to every rule in order.
    pub fn on_new_time_source(&mut self, old: Option<Addr>, new: Option<Addr>) {
        self.with_rules(|ctx, rules| {
            ctx.state.parent_addr = new;
            ctx.state.parent_knows_us = false;
            for rule in rules.iter_mut() {
                rule.new_time_source(ctx, old, new);
            }
        });
    }

    /// §6 `on_child_added`.
    pub fn on_child_added(&mut self, addr: Addr) {
        self.with_rules(|ctx, rules| {
            for rule in rules.iter_mut() {
                rule.child_added(ctx, addr);
            }
        });
    }

    /// §6 `on_child_removed`.
    pub fn on_child_removed(&mut self, addr: Addr) {
        self.with_rules(|ctx, rules| {
            for rule in rules.iter_mut() {
                rule.child_removed(ctx, addr);
            }
        });
    }

    /// §6 `on_tx`: only the DAO-ACK case is handled (§4.4's parent
    /// tracking state machine: `ParentDoesNotKnowUs -> ParentKnowsUs` on
    /// a successful transmission of an ICMPv6 DAO to the current parent).
    pub fn on_tx(&mut self, packet: &Packet, success: bool) {
        if !success || !packet.is_dao {
            return;
        }
        if let (Some(nexthop), Some(parent)) = (packet.nexthop, self.orchestra.state.parent_addr) {
            if nexthop == parent {
                self.orchestra.state.parent_knows_us = true;
            }
        }
    }

    /// §6 `on_packet_ready`: set `packet.attrs` from the first rule (in
    /// configured order) whose `select_packet` matches, or the "any"
    /// sentinel if none does. Returns whether a rule matched.
    pub fn on_packet_ready(&mut self, packet: &mut Packet) -> bool {
        let query = RuleQuery {
            addr: self.addr,
            id: self.id,
            is_coordinator: self.is_coordinator,
            config: &self.config,
            schedule: &self.schedule,
            routing: &self.routing,
            state: &self.orchestra.state,
        };
        for rule in self.orchestra.rules.iter() {
            if let Some(attrs) = rule.select_packet(&query, packet) {
                packet.attrs = attrs;
                return true;
            }
        }
        packet.attrs = PacketAttrs::default();
        false
    }

    /// §6 `add_root`: record a newly discovered RPL root and dispatch
    /// `root_updated(root_id, true)` to every rule. A root already known
    /// is a no-op (root removal is unsupported, §4.4/§9 Open Question
    /// (a); there is no matching `remove_root`).
    pub fn add_root(&mut self, root_id: u16) {
        let is_new = self.orchestra.state.known_roots.insert(root_id);
        if !is_new {
            return;
        }
        self.with_rules(|ctx, rules| {
            for rule in rules.iter_mut() {
                rule.root_updated(ctx, root_id, true);
            }
        });
    }

    /// §6 `on_node_becomes_root`: this node is promoted to coordinator
    /// after `init` already ran. Dispatches the `on_become_root`
    /// callback (see `DESIGN.md` for why this extra optional callback
    /// exists) so rule 5 can retroactively install its coordinator-only
    /// receive slotframe.
    pub fn on_node_becomes_root(&mut self) {
        self.is_coordinator = true;
        self.with_rules(|ctx, rules| {
            for rule in rules.iter_mut() {
                rule.on_become_root(ctx);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::FrameType;

    fn addr(last: u8) -> Addr {
        Addr([0, 0, 0, 0, 0, 0, 0, last])
    }

    #[test]
    fn unknown_rule_name_is_skipped_not_fatal() {
        let mut config = Config::default();
        config.orchestra_rules = vec!["default_common".to_string(), "not_a_rule".to_string()];
        let mut node = NodeState::new(addr(1), false, config);
        node.init();
        assert_eq!(node.orchestra.rules().len(), 1);
        assert_eq!(node.orchestra.rules()[0].name(), "default_common");
    }

    #[test]
    fn packet_ready_falls_back_to_default_common() {
        let mut config = Config::default();
        config.orchestra_rules = vec!["default_common".to_string()];
        let mut node = NodeState::new(addr(1), false, config);
        node.init();

        let mut pkt = Packet::new(FrameType::Data, addr(1));
        pkt.destination = Some(addr(9));
        pkt.nexthop = Some(addr(9));
        assert!(node.on_packet_ready(&mut pkt));
        assert_eq!(pkt.attrs.timeslot, Some(0));
    }

    #[test]
    fn no_matching_rule_uses_any_sentinel() {
        let mut config = Config::default();
        config.orchestra_rules = vec!["eb_per_time_source".to_string()];
        let mut node = NodeState::new(addr(1), false, config);
        node.init();

        let mut pkt = Packet::new(FrameType::Data, addr(1));
        assert!(!node.on_packet_ready(&mut pkt));
        assert_eq!(pkt.attrs, PacketAttrs::default());
    }

    #[test]
    fn dao_ack_sets_parent_knows_us_only_for_current_parent() {
        let config = Config::default();
        let mut node = NodeState::new(addr(1), false, config);
        node.init();
        node.on_new_time_source(None, Some(addr(2)));
        assert!(!node.orchestra.state.parent_knows_us);

        let mut dao = Packet::new(FrameType::Data, addr(1));
        dao.is_dao = true;
        dao.nexthop = Some(addr(99));
        node.on_tx(&dao, true);
        assert!(!node.orchestra.state.parent_knows_us, "ack from a non-parent must not count");

        dao.nexthop = Some(addr(2));
        node.on_tx(&dao, true);
        assert!(node.orchestra.state.parent_knows_us);
    }

    #[test]
    fn parent_change_resets_parent_knows_us() {
        let config = Config::default();
        let mut node = NodeState::new(addr(1), false, config);
        node.init();
        node.on_new_time_source(None, Some(addr(2)));

        let mut dao = Packet::new(FrameType::Data, addr(1));
        dao.is_dao = true;
        dao.nexthop = Some(addr(2));
        node.on_tx(&dao, true);
        assert!(node.orchestra.state.parent_knows_us);

        node.on_new_time_source(Some(addr(2)), Some(addr(3)));
        assert!(!node.orchestra.state.parent_knows_us);
    }

    #[test]
    fn add_root_twice_only_dispatches_once() {
        let mut config = Config::default();
        config.orchestra_rules = vec!["special_for_root".to_string()];
        config.root_period = 7;
        let mut node = NodeState::new(addr(3), false, config);
        node.init();

        node.add_root(1);
        let sf_handle = node.orchestra.state.sf_to_root.unwrap();
        let cells_after_first = node.schedule.slotframe(sf_handle).unwrap().cells().to_vec();

        node.add_root(1);
        let cells_after_second = node.schedule.slotframe(sf_handle).unwrap().cells().to_vec();
        assert_eq!(cells_after_first, cells_after_second);
    }
}
