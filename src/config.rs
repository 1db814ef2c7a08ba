//! Configuration keys consumed by the core (§6), with the documented
//! defaults, plus the two fields the rule engine derives once at
//! `finalize()` (§5, §9 "global configuration").

use serde::{Deserialize, Serialize};

use crate::addr::{default_hash1, default_hash2, HashFn1, HashFn2};
use crate::cell::{CellOptions, CellType};

fn default_orchestra_rules() -> Vec<String> {
    // eb_per_time_source + unicast_storing + default_common (fallback,
    // placed last per §4.4) is the minimal combination that gets a node
    // beaconing, talking to its RPL parent/children, and still landing
    // on a shared cell when neither of the first two rules matches.
    vec![
        "eb_per_time_source".to_string(),
        "unicast_storing".to_string(),
        "default_common".to_string(),
    ]
}

fn default_hash1_fn() -> HashFn1 {
    default_hash1
}

fn default_hash2_fn() -> HashFn2 {
    default_hash2
}

fn default_shared_flag() -> CellOptions {
    CellOptions::SHARED
}

fn default_common_type() -> CellType {
    CellType::Advertising
}

/// `OrchestraRules` and the per-rule tunables of §6, all with the
/// documented defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ordered list of rule identifiers from `{default_common,
    /// eb_per_time_source, unicast_ns, unicast_storing, link_based,
    /// special_for_root}`. Order is priority: lower index -> lower
    /// slotframe handle -> higher priority (§3, §4.2).
    pub orchestra_rules: Vec<String>,
    pub eb_period: u16,
    pub common_shared_period: u16,
    pub unicast_period: u16,
    pub root_period: u16,
    pub unicast_sender_based: bool,
    #[serde(skip, default = "default_hash1_fn")]
    pub hash1: HashFn1,
    #[serde(skip, default = "default_hash2_fn")]
    pub hash2: HashFn2,
    pub max_hash: u32,
    pub collision_free_hash: bool,
    pub eb_channel_offset: u16,
    pub default_common_channel_offset: u16,
    pub unicast_min_channel_offset: u16,
    pub unicast_max_channel_offset: u16,

    /// Derived by [`Config::finalize`]; not part of the serialized form.
    #[serde(skip, default = "default_shared_flag")]
    pub(crate) unicast_slot_shared_flag: CellOptions,
    /// Derived by [`Config::finalize`]; not part of the serialized form.
    #[serde(skip, default = "default_common_type")]
    pub(crate) common_shared_type: CellType,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            orchestra_rules: default_orchestra_rules(),
            eb_period: 397,
            common_shared_period: 31,
            unicast_period: 17,
            root_period: 7,
            unicast_sender_based: false,
            hash1: default_hash1,
            hash2: default_hash2,
            max_hash: 0x7FFF,
            collision_free_hash: false,
            eb_channel_offset: 0,
            default_common_channel_offset: 1,
            unicast_min_channel_offset: 2,
            unicast_max_channel_offset: 255,
            unicast_slot_shared_flag: CellOptions::SHARED,
            common_shared_type: CellType::Advertising,
        }
    }
}

impl Config {
    /// Derive `unicast_slot_shared_flag` and `common_shared_type` from
    /// the rest of the configuration. Must be called once before
    /// [`crate::node::NodeState::init`] (`NodeState::new` does this for
    /// callers); per §4.4/§5/§9, both fields are computed once and never
    /// revisited afterwards.
    pub fn finalize(&mut self) {
        self.unicast_slot_shared_flag = if self.collision_free_hash
            && self.unicast_sender_based
            && (self.unicast_period as u32) > self.max_hash + 1
        {
            CellOptions::empty()
        } else {
            CellOptions::SHARED
        };

        self.common_shared_type = if self
            .orchestra_rules
            .iter()
            .any(|rule| rule == "eb_per_time_source")
        {
            CellType::Normal
        } else {
            CellType::Advertising
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = Config::default();
        assert_eq!(cfg.eb_period, 397);
        assert_eq!(cfg.common_shared_period, 31);
        assert_eq!(cfg.unicast_period, 17);
        assert_eq!(cfg.root_period, 7);
        assert!(!cfg.unicast_sender_based);
        assert_eq!(cfg.max_hash, 0x7FFF);
        assert!(!cfg.collision_free_hash);
        assert_eq!(cfg.eb_channel_offset, 0);
        assert_eq!(cfg.default_common_channel_offset, 1);
        assert_eq!(cfg.unicast_min_channel_offset, 2);
        assert_eq!(cfg.unicast_max_channel_offset, 255);
    }

    #[test]
    fn finalize_picks_shared_flag_by_default() {
        let mut cfg = Config::default();
        cfg.finalize();
        assert_eq!(cfg.unicast_slot_shared_flag, CellOptions::SHARED);
    }

    #[test]
    fn finalize_drops_shared_flag_under_collision_free_sender_based() {
        let mut cfg = Config {
            collision_free_hash: true,
            unicast_sender_based: true,
            unicast_period: 40000,
            max_hash: 0x7FFF,
            ..Config::default()
        };
        cfg.finalize();
        assert_eq!(cfg.unicast_slot_shared_flag, CellOptions::empty());
    }

    #[test]
    fn finalize_keeps_shared_flag_when_period_too_small() {
        let mut cfg = Config {
            collision_free_hash: true,
            unicast_sender_based: true,
            unicast_period: 17,
            max_hash: 0x7FFF,
            ..Config::default()
        };
        cfg.finalize();
        assert_eq!(cfg.unicast_slot_shared_flag, CellOptions::SHARED);
    }

    #[test]
    fn finalize_common_shared_type_depends_on_eb_rule() {
        let mut with_eb = Config {
            orchestra_rules: vec!["eb_per_time_source".to_string(), "default_common".to_string()],
            ..Config::default()
        };
        with_eb.finalize();
        assert_eq!(with_eb.common_shared_type, CellType::Normal);

        let mut without_eb = Config {
            orchestra_rules: vec!["default_common".to_string()],
            ..Config::default()
        };
        without_eb.finalize();
        assert_eq!(without_eb.common_shared_type, CellType::Advertising);
    }
}
