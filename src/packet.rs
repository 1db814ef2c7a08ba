//! The abstract packet the surrounding MAC/radio collaborator feeds into
//! `select_packet` (§4.4) and the attributes the rule engine writes back
//! onto it (§6 `on_packet_ready`).

use crate::addr::Addr;

/// Frame type, grounded on the teacher's `frame::frame_control::FrameType`,
/// trimmed to the variants the rule engine distinguishes (§4.4: beacons
/// for the EB rule, data frames for everything else).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Beacon,
    Data,
    Ack,
    MacCommand,
}

/// The `(slotframe, timeslot, channel_offset)` a rule picked for a packet,
/// per §4.4. `None` in any field is the "any slotframe/timeslot/channel
/// offset" sentinel of §4.4/§6 (the spec's source represents this as the
/// literal value `0xFFFFFFFF`; an `Option` is the idiomatic Rust
/// equivalent, see `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacketAttrs {
    pub slotframe: Option<u16>,
    pub timeslot: Option<u16>,
    pub channel_offset: Option<u16>,
}

/// A packet as seen by the scheduling core: enough to drive rule
/// dispatch, nothing about payload or PHY framing.
#[derive(Debug, Clone)]
pub struct Packet {
    pub frame_type: FrameType,
    pub source: Addr,
    pub destination: Option<Addr>,
    /// Link-layer next hop, as resolved by the routing table (§4.3's
    /// `get_nexthop`). `None` until resolved or for broadcast frames
    /// that do not carry one.
    pub nexthop: Option<Addr>,
    /// Whether this is the RPL DAO ICMPv6 message the parent-tracking
    /// state machine watches for (§4.4, §6 `on_tx`).
    pub is_dao: bool,
    pub attrs: PacketAttrs,
}

impl Packet {
    pub fn new(frame_type: FrameType, source: Addr) -> Self {
        Self {
            frame_type,
            source,
            destination: None,
            nexthop: None,
            is_dao: false,
            attrs: PacketAttrs::default(),
        }
    }

    /// The 16-bit id of [`Packet::destination`], if set.
    pub fn destination_id(&self) -> Option<u16> {
        self.destination.map(|a| a.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_attrs_are_the_any_sentinel() {
        let attrs = PacketAttrs::default();
        assert_eq!(attrs.slotframe, None);
        assert_eq!(attrs.timeslot, None);
        assert_eq!(attrs.channel_offset, None);
    }

    #[test]
    fn destination_id_follows_addr_id() {
        let mut pkt = Packet::new(FrameType::Data, Addr([0, 0, 0, 0, 0, 0, 0, 1]));
        assert_eq!(pkt.destination_id(), None);
        pkt.destination = Some(Addr([0, 0, 0, 0, 0, 0, 0, 9]));
        assert_eq!(pkt.destination_id(), Some(9));
    }
}
