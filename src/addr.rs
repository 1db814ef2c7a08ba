//! Link-layer addresses and the identity hash functions Orchestra uses to
//! map addresses onto timeslot/channel-offset coordinates.

use serde::{Deserialize, Serialize};

/// Enhanced-beacon destination id, reserved by §3.
pub const EB_ID: u16 = 0xFFFE;
/// Broadcast id, reserved by §3.
pub const BROADCAST_ID: u16 = 0xFFFF;

/// An 8-octet IEEE 802.15.4 extended address.
///
/// The teacher's `Address` type also covers absent and 2-octet short
/// forms for real frame addressing; this core only ever sees the
/// extended form, so it collapses to a single newtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Addr(pub [u8; 8]);

impl Addr {
    /// The broadcast address: id `0xFFFF` replicated into every half.
    pub const BROADCAST: Addr = Addr::from_id(BROADCAST_ID);

    /// Build an address from a 16-bit id by replicating it into each of
    /// the four 16-bit halves of the address, per §3.
    pub const fn from_id(id: u16) -> Self {
        let [hi, lo] = id.to_be_bytes();
        Addr([hi, lo, hi, lo, hi, lo, hi, lo])
    }

    /// The 8 raw octets of the address.
    pub const fn octets(&self) -> [u8; 8] {
        self.0
    }

    /// Extract the 16-bit id carried in the last two octets of the
    /// address, per §3.
    pub const fn id(&self) -> u16 {
        u16::from_be_bytes([self.0[6], self.0[7]])
    }

    /// Last octet of the address; the default hash functions' raw input.
    pub const fn last_octet(&self) -> u8 {
        self.0[7]
    }

    pub const fn is_broadcast(&self) -> bool {
        self.id() == BROADCAST_ID
    }
}

/// `addr_to_id(A)`, per §3.
pub const fn addr_to_id(a: Addr) -> u16 {
    a.id()
}

/// `id_to_addr(id)`, per §3.
pub const fn id_to_addr(id: u16) -> Addr {
    Addr::from_id(id)
}

/// Signature of a pluggable `H1` hash, mapping one address to a small
/// integer (§4.4). Kept function-pointer-typed rather than boxed so
/// [`crate::config::Config`] stays `Copy`-friendly and cheap to pass
/// around, per §9's "hash injection" note.
pub type HashFn1 = fn(Addr) -> u32;
/// Signature of a pluggable `H2` hash, mapping a pair of addresses to an
/// integer (§4.4).
pub type HashFn2 = fn(Addr, Addr) -> u32;

/// Default `H1`: the last octet of the address.
pub fn default_hash1(addr: Addr) -> u32 {
    addr.last_octet() as u32
}

/// Default `H2`: `a.octets[7] + 264 * b.octets[7]`.
pub fn default_hash2(a: Addr, b: Addr) -> u32 {
    a.last_octet() as u32 + 264 * b.last_octet() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_addr_roundtrip() {
        for id in [0u16, 1, 42, 0x1234, 0xFFFD] {
            assert_eq!(addr_to_id(id_to_addr(id)), id);
        }
    }

    #[test]
    fn reserved_ids() {
        assert!(Addr::BROADCAST.is_broadcast());
        assert_eq!(id_to_addr(EB_ID).id(), EB_ID);
    }

    #[test]
    fn default_hash_values() {
        let a = Addr([0, 0, 0, 0, 0, 0, 0, 5]);
        let b = Addr([0, 0, 0, 0, 0, 0, 0, 7]);
        assert_eq!(default_hash1(a), 5);
        assert_eq!(default_hash2(a, b), 5 + 264 * 7);
    }
}
