//! The Absolute Slot Number (ASN): a monotonic counter of TSCH slots
//! elapsed since network start, stored as a 5-byte unsigned integer per
//! IEEE 802.15.4-2015.

use std::fmt;
use std::ops::{Add, Rem, Sub};

/// Absolute Slot Number.
#[derive(Debug, Default, Clone, Copy)]
pub struct AbsoluteSlotNumber {
    /// Least significant 4 bytes.
    ls4b: u32,
    /// Most significant byte.
    ms1b: u8,
}

impl AbsoluteSlotNumber {
    pub const ZERO: AbsoluteSlotNumber = AbsoluteSlotNumber { ls4b: 0, ms1b: 0 };

    /// Increment the ASN by one slot.
    pub fn increment(&mut self) {
        let ls4b = self.ls4b;
        self.ls4b = self.ls4b.wrapping_add(1);
        if self.ls4b < ls4b {
            self.ms1b = self.ms1b.wrapping_add(1);
        }
    }
}

impl PartialEq for AbsoluteSlotNumber {
    fn eq(&self, other: &Self) -> bool {
        self.ls4b == other.ls4b && self.ms1b == other.ms1b
    }
}
impl Eq for AbsoluteSlotNumber {}

impl PartialEq<u64> for AbsoluteSlotNumber {
    fn eq(&self, other: &u64) -> bool {
        match AbsoluteSlotNumber::try_from(*other) {
            Ok(asn) => asn == *self,
            Err(_) => false,
        }
    }
}

impl PartialOrd for AbsoluteSlotNumber {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AbsoluteSlotNumber {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.ms1b, self.ls4b).cmp(&(other.ms1b, other.ls4b))
    }
}

impl Add<u32> for AbsoluteSlotNumber {
    type Output = Self;

    fn add(self, rhs: u32) -> Self::Output {
        let ls4b = self.ls4b.wrapping_add(rhs);
        let ms1b = if ls4b < self.ls4b {
            self.ms1b.wrapping_add(1)
        } else {
            self.ms1b
        };
        Self { ls4b, ms1b }
    }
}

impl Sub<u32> for AbsoluteSlotNumber {
    type Output = Self;

    fn sub(self, rhs: u32) -> Self::Output {
        let ls4b = self.ls4b.wrapping_sub(rhs);
        let ms1b = if ls4b > self.ls4b {
            self.ms1b.wrapping_sub(1)
        } else {
            self.ms1b
        };
        Self { ls4b, ms1b }
    }
}

impl Sub<AbsoluteSlotNumber> for AbsoluteSlotNumber {
    type Output = u64;

    fn sub(self, rhs: AbsoluteSlotNumber) -> Self::Output {
        let lhs: u64 = self.into();
        let rhs: u64 = rhs.into();
        lhs - rhs
    }
}

/// `ASN mod size`, used to compute a slotframe's active timeslot (§4.2).
impl Rem<u16> for AbsoluteSlotNumber {
    type Output = u16;

    fn rem(self, rhs: u16) -> u16 {
        let value: u64 = self.into();
        (value % rhs as u64) as u16
    }
}

impl TryFrom<u64> for AbsoluteSlotNumber {
    type Error = ();

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        const MAX_VALUE: u64 = 0xff_ffff_ffff;
        if value > MAX_VALUE {
            return Err(());
        }
        Ok(Self {
            ls4b: (value & 0xffff_ffff) as u32,
            ms1b: ((value >> 32) & 0xff) as u8,
        })
    }
}

impl From<u32> for AbsoluteSlotNumber {
    fn from(value: u32) -> Self {
        Self {
            ls4b: value,
            ms1b: 0,
        }
    }
}

impl From<AbsoluteSlotNumber> for u64 {
    fn from(asn: AbsoluteSlotNumber) -> u64 {
        asn.ls4b as u64 | ((asn.ms1b as u64) << 32)
    }
}

impl fmt::Display for AbsoluteSlotNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u64::from(*self))
    }
}
