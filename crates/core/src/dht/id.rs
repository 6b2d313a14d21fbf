#![warn(missing_docs)]
//! Identifier space of the ring.
//!
//! Identifiers live in `[0, 2^m)` for a ring size `m` shared by every participant.
//! All arithmetic wraps modulo `2^m`, and ordering questions are answered with
//! [is_between], which walks clockwise from a lower to an upper bound.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::consts::DEFAULT_RING_BITS;
use crate::consts::MAX_RING_BITS;
use crate::error::Error;
use crate::error::Result;

/// Position of a node or key on the ring.
#[derive(Copy, Clone, Eq, Ord, PartialEq, PartialOrd, Debug, Serialize, Deserialize, Hash)]
pub struct ChordId(pub u64);

impl fmt::Display for ChordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChordId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChordId> for u64 {
    fn from(id: ChordId) -> u64 {
        id.0
    }
}

/// Which endpoints of a circular interval are part of it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Bounds {
    /// `(lo, hi)`
    Open,
    /// `[lo, hi)`
    IncludeLo,
    /// `(lo, hi]`
    IncludeHi,
    /// `[lo, hi]`
    Closed,
}

impl Bounds {
    fn include_lo(self) -> bool {
        matches!(self, Bounds::IncludeLo | Bounds::Closed)
    }

    fn include_hi(self) -> bool {
        matches!(self, Bounds::IncludeHi | Bounds::Closed)
    }
}

/// Test whether `id` is passed when walking clockwise from `lo` to `hi`.
///
/// When `lo == hi` the interval is the whole ring and every id is inside, which is
/// what lets a singleton ring answer every lookup with itself.
pub fn is_between(id: ChordId, lo: ChordId, hi: ChordId, bounds: Bounds) -> bool {
    if lo == hi {
        return true;
    }
    if id == lo {
        return bounds.include_lo();
    }
    if id == hi {
        return bounds.include_hi();
    }
    if lo < hi {
        lo < id && id < hi
    } else {
        // wraps past 2^m - 1
        id > lo || id < hi
    }
}

/// An m-bit circular identifier space.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct IdSpace {
    bits: u8,
}

impl Default for IdSpace {
    fn default() -> Self {
        Self {
            bits: DEFAULT_RING_BITS,
        }
    }
}

impl TryFrom<u8> for IdSpace {
    type Error = Error;
    fn try_from(bits: u8) -> Result<Self> {
        Self::new(bits)
    }
}

impl From<IdSpace> for u8 {
    fn from(space: IdSpace) -> u8 {
        space.bits
    }
}

impl IdSpace {
    /// Create a space of `2^bits` identifiers, `1 <= bits <= 64`.
    pub fn new(bits: u8) -> Result<Self> {
        if bits == 0 || bits > MAX_RING_BITS {
            return Err(Error::InvalidRingBits(bits));
        }
        Ok(Self { bits })
    }

    /// Ring size `m`. Also the number of slots of every finger table.
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Number of identifiers, `2^m`.
    pub fn size(&self) -> u128 {
        1u128 << self.bits
    }

    /// Check that `id` belongs to this space.
    pub fn contains(&self, id: ChordId) -> bool {
        (id.0 as u128) < self.size()
    }

    /// Return `id` unchanged if it belongs to this space.
    pub fn validate(&self, id: ChordId) -> Result<ChordId> {
        if self.contains(id) {
            Ok(id)
        } else {
            Err(Error::IdOutOfRange {
                id: id.0,
                bits: self.bits,
            })
        }
    }

    /// Reduce any integer, negative ones included, into `[0, 2^m)`.
    pub fn constrain(&self, x: i128) -> ChordId {
        ChordId(x.rem_euclid(self.size() as i128) as u64)
    }

    /// `constrain(id + 2^i)`, the start of finger slot `i`.
    pub fn add_pow2(&self, id: ChordId, i: usize) -> ChordId {
        self.constrain(id.0 as i128 + (1i128 << i))
    }

    /// `constrain(id - 2^i)`, the id whose slot `i` finger may point to `id`.
    pub fn sub_pow2(&self, id: ChordId, i: usize) -> ChordId {
        self.constrain(id.0 as i128 - (1i128 << i))
    }

    /// Clockwise distance from `from` to `to`.
    pub fn distance(&self, from: ChordId, to: ChordId) -> u128 {
        let size = self.size();
        (to.0 as u128 + size - from.0 as u128) % size
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn id(x: u64) -> ChordId {
        ChordId(x)
    }

    #[test]
    fn test_space_bounds() {
        assert!(IdSpace::new(0).is_err());
        assert!(IdSpace::new(65).is_err());
        assert_eq!(IdSpace::new(64).unwrap().size(), 1u128 << 64);
        assert_eq!(IdSpace::default().bits(), DEFAULT_RING_BITS);
    }

    #[test]
    fn test_constrain() {
        let space = IdSpace::new(8).unwrap();
        assert_eq!(space.constrain(0), id(0));
        assert_eq!(space.constrain(256), id(0));
        assert_eq!(space.constrain(260), id(4));
        assert_eq!(space.constrain(-1), id(255));
        assert_eq!(space.constrain(-257), id(255));
        assert_eq!(space.sub_pow2(id(1), 2), id(253));
        assert_eq!(space.add_pow2(id(200), 7), id(72));

        let full = IdSpace::new(64).unwrap();
        assert_eq!(full.add_pow2(id(u64::MAX), 0), id(0));
        assert_eq!(full.sub_pow2(id(0), 63), id(1 << 63));
    }

    #[test]
    fn test_validate() {
        let space = IdSpace::new(4).unwrap();
        assert!(space.validate(id(15)).is_ok());
        assert!(matches!(
            space.validate(id(16)),
            Err(Error::IdOutOfRange { id: 16, bits: 4 })
        ));
    }

    #[test]
    fn test_is_between_plain_and_wrapped() {
        // (2, 6)
        assert!(is_between(id(3), id(2), id(6), Bounds::Open));
        assert!(!is_between(id(2), id(2), id(6), Bounds::Open));
        assert!(!is_between(id(6), id(2), id(6), Bounds::Open));
        assert!(is_between(id(2), id(2), id(6), Bounds::IncludeLo));
        assert!(is_between(id(6), id(2), id(6), Bounds::IncludeHi));
        assert!(!is_between(id(7), id(2), id(6), Bounds::Closed));

        // (250, 4) wraps past the top of an 8-bit ring
        assert!(is_between(id(255), id(250), id(4), Bounds::Open));
        assert!(is_between(id(0), id(250), id(4), Bounds::Open));
        assert!(is_between(id(4), id(250), id(4), Bounds::IncludeHi));
        assert!(!is_between(id(100), id(250), id(4), Bounds::Closed));
    }

    #[test]
    fn test_is_between_degenerate_interval_is_whole_ring() {
        for x in 0..16 {
            assert!(is_between(id(x), id(5), id(5), Bounds::Open));
        }
    }

    fn walk_contains(space: IdSpace, x: u64, lo: u64, hi: u64, bounds: Bounds) -> bool {
        if lo == hi {
            return true;
        }
        if x == lo {
            return bounds.include_lo();
        }
        let mut cur = lo;
        loop {
            cur = space.add_pow2(id(cur), 0).0;
            if cur == hi {
                return x == hi && bounds.include_hi();
            }
            if cur == x {
                return true;
            }
        }
    }

    fn any_bounds() -> impl Strategy<Value = Bounds> {
        prop_oneof![
            Just(Bounds::Open),
            Just(Bounds::IncludeLo),
            Just(Bounds::IncludeHi),
            Just(Bounds::Closed),
        ]
    }

    proptest! {
        #[test]
        fn prop_is_between_matches_clockwise_walk(
            x in 0u64..64, lo in 0u64..64, hi in 0u64..64, bounds in any_bounds()
        ) {
            let space = IdSpace::new(6).unwrap();
            prop_assert_eq!(
                is_between(id(x), id(lo), id(hi), bounds),
                walk_contains(space, x, lo, hi, bounds)
            );
        }

        #[test]
        fn prop_is_between_is_rotation_invariant(
            x in 0u64..1024, lo in 0u64..1024, hi in 0u64..1024, k in 0i128..1024,
            bounds in any_bounds()
        ) {
            let space = IdSpace::new(10).unwrap();
            let shift = |v: u64| space.constrain(v as i128 + k);
            prop_assert_eq!(
                is_between(id(x), id(lo), id(hi), bounds),
                is_between(shift(x), shift(lo), shift(hi), bounds)
            );
        }

        #[test]
        fn prop_degenerate_interval_contains_everything(
            x in any::<u64>(), lo in any::<u64>(), bounds in any_bounds()
        ) {
            prop_assert!(is_between(id(x), id(lo), id(lo), bounds));
        }
    }
}
