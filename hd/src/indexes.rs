// Wallet-level libraries for bitcoin protocol by LNP/BP Association
//
// Written in 2020-2022 by
//     Dr. Maxim Orlovsky <orlovsky@lnp-bp.org>
//
// This software is distributed without any warranty.
//
// You should have received a copy of the Apache-2.0 License
// along with this software.
// If not, see <https://opensource.org/licenses/Apache-2.0>.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::str::FromStr;

use bitcoin::util::bip32::{self, ChildNumber};

use crate::HARDENED_INDEX_BOUNDARY;

/// Trait defining common API for indexes which may be present in a certain
/// derivation path segment.
pub trait SegmentIndexes
where
    Self: Sized + Eq + Ord + Copy + Debug,
{
    /// Constructs derivation path segment with index equal to zero
    fn zero() -> Self;

    /// Constructs derivation path segment with index equal to one
    fn one() -> Self;

    /// Constructs derivation path segment with index equal to maximum value
    fn largest() -> Self;

    /// Constructs derivation path segment with specific index.
    ///
    /// Index is always a value in range of `0..`[`HARDENED_INDEX_BOUNDARY`]
    fn from_index(index: impl Into<u32>) -> Result<Self, bip32::Error>;

    /// Returns index representation of this derivation path segment.
    ///
    /// Index is always a value in range of `0..`[`HARDENED_INDEX_BOUNDARY`]
    fn first_index(&self) -> u32;

    /// Increases the index on one step; fails if the index value is already
    /// maximum value
    fn checked_inc(&self) -> Option<Self> { self.checked_add(1u8) }

    /// Adds value the index; fails if the index value overflow happens
    fn checked_add(&self, add: impl Into<u32>) -> Option<Self> {
        let index = self.first_index().checked_add(add.into())?;
        Self::from_index(index).ok()
    }

    /// Subtracts value the index; fails if the index value underflow happens
    fn checked_sub(&self, sub: impl Into<u32>) -> Option<Self> {
        let index = self.first_index().checked_sub(sub.into())?;
        Self::from_index(index).ok()
    }
}

/// Index for unhardened children derivation; ensures that the inner value
/// is always < 2^31
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
#[derive(
    Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Debug, Hash, Default, Display, From
)]
#[display(inner)]
pub struct UnhardenedIndex(
    #[from(u8)]
    #[from(u16)]
    u32,
);

impl PartialEq<u8> for UnhardenedIndex {
    fn eq(&self, other: &u8) -> bool { self.0 == *other as u32 }
}

impl PartialEq<u16> for UnhardenedIndex {
    fn eq(&self, other: &u16) -> bool { self.0 == *other as u32 }
}

impl PartialEq<u32> for UnhardenedIndex {
    fn eq(&self, other: &u32) -> bool { self.0 == *other }
}

impl PartialOrd<u8> for UnhardenedIndex {
    fn partial_cmp(&self, other: &u8) -> Option<Ordering> { self.0.partial_cmp(&(*other as u32)) }
}

impl PartialOrd<u16> for UnhardenedIndex {
    fn partial_cmp(&self, other: &u16) -> Option<Ordering> { self.0.partial_cmp(&(*other as u32)) }
}

impl SegmentIndexes for UnhardenedIndex {
    #[inline]
    fn zero() -> Self { UnhardenedIndex(0) }

    #[inline]
    fn one() -> Self { UnhardenedIndex(1) }

    #[inline]
    fn largest() -> Self { UnhardenedIndex(HARDENED_INDEX_BOUNDARY - 1) }

    #[inline]
    fn from_index(index: impl Into<u32>) -> Result<Self, bip32::Error> {
        let index = index.into();
        if index >= HARDENED_INDEX_BOUNDARY {
            Err(bip32::Error::InvalidChildNumber(index))
        } else {
            Ok(Self(index))
        }
    }

    /// Returns unhardened index number.
    #[inline]
    fn first_index(&self) -> u32 { self.0 }
}

impl FromStr for UnhardenedIndex {
    type Err = bip32::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UnhardenedIndex::from_index(
            u32::from_str(s).map_err(|_| bip32::Error::InvalidChildNumberFormat)?,
        )
    }
}

impl From<UnhardenedIndex> for ChildNumber {
    fn from(idx: UnhardenedIndex) -> Self { ChildNumber::Normal { index: idx.0 } }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn boundary() {
        assert_eq!(UnhardenedIndex::largest().first_index(), HARDENED_INDEX_BOUNDARY - 1);
        assert!(UnhardenedIndex::from_index(HARDENED_INDEX_BOUNDARY).is_err());
        assert!(UnhardenedIndex::from_index(u32::MAX).is_err());
        assert_eq!(UnhardenedIndex::largest().checked_inc(), None);
        assert_eq!(UnhardenedIndex::zero().checked_sub(1u8), None);
        assert_eq!(
            UnhardenedIndex::from(5u8).checked_add(10u8),
            Some(UnhardenedIndex::from(15u8))
        );
    }

    #[test]
    fn parse() {
        assert_eq!(UnhardenedIndex::from_str("42").unwrap(), 42u8);
        assert!(UnhardenedIndex::from_str("2147483648").is_err());
        assert!(UnhardenedIndex::from_str("1h").is_err());
        assert_eq!(ChildNumber::from(UnhardenedIndex::from(7u8)), ChildNumber::Normal {
            index: 7
        });
    }
}
