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

//! Account chains (BIP44 "change" level of the derivation path).

use std::str::FromStr;

use bitcoin::util::bip32;

use crate::{SegmentIndexes, UnhardenedIndex};

/// Derivation index of the staking key role under CIP-1852 accounts. The
/// staking key itself is the first key of this role.
pub const STAKING_ROLE: u8 = 2;

/// Errors parsing [`ChainIndex`] string representation
#[derive(Clone, Eq, PartialEq, Hash, Debug, Display, Error)]
#[display(doc_comments)]
/// unknown account chain `{0}`; it must be either `external` (`0`) or
/// `internal` (`1`)
pub struct ChainIndexParseError(pub String);

/// Account chain: receiving (external) or change (internal) addresses.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[repr(u8)]
pub enum ChainIndex {
    /// Receiving addresses
    #[display("external")]
    External = 0,

    /// Change addresses
    #[display("internal")]
    Internal = 1,
}

impl ChainIndex {
    /// Returns derivation index for the chain
    #[inline]
    pub fn to_derivation_index(self) -> UnhardenedIndex { UnhardenedIndex::from(self as u8) }
}

impl SegmentIndexes for ChainIndex {
    #[inline]
    fn zero() -> Self { ChainIndex::External }

    #[inline]
    fn one() -> Self { ChainIndex::Internal }

    #[inline]
    fn largest() -> Self { ChainIndex::Internal }

    fn from_index(index: impl Into<u32>) -> Result<Self, bip32::Error> {
        match index.into() {
            0 => Ok(ChainIndex::External),
            1 => Ok(ChainIndex::Internal),
            other => Err(bip32::Error::InvalidChildNumber(other)),
        }
    }

    #[inline]
    fn first_index(&self) -> u32 { *self as u32 }
}

impl From<ChainIndex> for UnhardenedIndex {
    fn from(chain: ChainIndex) -> Self { chain.to_derivation_index() }
}

impl FromStr for ChainIndex {
    type Err = ChainIndexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "external" | "receive" | "0" => Ok(ChainIndex::External),
            "internal" | "change" | "1" => Ok(ChainIndex::Internal),
            _ => Err(ChainIndexParseError(s.to_owned())),
        }
    }
}
