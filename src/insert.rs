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

use std::str::FromStr;

use hd::{Address, AddressFormatError, AddressKind, UnhardenedIndex};
use secp256k1::PublicKey;

use crate::{DerivationId, InsertError, StoreAddresses};

/// Address data persisted by a storage sink
#[derive(Clone, Eq, PartialEq, Hash, Debug, Display)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[display("{kind}:{data}")]
pub struct AddressRecord {
    /// Kind of the address
    pub kind: AddressKind,

    /// Hex encoding of the address
    pub data: String,
}

/// Account chain data persisted by a storage sink
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub struct ChainRecord {
    /// Derivation of the chain key
    pub key_derivation_id: DerivationId,

    /// Last address index displayed by default
    pub display_cutoff: Option<UnhardenedIndex>,
}

/// Converts discovered single addresses into the full set of address records
/// registered for a derived key.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct AddressInsertBuilder {
    staking_key: PublicKey,
}

impl AddressInsertBuilder {
    /// Constructs builder linking group addresses to a given staking key
    #[inline]
    pub fn with(staking_key: PublicKey) -> Self { AddressInsertBuilder { staking_key } }

    /// Parses single address and builds records for each of
    /// [`AddressKind::ALL`], in the same order
    pub fn build(&self, address: &str) -> Result<[AddressRecord; 2], AddressFormatError> {
        let single = Address::from_str(address)?;
        if single.kind() != AddressKind::Single {
            return Err(AddressFormatError::NotSingle(single.kind()));
        }
        Ok(AddressKind::ALL.map(|kind| AddressRecord {
            kind,
            data: single.with_kind(kind, self.staking_key).to_string(),
        }))
    }

    /// Writes all address records for a single address under a derivation.
    /// Nothing is written if the address is malformed.
    pub async fn insert<S>(
        &self,
        sink: &mut S,
        derivation: DerivationId,
        address: &str,
    ) -> Result<(), InsertError>
    where
        S: StoreAddresses + ?Sized,
    {
        for record in self.build(address)? {
            sink.add_address(derivation, record).await?;
        }
        Ok(())
    }
}
