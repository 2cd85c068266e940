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

use bitcoin::util::bip32::ExtendedPubKey;

use crate::{Address, DeriveError, DerivePublicKey, Discrimination, SegmentIndexes, UnhardenedIndex};

/// Batch address generation for a range of chain indexes.
pub trait GenerateAddresses {
    /// Produces address strings for each of the provided raw indexes,
    /// preserving their order. Fails with [`DeriveError::IndexOutOfRange`]
    /// if any of the indexes is not a valid unhardened index.
    fn generate_addresses(&self, indexes: &[u32]) -> Result<Vec<String>, DeriveError>;
}

impl<T> GenerateAddresses for &T
where
    T: GenerateAddresses + ?Sized,
{
    #[inline]
    fn generate_addresses(&self, indexes: &[u32]) -> Result<Vec<String>, DeriveError> {
        (*self).generate_addresses(indexes)
    }
}

/// Generator of single addresses out of an extended chain key (account key
/// derived at a chain index).
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct AddressGenerator<Key = ExtendedPubKey>
where
    Key: DerivePublicKey,
{
    chain_key: Key,
    discrimination: Discrimination,
}

impl<Key> AddressGenerator<Key>
where
    Key: DerivePublicKey,
{
    /// Constructs generator for addresses under a given chain key
    #[inline]
    pub fn with(chain_key: Key, discrimination: Discrimination) -> Self {
        AddressGenerator {
            chain_key,
            discrimination,
        }
    }

    /// Constructs generator for the chain `index` of an account-level key
    pub fn with_account(
        account_key: &Key,
        chain: impl Into<UnhardenedIndex>,
        discrimination: Discrimination,
    ) -> Result<Self, DeriveError> {
        Ok(AddressGenerator::with(
            account_key.derive_child(chain.into())?,
            discrimination,
        ))
    }

    /// Network discrimination of the generated addresses
    #[inline]
    pub fn discrimination(&self) -> Discrimination { self.discrimination }

    /// Derives single address at a given index
    pub fn address(&self, index: UnhardenedIndex) -> Result<Address, DeriveError> {
        let key = self.chain_key.derive_child(index)?.to_public_key();
        Ok(Address::single(key, self.discrimination))
    }
}

impl<Key> GenerateAddresses for AddressGenerator<Key>
where
    Key: DerivePublicKey,
{
    fn generate_addresses(&self, indexes: &[u32]) -> Result<Vec<String>, DeriveError> {
        indexes
            .iter()
            .map(|index| {
                let index = UnhardenedIndex::from_index(*index)?;
                self.address(index).map(|address| address.to_string())
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::*;
    use crate::{AddressKind, ChainIndex};

    fn account() -> ExtendedPubKey {
        ExtendedPubKey::from_str("xpub6ASuArnXKPbfEwhqN6e3mwBcDTgzisQN1wXN9BJcM47sSikHjJf3UFHKkNAWbWMiGj7Wf5uMash7SyYq527Hqck2AxYysAA7xmALppuCkwQ").unwrap()
    }

    #[test]
    fn preserves_order() {
        let gen =
            AddressGenerator::with_account(&account(), ChainIndex::External, Discrimination::Test)
                .unwrap();
        let forward = gen.generate_addresses(&[0, 1, 2, 3]).unwrap();
        let backward = gen.generate_addresses(&[3, 2, 1, 0]).unwrap();
        assert_eq!(forward.len(), 4);
        assert_eq!(forward.iter().rev().collect::<Vec<_>>(), backward.iter().collect::<Vec<_>>());
        assert_eq!(gen.generate_addresses(&[2]).unwrap()[0], forward[2]);
        assert!(gen.generate_addresses(&[]).unwrap().is_empty());
    }

    #[test]
    fn chains_differ() {
        let external =
            AddressGenerator::with_account(&account(), ChainIndex::External, Discrimination::Test)
                .unwrap();
        let internal =
            AddressGenerator::with_account(&account(), ChainIndex::Internal, Discrimination::Test)
                .unwrap();
        assert_ne!(
            external.generate_addresses(&[0]).unwrap(),
            internal.generate_addresses(&[0]).unwrap()
        );
    }

    #[test]
    fn single_addresses() {
        let gen = AddressGenerator::with_account(
            &account(),
            ChainIndex::External,
            Discrimination::Production,
        )
        .unwrap();
        let expected = account()
            .derive_child(UnhardenedIndex::zero())
            .unwrap()
            .derive_child(UnhardenedIndex::from(9u8))
            .unwrap()
            .to_public_key();
        let address = Address::from_str(&gen.generate_addresses(&[9]).unwrap()[0]).unwrap();
        assert_eq!(address.kind(), AddressKind::Single);
        assert_eq!(address.discrimination, Discrimination::Production);
        assert_eq!(address.spending_key(), expected);
    }

    #[test]
    fn out_of_range() {
        let gen = AddressGenerator::with(account(), Discrimination::Test);
        assert_eq!(
            gen.generate_addresses(&[0, 1 << 31]),
            Err(DeriveError::IndexOutOfRange(1 << 31))
        );
    }
}
