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
use futures::future;
use hd::{
    AddressGenerator, ChainIndex, DeriveError, DerivePublicKey, Discrimination,
    GenerateAddresses, SegmentIndexes, UnhardenedIndex,
};
use onchain::FilterUsed;
use secp256k1::PublicKey;

use super::{ChainScanner, ScanOutcome};
use crate::{InsertNode, InsertTree, ScanConfig, ScanError};

/// Outcome of scanning both chains of an account
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct AccountScan {
    /// Scan results for the receiving chain
    pub external: ScanOutcome,

    /// Scan results for the change chain
    pub internal: ScanOutcome,

    /// Insertable tree with the discovered addresses
    pub tree: InsertTree,
}

/// Scanner for both chains of a single account
#[derive(Clone, Debug)]
pub struct AccountScanner<G = AddressGenerator>
where
    G: GenerateAddresses,
{
    external: G,
    internal: G,
    staking_key: PublicKey,
    config: ScanConfig,
}

impl AccountScanner {
    /// Constructs scanner for an account extended public key, deriving chain
    /// keys and the account staking key from it
    pub fn with_account_xpub(
        account_xpub: &ExtendedPubKey,
        discrimination: Discrimination,
        config: ScanConfig,
    ) -> Result<Self, DeriveError> {
        Ok(AccountScanner::with(
            AddressGenerator::with_account(account_xpub, ChainIndex::External, discrimination)?,
            AddressGenerator::with_account(account_xpub, ChainIndex::Internal, discrimination)?,
            account_xpub.staking_key()?,
            config,
        ))
    }
}

impl<G> AccountScanner<G>
where
    G: GenerateAddresses,
{
    /// Constructs scanner from per-chain address generators
    pub fn with(external: G, internal: G, staking_key: PublicKey, config: ScanConfig) -> Self {
        AccountScanner {
            external,
            internal,
            staking_key,
            config,
        }
    }

    /// Staking key linked with the discovered addresses
    #[inline]
    pub fn staking_key(&self) -> PublicKey { self.staking_key }

    /// Scans external and internal chains concurrently, each one starting
    /// after its own last known used index
    pub async fn scan<F>(
        &self,
        filter: &F,
        last_external: Option<UnhardenedIndex>,
        last_internal: Option<UnhardenedIndex>,
    ) -> Result<AccountScan, ScanError>
    where
        F: FilterUsed + ?Sized,
    {
        let external = ChainScanner::with(ChainIndex::External, &self.external, filter, self.config);
        let internal = ChainScanner::with(ChainIndex::Internal, &self.internal, filter, self.config);
        let (external, internal) =
            future::try_join(external.scan(last_external), internal.scan(last_internal)).await?;

        let tree = InsertTree {
            external: InsertNode::chain(
                ChainIndex::External,
                Some(UnhardenedIndex::zero()),
                external.to_insert_nodes(self.staking_key),
            ),
            internal: InsertNode::chain(
                ChainIndex::Internal,
                None,
                internal.to_insert_nodes(self.staking_key),
            ),
        };
        tracing::debug!(
            external = external.candidates.len(),
            internal = internal.candidates.len(),
            "account scan complete"
        );
        Ok(AccountScan {
            external,
            internal,
            tree,
        })
    }
}
