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

//! Resolvers are traits allow accessing information about address usage
//! from a blockchain index (remote indexer, local database, test fixture
//! etc).

#[cfg(feature = "backend")]
mod backend;

use std::collections::{BTreeMap, BTreeSet, HashSet};

use async_trait::async_trait;
#[cfg(feature = "backend")]
pub use backend::BackendFilter;

/// Errors during address usage lookup
#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum UsageFilterError {
    /// indexer request has failed: {0}
    Transport(String),

    /// indexer responded with HTTP status {0}
    Status(u16),

    /// indexer response can't be decoded: {0}
    Decode(String),

    /// batch of {0} addresses exceeds indexer limit of {1} addresses per
    /// request
    BatchTooLarge(usize, usize),

    /// indexer client misconfiguration: {0}
    Config(String),
}

/// Usage information for a batch of addresses: for each of the requested
/// addresses tells whether it has ever appeared on chain.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct UsageResult(BTreeMap<String, bool>);

impl UsageResult {
    /// Constructs usage result for a batch of requested addresses, marking as
    /// used only the ones present in `used` list
    pub fn with_used<'a>(
        requested: &[String],
        used: impl IntoIterator<Item = &'a str>,
    ) -> UsageResult {
        let mut map = requested
            .iter()
            .map(|address| (address.clone(), false))
            .collect::<BTreeMap<_, _>>();
        for address in used {
            if let Some(flag) = map.get_mut(address) {
                *flag = true;
            }
        }
        UsageResult(map)
    }

    /// Detects whether address was used. Addresses which were not part of the
    /// request are reported as unused.
    #[inline]
    pub fn is_used(&self, address: &str) -> bool {
        self.0.get(address).copied().unwrap_or_default()
    }

    /// Number of addresses covered by the result
    #[inline]
    pub fn len(&self) -> usize { self.0.len() }

    /// Detects whether the result covers no addresses
    #[inline]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl FromIterator<(String, bool)> for UsageResult {
    fn from_iter<T: IntoIterator<Item = (String, bool)>>(iter: T) -> Self {
        UsageResult(iter.into_iter().collect())
    }
}

/// Address usage filter
///
/// Implementations must be idempotent and free of side effects observable by
/// the caller: querying the same batch twice must give the same answer.
#[async_trait]
pub trait FilterUsed: Send + Sync {
    /// Checks which of the provided addresses were used on chain. The whole
    /// batch is resolved with a single request.
    async fn filter_used(&self, addresses: &[String]) -> Result<UsageResult, UsageFilterError>;
}

#[async_trait]
impl FilterUsed for BTreeSet<String> {
    async fn filter_used(&self, addresses: &[String]) -> Result<UsageResult, UsageFilterError> {
        Ok(addresses
            .iter()
            .map(|address| (address.clone(), self.contains(address)))
            .collect())
    }
}

#[async_trait]
impl FilterUsed for HashSet<String> {
    async fn filter_used(&self, addresses: &[String]) -> Result<UsageResult, UsageFilterError> {
        Ok(addresses
            .iter()
            .map(|address| (address.clone(), self.contains(address)))
            .collect())
    }
}
