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

use hd::{ChainIndex, DeriveError, GenerateAddresses, SegmentIndexes, UnhardenedIndex};
use onchain::FilterUsed;
use secp256k1::PublicKey;

use crate::{InsertNode, ScanConfig, ScanError};

/// Address generated while scanning a chain
#[derive(Clone, Eq, PartialEq, Hash, Debug, Display)]
#[display("{chain}/{index}: {address}")]
pub struct CandidateAddress {
    /// Chain the address belongs to
    pub chain: ChainIndex,

    /// Index of the address within the chain
    pub index: UnhardenedIndex,

    /// Hex encoding of the address
    pub address: String,
}

/// Result of a single chain scan
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ScanOutcome {
    /// Scanned chain
    pub chain: ChainIndex,

    /// Highest index confirmed used, or the starting offset if nothing new
    /// was found. `None` means no address of the chain was ever used.
    pub last_used: Option<UnhardenedIndex>,

    /// All addresses after the starting offset up to `last_used` inclusive,
    /// in index order. Unused addresses in between are kept.
    pub candidates: Vec<CandidateAddress>,
}

impl ScanOutcome {
    /// Outcome for a chain with no new addresses
    #[inline]
    pub fn empty(chain: ChainIndex, last_used: Option<UnhardenedIndex>) -> ScanOutcome {
        ScanOutcome {
            chain,
            last_used,
            candidates: vec![],
        }
    }

    /// Converts discovered candidates into address nodes linked to a staking
    /// key
    pub fn to_insert_nodes(&self, staking_key: PublicKey) -> Vec<InsertNode> {
        self.candidates
            .iter()
            .map(|candidate| {
                InsertNode::address(candidate.index, candidate.address.clone(), staking_key)
            })
            .collect()
    }
}

/// Gap-limit scanner for a single account chain.
///
/// Addresses are probed in batches of at most
/// [`ScanConfig::request_size`]; probing stops once [`ScanConfig::gap_limit`]
/// consecutive addresses past the last used one are found unused.
pub struct ChainScanner<'filter, G, F>
where
    G: GenerateAddresses,
    F: FilterUsed + ?Sized,
{
    chain: ChainIndex,
    generator: G,
    filter: &'filter F,
    config: ScanConfig,
}

impl<'filter, G, F> ChainScanner<'filter, G, F>
where
    G: GenerateAddresses,
    F: FilterUsed + ?Sized,
{
    /// Constructs scanner for a chain
    pub fn with(chain: ChainIndex, generator: G, filter: &'filter F, config: ScanConfig) -> Self {
        ChainScanner {
            chain,
            generator,
            filter,
            config,
        }
    }

    /// Scans the chain starting right after `offset` (`None` starts from the
    /// first address).
    pub async fn scan(&self, offset: Option<UnhardenedIndex>) -> Result<ScanOutcome, ScanError> {
        self.config.validate()?;
        let gap_limit = self.config.gap_limit as u64;
        let request_size = self.config.request_size as u64;
        let largest = UnhardenedIndex::largest().first_index() as u64;

        let mut next = match offset {
            None => 0u64,
            Some(index) => match index.checked_inc() {
                Some(next) => next.first_index() as u64,
                None => return Ok(ScanOutcome::empty(self.chain, offset)),
            },
        };

        let mut last_used = offset;
        let mut probed = Vec::<CandidateAddress>::new();
        loop {
            let start = last_used.map(|index| index.first_index() as u64 + 1).unwrap_or_default();
            let window_end = (start + gap_limit - 1).min(largest);
            if next > window_end {
                break;
            }
            let batch_end = window_end.min(next + request_size - 1);
            let indexes = (next..=batch_end).map(|index| index as u32).collect::<Vec<_>>();

            tracing::debug!(chain = %self.chain, from = next, to = batch_end, "probing addresses");
            let addresses = self.generator.generate_addresses(&indexes)?;
            let usage = self.filter.filter_used(&addresses).await?;

            for (index, address) in indexes.into_iter().zip(addresses) {
                let index = UnhardenedIndex::from_index(index).map_err(DeriveError::from)?;
                if usage.is_used(&address) {
                    tracing::trace!(chain = %self.chain, %index, "address used");
                    last_used = Some(index);
                }
                probed.push(CandidateAddress {
                    chain: self.chain,
                    index,
                    address,
                });
            }

            if batch_end >= largest {
                break;
            }
            next = batch_end + 1;
        }

        probed.retain(|candidate| Some(candidate.index) <= last_used);
        tracing::debug!(
            chain = %self.chain,
            last_used = ?last_used.map(|index| index.first_index()),
            found = probed.len(),
            "chain scan complete"
        );
        Ok(ScanOutcome {
            chain: self.chain,
            last_used,
            candidates: probed,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scan::stub::{CountingFilter, FailingFilter, LabelGenerator};

    fn idx(index: u32) -> UnhardenedIndex { UnhardenedIndex::from_index(index).unwrap() }

    fn scanner<'a>(
        filter: &'a CountingFilter,
        gap_limit: u32,
        request_size: u32,
    ) -> ChainScanner<'a, LabelGenerator, CountingFilter> {
        ChainScanner::with(
            ChainIndex::External,
            LabelGenerator("ext"),
            filter,
            ScanConfig::new(gap_limit, request_size).unwrap(),
        )
    }

    #[tokio::test]
    async fn finds_last_used() {
        let filter = CountingFilter::with_used(&["ext5"]);
        let outcome = scanner(&filter, 20, 20).scan(None).await.unwrap();
        assert_eq!(outcome.last_used, Some(idx(5)));
        assert_eq!(outcome.candidates.len(), 6);
        assert_eq!(outcome.candidates[0].index, 0u8);
        assert_eq!(outcome.candidates[5].address, "ext5");
        assert!(outcome.candidates.iter().all(|c| c.chain == ChainIndex::External));
        assert_eq!(filter.batch_sizes(), vec![20, 6]);
        assert_eq!(filter.probed(), 26);
    }

    #[tokio::test]
    async fn nothing_used() {
        let filter = CountingFilter::with_used(&[]);
        let outcome = scanner(&filter, 20, 50).scan(None).await.unwrap();
        assert_eq!(outcome, ScanOutcome::empty(ChainIndex::External, None));
        assert_eq!(filter.batch_sizes(), vec![20]);

        let filter = CountingFilter::with_used(&[]);
        let outcome = scanner(&filter, 20, 50).scan(Some(idx(7))).await.unwrap();
        assert_eq!(outcome.last_used, Some(idx(7)));
        assert!(outcome.candidates.is_empty());
        assert_eq!(filter.batches()[0].first().map(String::as_str), Some("ext8"));
    }

    #[tokio::test]
    async fn batches_bounded() {
        let filter = CountingFilter::with_used(&[]);
        scanner(&filter, 20, 7).scan(None).await.unwrap();
        assert_eq!(filter.batch_sizes(), vec![7, 7, 6]);

        let filter = CountingFilter::with_used(&["ext3", "ext12", "ext20", "ext40"]);
        let outcome = scanner(&filter, 10, 4).scan(None).await.unwrap();
        assert_eq!(outcome.last_used, Some(idx(20)));
        assert!(filter.batch_sizes().iter().all(|size| *size <= 4));
        assert_eq!(filter.probed(), 31);
    }

    #[tokio::test]
    async fn window_moves() {
        let filter = CountingFilter::with_used(&["ext3", "ext12", "ext31"]);
        let outcome = scanner(&filter, 20, 50).scan(Some(idx(10))).await.unwrap();
        assert_eq!(outcome.last_used, Some(idx(31)));
        assert_eq!(outcome.candidates.len(), 21);
        assert_eq!(outcome.candidates.first().map(|c| c.index), Some(idx(11)));
        assert_eq!(filter.batch_sizes(), vec![20, 2, 19]);
        assert!(!filter.batches().concat().contains(&s!("ext3")));
    }

    #[tokio::test]
    async fn last_used_rule() {
        for (offset, used) in [
            (None, vec![0u32, 4, 19]),
            (Some(0u32), vec![1, 20]),
            (Some(5), vec![]),
            (Some(100), vec![101, 119]),
        ] {
            let labels = used.iter().map(|i| format!("ext{}", i)).collect::<Vec<_>>();
            let filter =
                CountingFilter::with_used(&labels.iter().map(String::as_str).collect::<Vec<_>>());
            let outcome = scanner(&filter, 20, 50).scan(offset.map(idx)).await.unwrap();
            let expected = used.iter().copied().max().map(idx).or_else(|| offset.map(idx));
            assert_eq!(outcome.last_used, expected);
        }
    }

    #[tokio::test]
    async fn idempotent() {
        let filter = CountingFilter::with_used(&["ext2", "ext9"]);
        let first = scanner(&filter, 5, 3).scan(Some(idx(1))).await.unwrap();
        let second = scanner(&filter, 5, 3).scan(Some(idx(1))).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn address_space_end() {
        let largest = UnhardenedIndex::largest();
        let filter = CountingFilter::with_used(&[]);
        let outcome = scanner(&filter, 20, 50).scan(Some(largest)).await.unwrap();
        assert_eq!(outcome, ScanOutcome::empty(ChainIndex::External, Some(largest)));
        assert!(filter.batches().is_empty());

        let last = format!("ext{}", largest.first_index());
        let filter = CountingFilter::with_used(&[last.as_str()]);
        let offset = largest.checked_sub(5u8);
        let outcome = scanner(&filter, 20, 50).scan(offset).await.unwrap();
        assert_eq!(outcome.last_used, Some(largest));
        assert_eq!(outcome.candidates.len(), 5);
        assert_eq!(filter.batch_sizes(), vec![5]);
    }

    #[tokio::test]
    async fn errors_abort() {
        let failing = FailingFilter;
        let scanner = ChainScanner::with(
            ChainIndex::Internal,
            LabelGenerator("int"),
            &failing,
            ScanConfig::default(),
        );
        assert!(matches!(scanner.scan(None).await, Err(ScanError::UsageFilter(_))));

        let filter = CountingFilter::with_used(&[]);
        let scanner = ChainScanner::with(
            ChainIndex::Internal,
            LabelGenerator("int"),
            &filter,
            ScanConfig {
                gap_limit: 0,
                request_size: 10,
            },
        );
        assert!(matches!(scanner.scan(None).await, Err(ScanError::Config(_))));
        assert!(filter.batches().is_empty());
    }
}
