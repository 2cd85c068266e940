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

//! Gap-limit discovery of used addresses on account chains.

mod account;
mod chain;

pub use account::{AccountScan, AccountScanner};
pub use chain::{CandidateAddress, ChainScanner, ScanOutcome};

#[cfg(test)]
pub(crate) mod stub {
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use hd::{DeriveError, GenerateAddresses};
    use onchain::{FilterUsed, UsageFilterError, UsageResult};

    /// Produces `<label><index>` strings instead of real addresses
    pub struct LabelGenerator(pub &'static str);

    impl GenerateAddresses for LabelGenerator {
        fn generate_addresses(&self, indexes: &[u32]) -> Result<Vec<String>, DeriveError> {
            Ok(indexes.iter().map(|index| format!("{}{}", self.0, index)).collect())
        }
    }

    /// Set-backed filter recording every requested batch
    pub struct CountingFilter {
        used: BTreeSet<String>,
        batches: Mutex<Vec<Vec<String>>>,
    }

    impl CountingFilter {
        pub fn with_used(used: &[&str]) -> CountingFilter {
            CountingFilter {
                used: used.iter().map(|address| address.to_string()).collect(),
                batches: Mutex::new(vec![]),
            }
        }

        pub fn batches(&self) -> Vec<Vec<String>> { self.batches.lock().unwrap().clone() }

        pub fn batch_sizes(&self) -> Vec<usize> { self.batches().iter().map(Vec::len).collect() }

        pub fn probed(&self) -> usize { self.batch_sizes().iter().sum() }
    }

    #[async_trait]
    impl FilterUsed for CountingFilter {
        async fn filter_used(
            &self,
            addresses: &[String],
        ) -> Result<UsageResult, UsageFilterError> {
            self.batches.lock().unwrap().push(addresses.to_vec());
            self.used.filter_used(addresses).await
        }
    }

    pub struct FailingFilter;

    #[async_trait]
    impl FilterUsed for FailingFilter {
        async fn filter_used(&self, _: &[String]) -> Result<UsageResult, UsageFilterError> {
            Err(UsageFilterError::Status(503))
        }
    }
}
