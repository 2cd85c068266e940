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

use hd::{AddressFormatError, DeriveError};
use onchain::UsageFilterError;

use crate::ConfigError;

/// Errors happening during chain or account scanning. Any of them aborts the
/// scan.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum ScanError {
    /// unable to derive addresses: {0}
    #[from]
    Derivation(DeriveError),

    /// unable to check address usage: {0}
    #[from]
    UsageFilter(UsageFilterError),

    /// invalid scan configuration: {0}
    #[from]
    Config(ConfigError),
}

/// Error reported by a storage sink
#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
/// storage failure: {message}
pub struct StorageError {
    /// error message
    pub message: String,
}

impl StorageError {
    /// Convenience function for constructing storage error from a message
    #[inline]
    pub fn with(message: impl ToString) -> StorageError {
        StorageError {
            message: message.to_string(),
        }
    }
}

/// Errors persisting a discovered address tree
#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum InsertError {
    /// discovered address is malformed: {0}
    #[from]
    AddressFormat(AddressFormatError),

    /// {0}
    #[from]
    Storage(StorageError),
}
