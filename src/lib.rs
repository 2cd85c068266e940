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

//! Restoration of hierarchical deterministic wallets: discovery of used
//! addresses on account chains with BIP44 gap-limit scanning and conversion
//! of the discovered addresses into insertable storage records.

// Coding conventions
#![recursion_limit = "256"]
#![deny(dead_code, missing_docs)]

#[macro_use]
extern crate amplify;
#[cfg(feature = "serde")]
#[macro_use]
extern crate serde_crate as serde;

pub extern crate restore_hd as hd;
pub extern crate restore_onchain as onchain;

mod config;
mod error;
mod insert;
pub mod scan;
mod storage;
mod tree;

pub use config::{
    ConfigError, ScanConfig, DEFAULT_GAP_LIMIT, DEFAULT_REQUEST_SIZE, MAX_GAP_LIMIT,
};
pub use error::{InsertError, ScanError, StorageError};
pub use insert::{AddressInsertBuilder, AddressRecord, ChainRecord};
pub use scan::{AccountScan, AccountScanner, CandidateAddress, ChainScanner, ScanOutcome};
pub use storage::{insert_tree, Derivation, DerivationId, MemoryStore, StoreAddresses};
pub use tree::{InsertNode, InsertOp, InsertTree};
