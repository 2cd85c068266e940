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

//! Library with hierarchival deterministic key derivation and address
//! generation functions used during wallet restoration.
//!
//! Includes range-checked derivation indexes, account chains, public key
//! derivation from extended keys and batch address generation.

// Coding conventions
#![recursion_limit = "256"]
#![deny(dead_code, missing_docs)]

#[macro_use]
extern crate amplify;

#[cfg(feature = "serde")]
#[macro_use]
extern crate serde_crate as serde;

pub mod address;
mod chain;
mod derive;
mod generator;
mod indexes;
mod path;

pub use address::{Address, AddressFormatError, AddressKind, AddressPayload, Discrimination};
pub use chain::{ChainIndex, ChainIndexParseError, STAKING_ROLE};
pub use derive::{account_xpub_from_str, DeriveError, DerivePublicKey};
pub use generator::{AddressGenerator, GenerateAddresses};
pub use indexes::{SegmentIndexes, UnhardenedIndex};
pub use path::DerivationSubpath;

/// Constant determining BIP32 boundary for u32 values after which index
/// is treated as hardened
pub const HARDENED_INDEX_BOUNDARY: u32 = 1 << 31;
