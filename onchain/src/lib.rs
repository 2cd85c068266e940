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

//! Library for requesting onchain usage data for wallet addresses: checking
//! which of the generated addresses were already seen by a blockchain
//! indexer.

// Coding conventions
#![recursion_limit = "256"]
#![deny(dead_code, missing_docs)]

#[macro_use]
extern crate amplify;
#[cfg(any(feature = "serde", feature = "backend"))]
#[macro_use]
extern crate serde_crate as serde;

mod network;
mod resolvers;

pub use network::PublicNetwork;
#[cfg(feature = "backend")]
pub use resolvers::BackendFilter;
pub use resolvers::{FilterUsed, UsageFilterError, UsageResult};
