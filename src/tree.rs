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

//! Insertable tree of discovered derivations.
//!
//! The tree is plain data: each node carries its derivation index and a
//! tagged operation which storage applies after assigning the node its
//! derivation id. See [`crate::insert_tree`] for the interpreter.

use hd::{ChainIndex, UnhardenedIndex};
use secp256k1::PublicKey;

/// Operation applied to the storage for a tree node
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum InsertOp {
    /// Registers account chain
    Chain {
        /// Index of the last address displayed to the user by default;
        /// `None` hides all addresses of the chain until they are used
        display_cutoff: Option<UnhardenedIndex>,
    },

    /// Registers all address kinds for a discovered single address
    Address {
        /// Discovered single address (hex encoding)
        address: String,
        /// Account staking key to link group address with
        staking_key: PublicKey,
    },
}

/// Node of the insertable tree
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct InsertNode {
    /// Derivation index of the node under its parent
    pub index: UnhardenedIndex,

    /// Storage operation for the node
    pub op: InsertOp,

    /// Child nodes, in derivation index order
    pub children: Vec<InsertNode>,
}

impl InsertNode {
    /// Constructs chain node with discovered address nodes as children
    pub fn chain(
        chain: ChainIndex,
        display_cutoff: Option<UnhardenedIndex>,
        children: Vec<InsertNode>,
    ) -> InsertNode {
        InsertNode {
            index: chain.into(),
            op: InsertOp::Chain { display_cutoff },
            children,
        }
    }

    /// Constructs leaf node for a discovered address
    pub fn address(index: UnhardenedIndex, address: String, staking_key: PublicKey) -> InsertNode {
        InsertNode {
            index,
            op: InsertOp::Address {
                address,
                staking_key,
            },
            children: vec![],
        }
    }

    /// Total number of nodes in the subtree, including this node
    pub fn count(&self) -> usize { 1 + self.children.iter().map(InsertNode::count).sum::<usize>() }
}

/// Tree of discovered account derivations: exactly two chain nodes, external
/// and internal.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct InsertTree {
    /// Node of the receiving chain
    pub external: InsertNode,

    /// Node of the change chain
    pub internal: InsertNode,
}

impl InsertTree {
    /// Returns top-level nodes in the order of their insertion
    #[inline]
    pub fn nodes(&self) -> [&InsertNode; 2] { [&self.external, &self.internal] }

    /// Returns top-level node for a given chain
    pub fn chain(&self, chain: ChainIndex) -> &InsertNode {
        match chain {
            ChainIndex::External => &self.external,
            ChainIndex::Internal => &self.internal,
        }
    }

    /// Total number of nodes in the tree
    pub fn count(&self) -> usize { self.external.count() + self.internal.count() }
}
