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

use std::collections::BTreeMap;

use async_trait::async_trait;
use hd::{DerivationSubpath, UnhardenedIndex};

use crate::{
    AddressInsertBuilder, AddressRecord, ChainRecord, InsertError, InsertNode, InsertOp,
    InsertTree, StorageError,
};

/// Identifier assigned by a storage sink to a stored derivation
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
#[display("#{0}")]
pub struct DerivationId(u64);

impl From<u64> for DerivationId {
    fn from(id: u64) -> Self { DerivationId(id) }
}

impl DerivationId {
    /// Returns numeric value of the identifier
    #[inline]
    pub fn to_u64(self) -> u64 { self.0 }
}

/// Persistence sink for discovered derivations
#[async_trait]
pub trait StoreAddresses: Send {
    /// Stores derivation at `index` under `parent` and returns its identifier
    async fn add_derivation(
        &mut self,
        parent: DerivationId,
        index: UnhardenedIndex,
    ) -> Result<DerivationId, StorageError>;

    /// Stores account chain
    async fn add_chain(&mut self, chain: ChainRecord) -> Result<(), StorageError>;

    /// Stores address belonging to a derivation
    async fn add_address(
        &mut self,
        derivation: DerivationId,
        address: AddressRecord,
    ) -> Result<(), StorageError>;
}

enum Action {
    Chain(Option<UnhardenedIndex>),
    Addresses([AddressRecord; 2]),
}

struct Step {
    parent: Option<usize>,
    index: UnhardenedIndex,
    action: Action,
}

fn plan(tree: &InsertTree) -> Result<Vec<Step>, InsertError> {
    let mut steps = Vec::with_capacity(tree.count());
    let mut stack: Vec<(Option<usize>, &InsertNode)> =
        tree.nodes().into_iter().rev().map(|node| (None, node)).collect();
    while let Some((parent, node)) = stack.pop() {
        let action = match &node.op {
            InsertOp::Chain { display_cutoff } => Action::Chain(*display_cutoff),
            InsertOp::Address {
                address,
                staking_key,
            } => Action::Addresses(AddressInsertBuilder::with(*staking_key).build(address)?),
        };
        let pos = steps.len();
        steps.push(Step {
            parent,
            index: node.index,
            action,
        });
        stack.extend(node.children.iter().rev().map(|child| (Some(pos), child)));
    }
    Ok(steps)
}

/// Writes an address tree into the storage under the account derivation.
///
/// Nodes are written parent before child, external chain first. All
/// addresses of the tree are parsed before the first write, so a malformed
/// address leaves the storage untouched.
pub async fn insert_tree<S>(
    sink: &mut S,
    account_id: DerivationId,
    tree: &InsertTree,
) -> Result<(), InsertError>
where
    S: StoreAddresses + ?Sized,
{
    let steps = plan(tree)?;
    tracing::debug!(account = %account_id, nodes = steps.len(), "inserting address tree");

    let mut ids = Vec::with_capacity(steps.len());
    for step in steps {
        let parent = step.parent.map(|pos| ids[pos]).unwrap_or(account_id);
        let id = sink.add_derivation(parent, step.index).await?;
        match step.action {
            Action::Chain(display_cutoff) => {
                sink.add_chain(ChainRecord {
                    key_derivation_id: id,
                    display_cutoff,
                })
                .await?
            }
            Action::Addresses(records) => {
                for record in records {
                    sink.add_address(id, record).await?;
                }
            }
        }
        tracing::trace!(parent = %parent, index = %step.index, derivation = %id, "node inserted");
        ids.push(id);
    }
    Ok(())
}

/// Stored derivation entry of [`MemoryStore`]
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Derivation {
    /// Parent derivation; `None` for account roots
    pub parent: Option<DerivationId>,

    /// Index of the derivation under its parent; `None` for account roots
    pub index: Option<UnhardenedIndex>,
}

/// In-memory storage sink
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct MemoryStore {
    derivations: BTreeMap<DerivationId, Derivation>,
    chains: Vec<ChainRecord>,
    addresses: Vec<(DerivationId, AddressRecord)>,
}

impl MemoryStore {
    /// Constructs empty storage
    #[inline]
    pub fn new() -> MemoryStore { MemoryStore::default() }

    fn next_id(&self) -> DerivationId { DerivationId(self.derivations.len() as u64) }

    /// Registers new account root derivation
    pub fn account(&mut self) -> DerivationId {
        let id = self.next_id();
        self.derivations.insert(id, Derivation {
            parent: None,
            index: None,
        });
        id
    }

    /// Returns stored derivation
    #[inline]
    pub fn derivation(&self, id: DerivationId) -> Option<Derivation> {
        self.derivations.get(&id).copied()
    }

    /// Returns derivation path from the account root to a stored derivation;
    /// `None` for unknown ids and account roots
    pub fn path(&self, id: DerivationId) -> Option<DerivationSubpath<UnhardenedIndex>> {
        let mut indexes = vec![];
        let mut current = self.derivation(id)?;
        while let (Some(parent), Some(index)) = (current.parent, current.index) {
            indexes.push(index);
            current = self.derivation(parent)?;
        }
        let mut steps = indexes.into_iter().rev();
        let path = DerivationSubpath::single(steps.next()?);
        Some(steps.fold(path, |path, index| path.extended(index)))
    }

    /// Stored chains in insertion order
    #[inline]
    pub fn chains(&self) -> &[ChainRecord] { &self.chains }

    /// Stored addresses in insertion order
    #[inline]
    pub fn addresses(&self) -> &[(DerivationId, AddressRecord)] { &self.addresses }

    /// Stored addresses of a derivation
    pub fn addresses_at(&self, id: DerivationId) -> impl Iterator<Item = &AddressRecord> {
        self.addresses
            .iter()
            .filter(move |(derivation, _)| *derivation == id)
            .map(|(_, record)| record)
    }

    /// Child derivations of a derivation, in insertion order
    pub fn children(&self, id: DerivationId) -> impl Iterator<Item = DerivationId> + '_ {
        self.derivations
            .iter()
            .filter(move |(_, derivation)| derivation.parent == Some(id))
            .map(|(child, _)| *child)
    }
}

#[async_trait]
impl StoreAddresses for MemoryStore {
    async fn add_derivation(
        &mut self,
        parent: DerivationId,
        index: UnhardenedIndex,
    ) -> Result<DerivationId, StorageError> {
        if !self.derivations.contains_key(&parent) {
            return Err(StorageError::with(format!("unknown parent derivation {}", parent)));
        }
        let id = self.next_id();
        self.derivations.insert(id, Derivation {
            parent: Some(parent),
            index: Some(index),
        });
        Ok(id)
    }

    async fn add_chain(&mut self, chain: ChainRecord) -> Result<(), StorageError> {
        if !self.derivations.contains_key(&chain.key_derivation_id) {
            return Err(StorageError::with(format!(
                "chain refers to unknown derivation {}",
                chain.key_derivation_id
            )));
        }
        self.chains.push(chain);
        Ok(())
    }

    async fn add_address(
        &mut self,
        derivation: DerivationId,
        address: AddressRecord,
    ) -> Result<(), StorageError> {
        if !self.derivations.contains_key(&derivation) {
            return Err(StorageError::with(format!(
                "address refers to unknown derivation {}",
                derivation
            )));
        }
        self.addresses.push((derivation, address));
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use hd::{Address, AddressKind, ChainIndex, Discrimination, SegmentIndexes};
    use secp256k1::{PublicKey, SecretKey, SECP256K1};

    use super::*;

    fn key(byte: u8) -> PublicKey {
        PublicKey::from_secret_key(SECP256K1, &SecretKey::from_slice(&[byte; 32]).unwrap())
    }

    fn address(byte: u8) -> String { Address::single(key(byte), Discrimination::Test).to_string() }

    fn tree(external: Vec<String>) -> InsertTree {
        let staking = key(100);
        InsertTree {
            external: InsertNode::chain(
                ChainIndex::External,
                Some(UnhardenedIndex::zero()),
                external
                    .into_iter()
                    .enumerate()
                    .map(|(index, addr)| {
                        InsertNode::address(UnhardenedIndex::from(index as u16), addr, staking)
                    })
                    .collect(),
            ),
            internal: InsertNode::chain(ChainIndex::Internal, None, vec![InsertNode::address(
                UnhardenedIndex::zero(),
                address(50),
                staking,
            )]),
        }
    }

    #[tokio::test]
    async fn parent_before_child() {
        let mut store = MemoryStore::new();
        let account = store.account();
        insert_tree(&mut store, account, &tree(vec![address(1), address(2)]))
            .await
            .unwrap();

        let chains = store.children(account).collect::<Vec<_>>();
        assert_eq!(chains.len(), 2);
        assert!(chains[0] < chains[1]);
        assert_eq!(store.chains(), &[
            ChainRecord {
                key_derivation_id: chains[0],
                display_cutoff: Some(UnhardenedIndex::zero()),
            },
            ChainRecord {
                key_derivation_id: chains[1],
                display_cutoff: None,
            }
        ]);

        let external = store.children(chains[0]).collect::<Vec<_>>();
        assert_eq!(external.len(), 2);
        assert_eq!(store.path(external[1]).unwrap().to_string(), "/0/1");
        let internal = store.children(chains[1]).collect::<Vec<_>>();
        assert_eq!(store.path(internal[0]).unwrap().to_string(), "/1/0");
        assert_eq!(store.path(account), None);

        let records = store.addresses_at(external[0]).collect::<Vec<_>>();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, AddressKind::Single);
        assert_eq!(records[0].data, address(1));
        assert_eq!(records[1].kind, AddressKind::Group);
        assert_eq!(store.addresses().len(), 6);
    }

    #[tokio::test]
    async fn malformed_tree_writes_nothing() {
        let mut store = MemoryStore::new();
        let account = store.account();
        let err = insert_tree(&mut store, account, &tree(vec![address(1), s!("0bad")]))
            .await
            .unwrap_err();
        assert!(matches!(err, InsertError::AddressFormat(_)));
        assert_eq!(store.children(account).count(), 0);
        assert!(store.chains().is_empty());
        assert!(store.addresses().is_empty());
    }

    #[tokio::test]
    async fn unknown_account() {
        let mut store = MemoryStore::new();
        let err = insert_tree(&mut store, DerivationId::from(7u64), &tree(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, InsertError::Storage(_)));
    }
}
