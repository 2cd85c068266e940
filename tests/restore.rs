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

use std::collections::BTreeSet;

use restore::hd::{
    account_xpub_from_str, Address, AddressGenerator, AddressKind, ChainIndex, DerivePublicKey,
    Discrimination, GenerateAddresses, UnhardenedIndex,
};
use restore::{insert_tree, AccountScanner, MemoryStore, ScanConfig};

const ACCOUNT_XPUB: &str = "xpub6ASuArnXKPbfEwhqN6e3mwBcDTgzisQN1wXN9BJcM47sSikHjJf3UFHKkNAWbWMiGj7Wf5uMash7SyYq527Hqck2AxYysAA7xmALppuCkwQ";

fn used_addresses(chain: ChainIndex, indexes: &[u32]) -> Vec<String> {
    let xpub = account_xpub_from_str(ACCOUNT_XPUB).unwrap();
    AddressGenerator::with_account(&xpub, chain, Discrimination::Production)
        .unwrap()
        .generate_addresses(indexes)
        .unwrap()
}

#[tokio::test]
async fn restores_account() {
    let xpub = account_xpub_from_str(ACCOUNT_XPUB).unwrap();
    let used = used_addresses(ChainIndex::External, &[5])
        .into_iter()
        .collect::<BTreeSet<_>>();

    let scanner = AccountScanner::with_account_xpub(
        &xpub,
        Discrimination::Production,
        ScanConfig::new(20, 20).unwrap(),
    )
    .unwrap();
    let scan = scanner.scan(&used, None, None).await.unwrap();

    assert_eq!(scan.external.last_used, Some(UnhardenedIndex::from(5u8)));
    assert_eq!(scan.internal.last_used, None);
    assert_eq!(scan.tree.external.children.len(), 6);
    assert_eq!(scan.tree.internal.children.len(), 0);

    let mut store = MemoryStore::new();
    let account = store.account();
    insert_tree(&mut store, account, &scan.tree).await.unwrap();

    assert_eq!(store.chains().len(), 2);
    assert_eq!(store.addresses().len(), 12);

    let staking = xpub.staking_key().unwrap();
    let external = store.children(account).next().unwrap();
    let fifth = store.children(external).nth(5).unwrap();
    assert_eq!(store.path(fifth).unwrap().to_string(), "/0/5");

    let records = store.addresses_at(fifth).collect::<Vec<_>>();
    assert_eq!(records[0].kind, AddressKind::Single);
    assert!(used.contains(&records[0].data));
    let group: Address = records[1].data.parse().unwrap();
    assert_eq!(group.kind(), AddressKind::Group);
    assert_eq!(group.discrimination, Discrimination::Production);
    assert_eq!(
        group,
        Address::group(
            records[0].data.parse::<Address>().unwrap().spending_key(),
            staking,
            Discrimination::Production
        )
    );
}

#[tokio::test]
async fn resumes_from_known_usage() {
    let xpub = account_xpub_from_str(ACCOUNT_XPUB).unwrap();
    let mut used = used_addresses(ChainIndex::External, &[0, 1, 2, 30])
        .into_iter()
        .collect::<BTreeSet<_>>();
    used.extend(used_addresses(ChainIndex::Internal, &[0, 18]));

    let scanner =
        AccountScanner::with_account_xpub(&xpub, Discrimination::Production, ScanConfig::default())
            .unwrap();

    let full = scanner.scan(&used, None, None).await.unwrap();
    assert_eq!(full.external.last_used, Some(UnhardenedIndex::from(2u8)));
    assert_eq!(full.internal.last_used, Some(UnhardenedIndex::from(18u8)));
    assert_eq!(full.tree.internal.children.len(), 19);

    let resumed = scanner
        .scan(&used, full.external.last_used, full.internal.last_used)
        .await
        .unwrap();
    assert_eq!(resumed.external.last_used, full.external.last_used);
    assert!(resumed.external.candidates.is_empty());
    assert!(resumed.internal.candidates.is_empty());
}
