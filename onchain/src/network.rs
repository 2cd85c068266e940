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

use bitcoin::Network;
use restore_hd::Discrimination;

/// Public networks supported by address indexers
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Display, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub enum PublicNetwork {
    /// Production network
    #[display("mainnet")]
    Mainnet,

    /// Public test network
    #[display("testnet")]
    #[default]
    Testnet,
}

impl From<Network> for PublicNetwork {
    fn from(network: Network) -> Self {
        match network {
            Network::Bitcoin => PublicNetwork::Mainnet,
            Network::Testnet | Network::Signet | Network::Regtest => PublicNetwork::Testnet,
        }
    }
}

impl From<PublicNetwork> for Discrimination {
    fn from(network: PublicNetwork) -> Self { network.discrimination() }
}

impl PublicNetwork {
    /// Returns discrimination which must be used by the addresses of the
    /// network
    pub fn discrimination(self) -> Discrimination {
        match self {
            PublicNetwork::Mainnet => Discrimination::Production,
            PublicNetwork::Testnet => Discrimination::Test,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn discrimination() {
        assert_eq!(PublicNetwork::from(Network::Bitcoin).discrimination(), Discrimination::Production);
        assert_eq!(PublicNetwork::from(Network::Signet), PublicNetwork::Testnet);
        assert_eq!(Discrimination::from(PublicNetwork::Testnet), Discrimination::Test);
        assert_eq!(PublicNetwork::default(), PublicNetwork::Testnet);
    }
}
