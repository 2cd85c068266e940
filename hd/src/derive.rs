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

use bitcoin::secp256k1::{self, All, Secp256k1, SECP256K1};
use bitcoin::util::bip32::{self, ExtendedPubKey};
use slip132::FromSlip132;

use crate::chain::STAKING_ROLE;
use crate::{DerivationSubpath, SegmentIndexes, UnhardenedIndex};

/// Errors during public key derivation
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display, Error)]
#[display(doc_comments)]
pub enum DeriveError {
    /// derivation index {0} lies outside of the unhardened index range
    IndexOutOfRange(u32),

    /// derivation path must contain at least one step
    EmptyPath,

    /// public key derivation at index {0} has failed
    DerivationFailure(u32),

    /// extended key can't be used for unhardened public derivation
    InvalidKey,
}

impl From<bip32::Error> for DeriveError {
    fn from(err: bip32::Error) -> Self {
        match err {
            bip32::Error::InvalidChildNumber(index) => DeriveError::IndexOutOfRange(index),
            bip32::Error::InvalidDerivationPathFormat => DeriveError::EmptyPath,
            _ => DeriveError::InvalidKey,
        }
    }
}

/// Deterministic public key derivation from an extended public key.
pub trait DerivePublicKey: Sized {
    /// Derives child extended key at the given unhardened index
    fn derive_child(&self, index: UnhardenedIndex) -> Result<Self, DeriveError>;

    /// Returns public key corresponding to the extended key
    fn to_public_key(&self) -> secp256k1::PublicKey;

    /// Derives extended key located at the end of a derivation subpath
    fn derive_subpath(&self, path: &DerivationSubpath<UnhardenedIndex>) -> Result<Self, DeriveError> {
        let mut steps = path.as_ref().iter();
        let first = steps.next().ok_or(DeriveError::EmptyPath)?;
        steps.try_fold(self.derive_child(*first)?, |key, index| key.derive_child(*index))
    }

    /// Derives public key located at the end of a derivation subpath
    #[inline]
    fn derive_public_key(
        &self,
        path: &DerivationSubpath<UnhardenedIndex>,
    ) -> Result<secp256k1::PublicKey, DeriveError> {
        self.derive_subpath(path).map(|key| key.to_public_key())
    }

    /// Derives staking public key of an account key, which is the first key
    /// under [`STAKING_ROLE`]
    fn staking_key(&self) -> Result<secp256k1::PublicKey, DeriveError> {
        let path = DerivationSubpath::with([
            UnhardenedIndex::from(STAKING_ROLE),
            UnhardenedIndex::zero(),
        ])?;
        self.derive_public_key(&path)
    }
}

impl DerivePublicKey for ExtendedPubKey {
    fn derive_child(&self, index: UnhardenedIndex) -> Result<Self, DeriveError> {
        let secp: &Secp256k1<All> = SECP256K1;
        self.ckd_pub(secp, index.into())
            .map_err(|_| DeriveError::DerivationFailure(index.first_index()))
    }

    #[inline]
    fn to_public_key(&self) -> secp256k1::PublicKey { self.public_key }
}

/// Parses account-level extended public key, accepting both BIP32 and
/// SLIP-132 (`ypub`, `zpub` etc) encodings
pub fn account_xpub_from_str(s: &str) -> Result<ExtendedPubKey, slip132::Error> {
    ExtendedPubKey::from_slip132_str(s.trim())
}
