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

//! Binary address encoding used by the indexer.
//!
//! Address consists of a single header byte followed by compressed public
//! keys. The header highest bit carries network discrimination; the rest of
//! the header is an address kind tag. Addresses travel as lowercase hex
//! strings.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use bitcoin::hashes::hex::{FromHex, ToHex};
use bitcoin::secp256k1::constants::PUBLIC_KEY_SIZE;
use bitcoin::secp256k1::PublicKey;

const DISCRIMINATION_BIT: u8 = 0x80;

/// Errors parsing address data
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Display, Error)]
#[display(doc_comments)]
pub enum AddressFormatError {
    /// address string is not a valid hex encoding
    Hex,

    /// address data are empty
    Empty,

    /// unknown address kind tag {0}
    UnknownKind(u8),

    /// {kind} address must contain {expected} bytes, while {actual} bytes were
    /// provided
    InvalidLength {
        /// kind of the address read from the header
        kind: AddressKind,
        /// expected length of the address data
        expected: usize,
        /// actual length of the provided data
        actual: usize,
    },

    /// address contains invalid public key
    InvalidKey,

    /// {0} address was provided while a single address was expected
    NotSingle(AddressKind),
}

/// Network discrimination of an address
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub enum Discrimination {
    /// Production network
    #[display("production")]
    Production,

    /// Any of test networks
    #[display("test")]
    #[default]
    Test,
}

impl Discrimination {
    #[inline]
    fn header_bit(self) -> u8 {
        match self {
            Discrimination::Production => 0,
            Discrimination::Test => DISCRIMINATION_BIT,
        }
    }

    #[inline]
    fn from_header(header: u8) -> Self {
        if header & DISCRIMINATION_BIT == 0 {
            Discrimination::Production
        } else {
            Discrimination::Test
        }
    }
}

/// Kinds of addresses which may be registered for the same spending key.
///
/// The set is closed: each kind has a fixed header tag and payload layout.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[repr(u8)]
pub enum AddressKind {
    /// Address committing to a spending key only
    #[display("single")]
    Single = 0x03,

    /// Address committing to a spending key and a staking key
    #[display("group")]
    Group = 0x04,
}

impl AddressKind {
    /// All address kinds registered for each discovered key, in the order of
    /// registration
    pub const ALL: [AddressKind; 2] = [AddressKind::Single, AddressKind::Group];

    /// Header tag value for the address kind
    #[inline]
    pub fn tag(self) -> u8 { self as u8 }

    /// Detects address kind from a header tag value
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x03 => Some(AddressKind::Single),
            0x04 => Some(AddressKind::Group),
            _ => None,
        }
    }

    /// Length of the serialized address of this kind, including header
    pub fn data_len(self) -> usize {
        1 + match self {
            AddressKind::Single => PUBLIC_KEY_SIZE,
            AddressKind::Group => PUBLIC_KEY_SIZE * 2,
        }
    }
}

/// Address payload: the keys committed by the address
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum AddressPayload {
    /// Spending key only
    Single(PublicKey),

    /// Spending key linked to a staking key
    Group {
        /// key controlling spending of the funds
        spending: PublicKey,
        /// key to which the stake of the funds is delegated
        staking: PublicKey,
    },
}

/// Address with its network discrimination
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct Address {
    /// Network the address belongs to
    pub discrimination: Discrimination,

    /// Keys committed to by the address
    pub payload: AddressPayload,
}

impl Address {
    /// Constructs single address for a spending key
    #[inline]
    pub fn single(spending: PublicKey, discrimination: Discrimination) -> Self {
        Address {
            discrimination,
            payload: AddressPayload::Single(spending),
        }
    }

    /// Constructs group address linking spending key to a staking key
    #[inline]
    pub fn group(spending: PublicKey, staking: PublicKey, discrimination: Discrimination) -> Self {
        Address {
            discrimination,
            payload: AddressPayload::Group { spending, staking },
        }
    }

    /// Returns kind of the address
    pub fn kind(&self) -> AddressKind {
        match self.payload {
            AddressPayload::Single(_) => AddressKind::Single,
            AddressPayload::Group { .. } => AddressKind::Group,
        }
    }

    /// Returns spending key of the address
    pub fn spending_key(&self) -> PublicKey {
        match self.payload {
            AddressPayload::Single(key) => key,
            AddressPayload::Group { spending, .. } => spending,
        }
    }

    /// Returns the same spending key re-encoded as an address of a given kind
    /// within the same network
    pub fn with_kind(&self, kind: AddressKind, staking: PublicKey) -> Address {
        match kind {
            AddressKind::Single => Address::single(self.spending_key(), self.discrimination),
            AddressKind::Group => {
                Address::group(self.spending_key(), staking, self.discrimination)
            }
        }
    }

    /// Serializes address into bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let kind = self.kind();
        let mut data = Vec::with_capacity(kind.data_len());
        data.push(kind.tag() | self.discrimination.header_bit());
        match self.payload {
            AddressPayload::Single(key) => data.extend(key.serialize()),
            AddressPayload::Group { spending, staking } => {
                data.extend(spending.serialize());
                data.extend(staking.serialize());
            }
        }
        data
    }

    /// Parses address from bytes
    pub fn from_bytes(data: impl AsRef<[u8]>) -> Result<Self, AddressFormatError> {
        let data = data.as_ref();
        let header = *data.first().ok_or(AddressFormatError::Empty)?;
        let tag = header & !DISCRIMINATION_BIT;
        let kind = AddressKind::from_tag(tag).ok_or(AddressFormatError::UnknownKind(tag))?;
        if data.len() != kind.data_len() {
            return Err(AddressFormatError::InvalidLength {
                kind,
                expected: kind.data_len(),
                actual: data.len(),
            });
        }
        let discrimination = Discrimination::from_header(header);
        let key = |offset: usize| {
            PublicKey::from_slice(&data[offset..offset + PUBLIC_KEY_SIZE])
                .map_err(|_| AddressFormatError::InvalidKey)
        };
        Ok(match kind {
            AddressKind::Single => Address::single(key(1)?, discrimination),
            AddressKind::Group => {
                Address::group(key(1)?, key(1 + PUBLIC_KEY_SIZE)?, discrimination)
            }
        })
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { f.write_str(&self.to_bytes().to_hex()) }
}

impl FromStr for Address {
    type Err = AddressFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let data = Vec::<u8>::from_hex(s).map_err(|_| AddressFormatError::Hex)?;
        Address::from_bytes(data)
    }
}
