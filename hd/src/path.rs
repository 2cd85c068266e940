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

use core::fmt::{self, Display, Formatter};
use core::str::FromStr;

use bitcoin::util::bip32;

use crate::SegmentIndexes;

/// Derivation path that consisting only of single type of segments.
///
/// Used to specify derivation from an account-level extended public key
/// without extended private key accessible.
///
/// Type guarantees that the number of derivation path segment is not zero.
/// The path is immutable once constructed.
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct DerivationSubpath<Segment>(Vec<Segment>)
where
    Segment: SegmentIndexes;

impl<Segment> DerivationSubpath<Segment>
where
    Segment: SegmentIndexes,
{
    /// Constructs derivation subpath from a sequence of segments. Errors if
    /// the sequence is empty.
    pub fn with(segments: impl IntoIterator<Item = Segment>) -> Result<Self, bip32::Error> {
        let inner = segments.into_iter().collect::<Vec<_>>();
        if inner.is_empty() {
            return Err(bip32::Error::InvalidDerivationPathFormat);
        }
        Ok(Self(inner))
    }

    /// Constructs single-segment derivation subpath
    #[inline]
    pub fn single(segment: Segment) -> Self { Self(vec![segment]) }

    /// Returns new subpath extended with one more segment
    pub fn extended(&self, segment: Segment) -> Self {
        let mut inner = self.0.clone();
        inner.push(segment);
        Self(inner)
    }
}

impl<Segment> AsRef<[Segment]> for DerivationSubpath<Segment>
where
    Segment: SegmentIndexes,
{
    #[inline]
    fn as_ref(&self) -> &[Segment] { &self.0 }
}

impl<Segment> Display for DerivationSubpath<Segment>
where
    Segment: SegmentIndexes + Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            f.write_str("/")?;
            Display::fmt(segment, f)?;
        }
        Ok(())
    }
}

impl<Segment> FromStr for DerivationSubpath<Segment>
where
    Segment: SegmentIndexes + FromStr,
    bip32::Error: From<<Segment as FromStr>::Err>,
{
    type Err = bip32::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.starts_with('/') {
            return Err(bip32::Error::InvalidDerivationPathFormat);
        }
        let inner = s[1..]
            .split('/')
            .map(Segment::from_str)
            .collect::<Result<Vec<_>, Segment::Err>>()?;
        Self::with(inner)
    }
}
