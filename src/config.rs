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

/// Number of consecutive unused addresses after which chain scanning stops
/// (BIP44 gap limit)
pub const DEFAULT_GAP_LIMIT: u32 = 20;

/// Maximal number of addresses checked by a single usage request
pub const DEFAULT_REQUEST_SIZE: u32 = 50;

/// Upper bound for the gap limit accepted by [`ScanConfig::new`]
pub const MAX_GAP_LIMIT: u32 = 1000;

/// Errors in scan configuration
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Display, Error)]
#[display(doc_comments)]
pub enum ConfigError {
    /// gap limit must be a positive number
    ZeroGapLimit,

    /// gap limit {0} exceeds maximal allowed value
    GapLimitTooLarge(u32),

    /// request size must be a positive number
    ZeroRequestSize,
}

/// Parameters of the address discovery
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase", default)
)]
pub struct ScanConfig {
    /// Number of consecutive unused addresses probed past the last used one
    pub gap_limit: u32,

    /// Maximal number of addresses passed to a usage filter at once
    pub request_size: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            gap_limit: DEFAULT_GAP_LIMIT,
            request_size: DEFAULT_REQUEST_SIZE,
        }
    }
}

impl ScanConfig {
    /// Constructs validated scan configuration
    pub fn new(gap_limit: u32, request_size: u32) -> Result<ScanConfig, ConfigError> {
        let config = ScanConfig {
            gap_limit,
            request_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration parameters are within allowed bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gap_limit == 0 {
            return Err(ConfigError::ZeroGapLimit);
        }
        if self.gap_limit > MAX_GAP_LIMIT {
            return Err(ConfigError::GapLimitTooLarge(self.gap_limit));
        }
        if self.request_size == 0 {
            return Err(ConfigError::ZeroRequestSize);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn validation() {
        assert_eq!(ScanConfig::new(20, 50), Ok(ScanConfig::default()));
        assert_eq!(ScanConfig::new(0, 50), Err(ConfigError::ZeroGapLimit));
        assert_eq!(ScanConfig::new(20, 0), Err(ConfigError::ZeroRequestSize));
        assert_eq!(
            ScanConfig::new(MAX_GAP_LIMIT + 1, 50),
            Err(ConfigError::GapLimitTooLarge(MAX_GAP_LIMIT + 1))
        );
        assert!(ScanConfig::new(MAX_GAP_LIMIT, 1).is_ok());
    }
}
