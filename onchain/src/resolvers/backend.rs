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

use std::time::Duration;

use async_trait::async_trait;

use super::{FilterUsed, UsageFilterError, UsageResult};

/// Path of the address usage endpoint relative to the indexer base URL
pub const FILTER_USED_PATH: &str = "/api/v2/addresses/filterUsed";

/// Header carrying version of the client making requests
pub const CLIENT_VERSION_HEADER: &str = "x-client-version";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Serialize)]
#[serde(crate = "serde_crate")]
struct FilterUsedRequest<'a> {
    addresses: &'a [String],
}

impl From<reqwest::Error> for UsageFilterError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => UsageFilterError::Status(status.as_u16()),
            None => UsageFilterError::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for UsageFilterError {
    fn from(err: serde_json::Error) -> Self { UsageFilterError::Decode(err.to_string()) }
}

/// Address usage filter backed by a remote indexer HTTP API.
///
/// Each batch is resolved by a single `POST` request; failures are reported
/// to the caller and never retried.
#[derive(Clone, Debug)]
pub struct BackendFilter {
    client: reqwest::Client,
    endpoint: String,
    client_version: String,
    batch_limit: Option<usize>,
}

impl BackendFilter {
    /// Constructs filter for the indexer at `base_url` with default request
    /// timeout
    pub fn with(
        base_url: &str,
        client_version: impl ToString,
    ) -> Result<BackendFilter, UsageFilterError> {
        BackendFilter::with_timeout(base_url, client_version, DEFAULT_TIMEOUT)
    }

    /// Constructs filter for the indexer at `base_url` with a custom request
    /// timeout
    pub fn with_timeout(
        base_url: &str,
        client_version: impl ToString,
        timeout: Duration,
    ) -> Result<BackendFilter, UsageFilterError> {
        let base_url = base_url.trim_end_matches('/');
        if base_url.is_empty() {
            return Err(UsageFilterError::Config(s!("indexer URL is empty")));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| UsageFilterError::Config(err.to_string()))?;
        Ok(BackendFilter {
            client,
            endpoint: format!("{}{}", base_url, FILTER_USED_PATH),
            client_version: client_version.to_string(),
            batch_limit: None,
        })
    }

    /// Limits number of addresses the indexer accepts in a single request.
    /// Larger batches are rejected without contacting the indexer.
    pub fn with_batch_limit(mut self, limit: usize) -> Result<BackendFilter, UsageFilterError> {
        if limit == 0 {
            return Err(UsageFilterError::Config(s!("batch limit must be positive")));
        }
        self.batch_limit = Some(limit);
        Ok(self)
    }

    /// Full URL of the usage endpoint
    #[inline]
    pub fn endpoint(&self) -> &str { &self.endpoint }

    async fn request(&self, addresses: &[String]) -> Result<Vec<String>, UsageFilterError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(CLIENT_VERSION_HEADER, &self.client_version)
            .json(&FilterUsedRequest { addresses })
            .send()
            .await?
            .error_for_status()?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl FilterUsed for BackendFilter {
    async fn filter_used(&self, addresses: &[String]) -> Result<UsageResult, UsageFilterError> {
        if addresses.is_empty() {
            return Ok(UsageResult::default());
        }
        if let Some(limit) = self.batch_limit.filter(|limit| addresses.len() > *limit) {
            return Err(UsageFilterError::BatchTooLarge(addresses.len(), limit));
        }
        tracing::trace!(endpoint = %self.endpoint, count = addresses.len(), "querying address usage");
        let used = self.request(addresses).await.map_err(|err| {
            tracing::error!(endpoint = %self.endpoint, %err, "address usage lookup failed");
            err
        })?;
        Ok(UsageResult::with_used(addresses, used.iter().map(String::as_str)))
    }
}
