//! Blocking HTTP client for the ANU QRNG JSON API.
//!
//! One request per [`EntropySource::fetch`]: `GET {endpoint}?type=..&length=..&size=..`.
//! There is no retry. A transport error, a non-2xx status, or `success: false`
//! fails the fetch immediately.

use std::time::Duration;

use ureq::Agent;

use crate::error::{Error, Result};
use crate::source::{EntropyBatch, EntropySource, FetchRequest, SourceInfo};
use crate::wire::AnuResponse;

/// Public ANU endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://qrng.anu.edu.au/API/jsonI.php";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

static ANU_INFO: SourceInfo = SourceInfo {
    name: "anu",
    description: "ANU quantum random numbers (vacuum fluctuation measurement) over HTTP",
    remote: true,
};

/// Client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Full URL of the `jsonI.php` endpoint (or a compatible server).
    pub endpoint: String,
    /// Deadline for a whole request, connect through body.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// [`EntropySource`] backed by the ANU QRNG API (or anything speaking its format).
#[derive(Clone)]
pub struct AnuClient {
    endpoint: String,
    agent: Agent,
}

impl AnuClient {
    pub fn new(config: ClientConfig) -> Self {
        let agent = Agent::new_with_config(
            Agent::config_builder()
                .timeout_global(Some(config.timeout))
                .http_status_as_error(false)
                .build(),
        );
        Self {
            endpoint: config.endpoint,
            agent,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl std::fmt::Debug for AnuClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnuClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Default for AnuClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl EntropySource for AnuClient {
    fn info(&self) -> &SourceInfo {
        &ANU_INFO
    }

    fn fetch(&self, request: &FetchRequest) -> Result<EntropyBatch> {
        log::trace!(
            "GET {} type={} length={} size={}",
            self.endpoint,
            request.kind,
            request.count,
            request.block_size
        );

        let mut resp = self
            .agent
            .get(self.endpoint.as_str())
            .query("type", request.kind.as_str())
            .query("length", request.count.to_string())
            .query("size", request.block_size.to_string())
            .call()
            .map_err(|e| {
                log::warn!("request to {} failed: {e}", self.endpoint);
                Error::SourceUnavailable(format!("request to {} failed: {e}", self.endpoint))
            })?;

        let status = resp.status();
        log::trace!("received response with status {status}");
        if !status.is_success() {
            log::warn!("{} answered with status {status}", self.endpoint);
            return Err(Error::SourceUnavailable(format!(
                "expected status 200, got {status}"
            )));
        }

        let body: AnuResponse = resp
            .body_mut()
            .read_json()
            .map_err(|e| Error::protocol(format!("failed to decode response body: {e}")))?;
        body.into_batch(request)
    }
}
