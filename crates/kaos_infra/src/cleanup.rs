//! Remote resource cleanup before teardown.
//!
//! The running backend manages resources of its own (leases, jobs) that must
//! be released while its host infrastructure is still reachable.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{InfraError, InfraResult};

/// Default timeout for the cleanup request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Cleanup endpoint for a backend URL.
pub fn resources_url(backend_url: &str) -> String {
    format!("{}/internal/resources", backend_url.trim_end_matches('/'))
}

/// Asks a running backend to release the resources it manages.
#[async_trait]
pub trait ResourceCleaner: Send + Sync {
    async fn delete_resources(&self, backend_url: &str) -> InfraResult<()>;
}

/// `DELETE {backend_url}/internal/resources` over HTTP.
pub struct HttpResourceCleaner {
    client: reqwest::Client,
}

impl HttpResourceCleaner {
    pub fn new() -> InfraResult<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> InfraResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InfraError::Cleanup(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ResourceCleaner for HttpResourceCleaner {
    async fn delete_resources(&self, backend_url: &str) -> InfraResult<()> {
        let url = resources_url(backend_url);
        debug!("DELETE {}", url);

        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| InfraError::Cleanup(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InfraError::Cleanup(format!("{} returned {}: {}", url, status, body)));
        }
        Ok(())
    }
}
