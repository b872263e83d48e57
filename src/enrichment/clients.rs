// src/enrichment/clients.rs
use super::{DetectionEntry, LookupResponse, MixingDetection, WalletLookup};
use crate::error::TraceError;
use crate::types::Chain;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

fn build_client(timeout: Duration) -> Result<Client, TraceError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| TraceError::Transport(format!("failed to build HTTP client: {e}")))
}

/// HTTP implementation of the wallet-lookup collaborator:
/// `GET {base}/api/search?address=..&chain=..`.
#[derive(Clone)]
pub struct HttpWalletLookup {
    client: Client,
    base_url: String,
}

impl HttpWalletLookup {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TraceError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl WalletLookup for HttpWalletLookup {
    async fn lookup(&self, address: &str, chain: Chain) -> Result<LookupResponse, TraceError> {
        let url = format!("{}/api/search", self.base_url);
        debug!(%address, %chain, "looking up wallet");
        let response = self
            .client
            .get(&url)
            .query(&[("address", address), ("chain", chain.as_str())])
            .send()
            .await
            .map_err(|e| TraceError::Transport(e.to_string()))?;

        // The backend answers with an error status when it has nothing
        // for the address.
        if !response.status().is_success() {
            return Err(TraceError::NotAssociated(address.to_string()));
        }

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| TraceError::Transport(format!("malformed lookup response: {e}")))?;

        // A 200 with no address field means the same thing.
        if body.address.is_empty() {
            return Err(TraceError::NotAssociated(address.to_string()));
        }
        Ok(body)
    }
}

/// HTTP implementation of the mixing-detection collaborator:
/// `POST {base}/api/detect-selected` with a JSON array of canonical
/// addresses.
#[derive(Clone)]
pub struct HttpMixingDetection {
    client: Client,
    base_url: String,
}

impl HttpMixingDetection {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TraceError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MixingDetection for HttpMixingDetection {
    async fn detect(&self, addresses: &[String]) -> Result<Vec<DetectionEntry>, TraceError> {
        let url = format!("{}/api/detect-selected", self.base_url);
        debug!(count = addresses.len(), "requesting mixing detection");
        let response = self
            .client
            .post(&url)
            .json(&addresses)
            .send()
            .await
            .map_err(|e| TraceError::DetectionUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TraceError::DetectionUnavailable(format!(
                "detection service returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| TraceError::DetectionUnavailable(format!("malformed response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_response_tolerates_missing_fields() {
        let body: LookupResponse = serde_json::from_str("{}").unwrap();
        assert!(body.address.is_empty());
        assert_eq!(body.balance, 0.0);
        assert!(body.transactions.is_empty());
    }

    #[test]
    fn detection_entry_defaults_patterns() {
        let entry: DetectionEntry =
            serde_json::from_str(r#"{"address":"0xabc"}"#).unwrap();
        assert!(entry.patterns.is_empty());
    }

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let lookup =
            HttpWalletLookup::new("http://localhost:8080/", Duration::from_secs(5)).unwrap();
        assert_eq!(lookup.base_url, "http://localhost:8080");
    }
}
