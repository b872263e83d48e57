// src/enrichment/service.rs
use super::{HttpMixingDetection, HttpWalletLookup, MixingDetection, WalletLookup};
use crate::address;
use crate::error::TraceError;
use crate::types::{TraceConfig, WalletFetchResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// Fetches per-wallet data from the two collaborators and shapes it for
/// the store's merge policy. Stateless relative to the graph; fetches
/// for distinct addresses are independent.
#[derive(Clone)]
pub struct EnrichmentService {
    lookup: Arc<dyn WalletLookup>,
    detection: Arc<dyn MixingDetection>,
}

impl EnrichmentService {
    pub fn new(lookup: Arc<dyn WalletLookup>, detection: Arc<dyn MixingDetection>) -> Self {
        Self { lookup, detection }
    }

    /// Wire both collaborators to their HTTP endpoints.
    pub fn http(config: &TraceConfig) -> Result<Self, TraceError> {
        let lookup = HttpWalletLookup::new(&config.api_base, config.request_timeout)?;
        let detection = HttpMixingDetection::new(&config.api_base, config.request_timeout)?;
        Ok(Self::new(Arc::new(lookup), Arc::new(detection)))
    }

    /// Fetch balance and transaction history for one address, and the
    /// mixing-pattern overlay when `detect_mixing` is set.
    ///
    /// Lookup failure aborts the fetch with `NotAssociated` or
    /// `Transport`. Detection failure never does: the overlay degrades
    /// to an empty pattern list. With `detect_mixing` off the result
    /// carries no pattern field at all, so the store keeps whatever the
    /// wallet already had.
    pub async fn fetch(
        &self,
        address: &str,
        detect_mixing: bool,
    ) -> Result<WalletFetchResult, TraceError> {
        let canonical = address::canonicalize(address);
        if canonical.is_empty() {
            return Err(TraceError::EmptyAddress);
        }
        let chain = address::classify(&canonical);

        let looked_up = self.lookup.lookup(&canonical, chain).await?;
        debug!(
            address = %canonical,
            balance = looked_up.balance,
            transactions = looked_up.transactions.len(),
            "wallet lookup succeeded"
        );

        let patterns = if detect_mixing {
            Some(self.detect_for(&canonical).await)
        } else {
            None
        };

        Ok(WalletFetchResult {
            address: canonical,
            chain,
            balance: looked_up.balance,
            transactions: looked_up.transactions,
            patterns,
        })
    }

    /// Single-address detection. Absorbs collaborator failure into an
    /// empty pattern list; an answer without an entry for the address
    /// also means no patterns.
    async fn detect_for(&self, canonical: &str) -> Vec<String> {
        let request = vec![canonical.to_string()];
        match self.detection.detect(&request).await {
            Ok(entries) => entries
                .into_iter()
                .find(|entry| address::equals(&entry.address, canonical))
                .map(|entry| entry.patterns)
                .unwrap_or_default(),
            Err(e) => {
                warn!(address = %canonical, error = %e, "mixing detection degraded to no patterns");
                Vec::new()
            }
        }
    }
}
