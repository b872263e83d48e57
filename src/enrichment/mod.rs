// src/enrichment/mod.rs
//! Per-wallet data enrichment: balance and transaction history from the
//! wallet-lookup collaborator, optionally overlaid with mixing patterns
//! from the detection collaborator.

pub mod clients;
mod service;

pub use clients::{HttpMixingDetection, HttpWalletLookup};
pub use service::EnrichmentService;

use crate::error::TraceError;
use crate::types::{Chain, Transaction};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minimum pause between successive detection calls during a bulk
/// sweep. The detection collaborator is rate sensitive; lookup calls
/// are not throttled.
pub const DETECTION_PACING: Duration = Duration::from_millis(100);

/// Body of a successful lookup response.
#[derive(Debug, Clone, Deserialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// One entry of the detection response. A requested address with no
/// matching entry is treated as having no patterns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionEntry {
    pub address: String,
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// Wallet-lookup collaborator: balance plus transaction history for a
/// canonical address on a known chain.
#[async_trait]
pub trait WalletLookup: Send + Sync {
    async fn lookup(&self, address: &str, chain: Chain) -> Result<LookupResponse, TraceError>;
}

/// Mixing-detection collaborator. Opaque classifier; only the
/// request/response contract matters here.
#[async_trait]
pub trait MixingDetection: Send + Sync {
    async fn detect(&self, addresses: &[String]) -> Result<Vec<DetectionEntry>, TraceError>;
}
