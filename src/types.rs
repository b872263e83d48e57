// src/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The two chains the tracer understands. Derived from the address
/// format, never stored independently of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Bitcoin,
}

impl Chain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Bitcoin => "bitcoin",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single sender -> receiver movement of funds within a transaction.
/// Amounts stay as decimal strings end to end; converting to floats
/// would lose precision on chain-native denominations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub sender: String,
    pub receiver: String,
    pub amount: String,
}

/// One transaction as returned by the lookup collaborator. Immutable
/// once fetched; a later fetch for the same wallet replaces the whole
/// history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    // The upstream service emits "txID"; accept both spellings.
    #[serde(alias = "txID")]
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub transfers: Vec<Transfer>,
}

/// A tracked wallet node. `address` is always canonical; wallets are
/// never removed during a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub address: String,
    pub chain: Chain,
    pub balance: f64,
    pub transactions: Vec<Transaction>,
    /// Labels from mixing detection. Empty when never evaluated or
    /// when detection is disabled.
    pub patterns: Vec<String>,
}

impl Wallet {
    pub fn empty(address: String, chain: Chain) -> Self {
        Self {
            address,
            chain,
            balance: 0.0,
            transactions: Vec::new(),
            patterns: Vec::new(),
        }
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

/// Partial update merged into a stored wallet. Balance and transactions
/// are replaced when present; `patterns` is replaced only when
/// explicitly provided, otherwise the stored value is carried forward.
#[derive(Debug, Clone, Default)]
pub struct WalletPatch {
    pub balance: Option<f64>,
    pub transactions: Option<Vec<Transaction>>,
    pub patterns: Option<Vec<String>>,
}

/// A committed, deduplicated transfer relationship in the graph.
/// Dedup key is the exact (from, to, amount) triple; direction matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub amount: String,
}

/// Result of one enrichment fetch, ready to merge into the store.
/// `patterns` is `None` when detection was not requested, so the merge
/// keeps whatever the wallet already had.
#[derive(Debug, Clone)]
pub struct WalletFetchResult {
    pub address: String,
    pub chain: Chain,
    pub balance: f64,
    pub transactions: Vec<Transaction>,
    pub patterns: Option<Vec<String>>,
}

impl WalletFetchResult {
    pub fn into_patch(self) -> WalletPatch {
        WalletPatch {
            balance: Some(self.balance),
            transactions: Some(self.transactions),
            patterns: self.patterns,
        }
    }
}

/// Four-tier classification derived from the number of detected mixing
/// patterns on a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone)]
pub struct TraceConfig {
    /// Base URL of the backend hosting both collaborators.
    pub api_base: String,
    pub request_timeout: Duration,
    /// Minimum pause between successive detection calls during a bulk
    /// re-fetch. The detection collaborator is rate sensitive.
    pub detection_pacing: Duration,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8080".to_string(),
            request_timeout: Duration::from_secs(30),
            detection_pacing: crate::enrichment::DETECTION_PACING,
        }
    }
}
