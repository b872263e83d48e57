// src/graph.rs
//! In-memory wallet graph: the ground truth set of tracked wallets and
//! committed transfer edges. All operations are synchronous, perform no
//! I/O, and are idempotent with respect to duplicate input.

use crate::address;
use crate::types::{Edge, Wallet, WalletPatch};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct WalletGraph {
    wallets: HashMap<String, Wallet>,
    // Canonical addresses in insertion order, for stable rendering.
    order: Vec<String>,
    edges: Vec<Edge>,
}

impl WalletGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an empty wallet record if the address is not yet tracked.
    /// Returns true when a new record was created.
    pub fn ensure_wallet(&mut self, address: &str) -> bool {
        let canonical = address::canonicalize(address);
        if self.wallets.contains_key(&canonical) {
            return false;
        }
        let chain = address::classify(&canonical);
        debug!(address = %canonical, %chain, "tracking new wallet");
        self.order.push(canonical.clone());
        self.wallets
            .insert(canonical.clone(), Wallet::empty(canonical, chain));
        true
    }

    /// Merge a patch into the wallet record, creating the record first
    /// if needed. Balance and transactions are replaced wholesale when
    /// the patch carries them; `patterns` is replaced only when the
    /// patch explicitly provides a value.
    pub fn upsert_wallet(&mut self, address: &str, patch: WalletPatch) {
        let canonical = address::canonicalize(address);
        self.ensure_wallet(&canonical);
        let Some(wallet) = self.wallets.get_mut(&canonical) else {
            return;
        };
        if let Some(balance) = patch.balance {
            wallet.balance = balance;
        }
        if let Some(transactions) = patch.transactions {
            wallet.transactions = transactions;
        }
        if let Some(patterns) = patch.patterns {
            wallet.patterns = patterns;
        }
    }

    /// Register a transfer edge. Returns true when the edge was
    /// inserted; false when an identical (from, to, amount) triple
    /// already exists or when either endpoint is not a tracked wallet.
    /// The direction-sensitive triple is the dedup key, so (A, B, x)
    /// and (B, A, x) are distinct edges, and self-edges are allowed.
    pub fn add_edge(&mut self, from: &str, to: &str, amount: &str) -> bool {
        let from = address::canonicalize(from);
        let to = address::canonicalize(to);
        if !self.wallets.contains_key(&from) || !self.wallets.contains_key(&to) {
            debug!(%from, %to, "edge rejected, endpoint not tracked");
            return false;
        }
        let exists = self
            .edges
            .iter()
            .any(|e| e.from == from && e.to == to && e.amount == amount);
        if exists {
            return false;
        }
        self.edges.push(Edge {
            from,
            to,
            amount: amount.to_string(),
        });
        true
    }

    pub fn contains(&self, address: &str) -> bool {
        self.wallets.contains_key(&address::canonicalize(address))
    }

    pub fn wallet(&self, address: &str) -> Option<&Wallet> {
        self.wallets.get(&address::canonicalize(address))
    }

    /// Tracked wallets in insertion order.
    pub fn list_wallets(&self) -> Vec<&Wallet> {
        self.order
            .iter()
            .filter_map(|addr| self.wallets.get(addr))
            .collect()
    }

    pub fn list_edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Canonical addresses in insertion order.
    pub fn addresses(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Reset `patterns` to empty on every tracked wallet. Local state
    /// only; used when mixing detection is switched off.
    pub fn clear_patterns(&mut self) {
        for wallet in self.wallets.values_mut() {
            wallet.patterns.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chain, Transaction};
    use chrono::{TimeZone, Utc};

    fn tx(id: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            transfers: vec![],
        }
    }

    #[test]
    fn ensure_wallet_dedups_on_canonical_address() {
        let mut graph = WalletGraph::new();
        assert!(graph.ensure_wallet("0xABC"));
        assert!(!graph.ensure_wallet("0xabc"));
        assert!(!graph.ensure_wallet(" 0xAbC "));
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.list_wallets()[0].address, "0xabc");
        assert_eq!(graph.list_wallets()[0].chain, Chain::Ethereum);
    }

    #[test]
    fn wallets_listed_in_insertion_order() {
        let mut graph = WalletGraph::new();
        graph.ensure_wallet("0xBBB");
        graph.ensure_wallet("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2");
        graph.ensure_wallet("0xAAA");
        let order: Vec<_> = graph.list_wallets().iter().map(|w| w.address.clone()).collect();
        assert_eq!(
            order,
            vec!["0xbbb", "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2", "0xaaa"]
        );
    }

    #[test]
    fn upsert_replaces_balance_and_transactions_wholesale() {
        let mut graph = WalletGraph::new();
        graph.upsert_wallet(
            "0xABC",
            WalletPatch {
                balance: Some(1.5),
                transactions: Some(vec![tx("a"), tx("b")]),
                patterns: Some(vec!["peel-chain".into()]),
            },
        );
        graph.upsert_wallet(
            "0xabc",
            WalletPatch {
                balance: Some(2.0),
                transactions: Some(vec![tx("c")]),
                patterns: None,
            },
        );
        let wallet = graph.wallet("0xAbC").unwrap();
        assert_eq!(wallet.balance, 2.0);
        assert_eq!(wallet.transactions.len(), 1);
        // Patterns carried forward when the patch omits them.
        assert_eq!(wallet.patterns, vec!["peel-chain".to_string()]);
    }

    #[test]
    fn explicit_empty_patterns_overwrite() {
        let mut graph = WalletGraph::new();
        graph.upsert_wallet(
            "0xABC",
            WalletPatch {
                patterns: Some(vec!["coinjoin".into()]),
                ..Default::default()
            },
        );
        graph.upsert_wallet(
            "0xABC",
            WalletPatch {
                patterns: Some(vec![]),
                ..Default::default()
            },
        );
        assert!(graph.wallet("0xabc").unwrap().patterns.is_empty());
    }

    #[test]
    fn edge_dedup_is_exact_triple() {
        let mut graph = WalletGraph::new();
        graph.ensure_wallet("0xAAA");
        graph.ensure_wallet("0xBBB");
        assert!(graph.add_edge("0xAAA", "0xBBB", "5"));
        assert!(!graph.add_edge("0xaaa", "0xbbb", "5"));
        // Reverse direction and different amount are distinct edges.
        assert!(graph.add_edge("0xBBB", "0xAAA", "5"));
        assert!(graph.add_edge("0xAAA", "0xBBB", "7"));
        assert_eq!(graph.list_edges().len(), 3);
    }

    #[test]
    fn edge_requires_tracked_endpoints() {
        let mut graph = WalletGraph::new();
        graph.ensure_wallet("0xAAA");
        assert!(!graph.add_edge("0xAAA", "0xBBB", "1"));
        assert!(graph.list_edges().is_empty());
        graph.ensure_wallet("0xBBB");
        assert!(graph.add_edge("0xAAA", "0xBBB", "1"));
        for edge in graph.list_edges() {
            assert!(graph.contains(&edge.from));
            assert!(graph.contains(&edge.to));
        }
    }

    #[test]
    fn self_edges_are_allowed_at_graph_level() {
        let mut graph = WalletGraph::new();
        graph.ensure_wallet("0xAAA");
        assert!(graph.add_edge("0xAAA", "0xaaa", "2"));
        assert!(!graph.add_edge("0xaaa", "0xAAA", "2"));
        assert_eq!(graph.list_edges().len(), 1);
        assert_eq!(graph.list_edges()[0].from, "0xaaa");
        assert_eq!(graph.list_edges()[0].to, "0xaaa");
    }

    #[test]
    fn clear_patterns_resets_every_wallet() {
        let mut graph = WalletGraph::new();
        for addr in ["0xAAA", "0xBBB"] {
            graph.upsert_wallet(
                addr,
                WalletPatch {
                    patterns: Some(vec!["peel-chain".into()]),
                    ..Default::default()
                },
            );
        }
        graph.clear_patterns();
        assert!(graph.list_wallets().iter().all(|w| w.patterns.is_empty()));
    }
}
