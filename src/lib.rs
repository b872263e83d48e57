// src/lib.rs
//! Fund-flow tracing engine: an in-memory graph of wallets connected by
//! observed transfers, grown incrementally from per-wallet lookups and
//! optionally annotated with mixing-pattern labels from an external
//! detection service.

pub mod address;
pub mod enrichment;
pub mod error;
pub mod filter;
pub mod graph;
pub mod types;

use crate::enrichment::EnrichmentService;
use crate::error::{TraceError, TraceResult};
use crate::filter::{DirectionFilter, TransferEntry};
use crate::graph::WalletGraph;
use crate::types::{Edge, RiskLevel, TraceConfig, Transfer, Wallet, WalletPatch};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// What a graph-expansion action ended up committing.
#[derive(Debug, Clone, Default)]
pub struct ExpansionOutcome {
    /// Canonical addresses of wallets newly added by this action.
    pub added_wallets: Vec<String>,
    /// Whether the transfer edge was registered (false when it already
    /// existed or an endpoint could not be fetched).
    pub edge_added: bool,
}

/// Orchestrates graph growth: canonicalizes user input, runs enrichment
/// fetches, and folds results into the shared graph. Sole writer of the
/// wallet and edge collections; every other component reads snapshots.
#[derive(Clone)]
pub struct GraphController {
    config: TraceConfig,
    graph: Arc<RwLock<WalletGraph>>,
    enrichment: EnrichmentService,
    mixing_enabled: Arc<RwLock<bool>>,
    // Per-wallet fetch generation. A fetch result is applied only if no
    // newer fetch was dispatched for that wallet in the meantime.
    generations: Arc<RwLock<HashMap<String, u64>>>,
    // Bumped on every toggle. A detection sweep captures the value at
    // start and stops as soon as it changes, so a sweep outlives
    // neither a disable nor a newer sweep.
    toggle_epoch: Arc<AtomicU64>,
}

impl GraphController {
    /// Controller wired to the HTTP collaborators in `config`.
    pub fn new(config: TraceConfig) -> TraceResult<Self> {
        let enrichment = EnrichmentService::http(&config)?;
        Ok(Self::with_service(config, enrichment))
    }

    /// Controller over an explicit enrichment service. Used by tests to
    /// substitute collaborator mocks.
    pub fn with_service(config: TraceConfig, enrichment: EnrichmentService) -> Self {
        Self {
            config,
            graph: Arc::new(RwLock::new(WalletGraph::new())),
            enrichment,
            mixing_enabled: Arc::new(RwLock::new(false)),
            generations: Arc::new(RwLock::new(HashMap::new())),
            toggle_epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn mixing_enabled(&self) -> bool {
        *self.mixing_enabled.read().await
    }

    /// Look up a wallet and start tracking it. The entry point for the
    /// search flow; detection is never requested here, the overlay only
    /// comes from the mixing toggle.
    pub async fn search_wallet(&self, address: &str) -> TraceResult<Wallet> {
        let canonical = address::canonicalize(address);
        if canonical.is_empty() {
            return Err(TraceError::EmptyAddress);
        }
        let token = self.bump_generation(&canonical).await;
        let result = self.enrichment.fetch(&canonical, false).await?;
        let mut graph = self.graph.write().await;
        if self.is_current(&canonical, token).await {
            graph.upsert_wallet(&canonical, result.into_patch());
        }
        graph
            .wallet(&canonical)
            .cloned()
            .ok_or(TraceError::NotAssociated(canonical))
    }

    /// Extend the graph from a selected transfer. Endpoints not yet
    /// tracked are fetched with the mixing flag in effect at dispatch;
    /// each successful fetch commits independently. The edge is
    /// registered only when both endpoints are present afterwards, so a
    /// committed edge never references an absent wallet.
    pub async fn add_wallet_from_transfer(
        &self,
        from: &str,
        to: &str,
        amount: &str,
    ) -> TraceResult<ExpansionOutcome> {
        let from_c = address::canonicalize(from);
        let to_c = address::canonicalize(to);
        if from_c.is_empty() || to_c.is_empty() {
            return Err(TraceError::EmptyAddress);
        }
        let mixing = *self.mixing_enabled.read().await;

        let mut endpoints = vec![from_c.clone()];
        if to_c != from_c {
            endpoints.push(to_c.clone());
        }

        let mut added = Vec::new();
        let mut attempted = 0usize;
        let mut last_error = None;
        for endpoint in endpoints {
            if self.graph.read().await.contains(&endpoint) {
                continue;
            }
            attempted += 1;
            let token = self.bump_generation(&endpoint).await;
            match self.enrichment.fetch(&endpoint, mixing).await {
                Ok(result) => {
                    if self.commit_if_current(&endpoint, token, result.into_patch()).await {
                        added.push(endpoint);
                    } else {
                        debug!(address = %endpoint, "discarding stale fetch result");
                    }
                }
                Err(e) => {
                    warn!(
                        address = %endpoint,
                        category = e.category(),
                        error = %e,
                        "endpoint fetch failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        // Every fetch failed: nothing was committed and the action
        // reports failure. Zero attempts (both endpoints were already
        // tracked) is a success that may still add the edge.
        if attempted > 0 && added.is_empty() {
            return Err(last_error.unwrap_or(TraceError::ExpansionFailed {
                from: from_c,
                to: to_c,
            }));
        }

        let mut graph = self.graph.write().await;
        let edge_added = graph.contains(&from_c)
            && graph.contains(&to_c)
            && graph.add_edge(&from_c, &to_c, amount);
        if edge_added {
            info!(from = %from_c, to = %to_c, %amount, "edge committed");
        }
        Ok(ExpansionOutcome {
            added_wallets: added,
            edge_added,
        })
    }

    /// The sidebar "+" flow: resolve which side of the selected transfer
    /// is the counterparty, reject same-wallet additions, then extend
    /// the graph along the transfer.
    pub async fn add_from_selection(
        &self,
        wallet: &str,
        transfer: &Transfer,
    ) -> TraceResult<ExpansionOutcome> {
        let counterparty = filter::resolve_counterparty(wallet, transfer)?;
        if address::equals(&counterparty, wallet) {
            return Err(TraceError::AmbiguousSelection);
        }
        self.add_wallet_from_transfer(&transfer.sender, &transfer.receiver, &transfer.amount)
            .await
    }

    /// Switch the mixing-detection overlay. Enabling re-fetches every
    /// tracked wallet sequentially with detection on, pausing between
    /// wallets to respect the detection collaborator's rate
    /// sensitivity; a wallet whose fetch fails keeps its previous data,
    /// and the sweep stops early if the toggle changes again while it
    /// runs. Disabling clears patterns locally with no network call;
    /// re-enabling later fetches fresh results rather than restoring a
    /// cache.
    pub async fn toggle_mixing_detection(&self, enabled: bool) -> TraceResult<()> {
        *self.mixing_enabled.write().await = enabled;

        if enabled {
            let sweep_epoch = self.toggle_epoch.fetch_add(1, Ordering::SeqCst) + 1;
            let addresses = self.graph.read().await.addresses();
            info!(wallets = addresses.len(), "mixing detection enabled, sweeping tracked wallets");
            for addr in addresses {
                // A toggle since the sweep started makes this sweep
                // obsolete; stop before dispatching another fetch.
                if self.toggle_epoch.load(Ordering::SeqCst) != sweep_epoch {
                    info!("mixing detection toggled during sweep, aborting");
                    break;
                }
                let token = self.bump_generation(&addr).await;
                match self.enrichment.fetch(&addr, true).await {
                    Ok(result) => {
                        if !self
                            .commit_sweep_result(&addr, token, sweep_epoch, result.into_patch())
                            .await
                        {
                            debug!(address = %addr, "discarding stale sweep result");
                        }
                    }
                    Err(e) => {
                        warn!(address = %addr, error = %e, "sweep fetch failed, keeping previous data");
                    }
                }
                tokio::time::sleep(self.config.detection_pacing).await;
            }
        } else {
            // Epoch and generation bumps happen under the graph write
            // lock so no in-flight result can commit between the
            // invalidation and the local reset.
            let mut graph = self.graph.write().await;
            self.toggle_epoch.fetch_add(1, Ordering::SeqCst);
            {
                let mut generations = self.generations.write().await;
                for generation in generations.values_mut() {
                    *generation += 1;
                }
            }
            graph.clear_patterns();
            info!("mixing detection disabled, patterns cleared locally");
        }
        Ok(())
    }

    /// Tracked wallets, insertion order, cloned out as a snapshot.
    pub async fn wallets(&self) -> Vec<Wallet> {
        self.graph
            .read()
            .await
            .list_wallets()
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn edges(&self) -> Vec<Edge> {
        self.graph.read().await.list_edges().to_vec()
    }

    pub async fn wallet(&self, address: &str) -> Option<Wallet> {
        self.graph.read().await.wallet(address).cloned()
    }

    /// The filtered, sorted transfer list for one wallet's detail view.
    /// An unknown wallet yields an empty list.
    pub async fn transfers_for(
        &self,
        address: &str,
        keyword: &str,
        direction: DirectionFilter,
    ) -> Vec<TransferEntry> {
        let graph = self.graph.read().await;
        let Some(wallet) = graph.wallet(address) else {
            return Vec::new();
        };
        let entries = filter::relevant_transfers(&wallet.address, &wallet.transactions);
        filter::apply_filter(&entries, &wallet.address, keyword, direction)
    }

    /// Current risk tier for a wallet, from its pattern count.
    pub async fn wallet_risk(&self, address: &str) -> RiskLevel {
        let count = self
            .graph
            .read()
            .await
            .wallet(address)
            .map(|w| w.pattern_count())
            .unwrap_or(0);
        filter::risk_level(count)
    }

    /// Commit a fetch result only if it is still the newest fetch
    /// dispatched for the wallet. The check runs under the graph write
    /// lock, so a concurrent toggle cannot invalidate the result
    /// between check and commit.
    async fn commit_if_current(&self, address: &str, token: u64, patch: WalletPatch) -> bool {
        let mut graph = self.graph.write().await;
        if !self.is_current(address, token).await {
            return false;
        }
        graph.upsert_wallet(address, patch);
        true
    }

    /// Commit a sweep result: same as [`Self::commit_if_current`], but
    /// additionally requires that no toggle happened since the sweep
    /// started.
    async fn commit_sweep_result(
        &self,
        address: &str,
        token: u64,
        sweep_epoch: u64,
        patch: WalletPatch,
    ) -> bool {
        let mut graph = self.graph.write().await;
        if self.toggle_epoch.load(Ordering::SeqCst) != sweep_epoch {
            return false;
        }
        if !self.is_current(address, token).await {
            return false;
        }
        graph.upsert_wallet(address, patch);
        true
    }

    async fn bump_generation(&self, address: &str) -> u64 {
        let mut generations = self.generations.write().await;
        let generation = generations.entry(address.to_string()).or_insert(0);
        *generation += 1;
        *generation
    }

    async fn is_current(&self, address: &str, token: u64) -> bool {
        self.generations.read().await.get(address).copied() == Some(token)
    }
}
