// src/filter.rs
//! Transfer list derivation for the wallet detail view: flatten a
//! wallet's transaction history into the transfers that involve it,
//! filter by keyword/direction, and classify risk. Everything here is
//! pure; the list is re-derived whenever its inputs change.

use crate::address;
use crate::error::TraceError;
use crate::types::{RiskLevel, Transaction, Transfer};
use chrono::{DateTime, Utc};

/// One row in the transfer list: the transfer plus the transaction it
/// came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEntry {
    pub transaction_id: String,
    pub timestamp: DateTime<Utc>,
    pub transfer: Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectionFilter {
    #[default]
    All,
    /// Wallet is the receiver.
    In,
    /// Wallet is the sender.
    Out,
}

/// Flatten `transactions` into the transfers involving `wallet`,
/// excluding self-transfers, newest first. The sort is stable, so
/// transfers sharing a timestamp keep their original transaction
/// order.
pub fn relevant_transfers(wallet: &str, transactions: &[Transaction]) -> Vec<TransferEntry> {
    let key = address::canonicalize(wallet);
    let mut entries = Vec::new();
    for tx in transactions {
        for transfer in &tx.transfers {
            let sender = address::canonicalize(&transfer.sender);
            let receiver = address::canonicalize(&transfer.receiver);
            if sender != key && receiver != key {
                continue;
            }
            if sender == receiver {
                continue;
            }
            entries.push(TransferEntry {
                transaction_id: tx.id.clone(),
                timestamp: tx.timestamp,
                transfer: transfer.clone(),
            });
        }
    }
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries
}

/// Apply the keyword and direction filters to an already-derived
/// transfer list. Keyword is a case-insensitive substring match on the
/// transaction id, sender, and receiver; direction is relative to
/// `wallet`. The two compose as an AND; the input is never mutated.
pub fn apply_filter(
    entries: &[TransferEntry],
    wallet: &str,
    keyword: &str,
    direction: DirectionFilter,
) -> Vec<TransferEntry> {
    let key = address::canonicalize(wallet);
    let query = keyword.trim().to_lowercase();
    entries
        .iter()
        .filter(|entry| {
            if !query.is_empty() {
                let matches = entry.transaction_id.to_lowercase().contains(&query)
                    || entry.transfer.sender.to_lowercase().contains(&query)
                    || entry.transfer.receiver.to_lowercase().contains(&query);
                if !matches {
                    return false;
                }
            }
            match direction {
                DirectionFilter::All => true,
                DirectionFilter::In => address::canonicalize(&entry.transfer.receiver) == key,
                DirectionFilter::Out => address::canonicalize(&entry.transfer.sender) == key,
            }
        })
        .cloned()
        .collect()
}

/// Risk tier from the number of detected mixing patterns. Recomputed on
/// demand, never cached.
pub fn risk_level(pattern_count: usize) -> RiskLevel {
    match pattern_count {
        0 => RiskLevel::None,
        1 => RiskLevel::Low,
        2..=3 => RiskLevel::Medium,
        _ => RiskLevel::High,
    }
}

/// The other endpoint of a transfer, relative to `wallet`. Errors when
/// the wallet is on both sides or on neither, in which case the caller
/// surfaces the rejection without touching graph state.
pub fn resolve_counterparty(wallet: &str, transfer: &Transfer) -> Result<String, TraceError> {
    let is_sender = address::equals(&transfer.sender, wallet);
    let is_receiver = address::equals(&transfer.receiver, wallet);
    match (is_sender, is_receiver) {
        (true, false) => Ok(address::canonicalize(&transfer.receiver)),
        (false, true) => Ok(address::canonicalize(&transfer.sender)),
        _ => Err(TraceError::AmbiguousSelection),
    }
}
