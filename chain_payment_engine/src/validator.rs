//! Legitimacy checks applied to a transfer before it may pay an order.
use chrono::{DateTime, Utc};
use cpg_common::{ChainFamily, Transfer, TransferValidity};
use log::trace;
use thiserror::Error;

use crate::db_types::{MonitoredAddress, Order, TradeId};

/// The contract result TronScan reports for a successful TRC-20 transfer.
pub const TRC20_SUCCESS: &str = "SUCCESS";
/// The number of blocks that must be mined on top of an ERC-20 transfer before it is accepted.
pub const MIN_ERC20_CONFIRMATIONS: u64 = 12;

/// A transfer that appears to pay an order was observed on-chain before the order existed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Transfer {tx_hash} was observed at {observed_at}, before order [{trade_id}] was created at {created_at}"
)]
pub struct CausalityViolation {
    pub trade_id: TradeId,
    pub tx_hash: String,
    pub observed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Decides whether `transfer` may be matched against orders on the monitored `address`.
///
/// * The recipient must be the monitored address (case-insensitive for hex addresses).
/// * Tron transfers must carry the `SUCCESS` contract result.
/// * Ethereum transfers need at least [`MIN_ERC20_CONFIRMATIONS`] confirmations.
///
/// A validity signal that does not belong to `family` is never acceptable.
pub fn is_acceptable(family: ChainFamily, transfer: &Transfer, address: &MonitoredAddress) -> bool {
    if !family.same_address(&transfer.to_address, &address.address) {
        trace!("🔄️ Transfer {} is addressed to {}, not to {}", transfer.tx_hash, transfer.to_address, address.address);
        return false;
    }
    match (family, &transfer.validity) {
        (ChainFamily::Tron, TransferValidity::ContractResult(result)) => result == TRC20_SUCCESS,
        (ChainFamily::Ethereum, TransferValidity::Confirmations(n)) => *n >= MIN_ERC20_CONFIRMATIONS,
        _ => false,
    }
}

/// A transfer can only pay for an order that already existed when the transfer was made.
///
/// Both timestamps are compared at millisecond resolution, which is the finest resolution any explorer reports.
pub fn check_causality(transfer: &Transfer, order: &Order) -> Result<(), CausalityViolation> {
    if transfer.observed_at.timestamp_millis() < order.created_at.timestamp_millis() {
        return Err(CausalityViolation {
            trade_id: order.trade_id.clone(),
            tx_hash: transfer.tx_hash.clone(),
            observed_at: transfer.observed_at,
            created_at: order.created_at,
        });
    }
    Ok(())
}
