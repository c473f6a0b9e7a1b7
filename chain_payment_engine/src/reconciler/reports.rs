use crate::{db_types::TradeId, reconciler::ReconcileError, traits::EnqueueError};

/// What happened to a single transfer in the reconciliation pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Wrong recipient, failed contract call, or not enough confirmations yet.
    Rejected,
    /// No pending order expects this amount on this address.
    Unmatched,
    /// The transfer paid the order with this trade id.
    Paid(TradeId),
    /// The transfer paid the order, but its merchant callback could not be queued. The payment stands.
    PaidWithoutCallback(TradeId, EnqueueError),
    /// The matched order was no longer pending by the time it was updated.
    AlreadySettled(TradeId),
    /// The transaction has already paid another order.
    TransferAlreadyUsed(TradeId),
}

/// The result of scanning one monitored address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressScan {
    pub address: String,
    pub transfers_seen: usize,
    pub orders_paid: Vec<TradeId>,
    /// Paid orders whose callback could not be queued
    pub unqueued_callbacks: Vec<(TradeId, EnqueueError)>,
}

/// A failed address scan, or a paid order on that address whose callback could not be queued. The remaining
/// addresses of the cycle are unaffected.
#[derive(Debug, Clone)]
pub struct ScanFailure {
    pub address: String,
    pub error: ReconcileError,
}

/// The aggregate of one reconciliation cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// Number of enabled addresses that were scanned, whether or not the scan succeeded
    pub addresses_scanned: usize,
    pub orders_paid: Vec<TradeId>,
    pub failures: Vec<ScanFailure>,
}

impl CycleReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn record(&mut self, address: &str, scan: Result<AddressScan, ReconcileError>) {
        self.addresses_scanned += 1;
        match scan {
            Ok(scan) => {
                self.orders_paid.extend(scan.orders_paid);
                self.failures.extend(scan.unqueued_callbacks.into_iter().map(|(_, e)| ScanFailure {
                    address: address.to_string(),
                    error: ReconcileError::Enqueue(e),
                }));
            },
            Err(error) => self.failures.push(ScanFailure { address: address.to_string(), error }),
        }
    }
}
