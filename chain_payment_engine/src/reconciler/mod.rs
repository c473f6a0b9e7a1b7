//! # Reconciliation orchestrator
//!
//! A [`Reconciler`] runs reconciliation cycles. Each cycle
//! 1. loads the enabled monitored addresses,
//! 2. scans every address concurrently, one worker per address, and
//! 3. collects the per-address results into a [`CycleReport`].
//!
//! Each worker fetches the recent transfers for its address and pushes them, one at a time, through the pipeline:
//! acceptance check, amount normalisation, order matching, causality check and finally the atomic `Pending` to
//! `Paid` transition. A successful transition queues the merchant callback and sends a payment alert. A callback that
//! cannot be queued does not undo the payment; it is reported as a failure of the address in the [`CycleReport`].
//!
//! An error ends the scan of that address only. Sibling workers always run to completion.
//!
//! Cycles on the same reconciler never overlap: a second caller waits on the cycle gate until the running cycle has
//! finished. Separate reconciler instances do not share a gate.
mod errors;
mod reports;

use cpg_common::{ChainFamily, Transfer};
pub use errors::ReconcileError;
use futures_util::future::join_all;
use log::*;
pub use reports::{AddressScan, CycleReport, ScanFailure, TransferOutcome};
use tokio::sync::Mutex;

use crate::{
    callbacks::CallbackDispatcher,
    db_types::MonitoredAddress,
    matcher::find_pending_order,
    notifier::notify_paid,
    traits::{CallbackQueue, ChainAdapter, MarkPaidResult, Notifier, ReconciliationDatabase},
    validator::check_causality,
};

pub struct Reconciler<B, A, Q, N> {
    db: B,
    adapters: Vec<A>,
    dispatcher: CallbackDispatcher<Q>,
    notifier: N,
    cycle_gate: Mutex<()>,
}

impl<B, A, Q, N> Reconciler<B, A, Q, N>
where
    B: ReconciliationDatabase,
    A: ChainAdapter,
    Q: CallbackQueue,
    N: Notifier,
{
    /// Creates a new reconciler. `adapters` should hold one adapter per chain family. Addresses on a chain family
    /// without an adapter fail with [`ReconcileError::UnsupportedChain`].
    pub fn new(db: B, adapters: Vec<A>, queue: Q, notifier: N) -> Self {
        Self { db, adapters, dispatcher: CallbackDispatcher::new(queue), notifier, cycle_gate: Mutex::new(()) }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Runs one reconciliation cycle over every enabled monitored address.
    ///
    /// Only a failure to load the address list fails the whole cycle. Per-address failures are logged and reported in
    /// [`CycleReport::failures`].
    pub async fn run_cycle(&self) -> Result<CycleReport, ReconcileError> {
        let _gate = self.cycle_gate.lock().await;
        let addresses =
            self.db.fetch_enabled_addresses().await.map_err(|e| ReconcileError::AddressLookup(e.to_string()))?;
        let mut report = CycleReport::default();
        if addresses.is_empty() {
            trace!("🔄️ No monitored addresses are enabled. Nothing to do.");
            return Ok(report);
        }
        debug!("🔄️ Scanning {} monitored addresses", addresses.len());
        let scans = join_all(addresses.iter().map(|a| self.scan_address(a))).await;
        for (address, scan) in addresses.iter().zip(scans) {
            if let Err(e) = &scan {
                error!("🔄️ Scan of {} address {} failed. {e}", address.chain_family, address.address);
            }
            report.record(&address.address, scan);
        }
        if !report.orders_paid.is_empty() {
            info!("🔄️ {} orders were paid in this cycle", report.orders_paid.len());
        }
        Ok(report)
    }

    /// Fetches the recent transfers for `address` and processes each of them. Stops at the first error.
    pub async fn scan_address(&self, address: &MonitoredAddress) -> Result<AddressScan, ReconcileError> {
        let adapter = self.adapter_for(address.chain_family)?;
        let transfers = adapter.fetch_transfers(&address.address).await?;
        trace!("🔄️ {} transfers found for {}", transfers.len(), address.address);
        let mut scan =
            AddressScan { address: address.address.clone(), transfers_seen: transfers.len(), ..Default::default() };
        for transfer in &transfers {
            match self.run_pipeline(adapter, address, transfer).await? {
                TransferOutcome::Paid(trade_id) => scan.orders_paid.push(trade_id),
                TransferOutcome::PaidWithoutCallback(trade_id, e) => {
                    scan.orders_paid.push(trade_id.clone());
                    scan.unqueued_callbacks.push((trade_id, e));
                },
                _ => {},
            }
        }
        Ok(scan)
    }

    /// Pushes a single transfer observed on `address` through the reconciliation pipeline.
    pub async fn process_transfer(
        &self,
        address: &MonitoredAddress,
        transfer: &Transfer,
    ) -> Result<TransferOutcome, ReconcileError> {
        let adapter = self.adapter_for(address.chain_family)?;
        self.run_pipeline(adapter, address, transfer).await
    }

    fn adapter_for(&self, family: ChainFamily) -> Result<&A, ReconcileError> {
        self.adapters.iter().find(|a| a.family() == family).ok_or(ReconcileError::UnsupportedChain(family))
    }

    async fn run_pipeline(
        &self,
        adapter: &A,
        address: &MonitoredAddress,
        transfer: &Transfer,
    ) -> Result<TransferOutcome, ReconcileError> {
        if !adapter.is_acceptable(transfer, address) {
            return Ok(TransferOutcome::Rejected);
        }
        let amount = adapter.normalize_amount(transfer)?;
        let order = match find_pending_order(&self.db, &address.address, &amount).await? {
            Some(order) => order,
            None => return Ok(TransferOutcome::Unmatched),
        };
        check_causality(transfer, &order)?;
        let result = self
            .db
            .mark_order_paid(&order.trade_id, &transfer.tx_hash)
            .await
            .map_err(|e| ReconcileError::StateTransition(e.to_string()))?;
        match result {
            MarkPaidResult::Paid(order) => {
                info!("🔄️ Order [{}] paid by {} transfer {}", order.trade_id, adapter.family(), transfer.tx_hash);
                let queued = self.dispatcher.submit_with_budget(&order, adapter.family(), adapter.retry_budget()).await;
                notify_paid(&self.notifier, &order).await;
                match queued {
                    Ok(_) => Ok(TransferOutcome::Paid(order.trade_id)),
                    Err(e) => {
                        error!("🔄️ Order [{}] is paid, but its callback was not queued. {e}", order.trade_id);
                        Ok(TransferOutcome::PaidWithoutCallback(order.trade_id, e))
                    },
                }
            },
            MarkPaidResult::NotPending(status) => {
                info!("🔄️ Order [{}] is already {status}. Transfer {} is skipped.", order.trade_id, transfer.tx_hash);
                Ok(TransferOutcome::AlreadySettled(order.trade_id))
            },
            MarkPaidResult::TransferAlreadyClaimed(other) => {
                warn!(
                    "🔄️ Transfer {} matches order [{}] but has already paid order [{other}]. Skipping it.",
                    transfer.tx_hash, order.trade_id
                );
                Ok(TransferOutcome::TransferAlreadyUsed(other))
            },
        }
    }
}
