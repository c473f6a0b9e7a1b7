use std::{sync::Arc, time::Duration};

use chain_payment_engine::{adapters::ExplorerAdapter, CycleReport, Reconciler, SqliteDatabase};
use log::*;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::integrations::telegram::TelegramNotifier;

/// The reconciler the server runs: SQLite for the store and the callback queue, the public explorers for chain
/// data, and an optional Telegram bot for payment alerts.
pub type ServerReconciler = Reconciler<SqliteDatabase, ExplorerAdapter, SqliteDatabase, Option<TelegramNotifier>>;

/// Starts the reconciliation scheduler. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// A cycle that overruns the interval delays the next tick rather than causing a burst of catch-up cycles.
pub fn start_scan_worker(reconciler: Arc<ServerReconciler>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("🔄️ Reconciliation worker started. Scanning every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            trace!("🔄️ Running reconciliation cycle");
            match reconciler.run_cycle().await {
                Ok(report) => log_report(&report),
                Err(e) => error!("🔄️ Error running reconciliation cycle: {e}"),
            }
        }
    })
}

fn log_report(report: &CycleReport) {
    debug!(
        "🔄️ Cycle complete. {} addresses scanned, {} orders paid, {} failures",
        report.addresses_scanned,
        report.orders_paid.len(),
        report.failures.len()
    );
    for failure in &report.failures {
        debug!("🔄️ {}: {}", failure.address, failure.error);
    }
}
