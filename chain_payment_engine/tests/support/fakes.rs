use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use chain_payment_engine::{
    db_types::{CallbackJob, NewCallbackJob},
    traits::{CallbackQueue, ChainAdapter, EnqueueError, Notifier, NotifyError},
};
use chrono::{DateTime, Utc};
use cpg_common::{ChainFamily, RawAmount, Transfer, TransferValidity};
use explorer_tools::ExplorerError;

pub const TRON_ADDR: &str = "TQn9Y2khEsLJW1ChVWFMSMeRDow5KcbLSE";
pub const TRON_ADDR_2: &str = "TLa2f6VPqDgRE67v1736s7bJ8Ray5wYjU7";
pub const ETH_ADDR: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

/// An in-memory explorer. Transfers are served per address; addresses can be made to fail.
#[derive(Clone)]
pub struct FakeAdapter {
    family: ChainFamily,
    transfers: Arc<Mutex<HashMap<String, Vec<Transfer>>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    delay: Duration,
    pub fetches: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl FakeAdapter {
    pub fn new(family: ChainFamily) -> Self {
        Self {
            family,
            transfers: Arc::default(),
            failing: Arc::default(),
            delay: Duration::ZERO,
            fetches: Arc::default(),
            in_flight: Arc::default(),
            max_in_flight: Arc::default(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_transfers(&self, address: &str, transfers: Vec<Transfer>) {
        self.transfers.lock().unwrap().insert(address.to_string(), transfers);
    }

    pub fn fail_for(&self, address: &str) {
        self.failing.lock().unwrap().insert(address.to_string());
    }
}

impl ChainAdapter for FakeAdapter {
    fn family(&self) -> ChainFamily {
        self.family
    }

    async fn fetch_transfers(&self, address: &str) -> Result<Vec<Transfer>, ExplorerError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(address) {
            return Err(ExplorerError::HttpStatus { status: 503, message: "Service Unavailable".to_string() });
        }
        Ok(self.transfers.lock().unwrap().get(address).cloned().unwrap_or_default())
    }
}

/// Collects every message it is asked to send.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

impl Notifier for RecordingNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

/// A callback queue that is always unavailable. Counts the jobs it was offered.
#[derive(Clone, Default)]
pub struct UnavailableQueue {
    pub offered: Arc<AtomicUsize>,
}

impl CallbackQueue for UnavailableQueue {
    async fn enqueue_callback(&self, _job: NewCallbackJob) -> Result<CallbackJob, EnqueueError> {
        self.offered.fetch_add(1, Ordering::SeqCst);
        Err(EnqueueError("database is locked".to_string()))
    }
}

pub fn trc20_transfer(to: &str, raw: &str, tx_hash: &str, contract_ret: &str, observed_at: DateTime<Utc>) -> Transfer {
    Transfer {
        to_address: to.to_string(),
        amount: RawAmount::new(raw, 6),
        tx_hash: tx_hash.to_string(),
        observed_at,
        validity: TransferValidity::ContractResult(contract_ret.to_string()),
    }
}

pub fn erc20_transfer(to: &str, raw: &str, tx_hash: &str, confirmations: u64, observed_at: DateTime<Utc>) -> Transfer {
    Transfer {
        to_address: to.to_string(),
        amount: RawAmount::new(raw, 18),
        tx_hash: tx_hash.to_string(),
        observed_at,
        validity: TransferValidity::Confirmations(confirmations),
    }
}
