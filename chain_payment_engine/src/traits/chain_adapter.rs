use cpg_common::{Amount, ChainFamily, MalformedAmountError, Transfer};
use explorer_tools::ExplorerError;

use crate::{db_types::MonitoredAddress, validator};

/// The per-chain capability the reconciler needs: fetching recent transfers for an address and the chain-specific
/// rules that apply to them.
///
/// Only [`ChainAdapter::family`] and [`ChainAdapter::fetch_transfers`] need to be provided. The remaining methods have
/// defaults that apply the rules of the adapter's chain family.
#[allow(async_fn_in_trait)]
pub trait ChainAdapter {
    fn family(&self) -> ChainFamily;

    /// Fetches the recent incoming token transfers for `address`, newest first.
    async fn fetch_transfers(&self, address: &str) -> Result<Vec<Transfer>, ExplorerError>;

    fn normalize_amount(&self, transfer: &Transfer) -> Result<Amount, MalformedAmountError> {
        transfer.amount.normalize()
    }

    /// Whether `transfer` may be considered for matching against orders on `address`.
    fn is_acceptable(&self, transfer: &Transfer, address: &MonitoredAddress) -> bool {
        validator::is_acceptable(self.family(), transfer, address)
    }

    /// The number of callback delivery retries for orders paid on this chain.
    fn retry_budget(&self) -> u32 {
        self.family().retry_budget()
    }
}
