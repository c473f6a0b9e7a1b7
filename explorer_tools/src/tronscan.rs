use chrono::{Duration, Utc};
use cpg_common::Transfer;
use log::*;

use crate::{ExplorerClient, ExplorerConfig, ExplorerError, Trc20Response, TronScanConfig};

/// Exponent of TRC-20 USDT amounts
pub const TRC20_DECIMALS: u32 = 6;
pub const TRC20_PAGE_SIZE: u32 = 50;
pub const TRC20_LOOKBACK_HOURS: i64 = 24;

/// Client for TronScan's TRC-20 transfer listing.
#[derive(Clone)]
pub struct TronScanApi {
    config: TronScanConfig,
    client: ExplorerClient,
}

impl TronScanApi {
    pub fn new(config: &ExplorerConfig) -> Result<Self, ExplorerError> {
        let client = ExplorerClient::new(config.timeout)?;
        Ok(Self::with_client(config.tronscan.clone(), client))
    }

    pub fn with_client(config: TronScanConfig, client: ExplorerClient) -> Self {
        Self { config, client }
    }

    pub fn url(&self) -> String {
        format!("{}/api/transfer/trc20", self.config.base_url.trim_end_matches('/'))
    }

    /// Lists incoming transfers of the configured TRC-20 token to `address` over the last
    /// [`TRC20_LOOKBACK_HOURS`] hours, newest first, at most [`TRC20_PAGE_SIZE`] records.
    ///
    /// A response with a non-positive `page_size` means there is nothing to report and yields an empty list.
    pub async fn fetch_recent_transfers(&self, address: &str) -> Result<Vec<Transfer>, ExplorerError> {
        let now = Utc::now();
        let start = (now - Duration::hours(TRC20_LOOKBACK_HOURS)).timestamp_millis().to_string();
        let end = now.timestamp_millis().to_string();
        let limit = TRC20_PAGE_SIZE.to_string();
        let params = [
            ("sort", "-timestamp"),
            ("limit", limit.as_str()),
            ("start", "0"),
            ("direction", "2"),
            ("db_version", "1"),
            ("trc20Id", self.config.trc20_id.as_str()),
            ("address", address),
            ("start_timestamp", start.as_str()),
            ("end_timestamp", end.as_str()),
        ];
        let response = self.client.get_json::<Trc20Response>(&self.url(), &params).await?;
        if response.page_size <= 0 {
            trace!("🔎️ TronScan reports no transfers for {address}");
            return Ok(Vec::new());
        }
        debug!("🔎️ TronScan returned {} transfers for {address}", response.data.len());
        response.data.into_iter().map(|t| t.into_transfer(TRC20_DECIMALS)).collect()
    }
}
