use cpg_common::Transfer;
use log::*;

use crate::{Erc20Response, EtherscanConfig, ExplorerClient, ExplorerConfig, ExplorerError};

pub const ERC20_PAGE_SIZE: u32 = 100;

/// Client for Etherscan's ERC-20 token transfer listing (`module=account&action=tokentx`).
#[derive(Clone)]
pub struct EtherscanApi {
    config: EtherscanConfig,
    client: ExplorerClient,
}

impl EtherscanApi {
    pub fn new(config: &ExplorerConfig) -> Result<Self, ExplorerError> {
        let client = ExplorerClient::new(config.timeout)?;
        Ok(Self::with_client(config.etherscan.clone(), client))
    }

    pub fn with_client(config: EtherscanConfig, client: ExplorerClient) -> Self {
        Self { config, client }
    }

    pub fn url(&self) -> String {
        format!("{}/api", self.config.base_url.trim_end_matches('/'))
    }

    /// Lists the most recent [`ERC20_PAGE_SIZE`] transfers of the configured token involving `address`, newest first.
    /// There is no time window; the page is simply the latest one.
    ///
    /// Etherscan signals "no transfers" with `status: "0"` and the message "No transactions found", which yields an
    /// empty list. Any other `status: "0"` response (bad API key, rate limiting) is reported as a transport error.
    pub async fn fetch_recent_transfers(&self, address: &str) -> Result<Vec<Transfer>, ExplorerError> {
        let offset = ERC20_PAGE_SIZE.to_string();
        let params = [
            ("module", "account"),
            ("action", "tokentx"),
            ("sort", "desc"),
            ("offset", offset.as_str()),
            ("startblock", "0"),
            ("endblock", "99999999"),
            ("page", "1"),
            ("contractaddress", self.config.contract_address.as_str()),
            ("address", address),
            ("apikey", self.config.api_key.reveal().as_str()),
        ];
        let response = self.client.get_json::<Erc20Response>(&self.url(), &params).await?;
        if !response.is_ok() {
            if response.is_empty_result() {
                trace!("🔎️ Etherscan reports no transfers for {address}");
                return Ok(Vec::new());
            }
            let message = format!("Etherscan rejected the query: {} ({})", response.message, response.result);
            warn!("🔎️ {message}");
            return Err(ExplorerError::Transport(message));
        }
        let transfers = response.transfers()?;
        debug!("🔎️ Etherscan returned {} transfers for {address}", transfers.len());
        transfers.into_iter().map(|t| t.into_transfer()).collect()
    }
}
