use std::{env, fmt::Display, time::Duration};

use cpg_common::{
    helpers::{parse_boolean_flag, parse_seconds},
    Secret,
};
use log::*;

const TRONSCAN_MAINNET_URL: &str = "https://apilist.tronscanapi.com";
const TRONSCAN_TESTNET_URL: &str = "https://nileapi.tronscan.org";
const TRC20_USDT_MAINNET: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";
const TRC20_USDT_TESTNET: &str = "TXLAQ63Xg1NAzckPwKHvzw7CSEmLMEqcdj";

const ETHERSCAN_MAINNET_URL: &str = "https://api.etherscan.io";
const ETHERSCAN_TESTNET_URL: &str = "https://api-sepolia.etherscan.io";
const ERC20_USDT_MAINNET: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";
const ERC20_USDT_TESTNET: &str = "0x326c977e6efc84e512bb9c30f76e30c160ed06fb";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Selects production or test network endpoints and token identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkMode {
    #[default]
    Mainnet,
    Testnet,
}

impl Display for NetworkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mainnet => write!(f, "mainnet"),
            Self::Testnet => write!(f, "testnet"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TronScanConfig {
    /// e.g. "https://apilist.tronscanapi.com". The `/api/transfer/trc20` path is appended.
    pub base_url: String,
    /// The TRC-20 token contract whose transfers are listed.
    pub trc20_id: String,
}

#[derive(Debug, Clone)]
pub struct EtherscanConfig {
    /// e.g. "https://api.etherscan.io". The `/api` path is appended.
    pub base_url: String,
    /// The ERC-20 token contract whose transfers are listed.
    pub contract_address: String,
    pub api_key: Secret<String>,
}

#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    pub network: NetworkMode,
    pub tronscan: TronScanConfig,
    pub etherscan: EtherscanConfig,
    /// Applies to every explorer request. A request that exceeds it fails with a transport error.
    pub timeout: Duration,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self::for_network(NetworkMode::Mainnet)
    }
}

impl ExplorerConfig {
    /// The stock endpoints and USDT contracts for the given network. The Etherscan API key is left empty.
    pub fn for_network(network: NetworkMode) -> Self {
        let (tron_url, trc20_id, eth_url, contract) = match network {
            NetworkMode::Mainnet => {
                (TRONSCAN_MAINNET_URL, TRC20_USDT_MAINNET, ETHERSCAN_MAINNET_URL, ERC20_USDT_MAINNET)
            },
            NetworkMode::Testnet => {
                (TRONSCAN_TESTNET_URL, TRC20_USDT_TESTNET, ETHERSCAN_TESTNET_URL, ERC20_USDT_TESTNET)
            },
        };
        Self {
            network,
            tronscan: TronScanConfig { base_url: tron_url.to_string(), trc20_id: trc20_id.to_string() },
            etherscan: EtherscanConfig {
                base_url: eth_url.to_string(),
                contract_address: contract.to_string(),
                api_key: Secret::default(),
            },
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    pub fn new_from_env_or_default() -> Self {
        let use_testnet = parse_boolean_flag(env::var("CPG_USE_TESTNET").ok(), false);
        let network = if use_testnet { NetworkMode::Testnet } else { NetworkMode::Mainnet };
        let mut config = Self::for_network(network);
        info!("🪛️ Explorer clients are configured for {network}");
        if let Ok(url) = env::var("CPG_TRONSCAN_API_URL") {
            info!("🪛️ Using TronScan API at {url}");
            config.tronscan.base_url = url;
        }
        if let Ok(url) = env::var("CPG_ETHERSCAN_API_URL") {
            info!("🪛️ Using Etherscan API at {url}");
            config.etherscan.base_url = url;
        }
        config.etherscan.api_key = Secret::new(env::var("CPG_ETHERSCAN_API_KEY").unwrap_or_else(|_| {
            warn!("🪛️ CPG_ETHERSCAN_API_KEY is not set. Etherscan will heavily rate-limit anonymous requests.");
            String::default()
        }));
        config.timeout = match env::var("CPG_HTTP_TIMEOUT") {
            Ok(s) => parse_seconds(&s).unwrap_or_else(|| {
                warn!(
                    "🪛️ Invalid value for CPG_HTTP_TIMEOUT: {s}. Using the default of {}s.",
                    DEFAULT_HTTP_TIMEOUT.as_secs()
                );
                DEFAULT_HTTP_TIMEOUT
            }),
            Err(_) => DEFAULT_HTTP_TIMEOUT,
        };
        config
    }

    /// Replaces both base URLs. Handy for pointing the clients at a mock server.
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.tronscan.base_url = url.to_string();
        self.etherscan.base_url = url.to_string();
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn network_mode_swaps_urls_and_tokens() {
        let main = ExplorerConfig::for_network(NetworkMode::Mainnet);
        let test = ExplorerConfig::for_network(NetworkMode::Testnet);
        assert_eq!(main.tronscan.trc20_id, TRC20_USDT_MAINNET);
        assert_eq!(test.tronscan.trc20_id, TRC20_USDT_TESTNET);
        assert_eq!(main.etherscan.contract_address, ERC20_USDT_MAINNET);
        assert_eq!(test.etherscan.contract_address, ERC20_USDT_TESTNET);
        assert_ne!(main.tronscan.base_url, test.tronscan.base_url);
        assert_ne!(main.etherscan.base_url, test.etherscan.base_url);
    }

    #[test]
    fn base_url_override() {
        let config = ExplorerConfig::default().with_base_url("http://127.0.0.1:9999");
        assert_eq!(config.tronscan.base_url, "http://127.0.0.1:9999");
        assert_eq!(config.etherscan.base_url, "http://127.0.0.1:9999");
        assert_eq!(config.tronscan.trc20_id, TRC20_USDT_MAINNET);
    }
}
