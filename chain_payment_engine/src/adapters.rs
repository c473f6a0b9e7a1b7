//! [`ChainAdapter`] implementations backed by the public block explorers.
use cpg_common::{ChainFamily, Transfer};
use explorer_tools::{EtherscanApi, ExplorerConfig, ExplorerError, TronScanApi};

use crate::traits::ChainAdapter;

/// A chain adapter for one of the supported chain families.
#[derive(Clone)]
pub enum ExplorerAdapter {
    Tron(TronScanApi),
    Ethereum(EtherscanApi),
}

impl ExplorerAdapter {
    /// Builds an adapter for `family` using the explorer settings in `config`.
    pub fn new(family: ChainFamily, config: &ExplorerConfig) -> Result<Self, ExplorerError> {
        match family {
            ChainFamily::Tron => Ok(Self::Tron(TronScanApi::new(config)?)),
            ChainFamily::Ethereum => Ok(Self::Ethereum(EtherscanApi::new(config)?)),
        }
    }

    /// One adapter per supported chain family.
    pub fn all(config: &ExplorerConfig) -> Result<Vec<Self>, ExplorerError> {
        [ChainFamily::Tron, ChainFamily::Ethereum].into_iter().map(|f| Self::new(f, config)).collect()
    }
}

impl ChainAdapter for ExplorerAdapter {
    fn family(&self) -> ChainFamily {
        match self {
            Self::Tron(_) => ChainFamily::Tron,
            Self::Ethereum(_) => ChainFamily::Ethereum,
        }
    }

    async fn fetch_transfers(&self, address: &str) -> Result<Vec<Transfer>, ExplorerError> {
        match self {
            Self::Tron(api) => api.fetch_recent_transfers(address).await,
            Self::Ethereum(api) => api.fetch_recent_transfers(address).await,
        }
    }
}
