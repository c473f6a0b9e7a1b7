//! # Explorer tools
//!
//! Thin HTTP clients for the two block explorer backends the payment gateway watches:
//!
//! * [`TronScanApi`] lists TRC-20 transfers to a Tron address over the last 24 hours.
//! * [`EtherscanApi`] lists the most recent ERC-20 transfers to an Ethereum address.
//!
//! Both clients return [`cpg_common::Transfer`] records. Amounts are left in their raw, chain-native form so that the
//! caller decides when (and whether) to normalize them.
mod client;
mod config;
mod data_objects;
mod error;
mod etherscan;
pub mod helpers;
mod tronscan;

pub use client::ExplorerClient;
pub use config::{EtherscanConfig, ExplorerConfig, NetworkMode, TronScanConfig};
pub use data_objects::{Erc20Response, Erc20Transfer, Trc20Response, Trc20Transfer};
pub use error::ExplorerError;
pub use etherscan::{EtherscanApi, ERC20_PAGE_SIZE};
pub use tronscan::{TronScanApi, TRC20_DECIMALS, TRC20_LOOKBACK_HOURS, TRC20_PAGE_SIZE};
