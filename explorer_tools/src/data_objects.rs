use cpg_common::{RawAmount, Transfer, TransferValidity};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    helpers::{number_or_string, string_or_number, timestamp_from_millis, timestamp_from_secs},
    ExplorerError,
};

//--------------------------------------       TronScan        ---------------------------------------------------------
/// Response body of TronScan's `/api/transfer/trc20` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trc20Response {
    #[serde(default)]
    pub page_size: i64,
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub data: Vec<Trc20Transfer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trc20Transfer {
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
    /// Block time in milliseconds since the epoch
    pub block_timestamp: i64,
    #[serde(default)]
    pub from: String,
    pub to: String,
    pub hash: String,
    #[serde(default)]
    pub contract_ret: String,
    #[serde(default)]
    pub block: i64,
}

impl Trc20Transfer {
    /// TRC-20 USDT amounts carry a fixed exponent, so the raw amount is tagged with `decimals` here rather than
    /// read from the record.
    pub fn into_transfer(self, decimals: u32) -> Result<Transfer, ExplorerError> {
        let observed_at = timestamp_from_millis(self.block_timestamp)?;
        Ok(Transfer {
            to_address: self.to,
            amount: RawAmount::new(self.amount, decimals),
            tx_hash: self.hash,
            observed_at,
            validity: TransferValidity::ContractResult(self.contract_ret),
        })
    }
}

//--------------------------------------       Etherscan       ---------------------------------------------------------
/// Response body of Etherscan's `module=account&action=tokentx` query.
///
/// When `status` is `"0"`, `result` is a plain string (e.g. "Max rate limit reached") rather than a list, so it is
/// decoded lazily.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Erc20Response {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Value,
}

impl Erc20Response {
    pub fn is_ok(&self) -> bool {
        self.status == "1"
    }

    /// Etherscan's way of saying "the address has no token transfers", as opposed to an error such as an invalid API
    /// key or a rate limit.
    pub fn is_empty_result(&self) -> bool {
        self.message.to_ascii_lowercase().contains("no transactions found")
            || self.result.as_array().map(|r| r.is_empty()).unwrap_or(false)
    }

    pub fn transfers(&self) -> Result<Vec<Erc20Transfer>, ExplorerError> {
        serde_json::from_value(self.result.clone()).map_err(|e| ExplorerError::MalformedResponse(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Erc20Transfer {
    #[serde(deserialize_with = "number_or_string")]
    pub block_number: u64,
    /// Block time in seconds since the epoch
    #[serde(deserialize_with = "number_or_string")]
    pub time_stamp: i64,
    pub hash: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub contract_address: String,
    pub to: String,
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    #[serde(default)]
    pub token_symbol: String,
    #[serde(deserialize_with = "number_or_string")]
    pub token_decimal: u32,
    #[serde(deserialize_with = "number_or_string")]
    pub confirmations: u64,
}

impl Erc20Transfer {
    pub fn into_transfer(self) -> Result<Transfer, ExplorerError> {
        let observed_at = timestamp_from_secs(self.time_stamp)?;
        Ok(Transfer {
            to_address: self.to,
            amount: RawAmount::new(self.value, self.token_decimal),
            tx_hash: self.hash,
            observed_at,
            validity: TransferValidity::Confirmations(self.confirmations),
        })
    }
}
