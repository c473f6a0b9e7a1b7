use chrono::{DateTime, Utc};

use crate::{normalize, MalformedAmountError, Amount};

/// A transfer value exactly as the explorer reported it: an integer string in the token's smallest unit and the
/// decimal exponent that applies to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAmount {
    pub value: String,
    pub decimals: u32,
}

impl RawAmount {
    pub fn new<S: Into<String>>(value: S, decimals: u32) -> Self {
        Self { value: value.into(), decimals }
    }

    pub fn normalize(&self) -> Result<Amount, MalformedAmountError> {
        normalize(&self.value, self.decimals)
    }
}

/// The chain-specific signal the explorer gives about whether a transfer can be trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferValidity {
    /// Tron: the contract call result, e.g. `SUCCESS` or `REVERT`.
    ContractResult(String),
    /// Ethereum: the number of blocks mined on top of the transfer's block.
    Confirmations(u64),
}

/// An incoming token transfer observed on-chain. Transfers are never persisted; they only live for one reconciliation
/// pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub to_address: String,
    pub amount: RawAmount,
    pub tx_hash: String,
    /// The block timestamp of the transfer
    pub observed_at: DateTime<Utc>,
    pub validity: TransferValidity,
}
