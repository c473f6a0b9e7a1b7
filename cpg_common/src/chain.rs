use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

//--------------------------------------     ChainFamily       ---------------------------------------------------------
/// A group of blockchains that share an explorer API shape and token-transfer semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum ChainFamily {
    /// TRC-20 tokens on Tron. Finality is fast; the explorer reports an explicit contract result per transfer.
    Tron,
    /// ERC-20 tokens on Ethereum. Finality is probabilistic; acceptance is based on the confirmation count.
    Ethereum,
}

impl ChainFamily {
    /// Infers the chain family from the shape of an address: hex addresses (`0x...`) are Ethereum, everything else
    /// is Tron (base58, `T...`).
    pub fn from_address(address: &str) -> Self {
        if address.starts_with("0x") || address.starts_with("0X") {
            Self::Ethereum
        } else {
            Self::Tron
        }
    }

    /// The maximum number of delivery attempts for the callback of an order paid on this chain. The chain with the
    /// weaker finality guarantee gets the larger budget.
    pub fn retry_budget(&self) -> u32 {
        match self {
            Self::Tron => 5,
            Self::Ethereum => 15,
        }
    }

    /// Compares two addresses on this chain. Hex addresses are case-insensitive; base58 addresses are not.
    pub fn same_address(&self, a: &str, b: &str) -> bool {
        match self {
            Self::Tron => a == b,
            Self::Ethereum => a.eq_ignore_ascii_case(b),
        }
    }

    pub fn token_standard(&self) -> &'static str {
        match self {
            Self::Tron => "TRC20",
            Self::Ethereum => "ERC20",
        }
    }
}

impl Display for ChainFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tron => write!(f, "Tron"),
            Self::Ethereum => write!(f, "Ethereum"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid chain family: {0}")]
pub struct ChainFamilyParseError(String);

impl FromStr for ChainFamily {
    type Err = ChainFamilyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tron" | "trc20" | "trx" => Ok(Self::Tron),
            "ethereum" | "erc20" | "eth" => Ok(Self::Ethereum),
            _ => Err(ChainFamilyParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn family_from_address() {
        assert_eq!(ChainFamily::from_address("TQn9Y2khEsLJW1ChVWFMSMeRDow5KcbLSE"), ChainFamily::Tron);
        assert_eq!(ChainFamily::from_address("0x742d35Cc6634C0532925a3b844Bc454e4438f44e"), ChainFamily::Ethereum);
    }

    #[test]
    fn retry_budgets() {
        assert_eq!(ChainFamily::Tron.retry_budget(), 5);
        assert_eq!(ChainFamily::Ethereum.retry_budget(), 15);
    }

    #[test]
    fn address_comparison() {
        let eth = ChainFamily::Ethereum;
        assert!(eth.same_address("0xABCdef", "0xabcDEF"));
        assert!(!eth.same_address("0xabc", "0xabd"));
        assert!(!ChainFamily::Tron.same_address("TAbc", "Tabc"));
    }

    #[test]
    fn parse() {
        assert_eq!("TRC20".parse::<ChainFamily>().unwrap(), ChainFamily::Tron);
        assert_eq!(" ethereum ".parse::<ChainFamily>().unwrap(), ChainFamily::Ethereum);
        assert!("bitcoin".parse::<ChainFamily>().is_err());
    }
}
