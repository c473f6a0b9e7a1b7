mod amount;
mod chain;
pub mod helpers;
mod secret;
mod transfer;

pub use amount::{normalize, Amount, MalformedAmountError, FIAT_CURRENCY_CODE, USDT_CURRENCY_CODE};
pub use chain::{ChainFamily, ChainFamilyParseError};
pub use secret::Secret;
pub use transfer::{RawAmount, Transfer, TransferValidity};
