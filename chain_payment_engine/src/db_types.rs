use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use cpg_common::{Amount, ChainFamily};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------        TradeId        ---------------------------------------------------------
/// The externally issued, unique correlation id of one payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct TradeId(pub String);

impl FromStr for TradeId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for TradeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TradeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for TradeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TradeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   MonitoredAddress    ---------------------------------------------------------
/// A receiving address the gateway watches for incoming transfers. Provisioned by operators; read-only here.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct MonitoredAddress {
    pub id: i64,
    pub address: String,
    pub chain_family: ChainFamily,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMonitoredAddress {
    pub address: String,
    pub chain_family: ChainFamily,
    pub enabled: bool,
}

impl NewMonitoredAddress {
    /// An enabled address whose chain family is inferred from the address format.
    pub fn new<S: Into<String>>(address: S) -> Self {
        let address = address.into();
        let chain_family = ChainFamily::from_address(&address);
        Self { address, chain_family, enabled: true }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order is waiting for a matching on-chain transfer.
    Pending,
    /// A matching transfer was found and credited to the order.
    Paid,
    /// The order was not paid in time.
    Expired,
    /// The order was cancelled by the merchant.
    Cancelled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Paid => write!(f, "Paid"),
            OrderStatusType::Expired => write!(f, "Expired"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Expired" => Ok(Self::Expired),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Order {
    pub id: i64,
    pub trade_id: TradeId,
    /// The merchant's own order reference
    pub order_id: String,
    /// The receiving address the customer was asked to pay to
    pub address: String,
    pub chain_family: ChainFamily,
    /// The requested amount, in the merchant's currency
    pub amount: Amount,
    /// The token amount the customer must transfer. Unique per address while the order is pending.
    pub actual_amount: Amount,
    /// Where the post-payment callback is delivered
    pub notify_url: Option<String>,
    pub status: OrderStatusType,
    /// The hash of the transfer that paid this order
    pub block_transaction_id: Option<String>,
    pub callback_confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn is_pending(&self) -> bool {
        self.status == OrderStatusType::Pending
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub trade_id: TradeId,
    pub order_id: String,
    pub address: String,
    pub chain_family: ChainFamily,
    pub amount: Amount,
    pub actual_amount: Amount,
    pub notify_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new<S: Into<String>>(trade_id: TradeId, address: S, actual_amount: Amount) -> Self {
        let address = address.into();
        let chain_family = ChainFamily::from_address(&address);
        Self {
            order_id: trade_id.0.clone(),
            trade_id,
            address,
            chain_family,
            amount: actual_amount.clone(),
            actual_amount,
            notify_url: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_order_id<S: Into<String>>(mut self, order_id: S) -> Self {
        self.order_id = order_id.into();
        self
    }

    pub fn with_requested_amount(mut self, amount: Amount) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_notify_url<S: Into<String>>(mut self, url: S) -> Self {
        self.notify_url = Some(url.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

//--------------------------------------   CallbackJobStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum CallbackJobStatus {
    /// Waiting for its first or next delivery attempt
    Pending,
    /// The merchant acknowledged the callback
    Delivered,
    /// Every attempt in the retry budget failed. The job will not be retried again.
    Dead,
}

impl Display for CallbackJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackJobStatus::Pending => write!(f, "Pending"),
            CallbackJobStatus::Delivered => write!(f, "Delivered"),
            CallbackJobStatus::Dead => write!(f, "Dead"),
        }
    }
}

//--------------------------------------      CallbackJob      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CallbackJob {
    pub id: i64,
    pub trade_id: TradeId,
    pub chain_family: ChainFamily,
    /// Number of retries allowed after the first attempt
    pub max_retries: i64,
    /// Number of failed attempts so far
    pub attempts: i64,
    pub status: CallbackJobStatus,
    pub last_error: Option<String>,
    pub next_attempt_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CallbackJob {
    /// True once the failed attempts exceed the retry allowance.
    pub fn is_exhausted(&self) -> bool {
        self.attempts > self.max_retries
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCallbackJob {
    pub trade_id: TradeId,
    pub chain_family: ChainFamily,
    pub max_retries: u32,
}

impl NewCallbackJob {
    pub fn new(trade_id: TradeId, chain_family: ChainFamily) -> Self {
        Self { trade_id, chain_family, max_retries: chain_family.retry_budget() }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}
