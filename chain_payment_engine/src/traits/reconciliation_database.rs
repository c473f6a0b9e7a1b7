use cpg_common::Amount;
use thiserror::Error;

use crate::{
    db_types::{MonitoredAddress, Order, OrderStatusType, TradeId},
    traits::data_objects::MarkPaidResult,
};

/// This trait defines the store behaviour the reconciliation engine depends on.
///
/// Orders and monitored addresses are provisioned by an external system. The engine only ever
/// * reads the enabled monitored addresses,
/// * looks up pending orders by receiving address and expected amount, and
/// * performs the single `Pending` to `Paid` transition of an order.
#[allow(async_fn_in_trait)]
pub trait ReconciliationDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Fetches every monitored address that is currently enabled. Disabled addresses are never scanned.
    async fn fetch_enabled_addresses(&self) -> Result<Vec<MonitoredAddress>, PaymentGatewayError>;

    /// Fetches the orders that are `Pending` on the given receiving address and could be paid by a transfer of
    /// `amount`.
    ///
    /// Backends may pre-filter on the stored amount, but callers must not rely on the result being filtered
    /// exactly. The result is ordered by `created_at`, then `trade_id`.
    async fn fetch_pending_orders(&self, address: &str, amount: &Amount) -> Result<Vec<Order>, PaymentGatewayError>;

    /// Fetches the order with the given trade id, regardless of its status.
    async fn fetch_order_by_trade_id(&self, trade_id: &TradeId) -> Result<Option<Order>, PaymentGatewayError>;

    /// Transitions the order identified by `trade_id` from `Pending` to `Paid`, recording `tx_hash` as the paying
    /// transaction.
    ///
    /// The status check, the transaction hash uniqueness check and the update happen in a single atomic conditional
    /// update, so that concurrent callers credit the order at most once and a transaction hash credits at most one
    /// order.
    ///
    /// ## Returns
    /// * [`MarkPaidResult::Paid`] with the updated order if this call performed the transition,
    /// * [`MarkPaidResult::NotPending`] if the order was no longer pending,
    /// * [`MarkPaidResult::TransferAlreadyClaimed`] if `tx_hash` already paid another order.
    ///
    /// ## Failure modes
    /// * [`PaymentGatewayError::OrderNotFound`] if there is no order with the given trade id.
    async fn mark_order_paid(&self, trade_id: &TradeId, tx_hash: &str) -> Result<MarkPaidResult, PaymentGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since it already exists with trade id {0}")]
    OrderAlreadyExists(TradeId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(TradeId),
    #[error("The requested callback job {0} does not exist")]
    CallbackJobNotFound(i64),
    #[error("Illegal order status change for {0}. The order is {1}")]
    OrderStatusUpdateError(TradeId, OrderStatusType),
    #[error("The stored amount '{0}' is not a valid decimal")]
    CorruptAmount(String),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}
