use crate::db_types::{Order, OrderStatusType, TradeId};

/// The outcome of an attempt to mark an order as paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkPaidResult {
    /// This call moved the order from `Pending` to `Paid`.
    Paid(Order),
    /// The order was already in the given state, so nothing was changed.
    NotPending(OrderStatusType),
    /// The transaction hash has already been used to pay the order with the given trade id.
    TransferAlreadyClaimed(TradeId),
}

impl MarkPaidResult {
    pub fn is_paid(&self) -> bool {
        matches!(self, MarkPaidResult::Paid(_))
    }
}
