//! Post-payment merchant callbacks.
//!
//! When an order is paid, a durable [`CallbackJob`](crate::db_types::CallbackJob) is queued. Delivery happens out of
//! band, so a slow or unreachable merchant never holds up reconciliation. The payload and the retry schedule used by
//! the delivery worker are defined here.
use std::time::Duration;

use cpg_common::{Amount, ChainFamily, USDT_CURRENCY_CODE};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{NewCallbackJob, Order, OrderStatusType, TradeId},
    traits::{CallbackQueue, EnqueueError},
};

/// The longest wait between two delivery attempts of the same callback.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(600);

/// Queues callback jobs with the retry budget of the chain the order was paid on.
#[derive(Clone)]
pub struct CallbackDispatcher<Q> {
    queue: Q,
}

impl<Q: CallbackQueue> CallbackDispatcher<Q> {
    pub fn new(queue: Q) -> Self {
        Self { queue }
    }

    /// Queues a callback for the paid `order` with the retry budget of `family` and returns the job id.
    pub async fn submit(&self, order: &Order, family: ChainFamily) -> Result<i64, EnqueueError> {
        self.submit_with_budget(order, family, family.retry_budget()).await
    }

    pub async fn submit_with_budget(
        &self,
        order: &Order,
        family: ChainFamily,
        retries: u32,
    ) -> Result<i64, EnqueueError> {
        let job = NewCallbackJob::new(order.trade_id.clone(), family).with_max_retries(retries);
        let job = self.queue.enqueue_callback(job).await?;
        debug!("📞️ Callback #{} queued for order [{}] with {retries} retries", job.id, order.trade_id);
        Ok(job.id)
    }
}

/// The JSON body POSTed to an order's `notify_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackPayload {
    pub trade_id: TradeId,
    pub order_id: String,
    pub amount: Amount,
    pub actual_amount: Amount,
    pub token: String,
    pub block_transaction_id: String,
    pub status: OrderStatusType,
}

impl From<&Order> for CallbackPayload {
    fn from(order: &Order) -> Self {
        Self {
            trade_id: order.trade_id.clone(),
            order_id: order.order_id.clone(),
            amount: order.amount.clone(),
            actual_amount: order.actual_amount.clone(),
            token: USDT_CURRENCY_CODE.to_string(),
            block_transaction_id: order.block_transaction_id.clone().unwrap_or_default(),
            status: order.status,
        }
    }
}

/// The wait before the next delivery attempt, after `attempts` failed attempts: `2^attempts` seconds, capped at
/// [`MAX_RETRY_DELAY`].
pub fn retry_delay(attempts: i64) -> Duration {
    let exp = attempts.clamp(0, 20) as u32;
    Duration::from_secs(2u64.pow(exp)).min(MAX_RETRY_DELAY)
}
