use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{CallbackJob, NewCallbackJob},
    traits::PaymentGatewayError,
};

/// A durable queue of post-payment callbacks.
///
/// Enqueued jobs survive restarts. Delivery happens elsewhere; see [`CallbackJobManagement`].
#[allow(async_fn_in_trait)]
pub trait CallbackQueue: Clone {
    /// Persists a new callback job in the `Pending` state, due immediately, and returns it.
    async fn enqueue_callback(&self, job: NewCallbackJob) -> Result<CallbackJob, EnqueueError>;
}

/// Methods used by the delivery worker to drain the callback queue.
#[allow(async_fn_in_trait)]
pub trait CallbackJobManagement: CallbackQueue {
    /// Fetches up to `limit` jobs that are `Pending` and whose `next_attempt_at` is not after `now`, oldest first.
    async fn fetch_due_callbacks(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<CallbackJob>, PaymentGatewayError>;

    /// Marks the job as `Delivered` and sets `callback_confirmed` on the order it belongs to.
    async fn mark_callback_delivered(&self, job_id: i64) -> Result<CallbackJob, PaymentGatewayError>;

    /// Records a failed delivery attempt. `attempts` is incremented and `last_error` stored. If the job still has
    /// retries left it is rescheduled for `next_attempt_at`, otherwise it becomes `Dead`.
    async fn record_callback_failure(
        &self,
        job_id: i64,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<CallbackJob, PaymentGatewayError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not enqueue callback. {0}")]
pub struct EnqueueError(pub String);

impl From<PaymentGatewayError> for EnqueueError {
    fn from(e: PaymentGatewayError) -> Self {
        Self(e.to_string())
    }
}

impl From<sqlx::Error> for EnqueueError {
    fn from(e: sqlx::Error) -> Self {
        Self(e.to_string())
    }
}
