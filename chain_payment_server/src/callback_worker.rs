//! Delivers queued merchant callbacks.
//!
//! Every poll, the due `Pending` callback jobs are loaded and their orders' `notify_url`s are called with a signed
//! JSON payload. A 2xx response marks the job as delivered. Any other outcome counts as a failed attempt, and the job
//! is rescheduled with exponential back-off until its retry budget is spent, after which it is dead-lettered.
//!
//! Delivery is at-least-once: if the process stops between the POST and the status update, the callback is sent
//! again on the next run.
use std::time::Duration;

use chain_payment_engine::{
    callbacks::{retry_delay, CallbackPayload},
    db_types::{CallbackJob, CallbackJobStatus},
    traits::{CallbackJobManagement, PaymentGatewayError, ReconciliationDatabase},
    SqliteDatabase,
};
use chrono::Utc;
use cpg_common::Secret;
use log::*;
use reqwest::{header::CONTENT_TYPE, Client};
use tokio::task::JoinHandle;

use crate::helpers::calculate_hmac;

/// The header carrying the base64 HMAC-SHA256 of the request body.
pub const SIGNATURE_HEADER: &str = "X-Signature";
const DELIVERY_BATCH_SIZE: i64 = 50;

/// Posts signed callback payloads to merchants.
#[derive(Clone)]
pub struct CallbackClient {
    client: Client,
    secret: Secret<String>,
}

impl CallbackClient {
    pub fn new(secret: Secret<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, secret })
    }

    /// POSTs the payload to `url`. Returns a description of the failure if the merchant did not accept it.
    pub async fn post(&self, url: &str, payload: &CallbackPayload) -> Result<(), String> {
        let body = serde_json::to_vec(payload).map_err(|e| format!("Could not serialize callback. {e}"))?;
        let signature = calculate_hmac(self.secret.reveal(), &body);
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(format!("HTTP {status}. {}", text.chars().take(200).collect::<String>()))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
    pub dead: usize,
}

/// Starts the callback delivery worker. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_callback_worker(db: SqliteDatabase, client: CallbackClient, poll_interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(poll_interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!("📞️ Callback delivery worker started");
        loop {
            timer.tick().await;
            match deliver_due_callbacks(&db, &client).await {
                Ok(report) if report == DeliveryReport::default() => trace!("📞️ No callbacks were due"),
                Ok(report) => info!(
                    "📞️ Callbacks delivered: {}, failed: {}, dead-lettered: {}",
                    report.delivered, report.failed, report.dead
                ),
                Err(e) => error!("📞️ Error running the callback delivery job: {e}"),
            }
        }
    })
}

/// Attempts delivery of every callback job that is currently due.
pub async fn deliver_due_callbacks<B>(db: &B, client: &CallbackClient) -> Result<DeliveryReport, PaymentGatewayError>
where B: CallbackJobManagement + ReconciliationDatabase {
    let jobs = db.fetch_due_callbacks(Utc::now(), DELIVERY_BATCH_SIZE).await?;
    let mut report = DeliveryReport::default();
    for job in jobs {
        match deliver(db, client, &job).await {
            Ok(()) => {
                db.mark_callback_delivered(job.id).await?;
                debug!("📞️ Callback #{} for order [{}] delivered", job.id, job.trade_id);
                report.delivered += 1;
            },
            Err(reason) => {
                let delay = retry_delay(job.attempts + 1);
                let next_attempt_at = Utc::now() + chrono::Duration::seconds(delay.as_secs() as i64);
                let job = db.record_callback_failure(job.id, &reason, next_attempt_at).await?;
                if job.status == CallbackJobStatus::Dead {
                    error!(
                        "📞️ Callback #{} for order [{}] failed {} times and is dead-lettered. Last error: {reason}",
                        job.id, job.trade_id, job.attempts
                    );
                    report.dead += 1;
                } else {
                    warn!(
                        "📞️ Callback #{} for order [{}] failed (attempt {}). Retrying at {next_attempt_at}. {reason}",
                        job.id, job.trade_id, job.attempts
                    );
                    report.failed += 1;
                }
            },
        }
    }
    Ok(report)
}

async fn deliver<B>(db: &B, client: &CallbackClient, job: &CallbackJob) -> Result<(), String>
where B: ReconciliationDatabase {
    let order = db
        .fetch_order_by_trade_id(&job.trade_id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("Order [{}] does not exist", job.trade_id))?;
    match order.notify_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => client.post(url, &CallbackPayload::from(&order)).await,
        _ => {
            debug!("📞️ Order [{}] has no callback URL. Nothing to deliver.", order.trade_id);
            Ok(())
        },
    }
}

#[cfg(test)]
mod test {
    use chain_payment_engine::{
        db_types::{NewCallbackJob, NewOrder, Order, TradeId},
        traits::CallbackQueue,
    };
    use cpg_common::ChainFamily;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    const ADDR: &str = "TQn9Y2khEsLJW1ChVWFMSMeRDow5KcbLSE";
    const SECRET: &str = "callback-secret";

    async fn test_db() -> (SqliteDatabase, TempDir) {
        let _ = env_logger::try_init();
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/callbacks.db", dir.path().display());
        let db = SqliteDatabase::new_with_url(&url, 5).await.unwrap();
        db.migrate().await.unwrap();
        (db, dir)
    }

    async fn paid_order_with_job(db: &SqliteDatabase, trade_id: &str, notify_url: Option<String>) -> (Order, i64) {
        let trade_id = TradeId::from(trade_id);
        let mut order = NewOrder::new(trade_id.clone(), ADDR, "10.01".parse().unwrap())
            .with_order_id("shop-42")
            .with_requested_amount("72.5".parse().unwrap())
            .with_created_at(Utc::now() - chrono::Duration::minutes(5));
        order.notify_url = notify_url;
        db.insert_order(order).await.unwrap();
        db.mark_order_paid(&trade_id, "tx-abc").await.unwrap();
        let job = db.enqueue_callback(NewCallbackJob::new(trade_id.clone(), ChainFamily::Tron)).await.unwrap();
        let order = db.fetch_order_by_trade_id(&trade_id).await.unwrap().unwrap();
        (order, job.id)
    }

    fn client() -> CallbackClient {
        CallbackClient::new(Secret::new(SECRET.to_string()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn signed_callback_is_delivered() {
        let (db, _dir) = test_db().await;
        let server = MockServer::start_async().await;
        let (order, job_id) = paid_order_with_job(&db, "T1", Some(server.url("/notify"))).await;
        let body = serde_json::to_vec(&CallbackPayload::from(&order)).unwrap();
        let signature = calculate_hmac(SECRET, &body);
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/notify")
                    .header(SIGNATURE_HEADER, signature.as_str())
                    .json_body(json!({
                        "trade_id": "T1",
                        "order_id": "shop-42",
                        "amount": "72.5",
                        "actual_amount": "10.01",
                        "token": "USDT",
                        "block_transaction_id": "tx-abc",
                        "status": "Paid",
                    }));
                then.status(200).body("ok");
            })
            .await;

        let report = deliver_due_callbacks(&db, &client()).await.unwrap();
        mock.assert_async().await;
        assert_eq!(report, DeliveryReport { delivered: 1, failed: 0, dead: 0 });
        let job = db.fetch_callback_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, CallbackJobStatus::Delivered);
        assert!(db.fetch_order_by_trade_id(&order.trade_id).await.unwrap().unwrap().callback_confirmed);
    }

    #[tokio::test]
    async fn failed_callback_is_rescheduled() {
        let (db, _dir) = test_db().await;
        let server = MockServer::start_async().await;
        let (_, job_id) = paid_order_with_job(&db, "T1", Some(server.url("/notify"))).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/notify");
                then.status(500).body("database is down");
            })
            .await;

        let before = Utc::now();
        let report = deliver_due_callbacks(&db, &client()).await.unwrap();
        assert_eq!(report, DeliveryReport { delivered: 0, failed: 1, dead: 0 });
        let job = db.fetch_callback_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, CallbackJobStatus::Pending);
        assert_eq!(job.attempts, 1);
        assert!(job.last_error.unwrap().contains("500"));
        assert!(job.next_attempt_at >= before + chrono::Duration::seconds(2));
        // Not due again until the back-off has passed
        let report = deliver_due_callbacks(&db, &client()).await.unwrap();
        assert_eq!(report, DeliveryReport::default());
    }

    #[tokio::test]
    async fn exhausted_callback_is_dead_lettered() {
        let (db, _dir) = test_db().await;
        let trade_id = TradeId::from("T1");
        let order = NewOrder::new(trade_id.clone(), ADDR, "10".parse().unwrap())
            .with_notify_url("http://127.0.0.1:9/unreachable")
            .with_created_at(Utc::now() - chrono::Duration::minutes(5));
        db.insert_order(order).await.unwrap();
        let job = NewCallbackJob::new(trade_id, ChainFamily::Tron).with_max_retries(0);
        let job = db.enqueue_callback(job).await.unwrap();

        let report = deliver_due_callbacks(&db, &client()).await.unwrap();
        assert_eq!(report, DeliveryReport { delivered: 0, failed: 0, dead: 1 });
        let job = db.fetch_callback_job(job.id).await.unwrap().unwrap();
        assert_eq!(job.status, CallbackJobStatus::Dead);
        assert_eq!(job.attempts, 1);
    }

    #[tokio::test]
    async fn order_without_url_needs_no_delivery() {
        let (db, _dir) = test_db().await;
        let (order, job_id) = paid_order_with_job(&db, "T1", None).await;
        let report = deliver_due_callbacks(&db, &client()).await.unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(db.fetch_callback_job(job_id).await.unwrap().unwrap().status, CallbackJobStatus::Delivered);
        assert!(db.fetch_order_by_trade_id(&order.trade_id).await.unwrap().unwrap().callback_confirmed);
    }
}
