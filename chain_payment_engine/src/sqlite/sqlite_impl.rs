//! `SqliteDatabase` is a concrete implementation of a chain payment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module. It also carries the provisioning methods (inserting orders and monitored addresses) that the external
//! order system and the test suite use.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use cpg_common::Amount;
use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{addresses, callbacks, db_url, new_pool, orders};
use crate::{
    db_types::{CallbackJob, MonitoredAddress, NewCallbackJob, NewMonitoredAddress, NewOrder, Order, TradeId},
    traits::{
        CallbackJobManagement,
        CallbackQueue,
        EnqueueError,
        MarkPaidResult,
        PaymentGatewayError,
        ReconciliationDatabase,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl ReconciliationDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_enabled_addresses(&self) -> Result<Vec<MonitoredAddress>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let result = addresses::fetch_enabled_addresses(&mut conn).await?;
        Ok(result)
    }

    async fn fetch_pending_orders(&self, address: &str, amount: &Amount) -> Result<Vec<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::fetch_pending_orders(address, amount, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_order_by_trade_id(&self, trade_id: &TradeId) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::fetch_order_by_trade_id(trade_id, &mut conn).await?;
        Ok(result)
    }

    async fn mark_order_paid(&self, trade_id: &TradeId, tx_hash: &str) -> Result<MarkPaidResult, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let result = orders::mark_paid(trade_id, tx_hash, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}

impl CallbackQueue for SqliteDatabase {
    async fn enqueue_callback(&self, job: NewCallbackJob) -> Result<CallbackJob, EnqueueError> {
        let mut tx = self.pool.begin().await?;
        let job = callbacks::insert_job(job, &mut tx).await?;
        tx.commit().await?;
        Ok(job)
    }
}

impl CallbackJobManagement for SqliteDatabase {
    async fn fetch_due_callbacks(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<CallbackJob>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let jobs = callbacks::fetch_due_jobs(now, limit, &mut conn).await?;
        Ok(jobs)
    }

    async fn mark_callback_delivered(&self, job_id: i64) -> Result<CallbackJob, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let job =
            callbacks::mark_delivered(job_id, &mut tx).await?.ok_or(PaymentGatewayError::CallbackJobNotFound(job_id))?;
        orders::set_callback_confirmed(&job.trade_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Callback job #{job_id} for order [{}] delivered", job.trade_id);
        Ok(job)
    }

    async fn record_callback_failure(
        &self,
        job_id: i64,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<CallbackJob, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let job = callbacks::record_failure(job_id, error, next_attempt_at, &mut tx)
            .await?
            .ok_or(PaymentGatewayError::CallbackJobNotFound(job_id))?;
        tx.commit().await?;
        Ok(job)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in the `CPG_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, PaymentGatewayError> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, PaymentGatewayError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Runs the embedded schema migrations. This is idempotent.
    pub async fn migrate(&self) -> Result<(), PaymentGatewayError> {
        migrate!("./src/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PaymentGatewayError::DatabaseError(format!("Migration failed. {e}")))?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Stores a new pending order. This call is idempotent on the trade id: if the order already exists, the stored
    /// record is returned, and the second parameter is `false`.
    pub async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let result = orders::idempotent_insert(order, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    /// Starts monitoring an address. If the address is already monitored, the existing record is returned unchanged.
    pub async fn insert_monitored_address(
        &self,
        address: NewMonitoredAddress,
    ) -> Result<MonitoredAddress, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let record = addresses::idempotent_insert(address, &mut tx).await?;
        tx.commit().await?;
        Ok(record)
    }

    pub async fn set_address_enabled(
        &self,
        address: &str,
        enabled: bool,
    ) -> Result<Option<MonitoredAddress>, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let record = addresses::set_enabled(address, enabled, &mut tx).await?;
        tx.commit().await?;
        Ok(record)
    }

    pub async fn fetch_callback_job(&self, job_id: i64) -> Result<Option<CallbackJob>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let job = callbacks::fetch_job(job_id, &mut conn).await?;
        Ok(job)
    }

    pub async fn fetch_callback_jobs_for_order(&self, trade_id: &TradeId) -> Result<Vec<CallbackJob>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let jobs = callbacks::fetch_jobs_for_order(trade_id, &mut conn).await?;
        Ok(jobs)
    }
}
