use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{CallbackJob, NewCallbackJob, TradeId};

/// Inserts a new `Pending` callback job that is due immediately.
pub async fn insert_job(job: NewCallbackJob, conn: &mut SqliteConnection) -> Result<CallbackJob, sqlx::Error> {
    let now = Utc::now();
    let job: CallbackJob = sqlx::query_as(
        r#"
            INSERT INTO callback_jobs (trade_id, chain_family, max_retries, attempts, status, next_attempt_at, created_at, updated_at)
            VALUES ($1, $2, $3, 0, 'Pending', $4, $4, $4)
            RETURNING *;
        "#,
    )
    .bind(job.trade_id)
    .bind(job.chain_family)
    .bind(i64::from(job.max_retries))
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Callback job #{} queued for order [{}]", job.id, job.trade_id);
    Ok(job)
}

pub async fn fetch_due_jobs(
    now: DateTime<Utc>,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<CallbackJob>, sqlx::Error> {
    let jobs = sqlx::query_as(
        r#"
            SELECT * FROM callback_jobs
            WHERE status = 'Pending' AND unixepoch(next_attempt_at) <= unixepoch($1)
            ORDER BY next_attempt_at, id
            LIMIT $2
        "#,
    )
    .bind(now)
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(jobs)
}

pub async fn fetch_job(id: i64, conn: &mut SqliteConnection) -> Result<Option<CallbackJob>, sqlx::Error> {
    let job = sqlx::query_as("SELECT * FROM callback_jobs WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(job)
}

pub async fn fetch_jobs_for_order(
    trade_id: &TradeId,
    conn: &mut SqliteConnection,
) -> Result<Vec<CallbackJob>, sqlx::Error> {
    let jobs = sqlx::query_as("SELECT * FROM callback_jobs WHERE trade_id = $1 ORDER BY id")
        .bind(trade_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(jobs)
}

pub async fn mark_delivered(id: i64, conn: &mut SqliteConnection) -> Result<Option<CallbackJob>, sqlx::Error> {
    let job = sqlx::query_as(
        "UPDATE callback_jobs SET status = 'Delivered', last_error = NULL, updated_at = $1 WHERE id = $2 RETURNING *",
    )
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(job)
}

/// Increments the attempt counter of a pending job. The job becomes `Dead` once its attempts exceed `max_retries`.
pub async fn record_failure(
    id: i64,
    error: &str,
    next_attempt_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<CallbackJob>, sqlx::Error> {
    let job = sqlx::query_as(
        r#"
            UPDATE callback_jobs
            SET attempts = attempts + 1,
                status = CASE WHEN attempts + 1 > max_retries THEN 'Dead' ELSE 'Pending' END,
                last_error = $2,
                next_attempt_at = $3,
                updated_at = $4
            WHERE id = $1 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(error)
    .bind(next_attempt_at)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?;
    Ok(job)
}
