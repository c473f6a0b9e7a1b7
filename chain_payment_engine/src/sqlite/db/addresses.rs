use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{MonitoredAddress, NewMonitoredAddress};

pub async fn fetch_enabled_addresses(conn: &mut SqliteConnection) -> Result<Vec<MonitoredAddress>, sqlx::Error> {
    let addresses = sqlx::query_as("SELECT * FROM monitored_addresses WHERE enabled = 1 ORDER BY id")
        .fetch_all(conn)
        .await?;
    Ok(addresses)
}

/// Inserts the address, or returns the existing record if it is already monitored.
pub async fn idempotent_insert(
    address: NewMonitoredAddress,
    conn: &mut SqliteConnection,
) -> Result<MonitoredAddress, sqlx::Error> {
    if let Some(existing) = fetch_address(&address.address, conn).await? {
        return Ok(existing);
    }
    let now = Utc::now();
    let record: MonitoredAddress = sqlx::query_as(
        r#"
            INSERT INTO monitored_addresses (address, chain_family, enabled, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING *;
        "#,
    )
    .bind(address.address)
    .bind(address.chain_family)
    .bind(address.enabled)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Now monitoring {} address {}", record.chain_family, record.address);
    Ok(record)
}

pub async fn fetch_address(address: &str, conn: &mut SqliteConnection) -> Result<Option<MonitoredAddress>, sqlx::Error> {
    let record = sqlx::query_as("SELECT * FROM monitored_addresses WHERE address = $1")
        .bind(address)
        .fetch_optional(conn)
        .await?;
    Ok(record)
}

pub async fn set_enabled(
    address: &str,
    enabled: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<MonitoredAddress>, sqlx::Error> {
    let record = sqlx::query_as(
        "UPDATE monitored_addresses SET enabled = $1, updated_at = $2 WHERE address = $3 RETURNING *",
    )
    .bind(enabled)
    .bind(Utc::now())
    .bind(address)
    .fetch_optional(conn)
    .await?;
    Ok(record)
}
