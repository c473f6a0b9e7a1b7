use chrono::Utc;
use cpg_common::{Amount, ChainFamily};
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, TradeId},
    traits::{MarkPaidResult, PaymentGatewayError},
};

/// Inserts the order into the database, returning `false` in the second parameter if the order already exists.
pub async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<(Order, bool), PaymentGatewayError> {
    let inserted = match fetch_order_by_trade_id(&order.trade_id, conn).await? {
        Some(order) => (order, false),
        None => {
            let order = insert_order(order, conn).await?;
            debug!("🗃️ Order [{}] inserted with id {}", order.trade_id, order.id);
            (order, true)
        },
    };
    Ok(inserted)
}

/// Inserts a new order into the database using the given connection. New orders are always `Pending`.
async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, PaymentGatewayError> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                trade_id,
                order_id,
                address,
                chain_family,
                amount,
                actual_amount,
                notify_url,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, 'Pending', $8, $8)
            RETURNING *;
        "#,
    )
    .bind(order.trade_id)
    .bind(order.order_id)
    .bind(order.address)
    .bind(order.chain_family)
    .bind(order.amount)
    .bind(order.actual_amount)
    .bind(order.notify_url)
    .bind(order.created_at)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order_by_trade_id(
    trade_id: &TradeId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE trade_id = $1").bind(trade_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_tx_hash(tx_hash: &str, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE block_transaction_id = $1")
        .bind(tx_hash)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Fetches the pending orders on `address` whose expected amount equals `amount`.
///
/// Stored amounts are compared numerically after decoding, so `12.50` and `12.5` are the same amount. Hex addresses
/// are matched case-insensitively.
pub async fn fetch_pending_orders(
    address: &str,
    amount: &Amount,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let candidates: Vec<Order> = sqlx::query_as(
        r#"
            SELECT * FROM orders
            WHERE status = 'Pending'
              AND (address = $1 OR (chain_family = $2 AND lower(address) = lower($1)))
            ORDER BY created_at, trade_id
        "#,
    )
    .bind(address)
    .bind(ChainFamily::Ethereum)
    .fetch_all(conn)
    .await?;
    trace!("🗃️ {} pending orders on {address}", candidates.len());
    let orders = candidates.into_iter().filter(|o| o.actual_amount == *amount).collect();
    Ok(orders)
}

/// Moves the order from `Pending` to `Paid` in a single conditional statement. The statement only succeeds if the
/// order is still pending and no other order has been paid by `tx_hash`.
///
/// When nothing was updated, the reason is worked out afterwards.
pub async fn mark_paid(
    trade_id: &TradeId,
    tx_hash: &str,
    conn: &mut SqliteConnection,
) -> Result<MarkPaidResult, PaymentGatewayError> {
    let now = Utc::now();
    let updated: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders
            SET status = 'Paid', block_transaction_id = $1, paid_at = $3, updated_at = $3
            WHERE trade_id = $2
              AND status = 'Pending'
              AND NOT EXISTS (SELECT 1 FROM orders WHERE block_transaction_id = $1)
            RETURNING *;
        "#,
    )
    .bind(tx_hash)
    .bind(trade_id.as_str())
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(order) = updated {
        debug!("🗃️ Order [{trade_id}] marked as paid by {tx_hash}");
        return Ok(MarkPaidResult::Paid(order));
    }
    let order = fetch_order_by_trade_id(trade_id, &mut *conn)
        .await?
        .ok_or_else(|| PaymentGatewayError::OrderNotFound(trade_id.clone()))?;
    if !order.is_pending() {
        return Ok(MarkPaidResult::NotPending(order.status));
    }
    match fetch_order_by_tx_hash(tx_hash, conn).await? {
        Some(other) => Ok(MarkPaidResult::TransferAlreadyClaimed(other.trade_id)),
        None => Err(PaymentGatewayError::OrderStatusUpdateError(trade_id.clone(), order.status)),
    }
}

pub async fn set_callback_confirmed(trade_id: &TradeId, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET callback_confirmed = 1, updated_at = $1 WHERE trade_id = $2")
        .bind(Utc::now())
        .bind(trade_id.as_str())
        .execute(conn)
        .await?;
    Ok(())
}
