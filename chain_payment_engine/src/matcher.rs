use cpg_common::{Amount, ChainFamily};
use log::*;
use thiserror::Error;

use crate::{
    db_types::Order,
    traits::{PaymentGatewayError, ReconciliationDatabase},
};

#[derive(Debug, Clone, Error)]
#[error("Could not look up pending orders. {0}")]
pub struct MatchLookupError(pub String);

impl From<PaymentGatewayError> for MatchLookupError {
    fn from(e: PaymentGatewayError) -> Self {
        Self(e.to_string())
    }
}

/// Finds the pending order on `address` that expects exactly `amount`.
///
/// The store's answer is re-checked: only `Pending` orders on the same address with a numerically equal expected
/// amount qualify. If several orders qualify, the oldest one (by `created_at`, then `trade_id`) wins and a warning is
/// logged.
pub async fn find_pending_order<B: ReconciliationDatabase>(
    db: &B,
    address: &str,
    amount: &Amount,
) -> Result<Option<Order>, MatchLookupError> {
    let family = ChainFamily::from_address(address);
    let mut candidates = db
        .fetch_pending_orders(address, amount)
        .await?
        .into_iter()
        .filter(|o| o.is_pending() && o.actual_amount == *amount && family.same_address(&o.address, address))
        .collect::<Vec<_>>();
    if candidates.len() > 1 {
        let ids = candidates.iter().map(|o| o.trade_id.to_string()).collect::<Vec<_>>().join(", ");
        warn!("🔄️ {} pending orders on {address} expect {amount}: [{ids}]. The oldest one is used.", candidates.len());
    }
    candidates.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.trade_id.cmp(&b.trade_id)));
    Ok(candidates.into_iter().next())
}

#[cfg(test)]
mod test {
    use chrono::{Duration, TimeZone, Utc};
    use mockall::mock;

    use super::*;
    use crate::{
        db_types::{MonitoredAddress, OrderStatusType, TradeId},
        traits::MarkPaidResult,
    };

    mock! {
        pub Store {}
        impl Clone for Store {
            fn clone(&self) -> Self;
        }
        impl ReconciliationDatabase for Store {
            fn url(&self) -> &str;
            async fn fetch_enabled_addresses(&self) -> Result<Vec<MonitoredAddress>, PaymentGatewayError>;
            async fn fetch_pending_orders(&self, address: &str, amount: &Amount) -> Result<Vec<Order>, PaymentGatewayError>;
            async fn fetch_order_by_trade_id(&self, trade_id: &TradeId) -> Result<Option<Order>, PaymentGatewayError>;
            async fn mark_order_paid(&self, trade_id: &TradeId, tx_hash: &str) -> Result<MarkPaidResult, PaymentGatewayError>;
        }
    }

    const ADDR: &str = "TQn9Y2khEsLJW1ChVWFMSMeRDow5KcbLSE";

    fn order(trade_id: &str, amount: &str, status: OrderStatusType, age_mins: i64) -> Order {
        let created_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() - Duration::minutes(age_mins);
        Order {
            id: 0,
            trade_id: TradeId::from(trade_id),
            order_id: trade_id.to_string(),
            address: ADDR.to_string(),
            chain_family: ChainFamily::Tron,
            amount: amount.parse().unwrap(),
            actual_amount: amount.parse().unwrap(),
            notify_url: None,
            status,
            block_transaction_id: None,
            callback_confirmed: false,
            created_at,
            updated_at: created_at,
            paid_at: None,
        }
    }

    fn store_returning(orders: Vec<Order>) -> MockStore {
        let mut store = MockStore::new();
        store.expect_fetch_pending_orders().returning(move |_, _| Ok(orders.clone()));
        store
    }

    #[tokio::test]
    async fn no_candidates() {
        let store = store_returning(vec![]);
        let amount = "10".parse().unwrap();
        assert!(find_pending_order(&store, ADDR, &amount).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rechecks_amount_and_status() {
        let store = store_returning(vec![
            order("paid", "10", OrderStatusType::Paid, 10),
            order("wrong-amount", "10.01", OrderStatusType::Pending, 9),
            order("match", "10.000", OrderStatusType::Pending, 1),
        ]);
        let amount = "10".parse().unwrap();
        let found = find_pending_order(&store, ADDR, &amount).await.unwrap().unwrap();
        assert_eq!(found.trade_id.as_str(), "match");
    }

    #[tokio::test]
    async fn oldest_order_wins_a_tie() {
        let store = store_returning(vec![
            order("newer", "10", OrderStatusType::Pending, 1),
            order("b-oldest", "10", OrderStatusType::Pending, 5),
            order("a-oldest", "10", OrderStatusType::Pending, 5),
        ]);
        let amount = "10".parse().unwrap();
        let found = find_pending_order(&store, ADDR, &amount).await.unwrap().unwrap();
        assert_eq!(found.trade_id.as_str(), "a-oldest");
    }

    #[tokio::test]
    async fn store_errors_surface() {
        let mut store = MockStore::new();
        store
            .expect_fetch_pending_orders()
            .returning(|_, _| Err(PaymentGatewayError::DatabaseError("connection reset".into())));
        let amount = "10".parse().unwrap();
        let err = find_pending_order(&store, ADDR, &amount).await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }
}
