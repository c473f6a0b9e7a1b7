//! Human-readable payment alerts.
//!
//! Alerts are best-effort: a notifier failure is logged and otherwise ignored. It never affects the order or the
//! callback.
use chrono::{DateTime, Utc};
use cpg_common::{FIAT_CURRENCY_CODE, USDT_CURRENCY_CODE};
use log::*;

use crate::{db_types::Order, traits::Notifier};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Formats the "order paid" alert as Telegram-flavoured HTML.
pub fn format_paid_message(order: &Order, paid_at: DateTime<Utc>) -> String {
    format!(
        "<b>📢 New payment received!</b>\n\
         <pre>Trade id: {}</pre>\n\
         <pre>Order id: {}</pre>\n\
         <pre>Requested amount: {} {FIAT_CURRENCY_CODE}</pre>\n\
         <pre>Paid amount: {} {USDT_CURRENCY_CODE}</pre>\n\
         <pre>Address: {}</pre>\n\
         <pre>Order created: {}</pre>\n\
         <pre>Paid at: {}</pre>",
        escape_html(order.trade_id.as_str()),
        escape_html(&order.order_id),
        order.amount,
        order.actual_amount,
        escape_html(&order.address),
        order.created_at.format(TIME_FORMAT),
        paid_at.format(TIME_FORMAT),
    )
}

/// Sends the "order paid" alert. Errors are logged and swallowed.
pub async fn notify_paid<N: Notifier>(notifier: &N, order: &Order) {
    let paid_at = order.paid_at.unwrap_or_else(Utc::now);
    let message = format_paid_message(order, paid_at);
    match notifier.send(&message).await {
        Ok(()) => trace!("📣️ Payment alert sent for order [{}]", order.trade_id),
        Err(e) => warn!("📣️ Could not send the payment alert for order [{}]. {e}", order.trade_id),
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;
    use cpg_common::ChainFamily;
    use mockall::mock;

    use super::*;
    use crate::{
        db_types::{OrderStatusType, TradeId},
        traits::NotifyError,
    };

    mock! {
        pub Chat {}
        impl Notifier for Chat {
            async fn send(&self, message: &str) -> Result<(), NotifyError>;
        }
    }

    fn paid_order() -> Order {
        let created_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let paid_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 3, 20).unwrap();
        Order {
            id: 1,
            trade_id: TradeId::from("T<1>"),
            order_id: "shop&42".to_string(),
            address: "TQn9Y2khEsLJW1ChVWFMSMeRDow5KcbLSE".to_string(),
            chain_family: ChainFamily::Tron,
            amount: "72.5".parse().unwrap(),
            actual_amount: "10.01".parse().unwrap(),
            notify_url: None,
            status: OrderStatusType::Paid,
            block_transaction_id: Some("abc".to_string()),
            callback_confirmed: false,
            created_at,
            updated_at: paid_at,
            paid_at: Some(paid_at),
        }
    }

    #[test]
    fn message_contents() {
        let order = paid_order();
        let msg = format_paid_message(&order, order.paid_at.unwrap());
        assert!(msg.contains("Trade id: T&lt;1&gt;"));
        assert!(msg.contains("Order id: shop&amp;42"));
        assert!(msg.contains("Requested amount: 72.5 CNY"));
        assert!(msg.contains("Paid amount: 10.01 USDT"));
        assert!(msg.contains("TQn9Y2khEsLJW1ChVWFMSMeRDow5KcbLSE"));
        assert!(msg.contains("Order created: 2024-06-01 12:00:00 UTC"));
        assert!(msg.contains("Paid at: 2024-06-01 12:03:20 UTC"));
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let mut chat = MockChat::new();
        chat.expect_send().times(1).returning(|_| Err(NotifyError::Transport("timeout".into())));
        notify_paid(&chat, &paid_order()).await;
    }

    #[tokio::test]
    async fn no_notifier_is_fine() {
        let none: Option<MockChat> = None;
        notify_paid(&none, &paid_order()).await;
    }
}
