use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, App, HttpServer};
use chain_payment_engine::{adapters::ExplorerAdapter, Reconciler, SqliteDatabase};
use log::*;

use crate::{
    callback_worker::{start_callback_worker, CallbackClient},
    config::ServerConfig,
    errors::ServerError,
    integrations::telegram::TelegramNotifier,
    routes::health,
    scan_worker::{start_scan_worker, ServerReconciler},
};

/// Opens (and migrates) the database, starts the reconciliation and callback workers, and serves the health
/// endpoint until the process is stopped.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let reconciler = create_reconciler(&config, db.clone())?;
    let _scanner = start_scan_worker(Arc::new(reconciler), config.scan_interval);
    if config.deliver_callbacks {
        let client = CallbackClient::new(config.callback_secret.clone(), config.explorer.timeout)
            .map_err(|e| ServerError::InitializeError(format!("Could not create the callback client. {e}")))?;
        let _callbacks = start_callback_worker(db, client, config.callback_poll_interval);
    } else {
        warn!("🚀️ Callback delivery is disabled. Queued callbacks will not be sent by this process.");
    }
    let srv = create_server_instance(config)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_reconciler(config: &ServerConfig, db: SqliteDatabase) -> Result<ServerReconciler, ServerError> {
    let adapters = ExplorerAdapter::all(&config.explorer)
        .map_err(|e| ServerError::InitializeError(format!("Could not create the explorer clients. {e}")))?;
    let notifier = match &config.telegram {
        Some(telegram) => Some(
            TelegramNotifier::new(telegram.clone())
                .map_err(|e| ServerError::ConfigurationError(format!("Could not create the Telegram client. {e}")))?,
        ),
        None => None,
    };
    Ok(Reconciler::new(db.clone(), adapters, db, notifier))
}

pub fn create_server_instance(config: ServerConfig) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        App::new().wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("cpg::access_log")).service(health)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

#[cfg(test)]
mod test {
    use chain_payment_engine::{
        db_types::{NewMonitoredAddress, NewOrder, OrderStatusType, TradeId},
        traits::ReconciliationDatabase,
    };
    use chrono::Utc;
    use explorer_tools::ExplorerConfig;
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    const ADDR: &str = "TQn9Y2khEsLJW1ChVWFMSMeRDow5KcbLSE";

    #[tokio::test]
    async fn tronscan_payment_is_reconciled_end_to_end() {
        let _ = env_logger::try_init();
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/gateway.db", dir.path().display());
        let db = SqliteDatabase::new_with_url(&url, 5).await.unwrap();
        db.migrate().await.unwrap();

        let explorer = MockServer::start_async().await;
        let mock = explorer
            .mock_async(|when, then| {
                when.method(GET).path("/api/transfer/trc20").query_param("address", ADDR);
                then.status(200).json_body(json!({
                    "page_size": 1,
                    "code": 200,
                    "data": [{
                        "amount": "12345000",
                        "block_timestamp": (Utc::now() - chrono::Duration::minutes(1)).timestamp_millis(),
                        "to": ADDR,
                        "hash": "tx-12345",
                        "contract_ret": "SUCCESS"
                    }]
                }));
            })
            .await;

        let config = ServerConfig {
            explorer: ExplorerConfig::default().with_base_url(&explorer.base_url()),
            telegram: None,
            ..ServerConfig::default()
        };
        let reconciler = create_reconciler(&config, db.clone()).unwrap();
        db.insert_monitored_address(NewMonitoredAddress::new(ADDR)).await.unwrap();
        let order = NewOrder::new(TradeId::from("TX1"), ADDR, "12.345000".parse().unwrap())
            .with_notify_url("https://shop.example/notify")
            .with_created_at(Utc::now() - chrono::Duration::minutes(10));
        db.insert_order(order).await.unwrap();

        let report = reconciler.run_cycle().await.unwrap();
        mock.assert_async().await;
        assert!(report.is_clean());
        assert_eq!(report.orders_paid, vec![TradeId::from("TX1")]);

        let trade_id = TradeId::from("TX1");
        let paid = db.fetch_order_by_trade_id(&trade_id).await.unwrap().unwrap();
        assert_eq!(paid.status, OrderStatusType::Paid);
        assert_eq!(paid.block_transaction_id.as_deref(), Some("tx-12345"));
        let jobs = db.fetch_callback_jobs_for_order(&trade_id).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].max_retries, 5);

        // A second cycle sees the same transfer and changes nothing
        let again = reconciler.run_cycle().await.unwrap();
        assert!(again.orders_paid.is_empty());
        assert_eq!(db.fetch_callback_jobs_for_order(&trade_id).await.unwrap().len(), 1);
    }
}
