//! Server configuration.
//!
//! Everything is read from `CPG_*` environment variables. Invalid values are logged and replaced with defaults, so
//! the server always starts. Run the server with any command line argument to see the list of variables.
use std::{env, time::Duration};

use cpg_common::{
    helpers::{parse_boolean_flag, parse_seconds},
    ChainFamily,
    Secret,
};
use explorer_tools::ExplorerConfig;
use log::*;

use crate::integrations::telegram::TelegramConfig;

const DEFAULT_CPG_HOST: &str = "127.0.0.1";
const DEFAULT_CPG_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/cpg_store.db";
const DEFAULT_CALLBACK_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_CHAIN_SELECTOR: ChainFamily = ChainFamily::Tron;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The chain this deployment mainly serves. Only used to pick the default scan interval.
    pub chain_selector: ChainFamily,
    /// The time between the start of two reconciliation cycles
    pub scan_interval: Duration,
    /// The time between two runs of the callback delivery worker
    pub callback_poll_interval: Duration,
    /// The key used to sign merchant callbacks
    pub callback_secret: Secret<String>,
    pub explorer: ExplorerConfig,
    /// Payment alerts are only sent if this is configured
    pub telegram: Option<TelegramConfig>,
    /// When false, the callback delivery worker is not started. Useful when a separate process delivers callbacks.
    pub deliver_callbacks: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CPG_HOST.to_string(),
            port: DEFAULT_CPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            chain_selector: DEFAULT_CHAIN_SELECTOR,
            scan_interval: default_scan_interval(DEFAULT_CHAIN_SELECTOR),
            callback_poll_interval: DEFAULT_CALLBACK_POLL_INTERVAL,
            callback_secret: Secret::default(),
            explorer: ExplorerConfig::default(),
            telegram: None,
            deliver_callbacks: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CPG_HOST").ok().unwrap_or_else(|| DEFAULT_CPG_HOST.into());
        let port = env::var("CPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CPG_PORT. {e} Using the default, {DEFAULT_CPG_PORT}, instead."
                    );
                    DEFAULT_CPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CPG_PORT);
        let database_url = env::var("CPG_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ CPG_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let chain_selector = chain_selector_from(env::var("CPG_CHAIN_SELECTOR").ok());
        let scan_interval = scan_interval_from(chain_selector, env::var("CPG_SCAN_INTERVAL").ok());
        info!("🪛️ Reconciliation cycles run every {}s", scan_interval.as_secs());
        let callback_poll_interval = seconds_or_default(
            "CPG_CALLBACK_POLL_INTERVAL",
            env::var("CPG_CALLBACK_POLL_INTERVAL").ok(),
            DEFAULT_CALLBACK_POLL_INTERVAL,
        );
        let callback_secret = Secret::new(env::var("CPG_CALLBACK_SECRET").ok().unwrap_or_else(|| {
            warn!(
                "🪛️ CPG_CALLBACK_SECRET is not set. Merchant callbacks will be signed with an empty key, which anyone \
                 can forge."
            );
            String::default()
        }));
        let explorer = ExplorerConfig::new_from_env_or_default();
        let telegram = TelegramConfig::from_env();
        if telegram.is_none() {
            info!("🪛️ Telegram is not configured. Payment alerts are disabled.");
        }
        let deliver_callbacks = parse_boolean_flag(env::var("CPG_DELIVER_CALLBACKS").ok(), true);
        Self {
            host,
            port,
            database_url,
            chain_selector,
            scan_interval,
            callback_poll_interval,
            callback_secret,
            explorer,
            telegram,
            deliver_callbacks,
        }
    }
}

/// Tron blocks are produced every 3s, Ethereum blocks every 12s. The scan cadence follows suit.
pub fn default_scan_interval(chain_selector: ChainFamily) -> Duration {
    match chain_selector {
        ChainFamily::Tron => Duration::from_secs(5),
        ChainFamily::Ethereum => Duration::from_secs(15),
    }
}

fn chain_selector_from(value: Option<String>) -> ChainFamily {
    match value {
        None => DEFAULT_CHAIN_SELECTOR,
        Some(s) => s.parse().unwrap_or_else(|e| {
            warn!("🪛️ CPG_CHAIN_SELECTOR: {e}. Using the default, {DEFAULT_CHAIN_SELECTOR}, instead.");
            DEFAULT_CHAIN_SELECTOR
        }),
    }
}

fn scan_interval_from(chain_selector: ChainFamily, value: Option<String>) -> Duration {
    seconds_or_default("CPG_SCAN_INTERVAL", value, default_scan_interval(chain_selector))
}

fn seconds_or_default(name: &str, value: Option<String>, default: Duration) -> Duration {
    match value {
        None => default,
        Some(s) => parse_seconds(&s).unwrap_or_else(|| {
            warn!("🪛️ Invalid value for {name}: {s}. Using the default of {}s.", default.as_secs());
            default
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8370);
        assert_eq!(config.chain_selector, ChainFamily::Tron);
        assert_eq!(config.scan_interval, Duration::from_secs(5));
        assert!(config.telegram.is_none());
        assert!(config.deliver_callbacks);
    }

    #[test]
    fn scan_interval_follows_the_chain_selector() {
        assert_eq!(scan_interval_from(ChainFamily::Tron, None), Duration::from_secs(5));
        assert_eq!(scan_interval_from(ChainFamily::Ethereum, None), Duration::from_secs(15));
        assert_eq!(scan_interval_from(ChainFamily::Ethereum, Some("30".into())), Duration::from_secs(30));
        assert_eq!(scan_interval_from(ChainFamily::Tron, Some("zero".into())), Duration::from_secs(5));
        assert_eq!(scan_interval_from(ChainFamily::Tron, Some("0".into())), Duration::from_secs(5));
    }

    #[test]
    fn chain_selector() {
        assert_eq!(chain_selector_from(None), ChainFamily::Tron);
        assert_eq!(chain_selector_from(Some("ethereum".into())), ChainFamily::Ethereum);
        assert_eq!(chain_selector_from(Some("ERC20".into())), ChainFamily::Ethereum);
        assert_eq!(chain_selector_from(Some("solana".into())), ChainFamily::Tron);
    }
}
