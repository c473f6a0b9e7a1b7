//! Payment alerts via a Telegram bot.
use std::{env, time::Duration};

use chain_payment_engine::traits::{Notifier, NotifyError};
use cpg_common::Secret;
use log::*;
use reqwest::Client;
use serde_json::json;

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";
const TELEGRAM_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub api_url: String,
    pub bot_token: Secret<String>,
    pub chat_id: String,
}

impl TelegramConfig {
    pub fn new<S: Into<String>>(bot_token: S, chat_id: S) -> Self {
        Self { api_url: TELEGRAM_API_URL.to_string(), bot_token: Secret::new(bot_token.into()), chat_id: chat_id.into() }
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.to_string();
        self
    }

    /// Reads `CPG_TELEGRAM_BOT_TOKEN` and `CPG_TELEGRAM_CHAT_ID`. Returns `None` unless both are set.
    pub fn from_env() -> Option<Self> {
        let token = env::var("CPG_TELEGRAM_BOT_TOKEN").ok().filter(|s| !s.trim().is_empty());
        let chat_id = env::var("CPG_TELEGRAM_CHAT_ID").ok().filter(|s| !s.trim().is_empty());
        match (token, chat_id) {
            (Some(token), Some(chat_id)) => Some(Self::new(token, chat_id)),
            (Some(_), None) => {
                warn!("🪛️ CPG_TELEGRAM_BOT_TOKEN is set, but CPG_TELEGRAM_CHAT_ID is not.");
                None
            },
            (None, Some(_)) => {
                warn!("🪛️ CPG_TELEGRAM_CHAT_ID is set, but CPG_TELEGRAM_BOT_TOKEN is not.");
                None
            },
            (None, None) => None,
        }
    }
}

#[derive(Clone)]
pub struct TelegramNotifier {
    config: TelegramConfig,
    client: Client,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(TELEGRAM_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Transport(format!("Could not create HTTP client. {e}")))?;
        Ok(Self { config, client })
    }

    fn url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.config.api_url.trim_end_matches('/'), self.config.bot_token.reveal())
    }
}

impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let body = json!({
            "chat_id": self.config.chat_id,
            "text": message,
            "parse_mode": "HTML",
        });
        let response = self
            .client
            .post(self.url())
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.without_url().to_string()))?;
        let status = response.status();
        if status.is_success() {
            trace!("📣️ Telegram message delivered");
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(NotifyError::Rejected(format!("{status}. {text}")))
        }
    }
}
