use thiserror::Error;

/// A best-effort channel for human-readable alerts, such as a chat bot.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError>;
}

/// An optional notifier. `None` silently drops every message.
impl<T: Notifier> Notifier for Option<T> {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        match self {
            Some(n) => n.send(message).await,
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    #[error("Could not reach the notification service. {0}")]
    Transport(String),
    #[error("The notification service rejected the message. {0}")]
    Rejected(String),
}
