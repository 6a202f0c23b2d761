//! Outbound messages and the sink transports implement to receive them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::ChannelError;

use super::render::Menu;

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    /// Short status or error line.
    Notice { text: String },
    /// Interactive choice menu.
    Menu { menu: Menu },
}

impl Outbound {
    pub fn notice(text: impl Into<String>) -> Self {
        Self::Notice { text: text.into() }
    }

    pub fn menu(menu: Menu) -> Self {
        Self::Menu { menu }
    }
}

/// Where the workflow sends user-visible output.
#[async_trait]
pub trait Outbox: Send + Sync {
    async fn send(&self, message: Outbound) -> Result<(), ChannelError>;
}

/// Send and log delivery failures; the workflow continues regardless.
pub(crate) async fn emit(outbox: &dyn Outbox, message: Outbound) {
    if let Err(e) = outbox.send(message).await {
        warn!(error = %e, "Failed to deliver outbound message");
    }
}

/// Buffers messages in order. Used by the HTTP transport and tests.
#[derive(Default)]
pub struct CollectingOutbox {
    messages: Mutex<Vec<Outbound>>,
}

impl CollectingOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything sent so far.
    pub async fn drain(&self) -> Vec<Outbound> {
        std::mem::take(&mut *self.messages.lock().await)
    }
}

#[async_trait]
impl Outbox for CollectingOutbox {
    async fn send(&self, message: Outbound) -> Result<(), ChannelError> {
        self.messages.lock().await.push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn collecting_outbox_keeps_order_and_drains() {
        let outbox = CollectingOutbox::new();
        emit(&outbox, Outbound::notice("one")).await;
        emit(&outbox, Outbound::notice("two")).await;

        let drained = outbox.drain().await;
        assert_eq!(drained, vec![Outbound::notice("one"), Outbound::notice("two")]);
        assert!(outbox.drain().await.is_empty());
    }

    #[test]
    fn outbound_json_is_tagged() {
        let json = serde_json::to_value(Outbound::notice("⏳ working")).unwrap();
        assert_eq!(json["type"], "notice");
        assert_eq!(json["text"], "⏳ working");
    }
}
