use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::Result;
use crate::utils::crypto::sign_payload;

pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Push delivery. Calls are best-effort: callers go through
/// [`spawn_notification`] and never wait on the outcome.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_notification(&self, recipient: Uuid, title: &str, body: &str) -> Result<()>;

    async fn subscribe_to_topic(&self, user_id: Uuid, topic: &str) -> Result<()>;

    /// Broadcast to everyone subscribed to `topic`.
    async fn send_to_topic(&self, topic: &str, title: &str, body: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub enum Notification {
    Message {
        recipient: Uuid,
        title: String,
        body: String,
    },
    Subscribe {
        user_id: Uuid,
        topic: String,
    },
    Topic {
        topic: String,
        title: String,
        body: String,
    },
}

/// Runs the dispatch on its own task. Failures are logged and dropped.
pub fn spawn_notification(
    notifier: Arc<dyn Notifier>,
    notification: Notification,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = match &notification {
            Notification::Message {
                recipient,
                title,
                body,
            } => notifier.send_notification(*recipient, title, body).await,
            Notification::Subscribe { user_id, topic } => {
                notifier.subscribe_to_topic(*user_id, topic).await
            }
            Notification::Topic { topic, title, body } => {
                notifier.send_to_topic(topic, title, body).await
            }
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, ?notification, "notification dispatch failed");
        }
    })
}

/// Posts signed JSON to an HTTP push gateway.
#[derive(Clone)]
pub struct PushGatewayNotifier {
    client: Client,
    base_url: String,
    secret: Option<String>,
}

impl PushGatewayNotifier {
    pub fn new(base_url: String, secret: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret,
        })
    }

    async fn post(&self, path: &str, payload: serde_json::Value) -> Result<()> {
        let body = serde_json::to_vec(&payload)?;
        let mut request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(secret) = &self.secret {
            request = request.header(SIGNATURE_HEADER, sign_payload(secret, &body)?);
        }
        request.body(body).send().await?.error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for PushGatewayNotifier {
    async fn send_notification(&self, recipient: Uuid, title: &str, body: &str) -> Result<()> {
        self.post(
            "/notifications",
            json!({ "recipient": recipient, "title": title, "body": body }),
        )
        .await
    }

    async fn subscribe_to_topic(&self, user_id: Uuid, topic: &str) -> Result<()> {
        self.post(
            "/topics/subscribe",
            json!({ "userID": user_id, "topic": topic }),
        )
        .await
    }

    async fn send_to_topic(&self, topic: &str, title: &str, body: &str) -> Result<()> {
        self.post(
            "/topics/send",
            json!({ "topic": topic, "title": title, "body": body }),
        )
        .await
    }
}

/// Used when no gateway is configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_notification(&self, recipient: Uuid, title: &str, body: &str) -> Result<()> {
        tracing::info!(%recipient, title, body, "notification");
        Ok(())
    }

    async fn subscribe_to_topic(&self, user_id: Uuid, topic: &str) -> Result<()> {
        tracing::info!(%user_id, topic, "topic subscription");
        Ok(())
    }

    async fn send_to_topic(&self, topic: &str, title: &str, body: &str) -> Result<()> {
        tracing::info!(topic, title, body, "topic notification");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn failed_dispatch_is_swallowed() {
        let mut mock = MockNotifier::new();
        mock.expect_subscribe_to_topic()
            .times(1)
            .returning(|_, _| Err(Error::Internal("gateway down".to_string())));

        let handle = spawn_notification(
            Arc::new(mock),
            Notification::Subscribe {
                user_id: Uuid::new_v4(),
                topic: "event".to_string(),
            },
        );
        handle.await.expect("dispatch task panicked");
    }

    #[tokio::test]
    async fn topic_broadcast_reaches_notifier() {
        let mut mock = MockNotifier::new();
        mock.expect_send_to_topic()
            .withf(|topic, title, _| topic == "evt-1" && title == "Event Reminder: Demo day")
            .times(1)
            .returning(|_, _, _| Ok(()));

        spawn_notification(
            Arc::new(mock),
            Notification::Topic {
                topic: "evt-1".to_string(),
                title: "Event Reminder: Demo day".to_string(),
                body: "Starting soon".to_string(),
            },
        )
        .await
        .expect("dispatch task panicked");
    }

    #[tokio::test]
    async fn message_reaches_notifier() {
        let recipient = Uuid::new_v4();
        let mut mock = MockNotifier::new();
        mock.expect_send_notification()
            .withf(move |to, title, _| *to == recipient && title == "Event Invitation")
            .times(1)
            .returning(|_, _, _| Ok(()));

        spawn_notification(
            Arc::new(mock),
            Notification::Message {
                recipient,
                title: "Event Invitation".to_string(),
                body: "You have been invited".to_string(),
            },
        )
        .await
        .expect("dispatch task panicked");
    }
}
