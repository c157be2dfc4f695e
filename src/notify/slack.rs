use eyre::Result;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::chain::Notification;

/// Channel used when `SLACK_CHANNEL` is not set
const DEFAULT_CHANNEL: &str = "#oracle-arb";

/// Slack notifier
#[derive(Debug)]
pub struct SlackNotifier {
    /// The Slack OAuth token
    token: String,
    /// Channel messages are posted to
    channel: String,
    /// The HTTP client
    client: Client,
}

impl SlackNotifier {
    /// Create a new Slack notifier from `SLACK_OAUTH_TOKEN` and optional `SLACK_CHANNEL`
    ///
    /// # Errors
    /// * If `SLACK_OAUTH_TOKEN` is not set
    /// * If the HTTP client cannot be built
    pub fn new() -> Result<Self> {
        let token = std::env::var("SLACK_OAUTH_TOKEN")
            .map_err(|_| eyre::eyre!("SLACK_OAUTH_TOKEN not set"))?;
        let channel =
            std::env::var("SLACK_CHANNEL").unwrap_or_else(|_| DEFAULT_CHANNEL.to_string());

        // Create a client with a timeout
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            token,
            channel,
            client,
        })
    }

    /// Send a message to the configured channel
    ///
    /// # Errors
    /// * If the request fails or Slack answers with an error
    pub async fn send(&self, msg: &str) -> Result<()> {
        let payload = json!({
            "channel": self.channel,
            "text": msg,
            "username": "Oracle Arb",
            "icon_emoji": ":scales:"
        });

        let response = self
            .client
            .post("https://slack.com/api/chat.postMessage")
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?
            .json::<serde_json::Value>()
            .await?;

        // Check if Slack API returned success
        if !response["ok"].as_bool().unwrap_or(false) {
            return Err(eyre::eyre!(
                "Slack API error: {}",
                response["error"].as_str().unwrap_or("unknown error")
            ));
        }

        Ok(())
    }

    /// Post committed notifications as one message. Does nothing when there are none.
    ///
    /// # Errors
    /// * If the message cannot be delivered
    pub async fn publish(&self, notifications: &[Notification]) -> Result<()> {
        match format_notifications(notifications) {
            Some(msg) => self.send(&msg).await,
            None => Ok(()),
        }
    }

    /// Send an error message
    ///
    /// # Errors
    /// * If the message cannot be delivered
    pub async fn send_error(&self, error: &str) -> Result<()> {
        self.send(&format!(":warning: Error: {error}")).await
    }
}

/// One line per notification, or `None` if there is nothing to say
fn format_notifications(notifications: &[Notification]) -> Option<String> {
    if notifications.is_empty() {
        return None;
    }
    Some(
        notifications
            .iter()
            .map(|n| format!("• {n}"))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;

    use super::*;
    use crate::arb::test_helpers::address;

    #[test]
    fn test_format_notifications() {
        assert_eq!(format_notifications(&[]), None);

        let recipient = address("recipient");
        let msg = format_notifications(&[
            Notification::FeesPaid {
                recipient,
                amount: U256::from(5),
            },
            Notification::EtherWithdrawn {
                recipient,
                amount: U256::from(1),
            },
        ])
        .unwrap_or_default();

        assert_eq!(msg.lines().count(), 2);
        assert!(msg.starts_with("• FeesPaid("));
    }
}
