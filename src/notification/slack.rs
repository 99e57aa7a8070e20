//! A client for sending notifications to a Slack webhook.

use crate::notification::message::SlackMessage;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Url;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// Default time allowed for a single webhook request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a notification could not be delivered.
#[derive(Error, Debug)]
pub enum SlackError {
    #[error("failed to encode Slack message: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request to Slack failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(
        "Slack responded with status {status}: {}",
        .body.as_deref().unwrap_or("<empty body>")
    )]
    Protocol { status: u16, body: Option<String> },

    #[error("no tokio runtime available to dispatch the Slack message")]
    NoRuntime,
}

/// Delivers a message to a webhook URL.
///
/// The returned future resolves exactly once, to either success or a
/// [`SlackError`]. Implementations must not retry.
#[async_trait]
pub trait SlackTransport: Send + Sync {
    async fn deliver(&self, message: &SlackMessage, webhook_url: &Url) -> Result<(), SlackError>;
}

/// The production transport, backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct SlackClient {
    client: reqwest::Client,
}

impl SlackClient {
    /// Creates a new `SlackClient` with the default request timeout.
    pub fn new() -> Result<Self, SlackError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, SlackError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SlackTransport for SlackClient {
    /// Encodes the message as JSON and POSTs it to the webhook.
    #[instrument(skip_all, fields(attachments = message.attachments.len()))]
    async fn deliver(&self, message: &SlackMessage, webhook_url: &Url) -> Result<(), SlackError> {
        let body = serde_json::to_vec(message)?;

        let response = self
            .client
            .post(webhook_url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(status = %status, "Slack accepted notification.");
            return Ok(());
        }

        let body = response.text().await.ok().filter(|text| !text.is_empty());
        debug!(status = %status, body = ?body, "Slack rejected notification.");
        Err(SlackError::Protocol {
            status: status.as_u16(),
            body,
        })
    }
}
