//! Outbound mail collaborator.
//!
//! Messages are fire-and-forget: callers log failures and move on, nothing is
//! retried.

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Configuration for the transactional mail endpoint.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Mail API endpoint, e.g. `"https://mail.example.com/v1/messages"`.
    pub endpoint: String,

    /// Bearer token for the mail API.
    pub token: String,

    /// Sender address placed on every message.
    pub sender: String,
}

#[automock]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send a plain-text message to a single recipient.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError>;
}

/// HTTP client for the transactional mail API.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    config: MailerConfig,
    http: Client,
}

impl HttpMailer {
    #[must_use]
    pub fn new(config: MailerConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        let message = OutboundMessage {
            from: &self.config.sender,
            to,
            subject,
            text: body,
        };

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.token)
            .json(&message)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(MailerError::UnexpectedResponse(format!(
                "send request failed with status {status}: {text}"
            )));
        }

        Ok(())
    }
}

/// Mailer that drops every message. Used when no mail endpoint is configured.
#[derive(Debug, Clone, Default)]
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), MailerError> {
        debug!(to, subject, "mailer not configured, dropping message");

        Ok(())
    }
}

/// Errors that can occur when talking to the mail API.
#[derive(Debug, Error)]
pub enum MailerError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The mail API returned a non-2xx response.
    #[error("unexpected response from mail API: {0}")]
    UnexpectedResponse(String),
}
