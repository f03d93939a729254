//! # Notification Dispatcher
//!
//! Best-effort confirmation emails after a transaction is recorded.
//!
//! ```text
//! create transaction ──► NotificationDispatcher::send(email, tx)
//!                              │ compose_confirmation (tienda-core)
//!                              ▼
//!                        MailTransport
//!                          ├── LogTransport        (default, logs the message)
//!                          └── HttpRelayTransport  (POST JSON to relay_url)
//! ```
//!
//! Delivery failures are logged at error level and never reach the caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tienda_core::receipt::{compose_confirmation, EmailMessage};
use tienda_core::Transaction;
use tracing::{error, info};

use crate::config::MailConfig;

/// Mail delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail relay request failed: {0}")]
    Relay(#[from] reqwest::Error),

    #[error("Mail relay rejected the message with status {0}")]
    Rejected(u16),

    #[error("Mail transport error: {0}")]
    Transport(String),
}

/// Something that can deliver an email.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

// =============================================================================
// Transports
// =============================================================================

/// Writes the message to the log instead of delivering it.
pub struct LogTransport {
    from: String,
}

impl LogTransport {
    pub fn new(from: impl Into<String>) -> Self {
        LogTransport { from: from.into() }
    }
}

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        info!(
            from = %self.from,
            to = %message.to,
            subject = %message.subject,
            bytes = message.html.len(),
            "Email (log transport)"
        );
        Ok(())
    }
}

/// JSON body accepted by the relay.
#[derive(Debug, Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// POSTs each message as JSON to an HTTP mail relay.
pub struct HttpRelayTransport {
    client: reqwest::Client,
    url: String,
    from: String,
}

impl HttpRelayTransport {
    pub fn new(url: impl Into<String>, from: impl Into<String>, timeout: Duration) -> Result<Self, MailError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpRelayTransport {
            client,
            url: url.into(),
            from: from.into(),
        })
    }
}

#[async_trait]
impl MailTransport for HttpRelayTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let payload = RelayPayload {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            html: &message.html,
        };

        let response = self.client.post(&self.url).json(&payload).send().await?;

        if !response.status().is_success() {
            return Err(MailError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Sends transaction confirmations through a [`MailTransport`].
#[derive(Clone)]
pub struct NotificationDispatcher {
    transport: Arc<dyn MailTransport>,
}

impl NotificationDispatcher {
    pub fn new(transport: Arc<dyn MailTransport>) -> Self {
        NotificationDispatcher { transport }
    }

    /// Picks the relay transport when a URL is configured, the log one otherwise.
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        let transport: Arc<dyn MailTransport> = match &config.relay_url {
            Some(url) => Arc::new(HttpRelayTransport::new(
                url.clone(),
                config.from.clone(),
                Duration::from_secs(config.timeout_secs),
            )?),
            None => Arc::new(LogTransport::new(config.from.clone())),
        };
        Ok(NotificationDispatcher::new(transport))
    }

    /// Sends the confirmation for `tx` to `recipient`. Never fails.
    pub async fn send(&self, recipient: &str, tx: &Transaction) {
        let message = compose_confirmation(recipient, tx);

        match self.transport.send(&message).await {
            Ok(()) => info!(to = %recipient, transaction = %tx.id, "Confirmation email sent"),
            Err(e) => error!(
                to = %recipient,
                transaction = %tx.id,
                error = %e,
                "Failed to send confirmation email"
            ),
        }
    }
}

// =============================================================================
// Test transports
// =============================================================================
