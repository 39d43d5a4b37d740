use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use agora_utils::errors::AppError;

use crate::config::NotificationConfig;

pub const EMAIL_API_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivers a single plain-text email. Implementations report failures by returning `false`, they never panic or raise.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, recipient_address: &str, subject: &str, body: &str) -> bool;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Smtp2GoPayload {
    pub api_key: String,
    pub sender: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text_body: String,
}

/// Sends emails through the SMTP2GO http api.
#[derive(Clone, Debug)]
pub struct Smtp2GoTransport {
    api_key: String,
    api_url: String,
    sender: String,
    http_client: reqwest::Client,
}

impl Smtp2GoPayload {
    pub fn new(api_key: &str, sender: &str, recipient_address: &str, subject: &str, body: &str) -> Self {
        Self {
            api_key: String::from(api_key),
            sender: String::from(sender),
            to: vec![String::from(recipient_address)],
            subject: String::from(subject),
            text_body: String::from(body),
        }
    }
}

impl Smtp2GoTransport {
    pub fn from_config(config: &NotificationConfig) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .timeout(EMAIL_API_TIMEOUT)
            .build()?;
        Ok(Self {
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            sender: config.from_email.clone(),
            http_client,
        })
    }

    async fn post_email(&self, payload: &Smtp2GoPayload) -> Result<(), AppError> {
        let response = self.http_client
            .post(&self.api_url)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let response_text = response.text().await.unwrap_or_default();
            return Err(AppError::TransportError(format!("Email api returned {status}: {response_text}")))
        }
        Ok(())
    }
}

#[async_trait]
impl EmailTransport for Smtp2GoTransport {
    async fn send(&self, recipient_address: &str, subject: &str, body: &str) -> bool {
        let payload = Smtp2GoPayload::new(&self.api_key, &self.sender, recipient_address, subject, body);
        match self.post_email(&payload).await {
            Ok(()) => {
                log::debug!("Sent email '{subject}' to {recipient_address}");
                true
            },
            Err(e) => {
                log::error!("Failed to send email '{subject}' to {recipient_address}: {e}");
                false
            },
        }
    }
}
