use std::env;

use serde::{Deserialize, Serialize};

use agora_utils::constants::{DEFAULT_SITE_NAME, DEFAULT_SITE_URL};
use agora_utils::errors::AppError;
use agora_utils::routes::{SITE_NAME_ENV, SITE_URL_ENV};

pub const EMAIL_NOTIFICATIONS_ENABLED_ENV: &str = "EMAIL_NOTIFICATIONS_ENABLED";
pub const SMTP2GO_API_KEY_ENV: &str = "SMTP2GO_API_KEY";
pub const SMTP2GO_API_URL_ENV: &str = "SMTP2GO_API_URL";
pub const SMTP2GO_FROM_EMAIL_ENV: &str = "SMTP2GO_FROM_EMAIL";

pub const DEFAULT_SMTP2GO_API_URL: &str = "https://api.smtp2go.com/v3/email/send";
pub const DEFAULT_FROM_EMAIL: &str = "noreply@agora.local";

/// Settings of the email notifications, read once and passed to every notification call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub is_enabled: bool,
    pub api_key: String,
    pub api_url: String,
    pub from_email: String,
    pub site_url: String,
    pub site_name: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            is_enabled: false,
            api_key: String::new(),
            api_url: String::from(DEFAULT_SMTP2GO_API_URL),
            from_email: String::from(DEFAULT_FROM_EMAIL),
            site_url: String::from(DEFAULT_SITE_URL),
            site_name: String::from(DEFAULT_SITE_NAME),
        }
    }
}

impl NotificationConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let site_url = get_env_or_default(SITE_URL_ENV, DEFAULT_SITE_URL);
        if let Err(e) = url::Url::parse(&site_url) {
            return Err(AppError::ConfigurationError(format!("Invalid {SITE_URL_ENV} '{site_url}': {e}")))
        }
        let config = Self {
            is_enabled: env::var(EMAIL_NOTIFICATIONS_ENABLED_ENV).is_ok_and(|value| is_truthy(&value)),
            api_key: get_env_or_default(SMTP2GO_API_KEY_ENV, ""),
            api_url: get_env_or_default(SMTP2GO_API_URL_ENV, DEFAULT_SMTP2GO_API_URL),
            from_email: get_env_or_default(SMTP2GO_FROM_EMAIL_ENV, DEFAULT_FROM_EMAIL),
            site_url,
            site_name: get_env_or_default(SITE_NAME_ENV, DEFAULT_SITE_NAME),
        };
        if config.is_enabled && config.api_key.is_empty() {
            log::warn!("{EMAIL_NOTIFICATIONS_ENABLED_ENV} is set but {SMTP2GO_API_KEY_ENV} is empty, emails will not be sent.");
        }
        Ok(config)
    }

    /// Emails are only delivered when notifications are enabled and an api key is available.
    pub fn is_delivery_enabled(&self) -> bool {
        self.is_enabled && !self.api_key.trim().is_empty()
    }
}

fn get_env_or_default(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => String::from(value.trim()),
        _ => String::from(default),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
