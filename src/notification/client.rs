//! The HTTP client for the WhatsApp messaging provider.

use std::{env, time::Duration};

use serde::Serialize;

use crate::Error;

/// The provider's API root used when `WHATSAPP_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "https://api.ultramsg.com";

/// How long to wait for the provider before giving up on a message.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Credentials and location of the messaging provider.
#[derive(Debug, Clone, PartialEq)]
pub struct WhatsAppConfig {
    /// The provider's API root, e.g. "https://api.ultramsg.com".
    pub api_url: String,
    /// The instance identifier that is templated into the endpoint path.
    pub instance_id: String,
    /// The bearer token for the instance.
    pub token: String,
}

impl WhatsAppConfig {
    /// Load the config from env vars:
    /// - `WHATSAPP_INSTANCE_ID` (required)
    /// - `WHATSAPP_TOKEN` (required)
    /// - `WHATSAPP_API_URL` (default: [DEFAULT_API_URL])
    ///
    /// Returns `None` if either required variable is missing or blank, which
    /// disables notifications.
    pub fn from_env() -> Option<Self> {
        let instance_id = non_blank_var("WHATSAPP_INSTANCE_ID")?;
        let token = non_blank_var("WHATSAPP_TOKEN")?;
        let api_url = non_blank_var("WHATSAPP_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_owned());

        Some(Self {
            api_url,
            instance_id,
            token,
        })
    }

    /// The URL that messages are posted to.
    pub fn message_endpoint(&self) -> String {
        format!(
            "{}/{}/messages/chat",
            self.api_url.trim_end_matches('/'),
            self.instance_id
        )
    }
}

fn non_blank_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    to: &'a str,
    body: &'a str,
}

/// Sends text messages through the provider.
///
/// Cloning is cheap, the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct WhatsAppClient {
    http: reqwest::Client,
    config: WhatsAppConfig,
}

impl WhatsAppClient {
    /// Create a client whose requests time out after [SEND_TIMEOUT].
    ///
    /// # Errors
    /// Returns [Error::NotificationFailed] if the HTTP client cannot be built.
    pub fn new(config: WhatsAppConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|error| {
                Error::NotificationFailed(format!("could not build HTTP client: {error}"))
            })?;

        Ok(Self { http, config })
    }

    /// Send `body` to the WhatsApp number `to` (digits only).
    ///
    /// # Errors
    /// Returns [Error::NotificationFailed] if the request could not be sent, timed
    /// out or the provider responded with a non-success status.
    pub async fn send_message(&self, to: &str, body: &str) -> Result<(), Error> {
        let endpoint = self.config.message_endpoint();

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.config.token)
            .json(&SendMessageRequest { to, body })
            .send()
            .await
            .map_err(|error| Error::NotificationFailed(format!("POST {endpoint} failed: {error}")))?;

        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::NotificationFailed(format!(
                "provider responded with {status}: {text}"
            )));
        }

        tracing::debug!("Sent WhatsApp message to {}", mask_number(to));

        Ok(())
    }
}

/// Hide all but the last four digits of a phone number for logging.
pub fn mask_number(number: &str) -> String {
    let visible_from = number.len().saturating_sub(4);

    number
        .char_indices()
        .map(|(i, c)| if i < visible_from { '*' } else { c })
        .collect()
}
