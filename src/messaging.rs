use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;

use crate::domain::{Channel, RecordId};
use crate::error::RosterError;

/// Bulk messaging collaborator. One call carries the whole recipient list;
/// per-recipient delivery is the service's concern, so the ack/nack is a
/// single outcome.
pub trait MessagingClient: Send + Sync {
    fn send_bulk_message(
        &self,
        recipients: &[RecordId],
        channel: Channel,
        subject: Option<&str>,
        body: &str,
    ) -> Result<(), RosterError>;
}

#[derive(Debug, Serialize)]
struct BulkMessagePayload<'a> {
    recipient_ids: &'a [RecordId],
    channel: Channel,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<&'a str>,
    body: &'a str,
}

#[derive(Clone)]
pub struct HttpMessagingClient {
    client: Client,
    base_url: String,
}

impl HttpMessagingClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RosterError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("flock-rm/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| RosterError::MessagingHttp(err.to_string()))?,
        );
        if let Ok(token) = std::env::var("FLOCK_API_TOKEN") {
            if !token.trim().is_empty() {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                        .map_err(|err| RosterError::MessagingHttp(err.to_string()))?,
                );
            }
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| RosterError::MessagingHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl MessagingClient for HttpMessagingClient {
    fn send_bulk_message(
        &self,
        recipients: &[RecordId],
        channel: Channel,
        subject: Option<&str>,
        body: &str,
    ) -> Result<(), RosterError> {
        let url = format!("{}/messages/bulk", self.base_url);
        let payload = BulkMessagePayload {
            recipient_ids: recipients,
            channel,
            subject,
            body,
        };
        tracing::debug!(recipients = recipients.len(), %channel, "dispatching bulk message");
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .map_err(|err| RosterError::MessagingHttp(err.to_string()))?;

        let status = response.status().as_u16();
        if matches!(status, 401 | 403) {
            let message = response
                .text()
                .unwrap_or_else(|_| "authorization rejected".to_string());
            return Err(RosterError::AuthExpired(message));
        }
        if !response.status().is_success() {
            let message = response
                .text()
                .unwrap_or_else(|_| "bulk message rejected".to_string());
            return Err(RosterError::MessagingStatus { status, message });
        }
        Ok(())
    }
}
