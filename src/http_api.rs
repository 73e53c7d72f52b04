//! Generic JSON-over-HTTP delivery backend.

use crate::adapter::{Adapter, DeliveryResponse};
use crate::address::Address;
use crate::config::DeliveryConfig;
use crate::email::Email;
use crate::error::{ApiError, Error, Result};
use async_trait::async_trait;
use base64::prelude::*;
use serde_json::json;
use tracing::debug;

/// Posts the composed email as JSON to a configured endpoint.
///
/// Provider-specific field mapping lives outside this crate; this backend
/// ships the canonical shape and exists so HTTP delivery, its error
/// surface and secret redaction are exercised end to end.
///
/// Config keys: `endpoint` (required), `api_key` (required), sent as a
/// bearer token.
pub struct HttpApiAdapter {
    client: reqwest::Client,
}

const REQUIRED_KEYS: &[&str] = &["endpoint", "api_key"];

impl HttpApiAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpApiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for HttpApiAdapter {
    fn handle_config(&self, config: DeliveryConfig) -> Result<DeliveryConfig> {
        config.require(REQUIRED_KEYS)?;
        Ok(config)
    }

    async fn deliver(&self, email: &Email, config: &DeliveryConfig)
        -> Result<DeliveryResponse> {
        let endpoint = config.get_or("endpoint", "");
        let api_key = config.get_or("api_key", "");

        let body = request_body(email);
        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                Error::Api(ApiError {
                    status: None,
                    headers: Vec::new(),
                    body: redact(&e.to_string(), &api_key),
                })
            })?;

        let status = response.status();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let text = response.text().await.unwrap_or_default();

        if status.is_success() {
            debug!(status = status.as_u16(), "provider accepted message");
            Ok(DeliveryResponse {
                status: Some(status.as_u16()),
                message: text,
            })
        } else {
            Err(Error::Api(ApiError {
                status: Some(status.as_u16()),
                headers,
                body: redact(&text, &api_key),
            }))
        }
    }
}

fn request_body(email: &Email) -> serde_json::Value {
    json!({
        "from": email.from_address().map(address_json),
        "to": email.to.addresses().iter().map(address_json).collect::<Vec<_>>(),
        "cc": email.cc.addresses().iter().map(address_json).collect::<Vec<_>>(),
        "bcc": email.bcc.addresses().iter().map(address_json).collect::<Vec<_>>(),
        "subject": email.subject,
        "text_body": email.text_body,
        "html_body": email.html_body,
        "headers": email.headers,
        "attachments": email
            .attachments
            .iter()
            .map(|attachment| {
                json!({
                    "filename": attachment.filename,
                    "content_type": attachment.content_type,
                    "content_id": attachment.content_id,
                    "data": BASE64_STANDARD.encode(&attachment.data),
                })
            })
            .collect::<Vec<_>>(),
    })
}

fn address_json(address: &Address) -> serde_json::Value {
    json!({ "name": address.name, "address": address.address })
}

/// Strip the API key from any echoed diagnostic text.
fn redact(text: &str, api_key: &str) -> String {
    if api_key.is_empty() {
        text.to_string()
    } else {
        text.replace(api_key, "[REDACTED]")
    }
}
