//! Console delivery backend for local development.

use crate::adapter::{Adapter, DeliveryResponse};
use crate::config::DeliveryConfig;
use crate::email::Email;
use crate::error::Result;
use async_trait::async_trait;

/// Logs the email instead of sending it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleAdapter;

#[async_trait]
impl Adapter for ConsoleAdapter {
    fn handle_config(&self, config: DeliveryConfig) -> Result<DeliveryConfig> {
        Ok(config)
    }

    async fn deliver(&self, email: &Email, _config: &DeliveryConfig)
        -> Result<DeliveryResponse> {
        tracing::info!(
            from = %email.from_address().map(ToString::to_string).unwrap_or_default(),
            to = ?email.to.addresses(),
            subject = %email.subject.as_deref().unwrap_or("(no subject)"),
            "email delivered to console"
        );
        Ok(DeliveryResponse {
            status: None,
            message: "logged".to_string(),
        })
    }
}
