//! The contract every delivery backend implements.

use crate::config::DeliveryConfig;
use crate::email::Email;
use crate::error::Result;
use async_trait::async_trait;

/// What a backend reports after accepting an email.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeliveryResponse {
    /// Protocol status code, when the backend has one
    pub status: Option<u16>,
    pub message: String,
}

/// Abstract interface for delivering email. Swappable per environment.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Validate required keys and return the config, possibly enriched with
    /// defaults. Runs once when the mailer is built, before any delivery.
    fn handle_config(&self, config: DeliveryConfig) -> Result<DeliveryConfig>;

    /// Perform the send. Ordinary provider-side rejections come back as
    /// typed errors, never panics.
    async fn deliver(&self, email: &Email, config: &DeliveryConfig)
        -> Result<DeliveryResponse>;

    /// Whether the backend can carry binary attachments. The orchestrator
    /// and wrapper adapters consult this before dispatch.
    fn supports_attachments(&self) -> bool {
        true
    }
}
