//! Recipient-rewriting wrapper backend.

use crate::adapter::{Adapter, DeliveryResponse};
use crate::address::Address;
use crate::config::DeliveryConfig;
use crate::email::{Email, RecipientField};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Wraps another adapter and rewrites the sender and/or recipients to
/// fixed overrides before delegating. Useful for staging environments
/// where real recipient addresses must never be contacted.
pub struct RewriteAdapter {
    inner: Arc<dyn Adapter>,
    to_override: Option<Address>,
    from_override: Option<Address>,
}

impl RewriteAdapter {
    #[must_use]
    pub fn new(inner: Arc<dyn Adapter>) -> Self {
        Self {
            inner,
            to_override: None,
            from_override: None,
        }
    }

    /// Route every email to this address instead; cc and bcc are emptied.
    #[must_use]
    pub fn to_override(mut self, address: Address) -> Self {
        self.to_override = Some(address);
        self
    }

    #[must_use]
    pub fn from_override(mut self, address: Address) -> Self {
        self.from_override = Some(address);
        self
    }
}

#[async_trait]
impl Adapter for RewriteAdapter {
    fn handle_config(&self, config: DeliveryConfig) -> Result<DeliveryConfig> {
        self.inner.handle_config(config)
    }

    async fn deliver(&self, email: &Email, config: &DeliveryConfig)
        -> Result<DeliveryResponse> {
        let mut email = email.clone();
        if let Some(to) = &self.to_override {
            debug!(to = %to, "rewriting recipients");
            email.to = RecipientField::Resolved(vec![to.clone()]);
            email.cc = RecipientField::Resolved(Vec::new());
            email.bcc = RecipientField::Resolved(Vec::new());
        }
        if let Some(from) = &self.from_override {
            email.from = RecipientField::Resolved(vec![from.clone()]);
        }
        self.inner.deliver(&email, config).await
    }

    fn supports_attachments(&self) -> bool {
        self.inner.supports_attachments()
    }
}
