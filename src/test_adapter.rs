//! In-process delivery backend for deterministic tests.

use crate::adapter::{Adapter, DeliveryResponse};
use crate::config::DeliveryConfig;
use crate::email::Email;
use crate::error::Result;
use crate::mailbox::TestMailbox;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Records every delivered email in a [`TestMailbox`] instead of sending
/// it anywhere, optionally notifying an observer channel per delivery.
pub struct TestAdapter {
    mailbox: Arc<TestMailbox>,
    notify: Option<mpsc::UnboundedSender<Email>>,
}

impl TestAdapter {
    #[must_use]
    pub fn new(mailbox: Arc<TestMailbox>) -> Self {
        Self {
            mailbox,
            notify: None,
        }
    }

    /// Also send each delivered email to the given observer channel.
    #[must_use]
    pub fn with_notifier(
        mailbox: Arc<TestMailbox>,
        notify: mpsc::UnboundedSender<Email>,
    ) -> Self {
        Self {
            mailbox,
            notify: Some(notify),
        }
    }
}

#[async_trait]
impl Adapter for TestAdapter {
    fn handle_config(&self, config: DeliveryConfig) -> Result<DeliveryConfig> {
        Ok(config)
    }

    async fn deliver(&self, email: &Email, _config: &DeliveryConfig)
        -> Result<DeliveryResponse> {
        let record = self.mailbox.push(email.clone());
        if let Some(notify) = &self.notify {
            let _ = notify.send(record.email.clone());
        }
        Ok(DeliveryResponse {
            status: None,
            message: record.id,
        })
    }
}
