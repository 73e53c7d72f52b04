//! Background delivery strategies.

use crate::adapter::Adapter;
use crate::config::DeliveryConfig;
use crate::email::Email;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Handle returned by `deliver_later`. Exists for awaiting the background
/// work, not for cancelling it.
#[derive(Debug)]
pub struct DeliveryHandle {
    inner: Option<JoinHandle<()>>,
}

impl DeliveryHandle {
    pub(crate) fn spawned(handle: JoinHandle<()>) -> Self {
        Self {
            inner: Some(handle),
        }
    }

    /// Handle for work that already finished before the strategy returned.
    #[must_use]
    pub(crate) const fn completed() -> Self {
        Self { inner: None }
    }

    /// Wait for the background delivery to finish. A panicked task resolves
    /// here instead of propagating.
    pub async fn join(self) {
        if let Some(handle) = self.inner {
            let _ = handle.await;
        }
    }
}

/// Executes an adapter call outside the caller's synchronous path.
///
/// A strategy must eventually invoke `adapter.deliver` exactly once per
/// accepted email; what happens between accepting and delivering (queueing,
/// batching) is its own business.
#[async_trait]
pub trait DeliveryStrategy: Send + Sync {
    async fn deliver_later(
        &self,
        adapter: Arc<dyn Adapter>,
        email: Email,
        config: DeliveryConfig,
    ) -> DeliveryHandle;
}

/// Default strategy: one detached tokio task per email.
///
/// Failures inside the task are logged and dropped; the caller has already
/// returned by the time they occur.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskStrategy;

#[async_trait]
impl DeliveryStrategy for TaskStrategy {
    async fn deliver_later(
        &self,
        adapter: Arc<dyn Adapter>,
        email: Email,
        config: DeliveryConfig,
    ) -> DeliveryHandle {
        let handle = tokio::spawn(async move {
            match adapter.deliver(&email, &config).await {
                Ok(response) => {
                    debug!(message = %response.message, "background delivery done");
                }
                Err(e) => {
                    error!(error = %e, "background delivery failed");
                }
            }
        });
        DeliveryHandle::spawned(handle)
    }
}

/// Strategy for tests: performs the delivery before returning, so the email
/// is observable (e.g. in the test mailbox) immediately after the call.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestStrategy;

#[async_trait]
impl DeliveryStrategy for TestStrategy {
    async fn deliver_later(
        &self,
        adapter: Arc<dyn Adapter>,
        email: Email,
        config: DeliveryConfig,
    ) -> DeliveryHandle {
        if let Err(e) = adapter.deliver(&email, &config).await {
            error!(error = %e, "inline delivery failed");
        }
        DeliveryHandle::completed()
    }
}
