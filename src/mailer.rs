//! The delivery orchestrator.

use crate::adapter::{Adapter, DeliveryResponse};
use crate::address::{AddressFormatter, DefaultFormatter};
use crate::config::DeliveryConfig;
use crate::console::ConsoleAdapter;
use crate::email::Email;
use crate::error::{ConfigError, Error, Result, ValidationError};
use crate::http_api::HttpApiAdapter;
use crate::smtp::SmtpAdapter;
use crate::strategy::{DeliveryHandle, DeliveryStrategy, TaskStrategy};
use std::sync::Arc;
use tracing::debug;

/// Outcome of a synchronous delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// The adapter accepted the email
    Sent {
        email: Email,
        response: DeliveryResponse,
    },
    /// No recipients remained, or an interceptor blocked the email.
    /// A deliberate no-send, not an error.
    Skipped { email: Email },
}

impl Delivery {
    /// The normalized email, whichever way dispatch went.
    #[must_use]
    pub fn email(&self) -> &Email {
        match self {
            Self::Sent { email, .. } | Self::Skipped { email } => email,
        }
    }

    #[must_use]
    pub const fn was_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// What an interceptor decided about an email.
pub enum Intercept {
    /// Keep going with this (possibly modified) email
    Continue(Email),
    /// Drop the email; treated as the no-send case
    Block,
}

/// Pre-dispatch hook running between normalization and the adapter call.
pub trait Interceptor: Send + Sync {
    fn call(&self, email: Email) -> Intercept;
}

enum Prepared {
    Ready(Email),
    Skip(Email),
}

/// Validates, normalizes and dispatches email through one adapter, either
/// on the caller's task or through a background strategy.
pub struct Mailer {
    adapter: Arc<dyn Adapter>,
    config: DeliveryConfig,
    strategy: Arc<dyn DeliveryStrategy>,
    formatter: Arc<dyn AddressFormatter>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("config", &self.config)
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

/// Assembles a [`Mailer`], validating the adapter config on `build`.
pub struct MailerBuilder {
    adapter: Arc<dyn Adapter>,
    config: DeliveryConfig,
    strategy: Arc<dyn DeliveryStrategy>,
    formatter: Arc<dyn AddressFormatter>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl MailerBuilder {
    #[must_use]
    pub fn new(adapter: Arc<dyn Adapter>, config: DeliveryConfig) -> Self {
        Self {
            adapter,
            config,
            strategy: Arc::new(TaskStrategy),
            formatter: Arc::new(DefaultFormatter),
            interceptors: Vec::new(),
        }
    }

    #[must_use]
    pub fn strategy(mut self, strategy: Arc<dyn DeliveryStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn formatter(mut self, formatter: Arc<dyn AddressFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    #[must_use]
    pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Run the adapter's config validation and produce the mailer.
    pub fn build(self) -> Result<Mailer> {
        let config = self.adapter.handle_config(self.config)?;
        Ok(Mailer {
            adapter: self.adapter,
            config,
            strategy: self.strategy,
            formatter: self.formatter,
            interceptors: self.interceptors,
        })
    }
}

impl Mailer {
    #[must_use]
    pub fn builder(adapter: Arc<dyn Adapter>, config: DeliveryConfig) -> MailerBuilder {
        MailerBuilder::new(adapter, config)
    }

    /// Build the mailer from config alone, selecting the adapter by the
    /// config's `adapter` key.
    ///
    /// The test adapter is not constructible here; it needs an explicit
    /// mailbox handle, so tests assemble it through [`Mailer::builder`].
    pub fn from_config(config: DeliveryConfig) -> Result<Self> {
        let adapter: Arc<dyn Adapter> = match config.adapter.as_str() {
            "smtp" => Arc::new(SmtpAdapter),
            "http" => Arc::new(HttpApiAdapter::new()),
            "console" => Arc::new(ConsoleAdapter),
            "test" => {
                return Err(Error::Config(ConfigError::Invalid(
                    "the test adapter needs a mailbox; build it via Mailer::builder"
                        .to_string(),
                )))
            }
            other => {
                return Err(Error::Config(ConfigError::UnknownAdapter(
                    other.to_string(),
                )))
            }
        };
        Self::builder(adapter, config).build()
    }

    /// The validated config the mailer dispatches with.
    #[must_use]
    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// Deliver on the caller's task and return the adapter's result.
    pub async fn deliver_now(&self, email: Email) -> Result<Delivery> {
        match self.prepare(email)? {
            Prepared::Skip(email) => Ok(Delivery::Skipped { email }),
            Prepared::Ready(email) => {
                let response = self.adapter.deliver(&email, &self.config).await?;
                Ok(Delivery::Sent { email, response })
            }
        }
    }

    /// Validate and normalize synchronously, then hand the send to the
    /// background strategy. Only pre-dispatch errors surface here; failures
    /// inside the background work are the strategy's concern.
    pub async fn deliver_later(&self, email: Email) -> Result<DeliveryHandle> {
        match self.prepare(email)? {
            Prepared::Skip(_) => Ok(DeliveryHandle::completed()),
            Prepared::Ready(email) => {
                let handle = self
                    .strategy
                    .deliver_later(Arc::clone(&self.adapter), email, self.config.clone())
                    .await;
                Ok(handle)
            }
        }
    }

    /// Shared pre-dispatch pipeline: validate, normalize, intercept,
    /// short-circuit on empty recipients.
    fn prepare(&self, email: Email) -> Result<Prepared> {
        if !email.attachments.is_empty() && !self.adapter.supports_attachments() {
            return Err(Error::Validation(ValidationError::AttachmentsNotSupported));
        }

        let mut email = email.normalize(self.formatter.as_ref())?;

        for interceptor in &self.interceptors {
            match interceptor.call(email.clone()) {
                Intercept::Continue(next) => email = next,
                Intercept::Block => {
                    debug!("email blocked by interceptor, skipping delivery");
                    return Ok(Prepared::Skip(email));
                }
            }
        }

        if email.has_no_recipients() {
            debug!("no recipients after normalization, skipping delivery");
            return Ok(Prepared::Skip(email));
        }

        Ok(Prepared::Ready(email))
    }
}
