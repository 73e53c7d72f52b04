//! Compose outbound email once, deliver through swappable backends.
//!
//! An [`Email`] is built from chained with-methods, normalized to
//! canonical addresses, and dispatched by a [`Mailer`] through whichever
//! [`Adapter`] the [`DeliveryConfig`] selects: raw SMTP, an HTTP provider
//! API, the console, or an in-memory [`TestMailbox`] for assertions.
//! Delivery runs on the caller's task (`deliver_now`) or through a
//! pluggable background [`DeliveryStrategy`] (`deliver_later`).

mod adapter;
mod address;
mod config;
mod console;
mod email;
pub mod encoder;
mod error;
mod http_api;
mod mailbox;
mod mailer;
mod rewrite;
mod smtp;
mod strategy;
mod test_adapter;

pub use adapter::{Adapter, DeliveryResponse};
pub use address::{
    Address, AddressFormatter, DefaultFormatter, IntoRecipient, IntoRecipients,
    Recipient, Role,
};
pub use config::{DeliveryConfig, Setting};
pub use console::ConsoleAdapter;
pub use email::{Attachment, Email, HeaderValue, RecipientField};
pub use encoder::SmtpEnvelope;
pub use error::{
    ApiError, ConfigError, Error, MailboxError, Result, SmtpError, ValidationError,
};
pub use http_api::HttpApiAdapter;
pub use mailbox::{SentEmail, TestMailbox};
pub use mailer::{Delivery, Intercept, Interceptor, Mailer, MailerBuilder};
pub use rewrite::RewriteAdapter;
pub use smtp::SmtpAdapter;
pub use strategy::{DeliveryHandle, DeliveryStrategy, TaskStrategy, TestStrategy};
pub use test_adapter::TestAdapter;
