//! SMTP delivery backend.

use crate::adapter::{Adapter, DeliveryResponse};
use crate::config::DeliveryConfig;
use crate::email::Email;
use crate::encoder;
use crate::error::{ConfigError, Error, Result, SmtpError};
use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::debug;

/// Delivers email over SMTP, building the envelope and message bytes with
/// this crate's encoder and handing them to a lettre transport.
///
/// Config keys: `server` (required), `port` (default 587), `username` /
/// `password` (both or neither), `tls` (`starttls` default, `always`,
/// `never`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SmtpAdapter;

const REQUIRED_KEYS: &[&str] = &["server"];

#[async_trait]
impl Adapter for SmtpAdapter {
    fn handle_config(&self, config: DeliveryConfig) -> Result<DeliveryConfig> {
        config.require(REQUIRED_KEYS)?;

        let port = config.get_or("port", "587");
        if port.parse::<u16>().is_err() {
            return Err(Error::Config(ConfigError::Invalid(format!(
                "port {port} is not a number"
            ))));
        }
        match config.get_or("tls", "starttls").as_str() {
            "starttls" | "always" | "never" => {}
            other => {
                return Err(Error::Config(ConfigError::Invalid(format!(
                    "tls must be starttls, always or never, got {other}"
                ))))
            }
        }

        let mut config = config;
        if !config.contains("port") {
            config = config.set("port", "587");
        }
        if !config.contains("tls") {
            config = config.set("tls", "starttls");
        }
        Ok(config)
    }

    async fn deliver(&self, email: &Email, config: &DeliveryConfig)
        -> Result<DeliveryResponse> {
        let envelope = encoder::envelope(email)?;
        let message = encoder::render(email)?;

        let from = envelope.from.parse::<lettre::Address>().map_err(|e| {
            Error::Smtp(SmtpError {
                reason: format!("invalid envelope sender {}: {e}", envelope.from),
                response: None,
            })
        })?;
        let mut recipients = Vec::with_capacity(envelope.recipients.len());
        for recipient in &envelope.recipients {
            recipients.push(recipient.parse::<lettre::Address>().map_err(|e| {
                Error::Smtp(SmtpError {
                    reason: format!("invalid envelope recipient {recipient}: {e}"),
                    response: None,
                })
            })?);
        }
        let wire_envelope =
            lettre::address::Envelope::new(Some(from), recipients).map_err(|e| {
                Error::Smtp(SmtpError {
                    reason: format!("cannot build envelope: {e}"),
                    response: None,
                })
            })?;

        let transport = build_transport(config)?;
        let response = transport
            .send_raw(&wire_envelope, message.as_bytes())
            .await
            .map_err(|e| Error::Smtp(wrap_transport_error(&e)))?;

        debug!(code = %response.code(), "SMTP server accepted message");
        Ok(DeliveryResponse {
            status: response.code().to_string().parse().ok(),
            message: response.message().collect::<Vec<_>>().join(" "),
        })
    }
}

/// Build the lettre transport for the resolved config.
fn build_transport(
    config: &DeliveryConfig,
) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
    let server = config.get("server").ok_or_else(|| {
        Error::Config(ConfigError::MissingKeys {
            keys: vec!["server".to_string()],
            config: config.redacted(),
        })
    })?;
    let port = config
        .get_or("port", "587")
        .parse::<u16>()
        .map_err(|e| Error::Config(ConfigError::Invalid(format!("port: {e}"))))?;

    let mut builder = match config.get_or("tls", "starttls").as_str() {
        "always" => AsyncSmtpTransport::<Tokio1Executor>::relay(&server)
            .map_err(|e| Error::Smtp(wrap_transport_error(&e)))?,
        "starttls" => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&server)
            .map_err(|e| Error::Smtp(wrap_transport_error(&e)))?,
        _ => {
            let tls_params = TlsParameters::new(server.clone())
                .map_err(|e| Error::Smtp(wrap_transport_error(&e)))?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&server)
                .tls(Tls::Opportunistic(tls_params))
        }
    };

    builder = builder.port(port);

    if let (Some(user), Some(pass)) = (config.get("username"), config.get("password")) {
        builder = builder.credentials(Credentials::new(user, pass));
    }

    Ok(builder.build())
}

/// Collapse a lettre transport failure into the single SMTP error type,
/// keeping the server's status line when one was received.
fn wrap_transport_error(e: &lettre::transport::smtp::Error) -> SmtpError {
    let reason = if e.is_permanent() {
        format!("permanent rejection: {e}")
    } else if e.is_transient() {
        format!("transient rejection: {e}")
    } else if e.is_timeout() {
        format!("timed out: {e}")
    } else {
        format!("transport failure: {e}")
    };
    SmtpError {
        reason,
        response: e.status().map(|code| code.to_string()),
    }
}
