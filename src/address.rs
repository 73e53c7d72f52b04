//! Canonical addresses and recipient normalization.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical address: an optional display name and a bare email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub name: Option<String>,
    pub address: String,
}

impl Address {
    /// Bare address with no display name.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            name: None,
            address: address.into(),
        }
    }

    /// Address with a display name.
    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            address: address.into(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

/// The position a recipient occupies in the email, passed to formatters so
/// custom implementations may vary output per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    From,
    To,
    Cc,
    Bcc,
}

impl Role {
    #[must_use]
    pub const fn header_name(self) -> &'static str {
        match self {
            Self::From => "From",
            Self::To => "To",
            Self::Cc => "Cc",
            Self::Bcc => "Bcc",
        }
    }
}

/// A recipient as supplied by the caller, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// A plain address string
    Bare(String),
    /// A display name and address pair
    Named { name: String, address: String },
    /// Already in canonical form
    Resolved(Address),
}

/// Conversion from a caller-side value to a single [`Recipient`].
///
/// Custom address-bearing types opt into the pipeline by implementing this;
/// the conversion is selected at compile time rather than through a runtime
/// type registry.
pub trait IntoRecipient {
    fn into_recipient(self) -> Recipient;
}

impl IntoRecipient for Recipient {
    fn into_recipient(self) -> Recipient {
        self
    }
}

impl IntoRecipient for &str {
    fn into_recipient(self) -> Recipient {
        Recipient::Bare(self.to_string())
    }
}

impl IntoRecipient for String {
    fn into_recipient(self) -> Recipient {
        Recipient::Bare(self)
    }
}

impl IntoRecipient for Address {
    fn into_recipient(self) -> Recipient {
        Recipient::Resolved(self)
    }
}

impl<N: Into<String>, A: Into<String>> IntoRecipient for (N, A) {
    fn into_recipient(self) -> Recipient {
        Recipient::Named {
            name: self.0.into(),
            address: self.1.into(),
        }
    }
}

/// Conversion from a caller-side value to a recipient list.
///
/// Single values yield one-element lists; vectors and arrays of anything
/// convertible map element-wise.
pub trait IntoRecipients {
    fn into_recipients(self) -> Vec<Recipient>;
}

impl IntoRecipients for Recipient {
    fn into_recipients(self) -> Vec<Recipient> {
        vec![self]
    }
}

impl IntoRecipients for &str {
    fn into_recipients(self) -> Vec<Recipient> {
        vec![self.into_recipient()]
    }
}

impl IntoRecipients for String {
    fn into_recipients(self) -> Vec<Recipient> {
        vec![self.into_recipient()]
    }
}

impl IntoRecipients for Address {
    fn into_recipients(self) -> Vec<Recipient> {
        vec![self.into_recipient()]
    }
}

impl<N: Into<String>, A: Into<String>> IntoRecipients for (N, A) {
    fn into_recipients(self) -> Vec<Recipient> {
        vec![self.into_recipient()]
    }
}

impl<T: IntoRecipient> IntoRecipients for Vec<T> {
    fn into_recipients(self) -> Vec<Recipient> {
        self.into_iter().map(IntoRecipient::into_recipient).collect()
    }
}

impl<T: IntoRecipient, const N: usize> IntoRecipients for [T; N] {
    fn into_recipients(self) -> Vec<Recipient> {
        self.into_iter().map(IntoRecipient::into_recipient).collect()
    }
}

/// Reduces one [`Recipient`] to its canonical [`Address`].
///
/// Pure: no side effects, and formatting an already-canonical address must
/// return it unchanged. The role is informational; the default formatter
/// ignores it.
pub trait AddressFormatter: Send + Sync {
    fn format(&self, recipient: &Recipient, role: Role)
        -> Result<Address, ValidationError>;
}

/// Formatter used unless a mailer is built with a custom one.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

impl AddressFormatter for DefaultFormatter {
    fn format(
        &self,
        recipient: &Recipient,
        _role: Role,
    ) -> Result<Address, ValidationError> {
        match recipient {
            Recipient::Bare(address) => {
                let address = address.trim();
                if address.is_empty() {
                    return Err(ValidationError::UnformattableAddress(
                        "an empty string".to_string(),
                    ));
                }
                Ok(Address::new(address))
            }
            Recipient::Named { name, address } => {
                let address = address.trim();
                if address.is_empty() {
                    return Err(ValidationError::UnformattableAddress(format!(
                        "a named pair ({name:?}) with an empty address"
                    )));
                }
                let name = name.trim();
                if name.is_empty() {
                    Ok(Address::new(address))
                } else {
                    Ok(Address::with_name(name, address))
                }
            }
            Recipient::Resolved(address) => {
                if address.address.is_empty() {
                    return Err(ValidationError::UnformattableAddress(
                        "a resolved address with an empty address field".to_string(),
                    ));
                }
                Ok(address.clone())
            }
        }
    }
}
