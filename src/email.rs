//! The email value model.

use crate::address::{Address, AddressFormatter, IntoRecipient, IntoRecipients, Role};
use crate::error::{Error, Result, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One participant field of an email.
///
/// Starts `Unset` or `Pending`; normalization reduces every field to
/// `Resolved`. After normalization `cc` and `bcc` may hold empty lists but
/// are never `Unset` again.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum RecipientField {
    #[default]
    Unset,
    Pending(Vec<crate::address::Recipient>),
    Resolved(Vec<Address>),
}

impl RecipientField {
    #[must_use]
    pub const fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Canonical addresses, empty unless the field has been resolved.
    #[must_use]
    pub fn addresses(&self) -> &[Address] {
        match self {
            Self::Resolved(addresses) => addresses,
            _ => &[],
        }
    }
}

/// A header value: most headers carry one string, a few (e.g. `Received`)
/// carry several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Single(String),
    Multiple(Vec<String>),
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multiple(values)
    }
}

impl HeaderValue {
    /// All values, regardless of arity.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        match self {
            Self::Single(value) => std::slice::from_ref(value).iter(),
            Self::Multiple(values) => values.iter(),
        }
        .map(String::as_str)
    }
}

/// A file carried by an email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
    /// When set, the attachment is embeddable inline and referenced from
    /// an HTML body as `cid:<content_id>`
    pub content_id: Option<String>,
    /// Extra MIME part headers
    pub headers: Vec<(String, String)>,
}

impl Attachment {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data,
            content_id: None,
            headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn content_id(mut self, cid: impl Into<String>) -> Self {
        self.content_id = Some(cid.into());
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// An outbound email message.
///
/// Built by chained methods that consume and return the value; each pipeline
/// stage produces a new `Email` rather than mutating a shared one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Email {
    pub from: RecipientField,
    pub to: RecipientField,
    pub cc: RecipientField,
    pub bcc: RecipientField,
    pub subject: Option<String>,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
    pub headers: HashMap<String, HeaderValue>,
    /// Most recently added first
    pub attachments: Vec<Attachment>,
    /// Render-time assigns, stripped before test mailbox storage
    pub assigns: HashMap<String, serde_json::Value>,
    /// Adapter- and feature-specific data, opaque to the pipeline
    pub private: HashMap<String, serde_json::Value>,
}

impl Email {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from(mut self, sender: impl IntoRecipient) -> Self {
        self.from = RecipientField::Pending(vec![sender.into_recipient()]);
        self
    }

    #[must_use]
    pub fn to(mut self, recipients: impl IntoRecipients) -> Self {
        self.to = RecipientField::Pending(recipients.into_recipients());
        self
    }

    #[must_use]
    pub fn cc(mut self, recipients: impl IntoRecipients) -> Self {
        self.cc = RecipientField::Pending(recipients.into_recipients());
        self
    }

    #[must_use]
    pub fn bcc(mut self, recipients: impl IntoRecipients) -> Self {
        self.bcc = RecipientField::Pending(recipients.into_recipients());
        self
    }

    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.text_body = Some(body.into());
        self
    }

    #[must_use]
    pub fn html_body(mut self, body: impl Into<String>) -> Self {
        self.html_body = Some(body.into());
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Attachments stack newest-first.
    #[must_use]
    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.insert(0, attachment);
        self
    }

    #[must_use]
    pub fn assign(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.assigns.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn put_private(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.private.insert(key.into(), value);
        self
    }

    /// The canonical sender, available once normalized.
    #[must_use]
    pub fn from_address(&self) -> Option<&Address> {
        self.from.addresses().first()
    }

    /// Union of to, cc and bcc addresses, in that order.
    #[must_use]
    pub fn recipients(&self) -> Vec<&Address> {
        self.to
            .addresses()
            .iter()
            .chain(self.cc.addresses())
            .chain(self.bcc.addresses())
            .collect()
    }

    /// True when every recipient list resolved to empty.
    #[must_use]
    pub fn has_no_recipients(&self) -> bool {
        self.to.addresses().is_empty()
            && self.cc.addresses().is_empty()
            && self.bcc.addresses().is_empty()
    }

    /// Copy with render-time assigns removed.
    #[must_use]
    pub fn without_assigns(&self) -> Self {
        let mut email = self.clone();
        email.assigns.clear();
        email
    }

    /// Validate the email and reduce every participant field to canonical
    /// addresses, returning a new value.
    ///
    /// Fails with `EmptyFrom` when the sender is absent or resolves empty,
    /// `NilRecipients` when to, cc and bcc are all unset, and an attachment
    /// error when one is missing its filename or payload. Explicitly empty
    /// recipient lists are legitimate and survive as empty `Resolved` lists.
    pub fn normalize(self, formatter: &dyn AddressFormatter) -> Result<Self> {
        if self.from.is_unset() {
            return Err(Error::Validation(ValidationError::EmptyFrom));
        }
        if self.to.is_unset() && self.cc.is_unset() && self.bcc.is_unset() {
            return Err(Error::Validation(ValidationError::NilRecipients));
        }

        for attachment in &self.attachments {
            if attachment.filename.is_empty() {
                return Err(Error::Validation(ValidationError::Attachment(
                    "filename is empty".to_string(),
                )));
            }
            if attachment.data.is_empty() {
                return Err(Error::Validation(ValidationError::Attachment(format!(
                    "{} has an empty payload",
                    attachment.filename
                ))));
            }
        }

        let from = resolve_field(&self.from, Role::From, formatter)
            .map_err(|_| Error::Validation(ValidationError::EmptyFrom))?;
        let sender = match from.first() {
            Some(address) if !address.address.is_empty() => address.clone(),
            _ => return Err(Error::Validation(ValidationError::EmptyFrom)),
        };

        let to = resolve_field(&self.to, Role::To, formatter)?;
        let cc = resolve_field(&self.cc, Role::Cc, formatter)?;
        let bcc = resolve_field(&self.bcc, Role::Bcc, formatter)?;

        Ok(Self {
            from: RecipientField::Resolved(vec![sender]),
            to: RecipientField::Resolved(to),
            cc: RecipientField::Resolved(cc),
            bcc: RecipientField::Resolved(bcc),
            ..self
        })
    }
}

fn resolve_field(
    field: &RecipientField,
    role: Role,
    formatter: &dyn AddressFormatter,
) -> Result<Vec<Address>> {
    match field {
        RecipientField::Unset => Ok(Vec::new()),
        RecipientField::Pending(recipients) => recipients
            .iter()
            .map(|recipient| {
                formatter
                    .format(recipient, role)
                    .map_err(Error::Validation)
            })
            .collect(),
        RecipientField::Resolved(addresses) => addresses
            .iter()
            .map(|address| {
                formatter
                    .format(&crate::address::Recipient::Resolved(address.clone()), role)
                    .map_err(Error::Validation)
            })
            .collect(),
    }
}
