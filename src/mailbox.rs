//! Thread-safe mailbox recording delivered emails for assertions.

use crate::email::Email;
use crate::error::{Error, MailboxError, Result};
use std::sync::RwLock;
use uuid::Uuid;

/// A delivered email plus its assigned lookup ID.
#[derive(Debug, Clone, PartialEq)]
pub struct SentEmail {
    pub id: String,
    pub email: Email,
}

/// Append-only store of delivered emails, newest first.
///
/// Shared as an explicit handle (`Arc<TestMailbox>`) rather than global
/// state so parallel tests can run isolated instances. Callers reset it
/// between test cases.
#[derive(Debug, Default)]
pub struct TestMailbox {
    emails: RwLock<Vec<SentEmail>>,
}

impl TestMailbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an email, assign it an opaque ID and return the stored
    /// record. Render-time assigns are stripped before storage.
    pub fn push(&self, email: Email) -> SentEmail {
        let record = SentEmail {
            id: generate_id(),
            email: email.without_assigns(),
        };
        let mut emails = self.emails.write().unwrap();
        emails.insert(0, record.clone());
        record
    }

    /// All stored emails, newest first.
    #[must_use]
    pub fn all(&self) -> Vec<SentEmail> {
        self.emails.read().unwrap().clone()
    }

    /// Look an email up by ID, ignoring case.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<SentEmail> {
        self.emails
            .read()
            .unwrap()
            .iter()
            .find(|record| record.id.eq_ignore_ascii_case(id))
            .cloned()
    }

    /// Like [`get`](Self::get), failing when the ID is unknown.
    pub fn get_strict(&self, id: &str) -> Result<SentEmail> {
        self.get(id)
            .ok_or_else(|| Error::Mailbox(MailboxError::NotFound(id.to_string())))
    }

    /// The single stored email. Fails when the mailbox holds zero or more
    /// than one, making "exactly one email was sent" assertions concise.
    pub fn one(&self) -> Result<SentEmail> {
        let emails = self.emails.read().unwrap();
        match emails.as_slice() {
            [] => Err(Error::Mailbox(MailboxError::Empty)),
            [record] => Ok(record.clone()),
            _ => Err(Error::Mailbox(MailboxError::Multiple(emails.len()))),
        }
    }

    /// Clear all stored emails.
    pub fn reset(&self) {
        self.emails.write().unwrap().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.emails.read().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emails.read().unwrap().is_empty()
    }
}

/// Short random opaque ID.
fn generate_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    hex[..12].to_string()
}
