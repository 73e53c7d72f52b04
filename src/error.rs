//! Error types for the delivery pipeline.

use std::fmt;

/// Main error type for delivery operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Missing or invalid adapter configuration
    Config(ConfigError),
    /// Caller bugs caught before any network attempt
    Validation(ValidationError),
    /// HTTP provider rejection or transport failure
    Api(ApiError),
    /// SMTP transport failure
    Smtp(SmtpError),
    /// Test mailbox lookup failures
    Mailbox(MailboxError),
}

/// Adapter configuration errors. Always fatal to the delivery call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required keys absent or resolving to empty values. Carries the
    /// full config with secret values already redacted.
    MissingKeys { keys: Vec<String>, config: String },
    /// The `adapter` key named no known backend
    UnknownAdapter(String),
    /// A key resolved but its value is unusable
    Invalid(String),
}

/// Caller errors detected during validation or normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The sender is absent or resolves to an empty address
    EmptyFrom,
    /// to, cc and bcc are all unset (distinct from all-empty lists)
    NilRecipients,
    /// A recipient value could not be reduced to a canonical address
    UnformattableAddress(String),
    /// An attachment is missing its filename or payload
    Attachment(String),
    /// The selected adapter cannot carry the email's attachments
    AttachmentsNotSupported,
    /// A header value contains a literal CR or LF
    HeaderInjection(String),
}

/// Provider API rejection or HTTP transport failure.
///
/// `status` is `None` when the transport itself failed before a response
/// arrived. Any echoed request content in `body` has secrets redacted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: Option<u16>,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// SMTP transport failure wrapping the underlying reason and any server
/// response text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpError {
    pub reason: String,
    pub response: Option<String>,
}

/// Test mailbox lookup failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailboxError {
    /// No stored email matches the given ID
    NotFound(String),
    /// `one` was called on an empty mailbox
    Empty,
    /// `one` was called with more than one email present
    Multiple(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {e}"),
            Self::Validation(e) => write!(f, "validation error: {e}"),
            Self::Api(e) => write!(f, "API error: {e}"),
            Self::Smtp(e) => write!(f, "SMTP error: {e}"),
            Self::Mailbox(e) => write!(f, "mailbox error: {e}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKeys { keys, config } => write!(
                f,
                "missing or empty keys [{}] in config {config}",
                keys.join(", ")
            ),
            Self::UnknownAdapter(name) => write!(f, "unknown adapter: {name}"),
            Self::Invalid(msg) => write!(f, "invalid value: {msg}"),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFrom => write!(f, "from address is missing or empty"),
            Self::NilRecipients => {
                write!(f, "to, cc and bcc are all unset; set at least one")
            }
            Self::UnformattableAddress(input) => {
                write!(f, "cannot format address from {input}")
            }
            Self::Attachment(msg) => write!(f, "bad attachment: {msg}"),
            Self::AttachmentsNotSupported => {
                write!(f, "the configured adapter does not support attachments")
            }
            Self::HeaderInjection(name) => {
                write!(f, "header {name} contains a line break")
            }
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "status {status}: {}", self.body),
            None => write!(f, "transport failed: {}", self.body),
        }
    }
}

impl fmt::Display for SmtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.response {
            Some(response) => write!(f, "{} (server said: {response})", self.reason),
            None => write!(f, "{}", self.reason),
        }
    }
}

impl fmt::Display for MailboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "no email with id {id}"),
            Self::Empty => write!(f, "expected exactly one email, found none"),
            Self::Multiple(n) => write!(f, "expected exactly one email, found {n}"),
        }
    }
}

impl std::error::Error for Error {}
impl std::error::Error for ConfigError {}
impl std::error::Error for ValidationError {}
impl std::error::Error for ApiError {}
impl std::error::Error for SmtpError {}
impl std::error::Error for MailboxError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<ApiError> for Error {
    fn from(e: ApiError) -> Self {
        Self::Api(e)
    }
}

impl From<SmtpError> for Error {
    fn from(e: SmtpError) -> Self {
        Self::Smtp(e)
    }
}

impl From<MailboxError> for Error {
    fn from(e: MailboxError) -> Self {
        Self::Mailbox(e)
    }
}

/// Result type alias for delivery operations.
pub type Result<T> = std::result::Result<T, Error>;
