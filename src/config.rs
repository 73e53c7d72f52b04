//! Delivery configuration.

use crate::error::{ConfigError, Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Key names that are masked when a config is rendered for diagnostics.
const SECRET_MARKERS: &[&str] = &["password", "secret", "api_key", "token"];

/// One configuration value. Literals are used as-is; the other variants are
/// resolved when an adapter validates its config.
#[derive(Clone)]
pub enum Setting {
    Literal(String),
    /// Read from the named environment variable at resolution time
    Env(String),
    /// Evaluated at resolution time
    Deferred(Arc<dyn Fn() -> Option<String> + Send + Sync>),
}

impl Setting {
    /// Resolve to a concrete value, `None` when absent or unresolvable.
    #[must_use]
    pub fn resolve(&self) -> Option<String> {
        match self {
            Self::Literal(value) => Some(value.clone()),
            Self::Env(var) => std::env::var(var).ok(),
            Self::Deferred(accessor) => accessor(),
        }
    }
}

impl fmt::Debug for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value:?}"),
            Self::Env(var) => write!(f, "${var}"),
            Self::Deferred(_) => write!(f, "<deferred>"),
        }
    }
}

impl From<&str> for Setting {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for Setting {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl From<u16> for Setting {
    fn from(value: u16) -> Self {
        Self::Literal(value.to_string())
    }
}

/// Resolved, adapter-validated delivery configuration.
///
/// Selects the adapter implementation and carries its credentials and
/// endpoints. Built once per mailer and treated as immutable after
/// `handle_config` validation.
#[derive(Clone, Default)]
pub struct DeliveryConfig {
    pub adapter: String,
    settings: BTreeMap<String, Setting>,
}

impl DeliveryConfig {
    #[must_use]
    pub fn new(adapter: impl Into<String>) -> Self {
        Self {
            adapter: adapter.into(),
            settings: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Setting>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// Value read from an environment variable at validation time.
    #[must_use]
    pub fn set_env(mut self, key: impl Into<String>, var: impl Into<String>) -> Self {
        self.settings.insert(key.into(), Setting::Env(var.into()));
        self
    }

    /// Value produced by an accessor evaluated at validation time.
    #[must_use]
    pub fn set_deferred(
        mut self,
        key: impl Into<String>,
        accessor: impl Fn() -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.settings
            .insert(key.into(), Setting::Deferred(Arc::new(accessor)));
        self
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.settings.contains_key(key)
    }

    /// Resolve one key, `None` when absent or unresolvable.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.settings.get(key).and_then(Setting::resolve)
    }

    #[must_use]
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Check that every listed key resolves to a non-empty value, reporting
    /// all offenders at once alongside the redacted config.
    pub fn require(&self, keys: &[&str]) -> Result<()> {
        let missing: Vec<String> = keys
            .iter()
            .filter(|key| {
                self.get(key)
                    .map_or(true, |value| value.trim().is_empty())
            })
            .map(ToString::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(ConfigError::MissingKeys {
                keys: missing,
                config: self.redacted(),
            }))
        }
    }

    /// Render the config with secret values masked.
    #[must_use]
    pub fn redacted(&self) -> String {
        let mut out = format!("{{adapter: {:?}", self.adapter);
        for (key, value) in &self.settings {
            if is_secret(key) {
                out.push_str(&format!(", {key}: [REDACTED]"));
            } else {
                out.push_str(&format!(", {key}: {value:?}"));
            }
        }
        out.push('}');
        out
    }
}

impl fmt::Debug for DeliveryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

fn is_secret(key: &str) -> bool {
    let key = key.to_lowercase();
    SECRET_MARKERS.iter().any(|marker| key.contains(marker))
}
