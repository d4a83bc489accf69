//! API key providers.

use part_lookup_sdk::ApiKeyProvider;
use secrecy::{ExposeSecret, SecretString};

/// Environment variable holding the search API key by default.
pub const DEFAULT_API_KEY_ENV: &str = "MOUSER_SEARCH_API_KEY";

/// Reads the search API key from an environment variable on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvApiKeyProvider {
    var: String,
}

impl EnvApiKeyProvider {
    #[must_use]
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    #[must_use]
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvApiKeyProvider {
    fn default() -> Self {
        Self::new(DEFAULT_API_KEY_ENV)
    }
}

impl ApiKeyProvider for EnvApiKeyProvider {
    fn search_api_key(&self) -> Option<SecretString> {
        let value = std::env::var(&self.var).ok()?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(SecretString::from(trimmed.to_owned()))
    }

    fn describe(&self) -> String {
        format!("environment variable {}", self.var)
    }
}

/// Fixed key supplied at construction.
#[derive(Debug, Clone)]
pub struct StaticApiKeyProvider {
    key: SecretString,
}

impl StaticApiKeyProvider {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: SecretString::from(key.into()),
        }
    }
}

impl ApiKeyProvider for StaticApiKeyProvider {
    fn search_api_key(&self) -> Option<SecretString> {
        if self.key.expose_secret().trim().is_empty() {
            return None;
        }
        Some(self.key.clone())
    }

    fn describe(&self) -> String {
        "static API key".to_owned()
    }
}
