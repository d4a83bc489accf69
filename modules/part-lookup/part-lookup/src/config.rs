//! Configuration for the part lookup service.

use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use lookup_http::{HttpClientConfig, TlsRootConfig, TransportSecurity};
use part_lookup_sdk::{LookupError, MAX_PER_CALL, MAX_TOTAL, PartSearchOption};
use serde::{Deserialize, Serialize};

use crate::domain::routes::ServiceRoutes;
use crate::domain::service::LookupOptions;
use crate::infra::credentials::DEFAULT_API_KEY_ENV;

/// Prefix of environment variables overriding configuration keys.
///
/// Nested keys are separated by `__`, e.g. `PART_LOOKUP__HTTP__REQUEST_TIMEOUT_MS`.
pub const ENV_PREFIX: &str = "PART_LOOKUP__";

/// Default User-Agent sent to the search service.
pub const DEFAULT_USER_AGENT: &str = concat!("part-lookup/", env!("CARGO_PKG_VERSION"));

/// Configuration for the part lookup service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartLookupConfig {
    /// Base URL of the search API.
    pub api_base: String,
    /// API version path segment.
    pub api_version: String,
    /// Identifiers per call (1..=10).
    pub max_per_call: usize,
    /// Identifiers per batch (1..=300).
    pub max_total: usize,
    /// Chunks in flight at once (1..=8).
    pub max_concurrent_chunks: usize,
    /// Match mode: `none`, `exact`, `begins_with`, or the codes 1, 2, 3.
    pub search_option: PartSearchOption,
    /// Environment variable holding the search API key.
    pub api_key_env: String,
    pub http: HttpSettings,
}

impl Default for PartLookupConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.mouser.com/api".to_owned(),
            api_version: "v1".to_owned(),
            max_per_call: MAX_PER_CALL,
            max_total: MAX_TOTAL,
            max_concurrent_chunks: 1,
            search_option: PartSearchOption::None,
            api_key_env: DEFAULT_API_KEY_ENV.to_owned(),
            http: HttpSettings::default(),
        }
    }
}

/// Outbound HTTP settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSettings {
    /// Timeout of one call in milliseconds, body included.
    pub request_timeout_ms: u64,
    /// Maximum response body size in bytes.
    pub max_body_size: usize,
    /// Permit plain `http://` endpoints (mock servers only).
    pub allow_insecure_http: bool,
    pub tls_roots: TlsRoots,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            max_body_size: 10 * 1024 * 1024, // 10 MiB
            allow_insecure_http: false,
            tls_roots: TlsRoots::Webpki,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

/// Root certificate source for TLS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsRoots {
    #[default]
    Webpki,
    Native,
}

impl PartLookupConfig {
    /// Layered sources: defaults, then the YAML file (if any), then
    /// `PART_LOOKUP__*` environment variables.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file_exact(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate the configuration.
    ///
    /// # Errors
    /// Returns [`LookupError::Configuration`] if a source cannot be read or
    /// parsed, or a value is out of range.
    pub fn load(path: Option<&Path>) -> Result<Self, LookupError> {
        let config: Self = Self::figment(path)
            .extract()
            .map_err(|e| LookupError::configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges and URLs.
    ///
    /// # Errors
    /// Returns [`LookupError::Configuration`] describing the first invalid value.
    pub fn validate(&self) -> Result<(), LookupError> {
        self.lookup_options().validate()?;
        self.routes()?;
        if self.api_key_env.trim().is_empty() {
            return Err(LookupError::configuration("api_key_env must not be empty"));
        }
        if self.http.request_timeout_ms == 0 {
            return Err(LookupError::configuration(
                "http.request_timeout_ms must be greater than 0",
            ));
        }
        if self.http.max_body_size == 0 {
            return Err(LookupError::configuration(
                "http.max_body_size must be greater than 0",
            ));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(LookupError::configuration(
                "http.user_agent must not be empty",
            ));
        }
        if !self.http.allow_insecure_http && self.api_base.trim().starts_with("http://") {
            return Err(LookupError::configuration(
                "api_base uses http:// but http.allow_insecure_http is false",
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn lookup_options(&self) -> LookupOptions {
        LookupOptions {
            max_per_call: self.max_per_call,
            max_total: self.max_total,
            max_concurrent_chunks: self.max_concurrent_chunks,
            search_option: self.search_option,
        }
    }

    /// Resolve the service routes.
    ///
    /// # Errors
    /// Returns [`LookupError::Configuration`] for an invalid `api_base`.
    pub fn routes(&self) -> Result<ServiceRoutes, LookupError> {
        ServiceRoutes::new(&self.api_base, &self.api_version)
    }

    #[must_use]
    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            request_timeout: Duration::from_millis(self.http.request_timeout_ms),
            max_body_size: self.http.max_body_size,
            user_agent: self.http.user_agent.clone(),
            transport: if self.http.allow_insecure_http {
                TransportSecurity::AllowInsecureHttp
            } else {
                TransportSecurity::TlsOnly
            },
            tls_roots: match self.http.tls_roots {
                TlsRoots::Webpki => TlsRootConfig::WebPki,
                TlsRoots::Native => TlsRootConfig::Native,
            },
            ..HttpClientConfig::default()
        }
    }
}
