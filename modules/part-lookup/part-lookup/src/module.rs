//! Wiring of the part lookup service from configuration.

use std::sync::Arc;

use part_lookup_sdk::{ApiKeyProvider, LookupError};
use tracing::info;

use crate::config::PartLookupConfig;
use crate::domain::service::PartLookupService;
use crate::infra::credentials::EnvApiKeyProvider;
use crate::infra::http_transport::HttpLookupTransport;

/// Build a service that reads its key from `config.api_key_env`.
///
/// # Errors
/// Returns [`LookupError::Configuration`] if the configuration is invalid or
/// the HTTP client cannot be initialized.
pub fn build_service(config: &PartLookupConfig) -> Result<PartLookupService, LookupError> {
    let keys = Arc::new(EnvApiKeyProvider::new(config.api_key_env.clone()));
    build_service_with_keys(config, keys)
}

/// Build a service with a caller-supplied key provider.
///
/// # Errors
/// Same as [`build_service`].
pub fn build_service_with_keys(
    config: &PartLookupConfig,
    keys: Arc<dyn ApiKeyProvider>,
) -> Result<PartLookupService, LookupError> {
    config.validate()?;
    let routes = config.routes()?;
    let transport = HttpLookupTransport::with_config(config.http_client_config())
        .map_err(|e| LookupError::configuration(format!("cannot initialize HTTP client: {e}")))?;

    info!(
        api_base = %config.api_base,
        api_version = %config.api_version,
        max_per_call = config.max_per_call,
        max_total = config.max_total,
        max_concurrent_chunks = config.max_concurrent_chunks,
        search_option = %config.search_option,
        "part lookup service configured"
    );

    PartLookupService::new(
        Arc::new(transport),
        keys,
        &routes,
        config.lookup_options(),
    )
}
