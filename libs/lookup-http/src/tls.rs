//! TLS connector construction.

use crate::config::{TlsRootConfig, TransportSecurity};
use crate::error::HttpError;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use std::sync::Arc;

/// Get the crypto provider for TLS connections.
///
/// Uses the process-wide default provider when one is installed, otherwise
/// builds an aws-lc-rs provider without installing it globally.
fn crypto_provider() -> Arc<rustls::crypto::CryptoProvider> {
    rustls::crypto::CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
}

/// Build the HTTPS connector for the given root store and transport mode.
///
/// HTTP/2 is offered through ALPN alongside HTTP/1.1.
pub(crate) fn build_https_connector(
    tls_roots: TlsRootConfig,
    transport: TransportSecurity,
) -> Result<HttpsConnector<HttpConnector>, HttpError> {
    let allow_http = transport == TransportSecurity::AllowInsecureHttp;
    let provider = crypto_provider();

    let builder = match tls_roots {
        TlsRootConfig::WebPki => hyper_rustls::HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(provider)
            .map_err(|e| HttpError::Tls(Box::new(e)))?,
        TlsRootConfig::Native => hyper_rustls::HttpsConnectorBuilder::new()
            .with_provider_and_native_roots(provider)
            .map_err(|e| HttpError::Tls(Box::new(e)))?,
    };

    let connector = if allow_http {
        builder.https_or_http().enable_all_versions().build()
    } else {
        builder.https_only().enable_all_versions().build()
    };
    Ok(connector)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_webpki_connector_builds() {
        let result = build_https_connector(TlsRootConfig::WebPki, TransportSecurity::TlsOnly);
        assert!(result.is_ok());
    }

    #[test]
    fn test_native_connector_does_not_panic() {
        // Minimal containers may have no OS certificate store; both outcomes are fine.
        let result = build_https_connector(TlsRootConfig::Native, TransportSecurity::TlsOnly);
        if let Err(e) = result {
            assert!(matches!(e, HttpError::Tls(_)));
        }
    }
}
