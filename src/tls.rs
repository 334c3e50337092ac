//! TLS configuration helpers for the certsrv client.
//!
//! This module builds the HTTP client used to reach the CA's web-enrollment
//! pages.

use crate::config::Credentials;
use crate::error::{CertsrvError, Result};

/// Build a reqwest Client with the appropriate TLS configuration.
///
/// The built-in web PKI roots are always trusted; certificates from the
/// configured `ca_bundle` are added on top, since enterprise CAs usually
/// serve their enrollment pages with a certificate they issued themselves.
pub fn build_http_client(credentials: &Credentials) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(credentials.timeout)
        .use_rustls_tls()
        .tls_built_in_root_certs(true)
        .min_tls_version(reqwest::tls::Version::TLS_1_2)
        .user_agent(crate::USER_AGENT);

    if let Some(ref bundle_path) = credentials.ca_bundle {
        let pem = std::fs::read(bundle_path).map_err(|e| {
            CertsrvError::config(format!("Failed to read {}: {}", bundle_path.display(), e))
        })?;

        for cert in parse_pem_bundle(&pem)? {
            builder = builder.add_root_certificate(cert);
        }
    }

    builder
        .build()
        .map_err(|e| CertsrvError::tls(format!("Failed to build HTTP client: {}", e)))
}

/// Parse every certificate in a PEM bundle.
pub fn parse_pem_bundle(pem_data: &[u8]) -> Result<Vec<reqwest::Certificate>> {
    let certs = reqwest::Certificate::from_pem_bundle(pem_data)
        .map_err(|e| CertsrvError::tls(format!("Failed to parse CA certificate: {}", e)))?;

    if certs.is_empty() {
        return Err(CertsrvError::config("No certificates found in CA bundle"));
    }

    Ok(certs)
}
