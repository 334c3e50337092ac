//! Error types for the certsrv helper.
//!
//! This module defines every error that can occur while loading the helper
//! configuration, talking to the CA's web-enrollment pages, or decoding what
//! the CA sends back.

use thiserror::Error;

/// Result type alias using [`CertsrvError`].
pub type Result<T> = std::result::Result<T, CertsrvError>;

/// Errors that can occur during helper operations.
#[derive(Debug, Error)]
pub enum CertsrvError {
    /// Configuration file missing, unreadable or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// TLS configuration error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// HTTP request or response error (includes timeouts).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// CA web server returned an error response.
    #[error("Server error {status}: {message}")]
    ServerError {
        /// HTTP status code.
        status: u16,
        /// Error message from server.
        message: String,
    },

    /// CA web server requires (different) authentication (HTTP 401).
    #[error("Authentication required: {challenge}")]
    AuthenticationRequired {
        /// WWW-Authenticate challenge from server.
        challenge: String,
    },

    /// Failed to parse or encode an X.509 certificate.
    #[error("Certificate parsing error: {0}")]
    CertificateParsing(String),

    /// Failed to parse a CMS/PKCS#7 structure.
    #[error("CMS/PKCS#7 parsing error: {0}")]
    CmsParsing(String),

    /// A required `CERTMONGER_*` variable was not provided.
    #[error("Missing required environment variable {0}")]
    MissingVariable(String),

    /// Capability not offered by the CA.
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Base64 decoding error.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// DER encoding/decoding error.
    #[error("DER error: {0}")]
    Der(#[from] der::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CertsrvError {
    /// Create a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a TLS error with the given message.
    pub fn tls(msg: impl Into<String>) -> Self {
        Self::Tls(msg.into())
    }

    /// Create a server error with status and message.
    pub fn server_error(status: u16, message: impl Into<String>) -> Self {
        Self::ServerError {
            status,
            message: message.into(),
        }
    }

    /// Create an authentication required error.
    pub fn authentication_required(challenge: impl Into<String>) -> Self {
        Self::AuthenticationRequired {
            challenge: challenge.into(),
        }
    }

    /// Create a certificate parsing error with the given message.
    pub fn certificate_parsing(msg: impl Into<String>) -> Self {
        Self::CertificateParsing(msg.into())
    }

    /// Create a CMS parsing error with the given message.
    pub fn cms_parsing(msg: impl Into<String>) -> Self {
        Self::CmsParsing(msg.into())
    }

    /// Create a missing variable error.
    pub fn missing_variable(name: impl Into<String>) -> Self {
        Self::MissingVariable(name.into())
    }

    /// Create a not supported error.
    pub fn not_supported(operation: impl Into<String>) -> Self {
        Self::NotSupported(operation.into())
    }

    /// Returns true if this error comes from the configuration store.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if the CA does not offer the requested capability.
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported(_))
    }
}
