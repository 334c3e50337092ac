//! certsrv web-enrollment client.
//!
//! This module provides [`CertsrvClient`], the [`CaAdapter`] that talks to a
//! Microsoft AD CS web-enrollment server (`/certsrv`). The pages answer in
//! HTML meant for browsers, so request ids and disposition messages are
//! scraped out of the markup.

use std::sync::LazyLock;

use async_trait::async_trait;
use base64::prelude::*;
use regex::Regex;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::adapter::CaAdapter;
use crate::config::Credentials;
use crate::error::{CertsrvError, Result};
use crate::tls::build_http_client;
use crate::types::{content_types, pages, CaReply, ChainEncoding};

/// Link to the issued certificate on the submission result page.
static ISSUED_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"certnew\.cer\?ReqID=(\d+)&").expect("regex for issued certificate link")
});

/// Request id on the "Certificate Pending" page.
static PENDING_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Your Request Id is (\d+)").expect("regex for pending request id")
});

/// Denial reason on the submission result page.
static DENIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"The disposition message is "([^"]+)"#).expect("regex for denial message")
});

/// Disposition on the certificate download error page.
static DISPOSITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Disposition message:[^\t]*\t+([^\r\n<]+)").expect("regex for disposition")
});

/// Marker of the "Certificate Pending" page.
const PENDING_MARKER: &str = "Certificate Pending";

/// Message used when a denial page carries no disposition.
const UNKNOWN_DENIAL: &str = "An unknown error occurred";

/// What the submission result page says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionPage {
    /// Issued; the certificate can be downloaded under this request id.
    Issued {
        /// Request id.
        request_id: String,
    },
    /// Waiting for a CA manager.
    Pending {
        /// Request id.
        request_id: String,
    },
    /// Refused.
    Denied {
        /// Disposition message.
        message: String,
    },
}

/// Read the submission result page.
pub fn parse_submission_page(page: &str) -> SubmissionPage {
    if let Some(caps) = ISSUED_LINK.captures(page) {
        return SubmissionPage::Issued {
            request_id: caps[1].to_string(),
        };
    }

    if page.contains(PENDING_MARKER) {
        if let Some(caps) = PENDING_ID.captures(page) {
            return SubmissionPage::Pending {
                request_id: caps[1].to_string(),
            };
        }
    }

    let message = DENIAL
        .captures(page)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_else(|| UNKNOWN_DENIAL.to_string());

    SubmissionPage::Denied { message }
}

/// Read the disposition message off a certificate download error page.
///
/// Falls back to the whole page with line breaks removed.
pub fn parse_disposition(page: &str) -> String {
    match DISPOSITION.captures(page) {
        Some(caps) => caps[1].trim().to_string(),
        None => page.replace("\r\n", "").replace('\n', "").trim().to_string(),
    }
}

/// Client for the certsrv web-enrollment pages.
///
/// # Example
///
/// ```no_run
/// use certmonger_certsrv::{CaAdapter, CertsrvClient, ConfigLoader};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let credentials = ConfigLoader::new().load()?;
/// let client = CertsrvClient::new(&credentials)?;
///
/// let reply = client.poll("1234").await?;
/// println!("{:?}", reply);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CertsrvClient {
    credentials: Credentials,
    http: reqwest::Client,
}

impl CertsrvClient {
    /// Create a new client for the configured CA.
    ///
    /// # Errors
    ///
    /// Returns an error if the CA bundle cannot be read or TLS setup fails.
    pub fn new(credentials: &Credentials) -> Result<Self> {
        let http = build_http_client(credentials)?;

        Ok(Self {
            credentials: credentials.clone(),
            http,
        })
    }

    /// Get the client credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Add the HTTP Basic auth header.
    fn add_auth_header(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let credentials = BASE64_STANDARD.encode(format!(
            "{}:{}",
            self.credentials.identity, self.credentials.secret
        ));
        request.header(AUTHORIZATION, format!("Basic {}", credentials))
    }

    /// Handle error responses from the server.
    async fn handle_error_response(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            let challenge = response
                .headers()
                .get("www-authenticate")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_string();
            return Err(CertsrvError::authentication_required(challenge));
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        Err(CertsrvError::server_error(status.as_u16(), message))
    }
}

#[async_trait]
impl CaAdapter for CertsrvClient {
    async fn submit(&self, csr: &str, template: &str) -> Result<CaReply> {
        let url = self.credentials.build_url(pages::SUBMIT);
        tracing::debug!("POST {}", url);

        let attributes = format!("CertificateTemplate:{}", template);
        let form = [
            ("Mode", "newreq"),
            ("CertRequest", csr),
            ("CertAttrib", attributes.as_str()),
            ("UserAgent", crate::USER_AGENT),
            ("FriendlyType", "Saved-Request Certificate"),
            ("TargetStoreFlags", "0"),
            ("SaveCert", "yes"),
        ];

        let request = self.add_auth_header(self.http.post(url).form(&form));
        let response = request.send().await?;
        let response = self.handle_error_response(response).await?;
        let page = response.text().await?;

        match parse_submission_page(&page) {
            SubmissionPage::Issued { request_id } => {
                tracing::info!("Request {} issued, downloading certificate", request_id);
                self.poll(&request_id).await
            }
            SubmissionPage::Pending { request_id } => {
                tracing::info!("Request {} is pending approval", request_id);
                Ok(CaReply::Pending { request_id })
            }
            SubmissionPage::Denied { message } => {
                tracing::warn!("Request denied: {}", message);
                Ok(CaReply::Denied { message })
            }
        }
    }

    async fn poll(&self, request_id: &str) -> Result<CaReply> {
        let mut url = self.credentials.build_url(pages::CERTIFICATE);
        url.query_pairs_mut()
            .append_pair("ReqID", request_id)
            .append_pair("Enc", "b64");
        tracing::debug!("GET {}", url);

        let response = self.add_auth_header(self.http.get(url)).send().await?;
        let response = self.handle_error_response(response).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text().await?;

        if content_type.starts_with(content_types::PKIX_CERT) {
            return Ok(CaReply::Issued {
                certificate: body.replace("\r\n", "\n"),
            });
        }

        let message = parse_disposition(&body);
        tracing::debug!("Request {} not retrieved: {}", request_id, message);
        Ok(CaReply::NotRetrieved { message })
    }

    async fn chain(&self, encoding: ChainEncoding) -> Result<Vec<u8>> {
        let mut url = self.credentials.build_url(pages::CHAIN);
        url.query_pairs_mut()
            .append_pair("ReqID", "CACert")
            .append_pair("Renewal", "-1")
            .append_pair("Enc", encoding.as_query());
        tracing::debug!("GET {}", url);

        let response = self.add_auth_header(self.http.get(url)).send().await?;
        let response = self.handle_error_response(response).await?;

        Ok(response.bytes().await?.to_vec())
    }

    async fn templates(&self) -> Result<Vec<String>> {
        Err(CertsrvError::not_supported("template listing"))
    }
}
