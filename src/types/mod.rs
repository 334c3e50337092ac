// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Helper message types and parsing utilities.
//!
//! This module provides the operation names certmonger sends, the request the
//! helper builds from them, the answers a CA adapter returns and the
//! normalized outcome rendered back to certmonger.

mod pkcs7;

pub use pkcs7::{decode_bundle, encode_certificate_pem, parse_certs_only};

#[cfg(test)]
pub(crate) use pkcs7::testing;

use std::fmt;
use std::str::FromStr;

/// A certmonger helper operation.
///
/// Selected once per invocation from `CERTMONGER_OPERATION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Submit a new (or renewal) certificate signing request.
    Submit,
    /// Poll a previously submitted request.
    Poll,
    /// Report helper name and version.
    Identify,
    /// Report the configured default template.
    GetDefaultTemplate,
    /// List the variables needed for a new request.
    GetNewRequestRequirements,
    /// List the variables needed for a renewal request.
    GetRenewRequestRequirements,
    /// List the templates the CA offers.
    GetSupportedTemplates,
    /// Fetch the CA's root and intermediate certificates.
    FetchRoots,
    /// Anything the helper does not implement.
    Unknown,
}

impl Operation {
    /// Select the operation from the raw `CERTMONGER_OPERATION` value.
    ///
    /// An absent or empty value means [`Operation::Submit`]; any other
    /// unrecognized value is [`Operation::Unknown`].
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            None | Some("") => Self::Submit,
            Some(name) => name.parse().unwrap_or(Self::Unknown),
        }
    }

    /// The certmonger wire name of this operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => "SUBMIT",
            Self::Poll => "POLL",
            Self::Identify => "IDENTIFY",
            Self::GetDefaultTemplate => "GET-DEFAULT-TEMPLATE",
            Self::GetNewRequestRequirements => "GET-NEW-REQUEST-REQUIREMENTS",
            Self::GetRenewRequestRequirements => "GET-RENEW-REQUEST-REQUIREMENTS",
            Self::GetSupportedTemplates => "GET-SUPPORTED-TEMPLATES",
            Self::FetchRoots => "FETCH-ROOTS",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Returns true if the operation needs the stored configuration.
    pub fn requires_config(&self) -> bool {
        matches!(
            self,
            Self::Submit
                | Self::Poll
                | Self::GetDefaultTemplate
                | Self::GetSupportedTemplates
                | Self::FetchRoots
        )
    }
}

impl FromStr for Operation {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "SUBMIT" => Self::Submit,
            "POLL" => Self::Poll,
            "IDENTIFY" => Self::Identify,
            "GET-DEFAULT-TEMPLATE" => Self::GetDefaultTemplate,
            "GET-NEW-REQUEST-REQUIREMENTS" => Self::GetNewRequestRequirements,
            "GET-RENEW-REQUEST-REQUIREMENTS" => Self::GetRenewRequestRequirements,
            "GET-SUPPORTED-TEMPLATES" => Self::GetSupportedTemplates,
            "FETCH-ROOTS" => Self::FetchRoots,
            _ => Self::Unknown,
        })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to be relayed to the CA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentRequest {
    /// PEM-encoded PKCS#10 request (empty for polls).
    pub csr: String,
    /// Certificate template name (empty for polls).
    pub template: String,
    /// Request identifier handed out by the CA on a pending submission.
    pub request_id: Option<String>,
}

impl EnrollmentRequest {
    /// Create a new submission.
    pub fn submission(csr: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            csr: csr.into(),
            template: template.into(),
            request_id: None,
        }
    }

    /// Create a poll for an earlier request.
    pub fn poll(request_id: impl Into<String>) -> Self {
        Self {
            csr: String::new(),
            template: String::new(),
            request_id: Some(request_id.into()),
        }
    }
}

/// What the CA answered to a submission or poll.
///
/// Transport faults are not part of this type; adapters report them as the
/// `Err` side of their result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaReply {
    /// Certificate was issued.
    Issued {
        /// PEM-encoded certificate.
        certificate: String,
    },

    /// Request awaits manual approval.
    Pending {
        /// Request identifier to poll with later.
        request_id: String,
    },

    /// CA explicitly denied the request.
    Denied {
        /// Disposition message from the CA.
        message: String,
    },

    /// CA could not hand out the certificate.
    NotRetrieved {
        /// Disposition message from the CA.
        message: String,
    },
}

/// How a transport failure is reported to certmonger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The CA answered, but without a certificate.
    Recoverable,
    /// Anything else went wrong.
    Unexpected,
}

/// Normalized result of one CA call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaOutcome {
    /// Certificate was issued.
    Issued(String),
    /// Request is pending; carries the request id.
    Pending(String),
    /// Request was denied; carries the CA's message.
    Denied(String),
    /// The CA interaction failed.
    TransportFailure {
        /// Human readable message, printed verbatim.
        message: String,
        /// Recoverable or unexpected.
        kind: FailureKind,
    },
}

impl CaOutcome {
    /// Create a recoverable transport failure.
    pub fn recoverable(message: impl Into<String>) -> Self {
        Self::TransportFailure {
            message: message.into(),
            kind: FailureKind::Recoverable,
        }
    }

    /// Create an unexpected transport failure.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::TransportFailure {
            message: message.into(),
            kind: FailureKind::Unexpected,
        }
    }
}

/// Encoding requested for the CA chain bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainEncoding {
    /// Base64 (served inside PEM armor by certsrv).
    #[default]
    Base64,
    /// Raw DER.
    Binary,
}

impl ChainEncoding {
    /// Value of the `Enc` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::Base64 => "b64",
            Self::Binary => "bin",
        }
    }
}

/// Content types used by the certsrv pages.
pub mod content_types {
    /// Issued certificate.
    pub const PKIX_CERT: &str = "application/pkix-cert";
}

/// certsrv page paths.
pub mod pages {
    /// Request submission page.
    pub const SUBMIT: &str = "certfnsh.asp";

    /// Certificate download page.
    pub const CERTIFICATE: &str = "certnew.cer";

    /// CA chain download page.
    pub const CHAIN: &str = "certnew.p7b";
}
