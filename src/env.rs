//! Read-only view of the certmonger environment.
//!
//! certmonger passes everything through `CERTMONGER_*` variables. The view is
//! captured once at start-up so handlers never touch the process environment
//! directly.

use std::collections::BTreeMap;

use crate::error::{CertsrvError, Result};
use crate::types::{EnrollmentRequest, Operation};

/// Prefix shared by every variable certmonger sets.
pub const PREFIX: &str = "CERTMONGER_";

/// Requested operation.
pub const OPERATION: &str = "CERTMONGER_OPERATION";

/// Template (CA profile) name.
pub const CA_PROFILE: &str = "CERTMONGER_CA_PROFILE";

/// PEM-encoded certificate signing request.
pub const CSR: &str = "CERTMONGER_CSR";

/// Request identifier echoed back from an earlier pending answer.
pub const CA_COOKIE: &str = "CERTMONGER_CA_COOKIE";

/// Snapshot of the `CERTMONGER_*` variables.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Capture the current process environment.
    pub fn from_process() -> Self {
        Self::from_pairs(std::env::vars_os().filter_map(|(k, v)| {
            Some((k.into_string().ok()?, v.into_string().ok()?))
        }))
    }

    /// Build a view from arbitrary pairs, keeping only `CERTMONGER_*` names.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| k.starts_with(PREFIX))
            .collect();
        Self { vars }
    }

    /// Get a variable, treating empty values as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Iterate over every captured variable in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The requested operation.
    pub fn operation(&self) -> Operation {
        Operation::from_env_value(self.vars.get(OPERATION).map(String::as_str))
    }

    /// Build a submission from the CSR and template variables.
    ///
    /// An absent or empty `CERTMONGER_CA_PROFILE` falls back to
    /// `default_template`.
    pub fn submission(&self, default_template: &str) -> Result<EnrollmentRequest> {
        let csr = self
            .get(CSR)
            .ok_or_else(|| CertsrvError::missing_variable(CSR))?;

        let template = match self.get(CA_PROFILE) {
            Some(profile) => profile,
            None if !default_template.is_empty() => default_template,
            None => return Err(CertsrvError::missing_variable(CA_PROFILE)),
        };

        Ok(EnrollmentRequest::submission(csr, template))
    }

    /// Build a poll from the cookie certmonger kept for a pending request.
    pub fn poll(&self) -> Result<EnrollmentRequest> {
        let request_id = self
            .get(CA_COOKIE)
            .ok_or_else(|| CertsrvError::missing_variable(CA_COOKIE))?;

        Ok(EnrollmentRequest::poll(request_id.trim()))
    }
}
