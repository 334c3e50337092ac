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

//! Configuration for the certsrv helper.
//!
//! The helper keeps one flat TOML record with the CA endpoint, the account
//! used to authenticate against it and the default template:
//!
//! ```toml
//! server = "https://ca.example.com"
//! username = "EXAMPLE\\svc-certmonger"
//! password = "c2VjcmV0"
//! default_template = "WebServer"
//! ```
//!
//! The password is base64-obfuscated so it does not show up in plain text
//! when someone glances at the file. That is concealment, not encryption;
//! the file itself must stay readable by root only, which [`ConfigLoader::store`]
//! takes care of.
//!
//! # Search Order
//!
//! 1. Explicit path (if set via [`ConfigLoader::with_path`])
//! 2. Environment variable `CERTSRV_CONFIG_PATH`
//! 3. `/etc/certmonger/certsrv.toml`

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::prelude::*;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CertsrvError, Result};

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/certmonger/certsrv.toml";

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "CERTSRV_CONFIG_PATH";

/// Request timeout used when the file does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// On-disk configuration record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// CA web-enrollment endpoint (host name or URL).
    pub server: String,

    /// Account used to authenticate against the CA.
    pub username: String,

    /// Obfuscated password, see [`obfuscate`].
    pub password: String,

    /// Template used when certmonger does not name one.
    #[serde(default)]
    pub default_template: String,

    /// Extra PEM trust anchors for the CA's HTTPS endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_bundle: Option<PathBuf>,

    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ConfigFile {
    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| CertsrvError::config(format!("Invalid TOML: {e}")))
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CertsrvError::config(format!("TOML serialize: {e}")))
    }

    /// Validate the record and turn it into usable credentials.
    pub fn into_credentials(self) -> Result<Credentials> {
        if self.username.trim().is_empty() {
            return Err(CertsrvError::config("username is required"));
        }

        let ca_endpoint = parse_endpoint(&self.server)?;
        let secret = reveal(&self.password)?;

        Ok(Credentials {
            identity: self.username,
            secret,
            ca_endpoint,
            default_template: self.default_template,
            ca_bundle: self.ca_bundle,
            timeout: self
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
        })
    }
}

/// Connection settings borrowed by every CA operation.
#[derive(Clone)]
pub struct Credentials {
    /// Account name.
    pub identity: String,

    /// Plain-text password.
    pub secret: String,

    /// Base URL of the CA web server.
    pub ca_endpoint: Url,

    /// Template used when certmonger does not name one (may be empty).
    pub default_template: String,

    /// Extra PEM trust anchors for the CA's HTTPS endpoint.
    pub ca_bundle: Option<PathBuf>,

    /// Request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("secret", &"<redacted>")
            .field("ca_endpoint", &self.ca_endpoint)
            .field("default_template", &self.default_template)
            .field("ca_bundle", &self.ca_bundle)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Credentials {
    /// Create credentials for the given endpoint.
    pub fn new(identity: impl Into<String>, secret: impl Into<String>, ca_endpoint: Url) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
            ca_endpoint,
            default_template: String::new(),
            ca_bundle: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the default template.
    pub fn with_default_template(mut self, template: impl Into<String>) -> Self {
        self.default_template = template.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the URL of a certsrv page.
    pub fn build_url(&self, page: &str) -> Url {
        let mut url = self.ca_endpoint.clone();
        url.set_path(&format!("/certsrv/{}", page));
        url.set_query(None);
        url
    }
}

impl From<&Credentials> for ConfigFile {
    fn from(credentials: &Credentials) -> Self {
        Self {
            server: credentials.ca_endpoint.to_string(),
            username: credentials.identity.clone(),
            password: obfuscate(&credentials.secret),
            default_template: credentials.default_template.clone(),
            ca_bundle: credentials.ca_bundle.clone(),
            timeout_secs: Some(credentials.timeout.as_secs()),
        }
    }
}

/// Parse the configured server into a base URL.
///
/// A bare host name (optionally with a port) is taken to be HTTPS.
pub fn parse_endpoint(server: &str) -> Result<Url> {
    let server = server.trim();
    if server.is_empty() {
        return Err(CertsrvError::config("server is required"));
    }

    let candidate = if server.contains("://") {
        server.to_string()
    } else {
        format!("https://{}", server)
    };

    Url::parse(&candidate)
        .map_err(|e| CertsrvError::config(format!("Invalid server '{}': {}", server, e)))
}

/// Obfuscate a secret for storage.
pub fn obfuscate(secret: &str) -> String {
    BASE64_STANDARD.encode(secret.as_bytes())
}

/// Reverse [`obfuscate`].
pub fn reveal(obfuscated: &str) -> Result<String> {
    let bytes = BASE64_STANDARD
        .decode(obfuscated.trim())
        .map_err(|e| CertsrvError::config(format!("Stored password is not valid: {e}")))?;

    String::from_utf8(bytes)
        .map_err(|_| CertsrvError::config("Stored password is not valid UTF-8"))
}

/// Configuration file loader with discovery and atomic storage.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Explicit configuration file path.
    explicit_path: Option<PathBuf>,

    /// Environment variable name for config path override.
    env_var_name: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings.
    pub fn new() -> Self {
        Self {
            explicit_path: None,
            env_var_name: CONFIG_PATH_ENV.to_string(),
        }
    }

    /// Set an explicit configuration file path.
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.explicit_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable name for path override.
    pub fn with_env_var(mut self, name: impl Into<String>) -> Self {
        self.env_var_name = name.into();
        self
    }

    /// The configuration file this loader reads and writes.
    pub fn path(&self) -> PathBuf {
        if let Some(ref path) = self.explicit_path {
            return path.clone();
        }

        match std::env::var(&self.env_var_name) {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Load and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CertsrvError::Config`] if the file is missing, unreadable,
    /// not valid TOML, or fails validation.
    pub fn load(&self) -> Result<Credentials> {
        self.load_file()?.into_credentials()
    }

    /// Load the raw record without validating it.
    pub fn load_file(&self) -> Result<ConfigFile> {
        let path = self.path();
        tracing::debug!("Loading configuration from {}", path.display());

        let content = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CertsrvError::config(format!(
                    "{} not found, run with --config to create it",
                    path.display()
                ))
            } else {
                CertsrvError::config(format!("Failed to read {}: {e}", path.display()))
            }
        })?;

        ConfigFile::from_toml(&content)
    }

    /// Write the record, replacing any existing file atomically.
    ///
    /// The data goes to a temporary file in the target directory, is synced,
    /// restricted to the owner, and then renamed over the target.
    pub fn store(&self, config: &ConfigFile) -> Result<()> {
        let path = self.path();
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let toml = config.to_toml()?;
        let storage_error =
            |e: std::io::Error| CertsrvError::config(format!("Failed to write {}: {e}", path.display()));

        std::fs::create_dir_all(&dir).map_err(storage_error)?;

        let mut file = tempfile::NamedTempFile::new_in(&dir).map_err(storage_error)?;
        restrict_permissions(file.as_file()).map_err(storage_error)?;
        file.write_all(toml.as_bytes()).map_err(storage_error)?;
        file.as_file().sync_all().map_err(storage_error)?;
        file.persist(&path).map_err(|e| storage_error(e.error))?;

        tracing::info!("Configuration written to {}", path.display());
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}
