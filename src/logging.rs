//! Audit logging.
//!
//! stdout belongs to certmonger, so diagnostics go to an append-only file
//! instead. Every invocation records the `CERTMONGER_*` variables it was
//! started with and the outcome it handed back.
//!
//! | Variable            | Default                               |
//! |---------------------|---------------------------------------|
//! | `CERTSRV_AUDIT_LOG` | `/var/log/certmonger-certsrv.log`     |
//! | `CERTSRV_LOG`       | `info` (any `EnvFilter` directive)    |

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::EnvFilter;

use crate::env::Environment;
use crate::error::{CertsrvError, Result};

/// Default audit log location.
pub const DEFAULT_AUDIT_LOG: &str = "/var/log/certmonger-certsrv.log";

/// Environment variable overriding the audit log location.
pub const AUDIT_LOG_ENV: &str = "CERTSRV_AUDIT_LOG";

/// Environment variable holding the log filter.
pub const LOG_FILTER_ENV: &str = "CERTSRV_LOG";

/// Where the audit log goes for this process.
pub fn audit_log_path() -> PathBuf {
    std::env::var_os(AUDIT_LOG_ENV)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_AUDIT_LOG))
}

/// Filter from `CERTSRV_LOG`, `info` when unset or invalid.
pub fn filter_from_env() -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Build a subscriber writing plain-text lines to `file`.
pub fn audit_subscriber(file: File, filter: EnvFilter) -> impl Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .finish()
}

/// Install the audit log as the global subscriber.
///
/// # Errors
///
/// Fails if the file cannot be opened for appending or a subscriber is
/// already installed. Callers are expected to carry on without logging.
pub fn init_audit_log(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CertsrvError::config(format!("Cannot open {}: {e}", path.display())))?;

    tracing::subscriber::set_global_default(audit_subscriber(file, filter_from_env()))
        .map_err(|e| CertsrvError::config(format!("Cannot install audit log: {e}")))
}

/// Record the variables certmonger passed in.
pub fn log_environment(env: &Environment) {
    tracing::info!("Invoked with {} certmonger variables", env.iter().count());
    for (name, value) in env.iter() {
        tracing::info!("{}={}", name, value);
    }
}
