//! Exit contract with certmonger.
//!
//! certmonger reads the helper's stdout and exit status and nothing else.
//! The codes below are a fixed protocol and must never be renumbered.

use std::io::Write;
use std::process::ExitCode;

use crate::error::CertsrvError;
use crate::types::{CaOutcome, FailureKind};

/// Exit statuses understood by certmonger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Success, stdout carries the answer.
    Success,
    /// Request pending, stdout carries the cookie to poll with.
    Pending,
    /// Request rejected.
    Rejected,
    /// Configuration missing or unusable.
    ConfigError,
    /// Anything unexpected.
    Failure,
    /// Operation not implemented.
    NotImplemented,
}

impl ExitStatus {
    /// The numeric exit code.
    pub fn code(&self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Pending => 1,
            Self::Rejected => 2,
            Self::ConfigError => 3,
            Self::Failure => 4,
            Self::NotImplemented => 6,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// Everything the helper hands back to certmonger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Text written to stdout.
    pub stdout: String,
    /// Process exit status.
    pub status: ExitStatus,
}

impl Response {
    /// Successful answer; `text` gets a trailing newline if it lacks one.
    pub fn success(text: impl AsRef<str>) -> Self {
        Self::with_line(text, ExitStatus::Success)
    }

    /// Successful answer written exactly as given.
    pub fn verbatim(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            status: ExitStatus::Success,
        }
    }

    /// Successful answer listing one item per line.
    pub fn lines<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stdout = items
            .into_iter()
            .map(|item| format!("{}\n", item.as_ref()))
            .collect();

        Self {
            stdout,
            status: ExitStatus::Success,
        }
    }

    /// Nothing to say; certmonger treats the operation as unsupported.
    pub fn not_implemented() -> Self {
        Self {
            stdout: String::new(),
            status: ExitStatus::NotImplemented,
        }
    }

    /// Configuration could not be loaded.
    pub fn config_error(error: &CertsrvError) -> Self {
        Self::with_line(error.to_string(), ExitStatus::ConfigError)
    }

    /// Unexpected failure outside any CA call.
    pub fn failure(error: &CertsrvError) -> Self {
        Self::with_line(error.to_string(), ExitStatus::Failure)
    }

    /// Render a classified CA outcome.
    pub fn from_outcome(outcome: CaOutcome) -> Self {
        match outcome {
            CaOutcome::Issued(certificate) => Self::with_line(certificate, ExitStatus::Success),
            CaOutcome::Pending(request_id) => Self::with_line(request_id, ExitStatus::Pending),
            CaOutcome::Denied(message) => Self::with_line(message, ExitStatus::Rejected),
            CaOutcome::TransportFailure {
                message,
                kind: FailureKind::Recoverable,
            } => Self::with_line(message, ExitStatus::Rejected),
            CaOutcome::TransportFailure {
                message,
                kind: FailureKind::Unexpected,
            } => Self::with_line(message, ExitStatus::Failure),
        }
    }

    /// Write stdout and return the exit code.
    pub fn emit(self) -> ExitCode {
        tracing::info!(
            exit_code = self.status.code(),
            stdout = %self.stdout.trim_end(),
            "Operation finished"
        );

        let mut stdout = std::io::stdout().lock();
        if stdout.write_all(self.stdout.as_bytes()).is_err() || stdout.flush().is_err() {
            return ExitStatus::Failure.into();
        }

        self.status.into()
    }

    fn with_line(text: impl AsRef<str>, status: ExitStatus) -> Self {
        let text = text.as_ref().trim_end();
        let stdout = if text.is_empty() {
            String::new()
        } else {
            format!("{}\n", text)
        };

        Self { stdout, status }
    }
}
