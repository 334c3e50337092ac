//! Response classification.
//!
//! Maps what an adapter returned onto the four outcomes certmonger knows
//! about. Every [`CaReply`] variant is matched explicitly; the `Err` side is
//! the catch-all for transport faults.

use crate::error::Result;
use crate::types::{CaOutcome, CaReply};

/// Disposition certsrv reports while a request still waits for approval.
pub const TAKEN_UNDER_SUBMISSION: &str = "Taken Under Submission";

/// Returns true if a "could not retrieve" message really means "pending".
///
/// When polled, certsrv answers a request that is still waiting for a CA
/// manager with its certificate download error page, whose disposition is
/// "Taken Under Submission".
pub fn is_taken_under_submission(message: &str) -> bool {
    message.contains(TAKEN_UNDER_SUBMISSION)
}

/// Classify the answer to a submission.
pub fn classify_submission(result: Result<CaReply>) -> CaOutcome {
    match result {
        Ok(CaReply::Issued { certificate }) => CaOutcome::Issued(certificate),
        Ok(CaReply::Pending { request_id }) => CaOutcome::Pending(request_id),
        Ok(CaReply::Denied { message }) => CaOutcome::Denied(message),
        Ok(CaReply::NotRetrieved { message }) => CaOutcome::recoverable(message),
        Err(e) => CaOutcome::unexpected(e.to_string()),
    }
}

/// Classify the answer to a poll for `request_id`.
///
/// A "taken under submission" answer keeps the request pending under its
/// original id.
pub fn classify_poll(result: Result<CaReply>, request_id: &str) -> CaOutcome {
    match result {
        Ok(CaReply::NotRetrieved { message }) if is_taken_under_submission(&message) => {
            CaOutcome::Pending(request_id.to_string())
        }
        other => classify_submission(other),
    }
}
