//! Ticket verification.
//!
//! Maps every possible answer of the mark-used endpoint onto a
//! display-ready [`VerificationOutcome`]. Nothing is propagated: transport
//! failures become an invalid outcome with a retry hint.

use crate::error::CheckInError;
use crate::providers::TicketApi;
use crate::session::Session;
use crate::types::{EventId, Outcome, VerificationOutcome};

/// Shown when the service accepts a ticket without a message.
pub const VERIFIED_MESSAGE: &str = "Ticket verified & checked in successfully";

/// Shown when the service rejects a ticket without a message.
pub const INVALID_MESSAGE: &str = "Invalid ticket or already used";

/// Shown when the service could not be reached or answered garbage.
pub const FAILED_MESSAGE: &str = "Verification failed. Please try again.";

/// Shown when there is no session; the request is never sent.
pub const NOT_SIGNED_IN_MESSAGE: &str = "Not signed in. Please sign in again.";

/// Verify `ticket_code` for `event_id` and mark it used.
///
/// Sends exactly one request, or none when `session` is `None`.
#[tracing::instrument(skip(api, session), fields(event_id = %event_id))]
pub async fn verify<A: TicketApi>(
    api: &A,
    session: Option<&Session>,
    event_id: &EventId,
    ticket_code: &str,
) -> VerificationOutcome {
    let outcome = match session {
        Some(session) => match api.mark_used(session, event_id, ticket_code).await {
            Ok(receipt) => VerificationOutcome::success(
                receipt.message.unwrap_or_else(|| VERIFIED_MESSAGE.to_string()),
            ),
            Err(error) => outcome_for_error(&error),
        },
        None => {
            tracing::warn!("Verification attempted without a session");
            VerificationOutcome::invalid(NOT_SIGNED_IN_MESSAGE)
        },
    };

    let label = match outcome.outcome {
        Outcome::Success => "success",
        Outcome::Invalid => "invalid",
    };
    metrics::counter!("checkin.verifications", "outcome" => label).increment(1);
    tracing::info!(outcome = label, "Ticket verification finished");

    outcome
}

/// Invalid outcome for a failed mark-used call.
#[must_use]
pub fn outcome_for_error(error: &CheckInError) -> VerificationOutcome {
    match error {
        CheckInError::Http { .. } | CheckInError::Rejected { .. } => {
            VerificationOutcome::invalid(error.server_message().unwrap_or(INVALID_MESSAGE))
        },
        CheckInError::MissingSession => VerificationOutcome::invalid(NOT_SIGNED_IN_MESSAGE),
        CheckInError::Transport(_) | CheckInError::Decode(_) | CheckInError::Config(_) => {
            tracing::warn!(%error, "Verification request failed");
            VerificationOutcome::invalid(FAILED_MESSAGE)
        },
    }
}
