//! Attendance summary loading.

use crate::error::{CheckInError, Result};
use crate::providers::TicketApi;
use crate::session::Session;
use crate::types::{EventId, SummaryReport};

/// Fetch counts and the full attendee list for `event_id`.
///
/// Rows whose counts don't add up are logged and kept; the service is the
/// source of truth.
///
/// # Errors
///
/// - [`CheckInError::MissingSession`] without a session (nothing is sent)
/// - any error of [`TicketApi::event_summary`]
#[tracing::instrument(skip(api, session), fields(event_id = %event_id))]
pub async fn load_summary<A: TicketApi>(
    api: &A,
    session: Option<&Session>,
    event_id: &EventId,
) -> Result<SummaryReport> {
    let session = session.ok_or(CheckInError::MissingSession)?;

    let report = api.event_summary(session, event_id).await.inspect_err(|error| {
        tracing::warn!(%error, "Failed to load event summary");
    })?;

    if !report.summary.is_consistent() {
        tracing::warn!(summary = ?report.summary, "Summary counts do not add up");
    }
    let inconsistent = report.attendees.iter().filter(|a| !a.is_consistent()).count();
    if inconsistent > 0 {
        tracing::warn!(inconsistent, "Attendee counts do not add up");
    }

    Ok(report)
}
