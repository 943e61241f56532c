//! Provider traits for the check-in workflow.
//!
//! The reducer never talks HTTP itself; it calls a [`TicketApi`] injected
//! through the environment. Production uses
//! [`HttpTicketApi`](crate::client::HttpTicketApi), tests use
//! `MockTicketApi`.

use crate::error::Result;
use crate::session::Session;
use crate::types::{CheckInReceipt, Event, EventId, SummaryReport};
use std::future::Future;

/// Remote ticket service.
///
/// Every call is authenticated and tenant-scoped by `session`. Implementations
/// map a `success: false` body to [`CheckInError::Rejected`] and a non-2xx
/// status to [`CheckInError::Http`].
///
/// [`CheckInError::Rejected`]: crate::error::CheckInError::Rejected
/// [`CheckInError::Http`]: crate::error::CheckInError::Http
pub trait TicketApi: Send + Sync {
    /// List ongoing and upcoming events for the session's tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    fn list_events(&self, session: &Session) -> impl Future<Output = Result<Vec<Event>>> + Send;

    /// Validate a ticket and mark it used.
    ///
    /// The service owns the single-use rule: marking an already used ticket
    /// is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the ticket is rejected.
    fn mark_used(
        &self,
        session: &Session,
        event_id: &EventId,
        ticket_code: &str,
    ) -> impl Future<Output = Result<CheckInReceipt>> + Send;

    /// Fetch attendance counts and the full attendee list of an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    fn event_summary(
        &self,
        session: &Session,
        event_id: &EventId,
    ) -> impl Future<Output = Result<SummaryReport>> + Send;
}
