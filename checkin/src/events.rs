//! Event list loading for the event selector.

use crate::error::{CheckInError, Result};
use crate::providers::TicketApi;
use crate::session::Session;
use crate::types::Event;

/// Fetch ongoing and upcoming events for the session's tenant.
///
/// # Errors
///
/// - [`CheckInError::MissingSession`] without a session (nothing is sent)
/// - any error of [`TicketApi::list_events`]
#[tracing::instrument(skip_all)]
pub async fn load_events<A: TicketApi>(api: &A, session: Option<&Session>) -> Result<Vec<Event>> {
    let session = session.ok_or(CheckInError::MissingSession)?;

    api.list_events(session)
        .await
        .inspect(|events| tracing::info!(count = events.len(), "Loaded events"))
        .inspect_err(|error| tracing::warn!(%error, "Failed to load events"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic
mod tests {
    use super::*;
    use crate::mocks::{ApiCall, MockTicketApi};
    use crate::session::Role;

    #[tokio::test]
    async fn test_loads_events_for_tenant() {
        let api = MockTicketApi::new().with_events(vec![
            Event::new("evt-1", "Launch"),
            Event::new("evt-2", "Afterparty"),
        ]);
        let session = Session::new("tok", "tenant-7", Role::Host);

        let events = load_events(&api, Some(&session)).await.unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(
            api.calls(),
            vec![ApiCall::ListEvents {
                tenant_id: "tenant-7".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_session_sends_nothing() {
        let api = MockTicketApi::new();

        assert_eq!(load_events(&api, None).await, Err(CheckInError::MissingSession));
        assert!(api.calls().is_empty());
    }
}
