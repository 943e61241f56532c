//! In-memory ticket service for tests and demos.

use crate::error::{CheckInError, Result};
use crate::providers::TicketApi;
use crate::session::Session;
use crate::types::{CheckInReceipt, Event, EventId, SummaryReport};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A call received by [`MockTicketApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    /// `list_events`
    ListEvents {
        /// Tenant of the calling session
        tenant_id: String,
    },
    /// `mark_used`
    MarkUsed {
        /// Event the ticket was checked against
        event_id: EventId,
        /// Ticket code as sent
        ticket_code: String,
    },
    /// `event_summary`
    EventSummary {
        /// Event requested
        event_id: EventId,
    },
}

#[derive(Debug)]
struct MockInner {
    events: Result<Vec<Event>>,
    verdicts: HashMap<String, Result<CheckInReceipt>>,
    verification_delays: HashMap<String, Duration>,
    summaries: HashMap<EventId, Result<SummaryReport>>,
    summary_delay: Duration,
    calls: Vec<ApiCall>,
}

/// Mock ticket service.
///
/// Responses are scripted per ticket code and per event; every call is
/// recorded. Unknown ticket codes are rejected the way the real service
/// rejects them, unknown events answer HTTP 404.
#[derive(Debug, Clone)]
pub struct MockTicketApi {
    inner: Arc<Mutex<MockInner>>,
}

impl MockTicketApi {
    /// Create a mock with no events and no known tickets.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockInner {
                events: Ok(Vec::new()),
                verdicts: HashMap::new(),
                verification_delays: HashMap::new(),
                summaries: HashMap::new(),
                summary_delay: Duration::ZERO,
                calls: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Events returned by `list_events`.
    #[must_use]
    pub fn with_events(self, events: Vec<Event>) -> Self {
        self.lock().events = Ok(events);
        self
    }

    /// Make `list_events` fail.
    #[must_use]
    pub fn with_events_error(self, error: CheckInError) -> Self {
        self.lock().events = Err(error);
        self
    }

    /// Accept `ticket_code` with the given server message.
    #[must_use]
    pub fn with_valid_ticket(self, ticket_code: &str, message: Option<&str>) -> Self {
        self.with_verdict(
            ticket_code,
            Ok(CheckInReceipt {
                message: message.map(str::to_string),
            }),
        )
    }

    /// Script the response for `ticket_code`.
    #[must_use]
    pub fn with_verdict(self, ticket_code: &str, verdict: Result<CheckInReceipt>) -> Self {
        self.lock().verdicts.insert(ticket_code.to_string(), verdict);
        self
    }

    /// Delay the response for `ticket_code`.
    #[must_use]
    pub fn with_verification_delay(self, ticket_code: &str, delay: Duration) -> Self {
        self.lock()
            .verification_delays
            .insert(ticket_code.to_string(), delay);
        self
    }

    /// Summary returned for `event_id`.
    #[must_use]
    pub fn with_summary(self, event_id: &EventId, report: SummaryReport) -> Self {
        self.lock().summaries.insert(event_id.clone(), Ok(report));
        self
    }

    /// Make the summary of `event_id` fail.
    #[must_use]
    pub fn with_summary_error(self, event_id: &EventId, error: CheckInError) -> Self {
        self.lock().summaries.insert(event_id.clone(), Err(error));
        self
    }

    /// Delay every summary response.
    #[must_use]
    pub fn with_summary_delay(self, delay: Duration) -> Self {
        self.lock().summary_delay = delay;
        self
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    /// Only the `mark_used` calls.
    #[must_use]
    pub fn mark_used_calls(&self) -> Vec<(EventId, String)> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ApiCall::MarkUsed {
                    event_id,
                    ticket_code,
                } => Some((event_id.clone(), ticket_code.clone())),
                _ => None,
            })
            .collect()
    }
}

impl Default for MockTicketApi {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketApi for MockTicketApi {
    fn list_events(&self, session: &Session) -> impl Future<Output = Result<Vec<Event>>> + Send {
        let result = {
            let mut inner = self.lock();
            inner.calls.push(ApiCall::ListEvents {
                tenant_id: session.tenant_id.clone(),
            });
            inner.events.clone()
        };

        async move { result }
    }

    fn mark_used(
        &self,
        _session: &Session,
        event_id: &EventId,
        ticket_code: &str,
    ) -> impl Future<Output = Result<CheckInReceipt>> + Send {
        let (result, delay) = {
            let mut inner = self.lock();
            inner.calls.push(ApiCall::MarkUsed {
                event_id: event_id.clone(),
                ticket_code: ticket_code.to_string(),
            });
            let result = inner.verdicts.get(ticket_code).cloned().unwrap_or_else(|| {
                Err(CheckInError::Rejected {
                    message: Some("Ticket not found".to_string()),
                })
            });
            let delay = inner
                .verification_delays
                .get(ticket_code)
                .copied()
                .unwrap_or_default();
            (result, delay)
        };

        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }

    fn event_summary(
        &self,
        _session: &Session,
        event_id: &EventId,
    ) -> impl Future<Output = Result<SummaryReport>> + Send {
        let (result, delay) = {
            let mut inner = self.lock();
            inner.calls.push(ApiCall::EventSummary {
                event_id: event_id.clone(),
            });
            let result = inner.summaries.get(event_id).cloned().unwrap_or_else(|| {
                Err(CheckInError::Http {
                    status: 404,
                    message: Some("Event not found".to_string()),
                })
            });
            (result, inner.summary_delay)
        };

        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }
}
