//! State of the check-in screen.

use crate::error::CheckInError;
use crate::pagination::Pagination;
use crate::types::{Attendee, Event, EventId, EventSummary, VerificationResult};

/// Identifies one request cycle.
///
/// Tokens increase monotonically per state; a response is applied only if
/// it carries the token of the cycle still waiting for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    /// Raw token value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Where the current verification cycle is.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum VerificationPhase {
    /// Empty input, nothing shown
    #[default]
    Idle,
    /// The operator is entering a code
    Scanning,
    /// Waiting for the service
    Verifying {
        /// Token of the pending request
        request: RequestToken,
        /// Event the ticket is checked against
        event_id: EventId,
        /// Trimmed code sent
        ticket_code: String,
    },
    /// The last outcome, shown until the input changes
    Completed(VerificationResult),
}

impl VerificationPhase {
    /// Nothing entered, nothing shown
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// A request is pending
    #[must_use]
    pub const fn is_verifying(&self) -> bool {
        matches!(self, Self::Verifying { .. })
    }

    /// The displayed result, if any
    #[must_use]
    pub const fn result(&self) -> Option<&VerificationResult> {
        match self {
            Self::Completed(result) => Some(result),
            _ => None,
        }
    }
}

/// Which panel is shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum View {
    /// Ticket input and result
    #[default]
    Verify,
    /// Attendance summary
    Summary,
}

/// Attendance summary panel.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SummaryState {
    /// Event the loaded data belongs to
    pub event_id: Option<EventId>,
    /// Aggregate counts
    pub summary: Option<EventSummary>,
    /// Full attendee list
    pub attendees: Vec<Attendee>,
    /// Client-side paging over `attendees`
    pub pagination: Pagination,
    /// Pending load
    pub loading: Option<RequestToken>,
    /// Last load failure; prior data is kept alongside it
    pub error: Option<CheckInError>,
}

impl SummaryState {
    /// Attendees on the current page
    #[must_use]
    pub fn page(&self) -> &[Attendee] {
        self.pagination.slice(&self.attendees)
    }

    /// Number of attendee pages
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.pagination.total_pages(self.attendees.len())
    }

    /// Drop data that belongs to another event
    pub fn clear(&mut self) {
        let page_size = self.pagination.page_size();
        *self = Self {
            pagination: Pagination::new(page_size),
            ..Self::default()
        };
    }
}

/// Everything the check-in screen shows.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct CheckInState {
    /// Ongoing and upcoming events
    pub events: Vec<Event>,
    /// An event list request is pending
    pub events_loading: bool,
    /// Last event list failure
    pub events_error: Option<CheckInError>,
    /// Active event
    pub selected_event: Option<EventId>,
    /// Raw ticket input
    pub input: String,
    /// Verification cycle
    pub verification: VerificationPhase,
    /// Visible panel
    pub view: View,
    /// Attendance summary
    pub summary: SummaryState,
    last_request: u64,
}

impl CheckInState {
    /// Empty state with the given summary page size
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            summary: SummaryState {
                pagination: Pagination::new(page_size),
                ..SummaryState::default()
            },
            ..Self::default()
        }
    }

    /// The selected event, if it is in the list
    #[must_use]
    pub fn selected(&self) -> Option<&Event> {
        let id = self.selected_event.as_ref()?;
        self.events.iter().find(|event| &event.id == id)
    }

    /// Whether `id` is one of the loaded events
    #[must_use]
    pub fn has_event(&self, id: &EventId) -> bool {
        self.events.iter().any(|event| &event.id == id)
    }

    /// Hand out the next request token
    pub const fn issue_request(&mut self) -> RequestToken {
        self.last_request += 1;
        RequestToken(self.last_request)
    }

    /// Phase that reflects the input alone
    #[must_use]
    pub fn input_phase(&self) -> VerificationPhase {
        if self.input.trim().is_empty() {
            VerificationPhase::Idle
        } else {
            VerificationPhase::Scanning
        }
    }
}
