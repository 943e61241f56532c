//! Actions of the check-in screen.
//!
//! Operator input and service responses share one type; responses carry the
//! [`RequestToken`] of the cycle that asked for them.

use crate::error::CheckInError;
use crate::state::RequestToken;
use crate::types::{Event, EventId, SummaryReport, VerificationOutcome};

/// Input to [`CheckInReducer`](crate::reducer::CheckInReducer)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckInAction {
    // ========== Event selector ==========
    /// Fetch ongoing and upcoming events
    LoadEvents,
    /// Event list arrived
    EventsLoaded {
        /// Events or the failure
        result: Result<Vec<Event>, CheckInError>,
    },
    /// Make `event_id` the active event
    SelectEvent {
        /// One of the loaded events
        event_id: EventId,
    },

    // ========== Ticket input ==========
    /// The input field changed
    InputChanged {
        /// New raw text
        text: String,
    },
    /// Enter / search: verify the trimmed input
    Submit,
    /// A code was scanned: fill the input and verify it
    QrScanned {
        /// Decoded QR content
        payload: String,
    },

    // ========== Verification ==========
    /// Verification response
    VerificationCompleted {
        /// Cycle the response belongs to
        request: RequestToken,
        /// Mapped result
        outcome: VerificationOutcome,
    },
    /// "Check-In" on a successful result: repeat the mark-used call
    ConfirmCheckIn,

    // ========== Attendance summary ==========
    /// Show the summary of the active event
    OpenSummary,
    /// Summary response
    SummaryLoaded {
        /// Cycle the response belongs to
        request: RequestToken,
        /// Event it was requested for
        event_id: EventId,
        /// Report or the failure
        result: Result<SummaryReport, CheckInError>,
    },
    /// Back to the ticket input
    CloseSummary,
    /// Jump to a 1-based page (clamped)
    SetSummaryPage {
        /// Requested page
        page: usize,
    },
    /// Next attendee page
    NextPage,
    /// Previous attendee page
    PreviousPage,
}
