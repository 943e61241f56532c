//! Domain types for the check-in workflow.
//!
//! These mirror the JSON the ticket service sends (camelCase field names).
//! Nothing here is cached: every value is fetched fresh and owned by the
//! state that requested it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of an event, as issued by the ticket service
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Creates an `EventId` from any string
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// An ongoing or upcoming event the operator can check tickets for
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event id (`_id` in documents straight from the database)
    #[serde(alias = "_id")]
    pub id: EventId,
    /// Display name
    pub name: String,
}

impl Event {
    /// Creates a new event
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: EventId::new(id),
            name: name.into(),
        }
    }
}

/// Result class of a verification attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Ticket accepted and marked used
    Success,
    /// Ticket rejected, already used, or the call failed
    Invalid,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Invalid => f.write_str("invalid"),
        }
    }
}

/// Display-ready result of one verification call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    /// Success or invalid
    pub outcome: Outcome,
    /// Message to show the operator
    pub message: String,
}

impl VerificationOutcome {
    /// A successful check-in
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Success,
            message: message.into(),
        }
    }

    /// A rejected or failed check-in
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Invalid,
            message: message.into(),
        }
    }

    /// Whether the ticket was accepted
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

/// A verification outcome together with what was verified
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    /// Event the ticket was checked against
    pub event_id: EventId,
    /// Trimmed ticket code that was sent
    pub ticket_code: String,
    /// What the service said
    pub outcome: VerificationOutcome,
    /// When the response was applied
    pub received_at: DateTime<Utc>,
}

/// Aggregate attendance counts for one event
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    /// Tickets sold
    pub total_tickets: u32,
    /// Tickets already checked in
    pub checked_in: u32,
    /// Tickets not yet checked in
    pub remaining: u32,
}

impl EventSummary {
    /// `checked_in + remaining == total_tickets`
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        u64::from(self.checked_in) + u64::from(self.remaining) == u64::from(self.total_tickets)
    }
}

/// One ticket holder in the attendance list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    /// Attendee (order) id
    #[serde(alias = "_id")]
    pub id: String,
    /// Full name
    pub name: String,
    /// Contact email
    #[serde(default)]
    pub email: String,
    /// Postal address
    #[serde(default)]
    pub address: String,
    /// Tickets held
    pub quantity: u32,
    /// Tickets of this holder already checked in
    pub checked_in_count: u32,
    /// Tickets of this holder not yet checked in
    pub remaining_count: u32,
}

impl Attendee {
    /// `checked_in_count + remaining_count == quantity`
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        u64::from(self.checked_in_count) + u64::from(self.remaining_count)
            == u64::from(self.quantity)
    }
}

/// Payload of the event summary endpoint
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryReport {
    /// Aggregate counts
    pub summary: EventSummary,
    /// Every attendee; paged on the client
    #[serde(default)]
    pub attendees: Vec<Attendee>,
}

/// Acknowledgement returned when a ticket is marked used
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInReceipt {
    /// Message from the service, if any
    #[serde(default)]
    pub message: Option<String>,
}
