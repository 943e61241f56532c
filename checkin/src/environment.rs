//! Check-in environment.
//!
//! Everything the reducer's effects need: the ticket service, the operator
//! session, and a clock.

use crate::providers::TicketApi;
use crate::session::Session;
use std::sync::Arc;
use turnstile_core::environment::Clock;

/// Dependencies of [`CheckInReducer`](crate::reducer::CheckInReducer).
///
/// # Type Parameters
///
/// - `A`: ticket service
#[derive(Clone)]
pub struct CheckInEnvironment<A>
where
    A: TicketApi + Clone,
{
    /// Ticket service.
    pub api: A,

    /// Signed-in operator; `None` makes every call fail before dispatch.
    pub session: Option<Session>,

    /// Timestamps for results.
    pub clock: Arc<dyn Clock>,
}

impl<A> CheckInEnvironment<A>
where
    A: TicketApi + Clone,
{
    /// Create a new environment.
    #[must_use]
    pub fn new(api: A, session: Option<Session>, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            session,
            clock,
        }
    }
}
