//! Reducer logic for the check-in screen.
//!
//! One shared workflow for every operator role: pick an event, verify ticket
//! codes against it, open the attendance summary. Remote calls are returned
//! as effects; each runs under a cancellation id so a newer cycle aborts the
//! older request, and each response carries the token of its cycle so a late
//! answer can never overwrite a newer one.

use crate::actions::CheckInAction;
use crate::environment::CheckInEnvironment;
use crate::events::load_events;
use crate::providers::TicketApi;
use crate::state::{CheckInState, VerificationPhase, View};
use crate::summary::load_summary;
use crate::types::{EventId, VerificationResult};
use crate::verification::verify;
use std::marker::PhantomData;
use turnstile_core::effect::{Effect, EffectId};
use turnstile_core::reducer::Reducer;
use turnstile_core::{latest_effect, smallvec, SmallVec};

/// Cancellation id of the event list request
pub const EVENTS_EFFECT: EffectId = EffectId::new("checkin.events");

/// Cancellation id of the pending verification
pub const VERIFY_EFFECT: EffectId = EffectId::new("checkin.verify");

/// Cancellation id of the pending summary load
pub const SUMMARY_EFFECT: EffectId = EffectId::new("checkin.summary");

type Effects = SmallVec<[Effect<CheckInAction>; 4]>;

/// Reducer for the check-in screen
///
/// # Type Parameters
///
/// - `A`: ticket service
pub struct CheckInReducer<A> {
    _api: PhantomData<fn() -> A>,
}

impl<A> CheckInReducer<A>
where
    A: TicketApi + Clone + 'static,
{
    /// Creates a new `CheckInReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self { _api: PhantomData }
    }

    /// Drop the result, the summary and any request tied to the active event
    fn leave_event(state: &mut CheckInState) -> Effects {
        let mut effects = Effects::new();

        if state.verification.is_verifying() {
            effects.push(Effect::Cancel(VERIFY_EFFECT));
        }
        state.verification = state.input_phase();

        if state.summary.loading.take().is_some() {
            effects.push(Effect::Cancel(SUMMARY_EFFECT));
        }
        state.summary.clear();
        state.selected_event = None;

        effects
    }

    /// Make `event_id` active and drop everything tied to the old event
    fn switch_event(
        state: &mut CheckInState,
        event_id: EventId,
        env: &CheckInEnvironment<A>,
    ) -> Effects {
        let mut effects = Self::leave_event(state);

        tracing::info!(%event_id, "Event selected");
        state.selected_event = Some(event_id);

        if state.view == View::Summary {
            effects.extend(Self::start_summary(state, env));
        }

        effects
    }

    /// Verify the trimmed input against the active event
    fn start_verification(state: &mut CheckInState, env: &CheckInEnvironment<A>) -> Effects {
        let ticket_code = state.input.trim().to_string();
        if ticket_code.is_empty() {
            return SmallVec::new();
        }

        let Some(event_id) = state.selected_event.clone() else {
            tracing::warn!("Ticket submitted with no event selected");
            return SmallVec::new();
        };

        Self::dispatch_verification(state, env, event_id, ticket_code)
    }

    fn dispatch_verification(
        state: &mut CheckInState,
        env: &CheckInEnvironment<A>,
        event_id: EventId,
        ticket_code: String,
    ) -> Effects {
        let request = state.issue_request();
        tracing::debug!(request = request.value(), %event_id, "Verifying ticket");

        state.verification = VerificationPhase::Verifying {
            request,
            event_id: event_id.clone(),
            ticket_code: ticket_code.clone(),
        };

        let api = env.api.clone();
        let session = env.session.clone();

        smallvec![latest_effect! {
            id: VERIFY_EFFECT,
            async {
                let outcome = verify(&api, session.as_ref(), &event_id, &ticket_code).await;
                Some(CheckInAction::VerificationCompleted { request, outcome })
            }
        }]
    }

    /// Fetch the summary of the active event
    fn start_summary(state: &mut CheckInState, env: &CheckInEnvironment<A>) -> Effects {
        let Some(event_id) = state.selected_event.clone() else {
            tracing::warn!("Summary requested with no event selected");
            return SmallVec::new();
        };

        let request = state.issue_request();
        state.summary.loading = Some(request);
        state.summary.error = None;

        let api = env.api.clone();
        let session = env.session.clone();

        smallvec![latest_effect! {
            id: SUMMARY_EFFECT,
            async {
                let result = load_summary(&api, session.as_ref(), &event_id).await;
                Some(CheckInAction::SummaryLoaded { request, event_id, result })
            }
        }]
    }
}

impl<A> Default for CheckInReducer<A>
where
    A: TicketApi + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for CheckInReducer<A> {
    fn clone(&self) -> Self {
        Self { _api: PhantomData }
    }
}

impl<A> std::fmt::Debug for CheckInReducer<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckInReducer").finish()
    }
}

impl<A> Reducer for CheckInReducer<A>
where
    A: TicketApi + Clone + 'static,
{
    type State = CheckInState;
    type Action = CheckInAction;
    type Environment = CheckInEnvironment<A>;

    #[allow(clippy::too_many_lines)] // One arm per screen interaction
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Event selector ==========
            CheckInAction::LoadEvents => {
                state.events_loading = true;
                state.events_error = None;

                let api = env.api.clone();
                let session = env.session.clone();

                smallvec![latest_effect! {
                    id: EVENTS_EFFECT,
                    async {
                        let result = load_events(&api, session.as_ref()).await;
                        Some(CheckInAction::EventsLoaded { result })
                    }
                }]
            },

            CheckInAction::EventsLoaded { result } => {
                state.events_loading = false;

                match result {
                    Ok(events) => {
                        state.events = events;
                        state.events_error = None;

                        let keep_selection = state
                            .selected_event
                            .as_ref()
                            .is_some_and(|id| state.has_event(id));
                        if keep_selection {
                            return SmallVec::new();
                        }

                        match state.events.first().map(|event| event.id.clone()) {
                            Some(first) => Self::switch_event(state, first, env),
                            None => {
                                tracing::info!("No ongoing or upcoming events");
                                state.view = View::Verify;
                                Self::leave_event(state)
                            },
                        }
                    },
                    Err(error) => {
                        state.events_error = Some(error);
                        SmallVec::new()
                    },
                }
            },

            CheckInAction::SelectEvent { event_id } => {
                if !state.has_event(&event_id) {
                    tracing::warn!(%event_id, "Ignoring selection of unknown event");
                    return SmallVec::new();
                }
                if state.selected_event.as_ref() == Some(&event_id) {
                    return SmallVec::new();
                }

                Self::switch_event(state, event_id, env)
            },

            // ========== Ticket input ==========
            CheckInAction::InputChanged { text } => {
                state.input = text;

                if state.verification.is_verifying() {
                    if state.input.trim().is_empty() {
                        state.verification = VerificationPhase::Idle;
                        return smallvec![Effect::Cancel(VERIFY_EFFECT)];
                    }
                    // Typing ahead while a request is out keeps waiting for it
                    return SmallVec::new();
                }

                state.verification = state.input_phase();
                SmallVec::new()
            },

            CheckInAction::Submit => Self::start_verification(state, env),

            CheckInAction::QrScanned { payload } => {
                state.input = payload;
                Self::start_verification(state, env)
            },

            // ========== Verification ==========
            CheckInAction::VerificationCompleted { request, outcome } => {
                let (event_id, ticket_code) = match &state.verification {
                    VerificationPhase::Verifying {
                        request: pending,
                        event_id,
                        ticket_code,
                    } if *pending == request => (event_id.clone(), ticket_code.clone()),
                    VerificationPhase::Verifying { request: pending, .. } => {
                        tracing::debug!(
                            request = request.value(),
                            pending = pending.value(),
                            "Ignoring stale verification response"
                        );
                        return SmallVec::new();
                    },
                    _ => {
                        tracing::debug!(
                            request = request.value(),
                            "Ignoring verification response: nothing pending"
                        );
                        return SmallVec::new();
                    },
                };

                state.verification = VerificationPhase::Completed(VerificationResult {
                    event_id,
                    ticket_code,
                    outcome,
                    received_at: env.clock.now(),
                });
                SmallVec::new()
            },

            CheckInAction::ConfirmCheckIn => {
                let Some(result) = state.verification.result() else {
                    return SmallVec::new();
                };
                if !result.outcome.is_success() {
                    return SmallVec::new();
                }

                let event_id = result.event_id.clone();
                let ticket_code = result.ticket_code.clone();
                Self::dispatch_verification(state, env, event_id, ticket_code)
            },

            // ========== Attendance summary ==========
            CheckInAction::OpenSummary => {
                if state.selected_event.is_none() {
                    tracing::warn!("Summary requested with no event selected");
                    return SmallVec::new();
                }
                state.view = View::Summary;
                Self::start_summary(state, env)
            },

            CheckInAction::SummaryLoaded {
                request,
                event_id,
                result,
            } => {
                if state.summary.loading != Some(request)
                    || state.selected_event.as_ref() != Some(&event_id)
                {
                    tracing::debug!(request = request.value(), %event_id, "Ignoring stale summary response");
                    return SmallVec::new();
                }
                state.summary.loading = None;

                match result {
                    Ok(report) => {
                        state.summary.event_id = Some(event_id);
                        state.summary.summary = Some(report.summary);
                        state.summary.attendees = report.attendees;
                        state.summary.pagination.reset();
                        state.summary.error = None;
                    },
                    Err(error) => {
                        state.summary.error = Some(error);
                    },
                }
                SmallVec::new()
            },

            CheckInAction::CloseSummary => {
                state.view = View::Verify;
                if state.summary.loading.take().is_some() {
                    smallvec![Effect::Cancel(SUMMARY_EFFECT)]
                } else {
                    SmallVec::new()
                }
            },

            CheckInAction::SetSummaryPage { page } => {
                let len = state.summary.attendees.len();
                state.summary.pagination.go_to(page, len);
                SmallVec::new()
            },

            CheckInAction::NextPage => {
                let len = state.summary.attendees.len();
                state.summary.pagination.next(len);
                SmallVec::new()
            },

            CheckInAction::PreviousPage => {
                let len = state.summary.attendees.len();
                state.summary.pagination.previous(len);
                SmallVec::new()
            },
        }
    }
}
