//! # Turnstile Check-In
//!
//! Ticket check-in workflow for event operators (admins, hosts and door staff).
//!
//! ## Features
//!
//! - **Event selector**: ongoing and upcoming events, first one pre-selected
//! - **Ticket input**: typed or scanned codes, trimmed and verified on submit
//! - **Verification**: one mark-used call per attempt, mapped to a display-ready outcome
//! - **Attendance summary**: counts plus a client-side paginated attendee list
//! - **Latest wins**: superseded requests are cancelled and late answers ignored
//!
//! ## Architecture
//!
//! The screen is a reducer; remote calls are effects run by the store:
//!
//! ```text
//! Action → Reducer → (State, Effects) → Effect Execution → More Actions
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use turnstile_checkin::*;
//! use turnstile_runtime::Store;
//!
//! let api = HttpTicketApi::new(&ClientConfig::from_env())?;
//! let env = CheckInEnvironment::new(api, Session::from_env()?, Arc::new(SystemClock));
//! let store = Store::new(CheckInState::new(5), CheckInReducer::new(), env);
//!
//! store.send(CheckInAction::LoadEvents).await?.wait().await;
//! store.send(CheckInAction::QrScanned { payload: "TCK-1001".into() }).await?.wait().await;
//!
//! let result = store.state(|s| s.verification.result().cloned()).await;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod actions;
pub mod client;
pub mod config;
pub mod environment;
pub mod error;
pub mod events;
pub mod pagination;
pub mod providers;
pub mod reducer;
pub mod session;
pub mod state;
pub mod summary;
pub mod types;
pub mod verification;

/// In-memory providers for testing
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use actions::CheckInAction;
pub use client::HttpTicketApi;
pub use config::ClientConfig;
pub use environment::CheckInEnvironment;
pub use error::{CheckInError, ErrorKind, Result};
pub use pagination::Pagination;
pub use providers::TicketApi;
pub use reducer::CheckInReducer;
pub use session::{Role, Session};
pub use state::{CheckInState, RequestToken, SummaryState, VerificationPhase, View};
pub use types::{
    Attendee, CheckInReceipt, Event, EventId, EventSummary, Outcome, SummaryReport,
    VerificationOutcome, VerificationResult,
};
