//! # Turnstile Testing
//!
//! Testing utilities and helpers for Turnstile reducers.
//!
//! This crate provides:
//! - `FixedClock` for deterministic timestamps
//! - `ReducerTest`, a Given-When-Then builder for reducer unit tests
//! - `collect_actions`, which drives effect descriptions without a store
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use turnstile_testing::{ReducerTest, assertions};
//!
//! ReducerTest::new(CheckInReducer::new())
//!     .with_env(environment)
//!     .given_state(CheckInState::default())
//!     .when_action(CheckInAction::InputChanged { text: String::new() })
//!     .then_state(|state| assert!(state.verification.is_idle()))
//!     .then_effects(assertions::assert_no_effects)
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use turnstile_core::environment::Clock;

pub mod effects;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use turnstile_testing::mocks::FixedClock;
    /// use turnstile_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use effects::collect_actions;
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};
