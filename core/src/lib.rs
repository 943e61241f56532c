//! # Turnstile Core
//!
//! Core traits and types for the Turnstile check-in workflow.
//!
//! The check-in screen is modelled as a state machine: operator input and
//! server responses are [`Action`](reducer::Reducer::Action)s, a pure
//! [`Reducer`](reducer::Reducer) updates state and returns [`Effect`](effect::Effect)
//! descriptions, and the runtime executes those effects (HTTP calls) and feeds
//! their results back as new actions.
//!
//! ## Core Concepts
//!
//! - **State**: What the operator sees (selected event, last result, summary page)
//! - **Action**: Operator input and remote responses
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies (API client, session, clock)
//!
//! ## Example
//!
//! ```ignore
//! use turnstile_core::*;
//!
//! impl Reducer for CheckInReducer {
//!     type State = CheckInState;
//!     type Action = CheckInAction;
//!     type Environment = CheckInEnvironment<HttpTicketApi>;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut CheckInState,
//!         action: CheckInAction,
//!         env: &Self::Environment,
//!     ) -> SmallVec<[Effect<CheckInAction>; 4]> {
//!         // Business logic goes here
//!         SmallVec::new()
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

/// Declarative macros for building effects
pub mod effect_macros;

/// Reducer module - The core trait for workflow logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all decision logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for workflow logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action against current state
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        ///
        /// Most actions produce zero or one effect, so the effects are
        /// returned inline in a `SmallVec`.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution); a reducer returns several at once when it
/// needs more than one, and any of them can be made cancellable.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Identifier grouping in-flight effects for cancellation
    ///
    /// Starting an [`Effect::Cancellable`] with an id aborts whatever is
    /// still running under the same id, so at most one effect per id is
    /// ever in flight.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EffectId(&'static str);

    impl EffectId {
        /// Create an effect id from a static name
        #[must_use]
        pub const fn new(name: &'static str) -> Self {
            Self(name)
        }

        /// The name of this id
        #[must_use]
        pub const fn as_str(&self) -> &'static str {
            self.0
        }
    }

    impl std::fmt::Display for EffectId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

        /// Run `effect` under `id`, aborting any effect already running under it
        Cancellable {
            /// Cancellation group
            id: EffectId,
            /// The effect to run
            effect: Box<Effect<Action>>,
        },

        /// Abort whatever is running under the given id
        Cancel(EffectId),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Cancellable { id, effect } => f
                    .debug_struct("Effect::Cancellable")
                    .field("id", id)
                    .field("effect", effect)
                    .finish(),
                Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap this effect so it replaces anything in flight under `id`
        #[must_use]
        pub fn cancellable(self, id: EffectId) -> Effect<Action> {
            Effect::Cancellable {
                id,
                effect: Box::new(self),
            }
        }

        /// The cancellation id this effect runs under, if any
        #[must_use]
        pub const fn cancellation_id(&self) -> Option<EffectId> {
            match self {
                Effect::Cancellable { id, .. } | Effect::Cancel(id) => Some(*id),
                _ => None,
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock used outside of tests
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::{Effect, EffectId};
    use super::environment::{Clock, SystemClock};

    const VERIFY: EffectId = EffectId::new("verify");

    #[test]
    fn cancellable_wraps_effect_with_id() {
        let effect: Effect<()> = Effect::Future(Box::pin(async { None })).cancellable(VERIFY);

        assert_eq!(effect.cancellation_id(), Some(VERIFY));
        assert!(matches!(
            effect,
            Effect::Cancellable { effect, .. } if matches!(*effect, Effect::Future(_))
        ));
    }

    #[test]
    fn plain_effects_have_no_cancellation_id() {
        assert_eq!(Effect::<()>::None.cancellation_id(), None);
        assert_eq!(Effect::<()>::Cancel(VERIFY).cancellation_id(), Some(VERIFY));
    }

    #[test]
    fn debug_output_names_variant() {
        let effect: Effect<u8> = Effect::Cancel(VERIFY);
        assert_eq!(format!("{effect:?}"), "Effect::Cancel(EffectId(\"verify\"))");
        assert_eq!(VERIFY.to_string(), "verify");
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
