//! # Turnstile Runtime
//!
//! Runtime implementation for the Turnstile check-in workflow.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: Owns the workflow state and serialises reducer execution
//! - **Effect Executor**: Runs effect descriptions and feeds actions back to the reducer
//! - **Cancellation Registry**: Keeps at most one effect in flight per [`EffectId`],
//!   so a newer request always supersedes an older one
//!
//! ## Example
//!
//! ```ignore
//! use turnstile_runtime::Store;
//!
//! let store = Store::new(CheckInState::default(), CheckInReducer::new(), environment);
//!
//! // Send an action
//! store.send(CheckInAction::LoadEvents).await?;
//!
//! // Read state
//! let selected = store.state(|s| s.selected_event.clone()).await;
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tokio::task::AbortHandle;
use turnstile_core::{
    effect::{Effect, EffectId},
    reducer::Reducer,
};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for an action or for effects to finish
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// A prepared effect, ready to be awaited
type EffectRun = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for the effects of one
/// action to complete. An effect counts as complete once the action it
/// produced (if any) has been reduced.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(CheckInAction::Submit).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // The verification response has been reduced
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: tx,
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects still running for this action
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: per-action effect counter shared with running effects
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: watch::Sender<()>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements the effect counter on drop
///
/// The counter is updated even if the effect panics or is aborted.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Internal: effects currently running under a cancellation id
///
/// Each registration gets a ticket so a finished effect only clears its own
/// entry, never the one that replaced it.
#[derive(Default)]
struct CancellationRegistry {
    next_ticket: AtomicU64,
    running: Mutex<HashMap<EffectId, (u64, AbortHandle)>>,
}

impl CancellationRegistry {
    /// Abort the effect running under `id`. Returns whether one was running.
    fn cancel(&self, id: EffectId) -> bool {
        let removed = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);

        match removed {
            Some((_, handle)) => {
                handle.abort();
                true
            },
            None => false,
        }
    }

    fn register(&self, id: EffectId, handle: AbortHandle) -> u64 {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        let previous = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, (ticket, handle));

        if let Some((_, previous)) = previous {
            previous.abort();
        }
        ticket
    }

    fn release(&self, id: EffectId, ticket: u64) {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.get(&id).is_some_and(|(current, _)| *current == ticket) {
            running.remove(&id);
        }
    }

    fn is_running(&self, id: EffectId) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }
}

/// Store module - The runtime for reducers
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, CancellationRegistry, DecrementGuard,
        Duration, Effect, EffectHandle, EffectId, EffectRun, EffectTracking, Ordering, Reducer,
        RwLock, StoreError,
    };
    use tokio::sync::broadcast;
    use tokio::sync::broadcast::error::RecvError;

    /// Shared store internals
    struct StoreInner<S, A, E, R> {
        state: RwLock<S>,
        reducer: R,
        environment: E,
        shutdown: AtomicBool,
        pending_effects: Arc<AtomicUsize>,
        cancellations: CancellationRegistry,
        /// Actions produced by effects, broadcast after they have been reduced.
        action_broadcast: broadcast::Sender<A>,
    }

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (workflow logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop and cancellation)
    ///
    /// Cloning a store is cheap; clones share state.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        inner: Arc<StoreInner<S, A, E, R>>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// The action broadcast channel holds 16 actions; use
        /// [`Store::with_broadcast_capacity`] for busier observers.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, environment, 16)
        }

        /// Create a store with a custom action broadcast capacity
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));

            Self {
                inner: Arc::new(StoreInner {
                    state: RwLock::new(initial_state),
                    reducer,
                    environment,
                    shutdown: AtomicBool::new(false),
                    pending_effects: Arc::new(AtomicUsize::new(0)),
                    cancellations: CancellationRegistry::default(),
                    action_broadcast,
                }),
            }
        }

        /// Send an action to the store
        ///
        /// The reducer runs under the state write lock; the effects it returns
        /// are started before this method returns.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        ///
        /// # Panics
        ///
        /// If the reducer panics, the panic propagates to the caller.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.inner.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.commands.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.inner.state.write().await;

                let start = std::time::Instant::now();
                let effects = self
                    .inner
                    .reducer
                    .reduce(&mut *state, action, &self.inner.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                self.execute(effect, &tracking);
            }

            Ok(handle)
        }

        /// Send an action and wait for a matching action produced by its effects
        ///
        /// Subscribes before sending, so the result cannot be missed. The
        /// matching action has already been reduced when it is returned.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: no matching action within `timeout`
        /// - [`StoreError::ChannelClosed`]: broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut rx = self.subscribe_actions();
            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(RecvError::Closed) => return Err(StoreError::ChannelClosed),
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to actions produced by effects
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.inner.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let result = store.state(|s| s.verification.clone()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.inner.state.read().await;
            f(&*state)
        }

        /// Whether an effect is currently running under `id`
        #[must_use]
        pub fn is_running(&self, id: EffectId) -> bool {
            self.inner.cancellations.is_running(id)
        }

        /// Number of effects still running across all actions
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.inner.pending_effects.load(Ordering::SeqCst)
        }

        /// Stop accepting actions and wait for running effects to finish
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] with the number of effects
        /// still running when `timeout` elapses.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            self.inner.shutdown.store(true, Ordering::Release);
            tracing::info!("Store shutdown initiated");

            let deadline = tokio::time::Instant::now() + timeout;
            loop {
                let pending = self.pending_effects();
                if pending == 0 {
                    tracing::info!("Store shutdown complete");
                    return Ok(());
                }
                if tokio::time::Instant::now() >= deadline {
                    tracing::warn!(pending, "Store shutdown timed out");
                    return Err(StoreError::ShutdownTimeout(pending));
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }

        /// Start a top-level effect and track it against the sending action
        fn execute(&self, effect: Effect<A>, tracking: &EffectTracking) {
            if matches!(effect, Effect::None) {
                metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                return;
            }

            let run = self.prepare(effect);

            tracking.increment();
            self.inner.pending_effects.fetch_add(1, Ordering::SeqCst);
            let guard = DecrementGuard(tracking.clone());
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.inner.pending_effects));

            tokio::spawn(async move {
                let _guard = guard;
                let _pending_guard = pending_guard;
                run.await;
            });
        }

        /// Turn an effect description into a runnable future
        ///
        /// Cancellation side effects (aborting a superseded effect) happen here,
        /// synchronously, so they are ordered with the reducer call that asked
        /// for them.
        fn prepare(&self, effect: Effect<A>) -> EffectRun {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                    Box::pin(std::future::ready(()))
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    let store = self.clone();
                    Box::pin(async move {
                        if let Some(action) = fut.await {
                            store.feed_back(action).await;
                        } else {
                            tracing::trace!("Effect::Future completed with no action");
                        }
                    })
                },
                Effect::Cancellable { id, effect } => {
                    if self.inner.cancellations.cancel(id) {
                        tracing::debug!(effect_id = %id, "Superseded in-flight effect");
                        metrics::counter!("store.effects.cancelled", "id" => id.as_str())
                            .increment(1);
                    }

                    let task = tokio::spawn(self.prepare(*effect));
                    let ticket = self.inner.cancellations.register(id, task.abort_handle());
                    let store = self.clone();

                    Box::pin(async move {
                        if let Err(error) = task.await {
                            if error.is_cancelled() {
                                tracing::trace!(effect_id = %id, "Effect aborted");
                            } else {
                                tracing::error!(effect_id = %id, %error, "Effect task panicked");
                            }
                        }
                        store.inner.cancellations.release(id, ticket);
                    })
                },
                Effect::Cancel(id) => {
                    if self.inner.cancellations.cancel(id) {
                        tracing::debug!(effect_id = %id, "Cancelled in-flight effect");
                        metrics::counter!("store.effects.cancelled", "id" => id.as_str())
                            .increment(1);
                    }
                    Box::pin(std::future::ready(()))
                },
            }
        }

        /// Reduce an action produced by an effect, then broadcast it
        async fn feed_back(&self, action: A) {
            let observed = action.clone();
            match self.send(action).await {
                Ok(_) => {
                    let _ = self.inner.action_broadcast.send(observed);
                },
                Err(error) => {
                    tracing::warn!(%error, "Dropped action produced by effect");
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic
mod tests {
    use super::*;
    use turnstile_core::{smallvec, SmallVec};

    const JOB: EffectId = EffectId::new("job");

    #[derive(Debug, Clone, Default)]
    struct TestState {
        value: i32,
        finished: Vec<u32>,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum TestAction {
        Increment,
        Decrement,
        NoOp,
        ProduceEffect,
        ProduceEffects,
        StartJob { tag: u32, millis: u64 },
        StopJob,
        JobFinished { tag: u32 },
    }

    #[derive(Debug, Clone)]
    struct TestEnv;

    #[derive(Debug, Clone)]
    struct TestReducer;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.value += 1;
                    smallvec![Effect::None]
                },
                TestAction::Decrement => {
                    state.value -= 1;
                    smallvec![Effect::None]
                },
                TestAction::NoOp => smallvec![Effect::None],
                TestAction::ProduceEffect => {
                    smallvec![Effect::Future(Box::pin(async {
                        Some(TestAction::Increment)
                    }))]
                },
                TestAction::ProduceEffects => {
                    smallvec![
                        Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                        Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                        Effect::Future(Box::pin(async { Some(TestAction::Decrement) })),
                    ]
                },
                TestAction::StartJob { tag, millis } => {
                    smallvec![
                        Effect::Future(Box::pin(async move {
                            tokio::time::sleep(Duration::from_millis(millis)).await;
                            Some(TestAction::JobFinished { tag })
                        }))
                        .cancellable(JOB)
                    ]
                },
                TestAction::StopJob => smallvec![Effect::Cancel(JOB)],
                TestAction::JobFinished { tag } => {
                    state.finished.push(tag);
                    SmallVec::new()
                },
            }
        }
    }

    fn store() -> Store<TestState, TestAction, TestEnv, TestReducer> {
        Store::new(TestState::default(), TestReducer, TestEnv)
    }

    #[tokio::test]
    async fn test_store_creation() {
        let value = store().state(|s| s.value).await;
        assert_eq!(value, 0);
    }

    #[tokio::test]
    async fn test_multiple_actions() {
        let store = store();

        let _ = store.send(TestAction::Increment).await;
        let _ = store.send(TestAction::Increment).await;
        let _ = store.send(TestAction::Decrement).await;
        let _ = store.send(TestAction::NoOp).await;

        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn test_effect_future_feeds_back() {
        let store = store();

        let mut handle = store.send(TestAction::ProduceEffect).await.unwrap();
        handle.wait().await;

        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn test_every_returned_effect_runs() {
        let store = store();

        let mut handle = store.send(TestAction::ProduceEffects).await.unwrap();
        handle.wait().await;

        assert_eq!(store.state(|s| s.value).await, 1);
        assert_eq!(store.pending_effects(), 0);
    }

    #[tokio::test]
    async fn test_newer_cancellable_effect_supersedes_older() {
        let store = store();

        let mut first = store
            .send(TestAction::StartJob { tag: 1, millis: 500 })
            .await
            .unwrap();
        assert!(store.is_running(JOB));

        let mut second = store
            .send(TestAction::StartJob { tag: 2, millis: 10 })
            .await
            .unwrap();

        second.wait_with_timeout(Duration::from_secs(2)).await.unwrap();
        first.wait_with_timeout(Duration::from_secs(2)).await.unwrap();

        assert_eq!(store.state(|s| s.finished.clone()).await, vec![2]);
        assert!(!store.is_running(JOB));
    }

    #[tokio::test]
    async fn test_cancel_aborts_running_effect() {
        let store = store();

        let mut job = store
            .send(TestAction::StartJob { tag: 7, millis: 500 })
            .await
            .unwrap();
        let _ = store.send(TestAction::StopJob).await.unwrap();

        job.wait_with_timeout(Duration::from_secs(2)).await.unwrap();
        assert!(store.state(|s| s.finished.is_empty()).await);
        assert!(!store.is_running(JOB));
    }

    #[tokio::test]
    async fn test_send_and_wait_for_returns_reduced_action() {
        let store = store();

        let action = store
            .send_and_wait_for(
                TestAction::StartJob { tag: 3, millis: 5 },
                |a| matches!(a, TestAction::JobFinished { .. }),
                Duration::from_secs(2),
            )
            .await
            .unwrap();

        assert_eq!(action, TestAction::JobFinished { tag: 3 });
        assert_eq!(store.state(|s| s.finished.clone()).await, vec![3]);
    }

    #[tokio::test]
    async fn test_send_and_wait_for_times_out() {
        let store = store();

        let result = store
            .send_and_wait_for(
                TestAction::Increment,
                |a| matches!(a, TestAction::JobFinished { .. }),
                Duration::from_millis(20),
            )
            .await;

        assert_eq!(result, Err(StoreError::Timeout));
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_actions() {
        let store = store();

        let _ = store
            .send(TestAction::StartJob { tag: 1, millis: 10 })
            .await
            .unwrap();
        store.shutdown(Duration::from_secs(2)).await.unwrap();

        assert_eq!(store.pending_effects(), 0);
        assert_eq!(
            store.send(TestAction::Increment).await.unwrap_err(),
            StoreError::ShutdownInProgress
        );
    }

    #[tokio::test]
    async fn test_completed_handle_does_not_block() {
        let mut handle = EffectHandle::completed();
        assert_eq!(handle.pending(), 0);
        handle.wait_with_timeout(Duration::from_millis(10)).await.unwrap();
    }
}
