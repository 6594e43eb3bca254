//! # Wappu Runtime
//!
//! The store that holds the client state and interprets everything
//! dispatched to it.
//!
//! ## Core Components
//!
//! - **Store**: Owns the state, runs the reducer, executes effects
//! - **Command interpreter**: Plain actions are reduced, tasks are run with a
//!   [`Dispatcher`] bound to the store
//! - **Action broadcast**: Every reduced action is published to subscribers
//!
//! ## Example
//!
//! ```ignore
//! use wappu_runtime::Store;
//!
//! let store = Store::new(AppState::default(), root_reducer(), environment);
//!
//! // Plain action
//! store.send(AppAction::Map(MapAction::SelectCategory("TAMPERE".into()))).await?;
//!
//! // Task, output returned to the caller
//! let last = store.run(fetch_feed()).await?;
//!
//! // Read state
//! let posts = store.state(|s| s.feed.posts.len()).await;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use wappu_core::command::{BoxFuture, Command, Dispatch, Dispatcher, Task};
use wappu_core::{effect::Effect, reducer::Reducer};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// A spawned task failed to complete (panicked or was cancelled)
        #[error("Task failed: {0}")]
        TaskJoinError(#[from] tokio::task::JoinError),

        /// Store is shutting down and not accepting new commands
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects and tasks to complete
        #[error("Shutdown timed out with {0} effects or tasks still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for an action or for effects to settle
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Configuration for Store instances
///
/// # Example
///
/// ```ignore
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(256)
///     .with_shutdown_timeout(Duration::from_secs(5));
///
/// let store = Store::with_config(state, reducer, env, config);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of actions buffered for each subscriber before it lags
    pub broadcast_capacity: usize,
    /// Default timeout for graceful shutdown
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub const fn new(broadcast_capacity: usize, default_shutdown_timeout: Duration) -> Self {
        Self {
            broadcast_capacity,
            default_shutdown_timeout,
        }
    }

    /// Set the broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 64,
            default_shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] so a caller can wait until the effects
/// produced by its action have finished.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
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
            notifier: Arc::new(tx),
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

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait until every effect of the action has completed
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
    /// Returns [`StoreError::Timeout`] if the timeout expires before all
    /// effects complete.
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

/// Completion tracking carried through effect execution.
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Decrements the effect counter on drop, even if the effect panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Decrements the store-wide in-flight counter on drop.
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl AtomicCounterGuard {
    fn acquire(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A task spawned onto the tokio runtime with [`Store::spawn`].
#[derive(Debug)]
pub struct TaskHandle<T> {
    inner: tokio::task::JoinHandle<Result<T, StoreError>>,
}

impl<T> TaskHandle<T> {
    /// Wait for the task's output.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TaskJoinError`] if the task panicked, or the
    /// error the store returned when it refused to run the task.
    pub async fn join(self) -> Result<T, StoreError> {
        self.inner.await?
    }
}

/// Store module - The runtime for reducers
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, BoxFuture, Command, DecrementGuard,
        Dispatch, Dispatcher, Duration, Effect, EffectHandle, EffectTracking, Ordering, Reducer,
        RwLock, StoreConfig, StoreError, Task, TaskHandle, watch,
    };
    use tokio::sync::broadcast;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (slice logic)
    /// 3. Environment (injected collaborators)
    /// 4. Effect execution (with feedback loop)
    /// 5. Task execution for dispatched commands
    ///
    /// Cloning a store is cheap; clones share state and subscribers.
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
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        config: StoreConfig,
        shutdown: Arc<AtomicBool>,
        in_flight: Arc<AtomicUsize>,
        /// Every reduced action, in commit order.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Sync + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default`].
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                config,
                shutdown: Arc::new(AtomicBool::new(false)),
                in_flight: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// The injected collaborators
        #[must_use]
        pub fn environment(&self) -> &E {
            &self.environment
        }

        /// The configuration this store was built with
        #[must_use]
        pub const fn config(&self) -> &StoreConfig {
            &self.config
        }

        /// Initiate graceful shutdown of the store
        ///
        /// 1. Sets the shutdown flag (rejecting new commands from callers;
        ///    running tasks and effects still commit what they dispatch)
        /// 2. Waits for in-flight effects and tasks (with timeout)
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires while
        /// effects or tasks are still running.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.store(true, Ordering::Release);

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(20);

            loop {
                let pending = self.in_flight.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects and tasks completed, shutdown successful");
                    metrics::counter!("store.shutdown.completed").increment(1);
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(pending, "Shutdown timeout: {pending} still running");
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tracing::debug!(
                    pending,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Waiting for in-flight work"
                );

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Shut down with [`StoreConfig::default_shutdown_timeout`]
        ///
        /// # Errors
        ///
        /// See [`Store::shutdown`].
        pub async fn shutdown_gracefully(&self) -> Result<(), StoreError> {
            self.shutdown(self.config.default_shutdown_timeout).await
        }

        /// Whether shutdown has been initiated
        #[must_use]
        pub fn is_shutting_down(&self) -> bool {
            self.shutdown.load(Ordering::Acquire)
        }

        /// Send a plain action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Publishes the action to subscribers
        /// 4. Starts the returned effects; actions they produce are sent back
        ///
        /// The state change is committed when this returns. Effects may
        /// still be running; wait on the returned handle for them.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            Ok(self.commit(action).await)
        }

        /// Reduce an action without the shutdown gate.
        ///
        /// Used for actions coming from work that is already in flight
        /// (running tasks, effect feedback), which shutdown waits for.
        async fn commit(&self, action: A) -> EffectHandle {
            metrics::counter!("store.commands.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects = self
                    .reducer
                    .reduce(&mut *state, action.clone(), &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                // Published while the write lock is held so subscribers see
                // actions in commit order.
                let _ = self.action_broadcast.send(action);

                #[allow(clippy::cast_precision_loss)]
                metrics::histogram!("store.effects.count").record(effects.len() as f64);

                effects
            };

            for effect in effects {
                self.execute_effect(effect, tracking.clone());
            }

            handle
        }

        /// Run a task to completion and return its output
        ///
        /// The task runs on the caller's future, with a [`Dispatcher`] bound
        /// to this store. Shutdown waits for running tasks.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, task), name = "store_run_task", fields(task = task.name()))]
        pub async fn run<T>(&self, task: Task<S, A, E, T>) -> Result<T, StoreError>
        where
            S: Clone,
            T: 'static,
        {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected task: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            let guard = AtomicCounterGuard::acquire(&self.in_flight);
            Ok(self.run_counted(task, guard).await)
        }

        /// Run a task already counted as in flight; `_guard` releases it on return.
        #[allow(clippy::needless_pass_by_value)]
        async fn run_counted<T>(&self, task: Task<S, A, E, T>, _guard: AtomicCounterGuard) -> T
        where
            S: Clone,
            T: 'static,
        {
            metrics::counter!("store.tasks.total", "task" => task.name()).increment(1);
            tracing::info!(task = task.name(), "Running task");

            task.run(self.dispatcher()).await
        }

        /// Interpret a command
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        pub async fn dispatch(&self, command: Command<S, A, E>) -> Result<(), StoreError>
        where
            S: Clone,
        {
            match command {
                Command::Action(action) => self.send(action).await.map(|_| ()),
                Command::Task(task) => self.run(task).await,
            }
        }

        /// Run a task in the background
        ///
        /// The task counts as in flight from this call on, so a shutdown
        /// started right after still waits for it. When the store is
        /// already shutting down the handle resolves to
        /// [`StoreError::ShutdownInProgress`].
        #[must_use]
        pub fn spawn<T>(&self, task: Task<S, A, E, T>) -> TaskHandle<T>
        where
            S: Clone,
            T: Send + 'static,
        {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!(task = task.name(), "Rejected task: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return TaskHandle {
                    inner: tokio::spawn(async { Err(StoreError::ShutdownInProgress) }),
                };
            }

            let guard = AtomicCounterGuard::acquire(&self.in_flight);
            let store = self.clone();
            TaskHandle {
                inner: tokio::spawn(async move { Ok(store.run_counted(task, guard).await) }),
            }
        }

        /// Dispatch a command and wait for an action matching `predicate`
        ///
        /// Subscribes before dispatching, so an action committed while the
        /// command runs is not missed.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: no matching action within `timeout`
        /// - [`StoreError::ChannelClosed`]: the broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: the store is shutting down
        pub async fn dispatch_and_wait_for<F>(
            &self,
            command: Command<S, A, E>,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            S: Clone,
            F: Fn(&A) -> bool,
        {
            let mut rx = self.action_broadcast.subscribe();

            self.dispatch(command).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to every action reduced by this store
        ///
        /// Actions arrive in commit order. A receiver that falls more than
        /// `broadcast_capacity` actions behind gets `RecvError::Lagged`.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let post_count = store.state(|s| s.feed.posts.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// A copy of the whole current state
        pub async fn snapshot(&self) -> S
        where
            S: Clone,
        {
            self.state.read().await.clone()
        }

        /// A dispatcher bound to this store
        #[must_use]
        pub fn dispatcher(&self) -> Dispatcher<S, A, E>
        where
            S: Clone,
        {
            Dispatcher::new(Arc::new(self.clone()))
        }

        /// Execute an effect with tracking
        ///
        /// - `None`: No-op
        /// - `Future`: Executes async computation, sends resulting action if `Some`
        /// - `Delay`: Waits for duration, then sends action
        /// - `Parallel`: Executes effects concurrently
        /// - `Sequential`: Executes effects in order, waiting for each to complete
        ///
        /// A panicking effect is isolated in its spawned task; the guards keep
        /// the counters correct.
        #[allow(clippy::needless_pass_by_value)]
        fn execute_effect(&self, effect: Effect<A>, tracking: EffectTracking) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    tracking.increment();
                    let in_flight = AtomicCounterGuard::acquire(&self.in_flight);
                    let guard = DecrementGuard(tracking.clone());
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;
                        let _in_flight = in_flight;

                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action");
                            let _ = store.commit(action).await;
                        }
                    });
                },
                Effect::Delay { duration, action } => {
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                    tracking.increment();
                    let in_flight = AtomicCounterGuard::acquire(&self.in_flight);
                    let guard = DecrementGuard(tracking.clone());
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;
                        let _in_flight = in_flight;

                        tokio::time::sleep(duration).await;
                        let _ = store.commit(*action).await;
                    });
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    for effect in effects {
                        self.execute_effect(effect, tracking.clone());
                    }
                },
                Effect::Sequential(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "sequential")
                        .increment(1);
                    tracking.increment();
                    let in_flight = AtomicCounterGuard::acquire(&self.in_flight);
                    let guard = DecrementGuard(tracking.clone());
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;
                        let _in_flight = in_flight;

                        for effect in effects {
                            let (sub_tx, mut sub_rx) = watch::channel(());
                            let sub_tracking = EffectTracking {
                                counter: Arc::new(AtomicUsize::new(0)),
                                notifier: Arc::new(sub_tx),
                            };

                            store.execute_effect(effect, sub_tracking.clone());

                            while sub_tracking.counter.load(Ordering::SeqCst) > 0 {
                                if sub_rx.changed().await.is_err() {
                                    break;
                                }
                            }
                        }
                    });
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
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                config: self.config.clone(),
                shutdown: Arc::clone(&self.shutdown),
                in_flight: Arc::clone(&self.in_flight),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }

    impl<S, A, E, R> Dispatch<S, A, E> for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Sync + Clone + 'static,
        S: Clone + Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        fn dispatch_action(&self, action: A) -> BoxFuture<'_, ()> {
            Box::pin(async move {
                let _ = self.commit(action).await;
            })
        }

        fn snapshot(&self) -> BoxFuture<'_, S> {
            Box::pin(Store::snapshot(self))
        }

        fn environment(&self) -> &E {
            &self.environment
        }
    }
}

// Re-export for convenience
pub use store::Store;
