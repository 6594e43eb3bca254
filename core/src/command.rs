//! Commands, tasks and the dispatch contract
//!
//! Anything handed to a store's `dispatch` is a [`Command`]: either a plain
//! action, reduced immediately, or a [`Task`], an asynchronous procedure that
//! may dispatch further commands, read the current state and reach the
//! injected environment. The caller of a task gets the task's output back,
//! which is how a fetch can be chained on (`run(fetch_feed()).await`).
//!
//! The store is never reached through a global. A task receives a
//! [`Dispatcher`] handle that is threaded explicitly through every nested
//! task it runs.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a store must provide for tasks to run against it.
///
/// Implemented by the runtime store and by test doubles.
pub trait Dispatch<S, A, E>: Send + Sync {
    /// Reduce a plain action. Resolves once the state change is committed.
    fn dispatch_action(&self, action: A) -> BoxFuture<'_, ()>;

    /// A snapshot of the whole state as it is right now.
    fn snapshot(&self) -> BoxFuture<'_, S>;

    /// The injected collaborators.
    fn environment(&self) -> &E;
}

/// Handle given to a running task.
///
/// Cheap to clone. Every clone talks to the same store.
pub struct Dispatcher<S, A, E> {
    inner: Arc<dyn Dispatch<S, A, E>>,
}

impl<S, A, E> Clone for Dispatcher<S, A, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A, E> fmt::Debug for Dispatcher<S, A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl<S, A, E> Dispatcher<S, A, E>
where
    S: 'static,
    A: 'static,
    E: 'static,
{
    /// Wrap a store (or any other [`Dispatch`] implementation).
    #[must_use]
    pub fn new(inner: Arc<dyn Dispatch<S, A, E>>) -> Self {
        Self { inner }
    }

    /// Dispatch a plain action and wait until it is reduced.
    pub async fn dispatch(&self, action: A) {
        self.inner.dispatch_action(action).await;
    }

    /// Read the current state.
    pub async fn get_state(&self) -> S {
        self.inner.snapshot().await
    }

    /// The injected collaborators.
    #[must_use]
    pub fn environment(&self) -> &E {
        self.inner.environment()
    }

    /// Run a nested task to completion and return its output.
    pub async fn run<T: 'static>(&self, task: Task<S, A, E, T>) -> T {
        task.run(self.clone()).await
    }

    /// Interpret a nested command.
    pub async fn execute(&self, command: Command<S, A, E>) {
        match command {
            Command::Action(action) => self.dispatch(action).await,
            Command::Task(task) => self.run(task).await,
        }
    }
}

type TaskFn<S, A, E, T> = Box<dyn FnOnce(Dispatcher<S, A, E>) -> BoxFuture<'static, T> + Send>;

/// An asynchronous procedure run against a store.
///
/// `T` is what the caller gets back once the task finishes. Fetch tasks
/// resolve to the last action they dispatched.
pub struct Task<S, A, E, T = ()> {
    name: &'static str,
    body: TaskFn<S, A, E, T>,
}

impl<S, A, E, T> Task<S, A, E, T>
where
    S: 'static,
    A: 'static,
    E: 'static,
    T: 'static,
{
    /// Create a task from an async closure.
    ///
    /// `name` shows up in logs and spans.
    pub fn new<F, Fut>(name: &'static str, body: F) -> Self
    where
        F: FnOnce(Dispatcher<S, A, E>) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        Self {
            name,
            body: Box::new(move |dispatcher| Box::pin(body(dispatcher))),
        }
    }

    /// The task's name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Start the task against a dispatcher.
    #[must_use]
    pub fn run(self, dispatcher: Dispatcher<S, A, E>) -> BoxFuture<'static, T> {
        (self.body)(dispatcher)
    }
}

impl<S, A, E, T> fmt::Debug for Task<S, A, E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("name", &self.name).finish_non_exhaustive()
    }
}

/// A unit of work accepted by a store's `dispatch`.
pub enum Command<S, A, E> {
    /// A plain state transition.
    Action(A),
    /// An asynchronous procedure.
    Task(Task<S, A, E>),
}

impl<S, A, E> fmt::Debug for Command<S, A, E>
where
    A: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Action(action) => f.debug_tuple("Command::Action").field(action).finish(),
            Command::Task(task) => f.debug_tuple("Command::Task").field(&task.name).finish(),
        }
    }
}

impl<S, A, E> From<Task<S, A, E>> for Command<S, A, E> {
    fn from(task: Task<S, A, E>) -> Self {
        Command::Task(task)
    }
}
