//! # Wappu Testing
//!
//! Testing utilities for the Wappu client state layer.
//!
//! This crate provides:
//! - `ReducerTest`, a Given/When/Then harness for slice reducers
//! - Effect assertion helpers
//! - `FixedClock` for deterministic "now"
//! - `ActionLog`, a recorder of everything a store commits
//!
//! ## Example
//!
//! ```ignore
//! use wappu_testing::ActionLog;
//!
//! #[tokio::test]
//! async fn fetch_feed_commits_protocol() {
//!     let store = test_store(MockGateway::new().with_models("feed", posts));
//!     let mut log = ActionLog::attach(&store);
//!
//!     store.run(fetch_feed()).await.unwrap();
//!
//!     assert_eq!(log.types(), ["GET_FEED_REQUEST", "GET_FEED_SUCCESS", "SET_FEED"]);
//! }
//! ```

use chrono::{DateTime, Utc};
use wappu_core::environment::Clock;


pub use reducer_test::{ReducerTest, assertions};

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
    /// use wappu_testing::mocks::FixedClock;
    /// use wappu_core::environment::Clock;
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

    /// Create a default fixed clock for tests (2025-04-30 12:00:00 UTC, wappu eve)
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which cannot happen.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-04-30T12:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Recording of the actions a store commits
pub mod recorder {
    use tokio::sync::broadcast::{self, error::TryRecvError};
    use wappu_core::reducer::Reducer;
    use wappu_runtime::Store;

    /// Collects every action a store reduces, in commit order.
    ///
    /// Attach before dispatching: actions committed earlier are not seen.
    #[derive(Debug)]
    pub struct ActionLog<A> {
        rx: broadcast::Receiver<A>,
        seen: Vec<A>,
    }

    impl<A: Clone> ActionLog<A> {
        /// Wrap an existing subscription
        #[must_use]
        pub const fn new(rx: broadcast::Receiver<A>) -> Self {
            Self { rx, seen: Vec::new() }
        }

        /// Subscribe to a store
        #[must_use]
        pub fn attach<S, E, R>(store: &Store<S, A, E, R>) -> Self
        where
            R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
            A: Send + Sync + 'static,
            S: Send + Sync + 'static,
            E: Send + Sync + 'static,
        {
            Self::new(store.subscribe_actions())
        }

        fn pull(&mut self) {
            loop {
                match self.rx.try_recv() {
                    Ok(action) => self.seen.push(action),
                    Err(TryRecvError::Lagged(_)) => {},
                    Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                }
            }
        }

        /// Everything recorded so far
        pub fn actions(&mut self) -> &[A] {
            self.pull();
            &self.seen
        }

        /// Take everything recorded so far, leaving the log empty
        pub fn drain(&mut self) -> Vec<A> {
            self.pull();
            std::mem::take(&mut self.seen)
        }

        /// Map every recorded action, typically to its type string
        pub fn map<T>(&mut self, f: impl FnMut(&A) -> T) -> Vec<T> {
            self.pull();
            self.seen.iter().map(f).collect()
        }
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use recorder::ActionLog;
