//! Root state, root reducer and the store type
//!
//! [`app_reducer`] scopes every slice reducer onto its field of
//! [`AppState`] and combines them. Every slice sees every action; each
//! leaves its state alone for actions it does not handle.

use crate::action::AppAction;
use crate::config::{MapConfig, StoreSettings};
use crate::environment::AppEnvironment;
use crate::slices::apps::{AppsReducer, AppsState};
use crate::slices::event::{EventReducer, EventState};
use crate::slices::feed::{FeedReducer, FeedState};
use crate::slices::map::{MapReducer, MapState};
use crate::slices::marker::{MarkerReducer, MarkerState};
use crate::slices::registration::{RegistrationReducer, RegistrationState};
use crate::slices::team::{TeamReducer, TeamState};
use crate::slices::user::{UserReducer, UserState};
use std::time::Duration;
use wappu_core::command::{Dispatcher, Task};
use wappu_core::composition::{CombinedReducer, combine_reducers, scope_reducer};
use wappu_core::{SmallVec, effect::Effect, reducer::Reducer};
use wappu_runtime::{Store, StoreConfig};

/// The whole client state
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    /// Third-party apps
    pub apps: AppsState,
    /// Map selection
    pub map: MapState,
    /// Standalone map markers
    pub markers: MarkerState,
    /// Feed posts
    pub feed: FeedState,
    /// Events and map filters
    pub events: EventState,
    /// Teams
    pub teams: TeamState,
    /// Profiles
    pub user: UserState,
    /// Sign-up draft and session
    pub registration: RegistrationState,
}

impl AppState {
    /// Initial state centered on the configured default city
    #[must_use]
    pub fn new(map: &MapConfig) -> Self {
        Self {
            map: MapState::new(map.default_category.clone()),
            ..Self::default()
        }
    }
}

/// A task over the client store
pub type AppTask<T = ()> = Task<AppState, AppAction, AppEnvironment, T>;

/// The handle tasks receive
pub type AppDispatcher = Dispatcher<AppState, AppAction, AppEnvironment>;

/// The combined slice reducers
pub type AppReducer = LoggingReducer<CombinedReducer<AppState, AppAction, AppEnvironment>>;

/// The client store
pub type AppStore = Store<AppState, AppAction, AppEnvironment, AppReducer>;

/// Logs every action before handing it to the wrapped reducer.
///
/// Failures are logged at `warn`, everything else at `debug` with the wire
/// record.
#[derive(Debug, Clone)]
pub struct LoggingReducer<R> {
    inner: R,
}

impl<R> LoggingReducer<R> {
    /// Wrap `inner`
    #[must_use]
    pub const fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R> Reducer for LoggingReducer<R>
where
    R: Reducer<State = AppState, Action = AppAction, Environment = AppEnvironment>,
{
    type State = AppState;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let action_type = action.action_type();
        if action.is_failure() {
            let record = action.to_record();
            tracing::warn!(action_type, error = ?record.payload, "Request failed");
        } else if tracing::enabled!(tracing::Level::DEBUG) {
            let record = serde_json::to_string(&action.to_record()).unwrap_or_default();
            tracing::debug!(action_type, %record, "Dispatch");
        }
        self.inner.reduce(state, action, env)
    }
}

/// The root reducer
#[must_use]
pub fn app_reducer() -> AppReducer {
    LoggingReducer::new(combine_reducers(vec![
        Box::new(scope_reducer(AppsReducer::new(), |s: &mut AppState| &mut s.apps)),
        Box::new(scope_reducer(MapReducer, |s: &mut AppState| &mut s.map)),
        Box::new(scope_reducer(MarkerReducer::new(), |s: &mut AppState| &mut s.markers)),
        Box::new(scope_reducer(FeedReducer, |s: &mut AppState| &mut s.feed)),
        Box::new(scope_reducer(EventReducer, |s: &mut AppState| &mut s.events)),
        Box::new(scope_reducer(TeamReducer::new(), |s: &mut AppState| &mut s.teams)),
        Box::new(scope_reducer(UserReducer, |s: &mut AppState| &mut s.user)),
        Box::new(scope_reducer(RegistrationReducer, |s: &mut AppState| &mut s.registration)),
    ]))
}

/// Store settings as the runtime wants them
#[must_use]
pub const fn store_config(settings: &StoreSettings) -> StoreConfig {
    StoreConfig::new(
        settings.broadcast_capacity,
        Duration::from_secs(settings.shutdown_timeout_secs),
    )
}

/// A store with the initial state for `env`'s map settings
#[must_use]
pub fn new_store(env: AppEnvironment, config: StoreConfig) -> AppStore {
    Store::with_config(AppState::new(&env.map), app_reducer(), env, config)
}

#[cfg(test)]
pub(crate) fn test_environment() -> AppEnvironment {
    use crate::environment::TeamNameGenerator;
    use crate::gateway::MockGateway;
    use std::sync::Arc;

    AppEnvironment::new(
        Arc::new(MockGateway::new()),
        Arc::new(wappu_testing::test_clock()),
        "test-device",
        MapConfig::default(),
    )
    .with_names(Arc::new(TeamNameGenerator::with_seed(7)))
}
