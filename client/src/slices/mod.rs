//! State slices
//!
//! Each slice owns one partition of [`crate::app::AppState`], the actions
//! that change it, the tasks that fetch its data and the selectors that read
//! it. Slice reducers see every dispatched action and leave their state
//! untouched for actions they do not handle.
//!
//! Five slices hold a remotely fetched collection (apps, markers, feed,
//! events, teams) and share the list machinery in this module: one
//! [`ListAction`] vocabulary, one [`ListState`] and one [`fetch_list`] task,
//! parameterized by a [`Resource`].

use crate::action::AppAction;
use crate::app::{AppDispatcher, AppTask};
use crate::environment::AppEnvironment;
use crate::error::GatewayError;
use crate::types::LoadingState;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use wappu_core::action::{ActionRecord, RequestTypes};
use wappu_core::command::Task;
use wappu_core::{SmallVec, effect::Effect, reducer::Reducer};

pub mod apps;
pub mod event;
pub mod feed;
pub mod map;
pub mod marker;
pub mod registration;
pub mod team;
pub mod user;

/// An entity type fetched as a whole collection.
pub trait Resource: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection name passed to `Gateway::fetch_models`
    const RESOURCE: &'static str;

    /// Type of the action that replaces the collection
    const SET_TYPE: &'static str;

    /// Request/success/failure type names
    fn request_types() -> &'static RequestTypes;

    /// Wrap a list action into the root action
    fn lift(action: ListAction<Self>) -> AppAction;

    /// The list action inside a root action, if it targets this resource
    fn extract(action: AppAction) -> Option<ListAction<Self>>;
}

/// The fetch protocol of one collection.
#[derive(Debug, Clone, PartialEq)]
pub enum ListAction<T> {
    /// `*_REQUEST`: a fetch started
    Request,
    /// `*_SUCCESS`: the fetch settled successfully
    Success,
    /// `*_FAILURE`: the fetch failed, with the error message
    Failure(String),
    /// `SET_*`: replace the collection
    Set(Arc<Vec<T>>),
}

impl<T: Resource> ListAction<T> {
    /// Wire type string
    #[must_use]
    pub fn action_type(&self) -> &'static str {
        let types = T::request_types();
        match self {
            Self::Request => &types.request,
            Self::Success => &types.success,
            Self::Failure(_) => &types.failure,
            Self::Set(_) => T::SET_TYPE,
        }
    }

    /// Wire record
    #[must_use]
    pub fn to_record(&self) -> ActionRecord {
        match self {
            Self::Failure(message) => ActionRecord::failure(self.action_type(), message.clone()),
            Self::Set(items) => ActionRecord::new(self.action_type())
                .with_payload(serde_json::to_value(items.as_ref()).unwrap_or(Value::Null)),
            Self::Request | Self::Success => ActionRecord::new(self.action_type()),
        }
    }
}

/// A fetched collection and its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ListState<T> {
    /// The collection, replaced wholesale by `SET_*`
    pub items: Arc<Vec<T>>,
    /// Lifecycle of the last fetch
    pub list_state: LoadingState,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            list_state: LoadingState::Idle,
        }
    }
}

impl<T> ListState<T> {
    /// Apply one protocol step.
    ///
    /// A failure keeps the previously loaded items.
    pub fn apply(&mut self, action: ListAction<T>) {
        match action {
            ListAction::Request => self.list_state = LoadingState::Loading,
            ListAction::Success => self.list_state = LoadingState::Ready,
            ListAction::Failure(_) => self.list_state = LoadingState::Failed,
            ListAction::Set(items) => self.items = items,
        }
    }
}

/// Reducer for a slice that is nothing but a fetched collection.
pub struct ListReducer<T> {
    _resource: PhantomData<fn() -> T>,
}

impl<T> ListReducer<T> {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _resource: PhantomData,
        }
    }
}

impl<T> Default for ListReducer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource> Reducer for ListReducer<T> {
    type State = ListState<T>;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        if let Some(action) = T::extract(action) {
            state.apply(action);
        }
        SmallVec::new()
    }
}

fn decode<T: Resource>(items: Vec<Value>) -> Result<Vec<T>, GatewayError> {
    items
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()
        .map_err(GatewayError::from)
}

/// Fetch a whole collection.
///
/// Dispatches `*_REQUEST`, then `*_SUCCESS` followed by `SET_*` on success, or
/// `*_FAILURE` with the error message. Resolves to the last action
/// dispatched. Never fails: errors become the failure action.
#[must_use]
pub fn fetch_list<T: Resource>(name: &'static str) -> AppTask<AppAction> {
    Task::new(name, |d: AppDispatcher| async move {
        d.dispatch(T::lift(ListAction::Request)).await;

        let fetched = d
            .environment()
            .gateway
            .fetch_models(T::RESOURCE)
            .await
            .and_then(decode::<T>);

        let last = match fetched {
            Ok(items) => {
                tracing::debug!(resource = T::RESOURCE, count = items.len(), "Fetched collection");
                metrics::counter!("client.fetch.total", "resource" => T::RESOURCE, "outcome" => "success")
                    .increment(1);
                d.dispatch(T::lift(ListAction::Success)).await;
                T::lift(ListAction::Set(Arc::new(items)))
            },
            Err(error) => {
                tracing::warn!(resource = T::RESOURCE, %error, "Fetch failed");
                metrics::counter!("client.fetch.total", "resource" => T::RESOURCE, "outcome" => "failure")
                    .increment(1);
                T::lift(ListAction::Failure(error.to_string()))
            },
        };

        d.dispatch(last.clone()).await;
        last
    })
}
