//! In-memory gateway for tests and offline runs

use super::{Gateway, PutUserParams, VoteParams};
use crate::error::GatewayError;
use crate::types::{EntityId, User, UserProfile};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use wappu_core::command::BoxFuture;

/// One call made against a [`MockGateway`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    /// `fetch_models(resource)`
    FetchModels(String),
    /// `put_user(params)`
    PutUser(PutUserParams),
    /// `get_user(uuid)`
    GetUser(String),
    /// `get_user_profile(user_id)`
    GetUserProfile(EntityId),
    /// `put_vote(params)`
    PutVote(VoteParams),
}

/// Gateway operation names, used to inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `fetch_models`
    FetchModels,
    /// `put_user`
    PutUser,
    /// `get_user`
    GetUser,
    /// `get_user_profile`
    GetUserProfile,
    /// `put_vote`
    PutVote,
}

/// Canned-response gateway
///
/// Build it with the `with_*` methods, then hand it to the environment.
/// Anything not configured answers [`GatewayError::Unavailable`], except
/// `put_user` and `put_vote` which succeed by default.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use wappu_client::gateway::MockGateway;
///
/// let gateway = MockGateway::new()
///     .with_models("apps", vec![json!({ "id": 1, "name": "Wappu" })]);
/// assert!(gateway.calls().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MockGateway {
    models: HashMap<String, Vec<Value>>,
    users: HashMap<String, User>,
    profiles: HashMap<EntityId, UserProfile>,
    profile_delays: HashMap<EntityId, Duration>,
    failures: HashMap<Operation, GatewayError>,
    resource_failures: HashMap<String, GatewayError>,
    calls: Mutex<Vec<GatewayCall>>,
}

impl MockGateway {
    /// An empty mock
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `fetch_models(resource)` with `items`
    #[must_use]
    pub fn with_models(mut self, resource: &str, items: Vec<Value>) -> Self {
        self.models.insert(resource.to_string(), items);
        self
    }

    /// Answer `get_user(uuid)` with `user`
    #[must_use]
    pub fn with_user(mut self, uuid: &str, user: User) -> Self {
        self.users.insert(uuid.to_string(), user);
        self
    }

    /// Answer `get_user_profile(user_id)` with `profile`
    #[must_use]
    pub fn with_profile(mut self, user_id: impl Into<EntityId>, profile: UserProfile) -> Self {
        self.profiles.insert(user_id.into(), profile);
        self
    }

    /// Delay the profile answer for one user
    #[must_use]
    pub fn with_profile_delay(mut self, user_id: impl Into<EntityId>, delay: Duration) -> Self {
        self.profile_delays.insert(user_id.into(), delay);
        self
    }

    /// Make every call to `operation` fail with `error`
    #[must_use]
    pub fn failing(mut self, operation: Operation, error: GatewayError) -> Self {
        self.failures.insert(operation, error);
        self
    }

    /// Make `fetch_models(resource)` fail with `error`
    #[must_use]
    pub fn failing_resource(mut self, resource: &str, error: GatewayError) -> Self {
        self.resource_failures.insert(resource.to_string(), error);
        self
    }

    /// Every call made so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: GatewayCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn injected(&self, operation: Operation) -> Result<(), GatewayError> {
        self.failures.get(&operation).cloned().map_or(Ok(()), Err)
    }
}

impl Gateway for MockGateway {
    fn fetch_models(&self, resource: &'static str) -> BoxFuture<'_, Result<Vec<Value>, GatewayError>> {
        Box::pin(async move {
            self.record(GatewayCall::FetchModels(resource.to_string()));
            self.injected(Operation::FetchModels)?;
            if let Some(error) = self.resource_failures.get(resource) {
                return Err(error.clone());
            }
            self.models
                .get(resource)
                .cloned()
                .ok_or_else(|| GatewayError::Unavailable(format!("no canned {resource}")))
        })
    }

    fn put_user(&self, params: PutUserParams) -> BoxFuture<'_, Result<Value, GatewayError>> {
        Box::pin(async move {
            self.record(GatewayCall::PutUser(params.clone()));
            self.injected(Operation::PutUser)?;
            Ok(serde_json::to_value(params)?)
        })
    }

    fn get_user(&self, uuid: String) -> BoxFuture<'_, Result<User, GatewayError>> {
        Box::pin(async move {
            self.record(GatewayCall::GetUser(uuid.clone()));
            self.injected(Operation::GetUser)?;
            self.users
                .get(&uuid)
                .cloned()
                .ok_or_else(|| GatewayError::Status {
                    status: 404,
                    message: format!("no user {uuid}"),
                })
        })
    }

    fn get_user_profile(&self, user_id: EntityId) -> BoxFuture<'_, Result<UserProfile, GatewayError>> {
        Box::pin(async move {
            self.record(GatewayCall::GetUserProfile(user_id.clone()));
            if let Some(delay) = self.profile_delays.get(&user_id) {
                tokio::time::sleep(*delay).await;
            }
            self.injected(Operation::GetUserProfile)?;
            self.profiles
                .get(&user_id)
                .cloned()
                .ok_or_else(|| GatewayError::Unavailable(format!("no canned profile {user_id}")))
        })
    }

    fn put_vote(&self, params: VoteParams) -> BoxFuture<'_, Result<(), GatewayError>> {
        Box::pin(async move {
            self.record(GatewayCall::PutVote(params));
            self.injected(Operation::PutVote)
        })
    }
}
