//! Remote data gateway
//!
//! The [`Gateway`] trait is the only way tasks reach the network. It is
//! injected through [`crate::environment::AppEnvironment`], so tests swap in
//! [`mock::MockGateway`] and production uses [`http::HttpGateway`].

use crate::error::GatewayError;
use crate::types::{EntityId, User, UserProfile};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wappu_core::command::BoxFuture;

pub mod http;
pub mod mock;

pub use http::HttpGateway;
pub use mock::{GatewayCall, MockGateway, Operation};

/// Body of a user create/update.
///
/// Used both when committing the registration draft and when uploading a
/// new profile picture (`image_data` set, `info` left out).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutUserParams {
    /// Device uuid
    pub uuid: String,
    /// Display name
    pub name: String,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    /// Team id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<EntityId>,
    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    /// Base64 image to upload as the new avatar
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
}

/// Body of a vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteParams {
    /// Voted post
    pub feed_item_id: EntityId,
    /// New vote value: -1, 0 or 1
    pub value: i64,
}

/// The remote API as the client sees it.
///
/// Implementations must be cheap to share across tasks.
pub trait Gateway: Send + Sync {
    /// Fetch a collection (`"apps"`, `"markers"`, `"feed"`, ...).
    ///
    /// Items are returned undecoded; the caller knows the entity type.
    fn fetch_models(&self, resource: &'static str) -> BoxFuture<'_, Result<Vec<Value>, GatewayError>>;

    /// Create or update the user registered under `params.uuid`.
    fn put_user(&self, params: PutUserParams) -> BoxFuture<'_, Result<Value, GatewayError>>;

    /// Look up the user registered under a device uuid.
    fn get_user(&self, uuid: String) -> BoxFuture<'_, Result<User, GatewayError>>;

    /// Fetch a user's profile including their image posts.
    fn get_user_profile(&self, user_id: EntityId) -> BoxFuture<'_, Result<UserProfile, GatewayError>>;

    /// Record a vote on a post.
    fn put_vote(&self, params: VoteParams) -> BoxFuture<'_, Result<(), GatewayError>>;
}
