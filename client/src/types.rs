//! Domain types shared across the client slices
//!
//! Entities mirror the JSON the API returns. Fields the client reads are
//! typed; everything else is kept in a flattened `extra` map so a round trip
//! through the store never drops data.
//!
//! Collections held in state are `Arc<Vec<T>>`. A "set" action replaces the
//! whole `Arc`, so a collection nobody touched keeps its pointer identity and
//! memoized selectors can skip recomputation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Unknown JSON fields carried along with an entity.
pub type Extra = Map<String, Value>;

/// Lifecycle of one remotely fetched collection.
///
/// `Idle → Loading → (Ready | Failed)`, and from either terminal state back to
/// `Loading` on the next request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadingState {
    /// Never requested
    #[default]
    Idle,
    /// A request is in flight
    Loading,
    /// The last request succeeded
    Ready,
    /// The last request failed; previously loaded data is kept
    Failed,
}

impl LoadingState {
    /// Whether a request is in flight.
    #[must_use]
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Entity identifier as the API sends it, either a number or a string.
///
/// `1` and `"1"` are different ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    /// Numeric id
    Number(i64),
    /// Textual id
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude
    #[serde(rename = "latitude", alias = "lat")]
    pub lat: f64,
    /// Longitude
    #[serde(rename = "longitude", alias = "lng")]
    pub lng: f64,
}

impl Location {
    /// Create a location
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A third-party app listed by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    /// Identifier
    pub id: EntityId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Where the app lives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Extra,
}

/// A standalone map point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    /// Identifier
    pub id: EntityId,
    /// Category, for example `"bar"` or `"hotel"`
    #[serde(rename = "type", default)]
    pub marker_type: String,
    /// Position, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Extra,
}

/// A post in the feed, also used for the images on a user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    /// Identifier
    pub id: EntityId,
    /// Post kind (`"IMAGE"`, `"TEXT"`, ...)
    #[serde(rename = "type", default)]
    pub post_type: String,
    /// Where the post was made, if shared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Vote total
    #[serde(default, deserialize_with = "lenient_i64")]
    pub votes: i64,
    /// This user's own vote: -1, 0 or 1
    #[serde(default, deserialize_with = "lenient_i64")]
    pub user_vote: i64,
    /// Number of comments
    #[serde(default, deserialize_with = "lenient_i64")]
    pub comment_count: i64,
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Author as sent by the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Value>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Extra,
}

/// A team (guild) a user can belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// Identifier
    pub id: EntityId,
    /// Team name
    #[serde(default)]
    pub name: String,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Extra,
}

/// A scheduled event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Identifier
    pub id: EntityId,
    /// Event name
    #[serde(default)]
    pub name: String,
    /// Start time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// End time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Venue location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Extra,
}

/// A registered user as returned by `get_user`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identifier
    pub id: EntityId,
    /// Device uuid the user registered with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub info: String,
    /// Team id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<EntityId>,
    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Extra,
}

/// A user profile: identity plus the user's image posts.
///
/// The empty profile (`Default`) stands for "nothing loaded".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Team name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    /// Sima count, a number or a string depending on the API version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_simas: Option<Value>,
    /// Image posts, newest first
    #[serde(default)]
    pub images: std::sync::Arc<Vec<FeedPost>>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Extra,
}

impl UserProfile {
    /// The profile shown while a user's images load.
    ///
    /// `avatar` overrides the user's own picture.
    #[must_use]
    pub fn from_user(user: &User, avatar: Option<String>) -> Self {
        Self {
            id: Some(user.id.clone()),
            name: Some(user.name.clone()),
            team: None,
            profile_picture: avatar.or_else(|| user.profile_picture.clone()),
            num_simas: None,
            images: std::sync::Arc::default(),
            extra: user.extra.clone(),
        }
    }
}

/// Accept integers sent as numbers, numeric strings or `null`.
fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}
