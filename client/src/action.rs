//! The root action and the action type table
//!
//! Every type string the client dispatches is defined here. Remote
//! operations get their three names from [`RequestTypes`]; the bases are
//! listed once in [`REQUEST_BASES`] so collisions are caught by a test.

use crate::slices::ListAction;
use crate::slices::event::EventAction;
use crate::slices::feed::FeedAction;
use crate::slices::map::MapAction;
use crate::slices::registration::RegistrationAction;
use crate::slices::user::UserAction;
use crate::types::{App, EntityId, Marker, Team};
use serde_json::json;
use std::sync::LazyLock;
use wappu_core::action::{ActionRecord, RequestTypes};

macro_rules! request_types {
    ($($name:ident => $base:literal),* $(,)?) => {
        $(
            #[doc = concat!("`", $base, "_{REQUEST,SUCCESS,FAILURE}`")]
            pub static $name: LazyLock<RequestTypes> = LazyLock::new(|| RequestTypes::new($base));
        )*

        /// Every request base in use
        pub const REQUEST_BASES: &[&str] = &[$($base),*];
    };
}

request_types! {
    GET_APPS => "GET_APPS",
    GET_MARKER_LIST => "GET_MARKER_LIST",
    GET_FEED => "GET_FEED",
    VOTE_FEED_ITEM => "VOTE_FEED_ITEM",
    GET_EVENT_LIST => "GET_EVENT_LIST",
    GET_TEAMS => "GET_TEAMS",
    GET_USER_PROFILE => "GET_USER_PROFILE",
    CREATE_USER => "CREATE_USER",
    GET_USER => "GET_USER",
    POST_PROFILE_PICTURE => "POST_PROFILE_PICTURE",
}

/// Plain (non-request) action types
pub mod types {
    #![allow(missing_docs)]

    pub const SET_APPS: &str = "SET_APPS";
    pub const SET_MARKER_LIST: &str = "SET_MARKER_LIST";
    pub const SET_FEED: &str = "SET_FEED";
    pub const SET_COMMENTS: &str = "SET_COMMENTS";
    pub const SET_EVENT_LIST: &str = "SET_EVENT_LIST";
    pub const UPDATE_SHOW_FILTER: &str = "UPDATE_SHOW_FILTER";
    pub const TOGGLE_LOCATE_ME: &str = "TOGGLE_LOCATE_ME";
    pub const SET_TEAMS: &str = "SET_TEAMS";
    pub const SELECT_MARKER: &str = "map/SELECT_MARKER";
    pub const SELECT_CATEGORY: &str = "map/SELECT_CATEGORY";
    pub const SET_USER_PROFILE: &str = "user/SET_USER_PROFILE";
    pub const CLOSE_USER_VIEW: &str = "user/CLOSE_USER_VIEW";
    pub const OPEN_REGISTRATION_VIEW: &str = "OPEN_REGISTRATION_VIEW";
    pub const CLOSE_REGISTRATION_VIEW: &str = "CLOSE_REGISTRATION_VIEW";
    pub const DISMISS_INTRODUCTION: &str = "DISMISS_INTRODUCTION";
    pub const UPDATE_NAME: &str = "UPDATE_NAME";
    pub const UPDATE_USER_INFO: &str = "UPDATE_USER_INFO";
    pub const UPDATE_PROFILE: &str = "UPDATE_PROFILE";
    pub const SELECT_TEAM: &str = "SELECT_TEAM";
    pub const CLOSE_TEAM_SELECTOR: &str = "CLOSE_TEAM_SELECTOR";
    pub const RESET: &str = "RESET";
    pub const SET_TOKEN: &str = "SET_TOKEN";

    pub(crate) const ALL: &[&str] = &[
        SET_APPS,
        SET_MARKER_LIST,
        SET_FEED,
        SET_COMMENTS,
        SET_EVENT_LIST,
        UPDATE_SHOW_FILTER,
        TOGGLE_LOCATE_ME,
        SET_TEAMS,
        SELECT_MARKER,
        SELECT_CATEGORY,
        SET_USER_PROFILE,
        CLOSE_USER_VIEW,
        OPEN_REGISTRATION_VIEW,
        CLOSE_REGISTRATION_VIEW,
        DISMISS_INTRODUCTION,
        UPDATE_NAME,
        UPDATE_USER_INFO,
        UPDATE_PROFILE,
        SELECT_TEAM,
        CLOSE_TEAM_SELECTOR,
        RESET,
        SET_TOKEN,
    ];
}

/// Events that more than one slice reacts to.
///
/// A vote or a comment count change touches the post wherever it is held:
/// the feed and the viewed profile's images.
#[derive(Debug, Clone, PartialEq)]
pub enum SharedEvent {
    /// A post's vote changed (optimistically, or reverted after a failure)
    FeedItemVoted {
        /// Voted post
        feed_item_id: EntityId,
        /// This user's vote after the change
        value: i64,
        /// Vote total after the change
        votes: i64,
    },
    /// A post's comments were loaded
    CommentsSet {
        /// Post the comments belong to
        post_id: EntityId,
        /// Number of comments
        count: i64,
    },
}

impl SharedEvent {
    /// Wire type string
    #[must_use]
    pub fn action_type(&self) -> &'static str {
        match self {
            Self::FeedItemVoted { .. } => &VOTE_FEED_ITEM.request,
            Self::CommentsSet { .. } => types::SET_COMMENTS,
        }
    }

    /// Wire record
    #[must_use]
    pub fn to_record(&self) -> ActionRecord {
        let payload = match self {
            Self::FeedItemVoted {
                feed_item_id,
                value,
                votes,
            } => json!({ "feedItemId": feed_item_id, "value": value, "votes": votes }),
            Self::CommentsSet { post_id, count } => json!({ "postId": post_id, "count": count }),
        };
        ActionRecord::new(self.action_type()).with_payload(payload)
    }
}

/// Everything that can be dispatched to the client store.
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    /// Apps collection
    Apps(ListAction<App>),
    /// Standalone markers collection
    Markers(ListAction<Marker>),
    /// Teams collection
    Teams(ListAction<Team>),
    /// Feed slice
    Feed(FeedAction),
    /// Event slice
    Events(EventAction),
    /// Map view slice
    Map(MapAction),
    /// User profile slice
    User(UserAction),
    /// Registration slice
    Registration(RegistrationAction),
    /// Cross-slice events
    Shared(SharedEvent),
}

impl AppAction {
    /// Wire type string
    #[must_use]
    pub fn action_type(&self) -> &'static str {
        match self {
            Self::Apps(a) => a.action_type(),
            Self::Markers(a) => a.action_type(),
            Self::Teams(a) => a.action_type(),
            Self::Feed(a) => a.action_type(),
            Self::Events(a) => a.action_type(),
            Self::Map(a) => a.action_type(),
            Self::User(a) => a.action_type(),
            Self::Registration(a) => a.action_type(),
            Self::Shared(a) => a.action_type(),
        }
    }

    /// Wire record, as logged and inspected
    #[must_use]
    pub fn to_record(&self) -> ActionRecord {
        match self {
            Self::Apps(a) => a.to_record(),
            Self::Markers(a) => a.to_record(),
            Self::Teams(a) => a.to_record(),
            Self::Feed(a) => a.to_record(),
            Self::Events(a) => a.to_record(),
            Self::Map(a) => a.to_record(),
            Self::User(a) => a.to_record(),
            Self::Registration(a) => a.to_record(),
            Self::Shared(a) => a.to_record(),
        }
    }

    /// Whether this is a `*_FAILURE` action
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.action_type().ends_with("_FAILURE")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn request_bases_are_distinct() {
        let bases: HashSet<_> = REQUEST_BASES.iter().collect();
        assert_eq!(bases.len(), REQUEST_BASES.len());
    }

    #[test]
    fn no_two_action_types_collide() {
        let derived = [
            &*GET_APPS,
            &*GET_MARKER_LIST,
            &*GET_FEED,
            &*VOTE_FEED_ITEM,
            &*GET_EVENT_LIST,
            &*GET_TEAMS,
            &*GET_USER_PROFILE,
            &*CREATE_USER,
            &*GET_USER,
            &*POST_PROFILE_PICTURE,
        ];
        assert_eq!(derived.len(), REQUEST_BASES.len());

        let mut seen = HashSet::new();
        for name in derived
            .iter()
            .flat_map(|t| t.names())
            .chain(types::ALL.iter().copied())
        {
            assert!(seen.insert(name.to_string()), "duplicate action type {name}");
        }
    }

    #[test]
    fn shared_vote_record_uses_request_type() {
        let record = SharedEvent::FeedItemVoted {
            feed_item_id: EntityId::from("p1"),
            value: 1,
            votes: 4,
        }
        .to_record();

        assert_eq!(record.action_type, "VOTE_FEED_ITEM_REQUEST");
        assert_eq!(
            record.payload,
            Some(json!({ "feedItemId": "p1", "value": 1, "votes": 4 }))
        );
    }

    #[test]
    fn failures_are_flagged() {
        assert!(AppAction::Apps(ListAction::Failure("x".to_string())).is_failure());
        assert!(!AppAction::Apps(ListAction::Request).is_failure());
    }
}
