//! User slice: the own profile and the profile being viewed
//!
//! Profile requests carry a generation token. Opening another user, or
//! closing the view, makes older in-flight requests stale: their results are
//! dropped instead of overwriting the profile now on screen.

use super::feed::patch_post;
use crate::action::{AppAction, GET_USER_PROFILE, SharedEvent, types};
use crate::app::{AppDispatcher, AppState, AppTask};
use crate::environment::AppEnvironment;
use crate::types::{EntityId, FeedPost, User, UserProfile};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use wappu_core::action::ActionRecord;
use wappu_core::command::Task;
use wappu_core::{SmallVec, effect::Effect, reducer::Reducer};

/// Which profile a request or update targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileTarget {
    /// The signed-in user's own profile
    My,
    /// The profile opened from the feed or map
    Other,
}

impl ProfileTarget {
    /// Wire `subType`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::My => "MY",
            Self::Other => "OTHER",
        }
    }
}

/// Profiles and the profile request lifecycle
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserState {
    /// Own profile
    pub my_profile: UserProfile,
    /// Viewed profile
    pub profile: UserProfile,
    /// Whether any profile request is in flight
    pub is_loading: bool,
    /// Whether the own profile request is in flight
    pub is_loading_my_profile: bool,
    /// Whether the current viewed profile request is in flight
    pub is_loading_profile: bool,
    /// Token of the latest request for the viewed profile
    pub profile_generation: Option<u64>,
}

impl UserState {
    fn is_current(&self, target: ProfileTarget, generation: u64) -> bool {
        target == ProfileTarget::My || self.profile_generation == Some(generation)
    }

    fn set_loading(&mut self, target: ProfileTarget, loading: bool) {
        match target {
            ProfileTarget::My => self.is_loading_my_profile = loading,
            ProfileTarget::Other => self.is_loading_profile = loading,
        }
        self.is_loading = self.is_loading_my_profile || self.is_loading_profile;
    }
}

/// User actions
#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    /// `GET_USER_PROFILE_REQUEST`
    GetUserProfileRequest {
        /// Profile being fetched
        target: ProfileTarget,
        /// Request token
        generation: u64,
    },
    /// `GET_USER_PROFILE_SUCCESS`
    GetUserProfileSuccess {
        /// Profile fetched
        target: ProfileTarget,
        /// Request token
        generation: u64,
    },
    /// `GET_USER_PROFILE_FAILURE`
    GetUserProfileFailure {
        /// Profile that failed
        target: ProfileTarget,
        /// Request token
        generation: u64,
        /// Error message
        error: String,
    },
    /// `user/SET_USER_PROFILE`
    SetUserProfile {
        /// Own or viewed profile
        target: ProfileTarget,
        /// The new profile
        profile: UserProfile,
        /// Request token; `None` applies unconditionally
        generation: Option<u64>,
    },
    /// `user/CLOSE_USER_VIEW`
    CloseUserView,
}

impl UserAction {
    /// Wire type string
    #[must_use]
    pub fn action_type(&self) -> &'static str {
        match self {
            Self::GetUserProfileRequest { .. } => &GET_USER_PROFILE.request,
            Self::GetUserProfileSuccess { .. } => &GET_USER_PROFILE.success,
            Self::GetUserProfileFailure { .. } => &GET_USER_PROFILE.failure,
            Self::SetUserProfile { .. } => types::SET_USER_PROFILE,
            Self::CloseUserView => types::CLOSE_USER_VIEW,
        }
    }

    /// Wire record
    #[must_use]
    pub fn to_record(&self) -> ActionRecord {
        match self {
            Self::GetUserProfileRequest { target, .. } | Self::GetUserProfileSuccess { target, .. } => {
                ActionRecord::new(self.action_type()).with_sub_type(target.as_str())
            },
            Self::GetUserProfileFailure { target, error, .. } => {
                ActionRecord::failure(self.action_type(), error.clone()).with_sub_type(target.as_str())
            },
            Self::SetUserProfile { target, profile, .. } => ActionRecord::new(self.action_type())
                .with_payload(serde_json::to_value(profile).unwrap_or_default())
                .with_sub_type(target.as_str()),
            Self::CloseUserView => ActionRecord::new(self.action_type()),
        }
    }
}

/// Reducer for [`UserState`]
#[derive(Debug, Clone, Copy, Default)]
pub struct UserReducer;

impl Reducer for UserReducer {
    type State = UserState;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            AppAction::User(action) => reduce_user(state, action),
            AppAction::Shared(SharedEvent::FeedItemVoted {
                feed_item_id,
                value,
                votes,
            }) => {
                patch_post(&mut state.profile.images, &feed_item_id, |post| {
                    post.user_vote = value;
                    post.votes = votes;
                });
            },
            AppAction::Shared(SharedEvent::CommentsSet { post_id, count }) => {
                let found = patch_post(&mut state.profile.images, &post_id, |post| {
                    post.comment_count = count;
                });
                if !found {
                    tracing::debug!(%post_id, "Comment count for a post not in the viewed profile");
                }
            },
            _ => {},
        }
        SmallVec::new()
    }
}

fn reduce_user(state: &mut UserState, action: UserAction) {
    match action {
        UserAction::GetUserProfileRequest { target, generation } => {
            state.profile = UserProfile::default();
            state.set_loading(target, true);
            if target == ProfileTarget::Other {
                state.profile_generation = Some(generation);
            }
        },
        UserAction::GetUserProfileSuccess { target, generation }
        | UserAction::GetUserProfileFailure {
            target, generation, ..
        } => {
            if state.is_current(target, generation) {
                state.set_loading(target, false);
            }
        },
        UserAction::SetUserProfile {
            target: ProfileTarget::My,
            profile,
            ..
        } => state.my_profile = profile,
        UserAction::SetUserProfile {
            target: ProfileTarget::Other,
            profile,
            generation,
        } => match generation {
            Some(generation) if state.profile_generation != Some(generation) => {
                tracing::debug!(generation, "Dropping stale profile");
            },
            _ => state.profile = profile,
        },
        UserAction::CloseUserView => {
            state.profile = UserProfile::default();
            state.profile_generation = None;
            state.set_loading(ProfileTarget::Other, false);
        },
    }
}

async fn request_profile(d: &AppDispatcher, target: ProfileTarget) -> u64 {
    let generation = d.environment().next_request_token();
    d.dispatch(AppAction::User(UserAction::GetUserProfileRequest { target, generation }))
        .await;
    generation
}

async fn complete_profile(
    d: &AppDispatcher,
    user_id: EntityId,
    target: ProfileTarget,
    generation: u64,
) -> AppAction {
    let last = match d.environment().gateway.get_user_profile(user_id).await {
        Ok(profile) => {
            d.dispatch(AppAction::User(UserAction::GetUserProfileSuccess { target, generation }))
                .await;
            AppAction::User(UserAction::SetUserProfile {
                target,
                profile,
                generation: Some(generation),
            })
        },
        Err(error) => {
            tracing::warn!(%error, target = target.as_str(), "Profile fetch failed");
            AppAction::User(UserAction::GetUserProfileFailure {
                target,
                generation,
                error: error.to_string(),
            })
        },
    };
    d.dispatch(last.clone()).await;
    last
}

/// Fetch a user's profile and images into `target`.
///
/// Resolves to the last action dispatched.
#[must_use]
pub fn fetch_user_images(user_id: EntityId, target: ProfileTarget) -> AppTask<AppAction> {
    Task::new("fetch_user_images", move |d: AppDispatcher| async move {
        let generation = request_profile(&d, target).await;
        complete_profile(&d, user_id, target, generation).await
    })
}

/// Fetch the signed-in user's own profile.
///
/// Does nothing and resolves to `None` while no user id is known.
#[must_use]
pub fn fetch_user_profile() -> AppTask<Option<AppAction>> {
    Task::new("fetch_user_profile", |d: AppDispatcher| async move {
        let user_id = d.get_state().await.registration.user_id?;
        Some(d.run(fetch_user_images(user_id, ProfileTarget::My)).await)
    })
}

/// Open another user's profile.
///
/// Shows the known user data with `avatar` right away, then replaces it
/// with the fetched profile.
#[must_use]
pub fn open_user_view(user: User, avatar: Option<String>) -> AppTask<AppAction> {
    Task::new("open_user_view", move |d: AppDispatcher| async move {
        d.environment().tracker.track("user", "open", &user.name);

        let generation = request_profile(&d, ProfileTarget::Other).await;
        d.dispatch(AppAction::User(UserAction::SetUserProfile {
            target: ProfileTarget::Other,
            profile: UserProfile::from_user(&user, avatar),
            generation: Some(generation),
        }))
        .await;

        complete_profile(&d, user.id, ProfileTarget::Other, generation).await
    })
}

/// Close the viewed profile
#[must_use]
pub const fn close_user_view() -> AppAction {
    AppAction::User(UserAction::CloseUserView)
}

/// The viewed profile
#[must_use]
pub fn get_user_profile(state: &AppState) -> &UserProfile {
    &state.user.profile
}

/// Images of the viewed profile
#[must_use]
pub fn get_user_images(state: &AppState) -> Arc<Vec<FeedPost>> {
    Arc::clone(&state.user.profile.images)
}

/// Avatar of the viewed profile, empty when unknown
#[must_use]
pub fn get_user_picture(state: &AppState) -> String {
    state.user.profile.profile_picture.clone().unwrap_or_default()
}

/// Team name of the viewed profile
#[must_use]
pub fn get_user_team(state: &AppState) -> Option<&str> {
    state.user.profile.team.as_deref()
}

/// Sima count of the viewed profile as display text, empty when unknown
#[must_use]
pub fn get_total_simas(state: &AppState) -> String {
    match &state.user.profile.num_simas {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Whether a profile request is in flight
#[must_use]
pub fn is_loading_user_images(state: &AppState) -> bool {
    state.user.is_loading
}

/// Images of the own profile
#[must_use]
pub fn get_my_images(state: &AppState) -> Arc<Vec<FeedPost>> {
    Arc::clone(&state.user.my_profile.images)
}

/// Sum of votes over the viewed profile's images
#[must_use]
pub fn get_total_votes_for_user(state: &AppState) -> i64 {
    state.user.profile.images.iter().map(|post| post.votes).sum()
}

/// Whole days between the viewed profile's newest image and `now`.
///
/// Images are newest first. `None` when there are no images or the newest
/// has no creation time.
#[must_use]
pub fn get_days_since_last_post(state: &AppState, now: DateTime<Utc>) -> Option<i64> {
    let created = state.user.profile.images.first()?.created_at?;
    Some((now - created).num_days())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::app::test_environment;
    use serde_json::{Map, json};
    use wappu_testing::{ReducerTest, assertions};

    fn image(id: &str, votes: i64) -> FeedPost {
        FeedPost {
            id: EntityId::from(id),
            post_type: "IMAGE".to_string(),
            location: None,
            votes,
            user_vote: 0,
            comment_count: 0,
            created_at: None,
            author: None,
            extra: Map::new(),
        }
    }

    fn profile_with(images: Vec<FeedPost>) -> UserProfile {
        UserProfile {
            images: Arc::new(images),
            ..UserProfile::default()
        }
    }

    fn viewing(images: Vec<FeedPost>) -> UserState {
        UserState {
            profile: profile_with(images),
            ..UserState::default()
        }
    }

    #[test]
    fn set_profile_routes_by_target() {
        let mine = profile_with(vec![image("mine", 1)]);
        let theirs = profile_with(vec![image("theirs", 2)]);
        let (expected_mine, expected_theirs) = (mine.clone(), theirs.clone());

        ReducerTest::new(UserReducer)
            .with_env(test_environment())
            .given_state(UserState::default())
            .when_actions([
                AppAction::User(UserAction::SetUserProfile {
                    target: ProfileTarget::My,
                    profile: mine,
                    generation: None,
                }),
                AppAction::User(UserAction::SetUserProfile {
                    target: ProfileTarget::Other,
                    profile: theirs,
                    generation: None,
                }),
            ])
            .then_state(move |state| {
                assert_eq!(state.my_profile, expected_mine);
                assert_eq!(state.profile, expected_theirs);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn request_clears_profile_and_loads() {
        ReducerTest::new(UserReducer)
            .with_env(test_environment())
            .given_state(viewing(vec![image("a", 1)]))
            .when_action(AppAction::User(UserAction::GetUserProfileRequest {
                target: ProfileTarget::Other,
                generation: 1,
            }))
            .then_state(|state| {
                assert!(state.is_loading);
                assert_eq!(state.profile, UserProfile::default());
                assert_eq!(state.profile_generation, Some(1));
            })
            .run();
    }

    #[test]
    fn stale_profile_is_dropped() {
        ReducerTest::new(UserReducer)
            .with_env(test_environment())
            .given_state(UserState::default())
            .when_actions([
                AppAction::User(UserAction::GetUserProfileRequest {
                    target: ProfileTarget::Other,
                    generation: 1,
                }),
                AppAction::User(UserAction::GetUserProfileRequest {
                    target: ProfileTarget::Other,
                    generation: 2,
                }),
                AppAction::User(UserAction::GetUserProfileSuccess {
                    target: ProfileTarget::Other,
                    generation: 1,
                }),
                AppAction::User(UserAction::SetUserProfile {
                    target: ProfileTarget::Other,
                    profile: profile_with(vec![image("old", 1)]),
                    generation: Some(1),
                }),
            ])
            .then_state(|state| {
                assert!(state.profile.images.is_empty());
                assert!(state.is_loading);
            })
            .run();
    }

    #[test]
    fn close_view_invalidates_in_flight_request() {
        ReducerTest::new(UserReducer)
            .with_env(test_environment())
            .given_state(UserState::default())
            .when_actions([
                AppAction::User(UserAction::GetUserProfileRequest {
                    target: ProfileTarget::Other,
                    generation: 3,
                }),
                close_user_view(),
                AppAction::User(UserAction::SetUserProfile {
                    target: ProfileTarget::Other,
                    profile: profile_with(vec![image("late", 1)]),
                    generation: Some(3),
                }),
            ])
            .then_state(|state| {
                assert_eq!(state.profile, UserProfile::default());
                assert!(!state.is_loading);
                assert_eq!(state.profile_generation, None);
            })
            .run();
    }

    #[test]
    fn own_profile_outcome_clears_loading() {
        ReducerTest::new(UserReducer)
            .with_env(test_environment())
            .given_state(UserState::default())
            .when_actions([
                AppAction::User(UserAction::GetUserProfileRequest {
                    target: ProfileTarget::My,
                    generation: 4,
                }),
                AppAction::User(UserAction::GetUserProfileFailure {
                    target: ProfileTarget::My,
                    generation: 4,
                    error: "offline".to_string(),
                }),
            ])
            .then_state(|state| assert!(!state.is_loading))
            .run();
    }

    #[test]
    fn own_profile_outcome_keeps_viewed_request_loading() {
        ReducerTest::new(UserReducer)
            .with_env(test_environment())
            .given_state(UserState::default())
            .when_actions([
                AppAction::User(UserAction::GetUserProfileRequest {
                    target: ProfileTarget::My,
                    generation: 5,
                }),
                AppAction::User(UserAction::GetUserProfileRequest {
                    target: ProfileTarget::Other,
                    generation: 6,
                }),
                AppAction::User(UserAction::GetUserProfileSuccess {
                    target: ProfileTarget::My,
                    generation: 5,
                }),
            ])
            .then_state(|state| {
                assert!(state.is_loading);
                assert!(state.is_loading_profile);
                assert!(!state.is_loading_my_profile);
            })
            .run();
    }

    #[test]
    fn closing_the_view_keeps_own_request_loading() {
        ReducerTest::new(UserReducer)
            .with_env(test_environment())
            .given_state(UserState::default())
            .when_actions([
                AppAction::User(UserAction::GetUserProfileRequest {
                    target: ProfileTarget::My,
                    generation: 7,
                }),
                AppAction::User(UserAction::GetUserProfileRequest {
                    target: ProfileTarget::Other,
                    generation: 8,
                }),
                close_user_view(),
            ])
            .then_state(|state| {
                assert!(state.is_loading);
                assert!(state.is_loading_my_profile);
                assert!(!state.is_loading_profile);
            })
            .run();
    }

    #[test]
    fn vote_patches_viewed_image() {
        ReducerTest::new(UserReducer)
            .with_env(test_environment())
            .given_state(viewing(vec![image("p0", 0), image("p1", 3)]))
            .when_action(AppAction::Shared(SharedEvent::FeedItemVoted {
                feed_item_id: EntityId::from("p1"),
                value: 1,
                votes: 4,
            }))
            .then_state(|state| {
                assert_eq!(state.profile.images[1].votes, 4);
                assert_eq!(state.profile.images[1].user_vote, 1);
                assert_eq!(state.profile.images[0].votes, 0);
            })
            .run();
    }

    #[test]
    fn vote_for_missing_image_keeps_identity() {
        let state = viewing(vec![image("p1", 3)]);
        let before = Arc::clone(&state.profile.images);

        ReducerTest::new(UserReducer)
            .with_env(test_environment())
            .given_state(state)
            .when_action(AppAction::Shared(SharedEvent::FeedItemVoted {
                feed_item_id: EntityId::from("p9"),
                value: 1,
                votes: 4,
            }))
            .then_state(move |state| assert!(Arc::ptr_eq(&state.profile.images, &before)))
            .run();
    }

    #[test]
    fn comments_set_patches_count_or_nothing() {
        ReducerTest::new(UserReducer)
            .with_env(test_environment())
            .given_state(viewing(vec![image("p1", 0)]))
            .when_actions([
                AppAction::Shared(SharedEvent::CommentsSet {
                    post_id: EntityId::from("p1"),
                    count: 2,
                }),
                AppAction::Shared(SharedEvent::CommentsSet {
                    post_id: EntityId::from("p2"),
                    count: 8,
                }),
            ])
            .then_state(|state| {
                assert_eq!(state.profile.images.len(), 1);
                assert_eq!(state.profile.images[0].comment_count, 2);
            })
            .run();
    }

    #[test]
    fn set_profile_record_has_sub_type() {
        let record = AppAction::User(UserAction::SetUserProfile {
            target: ProfileTarget::My,
            profile: UserProfile::default(),
            generation: None,
        })
        .to_record();

        assert_eq!(record.action_type, "user/SET_USER_PROFILE");
        assert_eq!(record.sub_type.as_deref(), Some("MY"));
    }

    #[test]
    fn selectors_on_viewed_profile() {
        let mut state = AppState::default();
        assert_eq!(get_user_picture(&state), "");
        assert_eq!(get_total_simas(&state), "");
        assert_eq!(get_days_since_last_post(&state, Utc::now()), None);
        assert!(get_user_team(&state).is_none());

        let mut newest = image("p1", 2);
        newest.created_at = Some("2025-04-27T10:00:00Z".parse().unwrap());
        state.user.profile = UserProfile {
            team: Some("Tietokilta".to_string()),
            profile_picture: Some("avatar.png".to_string()),
            num_simas: Some(json!(12)),
            ..profile_with(vec![newest, image("p0", 3)])
        };
        let now: DateTime<Utc> = "2025-04-30T12:00:00Z".parse().unwrap();

        assert_eq!(get_total_votes_for_user(&state), 5);
        assert_eq!(get_days_since_last_post(&state, now), Some(3));
        assert_eq!(get_user_picture(&state), "avatar.png");
        assert_eq!(get_user_team(&state), Some("Tietokilta"));
        assert_eq!(get_total_simas(&state), "12");
        assert_eq!(get_user_images(&state).len(), 2);
        assert!(get_my_images(&state).is_empty());

        state.user.profile.num_simas = Some(json!("7"));
        assert_eq!(get_total_simas(&state), "7");
    }
}
