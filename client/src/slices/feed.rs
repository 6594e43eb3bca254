//! Feed slice: posts, votes and comment counts

use super::{ListAction, ListState, Resource, fetch_list};
use crate::action::{AppAction, GET_FEED, SharedEvent, VOTE_FEED_ITEM, types};
use crate::app::{AppDispatcher, AppState, AppTask};
use crate::environment::AppEnvironment;
use crate::gateway::VoteParams;
use crate::types::{EntityId, FeedPost};
use serde_json::json;
use std::sync::Arc;
use wappu_core::action::{ActionRecord, RequestTypes};
use wappu_core::command::Task;
use wappu_core::{SmallVec, effect::Effect, reducer::Reducer};

/// Feed posts and their fetch lifecycle
pub type FeedState = ListState<FeedPost>;

/// Feed actions
#[derive(Debug, Clone, PartialEq)]
pub enum FeedAction {
    /// Feed fetch protocol
    List(ListAction<FeedPost>),
    /// `VOTE_FEED_ITEM_SUCCESS`
    VoteSuccess {
        /// Voted post
        feed_item_id: EntityId,
    },
    /// `VOTE_FEED_ITEM_FAILURE`
    VoteFailure {
        /// Voted post
        feed_item_id: EntityId,
        /// Error message
        error: String,
    },
}

impl FeedAction {
    /// Wire type string
    #[must_use]
    pub fn action_type(&self) -> &'static str {
        match self {
            Self::List(action) => action.action_type(),
            Self::VoteSuccess { .. } => &VOTE_FEED_ITEM.success,
            Self::VoteFailure { .. } => &VOTE_FEED_ITEM.failure,
        }
    }

    /// Wire record
    #[must_use]
    pub fn to_record(&self) -> ActionRecord {
        match self {
            Self::List(action) => action.to_record(),
            Self::VoteSuccess { feed_item_id } => {
                ActionRecord::new(self.action_type()).with_payload(json!({ "feedItemId": feed_item_id }))
            },
            Self::VoteFailure { error, .. } => ActionRecord::failure(self.action_type(), error.clone()),
        }
    }
}

impl Resource for FeedPost {
    const RESOURCE: &'static str = "feed";
    const SET_TYPE: &'static str = types::SET_FEED;

    fn request_types() -> &'static RequestTypes {
        &GET_FEED
    }

    fn lift(action: ListAction<Self>) -> AppAction {
        AppAction::Feed(FeedAction::List(action))
    }

    fn extract(action: AppAction) -> Option<ListAction<Self>> {
        match action {
            AppAction::Feed(FeedAction::List(action)) => Some(action),
            _ => None,
        }
    }
}

/// Update the post with `id` in place.
///
/// Returns whether a post matched. When none does the `Arc` is not touched,
/// so the collection keeps its identity.
pub(crate) fn patch_post(
    posts: &mut Arc<Vec<FeedPost>>,
    id: &EntityId,
    patch: impl FnOnce(&mut FeedPost),
) -> bool {
    let Some(index) = posts.iter().position(|post| &post.id == id) else {
        return false;
    };
    if let Some(post) = Arc::make_mut(posts).get_mut(index) {
        patch(post);
    }
    true
}

/// Reducer for [`FeedState`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedReducer;

impl Reducer for FeedReducer {
    type State = FeedState;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            AppAction::Feed(FeedAction::List(action)) => state.apply(action),
            AppAction::Shared(SharedEvent::FeedItemVoted {
                feed_item_id,
                value,
                votes,
            }) => {
                patch_post(&mut state.items, &feed_item_id, |post| {
                    post.user_vote = value;
                    post.votes = votes;
                });
            },
            AppAction::Shared(SharedEvent::CommentsSet { post_id, count }) => {
                patch_post(&mut state.items, &post_id, |post| post.comment_count = count);
            },
            _ => {},
        }
        SmallVec::new()
    }
}

/// Fetch the feed
#[must_use]
pub fn fetch_feed() -> AppTask<AppAction> {
    fetch_list::<FeedPost>("fetch_feed")
}

/// The post with `id`, from the feed or else from the viewed profile.
fn find_post<'a>(state: &'a AppState, id: &EntityId) -> Option<&'a FeedPost> {
    state
        .feed
        .items
        .iter()
        .chain(state.user.profile.images.iter())
        .find(|post| &post.id == id)
}

/// Vote on a post.
///
/// The new vote is applied optimistically everywhere the post is held
/// (`votes' = votes - userVote + value`), then sent. On failure the previous
/// values are restored after the `VOTE_FEED_ITEM_FAILURE`. Resolves to the
/// last action dispatched, or `None` when the post is not in the store.
#[must_use]
pub fn vote_feed_item(feed_item_id: EntityId, value: i64) -> AppTask<Option<AppAction>> {
    Task::new("vote_feed_item", move |d: AppDispatcher| async move {
        let state = d.get_state().await;
        let Some(post) = find_post(&state, &feed_item_id) else {
            tracing::warn!(%feed_item_id, "Vote on a post that is not loaded");
            return None;
        };
        let (previous_vote, previous_votes) = (post.user_vote, post.votes);
        let votes = previous_votes - previous_vote + value;

        d.dispatch(AppAction::Shared(SharedEvent::FeedItemVoted {
            feed_item_id: feed_item_id.clone(),
            value,
            votes,
        }))
        .await;

        let sent = d
            .environment()
            .gateway
            .put_vote(VoteParams {
                feed_item_id: feed_item_id.clone(),
                value,
            })
            .await;

        let last = match sent {
            Ok(()) => {
                let success = AppAction::Feed(FeedAction::VoteSuccess { feed_item_id });
                d.dispatch(success.clone()).await;
                success
            },
            Err(error) => {
                tracing::warn!(%feed_item_id, %error, "Vote failed, reverting");
                metrics::counter!("client.vote.reverted").increment(1);
                d.dispatch(AppAction::Feed(FeedAction::VoteFailure {
                    feed_item_id: feed_item_id.clone(),
                    error: error.to_string(),
                }))
                .await;
                let revert = AppAction::Shared(SharedEvent::FeedItemVoted {
                    feed_item_id,
                    value: previous_vote,
                    votes: previous_votes,
                });
                d.dispatch(revert.clone()).await;
                revert
            },
        };
        Some(last)
    })
}

/// Record the number of comments loaded for a post
#[must_use]
pub const fn set_comments(post_id: EntityId, count: i64) -> AppAction {
    AppAction::Shared(SharedEvent::CommentsSet { post_id, count })
}

/// All posts in the feed
#[must_use]
pub fn get_all_posts(state: &AppState) -> Arc<Vec<FeedPost>> {
    Arc::clone(&state.feed.items)
}
