//! Reducer composition utilities
//!
//! The client state is split into slices (apps, map, feed, user, ...).
//! Each slice has its own reducer, and the root reducer is assembled from them:
//! - **`scope_reducer`**: Focus a slice reducer on its field of the root state
//! - **`combine_reducers`**: Run every slice reducer for every action
//!
//! # Examples
//!
//! ```
//! use wappu_core::composition::{combine_reducers, scope_reducer};
//! use wappu_core::{effect::Effect, reducer::Reducer, SmallVec};
//!
//! #[derive(Clone, Default)]
//! struct Root {
//!     apps: AppsSlice,
//!     drafts: DraftSlice,
//! }
//!
//! #[derive(Clone, Default)]
//! struct AppsSlice {
//!     loading: bool,
//! }
//!
//! #[derive(Clone, Default)]
//! struct DraftSlice {
//!     name: String,
//! }
//!
//! #[derive(Clone)]
//! enum Action {
//!     GetAppsRequest,
//!     UpdateName(String),
//! }
//!
//! struct AppsReducer;
//! struct DraftReducer;
//!
//! impl Reducer for AppsReducer {
//!     type State = AppsSlice;
//!     type Action = Action;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut AppsSlice, action: Action, _env: &()) -> SmallVec<[Effect<Action>; 4]> {
//!         if matches!(action, Action::GetAppsRequest) {
//!             state.loading = true;
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! impl Reducer for DraftReducer {
//!     type State = DraftSlice;
//!     type Action = Action;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut DraftSlice, action: Action, _env: &()) -> SmallVec<[Effect<Action>; 4]> {
//!         if let Action::UpdateName(name) = action {
//!             state.name = name;
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! let root = combine_reducers(vec![
//!     Box::new(scope_reducer(AppsReducer, |root: &mut Root| &mut root.apps)),
//!     Box::new(scope_reducer(DraftReducer, |root: &mut Root| &mut root.drafts)),
//! ]);
//!
//! let mut state = Root::default();
//! let _ = root.reduce(&mut state, Action::UpdateName("Kaisa".to_string()), &());
//! assert_eq!(state.drafts.name, "Kaisa");
//! assert!(!state.apps.loading);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// A boxed reducer over a shared state, action and environment.
pub type BoxedReducer<S, A, E> = Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Every reducer sees every action, in registration order, and all effects are
/// concatenated in that order. A reducer that does not recognize an action is
/// expected to leave the state alone, so the combined reducer is the identity
/// for actions nobody handles.
///
/// # Type Parameters
///
/// - `S`: The state type
/// - `A`: The action type
/// - `E`: The environment type
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<BoxedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    reducers: Vec<BoxedReducer<S, A, E>>,
}

impl<S, A, E> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    /// Number of reducers in this combination
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Whether no reducers were registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = SmallVec::new();

        for reducer in &self.reducers {
            let effects = reducer.reduce(state, action.clone(), env);
            all_effects.extend(effects);
        }

        all_effects
    }
}

/// Scopes a reducer to one field of a larger state.
///
/// The lens hands out a mutable borrow of the slice, so the slice is updated
/// in place: collections a reducer does not replace keep their identity.
///
/// # Type Parameters
///
/// - `S`: The parent state type
/// - `SubS`: The slice type (a field of `S`)
/// - `A`: The action type
/// - `E`: The environment type
pub const fn scope_reducer<S, SubS, A, E, R>(
    reducer: R,
    lens: fn(&mut S) -> &mut SubS,
) -> ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    ScopedReducer {
        reducer,
        lens,
        _phantom: std::marker::PhantomData,
    }
}

/// A scoped reducer that operates on a slice of state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    reducer: R,
    lens: fn(&mut S) -> &mut SubS,
    _phantom: std::marker::PhantomData<fn() -> (A, E)>,
}

impl<S, SubS, A, E, R> Reducer for ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        self.reducer.reduce((self.lens)(state), action, env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smallvec;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Root {
        feed: FeedSlice,
        draft: DraftSlice,
    }

    #[derive(Clone, Default)]
    struct FeedSlice {
        posts: Arc<Vec<u32>>,
        loading: bool,
    }

    #[derive(Clone, Default)]
    struct DraftSlice {
        name: String,
    }

    #[derive(Clone)]
    enum TestAction {
        FeedRequest,
        SetFeed(Vec<u32>),
        UpdateName(String),
        Unknown,
    }

    struct FeedReducer;

    impl Reducer for FeedReducer {
        type State = FeedSlice;
        type Action = TestAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::FeedRequest => {
                    state.loading = true;
                    smallvec![Effect::None]
                },
                TestAction::SetFeed(posts) => {
                    state.posts = Arc::new(posts);
                    state.loading = false;
                    SmallVec::new()
                },
                TestAction::UpdateName(_) | TestAction::Unknown => SmallVec::new(),
            }
        }
    }

    struct DraftReducer;

    impl Reducer for DraftReducer {
        type State = DraftSlice;
        type Action = TestAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            if let TestAction::UpdateName(name) = action {
                state.name = name;
            }
            SmallVec::new()
        }
    }

    fn root_reducer() -> CombinedReducer<Root, TestAction, ()> {
        combine_reducers(vec![
            Box::new(scope_reducer(FeedReducer, |root: &mut Root| &mut root.feed)),
            Box::new(scope_reducer(DraftReducer, |root: &mut Root| &mut root.draft)),
        ])
    }

    #[test]
    fn combined_reducer_routes_actions_to_slices() {
        let root = root_reducer();
        assert_eq!(root.len(), 2);

        let mut state = Root::default();

        let effects = root.reduce(&mut state, TestAction::FeedRequest, &());
        assert!(state.feed.loading);
        assert_eq!(effects.len(), 1);

        let _ = root.reduce(&mut state, TestAction::UpdateName("Aino".to_string()), &());
        assert_eq!(state.draft.name, "Aino");
        assert!(state.feed.loading);

        let _ = root.reduce(&mut state, TestAction::SetFeed(vec![1, 2]), &());
        assert_eq!(*state.feed.posts, vec![1, 2]);
        assert!(!state.feed.loading);
        assert_eq!(state.draft.name, "Aino");
    }

    #[test]
    fn untouched_slices_keep_collection_identity() {
        let root = root_reducer();
        let mut state = Root::default();
        let _ = root.reduce(&mut state, TestAction::SetFeed(vec![3]), &());
        let before = Arc::clone(&state.feed.posts);

        let _ = root.reduce(&mut state, TestAction::UpdateName("x".to_string()), &());
        let _ = root.reduce(&mut state, TestAction::Unknown, &());

        assert!(Arc::ptr_eq(&before, &state.feed.posts));
    }

    #[test]
    fn empty_combination_is_identity() {
        let root: CombinedReducer<Root, TestAction, ()> = combine_reducers(Vec::new());
        assert!(root.is_empty());

        let mut state = Root::default();
        let effects = root.reduce(&mut state, TestAction::FeedRequest, &());
        assert!(effects.is_empty());
        assert!(!state.feed.loading);
    }
}
