//! Map slice: the selected marker and city category
//!
//! The derived map projections live in [`crate::views::map_view`].

use crate::action::{AppAction, types};
use crate::app::{AppDispatcher, AppState, AppTask};
use crate::config::HELSINKI;
use crate::environment::AppEnvironment;
use crate::types::{EntityId, FeedPost, Location, Marker};
use serde::Serialize;
use wappu_core::action::ActionRecord;
use wappu_core::command::Task;
use wappu_core::{SmallVec, effect::Effect, reducer::Reducer};

pub use super::event::{toggle_locate_me, update_show_filter};
pub use super::marker::fetch_markers;

/// Anything drawn on the map: a located post or a standalone marker
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MapMarker {
    /// A feed post that carries a location
    Post(FeedPost),
    /// A standalone point of interest
    Marker(Marker),
}

impl MapMarker {
    /// Identifier
    #[must_use]
    pub const fn id(&self) -> &EntityId {
        match self {
            Self::Post(post) => &post.id,
            Self::Marker(marker) => &marker.id,
        }
    }

    /// Position, if known
    #[must_use]
    pub const fn location(&self) -> Option<Location> {
        match self {
            Self::Post(post) => post.location,
            Self::Marker(marker) => marker.location,
        }
    }

    /// Post or marker type
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Post(post) => &post.post_type,
            Self::Marker(marker) => &marker.marker_type,
        }
    }
}

/// Selection state of the map view
#[derive(Debug, Clone, PartialEq)]
pub struct MapState {
    /// Marker whose details are open
    pub selected_marker: Option<MapMarker>,
    /// City category the map is centered on
    pub selected_category: String,
}

impl MapState {
    /// Initial state centered on `category`
    #[must_use]
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            selected_marker: None,
            selected_category: category.into(),
        }
    }
}

impl Default for MapState {
    fn default() -> Self {
        Self::new(HELSINKI)
    }
}

/// Map actions
#[derive(Debug, Clone, PartialEq)]
pub enum MapAction {
    /// `map/SELECT_MARKER`
    SelectMarker(Option<MapMarker>),
    /// `map/SELECT_CATEGORY`, also clears the selected marker
    SelectCategory(String),
}

impl MapAction {
    /// Wire type string
    #[must_use]
    pub const fn action_type(&self) -> &'static str {
        match self {
            Self::SelectMarker(_) => types::SELECT_MARKER,
            Self::SelectCategory(_) => types::SELECT_CATEGORY,
        }
    }

    /// Wire record
    #[must_use]
    pub fn to_record(&self) -> ActionRecord {
        let payload = match self {
            Self::SelectMarker(marker) => serde_json::to_value(marker).unwrap_or_default(),
            Self::SelectCategory(category) => serde_json::Value::from(category.as_str()),
        };
        ActionRecord::new(self.action_type()).with_payload(payload)
    }
}

/// Reducer for [`MapState`]
#[derive(Debug, Clone, Copy, Default)]
pub struct MapReducer;

impl Reducer for MapReducer {
    type State = MapState;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            AppAction::Map(MapAction::SelectMarker(marker)) => state.selected_marker = marker,
            AppAction::Map(MapAction::SelectCategory(category)) => {
                state.selected_category = category;
                state.selected_marker = None;
            },
            _ => {},
        }
        SmallVec::new()
    }
}

/// Open (or with `None`, close) a marker's details
#[must_use]
pub const fn select_marker(marker: Option<MapMarker>) -> AppAction {
    AppAction::Map(MapAction::SelectMarker(marker))
}

/// Switch city category.
///
/// Resolves once the selection is reduced, to the dispatched action.
#[must_use]
pub fn select_category(category: impl Into<String>) -> AppTask<AppAction> {
    let action = AppAction::Map(MapAction::SelectCategory(category.into()));
    Task::new("select_category", move |d: AppDispatcher| async move {
        d.dispatch(action.clone()).await;
        action
    })
}

/// Selected city category
#[must_use]
pub fn get_selected_category(state: &AppState) -> &str {
    &state.map.selected_category
}

/// Selected marker
#[must_use]
pub fn get_selected_marker(state: &AppState) -> Option<&MapMarker> {
    state.map.selected_marker.as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_environment;
    use serde_json::Map;
    use wappu_testing::{ReducerTest, assertions};

    fn marker(id: i64) -> MapMarker {
        MapMarker::Marker(Marker {
            id: EntityId::Number(id),
            marker_type: "bar".to_string(),
            location: Some(Location::new(60.17, 24.94)),
            title: None,
            extra: Map::new(),
        })
    }

    #[test]
    fn initial_category_is_helsinki() {
        let state = MapState::default();
        assert_eq!(state.selected_category, "HELSINKI");
        assert!(state.selected_marker.is_none());
    }

    #[test]
    fn select_marker_sets_selection() {
        ReducerTest::new(MapReducer)
            .with_env(test_environment())
            .given_state(MapState::default())
            .when_action(select_marker(Some(marker(1))))
            .then_state(|state| {
                assert_eq!(state.selected_marker.as_ref().map(MapMarker::id), Some(&EntityId::Number(1)));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn select_category_clears_marker() {
        ReducerTest::new(MapReducer)
            .with_env(test_environment())
            .given_state(MapState::default())
            .when_actions([
                select_marker(Some(marker(1))),
                AppAction::Map(MapAction::SelectCategory("TAMPERE".to_string())),
            ])
            .then_state(|state| {
                assert_eq!(state.selected_category, "TAMPERE");
                assert!(state.selected_marker.is_none());
            })
            .run();
    }

    #[test]
    fn map_marker_accessors() {
        let m = marker(5);
        assert_eq!(m.kind(), "bar");
        assert!(m.location().is_some());
        assert_eq!(
            AppAction::Map(MapAction::SelectCategory("X".to_string())).action_type(),
            "map/SELECT_CATEGORY"
        );
    }
}
