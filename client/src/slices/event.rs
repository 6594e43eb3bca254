//! Event slice: scheduled events and the map's event filters

use super::{ListAction, ListState, Resource, fetch_list};
use crate::action::{AppAction, GET_EVENT_LIST, types};
use crate::app::{AppState, AppTask};
use crate::environment::AppEnvironment;
use crate::types::{Event, LoadingState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wappu_core::action::{ActionRecord, RequestTypes};
use wappu_core::{SmallVec, effect::Effect, reducer::Reducer};

/// Which events the map shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShowFilter {
    /// Every event
    #[default]
    #[serde(rename = "ALL")]
    All,
    /// Events in the next 24 hours
    #[serde(rename = "24H")]
    Next24H,
}

/// Events, their fetch lifecycle and the map filters
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventState {
    /// Events and fetch lifecycle
    pub list: ListState<Event>,
    /// Active time filter
    pub show_filter: ShowFilter,
    /// Whether the map follows the device location
    pub is_locating: bool,
}

/// Event actions
#[derive(Debug, Clone, PartialEq)]
pub enum EventAction {
    /// Event fetch protocol
    List(ListAction<Event>),
    /// `UPDATE_SHOW_FILTER`
    UpdateShowFilter(ShowFilter),
    /// `TOGGLE_LOCATE_ME`
    ToggleLocateMe,
}

impl EventAction {
    /// Wire type string
    #[must_use]
    pub fn action_type(&self) -> &'static str {
        match self {
            Self::List(action) => action.action_type(),
            Self::UpdateShowFilter(_) => types::UPDATE_SHOW_FILTER,
            Self::ToggleLocateMe => types::TOGGLE_LOCATE_ME,
        }
    }

    /// Wire record
    #[must_use]
    pub fn to_record(&self) -> ActionRecord {
        match self {
            Self::List(action) => action.to_record(),
            Self::UpdateShowFilter(filter) => ActionRecord::new(self.action_type())
                .with_payload(serde_json::to_value(filter).unwrap_or_default()),
            Self::ToggleLocateMe => ActionRecord::new(self.action_type()),
        }
    }
}

impl Resource for Event {
    const RESOURCE: &'static str = "events";
    const SET_TYPE: &'static str = types::SET_EVENT_LIST;

    fn request_types() -> &'static RequestTypes {
        &GET_EVENT_LIST
    }

    fn lift(action: ListAction<Self>) -> AppAction {
        AppAction::Events(EventAction::List(action))
    }

    fn extract(action: AppAction) -> Option<ListAction<Self>> {
        match action {
            AppAction::Events(EventAction::List(action)) => Some(action),
            _ => None,
        }
    }
}

/// Reducer for [`EventState`]
#[derive(Debug, Clone, Copy, Default)]
pub struct EventReducer;

impl Reducer for EventReducer {
    type State = EventState;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        if let AppAction::Events(action) = action {
            match action {
                EventAction::List(action) => state.list.apply(action),
                EventAction::UpdateShowFilter(filter) => state.show_filter = filter,
                EventAction::ToggleLocateMe => state.is_locating = !state.is_locating,
            }
        }
        SmallVec::new()
    }
}

/// Fetch the events
#[must_use]
pub fn fetch_events() -> AppTask<AppAction> {
    fetch_list::<Event>("fetch_events")
}

/// Change the time filter
#[must_use]
pub const fn update_show_filter(filter: ShowFilter) -> AppAction {
    AppAction::Events(EventAction::UpdateShowFilter(filter))
}

/// Flip location following on or off
#[must_use]
pub const fn toggle_locate_me() -> AppAction {
    AppAction::Events(EventAction::ToggleLocateMe)
}

/// All events
#[must_use]
pub fn get_events(state: &AppState) -> Arc<Vec<Event>> {
    Arc::clone(&state.events.list.items)
}

/// Lifecycle of the event fetch
#[must_use]
pub fn get_event_list_state(state: &AppState) -> LoadingState {
    state.events.list.list_state
}

/// Active time filter
#[must_use]
pub fn get_show_filter(state: &AppState) -> ShowFilter {
    state.events.show_filter
}

/// Whether the map follows the device location
#[must_use]
pub fn is_locating(state: &AppState) -> bool {
    state.events.is_locating
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::app::test_environment;
    use serde_json::json;
    use wappu_testing::ReducerTest;

    #[test]
    fn toggle_locate_me_flips() {
        ReducerTest::new(EventReducer)
            .with_env(test_environment())
            .given_state(EventState::default())
            .when_action(toggle_locate_me())
            .then_state(|state| assert!(state.is_locating))
            .run();

        ReducerTest::new(EventReducer)
            .with_env(test_environment())
            .given_state(EventState::default())
            .when_actions([toggle_locate_me(), toggle_locate_me()])
            .then_state(|state| assert!(!state.is_locating))
            .run();
    }

    #[test]
    fn show_filter_is_updated() {
        ReducerTest::new(EventReducer)
            .with_env(test_environment())
            .given_state(EventState::default())
            .when_action(update_show_filter(ShowFilter::Next24H))
            .then_state(|state| assert_eq!(state.show_filter, ShowFilter::Next24H))
            .run();
    }

    #[test]
    fn event_list_protocol() {
        ReducerTest::new(EventReducer)
            .with_env(test_environment())
            .given_state(EventState::default())
            .when_action(AppAction::Events(EventAction::List(ListAction::Request)))
            .then_state(|state| {
                assert_eq!(state.list.list_state, LoadingState::Loading);
                assert_eq!(state.show_filter, ShowFilter::All);
            })
            .run();
    }

    #[test]
    fn filter_record_uses_wire_names() {
        let record = update_show_filter(ShowFilter::Next24H).to_record();
        assert_eq!(record.action_type, "UPDATE_SHOW_FILTER");
        assert_eq!(record.payload, Some(json!("24H")));
        assert_eq!(serde_json::from_value::<ShowFilter>(json!("ALL")).unwrap(), ShowFilter::All);
    }
}
