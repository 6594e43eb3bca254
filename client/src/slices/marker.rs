//! Marker slice: standalone points of interest on the map

use super::{ListAction, ListReducer, ListState, Resource, fetch_list};
use crate::action::{AppAction, GET_MARKER_LIST, types};
use crate::app::{AppState, AppTask};
use crate::types::{LoadingState, Marker};
use std::sync::Arc;
use wappu_core::action::RequestTypes;

/// Markers and their fetch lifecycle
pub type MarkerState = ListState<Marker>;

/// Reducer for [`MarkerState`]
pub type MarkerReducer = ListReducer<Marker>;

impl Resource for Marker {
    const RESOURCE: &'static str = "markers";
    const SET_TYPE: &'static str = types::SET_MARKER_LIST;

    fn request_types() -> &'static RequestTypes {
        &GET_MARKER_LIST
    }

    fn lift(action: ListAction<Self>) -> AppAction {
        AppAction::Markers(action)
    }

    fn extract(action: AppAction) -> Option<ListAction<Self>> {
        match action {
            AppAction::Markers(action) => Some(action),
            _ => None,
        }
    }
}

/// Fetch the standalone markers
#[must_use]
pub fn fetch_markers() -> AppTask<AppAction> {
    fetch_list::<Marker>("fetch_markers")
}

/// Standalone markers (posts not included)
#[must_use]
pub fn get_markers(state: &AppState) -> Arc<Vec<Marker>> {
    Arc::clone(&state.markers.items)
}

/// Lifecycle of the marker fetch
#[must_use]
pub fn get_marker_list_state(state: &AppState) -> LoadingState {
    state.markers.list_state
}
