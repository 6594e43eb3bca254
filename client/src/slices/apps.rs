//! Apps slice: the list of third-party apps

use super::{ListAction, ListReducer, ListState, Resource, fetch_list};
use crate::action::{AppAction, GET_APPS, types};
use crate::app::{AppState, AppTask};
use crate::types::{App, LoadingState};
use std::sync::Arc;
use wappu_core::action::RequestTypes;

/// Apps and their fetch lifecycle
pub type AppsState = ListState<App>;

/// Reducer for [`AppsState`]
pub type AppsReducer = ListReducer<App>;

impl Resource for App {
    const RESOURCE: &'static str = "apps";
    const SET_TYPE: &'static str = types::SET_APPS;

    fn request_types() -> &'static RequestTypes {
        &GET_APPS
    }

    fn lift(action: ListAction<Self>) -> AppAction {
        AppAction::Apps(action)
    }

    fn extract(action: AppAction) -> Option<ListAction<Self>> {
        match action {
            AppAction::Apps(action) => Some(action),
            _ => None,
        }
    }
}

/// Fetch the apps list
#[must_use]
pub fn fetch_apps() -> AppTask<AppAction> {
    fetch_list::<App>("fetch_apps")
}

/// All apps
#[must_use]
pub fn get_apps(state: &AppState) -> Arc<Vec<App>> {
    Arc::clone(&state.apps.items)
}

/// Whether the apps list is being fetched
#[must_use]
pub fn is_loading_apps(state: &AppState) -> bool {
    state.apps.list_state == LoadingState::Loading
}
