//! Team slice: the teams a user can join

use super::{ListAction, ListReducer, ListState, Resource, fetch_list};
use crate::action::{AppAction, GET_TEAMS, types};
use crate::app::{AppState, AppTask};
use crate::types::{EntityId, Team};
use std::sync::Arc;
use wappu_core::action::RequestTypes;

/// Teams and their fetch lifecycle
pub type TeamState = ListState<Team>;

/// Reducer for [`TeamState`]
pub type TeamReducer = ListReducer<Team>;

impl Resource for Team {
    const RESOURCE: &'static str = "teams";
    const SET_TYPE: &'static str = types::SET_TEAMS;

    fn request_types() -> &'static RequestTypes {
        &GET_TEAMS
    }

    fn lift(action: ListAction<Self>) -> AppAction {
        AppAction::Teams(action)
    }

    fn extract(action: AppAction) -> Option<ListAction<Self>> {
        match action {
            AppAction::Teams(action) => Some(action),
            _ => None,
        }
    }
}

/// Fetch the teams
#[must_use]
pub fn fetch_teams() -> AppTask<AppAction> {
    fetch_list::<Team>("fetch_teams")
}

/// All teams
#[must_use]
pub fn get_teams(state: &AppState) -> Arc<Vec<Team>> {
    Arc::clone(&state.teams.items)
}

/// Look a team up by id
#[must_use]
pub fn find_team<'a>(teams: &'a [Team], id: &EntityId) -> Option<&'a Team> {
    teams.iter().find(|team| &team.id == id)
}
