//! Registration slice: the sign-up draft, the registered user and the token
//!
//! The draft (name, info, team, picture) is edited locally and committed
//! with [`put_user`]. The device uuid comes from the environment.

use super::team::find_team;
use crate::action::{AppAction, CREATE_USER, GET_USER, POST_PROFILE_PICTURE, types};
use crate::app::{AppDispatcher, AppState, AppTask};
use crate::environment::AppEnvironment;
use crate::gateway::PutUserParams;
use crate::types::{EntityId, Team, User};
use serde_json::{Value, json};
use wappu_core::action::ActionRecord;
use wappu_core::command::Task;
use wappu_core::{SmallVec, effect::Effect, reducer::Reducer};

/// Sign-up draft and registered user
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegistrationState {
    /// Whether the registration view is open
    pub is_registration_view_open: bool,
    /// Draft display name
    pub name: String,
    /// Draft description
    pub info: String,
    /// Draft team
    pub selected_team: Option<EntityId>,
    /// Draft avatar URL
    pub profile_picture: String,
    /// Whether a user request is in flight
    pub is_loading: bool,
    /// Whether the last user request failed
    pub is_error: bool,
    /// Whether the introduction was dismissed
    pub is_introduction_dismissed: bool,
    /// Id of the registered user, once known
    pub user_id: Option<EntityId>,
    /// Uuid the user registered with
    pub uuid: Option<String>,
    /// Session token
    pub user_token: Option<Value>,
}

/// Fields replaced together by `UPDATE_PROFILE`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileDraft {
    /// Display name
    pub name: String,
    /// Description
    pub info: String,
    /// Avatar URL
    pub profile_picture: String,
    /// Team
    pub selected_team: Option<EntityId>,
}

/// Registration actions
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)] // Variants are named after their wire types
pub enum RegistrationAction {
    OpenRegistrationView,
    CloseRegistrationView,
    DismissIntroduction,
    UpdateName(String),
    UpdateUserInfo(String),
    UpdateProfile(ProfileDraft),
    SelectTeam(EntityId),
    CloseTeamSelector,
    Reset,
    CreateUserRequest,
    CreateUserSuccess,
    CreateUserFailure(String),
    GetUserRequest,
    GetUserSuccess(User),
    GetUserFailure(String),
    PostProfilePictureRequest,
    PostProfilePictureSuccess,
    PostProfilePictureFailure(String),
    SetToken(Value),
}

impl RegistrationAction {
    /// Wire type string
    #[must_use]
    pub fn action_type(&self) -> &'static str {
        match self {
            Self::OpenRegistrationView => types::OPEN_REGISTRATION_VIEW,
            Self::CloseRegistrationView => types::CLOSE_REGISTRATION_VIEW,
            Self::DismissIntroduction => types::DISMISS_INTRODUCTION,
            Self::UpdateName(_) => types::UPDATE_NAME,
            Self::UpdateUserInfo(_) => types::UPDATE_USER_INFO,
            Self::UpdateProfile(_) => types::UPDATE_PROFILE,
            Self::SelectTeam(_) => types::SELECT_TEAM,
            Self::CloseTeamSelector => types::CLOSE_TEAM_SELECTOR,
            Self::Reset => types::RESET,
            Self::CreateUserRequest => &CREATE_USER.request,
            Self::CreateUserSuccess => &CREATE_USER.success,
            Self::CreateUserFailure(_) => &CREATE_USER.failure,
            Self::GetUserRequest => &GET_USER.request,
            Self::GetUserSuccess(_) => &GET_USER.success,
            Self::GetUserFailure(_) => &GET_USER.failure,
            Self::PostProfilePictureRequest => &POST_PROFILE_PICTURE.request,
            Self::PostProfilePictureSuccess => &POST_PROFILE_PICTURE.success,
            Self::PostProfilePictureFailure(_) => &POST_PROFILE_PICTURE.failure,
            Self::SetToken(_) => types::SET_TOKEN,
        }
    }

    /// Wire record
    #[must_use]
    pub fn to_record(&self) -> ActionRecord {
        let record = ActionRecord::new(self.action_type());
        match self {
            Self::CreateUserFailure(error)
            | Self::GetUserFailure(error)
            | Self::PostProfilePictureFailure(error) => {
                ActionRecord::failure(self.action_type(), error.clone())
            },
            Self::UpdateName(text) | Self::UpdateUserInfo(text) => record.with_payload(json!(text)),
            Self::UpdateProfile(draft) => record.with_payload(json!({
                "name": draft.name,
                "info": draft.info,
                "profilePicture": draft.profile_picture,
                "selectedTeam": draft.selected_team,
            })),
            Self::SelectTeam(id) => record.with_payload(json!(id)),
            Self::GetUserSuccess(user) => {
                record.with_payload(serde_json::to_value(user).unwrap_or_default())
            },
            Self::SetToken(token) => record.with_payload(token.clone()),
            _ => record,
        }
    }
}

/// Reducer for [`RegistrationState`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistrationReducer;

impl Reducer for RegistrationReducer {
    type State = RegistrationState;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        if let AppAction::Registration(action) = action {
            reduce_registration(state, action);
        }
        SmallVec::new()
    }
}

fn reduce_registration(state: &mut RegistrationState, action: RegistrationAction) {
    match action {
        RegistrationAction::OpenRegistrationView => state.is_registration_view_open = true,
        RegistrationAction::CloseRegistrationView => {
            state.is_registration_view_open = false;
            state.is_introduction_dismissed = false;
        },
        RegistrationAction::DismissIntroduction => state.is_introduction_dismissed = true,
        RegistrationAction::UpdateName(name) => state.name = name,
        RegistrationAction::UpdateUserInfo(info) => state.info = info,
        RegistrationAction::UpdateProfile(draft) => {
            state.name = draft.name;
            state.info = draft.info;
            state.profile_picture = draft.profile_picture;
            state.selected_team = draft.selected_team;
        },
        RegistrationAction::SelectTeam(team) => state.selected_team = Some(team),
        RegistrationAction::Reset => {
            state.name = String::new();
            state.selected_team = None;
        },
        RegistrationAction::CreateUserRequest => {
            state.is_loading = true;
            state.is_error = false;
        },
        RegistrationAction::GetUserRequest => state.is_loading = true,
        RegistrationAction::CreateUserSuccess => {
            state.is_loading = false;
            state.is_error = false;
        },
        RegistrationAction::CreateUserFailure(_) | RegistrationAction::GetUserFailure(_) => {
            state.is_loading = false;
            state.is_error = true;
        },
        RegistrationAction::GetUserSuccess(user) => {
            state.user_id = Some(user.id);
            state.name = user.name;
            state.info = user.info;
            state.selected_team = user.team;
            state.uuid = user.uuid;
            state.profile_picture = user.profile_picture.unwrap_or_default();
            state.is_loading = false;
        },
        RegistrationAction::SetToken(token) => state.user_token = Some(token),
        RegistrationAction::CloseTeamSelector
        | RegistrationAction::PostProfilePictureRequest
        | RegistrationAction::PostProfilePictureSuccess
        | RegistrationAction::PostProfilePictureFailure(_) => {},
    }
}

fn registration(action: RegistrationAction) -> AppAction {
    AppAction::Registration(action)
}

/// Open the registration view
#[must_use]
pub fn open_registration_view() -> AppAction {
    registration(RegistrationAction::OpenRegistrationView)
}

/// Close the registration view
#[must_use]
pub fn close_registration_view() -> AppAction {
    registration(RegistrationAction::CloseRegistrationView)
}

/// Dismiss the introduction
#[must_use]
pub fn dismiss_introduction() -> AppAction {
    registration(RegistrationAction::DismissIntroduction)
}

/// Set the draft name
#[must_use]
pub fn update_name(name: impl Into<String>) -> AppAction {
    registration(RegistrationAction::UpdateName(name.into()))
}

/// Set the draft description
#[must_use]
pub fn update_user_info(info: impl Into<String>) -> AppAction {
    registration(RegistrationAction::UpdateUserInfo(info.into()))
}

/// Replace name, description, picture and team at once
#[must_use]
pub fn update_profile(draft: ProfileDraft) -> AppAction {
    registration(RegistrationAction::UpdateProfile(draft))
}

/// Close the team selector
#[must_use]
pub fn close_team_selector() -> AppAction {
    registration(RegistrationAction::CloseTeamSelector)
}

/// Clear the draft name and team
#[must_use]
pub fn reset() -> AppAction {
    registration(RegistrationAction::Reset)
}

/// Store the session token
#[must_use]
pub fn set_token(token: Value) -> AppAction {
    registration(RegistrationAction::SetToken(token))
}

/// Commit the draft.
///
/// Success closes the registration view. Resolves to the last action
/// dispatched.
#[must_use]
pub fn put_user() -> AppTask<AppAction> {
    Task::new("put_user", |d: AppDispatcher| async move {
        d.dispatch(registration(RegistrationAction::CreateUserRequest)).await;

        let draft = d.get_state().await.registration;
        let params = PutUserParams {
            uuid: d.environment().device_id.clone(),
            name: draft.name,
            info: Some(draft.info),
            team: draft.selected_team,
            profile_picture: (!draft.profile_picture.is_empty()).then_some(draft.profile_picture),
            image_data: None,
        };

        match d.environment().gateway.put_user(params).await {
            Ok(_) => {
                d.dispatch(registration(RegistrationAction::CreateUserSuccess)).await;
                let close = close_registration_view();
                d.dispatch(close.clone()).await;
                close
            },
            Err(error) => {
                tracing::warn!(%error, "Registration failed");
                let failure = registration(RegistrationAction::CreateUserFailure(error.to_string()));
                d.dispatch(failure.clone()).await;
                failure
            },
        }
    })
}

/// Pick a team.
///
/// Closes the selector and selects the team. When the draft has no name
/// yet, one is generated from the team's name.
#[must_use]
pub fn select_team(team_id: EntityId) -> AppTask {
    Task::new("select_team", move |d: AppDispatcher| async move {
        let state = d.get_state().await;

        d.dispatch(close_team_selector()).await;
        d.dispatch(registration(RegistrationAction::SelectTeam(team_id.clone())))
            .await;

        if state.registration.name.is_empty() {
            let team_name = find_team(&state.teams.items, &team_id).map(|team| team.name.as_str());
            let name = d.environment().names.generate(team_name);
            d.dispatch(update_name(name)).await;
        }
    })
}

/// Generate a name from the selected team.
///
/// Resolves to `None` without dispatching when no known team is selected.
#[must_use]
pub fn generate_name() -> AppTask<Option<AppAction>> {
    Task::new("generate_name", |d: AppDispatcher| async move {
        let state = d.get_state().await;
        let team_id = state.registration.selected_team.as_ref()?;
        let team = find_team(&state.teams.items, team_id)?;

        let action = update_name(d.environment().names.generate(Some(&team.name)));
        d.dispatch(action.clone()).await;
        Some(action)
    })
}

/// Load the user registered with this device.
///
/// Resolves to the last action dispatched.
#[must_use]
pub fn get_user() -> AppTask<AppAction> {
    Task::new("get_user", |d: AppDispatcher| async move {
        d.dispatch(registration(RegistrationAction::GetUserRequest)).await;

        let uuid = d.environment().device_id.clone();
        let last = match d.environment().gateway.get_user(uuid).await {
            Ok(user) => registration(RegistrationAction::GetUserSuccess(user)),
            Err(error) => {
                tracing::warn!(%error, "User lookup failed");
                registration(RegistrationAction::GetUserFailure(error.to_string()))
            },
        };
        d.dispatch(last.clone()).await;
        last
    })
}

/// Upload a new avatar.
///
/// `POST_PROFILE_PICTURE_SUCCESS` is dispatched only after the user has been
/// reloaded. Resolves to the last action dispatched.
#[must_use]
pub fn post_profile_picture(image_data: String) -> AppTask<AppAction> {
    Task::new("post_profile_picture", move |d: AppDispatcher| async move {
        d.dispatch(registration(RegistrationAction::PostProfilePictureRequest))
            .await;

        let draft = d.get_state().await.registration;
        let params = PutUserParams {
            uuid: d.environment().device_id.clone(),
            name: draft.name,
            info: None,
            team: draft.selected_team,
            profile_picture: None,
            image_data: Some(image_data),
        };

        let last = match d.environment().gateway.put_user(params).await {
            Ok(_) => {
                d.run(get_user()).await;
                registration(RegistrationAction::PostProfilePictureSuccess)
            },
            Err(error) => {
                tracing::warn!(%error, "Profile picture upload failed");
                registration(RegistrationAction::PostProfilePictureFailure(error.to_string()))
            },
        };
        d.dispatch(last.clone()).await;
        last
    })
}

/// Id of the registered user
#[must_use]
pub fn get_user_id(state: &AppState) -> Option<&EntityId> {
    state.registration.user_id.as_ref()
}

/// Draft name
#[must_use]
pub fn get_user_name(state: &AppState) -> &str {
    &state.registration.name
}

/// Draft description
#[must_use]
pub fn get_user_info(state: &AppState) -> &str {
    &state.registration.info
}

/// Selected team id
#[must_use]
pub fn get_user_team_id(state: &AppState) -> Option<&EntityId> {
    state.registration.selected_team.as_ref()
}

/// Session token
#[must_use]
pub fn get_token(state: &AppState) -> Option<&Value> {
    state.registration.user_token.as_ref()
}

/// The selected team, looked up in the team list
#[must_use]
pub fn get_user_team(state: &AppState) -> Option<&Team> {
    find_team(&state.teams.items, state.registration.selected_team.as_ref()?)
}

/// Whether a non-empty session token is present
#[must_use]
pub fn is_user_logged_in(state: &AppState) -> bool {
    match &state.registration.user_token {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Bool(_) | Value::Number(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::app::test_environment;
    use crate::slices::ListAction;
    use serde_json::Map;
    use std::sync::Arc;
    use wappu_testing::{ReducerTest, assertions};

    fn user() -> User {
        serde_json::from_value(json!({
            "id": 42,
            "uuid": "device-1",
            "name": "Hilpeä Teekkari",
            "info": "Wappu!",
            "team": 3,
            "profilePicture": "pic.png"
        }))
        .unwrap()
    }

    #[test]
    fn initial_state() {
        let state = RegistrationState::default();
        assert!(!state.is_registration_view_open);
        assert_eq!(state.name, "");
        assert_eq!(state.selected_team, None);
        assert!(!state.is_loading && !state.is_error && !state.is_introduction_dismissed);
        assert_eq!(state.user_token, None);
    }

    #[test]
    fn close_view_resets_introduction() {
        ReducerTest::new(RegistrationReducer)
            .with_env(test_environment())
            .given_state(RegistrationState::default())
            .when_actions([open_registration_view(), dismiss_introduction(), close_registration_view()])
            .then_state(|state| {
                assert!(!state.is_registration_view_open);
                assert!(!state.is_introduction_dismissed);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn draft_edits() {
        ReducerTest::new(RegistrationReducer)
            .with_env(test_environment())
            .given_state(RegistrationState::default())
            .when_actions([
                update_name("Teemu"),
                update_user_info("Sima"),
                registration(RegistrationAction::SelectTeam(EntityId::Number(2))),
            ])
            .then_state(|state| {
                assert_eq!(state.name, "Teemu");
                assert_eq!(state.info, "Sima");
                assert_eq!(state.selected_team, Some(EntityId::Number(2)));
            })
            .run();

        ReducerTest::new(RegistrationReducer)
            .with_env(test_environment())
            .given_state(RegistrationState::default())
            .when_actions([
                update_profile(ProfileDraft {
                    name: "A".to_string(),
                    info: "B".to_string(),
                    profile_picture: "c.png".to_string(),
                    selected_team: Some(EntityId::Number(1)),
                }),
                reset(),
            ])
            .then_state(|state| {
                assert_eq!(state.name, "");
                assert_eq!(state.selected_team, None);
                assert_eq!(state.info, "B");
                assert_eq!(state.profile_picture, "c.png");
            })
            .run();
    }

    #[test]
    fn create_user_lifecycle() {
        ReducerTest::new(RegistrationReducer)
            .with_env(test_environment())
            .given_state(RegistrationState::default())
            .when_actions([
                registration(RegistrationAction::CreateUserRequest),
                registration(RegistrationAction::CreateUserFailure("409".to_string())),
            ])
            .then_state(|state| {
                assert!(!state.is_loading);
                assert!(state.is_error);
            })
            .run();

        ReducerTest::new(RegistrationReducer)
            .with_env(test_environment())
            .given_state(RegistrationState {
                is_error: true,
                ..RegistrationState::default()
            })
            .when_actions([
                registration(RegistrationAction::CreateUserRequest),
                registration(RegistrationAction::CreateUserSuccess),
            ])
            .then_state(|state| assert!(!state.is_loading && !state.is_error))
            .run();
    }

    #[test]
    fn get_user_success_fills_draft() {
        ReducerTest::new(RegistrationReducer)
            .with_env(test_environment())
            .given_state(RegistrationState::default())
            .when_actions([
                registration(RegistrationAction::GetUserRequest),
                registration(RegistrationAction::GetUserSuccess(user())),
            ])
            .then_state(|state| {
                assert_eq!(state.user_id, Some(EntityId::Number(42)));
                assert_eq!(state.name, "Hilpeä Teekkari");
                assert_eq!(state.info, "Wappu!");
                assert_eq!(state.selected_team, Some(EntityId::Number(3)));
                assert_eq!(state.uuid.as_deref(), Some("device-1"));
                assert_eq!(state.profile_picture, "pic.png");
                assert!(!state.is_loading);
            })
            .run();
    }

    #[test]
    fn profile_picture_actions_do_not_touch_state() {
        let expected = RegistrationState::default();
        ReducerTest::new(RegistrationReducer)
            .with_env(test_environment())
            .given_state(RegistrationState::default())
            .when_actions([
                registration(RegistrationAction::PostProfilePictureRequest),
                registration(RegistrationAction::PostProfilePictureFailure("413".to_string())),
            ])
            .then_state(move |state| assert_eq!(*state, expected))
            .run();
    }

    #[test]
    fn login_requires_non_empty_token() {
        let mut state = AppState::default();
        assert!(!is_user_logged_in(&state));

        state.registration.user_token = Some(json!({}));
        assert!(!is_user_logged_in(&state));
        state.registration.user_token = Some(json!(""));
        assert!(!is_user_logged_in(&state));
        state.registration.user_token = Some(json!({ "token": "abc" }));
        assert!(is_user_logged_in(&state));
        assert_eq!(get_token(&state), Some(&json!({ "token": "abc" })));
    }

    #[test]
    fn user_team_joins_team_list() {
        let mut state = AppState::default();
        state.teams.apply(ListAction::Set(Arc::new(vec![Team {
            id: EntityId::Number(3),
            name: "Tietokilta".to_string(),
            extra: Map::new(),
        }])));
        assert!(get_user_team(&state).is_none());

        state.registration.selected_team = Some(EntityId::Number(3));
        assert_eq!(get_user_team(&state).map(|t| t.name.as_str()), Some("Tietokilta"));
        assert_eq!(get_user_team_id(&state), Some(&EntityId::Number(3)));
        assert_eq!(get_user_name(&state), "");
        assert_eq!(get_user_info(&state), "");
        assert!(get_user_id(&state).is_none());
    }

    #[test]
    fn failure_records_are_errors() {
        let record = registration(RegistrationAction::GetUserFailure("404".to_string())).to_record();
        assert_eq!(record.action_type, "GET_USER_FAILURE");
        assert!(record.error);

        let record = update_name("X").to_record();
        assert_eq!(record.payload, Some(json!("X")));
    }
}
