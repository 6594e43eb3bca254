//! Property tests: slice isolation and the distance boundary

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

mod common;

use common::from_json;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;
use wappu_client::app::{AppState, app_reducer};
use wappu_client::config::{HELSINKI, MapConfig};
use wappu_client::environment::AppEnvironment;
use wappu_client::gateway::MockGateway;
use wappu_client::slices::ListAction;
use wappu_client::slices::event::{ShowFilter, toggle_locate_me, update_show_filter};
use wappu_client::slices::map::{MapAction, MapMarker};
use wappu_client::slices::registration::{dismiss_introduction, update_name, update_user_info};
use wappu_client::slices::user::close_user_view;
use wappu_client::types::{EntityId, Location, Marker};
use wappu_client::views::map_view::{get_map_markers, haversine_distance};
use wappu_client::AppAction;
use wappu_core::reducer::Reducer;
use wappu_testing::test_clock;

#[derive(Debug, Clone, Copy)]
enum Slice {
    Apps,
    Markers,
    Map,
    Events,
    User,
    Registration,
}

fn env() -> AppEnvironment {
    AppEnvironment::new(
        Arc::new(MockGateway::new()),
        Arc::new(test_clock()),
        "device-1",
        MapConfig::default(),
    )
}

fn populated() -> AppState {
    let mut state = AppState::default();
    state.apps.items = Arc::new(from_json(json!([{ "id": 1, "name": "Vask" }])));
    state.markers.items = Arc::new(from_json(json!([{ "id": 2, "type": "bar" }])));
    state.feed.items = Arc::new(from_json(json!([{ "id": "p1", "type": "IMAGE", "votes": 2 }])));
    state.teams.items = Arc::new(from_json(json!([{ "id": 3, "name": "Tietokilta" }])));
    state.user.profile.name = Some("Maija".to_string());
    state.registration.name = "Teemu".to_string();
    state
}

fn sliced_action() -> impl Strategy<Value = (Slice, AppAction)> {
    prop_oneof![
        Just((Slice::Apps, AppAction::Apps(ListAction::Request))),
        "[a-z ]{0,12}".prop_map(|m| (Slice::Apps, AppAction::Apps(ListAction::Failure(m)))),
        Just((Slice::Markers, AppAction::Markers(ListAction::Success))),
        "[A-Z]{1,10}".prop_map(|c| (Slice::Map, AppAction::Map(MapAction::SelectCategory(c)))),
        Just((Slice::Events, toggle_locate_me())),
        any::<bool>().prop_map(|all| {
            let filter = if all { ShowFilter::All } else { ShowFilter::Next24H };
            (Slice::Events, update_show_filter(filter))
        }),
        Just((Slice::User, close_user_view())),
        ".{0,16}".prop_map(|n| (Slice::Registration, update_name(n))),
        ".{0,16}".prop_map(|i| (Slice::Registration, update_user_info(i))),
        Just((Slice::Registration, dismiss_introduction())),
    ]
}

fn restore(slice: Slice, state: &mut AppState, before: &AppState) {
    match slice {
        Slice::Apps => state.apps = before.apps.clone(),
        Slice::Markers => state.markers = before.markers.clone(),
        Slice::Map => state.map = before.map.clone(),
        Slice::Events => state.events = before.events.clone(),
        Slice::User => state.user = before.user.clone(),
        Slice::Registration => state.registration = before.registration.clone(),
    }
}

proptest! {
    #[test]
    fn actions_leave_other_slices_untouched((slice, action) in sliced_action()) {
        let reducer = app_reducer();
        let env = env();
        let before = populated();
        let mut state = before.clone();

        let effects = reducer.reduce(&mut state, action, &env);
        prop_assert!(effects.is_empty());

        prop_assert!(Arc::ptr_eq(&state.feed.items, &before.feed.items));
        prop_assert!(Arc::ptr_eq(&state.teams.items, &before.teams.items));
        restore(slice, &mut state, &before);
        prop_assert_eq!(state, before);
    }

    #[test]
    fn distance_limit_is_inclusive(lat in 59.0f64..62.0, lng in 21.0f64..28.0) {
        let center = MapConfig::default().center(HELSINKI).unwrap();
        let point = Location::new(lat, lng);
        let distance = haversine_distance(center, point);
        prop_assume!(distance > 1.0);

        let markers = vec![MapMarker::Marker(Marker {
            id: EntityId::Number(1),
            marker_type: "bar".to_string(),
            location: Some(point),
            title: None,
            extra: serde_json::Map::new(),
        })];

        prop_assert_eq!(get_map_markers(&markers, Some(center), distance).len(), 1);
        prop_assert!(get_map_markers(&markers, Some(center), distance - 0.5).is_empty());
    }

    #[test]
    fn haversine_is_symmetric(a_lat in -80.0f64..80.0, a_lng in -170.0f64..170.0, b_lat in -80.0f64..80.0, b_lng in -170.0f64..170.0) {
        let a = Location::new(a_lat, a_lng);
        let b = Location::new(b_lat, b_lng);
        prop_assert!((haversine_distance(a, b) - haversine_distance(b, a)).abs() < 1e-6);
        prop_assert!(haversine_distance(a, b) >= 0.0);
    }
}
