//! Map projections: markers, distance filtering, categories and the next event
//!
//! The free functions are the plain selectors. [`MapViewSelector`] memoizes
//! each of them and assembles a [`MapView`]; feeding it an unchanged state
//! returns the very same `Arc`.

use super::memo::{ByAddress, Memo};
use crate::app::AppState;
use crate::config::MapConfig;
use crate::slices::event::ShowFilter;
use crate::slices::map::MapMarker;
use crate::types::{Event, FeedPost, Location, Marker};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two points, in meters.
#[must_use]
pub fn haversine_distance(a: Location, b: Location) -> f64 {
    let (lat_a, lat_b) = (a.lat.to_radians(), b.lat.to_radians());
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Everything that can go on the map: located posts first, then the
/// standalone markers.
#[must_use]
pub fn get_markers(posts: &[FeedPost], markers: &[Marker]) -> Vec<MapMarker> {
    posts
        .iter()
        .filter(|post| post.location.is_some())
        .cloned()
        .map(MapMarker::Post)
        .chain(markers.iter().cloned().map(MapMarker::Marker))
        .collect()
}

/// Markers within `max_distance` meters (inclusive) of `center`.
///
/// Markers without a location are left out. No center (an unknown city
/// category) means nothing is shown.
#[must_use]
pub fn get_map_markers(markers: &[MapMarker], center: Option<Location>, max_distance: f64) -> Vec<MapMarker> {
    let Some(center) = center else {
        return Vec::new();
    };

    markers
        .iter()
        .filter(|marker| {
            marker
                .location()
                .is_some_and(|location| haversine_distance(center, location) <= max_distance)
        })
        .cloned()
        .collect()
}

/// Coordinates of the given markers, in order
#[must_use]
pub fn get_map_marker_coords(markers: &[MapMarker]) -> Vec<Location> {
    markers.iter().filter_map(MapMarker::location).collect()
}

/// The event that ends soonest among those not yet over.
#[must_use]
pub fn get_first_future_event(events: &[Event], now: DateTime<Utc>) -> Option<Event> {
    events
        .iter()
        .filter(|event| event.end_time.is_some_and(|end| end > now))
        .min_by_key(|event| event.end_time)
        .cloned()
}

/// Distinct standalone marker types, uppercased and sorted.
///
/// A marker without a type contributes the empty category.
#[must_use]
pub fn get_marker_categories(markers: &[Marker]) -> Vec<String> {
    markers
        .iter()
        .map(|marker| marker.marker_type.to_uppercase())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Whether markers or events are being fetched
#[must_use]
pub fn is_map_loading(state: &AppState) -> bool {
    state.markers.list_state.is_loading() || state.events.list.list_state.is_loading()
}

/// Everything the map screen renders
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    /// Whether the map follows the device location
    pub locate_me: bool,
    /// Active event filter
    pub show_filter: ShowFilter,
    /// All events
    pub events: Arc<Vec<Event>>,
    /// All markers, see [`get_markers`]
    pub markers: Arc<Vec<MapMarker>>,
    /// See [`is_map_loading`]
    pub loading: bool,
    /// Markers near the selected city
    pub map_markers: Arc<Vec<MapMarker>>,
    /// Next event to end
    pub first_future_event: Option<Event>,
    /// Marker whose details are open
    pub selected_marker: Option<MapMarker>,
    /// Selected city category
    pub selected_category: String,
    /// Marker categories for the filter bar
    pub categories: Arc<Vec<String>>,
    /// Coordinates of `map_markers`
    pub visible_marker_coords: Arc<Vec<Location>>,
}

#[derive(PartialEq)]
struct ViewKey {
    locate_me: bool,
    show_filter: ShowFilter,
    events: ByAddress<Vec<Event>>,
    markers: ByAddress<Vec<MapMarker>>,
    loading: bool,
    map_markers: ByAddress<Vec<MapMarker>>,
    first_future_event: ByAddress<Option<Event>>,
    selected_marker: Option<MapMarker>,
    selected_category: String,
    categories: ByAddress<Vec<String>>,
    visible_marker_coords: ByAddress<Vec<Location>>,
}

struct FutureEventCache {
    events: ByAddress<Vec<Event>>,
    computed_at: DateTime<Utc>,
    result: Arc<Option<Event>>,
}

impl FutureEventCache {
    /// The answer only changes when the list changes, time runs backwards
    /// or the cached event ends.
    fn is_valid(&self, events: &ByAddress<Vec<Event>>, now: DateTime<Utc>) -> bool {
        if self.events != *events || now < self.computed_at {
            return false;
        }
        match self.result.as_ref() {
            Some(event) => event.end_time.is_some_and(|end| end > now),
            None => true,
        }
    }
}

/// Memoized map selectors over one store's state.
///
/// Keep one per consumer and call [`MapViewSelector::select`] whenever the
/// state may have changed.
pub struct MapViewSelector {
    config: MapConfig,
    markers: Memo<(ByAddress<Vec<FeedPost>>, ByAddress<Vec<Marker>>), Vec<MapMarker>>,
    map_markers: Memo<(ByAddress<Vec<MapMarker>>, String), Vec<MapMarker>>,
    coords: Memo<ByAddress<Vec<MapMarker>>, Vec<Location>>,
    categories: Memo<ByAddress<Vec<Marker>>, Vec<String>>,
    first_future_event: Option<FutureEventCache>,
    view: Memo<ViewKey, MapView>,
}

impl MapViewSelector {
    /// Selector using the given city centers and distance limit
    #[must_use]
    pub const fn new(config: MapConfig) -> Self {
        Self {
            config,
            markers: Memo::new(),
            map_markers: Memo::new(),
            coords: Memo::new(),
            categories: Memo::new(),
            first_future_event: None,
            view: Memo::new(),
        }
    }

    /// Located posts and standalone markers
    pub fn markers(&mut self, state: &AppState) -> Arc<Vec<MapMarker>> {
        self.markers.get_or_compute(
            (ByAddress::from(&state.feed.items), ByAddress::from(&state.markers.items)),
            |(posts, markers)| get_markers(posts.get(), markers.get()),
        )
    }

    /// Markers near the selected city category
    pub fn map_markers(&mut self, state: &AppState) -> Arc<Vec<MapMarker>> {
        let markers = self.markers(state);
        let config = &self.config;
        self.map_markers.get_or_compute(
            (ByAddress(markers), state.map.selected_category.clone()),
            |(markers, category)| {
                get_map_markers(markers.get(), config.center(category), config.max_distance_meters)
            },
        )
    }

    /// Coordinates of the markers near the selected city
    pub fn visible_marker_coords(&mut self, state: &AppState) -> Arc<Vec<Location>> {
        let visible = self.map_markers(state);
        self.coords
            .get_or_compute(ByAddress(visible), |markers| get_map_marker_coords(markers.get()))
    }

    /// Marker categories
    pub fn categories(&mut self, state: &AppState) -> Arc<Vec<String>> {
        self.categories
            .get_or_compute(ByAddress::from(&state.markers.items), |markers| {
                get_marker_categories(markers.get())
            })
    }

    /// Next event to end after `now`
    pub fn first_future_event(&mut self, state: &AppState, now: DateTime<Utc>) -> Arc<Option<Event>> {
        let events = ByAddress::from(&state.events.list.items);
        if let Some(cache) = &self.first_future_event {
            if cache.is_valid(&events, now) {
                return Arc::clone(&cache.result);
            }
        }

        let result = Arc::new(get_first_future_event(events.get(), now));
        self.first_future_event = Some(FutureEventCache {
            events,
            computed_at: now,
            result: Arc::clone(&result),
        });
        result
    }

    /// The whole map projection.
    ///
    /// Returns the previous `Arc` when nothing the view depends on changed.
    pub fn select(&mut self, state: &AppState, now: DateTime<Utc>) -> Arc<MapView> {
        let key = ViewKey {
            locate_me: state.events.is_locating,
            show_filter: state.events.show_filter,
            events: ByAddress::from(&state.events.list.items),
            markers: ByAddress(self.markers(state)),
            loading: is_map_loading(state),
            map_markers: ByAddress(self.map_markers(state)),
            first_future_event: ByAddress(self.first_future_event(state, now)),
            selected_marker: state.map.selected_marker.clone(),
            selected_category: state.map.selected_category.clone(),
            categories: ByAddress(self.categories(state)),
            visible_marker_coords: ByAddress(self.visible_marker_coords(state)),
        };

        self.view.get_or_compute(key, |key| MapView {
            locate_me: key.locate_me,
            show_filter: key.show_filter,
            events: Arc::clone(&key.events.0),
            markers: Arc::clone(&key.markers.0),
            loading: key.loading,
            map_markers: Arc::clone(&key.map_markers.0),
            first_future_event: key.first_future_event.get().clone(),
            selected_marker: key.selected_marker.clone(),
            selected_category: key.selected_category.clone(),
            categories: Arc::clone(&key.categories.0),
            visible_marker_coords: Arc::clone(&key.visible_marker_coords.0),
        })
    }
}
