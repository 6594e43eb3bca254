//! Shared fixtures for the client integration tests

#![allow(dead_code, clippy::unwrap_used)]

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use wappu_client::app::{AppStore, new_store};
use wappu_client::config::MapConfig;
use wappu_client::environment::{AppEnvironment, TeamNameGenerator, Tracker};
use wappu_client::gateway::{Gateway, MockGateway};
use wappu_runtime::StoreConfig;
use wappu_testing::test_clock;

/// Tracker that remembers every event
#[derive(Debug, Default)]
pub struct RecordingTracker {
    events: Mutex<Vec<(String, String, String)>>,
}

impl RecordingTracker {
    pub fn events(&self) -> Vec<(String, String, String)> {
        self.events.lock().unwrap().clone()
    }
}

impl Tracker for RecordingTracker {
    fn track(&self, category: &str, action: &str, label: &str) {
        self.events
            .lock()
            .unwrap()
            .push((category.to_string(), action.to_string(), label.to_string()));
    }
}

/// A store over `gateway`, plus handles to inspect the collaborators
pub struct Harness {
    pub store: AppStore,
    pub gateway: Arc<MockGateway>,
    pub tracker: Arc<RecordingTracker>,
}

pub fn harness(gateway: MockGateway) -> Harness {
    let gateway = Arc::new(gateway);
    let tracker = Arc::new(RecordingTracker::default());

    let shared_gateway: Arc<dyn Gateway> = gateway.clone();
    let shared_tracker: Arc<dyn Tracker> = tracker.clone();

    let env = AppEnvironment::new(
        shared_gateway,
        Arc::new(test_clock()),
        "device-1",
        MapConfig::default(),
    )
    .with_names(Arc::new(TeamNameGenerator::with_seed(11)))
    .with_tracker(shared_tracker);

    Harness {
        store: new_store(env, StoreConfig::default().with_broadcast_capacity(256)),
        gateway,
        tracker,
    }
}

/// Decode a fixture
pub fn from_json<T: DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).unwrap()
}
