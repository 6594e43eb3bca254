//! Injected collaborators
//!
//! Reducers and tasks never reach for globals. Everything with a side effect
//! (network, time, randomness, analytics) comes in through
//! [`AppEnvironment`].

use crate::config::{Config, MapConfig};
use crate::error::GatewayError;
use crate::gateway::{Gateway, HttpGateway};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use wappu_core::environment::{Clock, SystemClock};

/// Produces a display name suggestion for a new user.
pub trait NameGenerator: Send + Sync {
    /// A non-empty name, themed after `team_name` when one is given.
    fn generate(&self, team_name: Option<&str>) -> String;
}

/// Fire-and-forget analytics.
///
/// Implementations must not block and must not fail.
pub trait Tracker: Send + Sync {
    /// Record that `action` happened in `category`.
    fn track(&self, category: &str, action: &str, label: &str);
}

const ADJECTIVES: &[&str] = &[
    "Hilpeä", "Kuohuva", "Reipas", "Railakas", "Säihkyvä", "Vauhdikas", "Urhea", "Iloinen",
];

const NOUNS: &[&str] = &[
    "Teekkari", "Simanjuoja", "Haalari", "Munkki", "Serpentiini", "Lakki", "Kuoharipullo", "Ilmapallo",
];

/// Name generator drawing from a word list and the team name.
pub struct TeamNameGenerator {
    rng: Mutex<StdRng>,
}

impl TeamNameGenerator {
    /// Seeded from the operating system
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sequence for tests
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for TeamNameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TeamNameGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeamNameGenerator").finish_non_exhaustive()
    }
}

impl NameGenerator for TeamNameGenerator {
    fn generate(&self, team_name: Option<&str>) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let adjective = ADJECTIVES.choose(&mut *rng).copied().unwrap_or("Iloinen");
        let noun = NOUNS.choose(&mut *rng).copied().unwrap_or("Teekkari");

        match team_name.map(str::trim).and_then(|n| n.split_whitespace().next()) {
            Some(team) => format!("{adjective} {team}-{noun}"),
            None => format!("{adjective} {noun}"),
        }
    }
}

/// Tracker that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracker;

impl Tracker for LogTracker {
    fn track(&self, category: &str, action: &str, label: &str) {
        tracing::info!(category, action, label, "analytics event");
    }
}

/// Everything tasks and reducers may depend on.
///
/// Cloning is cheap: collaborators are shared behind `Arc`s.
#[derive(Clone)]
pub struct AppEnvironment {
    /// Remote API
    pub gateway: Arc<dyn Gateway>,
    /// Source of "now"
    pub clock: Arc<dyn Clock>,
    /// Display name suggestions
    pub names: Arc<dyn NameGenerator>,
    /// Analytics sink
    pub tracker: Arc<dyn Tracker>,
    /// This device's uuid
    pub device_id: String,
    /// Map settings
    pub map: MapConfig,
    request_tokens: Arc<AtomicU64>,
}

impl AppEnvironment {
    /// Create an environment with the default name generator and tracker.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn Gateway>,
        clock: Arc<dyn Clock>,
        device_id: impl Into<String>,
        map: MapConfig,
    ) -> Self {
        Self {
            gateway,
            clock,
            names: Arc::new(TeamNameGenerator::new()),
            tracker: Arc::new(LogTracker),
            device_id: device_id.into(),
            map,
            request_tokens: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Wire the production collaborators from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RequestFailed`] if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        Ok(Self::new(
            Arc::new(HttpGateway::new(&config.api)?),
            Arc::new(SystemClock),
            config.device.device_id.clone(),
            config.map.clone(),
        ))
    }

    /// Replace the name generator
    #[must_use]
    pub fn with_names(mut self, names: Arc<dyn NameGenerator>) -> Self {
        self.names = names;
        self
    }

    /// Replace the tracker
    #[must_use]
    pub fn with_tracker(mut self, tracker: Arc<dyn Tracker>) -> Self {
        self.tracker = tracker;
        self
    }

    /// A fresh token identifying one profile request.
    ///
    /// Strictly increasing and shared by every clone of the environment.
    #[must_use]
    pub fn next_request_token(&self) -> u64 {
        self.request_tokens.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl fmt::Debug for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppEnvironment")
            .field("device_id", &self.device_id)
            .field("map", &self.map)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockGateway;
    use wappu_testing::test_clock;

    #[test]
    fn generated_names_are_never_empty() {
        let names = TeamNameGenerator::with_seed(7);
        for team in [None, Some("Sähkökilta"), Some(""), Some("   ")] {
            assert!(!names.generate(team).trim().is_empty());
        }
    }

    #[test]
    fn team_name_is_woven_in() {
        let names = TeamNameGenerator::with_seed(1);
        assert!(names.generate(Some("Tietokilta ry")).contains("Tietokilta-"));
    }

    #[test]
    fn same_seed_same_names() {
        let a = TeamNameGenerator::with_seed(42);
        let b = TeamNameGenerator::with_seed(42);
        assert_eq!(a.generate(Some("Kilta")), b.generate(Some("Kilta")));
    }

    #[test]
    fn request_tokens_increase_across_clones() {
        let env = AppEnvironment::new(
            Arc::new(MockGateway::new()),
            Arc::new(test_clock()),
            "device-1",
            MapConfig::default(),
        );
        let clone = env.clone();

        let first = env.next_request_token();
        let second = clone.next_request_token();
        assert!(second > first);
    }
}
