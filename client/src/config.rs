//! Configuration management for the Wappu client.
//!
//! Loads configuration from environment variables with sensible defaults.
//! A `.env` file is honored when the binary calls `dotenvy::dotenv()` first.

use crate::error::ConfigError;
use crate::types::Location;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default city category.
pub const HELSINKI: &str = "HELSINKI";

/// Second built-in city category.
pub const TAMPERE: &str = "TAMPERE";

/// Default radius around a city center, in meters.
pub const CITY_MAX_DISTANCE: f64 = 75_000.0;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote API configuration
    pub api: ApiConfig,
    /// Map view configuration
    pub map: MapConfig,
    /// Device identity
    pub device: DeviceConfig,
    /// Store tuning
    pub store: StoreSettings,
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL, without the `/api` suffix
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Request timeout as a [`Duration`]
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Map view configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Category selected on startup
    pub default_category: String,
    /// Markers farther than this from the category center are hidden
    pub max_distance_meters: f64,
    /// City category name to center point
    pub categories: BTreeMap<String, Location>,
}

impl MapConfig {
    /// Center point of a category, if the category is known.
    #[must_use]
    pub fn center(&self, category: &str) -> Option<Location> {
        self.categories.get(category).copied()
    }

    /// Category names in sorted order.
    #[must_use]
    pub fn category_names(&self) -> Vec<String> {
        self.categories.keys().cloned().collect()
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_category: HELSINKI.to_string(),
            max_distance_meters: CITY_MAX_DISTANCE,
            categories: default_categories(),
        }
    }
}

/// Device identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Stable device uuid used to register and look up the user
    pub device_id: String,
}

/// Store tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Capacity of the action broadcast channel
    pub broadcast_capacity: usize,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_secs: u64,
}

fn default_categories() -> BTreeMap<String, Location> {
    BTreeMap::from([
        (HELSINKI.to_string(), Location::new(60.1699, 24.9384)),
        (TAMPERE.to_string(), Location::new(61.4978, 23.7610)),
    ])
}

/// Parse `NAME:lat:lng,NAME:lat:lng`. Malformed entries are skipped.
fn parse_categories(raw: &str) -> BTreeMap<String, Location> {
    raw.split(',')
        .filter_map(|entry| {
            let mut parts = entry.trim().split(':');
            let name = parts.next()?.trim().to_uppercase();
            let lat = parts.next()?.trim().parse().ok()?;
            let lng = parts.next()?.trim().parse().ok()?;
            (!name.is_empty()).then(|| (name, Location::new(lat, lng)))
        })
        .collect()
}

/// Parse a numeric setting, keeping `default` when it is unset.
fn parse_number<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
    }
}

fn random_device_id() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..16).map(|_| format!("{:x}", rng.gen_range(0..16u8))).collect()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a value is present but unusable: a
    /// numeric setting that does not parse, or a value [`Config::validate`]
    /// rejects.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a value is present but unusable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let categories = lookup("WAPPU_CITY_CATEGORIES")
            .map(|raw| parse_categories(&raw))
            .filter(|parsed| !parsed.is_empty())
            .unwrap_or_else(default_categories);

        let config = Self {
            api: ApiConfig {
                base_url: lookup("WAPPU_API_URL")
                    .unwrap_or_else(|| "http://localhost:3000".to_string()),
                timeout_secs: parse_number(&lookup, "WAPPU_API_TIMEOUT_SECS", 15)?,
            },
            map: MapConfig {
                default_category: lookup("WAPPU_DEFAULT_CITY")
                    .map(|s| s.trim().to_uppercase())
                    .unwrap_or_else(|| HELSINKI.to_string()),
                max_distance_meters: parse_number(
                    &lookup,
                    "WAPPU_MAX_DISTANCE_METERS",
                    CITY_MAX_DISTANCE,
                )?,
                categories,
            },
            device: DeviceConfig {
                device_id: lookup("WAPPU_DEVICE_ID").unwrap_or_else(random_device_id),
            },
            store: StoreSettings {
                broadcast_capacity: parse_number(&lookup, "WAPPU_BROADCAST_CAPACITY", 256)?,
                shutdown_timeout_secs: parse_number(&lookup, "WAPPU_SHUTDOWN_TIMEOUT_SECS", 10)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the values that cannot be defaulted away.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.api.base_url.clone()));
        }

        let distance = self.map.max_distance_meters;
        if !distance.is_finite() || distance <= 0.0 {
            return Err(ConfigError::InvalidMaxDistance(distance));
        }

        if self.map.center(&self.map.default_category).is_none() {
            return Err(ConfigError::UnknownCategory(self.map.default_category.clone()));
        }

        Ok(())
    }
}
