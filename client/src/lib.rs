//! # Wappu client state layer
//!
//! Application state for the Wappu/Vask event app: the feed, the map and its
//! markers, events, teams, user profiles and registration.
//!
//! State lives in one [`app::AppStore`]. Plain actions change it through the
//! slice reducers in [`slices`]; tasks (`fetch_apps`, `vote_feed_item`,
//! `put_user`, ...) talk to the API through the injected
//! [`gateway::Gateway`] and report progress as `*_REQUEST`, `*_SUCCESS`,
//! `SET_*` and `*_FAILURE` actions. Derived projections for the map screen
//! live in [`views`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use wappu_client::app::new_store;
//! use wappu_client::config::MapConfig;
//! use wappu_client::environment::AppEnvironment;
//! use wappu_client::gateway::MockGateway;
//! use wappu_client::slices::apps::{fetch_apps, get_apps};
//! use wappu_core::environment::SystemClock;
//! use wappu_runtime::StoreConfig;
//!
//! # async fn demo() -> Result<(), wappu_runtime::StoreError> {
//! let env = AppEnvironment::new(
//!     Arc::new(MockGateway::new()),
//!     Arc::new(SystemClock),
//!     "device-1",
//!     MapConfig::default(),
//! );
//! let store = new_store(env, StoreConfig::default());
//!
//! let last = store.run(fetch_apps()).await?;
//! println!("{} ({} apps)", last.action_type(), store.state(|s| get_apps(s).len()).await);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod action;
pub mod app;
pub mod config;
pub mod environment;
pub mod error;
pub mod gateway;
pub mod slices;
pub mod types;
pub mod views;

pub use action::AppAction;
pub use app::{AppState, AppStore, app_reducer, new_store};
pub use config::Config;
pub use environment::AppEnvironment;
pub use error::{ConfigError, GatewayError};
