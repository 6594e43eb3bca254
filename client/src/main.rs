//! Wappu client demo.
//!
//! Loads the configuration, fetches every collection from the API and logs
//! what the map screen would show.

use futures::future::join_all;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wappu_client::app::{AppTask, new_store, store_config};
use wappu_client::slices::{apps, event, feed, marker, registration, team};
use wappu_client::views::MapViewSelector;
use wappu_client::{AppAction, AppEnvironment, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wappu_client=debug,wappu_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(
        api_url = %config.api.base_url,
        city = %config.map.default_category,
        device_id = %config.device.device_id,
        "Configuration loaded"
    );

    let env = AppEnvironment::from_config(&config)?;
    let store = new_store(env, store_config(&config.store));

    let fetches: Vec<AppTask<AppAction>> = vec![
        apps::fetch_apps(),
        marker::fetch_markers(),
        feed::fetch_feed(),
        event::fetch_events(),
        team::fetch_teams(),
    ];
    let handles: Vec<_> = fetches.into_iter().map(|task| store.spawn(task)).collect();
    for result in join_all(handles.into_iter().map(|handle| handle.join())).await {
        match result {
            Ok(last) if last.is_failure() => warn!(action = last.action_type(), "Fetch failed"),
            Ok(last) => info!(action = last.action_type(), "Fetch finished"),
            Err(error) => warn!(%error, "Fetch did not run"),
        }
    }

    let user = store.run(registration::get_user()).await?;
    info!(action = user.action_type(), "User lookup finished");

    let mut selector = MapViewSelector::new(config.map.clone());
    let state = store.snapshot().await;
    let view = selector.select(&state, chrono::Utc::now());
    info!(
        city = %view.selected_category,
        markers = view.markers.len(),
        visible = view.map_markers.len(),
        categories = ?view.categories,
        next_event = ?view.first_future_event.as_ref().map(|event| event.name.as_str()),
        "Map view"
    );

    store
        .shutdown(store.config().default_shutdown_timeout)
        .await?;
    Ok(())
}
