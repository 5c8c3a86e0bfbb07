use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use transit_server::cache::{CacheConfig, GraphCache};
use transit_server::config::ServerConfig;
use transit_server::geometry::{GuardedGeometry, OsrmClient, OsrmConfig};
use transit_server::planner::{LivePlanner, PlannerConfig};
use transit_server::schedule::{ScheduleCorpus, ScheduleStore};
use transit_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("transit_server=info,tower_http=info")),
        )
        .init();

    let config = ServerConfig::from_env().unwrap_or_else(|e| {
        error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    // Schedule store over the corpus directory
    let cache_config = CacheConfig::default().with_ttl(config.schedule_cache_ttl);
    let store = ScheduleStore::new(ScheduleCorpus::new(config.data_dir.clone()), &cache_config);

    // Live geometry when a router is configured, estimates otherwise
    let live = config.routing_url.as_ref().map(|url| {
        let osrm_config = OsrmConfig::new()
            .with_base_url(url.as_str())
            .with_timeout_ms(config.routing_timeout.as_millis() as u64);
        OsrmClient::new(osrm_config).expect("Failed to create routing client")
    });
    if live.is_none() {
        warn!("ROUTING_URL not set, using straight-line geometry");
    }
    let geometry = GuardedGeometry::new(live, config.routing_timeout);

    let planner = LivePlanner::new(
        Arc::new(store),
        Arc::new(GraphCache::new()),
        geometry,
        PlannerConfig::default(),
    );
    let state = AppState::new(planner);

    // Build the graph up front so the first request doesn't pay for it
    match state.planner.rebuild_graph().await {
        Ok(stats) => info!(
            stops = stats.stops,
            edges = stats.edges,
            lines = stats.lines,
            data_dir = %config.data_dir.display(),
            "Schedule loaded"
        ),
        Err(e) => warn!(error = %e, "Schedule not loaded, will retry on first request"),
    }

    // Periodically reload the corpus and rebuild the graph
    if let Some(period) = config.refresh_interval {
        let refresh = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // First tick is immediate, skip it
            loop {
                interval.tick().await;
                match refresh.planner.rebuild_graph().await {
                    Ok(stats) => info!(stops = stats.stops, edges = stats.edges, "Schedule refreshed"),
                    Err(e) => error!(error = %e, "Failed to refresh schedule"),
                }
            }
        });
    }

    let app = create_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .expect("Failed to bind listen address");
    info!(addr = %config.bind, "Bus Journey Planner listening");

    axum::serve(listener, app).await.expect("Server error");
}
