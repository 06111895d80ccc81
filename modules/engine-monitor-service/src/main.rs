//! Engine Monitor Service — standalone binary for tracking Engine-relayed
//! blockchain transactions.
//!
//! Hosts both an RPC API and a dashboard UI on the same port.
//! Default: http://127.0.0.1:9103/

mod dashboard;
mod db;
mod engine_api;
mod routes;
mod timeline;
mod worker;

use routes::AppState;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let port: u16 = std::env::var("ENGINE_MONITOR_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(9103);

    let db_path = std::env::var("ENGINE_MONITOR_DB_PATH")
        .unwrap_or_else(|_| "./engine_monitor.db".to_string());

    let poll_interval_secs: u64 = std::env::var("ENGINE_MONITOR_POLL_INTERVAL")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(15);

    log::info!("Opening database at: {}", db_path);
    let database = Arc::new(db::Db::open(&db_path).expect("Failed to open database"));

    let last_tick_at: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

    let state = Arc::new(AppState {
        db: database.clone(),
        start_time: Instant::now(),
        last_tick_at: last_tick_at.clone(),
        poll_interval_secs,
    });

    // Spawn background worker if Engine credentials are configured
    if let Some(credentials) = engine_api::EngineCredentials::from_env() {
        let worker_db = database.clone();
        let worker_last_tick = last_tick_at.clone();
        tokio::spawn(async move {
            worker::run_worker(worker_db, credentials, poll_interval_secs, worker_last_tick).await;
        });
        log::info!(
            "Background worker started (poll interval: {}s)",
            poll_interval_secs
        );
    } else {
        log::warn!("ENGINE_URL / ENGINE_ACCESS_TOKEN not set — background worker disabled");
    }

    let cors = tower_http::cors::CorsLayer::permissive();

    let app = axum::Router::new()
        .route("/", axum::routing::get(dashboard::dashboard))
        // Transaction queries
        .route(
            "/rpc/transactions/query",
            axum::routing::post(routes::transactions_query),
        )
        .route(
            "/rpc/transactions/get",
            axum::routing::post(routes::transactions_get),
        )
        .route(
            "/rpc/transactions/timeline",
            axum::routing::post(routes::transactions_timeline),
        )
        .route(
            "/rpc/transactions/stats",
            axum::routing::get(routes::transactions_stats),
        )
        // Engine actions
        .route(
            "/rpc/transactions/refresh",
            axum::routing::post(routes::transactions_refresh),
        )
        .route(
            "/rpc/transactions/cancel",
            axum::routing::post(routes::transactions_cancel),
        )
        // Aggregates
        .route(
            "/rpc/wallets/summary",
            axum::routing::get(routes::wallets_summary),
        )
        .route(
            "/rpc/cancellations/list",
            axum::routing::get(routes::cancellations_list),
        )
        // Service
        .route("/rpc/status", axum::routing::get(routes::status))
        .with_state(state)
        .layer(cors);

    let addr = format!("127.0.0.1:{}", port);
    log::info!("Engine Monitor Service listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app).await.expect("Server error");
}
