//! Axum route handlers for the engine monitor RPC API.

use crate::db::Db;
use crate::engine_api::{self, EngineCredentials};
use crate::timeline;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use engine_monitor_types::*;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

pub struct AppState {
    pub db: Arc<Db>,
    pub start_time: Instant,
    pub last_tick_at: Arc<Mutex<Option<String>>>,
    pub poll_interval_secs: u64,
}

// =====================================================
// Transaction Endpoints
// =====================================================

// POST /rpc/transactions/query
pub async fn transactions_query(
    State(state): State<Arc<AppState>>,
    Json(filter): Json<TransactionFilter>,
) -> (StatusCode, Json<RpcResponse<Vec<TransactionRecord>>>) {
    match state.db.query_transactions(&filter) {
        Ok(entries) => (StatusCode::OK, Json(RpcResponse::ok(entries))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RpcResponse::err(format!("Query failed: {}", e))),
        ),
    }
}

// POST /rpc/transactions/get
pub async fn transactions_get(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetTransactionRequest>,
) -> (StatusCode, Json<RpcResponse<TransactionRecord>>) {
    match state.db.get_transaction(&req.queue_id) {
        Ok(Some(tx)) => (StatusCode::OK, Json(RpcResponse::ok(tx))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(RpcResponse::err(format!(
                "Transaction {} not found",
                req.queue_id
            ))),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RpcResponse::err(format!("Lookup failed: {}", e))),
        ),
    }
}

// POST /rpc/transactions/timeline
pub async fn transactions_timeline(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TimelineRequest>,
) -> (StatusCode, Json<RpcResponse<TransactionTimeline>>) {
    let tx = match state.db.get_transaction(&req.queue_id) {
        Ok(Some(tx)) => tx,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(RpcResponse::err(format!(
                    "Transaction {} not found",
                    req.queue_id
                ))),
            )
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RpcResponse::err(format!("Lookup failed: {}", e))),
            )
        }
    };

    // A status outside the modeled lifecycle yields no steps; clients render
    // nothing for an empty list rather than treating it as an error.
    let steps = timeline::build_timeline(&tx).unwrap_or_default();
    (
        StatusCode::OK,
        Json(RpcResponse::ok(TransactionTimeline {
            queue_id: tx.queue_id,
            steps,
        })),
    )
}

// GET /rpc/transactions/stats
pub async fn transactions_stats(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<TransactionStats>>) {
    match state.db.get_transaction_stats() {
        Ok(stats) => (StatusCode::OK, Json(RpcResponse::ok(stats))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RpcResponse::err(format!("Stats query failed: {}", e))),
        ),
    }
}

// =====================================================
// Engine Round-trips
// =====================================================

// POST /rpc/transactions/refresh
pub async fn transactions_refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshTransactionRequest>,
) -> (StatusCode, Json<RpcResponse<TransactionRecord>>) {
    let credentials = match EngineCredentials::from_env() {
        Some(c) => c,
        None => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(RpcResponse::err("Engine credentials not configured")),
            )
        }
    };

    let client = reqwest::Client::new();
    let fetched = match engine_api::get_transaction(&client, &credentials, &req.queue_id).await {
        Ok(Some(tx)) => tx,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(RpcResponse::err(format!(
                    "Engine has no transaction {}",
                    req.queue_id
                ))),
            )
        }
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(RpcResponse::err(format!(
                    "Failed to refresh {}: {}",
                    req.queue_id, e
                ))),
            )
        }
    };

    let now = chrono::Utc::now().to_rfc3339();
    let record = fetched.to_record(&now);
    match state.db.upsert_transaction(&record) {
        // Re-read so the response carries the merged snapshot, not just
        // what this fetch happened to include
        Ok(_) => match state.db.get_transaction(&req.queue_id) {
            Ok(Some(stored)) => (StatusCode::OK, Json(RpcResponse::ok(stored))),
            _ => (StatusCode::OK, Json(RpcResponse::ok(record))),
        },
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RpcResponse::err(format!("Failed to store snapshot: {}", e))),
        ),
    }
}

// POST /rpc/transactions/cancel
//
// One-shot relay of the cancellation to Engine. The attempt is recorded
// either way; Engine stays the authority on whether the transaction was
// still cancelable, so there is no local status gate and no retry.
pub async fn transactions_cancel(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CancelTransactionRequest>,
) -> (StatusCode, Json<RpcResponse<CancelReceipt>>) {
    let tx = match state.db.get_transaction(&req.queue_id) {
        Ok(Some(tx)) => tx,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(RpcResponse::err(format!(
                    "Transaction {} not found",
                    req.queue_id
                ))),
            )
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RpcResponse::err(format!("Lookup failed: {}", e))),
            )
        }
    };

    let from_address = match tx.from_address {
        Some(addr) => addr,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(RpcResponse::err(format!(
                    "Transaction {} has no backend wallet address",
                    req.queue_id
                ))),
            )
        }
    };

    let credentials = match EngineCredentials::from_env() {
        Some(c) => c,
        None => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(RpcResponse::err("Engine credentials not configured")),
            )
        }
    };

    let client = reqwest::Client::new();
    match engine_api::cancel_transaction(&client, &credentials, &req.queue_id, &from_address).await
    {
        Ok(()) => {
            // Audit write is best-effort, but a miss has to be visible
            let attempt = match state
                .db
                .record_cancel_attempt(&req.queue_id, &from_address, true, None)
            {
                Ok(a) => Some(a),
                Err(db_err) => {
                    log::warn!(
                        "[ENGINE_MONITOR] Failed to record cancel attempt for {}: {}",
                        req.queue_id,
                        db_err
                    );
                    None
                }
            };
            let requested_at = attempt
                .map(|a| a.requested_at)
                .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
            (
                StatusCode::OK,
                Json(RpcResponse::ok(CancelReceipt {
                    queue_id: req.queue_id,
                    message: "Cancellation requested".to_string(),
                    requested_at,
                })),
            )
        }
        Err(e) => {
            if let Err(db_err) =
                state
                    .db
                    .record_cancel_attempt(&req.queue_id, &from_address, false, Some(&e))
            {
                log::warn!(
                    "[ENGINE_MONITOR] Failed to record cancel attempt for {}: {}",
                    req.queue_id,
                    db_err
                );
            }
            log::warn!(
                "[ENGINE_MONITOR] Cancel of {} rejected: {}",
                req.queue_id,
                e
            );
            (StatusCode::BAD_REQUEST, Json(RpcResponse::err(e)))
        }
    }
}

// =====================================================
// Rollup Endpoints
// =====================================================

// GET /rpc/wallets/summary
pub async fn wallets_summary(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<Vec<WalletSummary>>>) {
    match state.db.wallet_summaries() {
        Ok(entries) => (StatusCode::OK, Json(RpcResponse::ok(entries))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RpcResponse::err(format!("Summary query failed: {}", e))),
        ),
    }
}

// GET /rpc/cancellations/list
pub async fn cancellations_list(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<Vec<CancelAttempt>>>) {
    match state.db.list_cancel_attempts(None, 50) {
        Ok(entries) => (StatusCode::OK, Json(RpcResponse::ok(entries))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RpcResponse::err(format!("List failed: {}", e))),
        ),
    }
}

// =====================================================
// Service Endpoints
// =====================================================

// GET /rpc/status
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<ServiceStatus>>) {
    let stats = state.db.get_transaction_stats().ok();
    let last_tick = state.last_tick_at.lock().await.clone();
    let credentials = EngineCredentials::from_env();

    let status = ServiceStatus {
        running: true,
        uptime_secs: state.start_time.elapsed().as_secs(),
        engine_configured: credentials.is_some(),
        engine_url: credentials.map(|c| c.base_url),
        total_transactions: stats.as_ref().map(|s| s.total).unwrap_or(0),
        unresolved_transactions: stats.as_ref().map(|s| s.unresolved).unwrap_or(0),
        last_tick_at: last_tick,
        poll_interval_secs: state.poll_interval_secs,
    };

    (StatusCode::OK, Json(RpcResponse::ok(status)))
}
