//! Background worker that keeps the snapshot cache in sync with Engine.
//!
//! Each tick pages through `transaction/get-all`, then individually
//! refreshes unresolved snapshots the page window missed so long-queued
//! transactions still converge to a terminal status.

use crate::db::{Db, SyncOutcome};
use crate::engine_api::{self, EngineCredentials};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Page size for get-all sweeps
const PAGE_LIMIT: u32 = 100;
/// Upper bound on pages fetched per tick
const MAX_PAGES_PER_TICK: u32 = 5;
/// Upper bound on individual refreshes per tick
const MAX_STALE_REFRESHES: usize = 25;

pub async fn run_worker(
    db: Arc<Db>,
    credentials: EngineCredentials,
    poll_interval_secs: u64,
    last_tick_at: Arc<Mutex<Option<String>>>,
) {
    log::info!(
        "[ENGINE_MONITOR] Worker started (poll interval: {}s, engine: {})",
        poll_interval_secs,
        credentials.base_url
    );

    let client = reqwest::Client::new();

    loop {
        tokio::time::sleep(Duration::from_secs(poll_interval_secs)).await;

        match poll_tick(&db, &client, &credentials).await {
            Ok((synced, changed)) => {
                if changed > 0 {
                    log::info!(
                        "[ENGINE_MONITOR] Tick complete: {} snapshots synced, {} status changes",
                        synced,
                        changed
                    );
                } else {
                    log::debug!(
                        "[ENGINE_MONITOR] Tick complete: {} snapshots synced",
                        synced
                    );
                }
                *last_tick_at.lock().await = Some(chrono::Utc::now().to_rfc3339());
            }
            Err(e) => {
                log::error!("[ENGINE_MONITOR] Tick error: {}", e);
            }
        }
    }
}

/// One poll tick: sweep recent pages, then refresh stale unresolved entries.
/// Returns (snapshots synced, status changes observed).
async fn poll_tick(
    db: &Arc<Db>,
    client: &reqwest::Client,
    credentials: &EngineCredentials,
) -> Result<(usize, usize), String> {
    let tick_started = chrono::Utc::now().to_rfc3339();
    let mut synced = 0usize;
    let mut changed = 0usize;
    let mut page = 1u32;

    loop {
        let batch = engine_api::list_transactions(client, credentials, page, PAGE_LIMIT)
            .await
            .map_err(|e| format!("get-all page {} failed: {}", page, e))?;

        let now = chrono::Utc::now().to_rfc3339();
        let fetched = batch.transactions.len();

        for tx in &batch.transactions {
            match db.upsert_transaction(&tx.to_record(&now)) {
                Ok(outcome) => {
                    synced += 1;
                    if log_outcome(&tx.queue_id, &outcome) {
                        changed += 1;
                    }
                }
                Err(e) => {
                    log::warn!("[ENGINE_MONITOR] Failed to store {}: {}", tx.queue_id, e);
                }
            }
        }

        let seen = page as i64 * PAGE_LIMIT as i64;
        if fetched < PAGE_LIMIT as usize || seen >= batch.total_count || page >= MAX_PAGES_PER_TICK
        {
            break;
        }
        page += 1;
    }

    // get-all only covers the most recent pages. Unresolved snapshots that
    // fell out of the window are refreshed one at a time until they resolve.
    let stale = db
        .stale_unresolved(&tick_started, MAX_STALE_REFRESHES)
        .map_err(|e| format!("stale lookup failed: {}", e))?;

    for record in &stale {
        match engine_api::get_transaction(client, credentials, &record.queue_id).await {
            Ok(Some(tx)) => {
                let now = chrono::Utc::now().to_rfc3339();
                if let Ok(outcome) = db.upsert_transaction(&tx.to_record(&now)) {
                    synced += 1;
                    if log_outcome(&record.queue_id, &outcome) {
                        changed += 1;
                    }
                }
            }
            Ok(None) => {
                log::warn!(
                    "[ENGINE_MONITOR] Engine no longer knows {}",
                    record.queue_id
                );
            }
            Err(e) => {
                log::warn!(
                    "[ENGINE_MONITOR] Refresh of {} failed: {}",
                    record.queue_id,
                    e
                );
            }
        }

        // 200ms delay between lookups to avoid bursting Engine
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    Ok((synced, changed))
}

/// Log one upsert outcome. Returns true when the status changed.
fn log_outcome(queue_id: &str, outcome: &SyncOutcome) -> bool {
    match outcome {
        SyncOutcome::Inserted => {
            log::debug!("[ENGINE_MONITOR] New transaction {}", queue_id);
            false
        }
        SyncOutcome::StatusChanged { from, to } => {
            log::info!(
                "[ENGINE_MONITOR] Transaction {} status: {} -> {}",
                queue_id,
                from.as_deref().unwrap_or("unknown"),
                to.as_deref().unwrap_or("unknown")
            );
            true
        }
        SyncOutcome::Unchanged => false,
    }
}
