//! SQLite snapshot cache for the engine monitor service.
//!
//! Holds the last observed state of every Engine transaction plus an audit
//! trail of cancellation attempts. Snapshots are expected to go stale
//! between polls; the worker's next tick is the only recovery mechanism.

use engine_monitor_types::*;
use rusqlite::{Connection, Result as SqliteResult};
use std::sync::Mutex;

/// Outcome of one snapshot upsert, used by the worker for transition logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Inserted,
    StatusChanged {
        from: Option<String>,
        to: Option<String>,
    },
    Unchanged,
}

pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    pub fn open(path: &str) -> SqliteResult<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.create_tables()?;
        Ok(db)
    }

    fn create_tables(&self) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS transactions (
                queue_id TEXT PRIMARY KEY,
                chain_id TEXT,
                from_address TEXT,
                to_address TEXT,
                transaction_hash TEXT,
                function_name TEXT,
                status TEXT,
                queued_at TEXT,
                sent_at TEXT,
                mined_at TEXT,
                cancelled_at TEXT,
                error_message TEXT,
                retry_count INTEGER NOT NULL DEFAULT 0,
                first_seen_at TEXT NOT NULL,
                last_synced_at TEXT NOT NULL,
                raw_json TEXT
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_transactions_status ON transactions(status)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_transactions_queued ON transactions(queued_at DESC)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_transactions_from ON transactions(from_address)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS cancel_requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                queue_id TEXT NOT NULL,
                from_address TEXT NOT NULL,
                accepted INTEGER NOT NULL,
                message TEXT,
                requested_at TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_cancel_requests_queue
             ON cancel_requests(queue_id, requested_at DESC)",
            [],
        )?;

        Ok(())
    }

    // =====================================================
    // Transaction Snapshots
    // =====================================================

    /// Insert or update one snapshot.
    ///
    /// Timestamps and addresses are COALESCEd so a later partial snapshot
    /// never clears a value already observed; `first_seen_at` survives from
    /// the first insert. Status follows the latest snapshot because Engine
    /// owns the lifecycle.
    pub fn upsert_transaction(&self, record: &TransactionRecord) -> SqliteResult<SyncOutcome> {
        let conn = self.conn.lock().unwrap();

        let existing: Option<Option<String>> = {
            let mut stmt = conn.prepare("SELECT status FROM transactions WHERE queue_id = ?1")?;
            let mut rows =
                stmt.query_map([&record.queue_id], |row| row.get::<_, Option<String>>(0))?;
            rows.next().and_then(|r| r.ok())
        };

        let outcome = match &existing {
            None => SyncOutcome::Inserted,
            Some(old) if *old == record.status => SyncOutcome::Unchanged,
            Some(old) => SyncOutcome::StatusChanged {
                from: old.clone(),
                to: record.status.clone(),
            },
        };

        conn.execute(
            "INSERT INTO transactions (
                queue_id, chain_id, from_address, to_address, transaction_hash,
                function_name, status, queued_at, sent_at, mined_at, cancelled_at,
                error_message, retry_count, first_seen_at, last_synced_at, raw_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            ON CONFLICT(queue_id) DO UPDATE SET
                chain_id = COALESCE(excluded.chain_id, chain_id),
                from_address = COALESCE(excluded.from_address, from_address),
                to_address = COALESCE(excluded.to_address, to_address),
                transaction_hash = COALESCE(excluded.transaction_hash, transaction_hash),
                function_name = COALESCE(excluded.function_name, function_name),
                status = excluded.status,
                queued_at = COALESCE(excluded.queued_at, queued_at),
                sent_at = COALESCE(excluded.sent_at, sent_at),
                mined_at = COALESCE(excluded.mined_at, mined_at),
                cancelled_at = COALESCE(excluded.cancelled_at, cancelled_at),
                error_message = COALESCE(excluded.error_message, error_message),
                retry_count = excluded.retry_count,
                last_synced_at = excluded.last_synced_at,
                raw_json = COALESCE(excluded.raw_json, raw_json)",
            rusqlite::params![
                record.queue_id,
                record.chain_id,
                record.from_address,
                record.to_address,
                record.transaction_hash,
                record.function_name,
                record.status,
                record.queued_at,
                record.sent_at,
                record.mined_at,
                record.cancelled_at,
                record.error_message,
                record.retry_count,
                record.first_seen_at,
                record.last_synced_at,
                record.raw_json
            ],
        )?;

        Ok(outcome)
    }

    pub fn get_transaction(&self, queue_id: &str) -> SqliteResult<Option<TransactionRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT queue_id, chain_id, from_address, to_address, transaction_hash,
                    function_name, status, queued_at, sent_at, mined_at, cancelled_at,
                    error_message, retry_count, first_seen_at, last_synced_at, raw_json
             FROM transactions WHERE queue_id = ?1",
        )?;
        let mut rows = stmt.query_map([queue_id], |row| row_to_transaction(row))?;
        Ok(rows.next().and_then(|r| r.ok()))
    }

    pub fn query_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> SqliteResult<Vec<TransactionRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut conditions = vec!["1=1".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        let mut param_idx = 1u32;

        if let Some(ref status) = filter.status {
            conditions.push(format!("t.status = ?{}", param_idx));
            params.push(Box::new(status.clone()));
            param_idx += 1;
        }
        if let Some(ref addr) = filter.from_address {
            conditions.push(format!("LOWER(t.from_address) = ?{}", param_idx));
            params.push(Box::new(addr.to_lowercase()));
            param_idx += 1;
        }
        if let Some(ref chain) = filter.chain_id {
            conditions.push(format!("t.chain_id = ?{}", param_idx));
            params.push(Box::new(chain.clone()));
            param_idx += 1;
        }
        if let Some(ref search) = filter.search {
            conditions.push(format!(
                "(t.queue_id LIKE ?{idx} OR t.transaction_hash LIKE ?{idx})",
                idx = param_idx
            ));
            params.push(Box::new(format!("%{}%", search)));
            param_idx += 1;
        }
        if let Some(ref since) = filter.since {
            conditions.push(format!("t.queued_at >= ?{}", param_idx));
            params.push(Box::new(since.clone()));
            param_idx += 1;
        }
        if let Some(ref until) = filter.until {
            conditions.push(format!("t.queued_at <= ?{}", param_idx));
            params.push(Box::new(until.clone()));
            param_idx += 1;
        }
        let _ = param_idx;

        let limit = filter.limit.unwrap_or(50).min(200);
        let sql = format!(
            "SELECT t.queue_id, t.chain_id, t.from_address, t.to_address, t.transaction_hash,
                    t.function_name, t.status, t.queued_at, t.sent_at, t.mined_at, t.cancelled_at,
                    t.error_message, t.retry_count, t.first_seen_at, t.last_synced_at, t.raw_json
             FROM transactions t
             WHERE {}
             ORDER BY COALESCE(t.queued_at, t.first_seen_at) DESC
             LIMIT {}",
            conditions.join(" AND "),
            limit
        );

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(param_refs.as_slice(), |row| row_to_transaction(row))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(entries)
    }

    /// Unresolved snapshots whose last sync predates `cutoff`, oldest first.
    /// Unresolved means anything short of a resolved status, including
    /// intermediate and unrecognized statuses.
    pub fn stale_unresolved(
        &self,
        cutoff: &str,
        limit: usize,
    ) -> SqliteResult<Vec<TransactionRecord>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT queue_id, chain_id, from_address, to_address, transaction_hash,
                    function_name, status, queued_at, sent_at, mined_at, cancelled_at,
                    error_message, retry_count, first_seen_at, last_synced_at, raw_json
             FROM transactions
             WHERE (status IS NULL OR status NOT IN ({}))
               AND last_synced_at < ?1
             ORDER BY last_synced_at ASC
             LIMIT ?2",
            resolved_status_list()
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(rusqlite::params![cutoff, limit as i64], |row| {
                row_to_transaction(row)
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(entries)
    }

    pub fn get_transaction_stats(&self) -> SqliteResult<TransactionStats> {
        let conn = self.conn.lock().unwrap();
        let total: i64 = conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))
            .unwrap_or(0);
        let queued: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM transactions WHERE status = 'queued'",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);
        let sent: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM transactions WHERE status = 'sent'",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);
        let mined: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM transactions WHERE status = 'mined'",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);
        let cancelled: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM transactions WHERE status = 'cancelled'",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);
        let errored: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM transactions WHERE status = 'errored'",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);
        let unresolved: i64 = conn
            .query_row(
                &format!(
                    "SELECT COUNT(*) FROM transactions
                     WHERE status IS NULL OR status NOT IN ({})",
                    resolved_status_list()
                ),
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);
        let mined_24h: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM transactions
                 WHERE status = 'mined' AND mined_at >= datetime('now', '-1 day')",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        Ok(TransactionStats {
            total,
            queued,
            sent,
            mined,
            cancelled,
            errored,
            unresolved,
            mined_24h,
        })
    }

    /// Per backend-wallet rollup over every snapshot with a from address.
    pub fn wallet_summaries(&self) -> SqliteResult<Vec<WalletSummary>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT from_address,
                    COUNT(*),
                    SUM(CASE WHEN status = 'queued' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN status = 'sent' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN status = 'mined' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN status = 'cancelled' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN status = 'errored' THEN 1 ELSE 0 END),
                    MAX(queued_at)
             FROM transactions
             WHERE from_address IS NOT NULL
             GROUP BY from_address
             ORDER BY COUNT(*) DESC",
        )?;
        let entries = stmt
            .query_map([], |row| {
                Ok(WalletSummary {
                    from_address: row.get(0)?,
                    total: row.get(1)?,
                    queued: row.get(2)?,
                    sent: row.get(3)?,
                    mined: row.get(4)?,
                    cancelled: row.get(5)?,
                    errored: row.get(6)?,
                    last_queued_at: row.get(7)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(entries)
    }

    // =====================================================
    // Cancellation Audit
    // =====================================================

    pub fn record_cancel_attempt(
        &self,
        queue_id: &str,
        from_address: &str,
        accepted: bool,
        message: Option<&str>,
    ) -> SqliteResult<CancelAttempt> {
        let conn = self.conn.lock().unwrap();
        let now = chrono::Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO cancel_requests (queue_id, from_address, accepted, message, requested_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![queue_id, from_address, accepted, message, now],
        )?;

        let id = conn.last_insert_rowid();
        Ok(CancelAttempt {
            id,
            queue_id: queue_id.to_string(),
            from_address: from_address.to_string(),
            accepted,
            message: message.map(|s| s.to_string()),
            requested_at: now,
        })
    }

    pub fn list_cancel_attempts(
        &self,
        queue_id: Option<&str>,
        limit: usize,
    ) -> SqliteResult<Vec<CancelAttempt>> {
        let conn = self.conn.lock().unwrap();
        let limit = limit.min(200);

        let (sql, params): (String, Vec<Box<dyn rusqlite::ToSql>>) = match queue_id {
            Some(qid) => (
                format!(
                    "SELECT id, queue_id, from_address, accepted, message, requested_at
                     FROM cancel_requests
                     WHERE queue_id = ?1
                     ORDER BY requested_at DESC
                     LIMIT {}",
                    limit
                ),
                vec![Box::new(qid.to_string())],
            ),
            None => (
                format!(
                    "SELECT id, queue_id, from_address, accepted, message, requested_at
                     FROM cancel_requests
                     ORDER BY requested_at DESC
                     LIMIT {}",
                    limit
                ),
                Vec::new(),
            ),
        };

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(param_refs.as_slice(), |row| {
                Ok(CancelAttempt {
                    id: row.get(0)?,
                    queue_id: row.get(1)?,
                    from_address: row.get(2)?,
                    accepted: row.get(3)?,
                    message: row.get(4)?,
                    requested_at: row.get(5)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(entries)
    }
}

/// SQL literal list of the resolved statuses, derived from the status
/// helpers so the queries above cannot drift from them.
fn resolved_status_list() -> String {
    TransactionStatus::ALL
        .iter()
        .filter(|s| s.is_resolved())
        .map(|s| format!("'{}'", s))
        .collect::<Vec<_>>()
        .join(", ")
}

// =====================================================
// Row Mapping Functions
// =====================================================

fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<TransactionRecord> {
    Ok(TransactionRecord {
        queue_id: row.get(0)?,
        chain_id: row.get(1)?,
        from_address: row.get(2)?,
        to_address: row.get(3)?,
        transaction_hash: row.get(4)?,
        function_name: row.get(5)?,
        status: row.get(6)?,
        queued_at: row.get(7)?,
        sent_at: row.get(8)?,
        mined_at: row.get(9)?,
        cancelled_at: row.get(10)?,
        error_message: row.get(11)?,
        retry_count: row.get(12)?,
        first_seen_at: row.get(13)?,
        last_synced_at: row.get(14)?,
        raw_json: row.get(15)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_record(queue_id: &str, status: Option<&str>) -> TransactionRecord {
        TransactionRecord {
            queue_id: queue_id.to_string(),
            chain_id: Some("8453".to_string()),
            from_address: Some("0xAbCd000000000000000000000000000000000001".to_string()),
            to_address: Some("0x0000000000000000000000000000000000000002".to_string()),
            transaction_hash: None,
            function_name: Some("transfer".to_string()),
            status: status.map(|s| s.to_string()),
            queued_at: Some("2026-08-01T10:00:00+00:00".to_string()),
            sent_at: None,
            mined_at: None,
            cancelled_at: None,
            error_message: None,
            retry_count: 0,
            first_seen_at: "2026-08-01T10:00:05+00:00".to_string(),
            last_synced_at: "2026-08-01T10:00:05+00:00".to_string(),
            raw_json: None,
        }
    }

    #[test]
    fn test_upsert_reports_outcomes() {
        let db = Db::open(":memory:").unwrap();
        let record = test_record("q-1", Some("queued"));

        assert_eq!(
            db.upsert_transaction(&record).unwrap(),
            SyncOutcome::Inserted
        );
        assert_eq!(
            db.upsert_transaction(&record).unwrap(),
            SyncOutcome::Unchanged
        );

        let mut advanced = record.clone();
        advanced.status = Some("sent".to_string());
        advanced.sent_at = Some("2026-08-01T10:00:10+00:00".to_string());
        assert_eq!(
            db.upsert_transaction(&advanced).unwrap(),
            SyncOutcome::StatusChanged {
                from: Some("queued".to_string()),
                to: Some("sent".to_string()),
            }
        );
    }

    #[test]
    fn test_upsert_never_clears_observed_fields() {
        let db = Db::open(":memory:").unwrap();
        let mut record = test_record("q-1", Some("sent"));
        record.sent_at = Some("2026-08-01T10:00:10+00:00".to_string());
        db.upsert_transaction(&record).unwrap();

        // A later sparse snapshot must not erase the timestamps we have
        let mut sparse = test_record("q-1", Some("sent"));
        sparse.queued_at = None;
        sparse.sent_at = None;
        sparse.from_address = None;
        sparse.first_seen_at = "2026-08-01T10:01:00+00:00".to_string();
        sparse.last_synced_at = "2026-08-01T10:01:00+00:00".to_string();
        db.upsert_transaction(&sparse).unwrap();

        let stored = db.get_transaction("q-1").unwrap().unwrap();
        assert_eq!(stored.queued_at.as_deref(), Some("2026-08-01T10:00:00+00:00"));
        assert_eq!(stored.sent_at.as_deref(), Some("2026-08-01T10:00:10+00:00"));
        assert!(stored.from_address.is_some());
        // first_seen_at survives, last_synced_at follows the newest sync
        assert_eq!(stored.first_seen_at, "2026-08-01T10:00:05+00:00");
        assert_eq!(stored.last_synced_at, "2026-08-01T10:01:00+00:00");
    }

    #[test]
    fn test_get_transaction_missing() {
        let db = Db::open(":memory:").unwrap();
        assert!(db.get_transaction("nope").unwrap().is_none());
    }

    #[test]
    fn test_query_filters() {
        let db = Db::open(":memory:").unwrap();
        db.upsert_transaction(&test_record("q-1", Some("queued")))
            .unwrap();
        let mut other_wallet = test_record("q-2", Some("mined"));
        other_wallet.from_address =
            Some("0x9999000000000000000000000000000000000009".to_string());
        other_wallet.transaction_hash = Some("0xdeadbeef".to_string());
        db.upsert_transaction(&other_wallet).unwrap();

        let by_status = db
            .query_transactions(&TransactionFilter {
                status: Some("mined".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_status.len(), 1);
        assert_eq!(by_status[0].queue_id, "q-2");

        // Wallet filter is case-insensitive
        let by_wallet = db
            .query_transactions(&TransactionFilter {
                from_address: Some("0xABCD000000000000000000000000000000000001".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_wallet.len(), 1);
        assert_eq!(by_wallet[0].queue_id, "q-1");

        // Search matches queue id or transaction hash fragments
        let by_search = db
            .query_transactions(&TransactionFilter {
                search: Some("deadbeef".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_search.len(), 1);
        assert_eq!(by_search[0].queue_id, "q-2");
    }

    #[test]
    fn test_stats_counts() {
        let db = Db::open(":memory:").unwrap();
        db.upsert_transaction(&test_record("q-1", Some("queued")))
            .unwrap();
        db.upsert_transaction(&test_record("q-2", Some("sent")))
            .unwrap();
        db.upsert_transaction(&test_record("q-3", Some("errored")))
            .unwrap();
        db.upsert_transaction(&test_record("q-4", Some("processed")))
            .unwrap();
        db.upsert_transaction(&test_record("q-5", None)).unwrap();

        let stats = db.get_transaction_stats().unwrap();
        assert_eq!(stats.total, 5);
        assert_eq!(stats.queued, 1);
        assert_eq!(stats.sent, 1);
        assert_eq!(stats.errored, 1);
        // queued + sent + processed + missing are all still in flight
        assert_eq!(stats.unresolved, 4);
    }

    #[test]
    fn test_stale_unresolved_skips_resolved() {
        let db = Db::open(":memory:").unwrap();
        db.upsert_transaction(&test_record("q-1", Some("queued")))
            .unwrap();
        db.upsert_transaction(&test_record("q-2", Some("mined")))
            .unwrap();
        db.upsert_transaction(&test_record("q-3", Some("user-op-sent")))
            .unwrap();
        db.upsert_transaction(&test_record("q-4", Some("cancelled")))
            .unwrap();
        db.upsert_transaction(&test_record("q-5", Some("errored")))
            .unwrap();

        let stale = db
            .stale_unresolved("2026-08-01T10:05:00+00:00", 10)
            .unwrap();
        let ids: Vec<&str> = stale.iter().map(|t| t.queue_id.as_str()).collect();
        assert!(ids.contains(&"q-1"));
        assert!(ids.contains(&"q-3"));
        assert!(!ids.contains(&"q-2"));
        assert!(!ids.contains(&"q-4"));
        assert!(!ids.contains(&"q-5"));

        // Nothing is stale before the cutoff
        let none = db
            .stale_unresolved("2026-08-01T09:00:00+00:00", 10)
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_resolved_status_list_follows_helpers() {
        let list = resolved_status_list();
        for status in TransactionStatus::ALL {
            assert_eq!(
                list.contains(&format!("'{}'", status)),
                status.is_resolved(),
                "status {}",
                status
            );
        }
    }

    #[test]
    fn test_wallet_summaries() {
        let db = Db::open(":memory:").unwrap();
        db.upsert_transaction(&test_record("q-1", Some("queued")))
            .unwrap();
        db.upsert_transaction(&test_record("q-2", Some("mined")))
            .unwrap();
        let mut orphan = test_record("q-3", Some("mined"));
        orphan.from_address = None;
        db.upsert_transaction(&orphan).unwrap();

        let summaries = db.wallet_summaries().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].total, 2);
        assert_eq!(summaries[0].queued, 1);
        assert_eq!(summaries[0].mined, 1);
        assert!(summaries[0].last_queued_at.is_some());
    }

    #[test]
    fn test_cancel_attempt_history() {
        let db = Db::open(":memory:").unwrap();
        let ok = db
            .record_cancel_attempt("q-1", "0xabc", true, None)
            .unwrap();
        assert!(ok.accepted);

        let rejected = db
            .record_cancel_attempt("q-1", "0xabc", false, Some("Transaction already mined"))
            .unwrap();
        assert!(!rejected.accepted);
        assert_eq!(rejected.message.as_deref(), Some("Transaction already mined"));

        let all = db.list_cancel_attempts(None, 50).unwrap();
        assert_eq!(all.len(), 2);

        let for_queue = db.list_cancel_attempts(Some("q-1"), 50).unwrap();
        assert_eq!(for_queue.len(), 2);
        let for_other = db.list_cancel_attempts(Some("q-2"), 50).unwrap();
        assert!(for_other.is_empty());
    }
}
