//! Engine HTTP API client.
//!
//! Engine is the transaction-relay backend that owns backend wallets and
//! submits transactions on their behalf. This module wraps the endpoints the
//! monitor needs: listing the transaction queue, fetching one transaction by
//! queue id, and requesting a cancellation.

use engine_monitor_types::TransactionRecord;
use serde::{Deserialize, Serialize};

/// Engine connection settings
#[derive(Debug, Clone)]
pub struct EngineCredentials {
    pub base_url: String,
    pub access_token: String,
}

impl EngineCredentials {
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("ENGINE_URL").ok()?;
        let access_token = std::env::var("ENGINE_ACCESS_TOKEN").ok()?;
        Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// One transaction as Engine reports it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineTransaction {
    pub queue_id: String,
    pub chain_id: Option<String>,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub transaction_hash: Option<String>,
    pub function_name: Option<String>,
    pub status: Option<String>,
    pub queued_at: Option<String>,
    pub sent_at: Option<String>,
    pub mined_at: Option<String>,
    pub cancelled_at: Option<String>,
    pub error_message: Option<String>,
    pub retry_count: Option<i64>,
}

impl EngineTransaction {
    /// Convert to a stored snapshot, stamping both sync times with `now`.
    /// On upsert the store keeps the original `first_seen_at`.
    pub fn to_record(&self, now: &str) -> TransactionRecord {
        TransactionRecord {
            queue_id: self.queue_id.clone(),
            chain_id: self.chain_id.clone(),
            from_address: self.from_address.clone(),
            to_address: self.to_address.clone(),
            transaction_hash: self.transaction_hash.clone(),
            function_name: self.function_name.clone(),
            status: self.status.clone(),
            queued_at: self.queued_at.clone(),
            sent_at: self.sent_at.clone(),
            mined_at: self.mined_at.clone(),
            cancelled_at: self.cancelled_at.clone(),
            error_message: self.error_message.clone(),
            retry_count: self.retry_count.unwrap_or(0),
            first_seen_at: now.to_string(),
            last_synced_at: now.to_string(),
            raw_json: serde_json::to_string(self).ok(),
        }
    }
}

/// One page of the transaction queue
#[derive(Debug)]
pub struct TransactionPage {
    pub transactions: Vec<EngineTransaction>,
    pub total_count: i64,
}

/// Fetch one page of `transaction/get-all`.
///
/// Entries that fail to parse are skipped rather than failing the page, so
/// an unfamiliar record shape upstream never blanks the whole sweep.
pub async fn list_transactions(
    client: &reqwest::Client,
    credentials: &EngineCredentials,
    page: u32,
    limit: u32,
) -> Result<TransactionPage, String> {
    let url = credentials.url(&format!("transaction/get-all?page={}&limit={}", page, limit));

    let response = client
        .get(&url)
        .header(
            "Authorization",
            format!("Bearer {}", credentials.access_token),
        )
        .send()
        .await
        .map_err(|e| format!("Engine request failed: {}", e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| format!("Failed to read response: {}", e))?;

    if !status.is_success() {
        return Err(format!(
            "Engine error ({}): {}",
            status,
            engine_error_message(&body)
        ));
    }

    let json: serde_json::Value =
        serde_json::from_str(&body).map_err(|e| format!("Invalid JSON: {}", e))?;
    let result = json.get("result").unwrap_or(&json);

    let transactions: Vec<EngineTransaction> = result
        .get("transactions")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default();

    let total_count = result
        .get("totalCount")
        .and_then(|v| v.as_i64())
        .unwrap_or(transactions.len() as i64);

    Ok(TransactionPage {
        transactions,
        total_count,
    })
}

/// Fetch one transaction by queue id. A 404 from Engine means the queue id
/// is unknown and maps to `Ok(None)`, not an error.
pub async fn get_transaction(
    client: &reqwest::Client,
    credentials: &EngineCredentials,
    queue_id: &str,
) -> Result<Option<EngineTransaction>, String> {
    let url = credentials.url(&format!("transaction/status/{}", queue_id));

    let response = client
        .get(&url)
        .header(
            "Authorization",
            format!("Bearer {}", credentials.access_token),
        )
        .send()
        .await
        .map_err(|e| format!("Engine request failed: {}", e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| format!("Failed to read response: {}", e))?;

    if status.as_u16() == 404 {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(format!(
            "Engine error ({}): {}",
            status,
            engine_error_message(&body)
        ));
    }

    let json: serde_json::Value =
        serde_json::from_str(&body).map_err(|e| format!("Invalid JSON: {}", e))?;
    let result = json.get("result").unwrap_or(&json);

    serde_json::from_value(result.clone())
        .map(Some)
        .map_err(|e| format!("Failed to parse transaction: {}", e))
}

/// Ask Engine to cancel a queued or sent transaction.
///
/// One-shot: the request is sent once and the outcome reported as-is, with
/// no retry. Engine decides whether the transaction is still cancelable and
/// its error message is passed through to the caller.
pub async fn cancel_transaction(
    client: &reqwest::Client,
    credentials: &EngineCredentials,
    queue_id: &str,
    from_address: &str,
) -> Result<(), String> {
    let url = credentials.url("transaction/cancel");

    let response = client
        .post(&url)
        .header(
            "Authorization",
            format!("Bearer {}", credentials.access_token),
        )
        .header("x-backend-wallet-address", from_address)
        .json(&serde_json::json!({ "queueId": queue_id }))
        .send()
        .await
        .map_err(|e| format!("Engine request failed: {}", e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| format!("Failed to read response: {}", e))?;

    if !status.is_success() {
        return Err(format!(
            "Engine rejected cancellation ({}): {}",
            status,
            engine_error_message(&body)
        ));
    }

    Ok(())
}

/// Pull the human-readable message out of an Engine error body.
/// Engine wraps errors as `{"error": {"message": "..."}}`.
fn engine_error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = json
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return msg.to_string();
        }
        if let Some(msg) = json.get("message").and_then(|m| m.as_str()) {
            return msg.to_string();
        }
    }
    truncate_error(body).to_string()
}

fn truncate_error(s: &str) -> &str {
    if s.len() <= 200 {
        return s;
    }
    // Back off to a char boundary; a raw byte cut can land inside a
    // multi-byte character and panic.
    let mut end = 200;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
