//! Shared types for the engine monitor service and its RPC clients.

use serde::{Deserialize, Serialize};

// =====================================================
// Status Model
// =====================================================

/// Lifecycle status reported by Engine for a queued transaction.
///
/// The first five values drive the delivery timeline. The remaining three
/// are intermediate processing states that only appear as badges in tabular
/// views and never produce a timeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionStatus {
    Queued,
    Sent,
    Mined,
    Cancelled,
    Errored,
    Processed,
    Retried,
    UserOpSent,
}

impl TransactionStatus {
    /// Every known status, for callers that derive status sets from the
    /// helpers below instead of re-listing values.
    pub const ALL: [TransactionStatus; 8] = [
        TransactionStatus::Queued,
        TransactionStatus::Sent,
        TransactionStatus::Mined,
        TransactionStatus::Cancelled,
        TransactionStatus::Errored,
        TransactionStatus::Processed,
        TransactionStatus::Retried,
        TransactionStatus::UserOpSent,
    ];

    /// Terminal states. The worker stops refreshing these individually.
    pub fn is_resolved(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Mined | TransactionStatus::Cancelled | TransactionStatus::Errored
        )
    }

    /// States in which Engine still accepts a cancellation request.
    pub fn is_cancelable(&self) -> bool {
        matches!(self, TransactionStatus::Queued | TransactionStatus::Sent)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Queued => write!(f, "queued"),
            TransactionStatus::Sent => write!(f, "sent"),
            TransactionStatus::Mined => write!(f, "mined"),
            TransactionStatus::Cancelled => write!(f, "cancelled"),
            TransactionStatus::Errored => write!(f, "errored"),
            TransactionStatus::Processed => write!(f, "processed"),
            TransactionStatus::Retried => write!(f, "retried"),
            TransactionStatus::UserOpSent => write!(f, "user-op-sent"),
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(TransactionStatus::Queued),
            "sent" => Ok(TransactionStatus::Sent),
            "mined" => Ok(TransactionStatus::Mined),
            "cancelled" => Ok(TransactionStatus::Cancelled),
            "errored" => Ok(TransactionStatus::Errored),
            "processed" => Ok(TransactionStatus::Processed),
            "retried" => Ok(TransactionStatus::Retried),
            "user-op-sent" => Ok(TransactionStatus::UserOpSent),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

// =====================================================
// Domain Types
// =====================================================

/// A cached snapshot of one Engine transaction.
///
/// `status` stays raw text so an unrecognized upstream value degrades to a
/// plain badge instead of a parse failure. Timestamps are RFC 3339 strings
/// carried verbatim from Engine and never cleared once observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
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
    pub retry_count: i64,
    pub first_seen_at: String,
    pub last_synced_at: String,
    pub raw_json: Option<String>,
}

/// Display label of one timeline step
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StepLabel {
    Queued,
    Sent,
    Mined,
    Cancelled,
    Failed,
}

impl std::fmt::Display for StepLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepLabel::Queued => write!(f, "Queued"),
            StepLabel::Sent => write!(f, "Sent"),
            StepLabel::Mined => write!(f, "Mined"),
            StepLabel::Cancelled => write!(f, "Cancelled"),
            StepLabel::Failed => write!(f, "Failed"),
        }
    }
}

/// Action a client may attach to a timeline step
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    Cancel,
}

/// One step on a transaction's delivery timeline.
///
/// Steps are derived on demand and never persisted. Exactly one step per
/// timeline has `is_latest` set; a step with no timestamp has not been
/// reached yet but keeps its slot so the rail stays visually stable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelineStep {
    pub label: StepLabel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub is_latest: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<StepAction>,
}

/// Timeline derivation for one transaction. Empty `steps` means the status
/// has no timeline representation and callers render nothing.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionTimeline {
    pub queue_id: String,
    pub steps: Vec<TimelineStep>,
}

// =====================================================
// Filter / Query Types
// =====================================================

/// Filters for querying cached transaction snapshots
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TransactionFilter {
    pub status: Option<String>,
    pub from_address: Option<String>,
    pub chain_id: Option<String>,
    pub search: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub limit: Option<usize>,
}

/// Transaction statistics overview
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionStats {
    pub total: i64,
    pub queued: i64,
    pub sent: i64,
    pub mined: i64,
    pub cancelled: i64,
    pub errored: i64,
    pub unresolved: i64,
    pub mined_24h: i64,
}

/// Per backend-wallet rollup derived from observed snapshots
#[derive(Debug, Serialize, Deserialize)]
pub struct WalletSummary {
    pub from_address: String,
    pub total: i64,
    pub queued: i64,
    pub sent: i64,
    pub mined: i64,
    pub cancelled: i64,
    pub errored: i64,
    pub last_queued_at: Option<String>,
}

// =====================================================
// Cancellation Types
// =====================================================

/// One recorded cancellation attempt, accepted or not
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAttempt {
    pub id: i64,
    pub queue_id: String,
    pub from_address: String,
    pub accepted: bool,
    pub message: Option<String>,
    pub requested_at: String,
}

/// Returned when Engine accepts a cancellation request
#[derive(Debug, Serialize, Deserialize)]
pub struct CancelReceipt {
    pub queue_id: String,
    pub message: String,
    pub requested_at: String,
}

// =====================================================
// RPC Request Types
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct GetTransactionRequest {
    pub queue_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TimelineRequest {
    pub queue_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshTransactionRequest {
    pub queue_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelTransactionRequest {
    pub queue_id: String,
}

// =====================================================
// RPC Response Types
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> RpcResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// =====================================================
// Service Status
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub running: bool,
    pub uptime_secs: u64,
    pub engine_configured: bool,
    pub engine_url: Option<String>,
    pub total_transactions: i64,
    pub unresolved_transactions: i64,
    pub last_tick_at: Option<String>,
    pub poll_interval_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_wire_format() {
        // Engine sends kebab-case status strings
        let s: TransactionStatus = serde_json::from_str("\"user-op-sent\"").unwrap();
        assert_eq!(s, TransactionStatus::UserOpSent);
        assert_eq!(
            serde_json::to_string(&TransactionStatus::UserOpSent).unwrap(),
            "\"user-op-sent\""
        );

        let s: TransactionStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(s, TransactionStatus::Cancelled);
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(
            TransactionStatus::from_str("queued").unwrap(),
            TransactionStatus::Queued
        );
        assert_eq!(
            TransactionStatus::from_str("user-op-sent").unwrap(),
            TransactionStatus::UserOpSent
        );
        assert!(TransactionStatus::from_str("confirmed").is_err());
    }

    #[test]
    fn test_status_display_round_trip() {
        for status in TransactionStatus::ALL {
            assert_eq!(
                TransactionStatus::from_str(&status.to_string()).unwrap(),
                status
            );
        }

        // ALL lists each status exactly once
        let mut names: Vec<String> = TransactionStatus::ALL
            .iter()
            .map(|s| s.to_string())
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), TransactionStatus::ALL.len());
    }

    #[test]
    fn test_status_helpers() {
        assert!(TransactionStatus::Mined.is_resolved());
        assert!(TransactionStatus::Cancelled.is_resolved());
        assert!(TransactionStatus::Errored.is_resolved());
        assert!(!TransactionStatus::Queued.is_resolved());
        assert!(!TransactionStatus::Sent.is_resolved());

        assert!(TransactionStatus::Queued.is_cancelable());
        assert!(TransactionStatus::Sent.is_cancelable());
        assert!(!TransactionStatus::Mined.is_cancelable());
        assert!(!TransactionStatus::Processed.is_cancelable());
    }

    #[test]
    fn test_rpc_response_shape() {
        let ok = serde_json::to_value(RpcResponse::ok(42)).unwrap();
        assert_eq!(ok["success"], true);
        assert_eq!(ok["data"], 42);
        assert!(ok.get("error").is_none());

        let err = serde_json::to_value(RpcResponse::<()>::err("nope")).unwrap();
        assert_eq!(err["success"], false);
        assert_eq!(err["error"], "nope");
        assert!(err.get("data").is_none());
    }
}
