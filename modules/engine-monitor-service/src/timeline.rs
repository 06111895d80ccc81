//! Delivery timeline derivation for transaction snapshots.
//!
//! Turns one cached Engine snapshot into the ordered list of lifecycle steps
//! that the dashboard renders as a vertical rail. Pure: no I/O, no clock
//! reads, so the same snapshot always yields the same steps.

use engine_monitor_types::{
    StepAction, StepLabel, TimelineStep, TransactionRecord, TransactionStatus,
};
use std::str::FromStr;

/// Build the delivery timeline for a snapshot.
///
/// Returns `None` when the status is missing, unrecognized, or one of the
/// intermediate processing states; those render as a plain badge with no
/// timeline. A produced timeline has 3 or 4 steps, exactly one of them
/// marked latest, and carries the cancel action only while the latest step
/// is still Queued or Sent.
///
/// Unreached steps keep their slot with no timestamp so the rail stays
/// visually stable as the transaction advances. Timestamps are copied
/// verbatim from the snapshot and never validated here.
pub fn build_timeline(tx: &TransactionRecord) -> Option<Vec<TimelineStep>> {
    let status = TransactionStatus::from_str(tx.status.as_deref()?).ok()?;

    // (label, timestamp) slots in display order, plus which slot is latest.
    let (slots, latest): (Vec<(StepLabel, Option<String>)>, usize) = match status {
        TransactionStatus::Queued => (
            vec![
                (StepLabel::Queued, tx.queued_at.clone()),
                (StepLabel::Sent, tx.sent_at.clone()),
                (StepLabel::Mined, tx.mined_at.clone()),
            ],
            0,
        ),
        TransactionStatus::Sent => (
            vec![
                (StepLabel::Queued, tx.queued_at.clone()),
                (StepLabel::Sent, tx.sent_at.clone()),
                (StepLabel::Mined, tx.mined_at.clone()),
            ],
            1,
        ),
        TransactionStatus::Mined => (
            vec![
                (StepLabel::Queued, tx.queued_at.clone()),
                (StepLabel::Sent, tx.sent_at.clone()),
                (StepLabel::Mined, tx.mined_at.clone()),
            ],
            2,
        ),
        TransactionStatus::Cancelled => (
            vec![
                (StepLabel::Queued, tx.queued_at.clone()),
                (StepLabel::Sent, tx.sent_at.clone()),
                (StepLabel::Cancelled, tx.cancelled_at.clone()),
                (StepLabel::Mined, tx.mined_at.clone()),
            ],
            2,
        ),
        // A failure after broadcast slots between Sent and Mined; a failure
        // before broadcast slots between Queued and Sent. Failed has no
        // associated timestamp field.
        TransactionStatus::Errored if tx.sent_at.is_some() => (
            vec![
                (StepLabel::Queued, tx.queued_at.clone()),
                (StepLabel::Sent, tx.sent_at.clone()),
                (StepLabel::Failed, None),
                (StepLabel::Mined, tx.mined_at.clone()),
            ],
            2,
        ),
        TransactionStatus::Errored => (
            vec![
                (StepLabel::Queued, tx.queued_at.clone()),
                (StepLabel::Failed, None),
                (StepLabel::Sent, tx.sent_at.clone()),
                (StepLabel::Mined, tx.mined_at.clone()),
            ],
            1,
        ),
        // Intermediate processing states have no timeline representation
        TransactionStatus::Processed
        | TransactionStatus::Retried
        | TransactionStatus::UserOpSent => return None,
    };

    // On every row of the table the latest step's label is Queued or Sent
    // exactly when the status is still cancelable.
    let steps = slots
        .into_iter()
        .enumerate()
        .map(|(i, (label, timestamp))| {
            let is_latest = i == latest;
            let action = if is_latest && status.is_cancelable() {
                Some(StepAction::Cancel)
            } else {
                None
            };
            TimelineStep {
                label,
                timestamp,
                is_latest,
                action,
            }
        })
        .collect();

    Some(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(status: Option<&str>) -> TransactionRecord {
        TransactionRecord {
            queue_id: "q-1".to_string(),
            chain_id: Some("8453".to_string()),
            from_address: Some("0x1234".to_string()),
            to_address: Some("0x5678".to_string()),
            transaction_hash: None,
            function_name: None,
            status: status.map(|s| s.to_string()),
            queued_at: Some("2026-08-01T10:00:00Z".to_string()),
            sent_at: None,
            mined_at: None,
            cancelled_at: None,
            error_message: None,
            retry_count: 0,
            first_seen_at: "2026-08-01T10:00:05Z".to_string(),
            last_synced_at: "2026-08-01T10:00:05Z".to_string(),
            raw_json: None,
        }
    }

    fn labels(steps: &[TimelineStep]) -> Vec<StepLabel> {
        steps.iter().map(|s| s.label).collect()
    }

    fn latest_index(steps: &[TimelineStep]) -> usize {
        steps.iter().position(|s| s.is_latest).unwrap()
    }

    #[test]
    fn test_queued_transaction() {
        let tx = snapshot(Some("queued"));
        let steps = build_timeline(&tx).unwrap();

        assert_eq!(
            labels(&steps),
            vec![StepLabel::Queued, StepLabel::Sent, StepLabel::Mined]
        );
        assert_eq!(latest_index(&steps), 0);
        assert_eq!(steps[0].timestamp, tx.queued_at);
        assert_eq!(steps[0].action, Some(StepAction::Cancel));

        // Future steps keep their slot with no timestamp
        assert_eq!(steps[1].timestamp, None);
        assert_eq!(steps[2].timestamp, None);
    }

    #[test]
    fn test_sent_transaction() {
        let mut tx = snapshot(Some("sent"));
        tx.sent_at = Some("2026-08-01T10:00:10Z".to_string());
        let steps = build_timeline(&tx).unwrap();

        assert_eq!(
            labels(&steps),
            vec![StepLabel::Queued, StepLabel::Sent, StepLabel::Mined]
        );
        assert_eq!(latest_index(&steps), 1);
        assert_eq!(steps[1].timestamp, tx.sent_at);
        assert_eq!(steps[1].action, Some(StepAction::Cancel));
        assert_eq!(steps[0].action, None);
    }

    #[test]
    fn test_mined_transaction() {
        let mut tx = snapshot(Some("mined"));
        tx.sent_at = Some("2026-08-01T10:00:10Z".to_string());
        tx.mined_at = Some("2026-08-01T10:00:30Z".to_string());
        let steps = build_timeline(&tx).unwrap();

        assert_eq!(
            labels(&steps),
            vec![StepLabel::Queued, StepLabel::Sent, StepLabel::Mined]
        );
        assert_eq!(latest_index(&steps), 2);
        assert_eq!(steps[0].timestamp, tx.queued_at);
        assert_eq!(steps[1].timestamp, tx.sent_at);
        assert_eq!(steps[2].timestamp, tx.mined_at);
        assert!(steps.iter().all(|s| s.action.is_none()));
    }

    #[test]
    fn test_cancelled_transaction() {
        let mut tx = snapshot(Some("cancelled"));
        tx.sent_at = Some("2026-08-01T10:00:10Z".to_string());
        tx.cancelled_at = Some("2026-08-01T10:01:00Z".to_string());
        let steps = build_timeline(&tx).unwrap();

        assert_eq!(
            labels(&steps),
            vec![
                StepLabel::Queued,
                StepLabel::Sent,
                StepLabel::Cancelled,
                StepLabel::Mined
            ]
        );
        assert_eq!(latest_index(&steps), 2);
        assert_eq!(steps[2].timestamp, tx.cancelled_at);
        // The Mined slot stays on the rail even though it will never resolve
        assert_eq!(steps[3].timestamp, None);
        assert!(steps.iter().all(|s| s.action.is_none()));
    }

    #[test]
    fn test_errored_after_broadcast() {
        let mut tx = snapshot(Some("errored"));
        tx.sent_at = Some("2026-08-01T10:00:10Z".to_string());
        tx.error_message = Some("execution reverted".to_string());
        let steps = build_timeline(&tx).unwrap();

        assert_eq!(
            labels(&steps),
            vec![
                StepLabel::Queued,
                StepLabel::Sent,
                StepLabel::Failed,
                StepLabel::Mined
            ]
        );
        assert_eq!(latest_index(&steps), 2);
        // Failed never carries a timestamp
        assert_eq!(steps[2].timestamp, None);
        assert!(steps.iter().all(|s| s.action.is_none()));
    }

    #[test]
    fn test_errored_before_broadcast() {
        let tx = snapshot(Some("errored"));
        let steps = build_timeline(&tx).unwrap();

        assert_eq!(
            labels(&steps),
            vec![
                StepLabel::Queued,
                StepLabel::Failed,
                StepLabel::Sent,
                StepLabel::Mined
            ]
        );
        assert_eq!(latest_index(&steps), 1);
        assert_eq!(steps[1].timestamp, None);
        assert!(steps.iter().all(|s| s.action.is_none()));
    }

    #[test]
    fn test_missing_status_has_no_timeline() {
        assert!(build_timeline(&snapshot(None)).is_none());
    }

    #[test]
    fn test_processing_states_have_no_timeline() {
        for status in ["processed", "retried", "user-op-sent"] {
            assert!(
                build_timeline(&snapshot(Some(status))).is_none(),
                "{} should have no timeline",
                status
            );
        }
    }

    #[test]
    fn test_unknown_status_has_no_timeline() {
        assert!(build_timeline(&snapshot(Some("simulated"))).is_none());
    }

    #[test]
    fn test_exactly_one_latest_step() {
        let cases = [
            ("queued", false),
            ("sent", true),
            ("mined", true),
            ("cancelled", true),
            ("errored", true),
            ("errored", false),
        ];
        for (status, with_sent_at) in cases {
            let mut tx = snapshot(Some(status));
            if with_sent_at {
                tx.sent_at = Some("2026-08-01T10:00:10Z".to_string());
            }
            let steps = build_timeline(&tx).unwrap();
            let latest = steps.iter().filter(|s| s.is_latest).count();
            assert_eq!(latest, 1, "status {} (sent_at: {})", status, with_sent_at);
        }
    }

    #[test]
    fn test_cancel_action_only_while_cancelable() {
        let cases = [
            ("queued", true),
            ("sent", true),
            ("mined", false),
            ("cancelled", false),
            ("errored", false),
        ];
        for (status, expect_cancel) in cases {
            let mut tx = snapshot(Some(status));
            tx.sent_at = Some("2026-08-01T10:00:10Z".to_string());
            let steps = build_timeline(&tx).unwrap();
            let has_cancel = steps.iter().any(|s| s.action == Some(StepAction::Cancel));
            assert_eq!(has_cancel, expect_cancel, "status {}", status);
            assert_eq!(
                has_cancel,
                TransactionStatus::from_str(status).unwrap().is_cancelable()
            );
            if has_cancel {
                // The action always sits on the latest step
                let latest = steps.iter().find(|s| s.is_latest).unwrap();
                assert_eq!(latest.action, Some(StepAction::Cancel));
                // And only on a step still labelled Queued or Sent
                assert!(matches!(
                    latest.label,
                    StepLabel::Queued | StepLabel::Sent
                ));
            }
        }
    }

    #[test]
    fn test_same_snapshot_same_timeline() {
        let mut tx = snapshot(Some("errored"));
        tx.sent_at = Some("2026-08-01T10:00:10Z".to_string());
        assert_eq!(build_timeline(&tx), build_timeline(&tx));
    }

    #[test]
    fn test_timestamps_copied_verbatim() {
        // A queued snapshot that already carries a sent_at keeps it on the
        // Sent slot; the builder copies fields without second-guessing them.
        let mut tx = snapshot(Some("queued"));
        tx.sent_at = Some("2026-08-01T09:59:59Z".to_string());
        let steps = build_timeline(&tx).unwrap();
        assert_eq!(steps[1].timestamp, tx.sent_at);
    }
}
