//! Dashboard HTML page handler.
//!
//! Serves a self-contained HTML page with inline CSS/JS showing queue stats,
//! recent transactions, and (with `?queue_id=`) a single transaction's
//! delivery timeline and cancellation history.

use crate::routes::AppState;
use crate::timeline;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use engine_monitor_types::{StepAction, StepLabel, TimelineStep};
use std::sync::Arc;

#[derive(Debug, serde::Deserialize)]
pub struct DashboardParams {
    pub queue_id: Option<String>,
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardParams>,
) -> impl IntoResponse {
    let stats = state.db.get_transaction_stats().ok();
    let recent = state
        .db
        .query_transactions(&engine_monitor_types::TransactionFilter {
            limit: Some(25),
            ..Default::default()
        })
        .unwrap_or_default();
    let last_tick = state.last_tick_at.lock().await.clone();
    let uptime = state.start_time.elapsed().as_secs();

    let stats_html = if let Some(s) = &stats {
        format!(
            r#"<div class="stats">
                <div class="stat"><span class="val">{}</span><span class="lbl">Total</span></div>
                <div class="stat"><span class="val">{}</span><span class="lbl">Queued</span></div>
                <div class="stat"><span class="val">{}</span><span class="lbl">Sent</span></div>
                <div class="stat"><span class="val">{}</span><span class="lbl">Mined</span></div>
                <div class="stat"><span class="val">{}</span><span class="lbl">Errored</span></div>
                <div class="stat"><span class="val">{}</span><span class="lbl">Unresolved</span></div>
                <div class="stat"><span class="val">{}</span><span class="lbl">Mined 24h</span></div>
            </div>"#,
            s.total, s.queued, s.sent, s.mined, s.errored, s.unresolved, s.mined_24h
        )
    } else {
        "<p>No stats available.</p>".to_string()
    };

    let detail_html = match params.queue_id.as_deref() {
        Some(queue_id) => detail_section(&state, queue_id),
        None => String::new(),
    };

    let mut tx_rows = String::new();
    for t in &recent {
        let status = t.status.as_deref().unwrap_or("unknown");
        tx_rows.push_str(&format!(
            "<tr><td class=\"mono\"><a href=\"/?queue_id={}\">{}</a></td>\
             <td><span class=\"badge {}\">{}</span></td>\
             <td>{}</td><td class=\"mono\">{}</td><td class=\"mono\">{}</td><td>{}</td></tr>\n",
            esc(&t.queue_id),
            esc(&short(&t.queue_id, 20)),
            status_class(t.status.as_deref()),
            esc(status),
            t.chain_id.as_deref().unwrap_or("-"),
            esc(&short(t.from_address.as_deref().unwrap_or("-"), 14)),
            esc(&short(t.transaction_hash.as_deref().unwrap_or("-"), 14)),
            t.queued_at.as_deref().unwrap_or("-")
        ));
    }
    if tx_rows.is_empty() {
        tx_rows = "<tr><td colspan=\"6\">No transactions synced yet.</td></tr>".to_string();
    }

    let last_tick_str = last_tick.as_deref().unwrap_or("not yet");
    let uptime_str = format_uptime(uptime);

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Engine Monitor Dashboard</title>
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #0f1117; color: #e0e0e0; padding: 20px; }}
  h1 {{ color: #58a6ff; margin-bottom: 8px; }}
  .meta {{ color: #8b949e; font-size: 0.85em; margin-bottom: 20px; }}
  .stats {{ display: flex; gap: 16px; margin-bottom: 24px; flex-wrap: wrap; }}
  .stat {{ background: #161b22; border: 1px solid #30363d; border-radius: 8px; padding: 16px 24px; text-align: center; min-width: 110px; }}
  .stat .val {{ display: block; font-size: 2em; font-weight: bold; color: #58a6ff; }}
  .stat .lbl {{ display: block; font-size: 0.85em; color: #8b949e; margin-top: 4px; }}
  table {{ width: 100%; border-collapse: collapse; margin-bottom: 24px; }}
  th {{ background: #161b22; color: #8b949e; text-align: left; padding: 8px 12px; font-size: 0.85em; text-transform: uppercase; border-bottom: 1px solid #30363d; }}
  td {{ padding: 8px 12px; border-bottom: 1px solid #21262d; font-size: 0.9em; }}
  tr:hover {{ background: #161b22; }}
  .mono {{ font-family: 'SF Mono', 'Consolas', monospace; font-size: 0.85em; }}
  h2 {{ color: #c9d1d9; margin-bottom: 12px; font-size: 1.1em; }}
  .section {{ margin-bottom: 28px; }}
  a {{ color: #58a6ff; text-decoration: none; }}
  a:hover {{ text-decoration: underline; }}
  .badge {{ padding: 2px 8px; border-radius: 10px; font-size: 0.8em; background: #30363d; color: #c9d1d9; }}
  .badge.st-queued {{ background: #3d2f00; color: #d29922; }}
  .badge.st-sent {{ background: #0d2b4d; color: #58a6ff; }}
  .badge.st-mined {{ background: #0d2818; color: #3fb950; }}
  .badge.st-cancelled {{ background: #30363d; color: #8b949e; }}
  .badge.st-errored {{ background: #3d1418; color: #f85149; }}
  .badge.st-processing {{ background: #2d1b4d; color: #a371f7; }}
  .timeline {{ margin: 12px 0 24px 8px; border-left: 2px solid #30363d; }}
  .tl-step {{ position: relative; padding: 0 0 20px 24px; }}
  .tl-step:last-child {{ padding-bottom: 4px; }}
  .tl-dot {{ position: absolute; left: -7px; top: 2px; width: 12px; height: 12px; border-radius: 50%; background: #30363d; border: 2px solid #0f1117; }}
  .tl-step.done .tl-dot {{ background: #3fb950; }}
  .tl-step.latest .tl-dot {{ background: #58a6ff; box-shadow: 0 0 0 3px rgba(88, 166, 255, 0.25); }}
  .tl-step.latest.tl-failed .tl-dot {{ background: #f85149; box-shadow: 0 0 0 3px rgba(248, 81, 73, 0.25); }}
  .tl-step.latest.tl-cancelled .tl-dot {{ background: #8b949e; box-shadow: 0 0 0 3px rgba(139, 148, 158, 0.25); }}
  .tl-label {{ font-weight: 600; color: #c9d1d9; margin-right: 10px; }}
  .tl-step.latest .tl-label {{ color: #58a6ff; }}
  .tl-step.latest.tl-failed .tl-label {{ color: #f85149; }}
  .tl-step.pending .tl-label {{ color: #8b949e; font-weight: 400; }}
  .tl-time {{ color: #8b949e; font-size: 0.85em; }}
  .tl-chip {{ margin-left: 10px; padding: 1px 8px; border-radius: 10px; font-size: 0.75em; background: #3d2f00; color: #d29922; }}
  .kv td:first-child {{ color: #8b949e; width: 180px; }}
  .error-box {{ background: #3d1418; border: 1px solid #f85149; border-radius: 8px; padding: 10px 14px; color: #f85149; margin-bottom: 16px; font-size: 0.9em; }}
</style>
</head>
<body>
  <h1>Engine Monitor</h1>
  <p class="meta">Uptime: {uptime_str} &middot; Last tick: {last_tick_str} &middot; Poll interval: {poll_interval}s</p>

  {stats_html}

  {detail_html}

  <div class="section">
    <h2>Recent Transactions</h2>
    <table>
      <thead><tr><th>Queue ID</th><th>Status</th><th>Chain</th><th>From</th><th>Tx Hash</th><th>Queued At</th></tr></thead>
      <tbody>{tx_rows}</tbody>
    </table>
  </div>

  <script>
    // Auto-refresh every 15 seconds
    setTimeout(() => location.reload(), 15000);
  </script>
</body>
</html>"#,
        uptime_str = uptime_str,
        last_tick_str = last_tick_str,
        poll_interval = state.poll_interval_secs,
        stats_html = stats_html,
        detail_html = detail_html,
        tx_rows = tx_rows,
    );

    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html)
}

/// Detail view for one transaction: timeline rail, snapshot fields, and
/// cancellation history.
fn detail_section(state: &AppState, queue_id: &str) -> String {
    let tx = match state.db.get_transaction(queue_id) {
        Ok(Some(tx)) => tx,
        _ => {
            return format!(
                "<div class=\"section\"><h2>Transaction</h2><p>Transaction {} not found.</p></div>",
                esc(queue_id)
            )
        }
    };

    let timeline_html = match timeline::build_timeline(&tx) {
        Some(steps) => format!(
            "<div class=\"timeline\">{}</div>",
            steps.iter().map(step_html).collect::<String>()
        ),
        // Intermediate or unrecognized statuses have no timeline; the badge
        // in the field table is all there is to show.
        None => String::new(),
    };

    let error_html = match tx.error_message.as_deref() {
        Some(msg) => format!("<div class=\"error-box\">{}</div>", esc(msg)),
        None => String::new(),
    };

    let attempts = state
        .db
        .list_cancel_attempts(Some(queue_id), 10)
        .unwrap_or_default();
    let cancel_html = if attempts.is_empty() {
        String::new()
    } else {
        let mut rows = String::new();
        for a in &attempts {
            let outcome = if a.accepted { "accepted" } else { "rejected" };
            rows.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                a.requested_at,
                outcome,
                esc(a.message.as_deref().unwrap_or("-"))
            ));
        }
        format!(
            "<h2>Cancellation Attempts</h2>\
             <table><thead><tr><th>Requested At</th><th>Outcome</th><th>Message</th></tr></thead>\
             <tbody>{}</tbody></table>",
            rows
        )
    };

    let status = tx.status.as_deref().unwrap_or("unknown");
    format!(
        r#"<div class="section">
    <h2>Transaction <span class="mono">{queue_id}</span></h2>
    {error_html}
    {timeline_html}
    <table class="kv">
      <tr><td>Status</td><td><span class="badge {status_class}">{status}</span></td></tr>
      <tr><td>Chain</td><td>{chain}</td></tr>
      <tr><td>From</td><td class="mono">{from}</td></tr>
      <tr><td>To</td><td class="mono">{to}</td></tr>
      <tr><td>Tx Hash</td><td class="mono">{hash}</td></tr>
      <tr><td>Function</td><td class="mono">{function}</td></tr>
      <tr><td>Retries</td><td>{retries}</td></tr>
      <tr><td>First Seen</td><td>{first_seen}</td></tr>
      <tr><td>Last Synced</td><td>{last_synced}</td></tr>
    </table>
    {cancel_html}
  </div>"#,
        queue_id = esc(&tx.queue_id),
        error_html = error_html,
        timeline_html = timeline_html,
        status_class = status_class(tx.status.as_deref()),
        status = esc(status),
        chain = esc(tx.chain_id.as_deref().unwrap_or("-")),
        from = esc(tx.from_address.as_deref().unwrap_or("-")),
        to = esc(tx.to_address.as_deref().unwrap_or("-")),
        hash = esc(tx.transaction_hash.as_deref().unwrap_or("-")),
        function = esc(tx.function_name.as_deref().unwrap_or("-")),
        retries = tx.retry_count,
        first_seen = tx.first_seen_at,
        last_synced = tx.last_synced_at,
        cancel_html = cancel_html,
    )
}

fn step_html(step: &TimelineStep) -> String {
    let mut classes = vec!["tl-step"];
    if step.is_latest {
        classes.push("latest");
    } else if step.timestamp.is_some() {
        classes.push("done");
    } else {
        classes.push("pending");
    }
    match step.label {
        StepLabel::Failed => classes.push("tl-failed"),
        StepLabel::Cancelled => classes.push("tl-cancelled"),
        _ => {}
    }

    let time = step.timestamp.as_deref().unwrap_or("");
    let chip = if step.action == Some(StepAction::Cancel) {
        "<span class=\"tl-chip\">cancelable</span>"
    } else {
        ""
    };

    format!(
        "<div class=\"{}\"><div class=\"tl-dot\"></div><div class=\"tl-body\">\
         <span class=\"tl-label\">{}</span><span class=\"tl-time\">{}</span>{}\
         </div></div>\n",
        classes.join(" "),
        step.label,
        esc(time),
        chip
    )
}

fn status_class(status: Option<&str>) -> &'static str {
    match status {
        Some("queued") => "st-queued",
        Some("sent") => "st-sent",
        Some("mined") => "st-mined",
        Some("cancelled") => "st-cancelled",
        Some("errored") => "st-errored",
        Some("processed") | Some("retried") | Some("user-op-sent") => "st-processing",
        _ => "",
    }
}

fn esc(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn short(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    // Queue ids and addresses are opaque strings, not guaranteed ASCII;
    // back off to a char boundary before cutting.
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

fn format_uptime(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_respects_char_boundaries() {
        let id = format!("{}é-tail", "a".repeat(9));
        // The 10-byte mark lands inside 'é'; the cut must back off, not panic
        assert_eq!(short(&id, 10), format!("{}...", "a".repeat(9)));
        assert_eq!(short("abc", 10), "abc");
        assert_eq!(short("abcdef", 4), "abcd...");
    }
}
