//! Summarise a channel's activity for the current day, grouped by author.

use super::{app::Bot, error::BotError};
use crate::slack::channel::ChannelId;
use crate::slack::history::HistoryMessage;
use crate::slack::user::UserId;
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use std::fmt;

/// Per-author message logs for a single day. Buckets appear in the order
/// their authors first spoke; entries within a bucket are chronological.
///
/// Built once per request and dropped after being rendered; nothing here is
/// persisted.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DailyReport(pub IndexMap<UserId, Vec<String>>);

impl fmt::Display for DailyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (user, lines) in &self.0 {
            writeln!(f, "{}:", user)?;
            for line in lines {
                writeln!(f, "  {}", line)?;
            }
        }

        Ok(())
    }
}

/// Group an already-fetched history by author. Slack hands us history newest
/// first, so the walk is reversed to keep each bucket chronological.
pub fn build_report(messages: &[HistoryMessage]) -> DailyReport {
    let mut report = DailyReport::default();

    for msg in messages.iter().rev() {
        // System and bot noise has no author and no place in the report.
        let user = match &msg.user {
            Some(u) => u,
            None => continue,
        };

        report
            .0
            .entry(user.clone())
            .or_insert_with(Vec::new)
            .push(format!("{}: {}: {}", msg.ts, msg.kind, msg.text));
    }

    report
}

impl Bot {
    /// Build the report for everything said in a channel today.
    pub async fn report_today(&self, channel: &ChannelId) -> Result<DailyReport, BotError> {
        let (oldest, latest) = day_bounds(Local::now());

        let messages = self
            .client
            .fetch_history(channel, &oldest, &latest)
            .await
            .map_err(|e| BotError::HistoryFetch(e.to_string()))?;

        Ok(build_report(&messages))
    }
}

/// The first and last second of `now`'s calendar day, as the epoch-second
/// strings the history API expects.
fn day_bounds(now: DateTime<Local>) -> (String, String) {
    let day = now.date_naive();

    // Zones where a DST jump swallows either endpoint fall back to the
    // current instant; the window is a query bound, not an invariant.
    let start = day
        .and_hms_opt(0, 0, 0)
        .and_then(|t| t.and_local_timezone(Local).earliest())
        .map_or_else(|| now.timestamp(), |t| t.timestamp());
    let end = day
        .and_hms_opt(23, 59, 59)
        .and_then(|t| t.and_local_timezone(Local).latest())
        .map_or_else(|| now.timestamp(), |t| t.timestamp());

    (start.to_string(), end.to_string())
}
