use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PageVisitEvent;

/// Local audit-trail entry for a counted page visit. Not a delivery queue:
/// nothing ever reads these back to resend them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JournalRecord {
    pub session_id: String,
    pub sequence: u64,
    pub path: String,
    pub title: String,
    pub referrer: String,
    pub dwell_ms: u64,
    pub observed_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
}

impl JournalRecord {
    pub fn from_visit(
        session_id: &str,
        sequence: u64,
        visit: &PageVisitEvent,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            sequence,
            path: visit.path.clone(),
            title: visit.title.clone(),
            referrer: visit.referrer.clone(),
            dwell_ms: visit.dwell_ms,
            observed_at: visit.observed_at,
            recorded_at,
        }
    }
}
