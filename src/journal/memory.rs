use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::JournalRecord;

use super::{JournalPolicy, JournalStore};

/// In-process ring buffer per session.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    policy: JournalPolicy,
    sessions: Mutex<HashMap<String, VecDeque<JournalRecord>>>,
}

impl MemoryJournal {
    pub fn new(policy: JournalPolicy) -> Self {
        Self {
            policy,
            sessions: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl JournalStore for MemoryJournal {
    fn append(&self, record: JournalRecord) -> Result<()> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| anyhow!("memory journal lock poisoned"))?;

        // Expiry applies to every session; drained sessions are dropped.
        let cutoff = self.policy.cutoff(record.recorded_at);
        sessions.retain(|_, entries| {
            entries.retain(|entry| entry.recorded_at > cutoff);
            !entries.is_empty()
        });

        let entries = sessions.entry(record.session_id.clone()).or_default();
        entries.push_back(record);
        while entries.len() > self.policy.capacity {
            entries.pop_front();
        }
        Ok(())
    }

    async fn read_recent(&self, session_id: &str, now: DateTime<Utc>) -> Result<Vec<JournalRecord>> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|_| anyhow!("memory journal lock poisoned"))?;

        let cutoff = self.policy.cutoff(now);
        Ok(sessions
            .get(session_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.recorded_at > cutoff)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn last_sequence(&self, session_id: &str) -> Result<Option<u64>> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|_| anyhow!("memory journal lock poisoned"))?;

        Ok(sessions
            .get(session_id)
            .and_then(|entries| entries.iter().map(|entry| entry.sequence).max()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn record(session: &str, sequence: u64, recorded_at: DateTime<Utc>) -> JournalRecord {
        JournalRecord {
            session_id: session.to_string(),
            sequence,
            path: format!("/p/{sequence}"),
            title: String::new(),
            referrer: String::new(),
            dwell_ms: 1_500,
            observed_at: recorded_at,
            recorded_at,
        }
    }

    #[tokio::test]
    async fn over_capacity_evicts_oldest() {
        let store = MemoryJournal::new(JournalPolicy::new(3, Duration::hours(1)));
        let now = Utc::now();
        for seq in 1..=5 {
            store.append(record("s", seq, now)).unwrap();
        }

        let kept: Vec<u64> = store
            .read_recent("s", now)
            .await
            .unwrap()
            .iter()
            .map(|r| r.sequence)
            .collect();
        assert_eq!(kept, vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn expired_entries_are_not_read() {
        let store = MemoryJournal::new(JournalPolicy::new(10, Duration::minutes(30)));
        let now = Utc::now();
        store.append(record("s", 1, now - Duration::minutes(45))).unwrap();
        store.append(record("s", 2, now - Duration::minutes(5))).unwrap();

        let kept = store.read_recent("s", now).await.unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].sequence, 2);

        let later = store.read_recent("s", now + Duration::hours(1)).await.unwrap();
        assert!(later.is_empty());
    }

    #[tokio::test]
    async fn append_drops_expired_sessions() {
        let store = MemoryJournal::new(JournalPolicy::new(10, Duration::minutes(30)));
        let now = Utc::now();
        store.append(record("stale", 1, now - Duration::hours(2))).unwrap();
        store.append(record("live", 1, now)).unwrap();

        assert_eq!(store.sessions.lock().unwrap().len(), 1);
        assert_eq!(store.last_sequence("stale").await.unwrap(), None);
        assert_eq!(store.last_sequence("live").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = MemoryJournal::new(JournalPolicy::new(1, Duration::hours(1)));
        let now = Utc::now();
        store.append(record("a", 1, now)).unwrap();
        store.append(record("b", 1, now)).unwrap();

        assert_eq!(store.read_recent("a", now).await.unwrap().len(), 1);
        assert_eq!(store.read_recent("b", now).await.unwrap().len(), 1);
        assert_eq!(store.last_sequence("c").await.unwrap(), None);
    }
}
