//! Local, non-authoritative journal of counted page visits.
//!
//! The journal is an audit trail kept next to the client. It is capped and
//! time-limited, written regardless of whether ingestion succeeds, and never
//! replayed to the network.

pub mod memory;
pub mod sqlite;

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::{JournalRecord, PageVisitEvent};

pub use memory::MemoryJournal;
pub use sqlite::SqliteJournal;

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "pagepulse::journal";

use crate::log_warn;

pub const DEFAULT_CAPACITY: usize = 50;
pub const DEFAULT_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalPolicy {
    /// Maximum records kept per session; the oldest is evicted first.
    pub capacity: usize,
    pub ttl: Duration,
}

impl Default for JournalPolicy {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl: Duration::seconds(DEFAULT_TTL_SECS),
        }
    }
}

impl JournalPolicy {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Records at or before this instant are expired.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.ttl
    }
}

/// Storage medium behind the journal.
///
/// `append` is not awaited by anyone: a medium with slow writes must queue
/// the work and return. Reads are ordinary queries and are awaited.
#[async_trait]
pub trait JournalStore: Send + Sync {
    fn append(&self, record: JournalRecord) -> Result<()>;

    /// Unexpired records for `session_id`, oldest first.
    async fn read_recent(&self, session_id: &str, now: DateTime<Utc>) -> Result<Vec<JournalRecord>>;

    async fn last_sequence(&self, session_id: &str) -> Result<Option<u64>>;
}

/// Session-scoped front end over a [`JournalStore`].
#[derive(Clone)]
pub struct LocalJournal {
    store: Arc<dyn JournalStore>,
    session_id: Arc<str>,
    next_sequence: Arc<AtomicU64>,
}

impl LocalJournal {
    /// Starts a fresh session with a random id.
    pub fn new(store: Arc<dyn JournalStore>) -> Self {
        Self::with_session(store, &Uuid::new_v4().to_string(), 1)
    }

    /// Continues an existing session, numbering after its last stored record.
    /// An unreadable store starts numbering from 1.
    pub async fn resume(store: Arc<dyn JournalStore>, session_id: &str) -> Self {
        let next = match store.last_sequence(session_id).await {
            Ok(last) => last.map_or(1, |seq| seq + 1),
            Err(err) => {
                log_warn!("could not read journal sequence for {session_id}: {err:#}");
                1
            }
        };
        Self::with_session(store, session_id, next)
    }

    fn with_session(store: Arc<dyn JournalStore>, session_id: &str, next_sequence: u64) -> Self {
        Self {
            store,
            session_id: Arc::from(session_id),
            next_sequence: Arc::new(AtomicU64::new(next_sequence)),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Appends a visit. Storage failures are logged and otherwise ignored.
    pub fn record(&self, visit: &PageVisitEvent) {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let record = JournalRecord::from_visit(&self.session_id, sequence, visit, Utc::now());
        if let Err(err) = self.store.append(record) {
            log_warn!("journal write for {} skipped: {err:#}", visit.path);
        }
    }

    /// Unexpired records for this session. Read failures yield an empty list.
    pub async fn read_recent(&self) -> Vec<JournalRecord> {
        match self.store.read_recent(&self.session_id, Utc::now()).await {
            Ok(records) => records,
            Err(err) => {
                log_warn!("journal read for {} failed: {err:#}", self.session_id);
                Vec::new()
            }
        }
    }
}
