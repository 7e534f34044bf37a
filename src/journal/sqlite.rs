use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::{
    db::{
        helpers::{format_datetime, parse_datetime, to_i64, to_u64},
        Database,
    },
    models::JournalRecord,
};

use super::{JournalPolicy, JournalStore};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "pagepulse::journal";

use crate::log_warn;

fn row_to_record(row: &Row) -> Result<JournalRecord> {
    let sequence: i64 = row.get("sequence")?;
    let dwell_ms: i64 = row.get("dwell_ms")?;
    let observed_at: String = row.get("observed_at")?;
    let recorded_at: String = row.get("recorded_at")?;

    Ok(JournalRecord {
        session_id: row.get("session_id")?,
        sequence: to_u64(sequence, "sequence")?,
        path: row.get("path")?,
        title: row.get("title")?,
        referrer: row.get("referrer")?,
        dwell_ms: to_u64(dwell_ms, "dwell_ms")?,
        observed_at: parse_datetime(&observed_at, "observed_at")?,
        recorded_at: parse_datetime(&recorded_at, "recorded_at")?,
    })
}

fn log_append_failure(err: &anyhow::Error) {
    log_warn!("journal append failed: {err:#}");
}

/// Journal persisted in a SQLite file. Appends are queued on the database
/// thread and not awaited; expired and over-capacity rows are pruned in the
/// same task as the insert.
#[derive(Clone)]
pub struct SqliteJournal {
    db: Database,
    policy: JournalPolicy,
}

impl SqliteJournal {
    pub fn open(path: PathBuf, policy: JournalPolicy) -> Result<Self> {
        Ok(Self {
            db: Database::new(path)?,
            policy,
        })
    }
}

#[async_trait]
impl JournalStore for SqliteJournal {
    fn append(&self, record: JournalRecord) -> Result<()> {
        let cutoff = format_datetime(&self.policy.cutoff(record.recorded_at));
        let capacity = to_i64(self.policy.capacity as u64)?;

        self.db.execute_detached(
            move |conn| {
                let tx = conn.transaction()?;

                tx.execute(
                    "INSERT INTO journal_records
                     (session_id, sequence, path, title, referrer, dwell_ms, observed_at, recorded_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        record.session_id,
                        to_i64(record.sequence)?,
                        record.path,
                        record.title,
                        record.referrer,
                        to_i64(record.dwell_ms)?,
                        format_datetime(&record.observed_at),
                        format_datetime(&record.recorded_at),
                    ],
                )?;

                tx.execute(
                    "DELETE FROM journal_records WHERE recorded_at <= ?1",
                    params![cutoff],
                )?;

                // Oldest rows beyond capacity go first.
                tx.execute(
                    "DELETE FROM journal_records
                     WHERE session_id = ?1
                       AND id NOT IN (
                           SELECT id FROM journal_records
                           WHERE session_id = ?1
                           ORDER BY id DESC
                           LIMIT ?2
                       )",
                    params![record.session_id, capacity],
                )?;

                tx.commit()?;
                Ok(())
            },
            log_append_failure,
        )
    }

    async fn read_recent(&self, session_id: &str, now: DateTime<Utc>) -> Result<Vec<JournalRecord>> {
        let session_id = session_id.to_string();
        let cutoff = format_datetime(&self.policy.cutoff(now));
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT session_id, sequence, path, title, referrer, dwell_ms, observed_at, recorded_at
                     FROM journal_records
                     WHERE session_id = ?1 AND recorded_at > ?2
                     ORDER BY id ASC",
                )?;

                let mut rows = stmt.query(params![session_id, cutoff])?;
                let mut records = Vec::new();
                while let Some(row) = rows.next()? {
                    records.push(row_to_record(row)?);
                }

                Ok(records)
            })
            .await
    }

    async fn last_sequence(&self, session_id: &str) -> Result<Option<u64>> {
        let session_id = session_id.to_string();
        self.db
            .execute(move |conn| {
                let last: Option<i64> = conn
                    .query_row(
                        "SELECT MAX(sequence) FROM journal_records WHERE session_id = ?1",
                        params![session_id],
                        |row| row.get::<_, Option<i64>>(0),
                    )
                    .optional()?
                    .flatten();
                last.map(|seq| to_u64(seq, "sequence")).transpose()
            })
            .await
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
            path: format!("/posts/{sequence}"),
            title: format!("Post {sequence}"),
            referrer: "https://search.example/".into(),
            dwell_ms: 2_500,
            observed_at: recorded_at,
            recorded_at,
        }
    }

    #[tokio::test]
    async fn appended_records_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.sqlite3");
        let now = Utc::now();

        {
            let store = SqliteJournal::open(path.clone(), JournalPolicy::default()).unwrap();
            store.append(record("s", 1, now)).unwrap();
            store.append(record("s", 2, now)).unwrap();
            assert_eq!(store.read_recent("s", now).await.unwrap().len(), 2);
        }

        let reopened = SqliteJournal::open(path, JournalPolicy::default()).unwrap();
        let records = reopened.read_recent("s", now).await.unwrap();
        assert_eq!(records[1].path, "/posts/2");
        assert_eq!(records[1].dwell_ms, 2_500);
        assert_eq!(reopened.last_sequence("s").await.unwrap(), Some(2));
        assert_eq!(reopened.last_sequence("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn capacity_is_enforced_per_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteJournal::open(
            dir.path().join("journal.sqlite3"),
            JournalPolicy::new(2, Duration::hours(1)),
        )
        .unwrap();
        let now = Utc::now();

        for seq in 1..=4 {
            store.append(record("a", seq, now)).unwrap();
        }
        store.append(record("b", 1, now)).unwrap();

        let kept: Vec<u64> = store
            .read_recent("a", now)
            .await
            .unwrap()
            .iter()
            .map(|r| r.sequence)
            .collect();
        assert_eq!(kept, vec![3, 4]);
        assert_eq!(store.read_recent("b", now).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_append_is_logged_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            SqliteJournal::open(dir.path().join("journal.sqlite3"), JournalPolicy::default())
                .unwrap();
        let now = Utc::now();

        // Queuing succeeds; the conversion fails on the worker thread.
        store.append(record("s", u64::MAX, now)).unwrap();
        store.append(record("s", 7, now)).unwrap();

        let records = store.read_recent("s", now).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sequence, 7);
    }

    #[tokio::test]
    async fn expired_records_are_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteJournal::open(
            dir.path().join("journal.sqlite3"),
            JournalPolicy::new(10, Duration::minutes(30)),
        )
        .unwrap();
        let now = Utc::now();

        store.append(record("s", 1, now - Duration::hours(2))).unwrap();
        store.append(record("s", 2, now)).unwrap();

        let records = store.read_recent("s", now).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sequence, 2);
    }
}
