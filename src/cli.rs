use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};

use crate::{
    analytics::{load_dashboard, HttpContentSource},
    journal::LocalJournal,
    replay::{load_script, replay},
    tracker::PageTracker,
    TelemetryState,
};

#[derive(Debug, Parser)]
#[command(name = "pagepulse", version, about = "Engagement telemetry and analytics for the blog")]
pub struct Cli {
    /// Settings file; defaults apply when it does not exist.
    #[arg(long, global = true, default_value = "pagepulse.json")]
    pub settings: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Feed a recorded signal script through a page tracker.
    Replay {
        script: PathBuf,
        /// Continue an existing journal session instead of starting a new one.
        #[arg(long)]
        session: Option<String>,
        /// Time to leave detached sends running before the process exits.
        #[arg(long, default_value_t = 500)]
        linger_ms: u64,
    },
    /// Print the unexpired journal records of a session.
    Journal {
        #[arg(long)]
        session: String,
    },
    /// Fetch content and print the analytics summary.
    Dashboard,
}

pub async fn dispatch(command: Command, state: &TelemetryState) -> Result<()> {
    match command {
        Command::Replay {
            script,
            session,
            linger_ms,
        } => {
            let signals = load_script(&script)?;
            let journal = match session {
                Some(id) => LocalJournal::resume(Arc::clone(&state.journal_store), &id).await,
                None => LocalJournal::new(Arc::clone(&state.journal_store)),
            };
            let session_id = journal.session_id().to_string();

            let mut tracker = PageTracker::new(
                &state.settings.site_origin,
                state.ingestion_client()?,
                journal,
            );
            let report = replay(&mut tracker, &signals, Instant::now());
            drop(tracker);

            info!(
                "Replayed {} signals into session {session_id}",
                signals.len()
            );
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "sessionId": session_id,
                    "report": report,
                }))?
            );

            tokio::time::sleep(Duration::from_millis(linger_ms)).await;
        }
        Command::Journal { session } => {
            if state.settings.journal.path.is_none() {
                warn!("Journal is in-memory; configure journal.path to inspect past sessions");
            }
            let journal = LocalJournal::resume(Arc::clone(&state.journal_store), &session).await;
            let records = journal.read_recent().await;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::Dashboard => {
            let source = HttpContentSource::new(&state.settings.content_base_url);
            let summary = load_dashboard(&source).await;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_arguments_parse() {
        let cli = Cli::try_parse_from([
            "pagepulse",
            "replay",
            "visits.json",
            "--session",
            "abc",
            "--settings",
            "custom.json",
        ])
        .unwrap();

        assert_eq!(cli.settings, PathBuf::from("custom.json"));
        match cli.command {
            Command::Replay {
                script,
                session,
                linger_ms,
            } => {
                assert_eq!(script, PathBuf::from("visits.json"));
                assert_eq!(session.as_deref(), Some("abc"));
                assert_eq!(linger_ms, 500);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn journal_requires_session() {
        assert!(Cli::try_parse_from(["pagepulse", "journal"]).is_err());
    }
}
