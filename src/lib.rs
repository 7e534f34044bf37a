pub mod analytics;
pub mod cli;
mod db;
pub mod ingest;
pub mod journal;
pub mod models;
pub mod pagination;
pub mod replay;
pub mod settings;
pub mod tracker;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use ingest::{HttpTransport, IngestionClient};
use journal::{JournalStore, MemoryJournal, SqliteJournal};
use log::info;
use settings::{debug_mode, SettingsStore, TelemetrySettings};

/// Long-lived pieces shared by every command.
pub struct TelemetryState {
    pub settings: TelemetrySettings,
    pub journal_store: Arc<dyn JournalStore>,
    transport: Arc<HttpTransport>,
}

impl TelemetryState {
    pub fn new(settings: TelemetrySettings) -> Result<Self> {
        let policy = settings.journal.policy();
        let journal_store: Arc<dyn JournalStore> = match &settings.journal.path {
            Some(path) => Arc::new(SqliteJournal::open(path.clone(), policy)?),
            None => Arc::new(MemoryJournal::new(policy)),
        };

        Ok(Self {
            transport: Arc::new(HttpTransport::new(&settings.ingest_base_url)),
            settings,
            journal_store,
        })
    }

    /// Must be called from inside the runtime the sends should run on.
    pub fn ingestion_client(&self) -> Result<IngestionClient> {
        let client = IngestionClient::new(self.transport.clone())?;
        Ok(if self.settings.enabled {
            client
        } else {
            client.disabled()
        })
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins when set.
    let default_level = if debug_mode() { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let settings_store = SettingsStore::new(cli.settings.clone())?;
    let settings = settings_store.telemetry()?;
    info!(
        "pagepulse starting (settings: {}, ingest: {}, telemetry {})",
        settings_store.path().display(),
        settings.ingest_base_url,
        if settings.enabled { "on" } else { "off" }
    );

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(async move {
        let state = TelemetryState::new(settings)?;
        cli::dispatch(cli.command, &state).await
    })
}
