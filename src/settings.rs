use anyhow::{anyhow, Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::journal::{JournalPolicy, DEFAULT_CAPACITY, DEFAULT_TTL_SECS};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct JournalSettings {
    pub capacity: usize,
    pub ttl_secs: i64,
    /// SQLite file for the journal; `None` keeps it in memory.
    pub path: Option<PathBuf>,
}

impl Default for JournalSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl_secs: DEFAULT_TTL_SECS,
            path: None,
        }
    }
}

impl JournalSettings {
    pub fn policy(&self) -> JournalPolicy {
        JournalPolicy::new(self.capacity, Duration::seconds(self.ttl_secs.max(0)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TelemetrySettings {
    pub enabled: bool,
    pub ingest_base_url: String,
    pub content_base_url: String,
    pub site_origin: String,
    pub journal: JournalSettings,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ingest_base_url: "http://localhost:5000/api".into(),
            content_base_url: "http://localhost:5000/api".into(),
            site_origin: "http://localhost:3000".into(),
            journal: JournalSettings::default(),
        }
    }
}

impl TelemetrySettings {
    /// Environment overrides applied on top of the file contents.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("PAGEPULSE_INGEST_URL") {
            self.ingest_base_url = url;
        }
        if let Some(url) = lookup("PAGEPULSE_CONTENT_URL") {
            self.content_base_url = url;
        }
        if let Some(origin) = lookup("PAGEPULSE_SITE_ORIGIN") {
            self.site_origin = origin;
        }
        if let Some(flag) = lookup("PAGEPULSE_TELEMETRY") {
            self.enabled = !(flag == "0" || flag.eq_ignore_ascii_case("false"));
        }
    }
}

/// True when `PAGEPULSE_DEBUG` asks for verbose logging.
pub fn debug_mode() -> bool {
    std::env::var("PAGEPULSE_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<TelemetrySettings>,
}

impl SettingsStore {
    /// A missing or unparsable file yields defaults; env overrides always apply.
    pub fn new(path: PathBuf) -> Result<Self> {
        let mut data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("Ignoring malformed settings in {}: {err}", path.display());
                TelemetrySettings::default()
            })
        } else {
            TelemetrySettings::default()
        };
        data.apply_env(|key| std::env::var(key).ok());

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn telemetry(&self) -> Result<TelemetrySettings> {
        self.data
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| anyhow!("settings lock poisoned"))
    }

    pub fn update(&self, settings: TelemetrySettings) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        *guard = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &TelemetrySettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let parsed: TelemetrySettings =
            serde_json::from_str(r#"{ "siteOrigin": "https://blog.example" }"#).unwrap();
        assert_eq!(parsed.site_origin, "https://blog.example");
        assert!(parsed.enabled);
        assert_eq!(parsed.journal, JournalSettings::default());
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PAGEPULSE_INGEST_URL", "https://api.blog.example"),
            ("PAGEPULSE_TELEMETRY", "false"),
        ]);
        let mut settings = TelemetrySettings::default();
        settings.apply_env(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(settings.ingest_base_url, "https://api.blog.example");
        assert!(!settings.enabled);
        assert_eq!(settings.site_origin, TelemetrySettings::default().site_origin);
    }

    #[test]
    fn update_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let store = SettingsStore::new(path.clone()).unwrap();
        let mut settings = store.telemetry().unwrap();
        settings.journal.capacity = 5;
        store.update(settings).unwrap();

        let reloaded = SettingsStore::new(path).unwrap();
        assert_eq!(reloaded.telemetry().unwrap().journal.capacity, 5);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.telemetry().unwrap().journal.capacity, DEFAULT_CAPACITY);
    }
}
