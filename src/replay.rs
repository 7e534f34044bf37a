//! Drives a [`PageTracker`] from a recorded signal script.
//!
//! A script is a JSON array of signals, each stamped with its offset in
//! milliseconds from the start of the recording:
//!
//! ```json
//! [
//!   { "type": "navigate", "atMs": 0, "path": "/", "title": "Home" },
//!   { "type": "scroll", "atMs": 1200, "scrollTop": 900, "viewportHeight": 800, "documentHeight": 3000 },
//!   { "type": "click", "atMs": 2500, "path": [{ "tag": "a", "href": "https://docs.rs/" }] },
//!   { "type": "unload", "atMs": 4000 }
//! ]
//! ```

use std::{
    path::Path,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::tracker::{ClickSample, ElementNode, EpochEnd, PageContext, PageTracker, ScrollSample};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BrowserSignal {
    #[serde(rename_all = "camelCase")]
    Navigate {
        at_ms: u64,
        #[serde(flatten)]
        page: PageContext,
    },
    #[serde(rename_all = "camelCase")]
    Scroll {
        at_ms: u64,
        #[serde(flatten)]
        sample: ScrollSample,
    },
    #[serde(rename_all = "camelCase")]
    Click { at_ms: u64, path: Vec<ElementNode> },
    #[serde(rename_all = "camelCase")]
    Unload { at_ms: u64 },
}

impl BrowserSignal {
    pub fn at_ms(&self) -> u64 {
        match self {
            BrowserSignal::Navigate { at_ms, .. }
            | BrowserSignal::Scroll { at_ms, .. }
            | BrowserSignal::Click { at_ms, .. }
            | BrowserSignal::Unload { at_ms } => *at_ms,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub visits_counted: usize,
    pub visits_discarded: usize,
    pub scroll_events: usize,
    pub click_events: usize,
}

impl ReplayReport {
    fn tally(&mut self, end: Option<EpochEnd>) {
        match end {
            Some(EpochEnd::Counted(_)) => self.visits_counted += 1,
            Some(EpochEnd::Discarded { .. }) => self.visits_discarded += 1,
            None => {}
        }
    }
}

pub fn load_script(path: &Path) -> Result<Vec<BrowserSignal>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read replay script {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("invalid replay script {}", path.display()))
}

/// Feeds `signals` to `tracker` in timestamp order against a virtual clock
/// anchored at `origin`. An open visit is closed at the last signal's time.
pub fn replay(tracker: &mut PageTracker, signals: &[BrowserSignal], origin: Instant) -> ReplayReport {
    let mut ordered: Vec<&BrowserSignal> = signals.iter().collect();
    ordered.sort_by_key(|signal| signal.at_ms());

    let mut report = ReplayReport::default();
    let mut last_at = origin;

    for signal in ordered {
        let at = origin + Duration::from_millis(signal.at_ms());
        last_at = at;
        match signal {
            BrowserSignal::Navigate { page, .. } => {
                report.tally(tracker.route_changed(page.clone(), at));
            }
            BrowserSignal::Scroll { sample, .. } => {
                if tracker.on_scroll(sample, at).is_some() {
                    report.scroll_events += 1;
                }
            }
            BrowserSignal::Click { path, .. } => {
                if tracker
                    .on_click(&ClickSample::new(path.clone()), at)
                    .is_some()
                {
                    report.click_events += 1;
                }
            }
            BrowserSignal::Unload { .. } => {
                report.tally(tracker.teardown(at));
            }
        }
    }

    report.tally(tracker.teardown(last_at));
    report
}
