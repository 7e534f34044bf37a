use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::PageVisitEvent;

/// Visits shorter than this are treated as accidental navigation.
pub const MIN_DWELL: Duration = Duration::from_millis(1000);

/// What the routing layer knows about the page being entered.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    pub path: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub referrer: String,
}

impl PageContext {
    pub fn new(path: &str, title: &str, referrer: &str) -> Self {
        Self {
            path: path.to_string(),
            title: title.to_string(),
            referrer: referrer.to_string(),
        }
    }
}

/// Pins a monotonic reading to a wall-clock time so later `Instant`s can be
/// stamped without reading the system clock again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallClock {
    instant: Instant,
    wall: DateTime<Utc>,
}

impl WallClock {
    pub fn now() -> Self {
        Self::anchored(Instant::now(), Utc::now())
    }

    pub fn anchored(instant: Instant, wall: DateTime<Utc>) -> Self {
        Self { instant, wall }
    }

    pub fn at(&self, now: Instant) -> DateTime<Utc> {
        let to_chrono =
            |offset: Duration| chrono::Duration::from_std(offset).unwrap_or_else(|_| chrono::Duration::zero());
        match now.checked_duration_since(self.instant) {
            Some(ahead) => self.wall + to_chrono(ahead),
            None => self.wall - to_chrono(self.instant.saturating_duration_since(now)),
        }
    }
}

/// A single page view in progress. Everything is captured at start; the path
/// is not re-read later even if the route changes under it.
#[derive(Debug, Clone)]
pub struct VisitEpoch {
    page: PageContext,
    started_at: DateTime<Utc>,
    anchor: Instant,
    clock: WallClock,
}

/// Result of closing an epoch.
#[derive(Debug, Clone, PartialEq)]
pub enum EpochEnd {
    Counted(PageVisitEvent),
    Discarded { path: String, dwell_ms: u64 },
}

impl VisitEpoch {
    pub fn start(page: PageContext, now: Instant, clock: WallClock) -> Self {
        Self {
            page,
            started_at: clock.at(now),
            anchor: now,
            clock,
        }
    }

    pub fn page(&self) -> &PageContext {
        &self.page
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed_ms(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.anchor).as_millis() as u64
    }

    /// Consumes the epoch; it can be evaluated only once.
    pub fn finish(self, now: Instant) -> EpochEnd {
        let dwell = now.saturating_duration_since(self.anchor);
        let dwell_ms = dwell.as_millis() as u64;
        if dwell < MIN_DWELL {
            return EpochEnd::Discarded {
                path: self.page.path,
                dwell_ms,
            };
        }

        EpochEnd::Counted(PageVisitEvent {
            path: self.page.path,
            title: self.page.title,
            referrer: self.page.referrer,
            dwell_ms,
            observed_at: self.clock.at(now),
        })
    }
}

/// Holds at most one open epoch. `transition` is the only way epochs begin or
/// end, so two epochs can never overlap.
#[derive(Debug)]
pub struct VisitTimer {
    current: Option<VisitEpoch>,
    clock: WallClock,
}

impl Default for VisitTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl VisitTimer {
    pub fn new() -> Self {
        Self::with_clock(WallClock::now())
    }

    pub fn with_clock(clock: WallClock) -> Self {
        Self {
            current: None,
            clock,
        }
    }

    pub fn clock(&self) -> WallClock {
        self.clock
    }

    pub fn current(&self) -> Option<&VisitEpoch> {
        self.current.as_ref()
    }

    /// Closes the open epoch (if any) and opens one for `next` (if any).
    pub fn transition(&mut self, next: Option<PageContext>, now: Instant) -> Option<EpochEnd> {
        let ended = self.current.take().map(|epoch| epoch.finish(now));
        let clock = self.clock;
        self.current = next.map(|page| VisitEpoch::start(page, now, clock));
        ended
    }
}
