use std::time::Instant;

use url::Url;

use crate::{
    ingest::IngestionClient,
    journal::LocalJournal,
    models::{ClickEvent, Milestone, ScrollMilestoneEvent},
};

use super::{
    click::{ClickRelay, ClickSample},
    scroll::{ScrollMilestoneTracker, ScrollSample},
    visit::{EpochEnd, PageContext, VisitTimer, WallClock},
};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "pagepulse::tracker";

use crate::{log_debug, log_info};

/// Engagement tracking for one page lifetime.
///
/// The routing layer calls [`PageTracker::route_changed`] on every navigation
/// and [`PageTracker::teardown`] when the page goes away; those two calls are
/// the only epoch boundaries. Scroll and click samples in between are
/// attributed to the open epoch. All outbound work is handed off without
/// waiting, so none of these methods can be held up by storage or network.
pub struct PageTracker {
    visit: VisitTimer,
    scroll: ScrollMilestoneTracker,
    clicks: ClickRelay,
    site: Option<Url>,
    ingest: IngestionClient,
    journal: LocalJournal,
}

impl PageTracker {
    pub fn new(site_origin: &str, ingest: IngestionClient, journal: LocalJournal) -> Self {
        Self {
            visit: VisitTimer::new(),
            scroll: ScrollMilestoneTracker::new(),
            clicks: ClickRelay::new(site_origin),
            site: Url::parse(site_origin).ok(),
            ingest,
            journal,
        }
    }

    /// Stamps events against `clock` instead of the system clock at creation.
    pub fn with_clock(mut self, clock: WallClock) -> Self {
        self.visit = VisitTimer::with_clock(clock);
        self
    }

    pub fn journal(&self) -> &LocalJournal {
        &self.journal
    }

    pub fn current_page(&self) -> Option<&PageContext> {
        self.visit.current().map(|epoch| epoch.page())
    }

    /// Ends the open visit and starts one for `page`.
    pub fn route_changed(&mut self, page: PageContext, now: Instant) -> Option<EpochEnd> {
        log_debug!("route changed to {}", page.path);
        self.boundary(Some(page), now)
    }

    /// Ends the open visit without starting another.
    pub fn teardown(&mut self, now: Instant) -> Option<EpochEnd> {
        self.boundary(None, now)
    }

    fn boundary(&mut self, next: Option<PageContext>, now: Instant) -> Option<EpochEnd> {
        let ended = self.visit.transition(next, now);
        self.scroll.reset();

        match &ended {
            Some(EpochEnd::Counted(visit)) => {
                self.journal.record(visit);
                self.ingest.send(visit.clone());
            }
            Some(EpochEnd::Discarded { path, dwell_ms }) => {
                log_debug!("discarded {dwell_ms}ms visit to {path}");
            }
            None => {}
        }

        ended
    }

    /// Samples outside an open visit are ignored.
    pub fn on_scroll(&mut self, sample: &ScrollSample, now: Instant) -> Option<Milestone> {
        let path = self.visit.current()?.page().path.clone();
        let milestone = self.scroll.observe(sample)?;

        log_info!("{path} reached {}% scroll depth", milestone.percent());
        self.ingest.send(ScrollMilestoneEvent {
            path,
            milestone,
            observed_at: self.visit.clock().at(now),
        });
        Some(milestone)
    }

    pub fn on_click(&self, click: &ClickSample, now: Instant) -> Option<ClickEvent> {
        let page_url = match (&self.site, self.current_page()) {
            (Some(site), Some(page)) => site.join(&page.path).ok(),
            (Some(site), None) => Some(site.clone()),
            (None, _) => None,
        };

        let event = self
            .clicks
            .classify(click, page_url.as_ref(), self.visit.clock().at(now))?;
        self.ingest.send(event.clone());
        Some(event)
    }
}

impl Drop for PageTracker {
    fn drop(&mut self) {
        if self.visit.current().is_some() {
            self.teardown(Instant::now());
        }
    }
}
