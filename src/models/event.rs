//! Engagement events produced by the trackers and the wire bodies they map to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(into = "u8", try_from = "u8")]
pub enum Milestone {
    Quarter,
    Half,
    ThreeQuarters,
    Complete,
}

impl Milestone {
    pub const ASCENDING: [Milestone; 4] = [
        Milestone::Quarter,
        Milestone::Half,
        Milestone::ThreeQuarters,
        Milestone::Complete,
    ];

    pub fn percent(self) -> u8 {
        match self {
            Milestone::Quarter => 25,
            Milestone::Half => 50,
            Milestone::ThreeQuarters => 75,
            Milestone::Complete => 100,
        }
    }
}

impl From<Milestone> for u8 {
    fn from(milestone: Milestone) -> Self {
        milestone.percent()
    }
}

impl TryFrom<u8> for Milestone {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            25 => Ok(Milestone::Quarter),
            50 => Ok(Milestone::Half),
            75 => Ok(Milestone::ThreeQuarters),
            100 => Ok(Milestone::Complete),
            other => Err(format!("unknown scroll milestone {other}")),
        }
    }
}

/// Summary of one finished visit epoch that lasted long enough to count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageVisitEvent {
    pub path: String,
    pub title: String,
    pub referrer: String,
    pub dwell_ms: u64,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScrollMilestoneEvent {
    pub path: String,
    pub milestone: Milestone,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub target_url: String,
    pub is_external: bool,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    PageVisit(PageVisitEvent),
    Scroll(ScrollMilestoneEvent),
    Click(ClickEvent),
}

impl TelemetryEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            TelemetryEvent::PageVisit(_) => "page-visit",
            TelemetryEvent::Scroll(_) => "scroll-milestone",
            TelemetryEvent::Click(_) => "click",
        }
    }

    /// Ingestion route relative to the configured base URL.
    pub fn endpoint(&self) -> &'static str {
        match self {
            TelemetryEvent::PageVisit(_) => "/navigation",
            TelemetryEvent::Scroll(_) => "/engagement/scroll",
            TelemetryEvent::Click(_) => "/engagement/click",
        }
    }

    pub fn body(&self) -> Value {
        match self {
            TelemetryEvent::PageVisit(visit) => json!({
                "page": visit.path,
                "pageTitle": visit.title,
                "referrer": visit.referrer,
                "timeSpent": visit.dwell_ms,
            }),
            TelemetryEvent::Scroll(scroll) => json!({
                "page": scroll.path,
                "milestone": scroll.milestone.percent(),
            }),
            TelemetryEvent::Click(click) => json!({
                "url": click.target_url,
            }),
        }
    }
}

impl From<PageVisitEvent> for TelemetryEvent {
    fn from(event: PageVisitEvent) -> Self {
        TelemetryEvent::PageVisit(event)
    }
}

impl From<ScrollMilestoneEvent> for TelemetryEvent {
    fn from(event: ScrollMilestoneEvent) -> Self {
        TelemetryEvent::Scroll(event)
    }
}

impl From<ClickEvent> for TelemetryEvent {
    fn from(event: ClickEvent) -> Self {
        TelemetryEvent::Click(event)
    }
}
