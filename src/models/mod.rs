pub mod content;
pub mod event;
pub mod journal;

pub use content::{ContentEntity, ContentStatus};
pub use event::{ClickEvent, Milestone, PageVisitEvent, ScrollMilestoneEvent, TelemetryEvent};
pub use journal::JournalRecord;
