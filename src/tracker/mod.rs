pub mod click;
pub mod page;
pub mod scroll;
pub mod visit;

pub use click::{ClickRelay, ClickSample, ElementNode, ALWAYS_TRACK_ATTRIBUTE};
pub use page::PageTracker;
pub use scroll::{ScrollMilestoneTracker, ScrollSample};
pub use visit::{EpochEnd, PageContext, VisitEpoch, VisitTimer, WallClock, MIN_DWELL};
