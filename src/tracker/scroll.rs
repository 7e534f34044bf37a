use serde::{Deserialize, Serialize};

use crate::models::Milestone;

/// One scroll observation, in CSS pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScrollSample {
    pub scroll_top: f64,
    pub viewport_height: f64,
    pub document_height: f64,
}

impl ScrollSample {
    /// Percentage of the document that has been in view, rounded. `None` when
    /// the document has no height to measure against.
    pub fn depth(&self) -> Option<u32> {
        if !(self.document_height > 0.0) {
            return None;
        }
        let ratio = (self.scroll_top + self.viewport_height) / self.document_height;
        let depth = (ratio * 100.0).round();
        Some(if depth.is_finite() && depth > 0.0 { depth as u32 } else { 0 })
    }
}

/// Per-visit scroll milestone gate.
///
/// A single `ever_tracked` flag allows one emission, and only dropping back
/// under 25% re-arms it. Intermediate milestones reached while the flag is set
/// are never reported. `max_depth_seen` records the deepest point of the
/// visit, but the milestone windows are tested against `window_depth`, the
/// value it held when the visit began, so a re-armed gate fires 25 again
/// however deep the reader has gone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollMilestoneTracker {
    ever_tracked: bool,
    max_depth_seen: u32,
    window_depth: u32,
}

impl ScrollMilestoneTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to the epoch-start state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn max_depth_seen(&self) -> u32 {
        self.max_depth_seen
    }

    pub fn observe(&mut self, sample: &ScrollSample) -> Option<Milestone> {
        sample.depth().and_then(|depth| self.observe_depth(depth))
    }

    pub fn observe_depth(&mut self, depth: u32) -> Option<Milestone> {
        self.max_depth_seen = self.max_depth_seen.max(depth);

        let mut emitted = None;
        if !self.ever_tracked {
            let max = self.window_depth;
            emitted = Milestone::ASCENDING.into_iter().find(|milestone| match milestone {
                Milestone::Quarter => depth >= 25 && max < 50,
                Milestone::Half => depth >= 50 && max < 75,
                Milestone::ThreeQuarters => depth >= 75 && max < 100,
                Milestone::Complete => depth >= 100,
            });
            if emitted.is_some() {
                self.ever_tracked = true;
            }
        }

        if depth < 25 {
            self.ever_tracked = false;
        }

        emitted
    }
}
