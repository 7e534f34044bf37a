use serde::{Deserialize, Serialize};

use crate::models::ContentEntity;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_views: u64,
    pub total_posts: u64,
    pub published_posts: u64,
    pub draft_posts: u64,
    pub average_views: u64,
    pub top_posts: Vec<ContentEntity>,
}
