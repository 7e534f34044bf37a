use crate::models::{ContentEntity, ContentStatus};

use super::types::AnalyticsSummary;

pub const TOP_POSTS_LIMIT: usize = 10;

pub fn summarize(entities: &[ContentEntity]) -> AnalyticsSummary {
    let total_views: u64 = entities.iter().map(|entity| entity.views).sum();
    let published_posts = entities
        .iter()
        .filter(|entity| entity.status == ContentStatus::Published)
        .count() as u64;
    let draft_posts = entities
        .iter()
        .filter(|entity| entity.status == ContentStatus::Draft)
        .count() as u64;

    // Drafts count toward total_views but not toward the divisor.
    let average_views = if published_posts == 0 {
        0
    } else {
        (total_views as f64 / published_posts as f64).round() as u64
    };

    AnalyticsSummary {
        total_views,
        total_posts: entities.len() as u64,
        published_posts,
        draft_posts,
        average_views,
        top_posts: top_by_views(entities, TOP_POSTS_LIMIT),
    }
}

/// Highest-viewed entities first. `sort_by` is stable, so equal view counts
/// keep their input order.
pub fn top_by_views(entities: &[ContentEntity], limit: usize) -> Vec<ContentEntity> {
    let mut ranked = entities.to_vec();
    ranked.sort_by(|a, b| b.views.cmp(&a.views));
    ranked.truncate(limit);
    ranked
}
