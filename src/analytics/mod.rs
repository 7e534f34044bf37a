pub mod aggregator;
pub mod dashboard;
pub mod types;

pub use aggregator::{summarize, top_by_views, TOP_POSTS_LIMIT};
pub use dashboard::{
    load_dashboard, ContentSource, HttpContentSource, MemoryContentSource, DASHBOARD_FETCH_LIMIT,
};
pub use types::AnalyticsSummary;
