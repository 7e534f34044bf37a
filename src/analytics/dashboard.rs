use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::{
    models::ContentEntity,
    pagination::{paginate, Paginated, PaginationQuery},
};

use super::{aggregator::summarize, types::AnalyticsSummary};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "pagepulse::analytics";

use crate::{log_info, log_warn};

/// Large enough to stand in for "all posts"; the list endpoints cap `limit` here.
pub const DASHBOARD_FETCH_LIMIT: u32 = 100;

/// A paged list endpoint for content entities.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn list(&self, query: PaginationQuery) -> Result<Paginated<ContentEntity>>;
}

/// Reads `GET {base_url}/posts?page=..&limit=..`.
#[derive(Clone)]
pub struct HttpContentSource {
    client: Client,
    list_url: String,
}

impl HttpContentSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            list_url: format!("{}/posts", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn list(&self, query: PaginationQuery) -> Result<Paginated<ContentEntity>> {
        let resp = self
            .client
            .get(&self.list_url)
            .query(&query.query_pairs())
            .send()
            .await
            .with_context(|| format!("content list request to {} failed", self.list_url))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("content list {} returned {status}", self.list_url);
        }

        resp.json::<Paginated<ContentEntity>>()
            .await
            .context("content list response parse failed")
    }
}

/// Fixed in-memory list, paged the same way the backend pages it.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentSource {
    entities: Vec<ContentEntity>,
}

impl MemoryContentSource {
    pub fn new(entities: Vec<ContentEntity>) -> Self {
        Self { entities }
    }
}

#[async_trait]
impl ContentSource for MemoryContentSource {
    async fn list(&self, query: PaginationQuery) -> Result<Paginated<ContentEntity>> {
        Ok(paginate(&self.entities, query))
    }
}

/// Builds the admin dashboard summary. A failed fetch is logged and yields
/// the zeroed summary; it is never returned to the caller.
pub async fn load_dashboard(source: &dyn ContentSource) -> AnalyticsSummary {
    let query = PaginationQuery::first_page(DASHBOARD_FETCH_LIMIT);
    match source.list(query).await {
        Ok(page) => {
            if page.pagination.has_next_page {
                log_info!(
                    "dashboard covers {} of {} posts",
                    page.data.len(),
                    page.pagination.total
                );
            }
            summarize(&page.data)
        }
        Err(err) => {
            log_warn!("dashboard fetch failed, showing empty summary: {err:#}");
            AnalyticsSummary::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentStatus;

    struct BrokenSource;

    #[async_trait]
    impl ContentSource for BrokenSource {
        async fn list(&self, _query: PaginationQuery) -> Result<Paginated<ContentEntity>> {
            bail!("connection refused")
        }
    }

    fn post(id: usize, views: u64) -> ContentEntity {
        ContentEntity {
            id: format!("post-{id}"),
            title: format!("Post {id}"),
            slug: format!("post-{id}"),
            status: ContentStatus::Published,
            views,
        }
    }

    #[tokio::test]
    async fn fetch_failure_falls_back_to_zeroed_summary() {
        let summary = load_dashboard(&BrokenSource).await;
        assert_eq!(summary, AnalyticsSummary::default());
    }

    #[tokio::test]
    async fn summary_covers_first_hundred_entities() {
        let source = MemoryContentSource::new((0..130).map(|i| post(i, 1)).collect());

        let summary = load_dashboard(&source).await;
        assert_eq!(summary.total_posts, 100);
        assert_eq!(summary.total_views, 100);
        assert_eq!(summary.average_views, 1);
    }

    #[tokio::test]
    async fn unreachable_http_source_is_absorbed() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = HttpContentSource::new(&format!("http://{addr}/api/"));
        let summary = load_dashboard(&source).await;
        assert_eq!(summary.top_posts.len(), 0);
        assert_eq!(summary.total_views, 0);
    }
}
