use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio::sync::{mpsc, Notify};

/// One outbound ingestion call: a route relative to the ingestion base URL
/// and its JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestRequest {
    pub endpoint: &'static str,
    pub body: Value,
}

/// Carries a single request to the backend. Implementations report failure
/// through the `Result`; they must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, request: IngestRequest) -> Result<()>;
}

/// JSON-over-HTTP transport. No timeout is set beyond reqwest's defaults.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn deliver(&self, request: IngestRequest) -> Result<()> {
        let url = format!("{}{}", self.base_url, request.endpoint);
        let resp = self
            .client
            .post(&url)
            .json(&request.body)
            .send()
            .await
            .with_context(|| format!("POST {url} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("POST {url} returned {status}");
        }
        Ok(())
    }
}

/// Accepts everything and sends nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransport;

#[async_trait]
impl Transport for NoopTransport {
    async fn deliver(&self, _request: IngestRequest) -> Result<()> {
        Ok(())
    }
}

/// Fails every delivery and counts the attempts.
#[derive(Debug, Default)]
pub struct FailingTransport {
    attempts: AtomicUsize,
    attempted: Notify,
}

impl FailingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Resolves once at least `count` deliveries have been attempted.
    pub async fn wait_for_attempts(&self, count: usize) {
        loop {
            let notified = self.attempted.notified();
            if self.attempts() >= count {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl Transport for FailingTransport {
    async fn deliver(&self, request: IngestRequest) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.attempted.notify_waiters();
        bail!("simulated transport failure for {}", request.endpoint)
    }
}

/// Forwards every delivered request to a channel so callers can observe what
/// was sent and in which order it was started.
#[derive(Debug, Clone)]
pub struct RecordingTransport {
    sender: mpsc::UnboundedSender<IngestRequest>,
}

impl RecordingTransport {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<IngestRequest>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Arc::new(Self { sender }), receiver)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn deliver(&self, request: IngestRequest) -> Result<()> {
        self.sender
            .send(request)
            .map_err(|_| anyhow::anyhow!("recording receiver dropped"))
    }
}
