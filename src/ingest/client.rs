use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::runtime::Handle;

use crate::models::TelemetryEvent;

use super::transport::{IngestRequest, Transport};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "pagepulse::ingest";

use crate::{log_debug, log_warn};

/// Fire-and-forget event shipper.
///
/// Every `send` spawns its own task on the runtime captured at construction
/// and drops the `JoinHandle`. Nothing joins, retries or cancels these tasks:
/// telemetry must never hold up the caller, so delivery is at-most-once and a
/// send started just before navigation may finish after it.
#[derive(Clone)]
pub struct IngestionClient {
    transport: Arc<dyn Transport>,
    runtime: Handle,
    enabled: bool,
}

impl IngestionClient {
    /// Must be called from inside a tokio runtime.
    pub fn new(transport: Arc<dyn Transport>) -> Result<Self> {
        let runtime = Handle::try_current()
            .context("ingestion client requires a running tokio runtime")?;
        Ok(Self::with_runtime(transport, runtime))
    }

    pub fn with_runtime(transport: Arc<dyn Transport>, runtime: Handle) -> Self {
        Self {
            transport,
            runtime,
            enabled: true,
        }
    }

    /// A disabled client drops events without spawning anything.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn send(&self, event: impl Into<TelemetryEvent>) {
        if !self.enabled {
            return;
        }

        let event = event.into();
        let kind = event.kind();
        let request = IngestRequest {
            endpoint: event.endpoint(),
            body: event.body(),
        };
        let transport = Arc::clone(&self.transport);

        // Detached on purpose; see the type docs.
        let _ = self.runtime.spawn(async move {
            let endpoint = request.endpoint;
            match transport.deliver(request).await {
                Ok(()) => log_debug!("delivered {kind} event to {endpoint}"),
                Err(err) => log_warn!("dropped {kind} event for {endpoint}: {err:#}"),
            }
        });
    }
}
