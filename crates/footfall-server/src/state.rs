use std::sync::Arc;

use tracing::info;

use footfall_core::visits::VisitBackend;
use footfall_duckdb::DuckDbBackend;

use crate::{config::Config, recorder::VisitRecorder};

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
pub struct AppState {
    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,

    /// Visit store. `None` when no database is configured, which switches off
    /// tracking and the admin aggregates.
    pub visits: Option<Arc<dyn VisitBackend>>,

    /// Buffered writer feeding `visits`.
    pub recorder: VisitRecorder,
}

impl AppState {
    /// Build state from `config`, preparing a DuckDB store when
    /// `database_url` is set. The database is not opened until first use.
    pub fn new(config: Config) -> Self {
        let visits = config.database_url.as_deref().map(|location| {
            Arc::new(DuckDbBackend::new(location, config.duckdb_memory_limit.clone()))
                as Arc<dyn VisitBackend>
        });
        Self::with_backend(config, visits)
    }

    /// Build state around an explicit backend.
    pub fn with_backend(config: Config, visits: Option<Arc<dyn VisitBackend>>) -> Self {
        let recorder = VisitRecorder::new(config.flush_threshold, config.buffer_capacity);
        Self {
            config: Arc::new(config),
            visits,
            recorder,
        }
    }

    pub fn visits_enabled(&self) -> bool {
        self.visits.is_some()
    }

    /// Queue a page view. Never waits on storage; a no-op when tracking is
    /// disabled.
    pub async fn record_visit(&self, visitor_id: String, path: &str) {
        if self.visits.is_some() {
            self.recorder.record(visitor_id, path).await;
        }
    }

    /// Write all pending visits to the store.
    pub async fn flush_visits(&self) {
        if let Some(visits) = &self.visits {
            self.recorder.flush(visits.as_ref()).await;
        }
    }

    /// Background loop: flush on a fixed interval, or early once the buffer
    /// crosses the flush threshold.
    ///
    /// Spawned as a `tokio::spawn` task in `main.rs`. Runs until the process
    /// exits; returns immediately when tracking is disabled.
    pub async fn run_visit_flush_loop(self: Arc<Self>) {
        if self.visits.is_none() {
            info!("Visit tracking disabled; flush loop not started");
            return;
        }
        let mut ticker = tokio::time::interval(self.config.flush_interval());
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.recorder.wait_for_threshold() => {}
            }
            self.flush_visits().await;
        }
    }
}
