use async_trait::async_trait;
use chrono::{DateTime, Utc};

use footfall_core::error::VisitError;
use footfall_core::visits::{PendingVisit, SchemaStatus, SeriesPoint, VisitBackend, VisitStats};

use crate::DuckDbBackend;

#[async_trait]
impl VisitBackend for DuckDbBackend {
    async fn ensure_schema(&self) -> Result<(), VisitError> {
        DuckDbBackend::ensure_schema(self).await
    }

    fn schema_status(&self) -> SchemaStatus {
        self.status()
    }

    async fn insert_visits(&self, visits: &[PendingVisit]) -> Result<(), VisitError> {
        DuckDbBackend::insert_visits(self, visits).await
    }

    async fn window_stats(&self, now: DateTime<Utc>) -> Result<VisitStats, VisitError> {
        DuckDbBackend::window_stats(self, now).await
    }

    async fn daily_series(
        &self,
        now: DateTime<Utc>,
        days: u32,
    ) -> Result<Vec<SeriesPoint>, VisitError> {
        DuckDbBackend::daily_series(self, now, days).await
    }
}
