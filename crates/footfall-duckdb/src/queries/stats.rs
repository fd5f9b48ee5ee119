use chrono::{DateTime, Utc};

use footfall_core::error::VisitError;
use footfall_core::visits::{VisitStats, Window, WindowStats};

use crate::backend::{missing_conn, sql_timestamp};
use crate::DuckDbBackend;

impl DuckDbBackend {
    /// Page views and unique visitors for today, 7 days, 30 days and all time.
    ///
    /// Each window is its own `COUNT` query, but all four run against the same
    /// `now` while the connection lock is held. Inserts take the same lock, so
    /// the results nest: `all >= d30 >= d7 >= today`.
    pub async fn window_stats(&self, now: DateTime<Utc>) -> Result<VisitStats, VisitError> {
        let guard = self.ready_conn().await?;
        let conn = guard.as_ref().ok_or_else(missing_conn)?;

        let mut stats = VisitStats::default();
        for window in Window::ALL {
            let counts = query_window(conn, window.start(now))?;
            stats.set(window, counts);
        }
        Ok(stats)
    }
}

fn query_window(
    conn: &duckdb::Connection,
    start: Option<chrono::NaiveDateTime>,
) -> Result<WindowStats, VisitError> {
    let map_row = |row: &duckdb::Row<'_>| -> duckdb::Result<WindowStats> {
        Ok(WindowStats {
            page_views: row.get(0)?,
            unique_visitors: row.get(1)?,
        })
    };

    let counts = match start {
        Some(start) => conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT visitor_id) FROM visits \
             WHERE ts >= CAST(?1 AS TIMESTAMP)",
            duckdb::params![sql_timestamp(&start)],
            map_row,
        ),
        None => conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT visitor_id) FROM visits",
            [],
            map_row,
        ),
    };
    counts.map_err(|e| VisitError::Storage(e.into()))
}
