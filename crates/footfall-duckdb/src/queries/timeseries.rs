use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use footfall_core::error::VisitError;
use footfall_core::visits::{series_days, SeriesPoint, MAX_SERIES_DAYS};

use crate::backend::{missing_conn, sql_timestamp};
use crate::DuckDbBackend;

impl DuckDbBackend {
    /// Daily page views and unique visitors for the `days` UTC days ending on
    /// `now`'s date, oldest first.
    ///
    /// `days` is clamped to `1..=365`. Days without visits are zero-filled so
    /// the result always has exactly `days` contiguous entries.
    pub async fn daily_series(
        &self,
        now: DateTime<Utc>,
        days: u32,
    ) -> Result<Vec<SeriesPoint>, VisitError> {
        let days = days.clamp(1, MAX_SERIES_DAYS);
        let calendar = series_days(now.date_naive(), days);
        let Some(first) = calendar.first().copied() else {
            return Ok(Vec::new());
        };

        let guard = self.ready_conn().await?;
        let conn = guard.as_ref().ok_or_else(missing_conn)?;

        let counts = query_daily_counts(conn, first)?;

        Ok(calendar
            .into_iter()
            .map(|day| {
                let (page_views, unique_visitors) = counts.get(&day).copied().unwrap_or((0, 0));
                SeriesPoint {
                    day,
                    page_views,
                    unique_visitors,
                }
            })
            .collect())
    }
}

fn query_daily_counts(
    conn: &duckdb::Connection,
    first: NaiveDate,
) -> Result<HashMap<NaiveDate, (i64, i64)>, VisitError> {
    let start = sql_timestamp(&first.and_time(NaiveTime::MIN));

    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                CAST(CAST(ts AS DATE) AS VARCHAR) AS day,
                COUNT(*) AS page_views,
                COUNT(DISTINCT visitor_id) AS unique_visitors
            FROM visits
            WHERE ts >= CAST(?1 AS TIMESTAMP)
            GROUP BY day
            "#,
        )
        .map_err(anyhow::Error::from)?;

    let rows = stmt
        .query_map(duckdb::params![start], |row| {
            let day: String = row.get(0)?;
            let page_views: i64 = row.get(1)?;
            let unique_visitors: i64 = row.get(2)?;
            Ok((day, page_views, unique_visitors))
        })
        .map_err(anyhow::Error::from)?;

    let mut counts = HashMap::new();
    for row in rows {
        let (day, page_views, unique_visitors) = row.map_err(anyhow::Error::from)?;
        let day = NaiveDate::parse_from_str(&day, "%Y-%m-%d").map_err(anyhow::Error::from)?;
        counts.insert(day, (page_views, unique_visitors));
    }
    Ok(counts)
}
