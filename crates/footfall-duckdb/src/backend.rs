use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use anyhow::{anyhow, Result};
use chrono::NaiveDateTime;
use duckdb::Connection;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use footfall_core::error::VisitError;
use footfall_core::visits::{PendingVisit, SchemaStatus};

use crate::schema::init_sql;

/// Location string selecting a private in-process database.
pub const IN_MEMORY: &str = ":memory:";

/// Format used for every timestamp bound into SQL.
pub(crate) fn sql_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// DuckDB-backed visit store.
///
/// Nothing touches disk until the first [`DuckDbBackend::ensure_schema`]
/// call, which opens the database and creates the schema. That attempt runs
/// once: success is remembered in `ready`, failure in `init_error`, and
/// neither is ever reset for the life of the backend.
///
/// The connection sits behind a `tokio::sync::Mutex`, so inserts and the
/// aggregate reads are serialised; a read never observes half of a batch.
pub struct DuckDbBackend {
    location: String,
    memory_limit: String,
    pub(crate) conn: Mutex<Option<Connection>>,
    ready: AtomicBool,
    init_error: OnceLock<String>,
}

impl DuckDbBackend {
    /// Prepare a backend for the database at `location` (a file path or
    /// [`IN_MEMORY`]). `memory_limit` is a DuckDB size string such as `"1GB"`.
    pub fn new(location: impl Into<String>, memory_limit: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            memory_limit: memory_limit.into(),
            conn: Mutex::new(None),
            ready: AtomicBool::new(false),
            init_error: OnceLock::new(),
        }
    }

    /// A private in-memory database. Intended for tests.
    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY, "1GB")
    }

    pub fn status(&self) -> SchemaStatus {
        SchemaStatus {
            ready: self.ready.load(Ordering::Acquire),
            init_error: self.init_error.get().cloned(),
        }
    }

    /// Open the database and create the schema, at most once per backend.
    pub async fn ensure_schema(&self) -> Result<(), VisitError> {
        if let Some(done) = self.memoized() {
            return done;
        }

        let mut guard = self.conn.lock().await;
        // Another caller may have finished while we waited for the lock.
        if let Some(done) = self.memoized() {
            return done;
        }

        match self.open_and_migrate() {
            Ok(conn) => {
                *guard = Some(conn);
                self.ready.store(true, Ordering::Release);
                info!(location = %self.location, "Visit schema ready");
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(location = %self.location, error = %reason, "Visit schema init failed; not retrying");
                let cached = self.init_error.get_or_init(|| reason);
                Err(VisitError::SchemaUnavailable(cached.clone()))
            }
        }
    }

    fn memoized(&self) -> Option<Result<(), VisitError>> {
        if self.ready.load(Ordering::Acquire) {
            return Some(Ok(()));
        }
        self.init_error
            .get()
            .map(|reason| Err(VisitError::SchemaUnavailable(reason.clone())))
    }

    fn open_and_migrate(&self) -> Result<Connection> {
        let conn = if self.location == IN_MEMORY {
            Connection::open_in_memory()?
        } else {
            Connection::open(&self.location)?
        };
        conn.execute_batch(&init_sql(&self.memory_limit))?;
        Ok(conn)
    }

    /// Lock the connection once the schema is ready.
    pub(crate) async fn ready_conn(&self) -> Result<MutexGuard<'_, Option<Connection>>, VisitError> {
        self.ensure_schema().await?;
        Ok(self.conn.lock().await)
    }

    /// Insert a batch of visits in a single transaction.
    ///
    /// Returns immediately (no-op) if `visits` is empty.
    pub async fn insert_visits(&self, visits: &[PendingVisit]) -> Result<(), VisitError> {
        if visits.is_empty() {
            return Ok(());
        }

        let mut guard = self.ready_conn().await?;
        let conn = guard.as_mut().ok_or_else(missing_conn)?;
        let tx = conn.transaction().map_err(anyhow::Error::from)?;
        for visit in visits {
            tx.execute(
                "INSERT INTO visits (ts, visitor_id, path) VALUES (CAST(?1 AS TIMESTAMP), ?2, ?3)",
                duckdb::params![sql_timestamp(&visit.ts.naive_utc()), visit.visitor_id, visit.path],
            )
            .map_err(anyhow::Error::from)?;
        }
        tx.commit().map_err(anyhow::Error::from)?;
        tracing::debug!(count = visits.len(), "Inserted visits");
        Ok(())
    }

    /// Acquire the connection for direct catalog inspection.
    ///
    /// Intended for integration tests. Yields `None` before the schema
    /// initializer has opened the database.
    pub async fn conn_for_test(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().await
    }
}

pub(crate) fn missing_conn() -> VisitError {
    VisitError::Storage(anyhow!("visit store connection missing"))
}
