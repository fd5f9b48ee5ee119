use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// DuckDB location (file path or `:memory:`). `None` disables tracking
    /// and every admin aggregate endpoint.
    pub database_url: Option<String>,
    /// Operator password for the `/admin` surface. `None` makes every admin
    /// route answer 500 with setup instructions.
    pub admin_token: Option<String>,
    pub duckdb_memory_limit: String,
    pub flush_interval_ms: u64,
    /// Pending visits are flushed early once the buffer holds this many.
    pub flush_threshold: usize,
    /// Pending visits beyond this are dropped and counted.
    pub buffer_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: None,
            admin_token: None,
            duckdb_memory_limit: "1GB".to_string(),
            flush_interval_ms: 250,
            flush_threshold: 100,
            buffer_capacity: 10_000,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();
        Ok(Self {
            port: std::env::var("FOOTFALL_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            database_url: non_blank_var("FOOTFALL_DATABASE_URL"),
            admin_token: non_blank_var("FOOTFALL_ADMIN_TOKEN"),
            duckdb_memory_limit: std::env::var("FOOTFALL_DUCKDB_MEMORY")
                .unwrap_or(defaults.duckdb_memory_limit),
            flush_interval_ms: std::env::var("FOOTFALL_FLUSH_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.flush_interval_ms),
            flush_threshold: defaults.flush_threshold,
            buffer_capacity: std::env::var("FOOTFALL_BUFFER_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.buffer_capacity),
        })
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms.max(1))
    }

    pub fn visits_enabled(&self) -> bool {
        self.database_url.is_some()
    }
}

/// Read an env var, trimming it and treating blank values as unset.
fn non_blank_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
