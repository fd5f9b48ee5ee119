/// DuckDB initialization SQL for the visit log.
///
/// Executed by the schema initializer on the freshly opened connection. Every
/// statement uses `IF NOT EXISTS`, so concurrent or repeated runs converge on
/// one table with exactly two indexes.
///
/// `visits` is append-only. `ts` holds UTC wall-clock time; day boundaries in
/// the aggregate queries are therefore UTC days.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

CREATE SEQUENCE IF NOT EXISTS visits_id_seq START 1;

CREATE TABLE IF NOT EXISTS visits (
    id          BIGINT NOT NULL DEFAULT nextval('visits_id_seq'),
    ts          TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    visitor_id  VARCHAR NOT NULL,
    path        VARCHAR
);

-- Window scans ("ts >= start").
CREATE INDEX IF NOT EXISTS visits_ts_idx ON visits (ts);
-- Per-visitor lookups within a window.
CREATE INDEX IF NOT EXISTS visits_visitor_ts_idx ON visits (visitor_id, ts);
"#
    )
}

#[cfg(test)]
mod tests {
    use super::init_sql;

    #[test]
    fn init_sql_applies_memory_limit() {
        let sql = init_sql("512MB");
        assert!(sql.starts_with("SET memory_limit = '512MB';"));
        assert_eq!(sql.matches("CREATE INDEX IF NOT EXISTS").count(), 2);
    }
}
