use crate::db::DbError;
use crate::db::db_pool::DuckDbConnectionManager;
use duckdb::types::ValueRef;
use r2d2::Pool;
use serde_json::{Map, Value, json};
use tracing::debug;

/// One result row, keyed by column name.
pub type Row = Map<String, Value>;

#[derive(Clone)]
pub struct QueryExecutor {
    pool: Pool<DuckDbConnectionManager>,
}

impl QueryExecutor {
    pub fn new(pool: Pool<DuckDbConnectionManager>) -> Self {
        Self { pool }
    }

    /// Executes a statement and fetches every row into memory. The pooled
    /// connection is released before this returns, so a subsequent EXPLAIN
    /// never runs against a half-drained result set.
    pub fn run_query(&self, sql: &str) -> Result<(Vec<Row>, usize), DbError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(sql)?;

        let column_count = stmt.column_count();
        let mut column_names: Vec<String> = Vec::with_capacity(column_count);
        for i in 0..column_count {
            match stmt.column_name(i) {
                Ok(name) => column_names.push(name.to_string()),
                Err(_) => column_names.push(format!("column_{}", i)),
            }
        }

        let mut rows_out: Vec<Row> = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (i, name) in column_names.iter().enumerate() {
                record.insert(name.clone(), value_ref_to_json(row.get_ref(i)?));
            }
            rows_out.push(record);
        }

        let row_count = rows_out.len();
        debug!("Query returned {} row(s)", row_count);
        Ok((rows_out, row_count))
    }

    /// Runs `EXPLAIN <sql>` on its own scoped connection and returns the
    /// plan as text, one line per plan row.
    pub fn explain(&self, sql: &str) -> Result<String, DbError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!("EXPLAIN {}", sql))?;
        let column_count = stmt.column_count();

        let mut lines: Vec<String> = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut parts: Vec<String> = Vec::new();
            for i in 0..column_count {
                match row.get_ref(i)? {
                    ValueRef::Null => {}
                    value => parts.push(stringify_value(value)),
                }
            }
            lines.push(parts.join("\n"));
        }

        Ok(lines.join("\n"))
    }
}

/// Plan-derived advice used when the completion endpoint is not consulted.
pub fn static_suggestion(plan: &str) -> String {
    let mut hints: Vec<&str> = Vec::new();
    if plan.contains("SEQ_SCAN") || plan.contains("Seq Scan") {
        hints.push("the plan contains a sequential scan, so an index on the filtered or joined columns may help");
    }
    if plan.contains("HASH_JOIN") || plan.contains("Hash Join") {
        hints.push("hash joins benefit from indexes on the join keys of the larger table");
    }
    if hints.is_empty() {
        "No obvious optimization opportunities found in the execution plan. \
         Consider indexes on columns used in WHERE, JOIN, ORDER BY and GROUP BY clauses."
            .to_string()
    } else {
        format!("Based on the execution plan: {}.", hints.join("; "))
    }
}

fn value_ref_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => json!(b),
        ValueRef::TinyInt(i) => json!(i),
        ValueRef::SmallInt(i) => json!(i),
        ValueRef::Int(i) => json!(i),
        ValueRef::BigInt(i) => json!(i),
        ValueRef::HugeInt(i) => json!(i.to_string()),
        ValueRef::UTinyInt(u) => json!(u),
        ValueRef::USmallInt(u) => json!(u),
        ValueRef::UInt(u) => json!(u),
        ValueRef::UBigInt(u) => json!(u),
        ValueRef::Float(f) => json!(f),
        ValueRef::Double(f) => json!(f),
        ValueRef::Decimal(d) => json!(d.to_string()),
        ValueRef::Text(t) => json!(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => json!(format!("<{} bytes>", b.len())),
        other => json!(stringify_value(other)),
    }
}

fn stringify_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_executor() -> QueryExecutor {
        let pool = Pool::builder()
            .max_size(1)
            .build(DuckDbConnectionManager::new(":memory:".to_string()))
            .unwrap();
        QueryExecutor::new(pool)
    }

    #[test]
    fn select_one_returns_single_row() {
        let executor = test_executor();
        let (rows, row_count) = executor.run_query("SELECT 1;").unwrap();
        assert_eq!(row_count, 1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values().next(), Some(&json!(1)));
    }

    #[test]
    fn rows_are_keyed_by_column_name() {
        let executor = test_executor();
        let (rows, _) = executor
            .run_query("SELECT 42 AS answer, 'hello' AS greeting;")
            .unwrap();
        assert_eq!(rows[0].get("answer"), Some(&json!(42)));
        assert_eq!(rows[0].get("greeting"), Some(&json!("hello")));
    }

    #[test]
    fn execute_then_explain_on_separate_connections() {
        let executor = test_executor();
        let (_, row_count) = executor.run_query("SELECT 1;").unwrap();
        assert_eq!(row_count, 1);

        // The first statement's connection is back in the pool by now
        let plan = executor.explain("SELECT 1;").unwrap();
        assert!(!plan.is_empty());
    }

    #[test]
    fn unknown_table_is_an_error() {
        let executor = test_executor();
        let result = executor.run_query("SELECT * FROM definitely_missing;");
        assert!(matches!(result, Err(DbError::QueryError(_))));
    }

    #[test]
    fn static_suggestion_always_nonempty() {
        assert!(!static_suggestion("").is_empty());
        assert!(static_suggestion("SEQ_SCAN users").contains("sequential scan"));
    }
}
