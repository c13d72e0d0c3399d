use crate::db::DbError;
use crate::db::db_pool::DuckDbConnectionManager;
use r2d2::Pool;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Caps applied to schema snapshots to bound prompt size.
#[derive(Debug, Clone, Copy)]
pub struct SchemaLimits {
    pub max_tables: usize,
    pub max_columns_per_table: usize,
}

/// A capped, point-in-time view of database/table/column names,
/// built fresh per request and discarded after prompt construction.
pub type SchemaSnapshot = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Result of a single metadata listing. Failures never propagate past the
/// introspector: callers get an empty listing plus the engine's message.
#[derive(Debug)]
pub struct Listing {
    pub names: Vec<String>,
    pub error: Option<String>,
}

impl Listing {
    fn from_result(result: Result<Vec<String>, DbError>) -> Self {
        match result {
            Ok(names) => Listing { names, error: None },
            Err(e) => {
                warn!("Schema introspection failed: {}", e);
                Listing {
                    names: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

#[derive(Clone)]
pub struct SchemaIntrospector {
    pool: Pool<DuckDbConnectionManager>,
    limits: SchemaLimits,
}

impl SchemaIntrospector {
    pub fn new(pool: Pool<DuckDbConnectionManager>, limits: SchemaLimits) -> Self {
        Self { pool, limits }
    }

    /// Lists schemas visible to the engine, system catalogs excluded.
    pub fn list_databases(&self) -> Listing {
        Listing::from_result(self.query_databases())
    }

    pub fn list_tables(&self, database: &str) -> Listing {
        Listing::from_result(self.query_tables(database))
    }

    pub fn list_columns(&self, table: &str, database: Option<&str>) -> Listing {
        Listing::from_result(self.query_columns(table, database))
    }

    /// Builds a capped snapshot: at most `max_tables` tables per database
    /// and `max_columns_per_table` columns per table. Metadata failures
    /// degrade to missing entries, never an error.
    pub fn limited_schema(&self, database: Option<&str>) -> SchemaSnapshot {
        let databases = match database {
            Some(db) => vec![db.to_string()],
            None => self.list_databases().names,
        };

        let mut snapshot = SchemaSnapshot::new();
        for db in databases {
            let mut tables = BTreeMap::new();
            let mut table_names = self.list_tables(&db).names;
            table_names.truncate(self.limits.max_tables);

            for table in table_names {
                let mut columns = self.list_columns(&table, Some(&db)).names;
                columns.truncate(self.limits.max_columns_per_table);
                tables.insert(table, columns);
            }
            snapshot.insert(db, tables);
        }

        debug!("Built schema snapshot for {} database(s)", snapshot.len());
        snapshot
    }

    fn query_databases(&self) -> Result<Vec<String>, DbError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT schema_name FROM information_schema.schemata \
             WHERE schema_name NOT IN ('information_schema', 'pg_catalog') \
             ORDER BY schema_name",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.filter_map(Result::ok).collect())
    }

    fn query_tables(&self, database: &str) -> Result<Vec<String>, DbError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = ? ORDER BY table_name",
        )?;
        let rows = stmt.query_map([database], |row| row.get::<_, String>(0))?;
        Ok(rows.filter_map(Result::ok).collect())
    }

    fn query_columns(&self, table: &str, database: Option<&str>) -> Result<Vec<String>, DbError> {
        let conn = self.pool.get()?;
        match database {
            Some(db) => {
                let mut stmt = conn.prepare(
                    "SELECT column_name FROM information_schema.columns \
                     WHERE table_name = ? AND table_schema = ? \
                     ORDER BY ordinal_position",
                )?;
                let rows = stmt.query_map([table, db], |row| row.get::<_, String>(0))?;
                Ok(rows.filter_map(Result::ok).collect())
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT column_name FROM information_schema.columns \
                     WHERE table_name = ? ORDER BY ordinal_position",
                )?;
                let rows = stmt.query_map([table], |row| row.get::<_, String>(0))?;
                Ok(rows.filter_map(Result::ok).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pool() -> Pool<DuckDbConnectionManager> {
        Pool::builder()
            .max_size(1)
            .build(DuckDbConnectionManager::new(":memory:".to_string()))
            .unwrap()
    }

    fn introspector(pool: Pool<DuckDbConnectionManager>, limits: SchemaLimits) -> SchemaIntrospector {
        SchemaIntrospector::new(pool, limits)
    }

    const DEFAULT_LIMITS: SchemaLimits = SchemaLimits {
        max_tables: 50,
        max_columns_per_table: 100,
    };

    #[test]
    fn lists_main_schema() {
        let pool = test_pool();
        let intro = introspector(pool, DEFAULT_LIMITS);

        let listing = intro.list_databases();
        assert!(listing.error.is_none());
        assert!(listing.names.iter().any(|n| n == "main"));
    }

    #[test]
    fn lists_tables_and_columns() {
        let pool = test_pool();
        {
            let conn = pool.get().unwrap();
            conn.execute_batch(
                "CREATE TABLE users (id INTEGER, email VARCHAR, created_at TIMESTAMP);
                 CREATE TABLE orders (id INTEGER, user_id INTEGER);",
            )
            .unwrap();
        }
        let intro = introspector(pool, DEFAULT_LIMITS);

        let tables = intro.list_tables("main");
        assert_eq!(tables.names, vec!["orders", "users"]);

        let columns = intro.list_columns("users", Some("main"));
        assert_eq!(columns.names, vec!["id", "email", "created_at"]);
    }

    #[test]
    fn snapshot_honors_caps() {
        let pool = test_pool();
        {
            let conn = pool.get().unwrap();
            conn.execute_batch(
                "CREATE TABLE a (c1 INTEGER, c2 INTEGER, c3 INTEGER);
                 CREATE TABLE b (c1 INTEGER, c2 INTEGER);
                 CREATE TABLE c (c1 INTEGER);",
            )
            .unwrap();
        }
        let limits = SchemaLimits {
            max_tables: 2,
            max_columns_per_table: 1,
        };
        let intro = introspector(pool, limits);

        let snapshot = intro.limited_schema(Some("main"));
        let tables = snapshot.get("main").unwrap();
        assert!(tables.len() <= limits.max_tables);
        for columns in tables.values() {
            assert!(columns.len() <= limits.max_columns_per_table);
        }
    }

    #[test]
    fn missing_table_degrades_to_empty_listing() {
        let pool = test_pool();
        let intro = introspector(pool, DEFAULT_LIMITS);

        // Unknown table is not an error at this boundary, just empty
        let listing = intro.list_columns("no_such_table", Some("main"));
        assert!(listing.names.is_empty());
    }
}
