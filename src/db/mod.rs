pub mod db_pool;
pub mod executor;
pub mod introspect;

use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum DbError {
    PoolError(String),
    QueryError(String),
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::PoolError(msg) => write!(f, "Database pool error: {}", msg),
            DbError::QueryError(msg) => write!(f, "Database query error: {}", msg),
        }
    }
}

impl Error for DbError {}

impl From<r2d2::Error> for DbError {
    fn from(e: r2d2::Error) -> Self {
        DbError::PoolError(e.to_string())
    }
}

impl From<duckdb::Error> for DbError {
    fn from(e: duckdb::Error) -> Self {
        DbError::QueryError(e.to_string())
    }
}
