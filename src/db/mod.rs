pub mod db_pool;
pub mod executor;

use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum DbError {
    Pool(String),
    Query(String),
    Task(String),
    Ingest(String),
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::Pool(msg) => write!(f, "Database connection error: {}", msg),
            DbError::Query(msg) => write!(f, "SQL error: {}", msg),
            DbError::Task(msg) => write!(f, "Database task execution failed: {}", msg),
            DbError::Ingest(msg) => write!(f, "Ingest error: {}", msg),
        }
    }
}

impl Error for DbError {}

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        DbError::Query(err.to_string())
    }
}

impl From<r2d2::Error> for DbError {
    fn from(err: r2d2::Error) -> Self {
        DbError::Pool(err.to_string())
    }
}

impl From<tokio::task::JoinError> for DbError {
    fn from(err: tokio::task::JoinError) -> Self {
        DbError::Task(err.to_string())
    }
}
