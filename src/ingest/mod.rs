// Loads the property dataset into the store so the generated SQL has something to query.
// DuckDB does the schema inference through read_csv_auto / read_parquet.

use crate::db::db_pool::DuckDBConnectionManager;
use crate::db::DbError;
use r2d2::Pool;
use std::path::Path;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Parquet,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self, DbError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| DbError::Ingest("Unsupported file type: no extension".to_string()))?;

        match extension.to_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "parquet" => Ok(FileFormat::Parquet),
            other => Err(DbError::Ingest(format!("Unsupported file type: {}", other))),
        }
    }

    fn reader(&self) -> &'static str {
        match self {
            FileFormat::Csv => "read_csv_auto",
            FileFormat::Parquet => "read_parquet",
        }
    }
}

/// Replaces `table` with the contents of `path` and returns the loaded row count.
pub fn load_dataset(
    pool: &Pool<DuckDBConnectionManager>,
    path: &Path,
    table: &str,
) -> Result<i64, DbError> {
    // Table names end up in SQL text, keep them to plain identifiers
    if table.is_empty() || !table.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(DbError::Ingest(
            "Table name must be alphanumeric with underscores".to_string(),
        ));
    }
    if !path.exists() {
        return Err(DbError::Ingest(format!("Dataset not found: {}", path.display())));
    }

    let format = FileFormat::from_path(path)?;
    let conn = pool.get()?;

    let load_sql = format!(
        "CREATE OR REPLACE TABLE \"{}\" AS SELECT * FROM {}('{}')",
        table,
        format.reader(),
        path.to_string_lossy().replace('\'', "''")
    );
    conn.execute_batch(&load_sql).map_err(|e| {
        error!("Failed to load {} into {}: {}", path.display(), table, e);
        DbError::Ingest(e.to_string())
    })?;

    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table), [], |row| row.get(0))?;
    info!("Loaded {} rows from {} into table {}", count, path.display(), table);
    Ok(count)
}
