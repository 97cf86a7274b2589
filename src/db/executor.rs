use crate::db::db_pool::DuckDBConnectionManager;
use crate::db::DbError;
use crate::query::models::{QueryStatement, ResultRow, ResultSet};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use duckdb::types::{TimeUnit, Value as DuckValue};
use duckdb::Connection;
use r2d2::Pool;
use serde_json::{Number, Value};
use std::time::Instant;
use tracing::{error, info};

/// Runs one statement against the tabular store and returns its rows untouched.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, statement: &QueryStatement) -> Result<ResultSet, DbError>;
}

pub struct DuckDbExecutor {
    pool: Pool<DuckDBConnectionManager>,
}

impl DuckDbExecutor {
    pub fn new(pool: Pool<DuckDBConnectionManager>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryExecutor for DuckDbExecutor {
    async fn execute(&self, statement: &QueryStatement) -> Result<ResultSet, DbError> {
        let pool = self.pool.clone();
        let sql = statement.as_str().to_string();
        info!("Executing SQL query: {}", sql);

        // DuckDB calls block, keep them off the async workers
        let result = tokio::task::spawn_blocking(move || -> Result<ResultSet, DbError> {
            let start_time = Instant::now();
            let conn = pool.get()?;
            let result_set = run_query(&conn, &sql)?;
            info!(
                "Query executed successfully. Row count: {}, Execution time: {}ms",
                result_set.len(),
                start_time.elapsed().as_millis()
            );
            Ok(result_set)
        })
        .await?;

        if let Err(e) = &result {
            error!("Database query error: {}", e);
        }
        result
    }
}

fn run_query(conn: &Connection, sql: &str) -> Result<ResultSet, duckdb::Error> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let columns: Vec<String> = rows.as_ref().map(|s| s.column_names()).unwrap_or_default();

    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = ResultRow::new();
        for (i, name) in columns.iter().enumerate() {
            let value: DuckValue = row.get(i)?;
            record.insert(name.clone(), to_json(value));
        }
        result.push(record);
    }

    Ok(ResultSet {
        columns,
        rows: result,
    })
}

/// Numbers, booleans and nested values map to JSON natively; temporal and binary
/// values become their DuckDB text form.
fn to_json(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Bool(b),
        DuckValue::TinyInt(i) => Value::from(i),
        DuckValue::SmallInt(i) => Value::from(i),
        DuckValue::Int(i) => Value::from(i),
        DuckValue::BigInt(i) => Value::from(i),
        DuckValue::HugeInt(i) => match i64::try_from(i) {
            Ok(i) => Value::from(i),
            Err(_) => Value::String(i.to_string()),
        },
        DuckValue::UTinyInt(i) => Value::from(i),
        DuckValue::USmallInt(i) => Value::from(i),
        DuckValue::UInt(i) => Value::from(i),
        DuckValue::UBigInt(i) => Value::from(i),
        DuckValue::Float(f) => float(f64::from(f)),
        DuckValue::Double(f) => float(f),
        DuckValue::Decimal(d) => {
            let text = d.to_string();
            text.parse::<f64>().map(float).unwrap_or(Value::String(text))
        }
        DuckValue::Text(s) | DuckValue::Enum(s) => Value::String(s),
        DuckValue::Date32(days) => NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
            .map(|d| Value::String(d.to_string()))
            .unwrap_or(Value::Null),
        DuckValue::Timestamp(unit, raw) => DateTime::from_timestamp_micros(to_micros(unit, raw))
            .map(|ts| Value::String(ts.naive_utc().to_string()))
            .unwrap_or(Value::Null),
        DuckValue::Time64(unit, raw) => {
            let micros = to_micros(unit, raw);
            NaiveTime::from_num_seconds_from_midnight_opt(
                (micros / 1_000_000) as u32,
                ((micros % 1_000_000) * 1_000) as u32,
            )
            .map(|t| Value::String(t.to_string()))
            .unwrap_or(Value::Null)
        }
        DuckValue::Interval { months, days, nanos } => Value::String(interval_text(months, days, nanos)),
        DuckValue::Blob(bytes) => Value::String(blob_text(&bytes)),
        DuckValue::List(items) | DuckValue::Array(items) => {
            Value::Array(items.into_iter().map(to_json).collect())
        }
        DuckValue::Struct(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, value)| (name.clone(), to_json(value.clone())))
                .collect(),
        ),
        // JSON keys must be strings, so non-text map keys use their JSON text
        DuckValue::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(key, value)| {
                    let key = match to_json(key.clone()) {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (key, to_json(value.clone()))
                })
                .collect(),
        ),
        DuckValue::Union(inner) => to_json(*inner),
    }
}

// Same layout DuckDB prints: "1 month 2 days 03:04:05.5"
fn interval_text(months: i32, days: i32, nanos: i64) -> String {
    let plural = |n: i32, unit: &str| format!("{} {}{}", n, unit, if n.abs() == 1 { "" } else { "s" });
    let mut parts = Vec::new();
    if months / 12 != 0 {
        parts.push(plural(months / 12, "year"));
    }
    if months % 12 != 0 {
        parts.push(plural(months % 12, "month"));
    }
    if days != 0 {
        parts.push(plural(days, "day"));
    }
    if nanos != 0 || parts.is_empty() {
        let sign = if nanos < 0 { "-" } else { "" };
        let micros = (nanos / 1_000).unsigned_abs();
        let secs = micros / 1_000_000;
        let mut clock = format!("{}{:02}:{:02}:{:02}", sign, secs / 3600, secs / 60 % 60, secs % 60);
        let frac = micros % 1_000_000;
        if frac != 0 {
            clock.push_str(format!(".{:06}", frac).trim_end_matches('0'));
        }
        parts.push(clock);
    }
    parts.join(" ")
}

// Printable ASCII stays as-is, every other byte becomes \xHH
fn blob_text(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            b' '..=b'~' if b != b'\\' => (b as char).to_string(),
            _ => format!("\\x{:02X}", b),
        })
        .collect()
}

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

// NaN and infinities have no JSON form
fn float(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn to_micros(unit: TimeUnit, raw: i64) -> i64 {
    match unit {
        TimeUnit::Second => raw.saturating_mul(1_000_000),
        TimeUnit::Millisecond => raw.saturating_mul(1_000),
        TimeUnit::Microsecond => raw,
        TimeUnit::Nanosecond => raw / 1_000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::sanitize::sanitize;
    use serde_json::json;

    fn executor_with(setup: &str) -> DuckDbExecutor {
        let manager = DuckDBConnectionManager::open(":memory:").unwrap();
        let pool = Pool::builder().max_size(2).build(manager).unwrap();
        pool.get().unwrap().execute_batch(setup).unwrap();
        DuckDbExecutor::new(pool)
    }

    const LISTINGS: &str = "
        CREATE TABLE properties (
            address VARCHAR, borough VARCHAR, price DOUBLE, bedrooms INTEGER,
            date_listed DATE, square_feet DECIMAL(10, 2), latitude DOUBLE, longitude DOUBLE
        );
        INSERT INTO properties VALUES
            ('1 Main St', 'Manhattan', 1250000, 3, DATE '2024-05-01', 1800.50, 40.71, -74.00),
            ('9 Elm Ave', 'Queens', 640000, NULL, DATE '2024-06-12', 950.00, 40.73, -73.79);
    ";

    #[tokio::test]
    async fn returns_rows_in_store_order_with_column_order() {
        let executor = executor_with(LISTINGS);
        let sql = sanitize("SELECT address, price, bedrooms, date_listed, square_feet FROM properties ORDER BY price DESC;").unwrap();

        let result = executor.execute(&sql).await.unwrap();

        assert_eq!(result.columns, vec!["address", "price", "bedrooms", "date_listed", "square_feet"]);
        assert_eq!(result.len(), 2);
        assert_eq!(
            Value::Object(result.rows[0].clone()),
            json!({"address": "1 Main St", "price": 1250000.0, "bedrooms": 3, "date_listed": "2024-05-01", "square_feet": 1800.5})
        );
        assert_eq!(result.rows[1]["bedrooms"], Value::Null);
        let keys: Vec<_> = result.rows[0].keys().cloned().collect();
        assert_eq!(keys, result.columns);
    }

    #[tokio::test]
    async fn no_matches_is_an_empty_result_not_an_error() {
        let executor = executor_with(LISTINGS);
        let sql = sanitize("SELECT * FROM properties WHERE borough = 'Staten Island';").unwrap();

        let result = executor.execute(&sql).await.unwrap();

        assert!(result.is_empty());
        assert_eq!(result.columns.len(), 8);
    }

    #[tokio::test]
    async fn store_errors_surface_as_query_errors() {
        let executor = executor_with(LISTINGS);
        let sql = sanitize("SELECT * FROM no_such_table;").unwrap();

        assert!(matches!(executor.execute(&sql).await, Err(DbError::Query(_))));
    }

    #[test]
    fn timestamps_render_as_text() {
        assert_eq!(
            to_json(DuckValue::Timestamp(TimeUnit::Microsecond, 1_714_521_600_000_000)),
            json!("2024-05-01 00:00:00")
        );
        assert_eq!(to_json(DuckValue::Double(f64::NAN)), Value::Null);
    }

    #[tokio::test]
    async fn nested_values_become_json_arrays_and_objects() {
        let executor = executor_with(LISTINGS);
        let sql = sanitize(
            "SELECT [1, 2] AS ids, {'a': 1} AS info, list(address ORDER BY address) AS addresses FROM properties;",
        )
        .unwrap();

        let result = executor.execute(&sql).await.unwrap();

        assert_eq!(
            Value::Object(result.rows[0].clone()),
            json!({"ids": [1, 2], "info": {"a": 1}, "addresses": ["1 Main St", "9 Elm Ave"]})
        );
    }

    #[test]
    fn maps_unions_intervals_and_blobs_render_readably() {
        let map = DuckValue::Map(vec![(DuckValue::Text("beds".into()), DuckValue::Int(3)), (DuckValue::Int(7), DuckValue::Null)].into());
        assert_eq!(to_json(map), json!({"beds": 3, "7": null}));
        assert_eq!(to_json(DuckValue::Union(Box::new(DuckValue::Text("x".into())))), json!("x"));
        assert_eq!(
            to_json(DuckValue::Interval { months: 14, days: 2, nanos: 3_723_500_000_000 }),
            json!("1 year 2 months 2 days 01:02:03.5")
        );
        assert_eq!(to_json(DuckValue::Interval { months: 0, days: 0, nanos: 0 }), json!("00:00:00"));
        assert_eq!(to_json(DuckValue::Blob(vec![b'a', 0x00, 0xff])), json!("a\\x00\\xFF"));
    }
}
