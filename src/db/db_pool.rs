use duckdb::Connection;
use r2d2::ManageConnection;
use std::sync::Mutex;

/// Hands out clones of one base connection, so every pooled connection sees the same
/// database (including `:memory:`).
pub struct DuckDBConnectionManager {
    base: Mutex<Connection>,
}

impl DuckDBConnectionManager {
    pub fn open(connection_string: &str) -> Result<Self, duckdb::Error> {
        let base = if connection_string == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(connection_string)?
        };
        Ok(Self {
            base: Mutex::new(base),
        })
    }
}

impl ManageConnection for DuckDBConnectionManager {
    type Connection = Connection;
    type Error = duckdb::Error;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let base = self.base.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        base.try_clone()
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        conn.execute("SELECT 1", [])?;
        Ok(())
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}
