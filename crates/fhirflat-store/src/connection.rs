//! Connection factory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};

use crate::error::{Result, StoreError};
use crate::schema::initialize_schema;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Hands out one live connection per logical operation.
///
/// Callers drop the connection when the operation ends, on every exit path.
pub trait ConnectionFactory: Send + Sync {
    /// Address the factory connects to, for diagnostics.
    fn address(&self) -> &str;

    /// Opens a connection, or reports the store as unavailable.
    fn connect(&self) -> Result<Connection>;
}

/// SQLite database addressed as `sqlite://<path>`, `sqlite:<path>` or a bare path.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    address: String,
    path: PathBuf,
}

impl SqliteConnector {
    pub fn from_address(address: &str) -> Result<Self> {
        let trimmed = address.trim();
        let path = trimmed
            .strip_prefix("sqlite://")
            .or_else(|| trimmed.strip_prefix("sqlite:"))
            .unwrap_or(trimmed);
        if path.is_empty() || path == ":memory:" {
            return Err(StoreError::InvalidAddress {
                address: address.to_string(),
            });
        }
        Ok(Self {
            address: trimmed.to_string(),
            path: PathBuf::from(path),
        })
    }

    pub fn from_path(path: &Path) -> Self {
        Self {
            address: format!("sqlite://{}", path.display()),
            path: path.to_path_buf(),
        }
    }

    /// Creates the database file if missing and applies the schema.
    pub fn create(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                operation: "create directory",
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = self.open(OpenFlags::SQLITE_OPEN_CREATE)?;
        conn.query_row("PRAGMA journal_mode = WAL", (), |row| row.get::<_, String>(0))
            .map_err(StoreError::statement("enable write-ahead log"))?;
        initialize_schema(&conn)?;
        tracing::debug!(address = %self.address, "store schema ready");
        Ok(())
    }

    fn open(&self, extra: OpenFlags) -> Result<Connection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
            | OpenFlags::SQLITE_OPEN_URI
            | extra;
        let unavailable = |source| StoreError::Unavailable {
            address: self.address.clone(),
            source,
        };
        let conn = Connection::open_with_flags(&self.path, flags).map_err(unavailable)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(unavailable)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(unavailable)?;
        Ok(conn)
    }
}

/// Parses `address`, creates the database if needed and applies the schema.
pub fn create_database(address: &str) -> Result<SqliteConnector> {
    let connector = SqliteConnector::from_address(address)?;
    connector.create()?;
    Ok(connector)
}

impl ConnectionFactory for SqliteConnector {
    fn address(&self) -> &str {
        &self.address
    }

    fn connect(&self) -> Result<Connection> {
        self.open(OpenFlags::empty())
    }
}
