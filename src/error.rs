use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the record store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The database file could not be opened, created, or is not a database
    #[error("failed to open database at {}: {source}", .path.display())]
    Connection {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// The engine rejected a statement
    #[error("query failed: {source} (sql: {sql})")]
    Query {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A table or column name failed strict identifier validation
    #[error("invalid identifier: {name:?}")]
    InvalidIdentifier { name: String },

    #[error("failed to read config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result type alias for record store operations
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub(crate) fn connection(path: impl Into<PathBuf>, source: rusqlite::Error) -> Self {
        StoreError::Connection {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn query(sql: impl Into<String>, source: rusqlite::Error) -> Self {
        StoreError::Query {
            sql: sql.into(),
            source,
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connection { .. })
    }

    pub fn is_query(&self) -> bool {
        matches!(self, StoreError::Query { .. })
    }
}
