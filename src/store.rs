use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::record::{column_name, placeholder, Params, Record, Value};
use rusqlite::types::ToSql;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// CRUD operation types
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOperation {
    pub table: String,
    pub data: Record,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadOperation {
    pub table: String,
    pub id: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOperation {
    pub table: String,
    pub id: Value,
    pub updates: Record,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteOperation {
    pub table: String,
    pub id: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountOperation {
    pub table: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CrudOperation {
    Create(CreateOperation),
    Read(ReadOperation),
    Update(UpdateOperation),
    Delete(DeleteOperation),
    Count(CountOperation),
}

/// What a [`CrudOperation`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CrudOutcome {
    /// Create, Update and Delete report statement success
    Executed(bool),
    /// Read yields the row, empty when absent
    Record(Record),
    Count(i64),
}

/// Check that `name` is a plain SQL identifier: an ASCII letter or `_`,
/// followed by ASCII letters, digits or `_`.
///
/// The store does not quote table or column names. This check is only
/// applied when the store was opened with strict identifiers.
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        warn!(name, "rejected identifier");
        Err(StoreError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}

/// A single open SQLite handle with parameterized execute/fetch primitives
/// and id-keyed CRUD helpers built on them.
///
/// Table and column names are spliced into the SQL text as given. Callers
/// must only pass trusted identifiers unless strict identifiers are enabled
/// (see [`StoreConfig::strict_identifiers`]). Values, including ids, are
/// always bound as parameters.
///
/// The handle is released when the store is dropped. A store must not be
/// shared between threads; open one per thread instead.
#[derive(Debug)]
pub struct RecordStore {
    conn: Connection,
    path: PathBuf,
    strict_identifiers: bool,
}

impl RecordStore {
    /// Open (or create) the database file at `path`.
    ///
    /// Fails with [`StoreError::Connection`] if the file cannot be opened or
    /// created, or if it exists but is not a SQLite database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path.as_ref(), false)
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::open_with(&config.path, config.strict_identifiers)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let path = PathBuf::from(":memory:");
        let conn = Connection::open_in_memory().map_err(|e| StoreError::connection(&path, e))?;
        Ok(Self {
            conn,
            path,
            strict_identifiers: false,
        })
    }

    fn open_with(path: &Path, strict_identifiers: bool) -> Result<Self> {
        info!(path = %path.display(), strict_identifiers, "opening record store");
        let conn = Connection::open(path).map_err(|e| StoreError::connection(path, e))?;
        // SQLite opens lazily; touch the schema so a bad file fails here.
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(|e| StoreError::connection(path, e))?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
            strict_identifiers,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the handle, reporting any error the engine raises on close.
    pub fn close(self) -> Result<()> {
        info!(path = %self.path.display(), "closing record store");
        let path = self.path;
        self.conn
            .close()
            .map_err(|(_, e)| StoreError::connection(path, e))
    }

    /// Rowid of the most recent successful INSERT on this handle, 0 if none.
    pub fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    /// Run a statement for its effect.
    ///
    /// Returns `true` whenever the engine accepts the statement, whether or
    /// not any row was affected. Rows the statement yields (a PRAGMA, or
    /// `RETURNING`) are stepped through and discarded.
    pub fn execute(&self, sql: &str, params: &Params) -> Result<bool> {
        debug!(sql, params = params.len(), "execute");
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| StoreError::query(sql, e))?;
        with_bindings(params, |bound| {
            let mut rows = stmt.query(bound)?;
            while rows.next()?.is_some() {}
            Ok(())
        })
        .map_err(|e| StoreError::query(sql, e))?;
        Ok(true)
    }

    /// Run a row-returning statement and load every row.
    pub fn fetch(&self, sql: &str, params: &Params) -> Result<Vec<Record>> {
        debug!(sql, params = params.len(), "fetch");
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| StoreError::query(sql, e))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let records = with_bindings(params, |bound| {
            let rows = stmt.query_map(bound, |row| {
                let mut record = Record::new();
                for (i, name) in columns.iter().enumerate() {
                    record.insert(name, Value::from(row.get_ref(i)?));
                }
                Ok(record)
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .map_err(|e| StoreError::query(sql, e))?;

        debug!(sql, rows = records.len(), "fetched");
        Ok(records)
    }

    /// `INSERT INTO <table> (<keys>) VALUES (<placeholders>)`, columns in
    /// the order of `data`.
    pub fn create(&self, table: &str, data: &Record) -> Result<bool> {
        self.check_identifier(table)?;
        for key in data.keys() {
            self.check_identifier(column_name(key))?;
        }
        let columns = data.keys().map(column_name).collect::<Vec<_>>().join(", ");
        let placeholders = data.keys().map(placeholder).collect::<Vec<_>>().join(", ");
        let sql = format!("INSERT INTO {table} ({columns}) VALUES ({placeholders})");
        self.execute(&sql, data)
    }

    /// The row whose `id` column equals `id`, or an empty record.
    pub fn read(&self, table: &str, id: impl Into<Value>) -> Result<Record> {
        self.check_identifier(table)?;
        let sql = format!("SELECT * FROM {table} WHERE id = :id");
        let rows = self.fetch(&sql, &Params::new().with_value("id", id))?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }

    /// Set every column in `data` on the row with the given id.
    ///
    /// `id` is bound under the key `id`, replacing any `id` entry already
    /// present in `data` (bare or sigiled), so an `id` column in `data` is
    /// set to `id` as well.
    pub fn update(&self, table: &str, id: impl Into<Value>, data: &Record) -> Result<bool> {
        self.check_identifier(table)?;
        for key in data.keys() {
            self.check_identifier(column_name(key))?;
        }
        let fields = data
            .keys()
            .map(|key| format!("{} = {}", column_name(key), placeholder(key)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE {table} SET {fields} WHERE id = :id");

        let id: Value = id.into();
        let mut params = data.clone();
        let id_keys: Vec<String> = data
            .keys()
            .filter(|key| column_name(key) == "id")
            .map(String::from)
            .collect();
        for key in &id_keys {
            params.insert(key, id.clone());
        }
        // The WHERE clause always uses `:id`.
        if !id_keys.iter().any(|key| placeholder(key) == ":id") {
            params.insert("id", id);
        }
        self.execute(&sql, &params)
    }

    pub fn delete(&self, table: &str, id: impl Into<Value>) -> Result<bool> {
        self.check_identifier(table)?;
        let sql = format!("DELETE FROM {table} WHERE id = :id");
        self.execute(&sql, &Params::new().with_value("id", id))
    }

    /// Number of rows in `table`.
    pub fn count(&self, table: &str) -> Result<i64> {
        self.check_identifier(table)?;
        let sql = format!("SELECT COUNT(*) AS count FROM {table}");
        let rows = self.fetch(&sql, &Params::new())?;
        Ok(rows
            .first()
            .and_then(|row| row.get("count"))
            .and_then(Value::as_i64)
            .unwrap_or(0))
    }

    /// Perform a CRUD operation described as a value.
    pub fn apply(&self, op: CrudOperation) -> Result<CrudOutcome> {
        match op {
            CrudOperation::Create(op) => self.create(&op.table, &op.data).map(CrudOutcome::Executed),
            CrudOperation::Read(op) => self.read(&op.table, op.id).map(CrudOutcome::Record),
            CrudOperation::Update(op) => self
                .update(&op.table, op.id, &op.updates)
                .map(CrudOutcome::Executed),
            CrudOperation::Delete(op) => self.delete(&op.table, op.id).map(CrudOutcome::Executed),
            CrudOperation::Count(op) => self.count(&op.table).map(CrudOutcome::Count),
        }
    }

    fn check_identifier(&self, name: &str) -> Result<()> {
        if self.strict_identifiers {
            validate_identifier(name)
        } else {
            Ok(())
        }
    }
}

/// Bind `params` by placeholder name and hand the bindings to `f`.
fn with_bindings<T>(
    params: &Params,
    f: impl FnOnce(&[(&str, &dyn ToSql)]) -> rusqlite::Result<T>,
) -> rusqlite::Result<T> {
    let names: Vec<String> = params.keys().map(placeholder).collect();
    let bound: Vec<(&str, &dyn ToSql)> = names
        .iter()
        .map(String::as_str)
        .zip(params.values().map(|v| v as &dyn ToSql))
        .collect();
    f(&bound)
}
