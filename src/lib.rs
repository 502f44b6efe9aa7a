//! Minimal generic data-access layer over a single SQLite file.
//!
//! # Intention
//!
//! - Expose parameterized execute/fetch primitives and id-keyed CRUD helpers.
//! - Represent rows as ordered, loosely typed [`Record`]s.
//!
//! # Architectural Boundaries
//!
//! - One open handle per [`RecordStore`]; no pooling, transactions or schema management.
//! - Table and column names are trusted input. Only values are bound as parameters.

pub mod config;
pub mod error;
pub mod record;
pub mod store;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use record::{Params, Record, Value};
pub use store::{
    validate_identifier, CountOperation, CreateOperation, CrudOperation, CrudOutcome,
    DeleteOperation, ReadOperation, RecordStore, UpdateOperation,
};
