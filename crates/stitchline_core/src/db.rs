//! Persistence for users, batches and material lines.
//!
//! - [`client`]: connecting to SurrealDB (embedded, in-memory or remote)
//! - [`migration`] and [`schema`]: idempotent schema bootstrap
//! - [`gateway`]: one method per entity operation

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod client;
pub mod gateway;
pub mod migration;
pub mod schema;

pub use gateway::{Gateway, Insert, StoreStats};

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("Connection failed")]
    #[diagnostic(
        code(stitchline_core::db::connection_failed),
        help("Check your database configuration and ensure the database is running")
    )]
    ConnectionFailed(#[source] surrealdb::Error),

    #[error("Query failed")]
    #[diagnostic(
        code(stitchline_core::db::query_failed),
        help("Check the query syntax and table schema")
    )]
    QueryFailed(#[source] surrealdb::Error),

    #[error("Transaction failed")]
    #[diagnostic(code(stitchline_core::db::transaction_failed))]
    TransactionFailed(#[source] surrealdb::Error),

    #[error("Unexpected record key {key} in table {table}")]
    #[diagnostic(
        code(stitchline_core::db::invalid_key),
        help("Rows are keyed by integers; the record may have been written by another tool")
    )]
    InvalidRecordKey { table: String, key: String },

    #[error("Failed to prepare database directory {path}")]
    #[diagnostic(code(stitchline_core::db::directory))]
    Directory {
        path: String,
        #[source]
        cause: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Where the database lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DatabaseConfig {
    /// File backed storage on the local machine
    Embedded {
        #[serde(default = "default_db_path")]
        path: String,
    },
    /// Volatile in-process storage
    Memory,
    /// A SurrealDB server reached over websocket
    Remote {
        url: String,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
        #[serde(default = "default_namespace")]
        namespace: String,
        #[serde(default = "default_namespace")]
        database: String,
    },
}

fn default_db_path() -> String {
    "./stitchline.db".to_string()
}

pub(crate) fn default_namespace() -> String {
    "stitchline".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig::Embedded {
            path: default_db_path(),
        }
    }
}

/// Unique-index violations come back as query errors; this is the only way to
/// tell them apart from other failures across engines.
pub(crate) fn is_unique_violation(err: &surrealdb::Error) -> bool {
    err.to_string().contains("already contains")
}
