//! # Store Error Types
//!
//! One taxonomy for every backend, so callers never match on engine-specific
//! failures.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error / reqwest::Error / HTTP status                     │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  StoreError (this module)                                       │
//! │    NotFound · Conflict · Unavailable · PartialFailure ·         │
//! │    NotConfigured · Unknown                                      │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  Dispatcher passes it through unchanged (no retries here)       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `PartialFailure` exists only for the remote relational backend, whose
//! `record_sale` has no rollback: it names what was already committed so a
//! caller never conflates it with total failure.

use thiserror::Error;

/// Persistence layer errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Id has no matching row/document.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (duplicate username, duplicate id).
    #[error("duplicate {field}: '{value}' already exists")]
    Conflict { field: String, value: String },

    /// Storage engine unreachable (transport failure, pool exhausted).
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// A multi-step `record_sale` failed after some steps durably committed.
    /// Raised only by backends without native multi-statement atomicity.
    #[error(
        "sale {transaction_id} partially recorded ({committed} committed), \
         failed at {failed_step}: {source}"
    )]
    PartialFailure {
        transaction_id: String,
        /// Human-readable description of the steps that committed.
        committed: String,
        failed_step: String,
        #[source]
        source: Box<StoreError>,
    },

    /// No backend has been selected yet (pre-setup state), or the selected
    /// backend is missing its connection parameters.
    #[error("backend not configured: {0}")]
    NotConfigured(String),

    /// Wraps any lower-level failure that fits nothing above.
    #[error("storage error: {0}")]
    Unknown(String),
}

impl StoreError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn conflict(field: impl Into<String>, value: impl Into<String>) -> Self {
        StoreError::Conflict {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Convert sqlx errors from the embedded backend.
///
/// ## Mapping
/// ```text
/// sqlx::Error::RowNotFound       → NotFound
/// sqlx::Error::Database (UNIQUE) → Conflict
/// pool/io errors                 → Unavailable
/// everything else                → Unknown
/// ```
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::not_found("record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message().to_string();
                // SQLite reports "UNIQUE constraint failed: <table>.<column>"
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    StoreError::conflict(field.to_string(), "unknown")
                } else {
                    StoreError::Unknown(msg)
                }
            }

            sqlx::Error::PoolTimedOut => {
                StoreError::Unavailable("connection pool exhausted".into())
            }
            sqlx::Error::PoolClosed => StoreError::Unavailable("pool is closed".into()),
            sqlx::Error::Io(e) => StoreError::Unavailable(e.to_string()),

            other => StoreError::Unknown(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unknown(format!("migration failed: {err}"))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Unknown(format!("payload encoding: {err}"))
    }
}

/// Convert reqwest transport errors from the remote backends.
/// Status-code mapping happens in the adapters, which see the response body.
impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            StoreError::Unavailable(err.to_string())
        } else {
            StoreError::Unknown(err.to_string())
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
