//! # Billing Error Types
//!
//! ## What The Caller Sees
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbError::Busy("database is locked")                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BillingError::CreateFailed { entity: "invoice", source }              │
//! │       │                                                                 │
//! │       ├──► Display: "could not create invoice"   (user-facing)         │
//! │       └──► source():  "Database busy: ..."       (logs only)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use styleflow_core::ValidationError;
use styleflow_db::DbError;
use thiserror::Error;

/// Result type alias for billing use-cases.
pub type BillingResult<T> = Result<T, BillingError>;

/// Billing use-case errors.
#[derive(Debug, Error)]
pub enum BillingError {
    /// Input rejected before any code was allocated.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// A caller-supplied document number is already taken.
    #[error("{entity} number '{code}' is already in use")]
    DuplicateCode { entity: &'static str, code: String },

    /// Code allocation or the record insert failed. No record was stored.
    #[error("could not create {entity}")]
    CreateFailed {
        entity: &'static str,
        #[source]
        source: DbError,
    },

    /// Database failure outside a create operation.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BillingError {
    /// Wraps a failure of a create operation.
    ///
    /// Validation failures keep their message; everything else collapses to
    /// "could not create {entity}" with the cause kept as `source`.
    pub fn create_failed(entity: &'static str, err: DbError) -> Self {
        match err {
            DbError::Validation(e) => BillingError::Validation(e),
            source => BillingError::CreateFailed { entity, source },
        }
    }

    /// Returns true if repeating the whole operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            BillingError::CreateFailed { source, .. } | BillingError::Database(source) => {
                source.is_transient()
            }
            _ => false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file exists but could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value failed validation.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
