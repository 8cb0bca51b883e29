//! # StyleFlow Billing
//!
//! Use-case layer that hands out document codes and stores the records
//! that carry them.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Billing Services                                │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │ InvoiceService │  │ ExpenseService │  │  CodeGenerator             ││
//! │  │                │  │                │  │                            ││
//! │  │ • create       │  │ • create       │  │ • generate("EXP")          ││
//! │  │   INV/QUO/ADV  │  │   EXP          │  │ • generate_for(Stk)        ││
//! │  └───────┬────────┘  └───────┬────────┘  └─────────────▲──────────────┘│
//! │          └───────────────────┴─────────────────────────┘               │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │  ┌──────────────────────────┐  ┌──────────────────────────────┐ │  │
//! │  │  │  SQLite (styleflow-db)   │  │  Redis (optional)            │ │  │
//! │  │  │  code_sequences,         │  │  cache:dashboard             │ │  │
//! │  │  │  invoices, expenses      │  │  invalidation                │ │  │
//! │  │  └──────────────────────────┘  └──────────────────────────────┘ │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`] for the TOML layout. Environment overrides:
//! - `STYLEFLOW_DB_PATH` - SQLite database file
//! - `STYLEFLOW_DB_MAX_CONNECTIONS` - pool size (default: 8)
//! - `STYLEFLOW_DB_BUSY_TIMEOUT_MS` - write lock wait (default: 5000)
//! - `STYLEFLOW_MAX_CAS_ATTEMPTS` - allocator retries (default: 5)
//! - `STYLEFLOW_REDIS_URL` - Redis connection string
//! - `STYLEFLOW_LOG_LEVEL` - default log filter (default: info)

pub mod cache;
pub mod config;
pub mod error;
pub mod services;

use std::sync::Arc;

use tracing::{info, warn};

use styleflow_db::Database;

// Re-exports
pub use cache::{CacheInvalidator, NoopCache, RedisCache};
pub use config::BillingConfig;
pub use error::{BillingError, BillingResult, ConfigError};
pub use services::{
    CodeGenerator, ExpenseService, InvoiceService, NewExpense, NewInvoice, SequenceAllocator,
};

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub codes: CodeGenerator,
    pub invoices: InvoiceService,
    pub expenses: ExpenseService,
    pub cache: Arc<dyn CacheInvalidator>,
    pub config: BillingConfig,
}

impl AppState {
    /// Connects the database and wires the services.
    ///
    /// A Redis URL that cannot be parsed downgrades to [`NoopCache`] with a
    /// warning; the cache is optional.
    pub async fn init(config: BillingConfig) -> BillingResult<Self> {
        let db = Database::new(config.db_config()).await?;
        let sequences = db.sequences_with(config.sequences.clone())?;

        let cache: Arc<dyn CacheInvalidator> = match config.cache.redis_url {
            Some(ref url) => match RedisCache::open(url) {
                Ok(redis) => {
                    info!("Redis cache invalidation enabled");
                    Arc::new(redis)
                }
                Err(e) => {
                    warn!(error = %e, "Invalid Redis URL, continuing without cache");
                    Arc::new(NoopCache)
                }
            },
            None => Arc::new(NoopCache),
        };

        let codes = CodeGenerator::new(sequences);
        let invoices = InvoiceService::new(db.invoices(), codes.clone(), cache.clone());
        let expenses = ExpenseService::new(db.expenses(), codes.clone(), cache.clone());

        Ok(AppState {
            db,
            codes,
            invoices,
            expenses,
            cache,
            config,
        })
    }
}
