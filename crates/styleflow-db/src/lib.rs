//! # styleflow-db: Database Layer for StyleFlow Retail
//!
//! This crate provides database access for StyleFlow Retail.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     StyleFlow Retail Data Flow                          │
//! │                                                                         │
//! │  InvoiceService::create / ExpenseService::create                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   styleflow-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │  │   │
//! │  │   │               │    │ SequenceRepo   │   │ 001_initial  │  │   │
//! │  │   │ SqlitePool    │◄───│ InvoiceRepo    │   │ 002_code_seq │  │   │
//! │  │   │ busy_timeout  │    │ ExpenseRepo    │   │              │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Sequence allocator, invoices, expenses
//!
//! ## Usage
//!
//! ```rust,ignore
//! use styleflow_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("styleflow.db")).await?;
//!
//! // Next number in the EXP series, committed before it is returned
//! let n = db.sequences().next_value("EXP").await?;
//! assert_eq!(styleflow_core::format_code("EXP", n), "EXP-001");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::expense::ExpenseRepository;
pub use repository::invoice::InvoiceRepository;
pub use repository::sequence::{LegacyCodeSource, SequenceRepository, SequenceSettings};
