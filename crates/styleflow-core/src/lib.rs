//! # styleflow-core: Pure Domain Types for StyleFlow Retail
//!
//! This crate holds the document-code rules and domain types shared by the
//! database layer and the billing use-cases. It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     StyleFlow Retail Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               apps/billing (use-cases, CLI)                     │   │
//! │  │    InvoiceService, ExpenseService, CodeGenerator                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ styleflow-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                  │   │
//! │  │   │   types   │  │   code    │  │ validation│                  │   │
//! │  │   │  Invoice  │  │ INV-001   │  │  prefix   │                  │   │
//! │  │   │  Expense  │  │ format    │  │  idents   │                  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               styleflow-db (Database Layer)                     │   │
//! │  │        SQLite, migrations, sequence allocator, repositories     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (DocumentPrefix, Invoice, Expense, ...)
//! - [`code`] - Display code formatting and parsing
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use styleflow_core::{format_code, DocumentPrefix, InvoiceType};
//!
//! let prefix = InvoiceType::Quotation.prefix();
//! assert_eq!(prefix, DocumentPrefix::Quo);
//! assert_eq!(format_code(prefix.as_str(), 7), "QUO-007");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod code;
pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use code::{
    format_code, parse_suffix, suffix_exceeds_counter, DocumentCode, MAX_COUNTER_SUFFIX,
};
pub use error::{CoreError, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a sequence prefix.
pub const MAX_PREFIX_LEN: usize = 16;

/// Maximum length of an expense category.
pub const MAX_CATEGORY_LEN: usize = 100;

/// Prefixes reconciled against legacy invoice codes by default.
///
/// Invoice codes used to be derived from record counts before the
/// `code_sequences` table existed, so these three series must never hand
/// out a number already present in `invoices.code`.
pub const LEGACY_INVOICE_PREFIXES: [DocumentPrefix; 3] =
    [DocumentPrefix::Inv, DocumentPrefix::Quo, DocumentPrefix::Adv];
