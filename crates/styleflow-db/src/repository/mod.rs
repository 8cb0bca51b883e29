//! # Repository Module
//!
//! Database repository implementations for StyleFlow Retail.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  db.sequences().next_value("INV")   → 58    (own transaction)          │
//! │  db.invoices().insert(&invoice)     → ()    (code already allocated)   │
//! │  db.expenses().list(20)             → Vec<Expense>                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SequenceRepository`](sequence::SequenceRepository) - Code number allocation
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - Invoices, quotations, advance payments
//! - [`ExpenseRepository`](expense::ExpenseRepository) - Expense records

pub mod expense;
pub mod invoice;
pub mod sequence;
