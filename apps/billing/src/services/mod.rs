//! # Billing Services
//!
//! - [`CodeGenerator`] - allocator + formatter (`EXP-042`)
//! - [`InvoiceService`] - invoices, quotations, advance payments
//! - [`ExpenseService`] - expenses

pub mod code_generator;
pub mod expense_service;
pub mod invoice_service;

pub use code_generator::{CodeGenerator, SequenceAllocator};
pub use expense_service::{ExpenseService, NewExpense};
pub use invoice_service::{InvoiceService, NewInvoice};
