//! # Domain Types
//!
//! Core domain types used throughout StyleFlow Retail.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ DocumentPrefix  │   │    Invoice      │   │    Expense      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  INV EXP MEA    │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  STK PUR QUO    │   │  code INV-001   │   │  code EXP-001   │       │
//! │  │  ADV            │   │  invoice_type   │   │  category       │       │
//! │  └─────────────────┘   │  status         │   │  amount_cents   │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  InvoiceType    │   │ InvoiceStatus   │   │ SequenceCounter │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Invoice → INV  │   │  Pending        │   │  prefix         │       │
//! │  │  Quotation→ QUO │   │  Partial        │   │  last_value     │       │
//! │  │  Advance → ADV  │   │  Paid / Hold    │   │  updated_at     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every document has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `code`: allocated display code (`INV-057`) - human-readable

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;

// =============================================================================
// Document Prefix
// =============================================================================

/// The known numbering series.
///
/// The allocator itself treats prefixes as opaque strings; this enum only
/// names the series the application mints codes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentPrefix {
    /// Sales invoices.
    Inv,
    /// Expenses.
    Exp,
    /// Tailoring measurements.
    Mea,
    /// Stock entries.
    Stk,
    /// Purchases.
    Pur,
    /// Quotations (stored in the invoices table).
    Quo,
    /// Advance payments (stored in the invoices table).
    Adv,
}

impl DocumentPrefix {
    /// All known series, in display order.
    pub const ALL: [DocumentPrefix; 7] = [
        DocumentPrefix::Inv,
        DocumentPrefix::Exp,
        DocumentPrefix::Mea,
        DocumentPrefix::Stk,
        DocumentPrefix::Pur,
        DocumentPrefix::Quo,
        DocumentPrefix::Adv,
    ];

    /// The prefix string stored in `code_sequences.prefix`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DocumentPrefix::Inv => "INV",
            DocumentPrefix::Exp => "EXP",
            DocumentPrefix::Mea => "MEA",
            DocumentPrefix::Stk => "STK",
            DocumentPrefix::Pur => "PUR",
            DocumentPrefix::Quo => "QUO",
            DocumentPrefix::Adv => "ADV",
        }
    }
}

impl fmt::Display for DocumentPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentPrefix {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        DocumentPrefix::ALL
            .into_iter()
            .find(|p| p.as_str() == upper)
            .ok_or_else(|| CoreError::UnknownPrefix(s.to_string()))
    }
}

// =============================================================================
// Invoice Type
// =============================================================================

/// The kind of document stored in the invoices table.
///
/// Each kind has its own numbering series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceType {
    /// Regular sales invoice.
    #[default]
    Invoice,
    /// Price quotation.
    Quotation,
    /// Advance payment receipt.
    AdvancePayment,
}

impl InvoiceType {
    /// The numbering series for this kind of document.
    pub const fn prefix(&self) -> DocumentPrefix {
        match self {
            InvoiceType::Invoice => DocumentPrefix::Inv,
            InvoiceType::Quotation => DocumentPrefix::Quo,
            InvoiceType::AdvancePayment => DocumentPrefix::Adv,
        }
    }

    /// Human-readable label used by the admin frontend.
    pub const fn label(&self) -> &'static str {
        match self {
            InvoiceType::Invoice => "Invoice",
            InvoiceType::Quotation => "Quotation",
            InvoiceType::AdvancePayment => "Advance Payment",
        }
    }
}

impl FromStr for InvoiceType {
    type Err = CoreError;

    /// Accepts both the frontend labels ("Advance Payment") and snake_case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "invoice" => Ok(InvoiceType::Invoice),
            "quotation" => Ok(InvoiceType::Quotation),
            "advance_payment" => Ok(InvoiceType::AdvancePayment),
            _ => Err(CoreError::UnknownInvoiceType(s.to_string())),
        }
    }
}

// =============================================================================
// Invoice Status
// =============================================================================

/// Payment status of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Nothing paid yet.
    #[default]
    Pending,
    /// Partially paid.
    Partial,
    /// Fully paid.
    Paid,
    /// On hold.
    Hold,
}

impl FromStr for InvoiceStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(InvoiceStatus::Pending),
            "partial" => Ok(InvoiceStatus::Partial),
            "paid" => Ok(InvoiceStatus::Paid),
            "hold" => Ok(InvoiceStatus::Hold),
            _ => Err(CoreError::UnknownInvoiceStatus(s.to_string())),
        }
    }
}

// =============================================================================
// Sequence Counter
// =============================================================================

/// A persisted `code_sequences` row.
///
/// `last_value` is the last number handed out for `prefix`; it only ever
/// grows. Stored as `i64` because that is SQLite's native integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SequenceCounter {
    /// Numbering series key.
    pub prefix: String,

    /// Last number issued (0 = nothing issued yet).
    pub last_value: i64,

    /// When the counter last changed.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Invoice
// =============================================================================

/// An invoice, quotation, or advance payment.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Invoice {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display code (`INV-057`, `QUO-003`, ...).
    pub code: String,

    /// Customer this document is for.
    pub customer_id: String,

    /// Which series the document belongs to.
    pub invoice_type: InvoiceType,

    /// Payment status.
    pub status: InvoiceStatus,

    /// Grand total in cents.
    pub total_cents: i64,

    /// Amount paid so far in cents.
    pub paid_cents: i64,

    /// Free-form notes.
    pub notes: Option<String>,

    /// User who created the document.
    pub created_by: String,

    /// When the document was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the document was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Outstanding balance in cents (never negative).
    pub fn balance_due_cents(&self) -> i64 {
        (self.total_cents - self.paid_cents).max(0)
    }
}

// =============================================================================
// Expense
// =============================================================================

/// A recorded shop expense.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Expense {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display code (`EXP-042`).
    pub code: String,

    /// Expense category (rent, utilities, ...).
    pub category: String,

    /// Amount in cents.
    pub amount_cents: i64,

    /// Optional description.
    pub description: Option<String>,

    /// Date the expense was incurred.
    #[ts(as = "String")]
    pub expense_date: NaiveDate,

    /// When the record was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
