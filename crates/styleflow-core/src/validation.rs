//! # Validation Module
//!
//! Input validation for everything that reaches the allocator or the
//! document tables.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Use-case (apps/billing)                                      │
//! │  └── THIS MODULE: prefix, category, amount checks                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Repository (styleflow-db)                                    │
//! │  └── validate_sql_identifier for configured legacy tables              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (last_value >= 0)                                           │
//! │  └── UNIQUE (code)                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::code::{suffix_exceeds_counter, MAX_COUNTER_SUFFIX};
use crate::error::ValidationError;
use crate::{LEGACY_INVOICE_PREFIXES, MAX_CATEGORY_LEN, MAX_PREFIX_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a SQL identifier accepted from configuration.
const MAX_IDENTIFIER_LEN: usize = 64;

// =============================================================================
// Prefix Validators
// =============================================================================

/// Validates a sequence prefix.
///
/// ## Rules
/// - Must not be empty or contain whitespace
/// - At most [`MAX_PREFIX_LEN`] characters
/// - ASCII letters, digits, and underscores only (the `-` separator is
///   reserved for the display code)
///
/// ## Example
/// ```rust
/// use styleflow_core::validation::validate_prefix;
///
/// assert!(validate_prefix("INV").is_ok());
/// assert!(validate_prefix("").is_err());
/// assert!(validate_prefix("IN-V").is_err());
/// ```
pub fn validate_prefix(prefix: &str) -> ValidationResult<()> {
    if prefix.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "prefix".to_string(),
        });
    }

    if prefix.len() > MAX_PREFIX_LEN {
        return Err(ValidationError::TooLong {
            field: "prefix".to_string(),
            max: MAX_PREFIX_LEN,
        });
    }

    if !prefix
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "prefix".to_string(),
            reason: "must contain only ASCII letters, digits, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a table or column name that will be interpolated into SQL.
///
/// Bind parameters cannot name tables, so configured legacy sources must
/// pass this check before any query is built from them.
///
/// ## Example
/// ```rust
/// use styleflow_core::validation::validate_sql_identifier;
///
/// assert!(validate_sql_identifier("invoices").is_ok());
/// assert!(validate_sql_identifier("invoices; DROP TABLE x").is_err());
/// ```
pub fn validate_sql_identifier(ident: &str) -> ValidationResult<()> {
    let mut bytes = ident.bytes();

    let first = bytes.next().ok_or_else(|| ValidationError::Required {
        field: "identifier".to_string(),
    })?;

    if ident.len() > MAX_IDENTIFIER_LEN {
        return Err(ValidationError::TooLong {
            field: "identifier".to_string(),
            max: MAX_IDENTIFIER_LEN,
        });
    }

    if !(first.is_ascii_alphabetic() || first == b'_')
        || !bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "identifier".to_string(),
            reason: format!("'{}' is not a plain SQL identifier", ident),
        });
    }

    Ok(())
}

// =============================================================================
// Expense Validators
// =============================================================================

/// Validates an expense category.
///
/// ## Returns
/// The trimmed category.
pub fn validate_category(category: &str) -> ValidationResult<String> {
    let category = category.trim();

    if category.is_empty() {
        return Err(ValidationError::Required {
            field: "category".to_string(),
        });
    }

    if category.len() > MAX_CATEGORY_LEN {
        return Err(ValidationError::TooLong {
            field: "category".to_string(),
            max: MAX_CATEGORY_LEN,
        });
    }

    Ok(category.to_string())
}

/// Validates a monetary amount in cents.
///
/// Expenses must be positive; invoice totals may be zero.
pub fn validate_amount_cents(field: &str, cents: i64, allow_zero: bool) -> ValidationResult<()> {
    if cents < 0 || (!allow_zero && cents == 0) {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a caller-supplied invoice number.
///
/// Free-form numbers are accepted as long as a legacy-shaped one
/// (`INV-<digits>`, `QUO-<digits>`, `ADV-<digits>`) stays within
/// [`MAX_COUNTER_SUFFIX`]. The allocator skips larger suffixes, so
/// storing one would leave a code it can never continue from.
///
/// ## Example
/// ```rust
/// use styleflow_core::validation::validate_invoice_number;
///
/// assert!(validate_invoice_number("INV-057").is_ok());
/// assert!(validate_invoice_number("Q-2024-17").is_ok());
/// assert!(validate_invoice_number("INV-99999999999999999999").is_err());
/// ```
pub fn validate_invoice_number(number: &str) -> ValidationResult<()> {
    let oversized = LEGACY_INVOICE_PREFIXES
        .iter()
        .any(|prefix| suffix_exceeds_counter(number, prefix.as_str()));

    if oversized {
        return Err(ValidationError::OutOfRange {
            field: "invoice_number".to_string(),
            min: 0,
            max: MAX_COUNTER_SUFFIX as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use styleflow_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
