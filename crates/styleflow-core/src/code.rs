//! # Document Codes
//!
//! Formatting and parsing of human-readable document codes.
//!
//! ## Code Anatomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Document Code Format                             │
//! │                                                                         │
//! │        INV  -  057                                                      │
//! │        ───     ───                                                      │
//! │         │       │                                                       │
//! │         │       └── Allocated number, zero-padded to at least 3 digits │
//! │         │           (1000 renders as "1000", never truncated)          │
//! │         │                                                               │
//! │         └── Prefix: the numbering series (INV, EXP, QUO, ...)          │
//! │                                                                         │
//! │  The number comes from the sequence allocator (styleflow-db).          │
//! │  Formatting is pure and lives here.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use styleflow_core::code::{format_code, DocumentCode};
//!
//! assert_eq!(format_code("EXP", 42), "EXP-042");
//! assert_eq!(format_code("INV", 1000), "INV-1000");
//!
//! let code: DocumentCode = "QUO-007".parse().unwrap();
//! assert_eq!(code.number(), 7);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Minimum width of the numeric part of a display code.
pub const CODE_MIN_WIDTH: usize = 3;

/// Separator between prefix and number.
pub const CODE_SEPARATOR: char = '-';

/// Largest suffix a counter can be raised to and still hand out a next value.
///
/// Counters are stored as SQLite `INTEGER` (`i64`), so a legacy code at or
/// above `i64::MAX` would leave nothing to allocate.
pub const MAX_COUNTER_SUFFIX: u64 = (i64::MAX - 1) as u64;

/// Renders `{prefix}-{value}` with the value zero-padded to [`CODE_MIN_WIDTH`].
///
/// Values wider than the minimum width are rendered in full.
pub fn format_code(prefix: &str, value: u64) -> String {
    format!(
        "{}{}{:0width$}",
        prefix,
        CODE_SEPARATOR,
        value,
        width = CODE_MIN_WIDTH
    )
}

/// Extracts the numeric suffix of `code` if it is exactly `{prefix}-<digits>`.
///
/// This is the same rule the legacy reconciliation scan applies in SQL:
/// anything other than ASCII digits after the separator is not a match,
/// and neither is a number above [`MAX_COUNTER_SUFFIX`].
///
/// ## Example
/// ```rust
/// use styleflow_core::code::parse_suffix;
///
/// assert_eq!(parse_suffix("INV-057", "INV"), Some(57));
/// assert_eq!(parse_suffix("INV-05A", "INV"), None);
/// assert_eq!(parse_suffix("QUO-001", "INV"), None);
/// assert_eq!(parse_suffix("INV-99999999999999999999", "INV"), None);
/// ```
pub fn parse_suffix(code: &str, prefix: &str) -> Option<u64> {
    let digits = suffix_digits(code, prefix)?;
    digits
        .parse::<u64>()
        .ok()
        .filter(|n| *n <= MAX_COUNTER_SUFFIX)
}

/// Returns true if `code` has the `{prefix}-<digits>` shape but its number
/// is too large for a counter to continue from.
pub fn suffix_exceeds_counter(code: &str, prefix: &str) -> bool {
    suffix_digits(code, prefix).is_some() && parse_suffix(code, prefix).is_none()
}

fn suffix_digits<'a>(code: &'a str, prefix: &str) -> Option<&'a str> {
    let digits = code.strip_prefix(prefix)?.strip_prefix(CODE_SEPARATOR)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits)
}

/// A parsed document code: prefix plus allocated number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentCode {
    prefix: String,
    number: u64,
}

impl DocumentCode {
    /// Creates a code from an allocator result.
    pub fn new(prefix: impl Into<String>, number: u64) -> Self {
        DocumentCode {
            prefix: prefix.into(),
            number,
        }
    }

    /// The numbering series.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The allocated number.
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Renders the display string (same as `to_string()`).
    pub fn render(&self) -> String {
        format_code(&self.prefix, self.number)
    }
}

impl fmt::Display for DocumentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl FromStr for DocumentCode {
    type Err = ValidationError;

    /// Parses `{prefix}-{digits}`, splitting on the last separator.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: reason.to_string(),
        };

        let (prefix, digits) = s
            .rsplit_once(CODE_SEPARATOR)
            .ok_or_else(|| invalid("missing '-' separator"))?;

        if prefix.is_empty() {
            return Err(invalid("missing prefix"));
        }
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("number must contain only digits"));
        }

        let number = digits
            .parse()
            .map_err(|_| invalid("number is too large"))?;

        Ok(DocumentCode::new(prefix, number))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pads_to_three_digits() {
        assert_eq!(format_code("EXP", 42), "EXP-042");
        assert_eq!(format_code("STK", 1), "STK-001");
        assert_eq!(format_code("MEA", 100), "MEA-100");
    }

    #[test]
    fn test_format_grows_past_width() {
        assert_eq!(format_code("INV", 1000), "INV-1000");
        assert_eq!(format_code("INV", 123_456), "INV-123456");
    }

    #[test]
    fn test_parse_suffix() {
        assert_eq!(parse_suffix("INV-057", "INV"), Some(57));
        assert_eq!(parse_suffix("INV-1000", "INV"), Some(1000));
        assert_eq!(parse_suffix("INV-", "INV"), None);
        assert_eq!(parse_suffix("INV057", "INV"), None);
        assert_eq!(parse_suffix("INV-12-3", "INV"), None);
        // Prefix match is exact, not a substring match
        assert_eq!(parse_suffix("XINV-001", "INV"), None);
        assert_eq!(parse_suffix("INVX-001", "INV"), None);
    }

    #[test]
    fn test_parse_suffix_stays_within_counter_range() {
        let max = MAX_COUNTER_SUFFIX.to_string();
        assert_eq!(parse_suffix(&format!("INV-{}", max), "INV"), Some(MAX_COUNTER_SUFFIX));
        assert_eq!(parse_suffix(&format!("INV-{}", i64::MAX), "INV"), None);
        assert_eq!(parse_suffix("INV-99999999999999999999", "INV"), None);
        // Leading zeros do not count against the range
        assert_eq!(parse_suffix("INV-0000000000000000000061", "INV"), Some(61));

        assert!(suffix_exceeds_counter("INV-99999999999999999999", "INV"));
        assert!(suffix_exceeds_counter(&format!("INV-{}", i64::MAX), "INV"));
        assert!(!suffix_exceeds_counter(&format!("INV-{}", max), "INV"));
        assert!(!suffix_exceeds_counter("INV-5x", "INV"));
        assert!(!suffix_exceeds_counter("QUO-99999999999999999999", "INV"));
    }

    #[test]
    fn test_document_code_display_and_parse() {
        let code = DocumentCode::new("ADV", 9);
        assert_eq!(code.to_string(), "ADV-009");

        let parsed: DocumentCode = "ADV-009".parse().unwrap();
        assert_eq!(parsed, code);

        let wide: DocumentCode = "INV-1000".parse().unwrap();
        assert_eq!(wide.prefix(), "INV");
        assert_eq!(wide.number(), 1000);
    }

    #[test]
    fn test_document_code_rejects_garbage() {
        assert!("INV".parse::<DocumentCode>().is_err());
        assert!("-001".parse::<DocumentCode>().is_err());
        assert!("INV-".parse::<DocumentCode>().is_err());
        assert!("INV-0x1".parse::<DocumentCode>().is_err());
        assert!("INV-99999999999999999999999".parse::<DocumentCode>().is_err());
    }
}
