//! # Code Generator
//!
//! Turns an allocated sequence number into a display code.
//!
//! ```text
//! generate("EXP")
//!   ├── validate_prefix("EXP")            reject "" / "IN-V" up front
//!   ├── allocator.allocate("EXP") → 42    committed before it returns
//!   └── DocumentCode("EXP", 42)   → "EXP-042"
//! ```
//!
//! The number is committed in its own transaction before the record that
//! carries it is inserted. If that insert then fails the number is burned:
//! the series has a gap, never a duplicate.

use async_trait::async_trait;
use tracing::debug;

use styleflow_core::validation::validate_prefix;
use styleflow_core::{DocumentCode, DocumentPrefix};
use styleflow_db::{DbResult, SequenceRepository};

/// Source of per-prefix sequence numbers.
#[async_trait]
pub trait SequenceAllocator: Send + Sync {
    /// Returns the next number for `prefix`, durably recorded.
    async fn allocate(&self, prefix: &str) -> DbResult<u64>;
}

#[async_trait]
impl SequenceAllocator for SequenceRepository {
    async fn allocate(&self, prefix: &str) -> DbResult<u64> {
        self.next_value(prefix).await
    }
}

/// Generates display codes from an allocator.
#[derive(Debug, Clone)]
pub struct CodeGenerator<A = SequenceRepository> {
    allocator: A,
}

impl<A: SequenceAllocator> CodeGenerator<A> {
    pub fn new(allocator: A) -> Self {
        CodeGenerator { allocator }
    }

    /// Allocates the next code for any prefix.
    pub async fn generate(&self, prefix: &str) -> DbResult<DocumentCode> {
        validate_prefix(prefix)?;

        let number = self.allocator.allocate(prefix).await?;
        let code = DocumentCode::new(prefix, number);

        debug!(prefix = %prefix, code = %code, "Generated document code");
        Ok(code)
    }

    /// Allocates the next code for a known document series.
    pub async fn generate_for(&self, prefix: DocumentPrefix) -> DbResult<DocumentCode> {
        self.generate(prefix.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use styleflow_db::{Database, DbConfig, DbError};

    /// In-memory allocator counting calls.
    #[derive(Default)]
    struct MockAllocator {
        counters: Mutex<HashMap<String, u64>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SequenceAllocator for MockAllocator {
        async fn allocate(&self, prefix: &str) -> DbResult<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut counters = self.counters.lock().unwrap();
            let value = counters.entry(prefix.to_string()).or_insert(0);
            *value += 1;
            Ok(*value)
        }
    }

    struct UnavailableAllocator;

    #[async_trait]
    impl SequenceAllocator for UnavailableAllocator {
        async fn allocate(&self, _prefix: &str) -> DbResult<u64> {
            Err(DbError::ConnectionFailed("Pool is closed".into()))
        }
    }

    #[tokio::test]
    async fn test_generates_padded_codes_per_series() {
        let generator = CodeGenerator::new(MockAllocator::default());

        assert_eq!(generator.generate("INV").await.unwrap().to_string(), "INV-001");
        assert_eq!(generator.generate("INV").await.unwrap().to_string(), "INV-002");
        assert_eq!(generator.generate("EXP").await.unwrap().to_string(), "EXP-001");

        let stk = generator.generate_for(DocumentPrefix::Stk).await.unwrap();
        assert_eq!(stk.prefix(), "STK");
        assert_eq!(stk.number(), 1);
        assert_eq!(stk.to_string(), "STK-001");
    }

    #[tokio::test]
    async fn test_invalid_prefix_never_reaches_allocator() {
        let generator = CodeGenerator::new(MockAllocator::default());

        for bad in ["", "   ", "IN-V", "TOO_LONG_PREFIX_VALUE"] {
            let err = generator.generate(bad).await.unwrap_err();
            assert!(matches!(err, DbError::Validation(_)), "{bad:?} accepted");
        }

        assert_eq!(generator.allocator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_allocator_failure_propagates() {
        let generator = CodeGenerator::new(UnavailableAllocator);
        let err = generator.generate("EXP").await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_database_allocator() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let generator = CodeGenerator::new(db.sequences());

        assert_eq!(generator.generate("MEA").await.unwrap().to_string(), "MEA-001");
        assert_eq!(generator.generate("MEA").await.unwrap().to_string(), "MEA-002");
        assert_eq!(
            generator.generate_for(DocumentPrefix::Pur).await.unwrap().to_string(),
            "PUR-001"
        );
    }
}
