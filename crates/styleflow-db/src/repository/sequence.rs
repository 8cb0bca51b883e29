//! # Sequence Repository
//!
//! Transactional allocator for document code numbers (`INV-001`, `EXP-042`).
//!
//! ## Allocation Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   next_value("INV") - ONE TRANSACTION                   │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  1. INSERT INTO code_sequences (prefix, last_value) VALUES ('INV', 0)  │
//! │     ON CONFLICT DO NOTHING                                             │
//! │     └── first statement is a write: SQLite hands this transaction the  │
//! │         database write lock here (others wait up to busy_timeout)      │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  2. Legacy reconciliation (only prefixes listed in a LegacyCodeSource) │
//! │     SELECT MAX(suffix) FROM invoices WHERE code = 'INV-<digits>'       │
//! │     UPDATE code_sequences SET last_value = max                         │
//! │       WHERE prefix = 'INV' AND last_value < max    ← monotone merge    │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  3. SELECT last_value → observed                                       │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  4. UPDATE code_sequences SET last_value = observed + 1                │
//! │       WHERE prefix = 'INV' AND last_value = observed  ← compare & swap │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  5. SELECT last_value → returned to caller                             │
//! │    │                                                                    │
//! │  COMMIT   (any error in 1-5 → ROLLBACK, nothing persisted)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - For one prefix, returned values strictly increase and never repeat.
//! - The only gaps are legacy reconciliation jumps and values whose
//!   committing caller went away before using them.
//! - The counter never drops below the highest legacy code it reconciles.
//!   Suffixes above `MAX_COUNTER_SUFFIX` are not reconciled.
//! - `last_value` is never cached; every call re-reads the table.
//!
//! SQLite has no row-level locks, so step 1's write lock stands in for
//! `SELECT ... FOR UPDATE`. While that lock is held nothing else can move
//! the counter, so on SQLite the swap in step 4 only loses when something
//! inside the same connection rewrites the row (a trigger, say). It keeps
//! the no-duplicate contract on a store whose lock is weaker; a lost swap
//! rolls back and retries up to `max_cas_attempts` times.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use styleflow_core::validation::{validate_prefix, validate_sql_identifier};
use styleflow_core::{SequenceCounter, LEGACY_INVOICE_PREFIXES, MAX_COUNTER_SUFFIX};

/// Default number of compare-and-swap attempts per allocation.
pub const DEFAULT_MAX_CAS_ATTEMPTS: u32 = 5;

// =============================================================================
// Settings
// =============================================================================

/// A table whose existing codes a set of prefixes must stay ahead of.
///
/// ## Example (TOML)
/// ```toml
/// [[sequences.legacy_sources]]
/// table = "invoices"
/// column = "code"
/// prefixes = ["INV", "QUO", "ADV"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyCodeSource {
    /// Table holding the legacy codes.
    pub table: String,

    /// Column holding `{prefix}-{digits}` strings.
    pub column: String,

    /// Prefixes reconciled against this column.
    pub prefixes: Vec<String>,
}

impl LegacyCodeSource {
    /// `invoices.code` for `INV`, `QUO`, and `ADV`.
    pub fn invoices() -> Self {
        LegacyCodeSource {
            table: "invoices".to_string(),
            column: "code".to_string(),
            prefixes: LEGACY_INVOICE_PREFIXES
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
        }
    }

    /// Checks identifiers and prefixes before any SQL is built from them.
    pub fn validate(&self) -> DbResult<()> {
        validate_sql_identifier(&self.table)?;
        validate_sql_identifier(&self.column)?;
        for prefix in &self.prefixes {
            validate_prefix(prefix)?;
        }
        Ok(())
    }

    /// Returns true if `prefix` is reconciled against this source.
    pub fn covers(&self, prefix: &str) -> bool {
        self.prefixes.iter().any(|p| p == prefix)
    }

    /// Highest numeric suffix among `{prefix}-<digits>` codes, if any.
    ///
    /// Matches exactly what [`styleflow_core::parse_suffix`] accepts: the
    /// prefix and separator must match byte for byte, everything after
    /// them must be one or more ASCII digits, and the number must not
    /// exceed [`MAX_COUNTER_SUFFIX`]. Larger numbers would saturate
    /// `CAST(... AS INTEGER)` at `i64::MAX` and leave the counter stuck.
    async fn max_suffix(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        prefix: &str,
    ) -> DbResult<Option<i64>> {
        // Identifiers were validated in SequenceSettings::validate.
        // Digit runs compare as text once leading zeros are gone.
        let sql = format!(
            r#"
            SELECT MAX(CAST(digits AS INTEGER))
            FROM (
                SELECT LTRIM(SUBSTR("{col}", ?2), '0') AS digits
                FROM "{table}"
                WHERE SUBSTR("{col}", 1, ?3) = ?1
                  AND LENGTH("{col}") > ?3
                  AND SUBSTR("{col}", ?2) NOT GLOB '*[^0-9]*'
            )
            WHERE LENGTH(digits) < ?5
               OR (LENGTH(digits) = ?5 AND digits <= ?4)
            "#,
            col = self.column,
            table = self.table,
        );

        let head = format!("{}-", prefix);
        let head_len = head.len() as i64;
        let limit = MAX_COUNTER_SUFFIX.to_string();
        let limit_len = limit.len() as i64;

        let max: Option<i64> = sqlx::query_scalar(&sql)
            .bind(&head)
            .bind(head_len + 1)
            .bind(head_len)
            .bind(&limit)
            .bind(limit_len)
            .fetch_one(&mut **tx)
            .await?;

        Ok(max)
    }
}

/// Allocator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceSettings {
    /// Tables reconciled on every allocation for their prefixes.
    pub legacy_sources: Vec<LegacyCodeSource>,

    /// Compare-and-swap attempts before giving up with `SequenceConflict`.
    pub max_cas_attempts: u32,
}

impl Default for SequenceSettings {
    fn default() -> Self {
        SequenceSettings {
            legacy_sources: vec![LegacyCodeSource::invoices()],
            max_cas_attempts: DEFAULT_MAX_CAS_ATTEMPTS,
        }
    }
}

impl SequenceSettings {
    /// Settings with no legacy reconciliation at all.
    pub fn without_legacy() -> Self {
        SequenceSettings {
            legacy_sources: Vec::new(),
            ..Self::default()
        }
    }

    /// Validates every legacy source and the retry budget.
    pub fn validate(&self) -> DbResult<()> {
        if self.max_cas_attempts == 0 {
            return Err(DbError::Validation(
                styleflow_core::ValidationError::MustBePositive {
                    field: "max_cas_attempts".to_string(),
                },
            ));
        }
        for source in &self.legacy_sources {
            source.validate()?;
        }
        Ok(())
    }

    fn sources_for<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a LegacyCodeSource> {
        self.legacy_sources.iter().filter(move |s| s.covers(prefix))
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for `code_sequences`: the sequence allocator.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    pool: SqlitePool,
    settings: Arc<SequenceSettings>,
}

impl SequenceRepository {
    /// Creates an allocator with the default settings
    /// (`INV`/`QUO`/`ADV` reconciled against `invoices.code`).
    pub fn new(pool: SqlitePool) -> Self {
        SequenceRepository {
            pool,
            settings: Arc::new(SequenceSettings::default()),
        }
    }

    /// Creates an allocator with explicit settings.
    ///
    /// ## Errors
    /// `DbError::Validation` if a legacy source names an invalid table,
    /// column, or prefix.
    pub fn with_settings(pool: SqlitePool, settings: SequenceSettings) -> DbResult<Self> {
        settings.validate()?;
        Ok(SequenceRepository {
            pool,
            settings: Arc::new(settings),
        })
    }

    /// The active settings.
    pub fn settings(&self) -> &SequenceSettings {
        &self.settings
    }

    /// Allocates the next number for `prefix`.
    ///
    /// ## Returns
    /// The new value (`>= 1`), already committed.
    ///
    /// ## Errors
    /// - `DbError::Validation` for an empty or malformed prefix
    /// - `DbError::Busy` / `ConnectionFailed` / `PoolExhausted` when the
    ///   store is unavailable; nothing was issued
    /// - `DbError::SequenceConflict` if every compare-and-swap lost
    ///
    /// ## Example
    /// ```rust,ignore
    /// let n = db.sequences().next_value("INV").await?;
    /// let code = styleflow_core::format_code("INV", n);
    /// ```
    pub async fn next_value(&self, prefix: &str) -> DbResult<u64> {
        validate_prefix(prefix)?;

        let max_attempts = self.settings.max_cas_attempts;
        let mut attempt = 1;

        loop {
            let mut tx = self.pool.begin().await?;

            match self.next_value_in(&mut tx, prefix).await {
                Ok(value) => {
                    tx.commit().await?;
                    debug!(prefix = %prefix, value, attempt, "Allocated sequence value");
                    return Ok(value);
                }
                Err(DbError::SequenceConflict { .. }) if attempt < max_attempts => {
                    tx.rollback().await?;
                    warn!(prefix = %prefix, attempt, "Sequence swap lost, retrying");
                    attempt += 1;
                }
                Err(DbError::SequenceConflict { .. }) => {
                    tx.rollback().await?;
                    return Err(DbError::SequenceConflict {
                        prefix: prefix.to_string(),
                        attempts: attempt,
                    });
                }
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        warn!(prefix = %prefix, error = %rollback_err, "Rollback failed");
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Runs allocation steps 1-5 inside a caller-owned transaction.
    ///
    /// Nothing is visible to other connections until the caller commits;
    /// dropping or rolling back `tx` discards the increment. Use this to
    /// allocate a code and insert the record that carries it atomically.
    ///
    /// A lost compare-and-swap surfaces as `DbError::SequenceConflict`
    /// with `attempts: 1`; retrying is up to the caller.
    pub async fn next_value_in(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        prefix: &str,
    ) -> DbResult<u64> {
        validate_prefix(prefix)?;
        let now = Utc::now();

        // 1. Ensure the row exists (and take the write lock)
        sqlx::query(
            r#"
            INSERT INTO code_sequences (prefix, last_value, updated_at)
            VALUES (?1, 0, ?2)
            ON CONFLICT(prefix) DO NOTHING
            "#,
        )
        .bind(prefix)
        .bind(now)
        .execute(&mut **tx)
        .await?;

        // 2. Legacy reconciliation
        for source in self.settings.sources_for(prefix) {
            let Some(legacy_max) = source.max_suffix(tx, prefix).await? else {
                continue;
            };

            let raised = sqlx::query(
                r#"
                UPDATE code_sequences
                SET last_value = ?2
                WHERE prefix = ?1 AND last_value < ?2
                "#,
            )
            .bind(prefix)
            .bind(legacy_max)
            .execute(&mut **tx)
            .await?;

            if raised.rows_affected() > 0 {
                info!(
                    prefix = %prefix,
                    table = %source.table,
                    legacy_max,
                    "Sequence raised to legacy maximum"
                );
            }
        }

        // 3. Observe under the lock
        let observed: i64 =
            sqlx::query_scalar("SELECT last_value FROM code_sequences WHERE prefix = ?1")
                .bind(prefix)
                .fetch_one(&mut **tx)
                .await?;

        let next = observed.checked_add(1).ok_or_else(|| {
            DbError::InvalidData(format!("sequence '{}' overflowed", prefix))
        })?;

        // 4. Compare-and-swap increment
        let swapped = sqlx::query(
            r#"
            UPDATE code_sequences
            SET last_value = ?3, updated_at = ?4
            WHERE prefix = ?1 AND last_value = ?2
            "#,
        )
        .bind(prefix)
        .bind(observed)
        .bind(next)
        .bind(now)
        .execute(&mut **tx)
        .await?;

        if swapped.rows_affected() != 1 {
            return Err(DbError::SequenceConflict {
                prefix: prefix.to_string(),
                attempts: 1,
            });
        }

        // 5. Read back
        let stored: i64 =
            sqlx::query_scalar("SELECT last_value FROM code_sequences WHERE prefix = ?1")
                .bind(prefix)
                .fetch_one(&mut **tx)
                .await?;

        u64::try_from(stored).map_err(|_| {
            DbError::InvalidData(format!("sequence '{}' has negative value {}", prefix, stored))
        })
    }

    /// Gets the counter row for a prefix without touching it.
    pub async fn current(&self, prefix: &str) -> DbResult<Option<SequenceCounter>> {
        let counter = sqlx::query_as::<_, SequenceCounter>(
            r#"
            SELECT prefix, last_value, updated_at
            FROM code_sequences
            WHERE prefix = ?1
            "#,
        )
        .bind(prefix)
        .fetch_optional(&self.pool)
        .await?;

        Ok(counter)
    }

    /// Lists every counter, ordered by prefix.
    pub async fn list(&self) -> DbResult<Vec<SequenceCounter>> {
        let counters = sqlx::query_as::<_, SequenceCounter>(
            r#"
            SELECT prefix, last_value, updated_at
            FROM code_sequences
            ORDER BY prefix
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(counters)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use std::collections::BTreeSet;
    use std::time::Duration;

    async fn memory_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// File-backed database so several pooled connections share one store.
    async fn file_db(dir: &tempfile::TempDir) -> Database {
        let config = DbConfig::new(dir.path().join("sequences.db"))
            .max_connections(8)
            .busy_timeout(Duration::from_secs(30));
        Database::new(config).await.unwrap()
    }

    async fn insert_legacy_code(db: &Database, code: &str) {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO invoices (id, code, customer_id, created_by, created_at, updated_at)
            VALUES (?1, ?2, 'cust-1', 'admin', ?3, ?3)
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(code)
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_first_value_is_one() {
        let db = memory_db().await;
        assert_eq!(db.sequences().next_value("EXP").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sequential_values_increase_by_one() {
        let db = memory_db().await;
        let seq = db.sequences();

        let values: Vec<u64> = {
            let mut v = Vec::new();
            for _ in 0..5 {
                v.push(seq.next_value("STK").await.unwrap());
            }
            v
        };

        assert_eq!(values, vec![1, 2, 3, 4, 5]);

        let counter = seq.current("STK").await.unwrap().unwrap();
        assert_eq!(counter.last_value, 5);
    }

    #[tokio::test]
    async fn test_prefixes_are_independent() {
        let db = memory_db().await;
        let seq = db.sequences();

        assert_eq!(seq.next_value("INV").await.unwrap(), 1);
        assert_eq!(seq.next_value("INV").await.unwrap(), 2);
        assert_eq!(seq.next_value("EXP").await.unwrap(), 1);
        assert_eq!(seq.next_value("INV").await.unwrap(), 3);
        assert_eq!(seq.next_value("EXP").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_legacy_codes_pull_counter_up() {
        let db = memory_db().await;
        insert_legacy_code(&db, "INV-057").await;
        insert_legacy_code(&db, "INV-012").await;

        let seq = db.sequences();
        assert_eq!(seq.next_value("INV").await.unwrap(), 58);
        assert_eq!(seq.next_value("INV").await.unwrap(), 59);
    }

    #[tokio::test]
    async fn test_reconciliation_never_lowers_counter() {
        let db = memory_db().await;
        let seq = db.sequences();

        for expected in 1..=3 {
            assert_eq!(seq.next_value("QUO").await.unwrap(), expected);
        }

        // Legacy code below the counter must not pull it back
        insert_legacy_code(&db, "QUO-002").await;
        assert_eq!(seq.next_value("QUO").await.unwrap(), 4);

        // Repeated scans of the same legacy max are no-ops
        insert_legacy_code(&db, "QUO-057").await;
        assert_eq!(seq.next_value("QUO").await.unwrap(), 58);
        assert_eq!(seq.next_value("QUO").await.unwrap(), 59);
        assert_eq!(seq.current("QUO").await.unwrap().unwrap().last_value, 59);
    }

    #[tokio::test]
    async fn test_malformed_legacy_codes_are_ignored() {
        let db = memory_db().await;
        insert_legacy_code(&db, "ADV-05A").await;
        insert_legacy_code(&db, "ADV-").await;
        insert_legacy_code(&db, "ADV-12-3").await;
        insert_legacy_code(&db, "ADVX-999").await;
        insert_legacy_code(&db, "adv-500").await;

        assert_eq!(db.sequences().next_value("ADV").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_oversized_legacy_suffix_is_ignored() {
        let db = memory_db().await;
        insert_legacy_code(&db, "INV-057").await;
        insert_legacy_code(&db, "INV-99999999999999999999").await;
        insert_legacy_code(&db, &format!("INV-{}", i64::MAX)).await;

        let seq = db.sequences();
        assert_eq!(seq.next_value("INV").await.unwrap(), 58);
        assert_eq!(seq.next_value("INV").await.unwrap(), 59);
    }

    #[tokio::test]
    async fn test_legacy_suffix_at_counter_limit() {
        let db = memory_db().await;
        insert_legacy_code(&db, &format!("QUO-{}", MAX_COUNTER_SUFFIX)).await;
        insert_legacy_code(&db, "ADV-0000000000000000000061").await;

        let seq = db.sequences();
        assert_eq!(seq.next_value("QUO").await.unwrap(), i64::MAX as u64);
        assert!(matches!(
            seq.next_value("QUO").await.unwrap_err(),
            DbError::InvalidData(_)
        ));

        // Leading zeros are not part of the number
        assert_eq!(seq.next_value("ADV").await.unwrap(), 62);
    }

    #[tokio::test]
    async fn test_unreconciled_prefix_ignores_legacy_table() {
        let db = memory_db().await;
        // EXP is not reconciled against invoices by default
        insert_legacy_code(&db, "EXP-900").await;

        assert_eq!(db.sequences().next_value("EXP").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_disabled_legacy_reconciliation() {
        let db = memory_db().await;
        insert_legacy_code(&db, "INV-057").await;

        let seq = db.sequences_with(SequenceSettings::without_legacy()).unwrap();
        assert_eq!(seq.next_value("INV").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_configured_legacy_source() {
        let db = memory_db().await;
        sqlx::query(
            r#"
            INSERT INTO expenses (id, code, category, amount_cents, expense_date, created_at)
            VALUES ('e-1', 'EXP-041', 'Rent', 5000, '2024-01-01', '2024-01-01T00:00:00Z')
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap();

        let settings = SequenceSettings {
            legacy_sources: vec![LegacyCodeSource {
                table: "expenses".to_string(),
                column: "code".to_string(),
                prefixes: vec!["EXP".to_string()],
            }],
            ..SequenceSettings::default()
        };

        let seq = db.sequences_with(settings).unwrap();
        assert_eq!(seq.next_value("EXP").await.unwrap(), 42);
        // INV is no longer covered by any source
        assert_eq!(seq.next_value("INV").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_settings_reject_unsafe_identifiers() {
        let db = memory_db().await;
        let settings = SequenceSettings {
            legacy_sources: vec![LegacyCodeSource {
                table: "invoices; DROP TABLE code_sequences".to_string(),
                column: "code".to_string(),
                prefixes: vec!["INV".to_string()],
            }],
            ..SequenceSettings::default()
        };

        let err = db.sequences_with(settings).unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        let zero_attempts = SequenceSettings {
            max_cas_attempts: 0,
            ..SequenceSettings::default()
        };
        assert!(db.sequences_with(zero_attempts).is_err());
    }

    #[tokio::test]
    async fn test_invalid_prefix_rejected() {
        let db = memory_db().await;
        let seq = db.sequences();

        assert!(matches!(
            seq.next_value("").await.unwrap_err(),
            DbError::Validation(_)
        ));
        assert!(matches!(
            seq.next_value("IN-V").await.unwrap_err(),
            DbError::Validation(_)
        ));
        assert!(seq.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rolled_back_allocation_leaves_no_trace() {
        let db = memory_db().await;
        let seq = db.sequences();

        assert_eq!(seq.next_value("PUR").await.unwrap(), 1);

        // Fail after the lock and increment, before commit
        let mut tx = db.pool().begin().await.unwrap();
        assert_eq!(seq.next_value_in(&mut tx, "PUR").await.unwrap(), 2);
        tx.rollback().await.unwrap();

        assert_eq!(seq.next_value("PUR").await.unwrap(), 2);
        assert_eq!(seq.current("PUR").await.unwrap().unwrap().last_value, 2);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back_new_row() {
        let db = memory_db().await;
        let seq = db.sequences();

        {
            let mut tx = db.pool().begin().await.unwrap();
            assert_eq!(seq.next_value_in(&mut tx, "MEA").await.unwrap(), 1);
            // tx dropped without commit
        }

        assert!(seq.current("MEA").await.unwrap().is_none());
        assert_eq!(seq.next_value("MEA").await.unwrap(), 1);
    }

    /// Makes every `+1` swap on `prefix` match no row.
    async fn lose_every_swap(db: &Database, prefix: &str) {
        sqlx::query(&format!(
            r#"
            CREATE TRIGGER lose_swap_{p}
            BEFORE UPDATE OF last_value ON code_sequences
            WHEN NEW.prefix = '{p}' AND NEW.last_value = OLD.last_value + 1
            BEGIN
                SELECT RAISE(IGNORE);
            END
            "#,
            p = prefix
        ))
        .execute(db.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_lost_swap_in_caller_transaction() {
        let db = memory_db().await;
        let seq = db.sequences();
        lose_every_swap(&db, "LCK").await;

        let mut tx = db.pool().begin().await.unwrap();
        match seq.next_value_in(&mut tx, "LCK").await.unwrap_err() {
            DbError::SequenceConflict { prefix, attempts } => {
                assert_eq!(prefix, "LCK");
                assert_eq!(attempts, 1);
            }
            other => panic!("expected SequenceConflict, got {other:?}"),
        }
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_lost_swaps_exhaust_retry_budget() {
        let db = memory_db().await;
        let settings = SequenceSettings {
            max_cas_attempts: 3,
            ..SequenceSettings::without_legacy()
        };
        let seq = db.sequences_with(settings).unwrap();
        lose_every_swap(&db, "LCK").await;

        let err = seq.next_value("LCK").await.unwrap_err();
        assert!(err.is_transient());
        match err {
            DbError::SequenceConflict { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("expected SequenceConflict, got {other:?}"),
        }

        // Every attempt rolled back, including the row insert
        assert!(seq.current("LCK").await.unwrap().is_none());
        // Other prefixes are unaffected
        assert_eq!(seq.next_value("EXP").await.unwrap(), 1);

        sqlx::query("DROP TRIGGER lose_swap_LCK")
            .execute(db.pool())
            .await
            .unwrap();
        assert_eq!(seq.next_value("LCK").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_counters() {
        let db = memory_db().await;
        let seq = db.sequences();

        seq.next_value("STK").await.unwrap();
        seq.next_value("EXP").await.unwrap();
        seq.next_value("EXP").await.unwrap();

        let counters = seq.list().await.unwrap();
        let summary: Vec<(&str, i64)> = counters
            .iter()
            .map(|c| (c.prefix.as_str(), c.last_value))
            .collect();
        assert_eq!(summary, vec![("EXP", 2), ("STK", 1)]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_allocations_are_unique_and_gap_free() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_db(&dir).await;
        let seq = db.sequences();

        const CALLS: u64 = 40;
        let mut handles = Vec::new();
        for i in 0..CALLS * 2 {
            let seq = seq.clone();
            let prefix = if i % 2 == 0 { "INV" } else { "EXP" };
            handles.push(tokio::spawn(async move {
                (prefix, seq.next_value(prefix).await.unwrap())
            }));
        }

        let mut inv = BTreeSet::new();
        let mut exp = BTreeSet::new();
        for handle in handles {
            let (prefix, value) = handle.await.unwrap();
            let fresh = if prefix == "INV" {
                inv.insert(value)
            } else {
                exp.insert(value)
            };
            assert!(fresh, "{} handed out {} twice", prefix, value);
        }

        let expected: BTreeSet<u64> = (1..=CALLS).collect();
        assert_eq!(inv, expected);
        assert_eq!(exp, expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_allocations_after_legacy_jump() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_db(&dir).await;
        insert_legacy_code(&db, "INV-057").await;

        let seq = db.sequences();
        let mut handles = Vec::new();
        for _ in 0..20 {
            let seq = seq.clone();
            handles.push(tokio::spawn(async move { seq.next_value("INV").await.unwrap() }));
        }

        let mut values = BTreeSet::new();
        for handle in handles {
            assert!(values.insert(handle.await.unwrap()));
        }

        let expected: BTreeSet<u64> = (58..=77).collect();
        assert_eq!(values, expected);
    }

    #[tokio::test]
    async fn test_store_unavailable_then_recovered() {
        let dir = tempfile::tempdir().unwrap();

        let db = file_db(&dir).await;
        assert_eq!(db.sequences().next_value("INV").await.unwrap(), 1);
        db.close().await;

        let err = db.sequences().next_value("INV").await.unwrap_err();
        assert!(err.is_transient());

        // Counter state survived; the failed call issued nothing
        let reopened = file_db(&dir).await;
        assert_eq!(reopened.sequences().next_value("INV").await.unwrap(), 2);
    }
}
