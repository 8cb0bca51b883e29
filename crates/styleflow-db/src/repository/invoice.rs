//! # Invoice Repository
//!
//! Database operations for invoices, quotations, and advance payments.
//!
//! All three kinds share the `invoices` table and are told apart by
//! `invoice_type`. Codes are allocated by the caller before `insert`; this
//! repository never mints numbers itself.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use styleflow_core::{parse_suffix, Invoice, InvoiceType};

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Inserts an invoice.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` if `invoice.code` is already taken.
    pub async fn insert(&self, invoice: &Invoice) -> DbResult<()> {
        debug!(id = %invoice.id, code = %invoice.code, "Inserting invoice");

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, code, customer_id, invoice_type, status,
                total_cents, paid_cents, notes, created_by,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11
            )
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.code)
        .bind(&invoice.customer_id)
        .bind(invoice.invoice_type)
        .bind(invoice.status)
        .bind(invoice.total_cents)
        .bind(invoice.paid_cents)
        .bind(&invoice.notes)
        .bind(&invoice.created_by)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &invoice.code),
            other => other,
        })?;

        Ok(())
    }

    /// Gets an invoice by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, code, customer_id, invoice_type, status,
                   total_cents, paid_cents, notes, created_by,
                   created_at, updated_at
            FROM invoices
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    /// Gets an invoice by its display code (`INV-057`).
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, code, customer_id, invoice_type, status,
                   total_cents, paid_cents, notes, created_by,
                   created_at, updated_at
            FROM invoices
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    /// Lists the newest documents of one kind.
    pub async fn list_by_type(
        &self,
        invoice_type: InvoiceType,
        limit: u32,
    ) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, code, customer_id, invoice_type, status,
                   total_cents, paid_cents, notes, created_by,
                   created_at, updated_at
            FROM invoices
            WHERE invoice_type = ?1
            ORDER BY created_at DESC, code DESC
            LIMIT ?2
            "#,
        )
        .bind(invoice_type)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    /// Highest numeric suffix among codes of the form `{prefix}-<digits>`.
    ///
    /// Read-only diagnostic: shows how far the legacy codes reach for a
    /// series. The allocator does the same scan in SQL inside its own
    /// transaction.
    pub async fn max_code_suffix(&self, prefix: &str) -> DbResult<Option<u64>> {
        let pattern = format!("{}-%", prefix);

        let codes: Vec<String> =
            sqlx::query_scalar("SELECT code FROM invoices WHERE code LIKE ?1")
                .bind(&pattern)
                .fetch_all(&self.pool)
                .await?;

        // LIKE is case-insensitive for ASCII; parse_suffix is not
        Ok(codes.iter().filter_map(|c| parse_suffix(c, prefix)).max())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
