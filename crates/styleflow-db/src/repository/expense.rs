//! # Expense Repository
//!
//! Database operations for expense records (`EXP-` codes).

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use styleflow_core::Expense;

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Inserts an expense.
    pub async fn insert(&self, expense: &Expense) -> DbResult<()> {
        debug!(id = %expense.id, code = %expense.code, "Inserting expense");

        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, code, category, amount_cents, description,
                expense_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.code)
        .bind(&expense.category)
        .bind(expense.amount_cents)
        .bind(&expense.description)
        .bind(expense.expense_date)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &expense.code),
            other => other,
        })?;

        Ok(())
    }

    /// Gets an expense by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Expense>> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, code, category, amount_cents, description,
                   expense_date, created_at
            FROM expenses
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Lists the most recent expenses, newest expense date first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, code, category, amount_cents, description,
                   expense_date, created_at
            FROM expenses
            ORDER BY expense_date DESC, code DESC
            LIMIT ?1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{NaiveDate, Utc};

    fn expense(code: &str, day: u32, amount_cents: i64) -> Expense {
        Expense {
            id: uuid::Uuid::new_v4().to_string(),
            code: code.to_string(),
            category: "Utilities".to_string(),
            amount_cents,
            description: None,
            expense_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_get_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.expenses();

        let first = expense("EXP-001", 1, 4_000);
        repo.insert(&first).await.unwrap();
        repo.insert(&expense("EXP-002", 15, 1_250)).await.unwrap();

        let fetched = repo.get_by_id(&first.id).await.unwrap().unwrap();
        assert_eq!(fetched.code, "EXP-001");
        assert_eq!(fetched.expense_date, first.expense_date);

        let listed = repo.list(10).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].code, "EXP-002");
    }

    #[tokio::test]
    async fn test_non_positive_amount_rejected_by_schema() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .expenses()
            .insert(&expense("EXP-001", 1, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::QueryFailed(_)));
    }
}
