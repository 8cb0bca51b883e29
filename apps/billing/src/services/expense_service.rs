//! # Expense Service
//!
//! Records shop expenses under `EXP-` codes.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::{CacheInvalidator, DASHBOARD_CACHE_KEY};
use crate::error::{BillingError, BillingResult};
use crate::services::code_generator::{CodeGenerator, SequenceAllocator};
use styleflow_core::validation::{validate_amount_cents, validate_category};
use styleflow_core::{DocumentPrefix, Expense};
use styleflow_db::{ExpenseRepository, SequenceRepository};

const ENTITY: &str = "expense";

/// Input for recording an expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpense {
    pub category: String,
    pub amount_cents: i64,
    #[serde(default)]
    pub description: Option<String>,
    pub expense_date: NaiveDate,
}

/// Expense use-cases.
pub struct ExpenseService<A = SequenceRepository> {
    expenses: ExpenseRepository,
    codes: CodeGenerator<A>,
    cache: Arc<dyn CacheInvalidator>,
}

impl<A: SequenceAllocator> ExpenseService<A> {
    pub fn new(
        expenses: ExpenseRepository,
        codes: CodeGenerator<A>,
        cache: Arc<dyn CacheInvalidator>,
    ) -> Self {
        ExpenseService {
            expenses,
            codes,
            cache,
        }
    }

    /// Records an expense with the next `EXP` code.
    pub async fn create(&self, input: NewExpense) -> BillingResult<Expense> {
        let category = validate_category(&input.category)?;
        validate_amount_cents("amount_cents", input.amount_cents, false)?;

        let code = self
            .codes
            .generate_for(DocumentPrefix::Exp)
            .await
            .map_err(|e| BillingError::create_failed(ENTITY, e))?;

        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            category,
            amount_cents: input.amount_cents,
            description: input.description.filter(|d| !d.trim().is_empty()),
            expense_date: input.expense_date,
            created_at: Utc::now(),
        };

        self.expenses
            .insert(&expense)
            .await
            .map_err(|e| BillingError::create_failed(ENTITY, e))?;

        info!(id = %expense.id, code = %expense.code, "Expense recorded");

        if let Err(e) = self.cache.invalidate(DASHBOARD_CACHE_KEY).await {
            warn!(error = %e, "Dashboard cache invalidation failed");
        }

        Ok(expense)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::NoopCache;
    use styleflow_db::{Database, DbConfig};

    fn new_expense(category: &str, amount_cents: i64) -> NewExpense {
        NewExpense {
            category: category.to_string(),
            amount_cents,
            description: Some(" ".to_string()),
            expense_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_expenses_get_sequential_codes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let svc = ExpenseService::new(
            db.expenses(),
            CodeGenerator::new(db.sequences()),
            Arc::new(NoopCache),
        );

        let first = svc.create(new_expense("  Rent ", 50_000)).await.unwrap();
        let second = svc.create(new_expense("Utilities", 7_500)).await.unwrap();

        assert_eq!(first.code, "EXP-001");
        assert_eq!(first.category, "Rent");
        assert!(first.description.is_none());
        assert_eq!(second.code, "EXP-002");

        let stored = db.expenses().get_by_id(&second.id).await.unwrap().unwrap();
        assert_eq!(stored.amount_cents, 7_500);
    }

    #[tokio::test]
    async fn test_invalid_expense_issues_no_code() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let svc = ExpenseService::new(
            db.expenses(),
            CodeGenerator::new(db.sequences()),
            Arc::new(NoopCache),
        );

        assert!(matches!(
            svc.create(new_expense("Rent", 0)).await.unwrap_err(),
            BillingError::Validation(_)
        ));
        assert!(matches!(
            svc.create(new_expense("", 100)).await.unwrap_err(),
            BillingError::Validation(_)
        ));

        assert!(db.sequences().current("EXP").await.unwrap().is_none());
        assert_eq!(svc.create(new_expense("Rent", 100)).await.unwrap().code, "EXP-001");
    }

    #[tokio::test]
    async fn test_failed_insert_burns_the_code() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let svc = ExpenseService::new(
            db.expenses(),
            CodeGenerator::new(db.sequences()),
            Arc::new(NoopCache),
        );

        // Occupy the code the next allocation will produce
        db.expenses()
            .insert(&Expense {
                id: Uuid::new_v4().to_string(),
                code: "EXP-001".into(),
                category: "Imported".into(),
                amount_cents: 100,
                description: None,
                expense_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let err = svc.create(new_expense("Rent", 100)).await.unwrap_err();
        assert_eq!(err.to_string(), "could not create expense");

        // The burned number is not reissued
        assert_eq!(svc.create(new_expense("Rent", 100)).await.unwrap().code, "EXP-002");
    }
}
