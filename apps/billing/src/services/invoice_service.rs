//! # Invoice Service
//!
//! Creates invoices, quotations, and advance payments.
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NewInvoice                                                            │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  validate input ─── fail ──► BillingError::Validation (nothing issued) │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  invoice_number given? ── yes ──► use it as the code (INV/QUO/ADV      │
//! │     │                             suffix must fit the counter)         │
//! │     │ no                                                                │
//! │     ▼                                                                   │
//! │  Invoice → INV   Quotation → QUO   AdvancePayment → ADV                │
//! │  CodeGenerator::generate_for(prefix)   ← own transaction, committed    │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  InvoiceRepository::insert ── fail ──► "could not create invoice"      │
//! │     │                                  (allocated number is burned)    │
//! │     ▼                                                                   │
//! │  invalidate "cache:dashboard" (best effort)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::{CacheInvalidator, DASHBOARD_CACHE_KEY};
use crate::error::{BillingError, BillingResult};
use crate::services::code_generator::{CodeGenerator, SequenceAllocator};
use styleflow_core::validation::{validate_amount_cents, validate_invoice_number};
use styleflow_core::{Invoice, InvoiceStatus, InvoiceType, ValidationError};
use styleflow_db::{DbError, InvoiceRepository, SequenceRepository};

const ENTITY: &str = "invoice";

/// Input for creating an invoice-like document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewInvoice {
    pub customer_id: String,
    pub created_by: String,
    #[serde(default)]
    pub invoice_type: InvoiceType,
    #[serde(default)]
    pub status: InvoiceStatus,
    /// Explicit document number. Blank means "generate one".
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub total_cents: i64,
    #[serde(default)]
    pub paid_cents: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Invoice use-cases.
pub struct InvoiceService<A = SequenceRepository> {
    invoices: InvoiceRepository,
    codes: CodeGenerator<A>,
    cache: Arc<dyn CacheInvalidator>,
}

impl<A: SequenceAllocator> InvoiceService<A> {
    pub fn new(
        invoices: InvoiceRepository,
        codes: CodeGenerator<A>,
        cache: Arc<dyn CacheInvalidator>,
    ) -> Self {
        InvoiceService {
            invoices,
            codes,
            cache,
        }
    }

    /// Creates a document and returns it as stored.
    pub async fn create(&self, input: NewInvoice) -> BillingResult<Invoice> {
        require("customer_id", &input.customer_id)?;
        require("created_by", &input.created_by)?;
        validate_amount_cents("total_cents", input.total_cents, true)?;
        validate_amount_cents("paid_cents", input.paid_cents, true)?;

        let explicit = input
            .invoice_number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        if let Some(number) = explicit {
            validate_invoice_number(number)?;
        }

        let code = match explicit {
            Some(number) => number.to_string(),
            None => self
                .codes
                .generate_for(input.invoice_type.prefix())
                .await
                .map_err(|e| BillingError::create_failed(ENTITY, e))?
                .to_string(),
        };

        let now = Utc::now();
        let invoice = Invoice {
            id: Uuid::new_v4().to_string(),
            code,
            customer_id: input.customer_id,
            invoice_type: input.invoice_type,
            status: input.status,
            total_cents: input.total_cents,
            paid_cents: input.paid_cents,
            notes: input.notes,
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        };

        self.invoices.insert(&invoice).await.map_err(|e| match e {
            DbError::UniqueViolation { value, .. } => BillingError::DuplicateCode {
                entity: ENTITY,
                code: value,
            },
            other => BillingError::create_failed(ENTITY, other),
        })?;

        info!(
            id = %invoice.id,
            code = %invoice.code,
            invoice_type = invoice.invoice_type.label(),
            "Invoice created"
        );

        if let Err(e) = self.cache.invalidate(DASHBOARD_CACHE_KEY).await {
            warn!(error = %e, "Dashboard cache invalidation failed");
        }

        Ok(invoice)
    }
}

fn require(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}
