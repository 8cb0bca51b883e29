//! # Legacy Invoice Seeder
//!
//! Populates the database with invoices whose codes were minted before the
//! `code_sequences` table existed, then shows where each series continues.
//!
//! ## Usage
//! ```bash
//! # 57 invoices, 19 quotations, 11 advance payments (defaults)
//! cargo run -p styleflow-db --bin seed
//!
//! # Custom amount of legacy invoices
//! cargo run -p styleflow-db --bin seed -- --count 120
//!
//! # Specify database path
//! cargo run -p styleflow-db --bin seed -- --db ./data/styleflow.db
//! ```
//!
//! Quotations and advance payments are seeded at a third and a fifth of
//! `--count` respectively. Codes carry gaps (every 10th number is skipped)
//! the way count-derived numbering produced them after deletions.

use chrono::{Duration, Utc};
use std::env;
use styleflow_core::{format_code, DocumentPrefix, Invoice, InvoiceStatus, InvoiceType};
use styleflow_db::{Database, DbConfig};
use uuid::Uuid;

const CUSTOMERS: &[&str] = &["cust-ayesha", "cust-bilal", "cust-sana", "cust-omar", "cust-hina"];

const STATUSES: &[InvoiceStatus] = &[
    InvoiceStatus::Paid,
    InvoiceStatus::Pending,
    InvoiceStatus::Partial,
    InvoiceStatus::Paid,
    InvoiceStatus::Hold,
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: u64 = 57;
    let mut db_path = String::from("./styleflow_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(57);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("StyleFlow Legacy Invoice Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Highest legacy invoice number (default: 57)");
                println!("  -d, --db <PATH>    Database file path (default: ./styleflow_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 StyleFlow Legacy Invoice Seeder");
    println!("==================================");
    println!("Database: {}", db_path);
    println!("Invoices: up to INV-{:03}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.invoices().get_by_code(&format_code("INV", 1)).await?.is_some() {
        println!("⚠ Database already has legacy invoices");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating legacy documents...");

    let series = [
        (InvoiceType::Invoice, count),
        (InvoiceType::Quotation, count / 3),
        (InvoiceType::AdvancePayment, count / 5),
    ];

    let mut generated = 0;
    for (invoice_type, highest) in series {
        for number in (1..=highest).filter(|n| n % 10 != 0 || *n == highest) {
            let invoice = legacy_invoice(invoice_type, number);
            if let Err(e) = db.invoices().insert(&invoice).await {
                eprintln!("Failed to insert {}: {}", invoice.code, e);
                continue;
            }
            generated += 1;
        }
        println!(
            "  {:<16} up to {}",
            invoice_type.label(),
            format_code(invoice_type.prefix().as_str(), highest)
        );
    }

    println!();
    println!("✓ Generated {} legacy documents", generated);

    // Allocating reconciles each counter with the legacy codes
    println!();
    println!("Next codes:");
    let sequences = db.sequences();
    for prefix in [
        DocumentPrefix::Inv,
        DocumentPrefix::Quo,
        DocumentPrefix::Adv,
        DocumentPrefix::Exp,
    ] {
        let next = sequences.next_value(prefix.as_str()).await?;
        println!("  {}", format_code(prefix.as_str(), next));
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one legacy document with deterministic data.
fn legacy_invoice(invoice_type: InvoiceType, number: u64) -> Invoice {
    let idx = number as usize;
    let created_at = Utc::now() - Duration::days(365) + Duration::hours(number as i64 * 6);
    let total_cents = 2_500 + ((number * 1_337) % 40_000) as i64;
    let status = STATUSES[idx % STATUSES.len()];
    let paid_cents = match status {
        InvoiceStatus::Paid => total_cents,
        InvoiceStatus::Partial => total_cents / 2,
        _ => 0,
    };

    Invoice {
        id: Uuid::new_v4().to_string(),
        code: format_code(invoice_type.prefix().as_str(), number),
        customer_id: CUSTOMERS[idx % CUSTOMERS.len()].to_string(),
        invoice_type,
        status,
        total_cents,
        paid_cents,
        notes: None,
        created_by: "legacy-import".to_string(),
        created_at,
        updated_at: created_at,
    }
}
