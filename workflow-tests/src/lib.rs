//! End-to-end invoice workflow test library.
//!
//! Wires the lifecycle service to in-memory collaborators and provides the
//! builders the workflow tests share. Each test creates its own context, so
//! invoices and number sequences never leak between tests.

use std::sync::{Arc, Once};

use chrono::NaiveDate;
use invoicing_core::services::repository::{InMemoryInvoiceRepository, SequenceNumberGenerator};
use invoicing_core::{
    CreateInvoice, Currency, CustomerSnapshot, DiscountMode, InvoiceService, InvoicingConfig,
    LineItemInput, RelatedTo,
};
use rust_decimal::Decimal;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,invoicing_core=debug,workflow_tests=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Context for workflow tests: the lifecycle service plus direct repository
/// access for verification.
pub struct WorkflowTestContext {
    pub service: Arc<InvoiceService>,
    pub repository: Arc<InMemoryInvoiceRepository>,
}

impl WorkflowTestContext {
    pub fn new() -> Self {
        init_tracing();
        let repository = Arc::new(InMemoryInvoiceRepository::new());
        let service = Arc::new(InvoiceService::new(
            repository.clone(),
            Arc::new(SequenceNumberGenerator::new("INV")),
            InvoicingConfig::default(),
        ));
        Self {
            service,
            repository,
        }
    }
}

impl Default for WorkflowTestContext {
    fn default() -> Self {
        Self::new()
    }
}

pub fn standard_customer() -> CustomerSnapshot {
    CustomerSnapshot {
        name: "Ayesha Rahman".to_string(),
        email: "ayesha.rahman@example.com".to_string(),
        phone: Some("+8801712345678".to_string()),
        address: Some("House 12, Road 5, Dhanmondi, Dhaka".to_string()),
    }
}

/// Helper to build a line item input from string amounts.
pub fn line(
    name: &str,
    quantity: u32,
    unit_price: &str,
    discount: &str,
    tax_rate: &str,
) -> LineItemInput {
    LineItemInput {
        name: name.to_string(),
        description: None,
        quantity,
        unit_price: unit_price.parse().expect("bad unit price"),
        discount: discount.parse().expect("bad discount"),
        tax_rate: tax_rate.parse().expect("bad tax rate"),
    }
}

/// Baseline creation input: explicit customer, percentage discounts, USD,
/// issued 2026-01-15 and due 2026-02-14.
pub fn draft_invoice_input(items: Vec<LineItemInput>) -> CreateInvoice {
    CreateInvoice {
        customer: Some(standard_customer()),
        related_to: RelatedTo::Custom,
        items,
        discount_mode: DiscountMode::Percentage,
        additional_discount: Decimal::ZERO,
        currency: Some(Currency::Usd),
        issue_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        due_date: Some(NaiveDate::from_ymd_opt(2026, 2, 14).unwrap()),
    }
}
