//! Common test utilities for invoicing-core integration tests.

use std::sync::{Arc, Once};

use async_trait::async_trait;
use chrono::NaiveDate;
use invoicing_core::services::repository::{
    InMemoryInvoiceRepository, SequenceNumberGenerator, SnapshotProvider,
};
use invoicing_core::{
    CreateInvoice, Currency, CustomerSnapshot, DiscountMode, InvoiceError, InvoiceService,
    InvoicingConfig, LineItemInput, RelatedTo,
};
use rust_decimal::Decimal;
use uuid::Uuid;

pub const TEST_BOOKING_ID: Uuid = Uuid::from_u128(0xB00C);
pub const TEST_VISA_BOOKING_ID: Uuid = Uuid::from_u128(0x715A);

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,invoicing_core=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Lifecycle service wired to in-memory collaborators, with direct access to
/// the repository for tests that need to bypass the service.
pub struct TestService {
    pub service: InvoiceService,
    pub repository: Arc<InMemoryInvoiceRepository>,
}

/// Spawn a test service with default configuration.
pub fn spawn() -> TestService {
    init_tracing();
    let repository = Arc::new(InMemoryInvoiceRepository::new());
    let service = InvoiceService::new(
        repository.clone(),
        Arc::new(SequenceNumberGenerator::new("INV")),
        InvoicingConfig::default(),
    )
    .with_snapshot_provider(Arc::new(StaticSnapshotProvider));
    TestService {
        service,
        repository,
    }
}

/// Snapshot provider that knows the two test bookings.
pub struct StaticSnapshotProvider;

#[async_trait]
impl SnapshotProvider for StaticSnapshotProvider {
    async fn booking_snapshot(&self, booking_id: Uuid) -> Result<CustomerSnapshot, InvoiceError> {
        if booking_id == TEST_BOOKING_ID {
            Ok(booking_customer())
        } else {
            Err(InvoiceError::NotFound(booking_id))
        }
    }

    async fn visa_booking_snapshot(
        &self,
        visa_booking_id: Uuid,
    ) -> Result<CustomerSnapshot, InvoiceError> {
        if visa_booking_id == TEST_VISA_BOOKING_ID {
            Ok(booking_customer())
        } else {
            Err(InvoiceError::NotFound(visa_booking_id))
        }
    }
}

pub fn test_customer() -> CustomerSnapshot {
    CustomerSnapshot {
        name: "Ayesha Rahman".to_string(),
        email: "ayesha.rahman@example.com".to_string(),
        phone: Some("+8801712345678".to_string()),
        address: Some("House 12, Road 5, Dhanmondi, Dhaka".to_string()),
    }
}

pub fn booking_customer() -> CustomerSnapshot {
    CustomerSnapshot {
        name: "Daniel Okoye".to_string(),
        email: "daniel.okoye@example.com".to_string(),
        phone: Some("+2348012345678".to_string()),
        address: None,
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

pub fn issue_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
}

pub fn due_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 14).unwrap()
}

/// Baseline creation input: explicit customer, percentage discounts, USD.
pub fn create_input(items: Vec<LineItemInput>) -> CreateInvoice {
    CreateInvoice {
        customer: Some(test_customer()),
        related_to: RelatedTo::Custom,
        items,
        discount_mode: DiscountMode::Percentage,
        additional_discount: Decimal::ZERO,
        currency: Some(Currency::Usd),
        issue_date: issue_date(),
        due_date: Some(due_date()),
    }
}
