//! Storage and collaborator contracts for invoicing-core.
//!
//! The core does not implement storage; it talks to an [`InvoiceRepository`].
//! The in-memory implementation backs tests and doubles as the reference for
//! the optimistic-version semantics a real store must honor.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::InvoiceError;
use crate::models::{CustomerSnapshot, Invoice, InvoiceStatus};

/// Filter parameters for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct ListInvoicesFilter {
    pub status: Option<InvoiceStatus>,
    pub customer_email: Option<String>,
    pub page_size: i32,
}

/// Persistence contract consumed by the lifecycle service. Each call is
/// assumed atomic.
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn load(&self, invoice_id: Uuid) -> Result<Invoice, InvoiceError>;

    async fn insert(&self, invoice: &Invoice) -> Result<(), InvoiceError>;

    /// Persist an updated invoice. Fails with `ConcurrencyConflict` when the
    /// stored version no longer matches `invoice.version`; on success the
    /// returned invoice carries the bumped version.
    async fn update(&self, invoice: &Invoice) -> Result<Invoice, InvoiceError>;

    async fn list(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, InvoiceError>;
}

/// Read-only customer lookup for booking-related invoices, consulted once at
/// creation time.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn booking_snapshot(&self, booking_id: Uuid) -> Result<CustomerSnapshot, InvoiceError>;

    async fn visa_booking_snapshot(
        &self,
        visa_booking_id: Uuid,
    ) -> Result<CustomerSnapshot, InvoiceError>;
}

/// Opaque invoice-number source.
pub trait InvoiceNumberGenerator: Send + Sync {
    fn next_number(&self) -> String;
}

/// In-memory invoice store with an optimistic version check on update.
#[derive(Default)]
pub struct InMemoryInvoiceRepository {
    invoices: DashMap<Uuid, Invoice>,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn load(&self, invoice_id: Uuid) -> Result<Invoice, InvoiceError> {
        self.invoices
            .get(&invoice_id)
            .map(|entry| entry.value().clone())
            .ok_or(InvoiceError::NotFound(invoice_id))
    }

    async fn insert(&self, invoice: &Invoice) -> Result<(), InvoiceError> {
        match self.invoices.entry(invoice.invoice_id) {
            Entry::Occupied(_) => Err(InvoiceError::Storage(anyhow::anyhow!(
                "Invoice {} already exists",
                invoice.invoice_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(invoice.clone());
                Ok(())
            }
        }
    }

    async fn update(&self, invoice: &Invoice) -> Result<Invoice, InvoiceError> {
        let mut entry = self
            .invoices
            .get_mut(&invoice.invoice_id)
            .ok_or(InvoiceError::NotFound(invoice.invoice_id))?;
        if entry.version != invoice.version {
            return Err(InvoiceError::ConcurrencyConflict(invoice.invoice_id));
        }
        let mut stored = invoice.clone();
        stored.version += 1;
        *entry = stored.clone();
        Ok(stored)
    }

    async fn list(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, InvoiceError> {
        let limit = if filter.page_size <= 0 {
            100
        } else {
            filter.page_size.clamp(1, 100)
        } as usize;

        let mut invoices: Vec<Invoice> = self
            .invoices
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|invoice| {
                filter
                    .status
                    .map_or(true, |status| invoice.status == status)
            })
            .filter(|invoice| {
                filter
                    .customer_email
                    .as_deref()
                    .map_or(true, |email| invoice.customer.email == email)
            })
            .collect();

        invoices.sort_by(|a, b| {
            a.created_utc
                .cmp(&b.created_utc)
                .then_with(|| a.invoice_number.cmp(&b.invoice_number))
        });
        invoices.truncate(limit);
        Ok(invoices)
    }
}

/// Sequential invoice-number generator, `{prefix}-{seq:06}`. The in-process
/// analogue of a database sequence.
pub struct SequenceNumberGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequenceNumberGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::starting_at(prefix, 1)
    }

    pub fn starting_at(prefix: impl Into<String>, start: u64) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(start),
        }
    }
}

impl InvoiceNumberGenerator for SequenceNumberGenerator {
    fn next_number(&self) -> String {
        let seq = self.next.fetch_add(1, Ordering::SeqCst);
        format!("{}-{:06}", self.prefix, seq)
    }
}
