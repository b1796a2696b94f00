//! Invoice lifecycle service for invoicing-core.
//!
//! The only entry point external callers use. Creation aggregates once and
//! stores; payment recording and status transitions are serialized per
//! invoice so concurrent calls can never both read a stale due amount.

use std::sync::Arc;

use chrono::{Days, Utc};
use dashmap::DashMap;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::config::InvoicingConfig;
use crate::error::InvoiceError;
use crate::models::{
    CreateInvoice, CustomerSnapshot, Invoice, InvoiceStatus, LineItemInput, PaymentEvent,
    RelatedTo,
};
use crate::services::calculator;
use crate::services::ledger;
use crate::services::metrics::{
    ERRORS_TOTAL, INVOICES_TOTAL, INVOICE_AMOUNT_TOTAL, LEDGER_EVENTS_TOTAL, OPERATION_DURATION,
    PAYMENT_AMOUNT_TOTAL,
};
use crate::services::repository::{
    InvoiceNumberGenerator, InvoiceRepository, ListInvoicesFilter, SnapshotProvider,
};
use crate::services::status;

/// Orchestrates invoice creation, payment recording and status transitions.
pub struct InvoiceService {
    repository: Arc<dyn InvoiceRepository>,
    numbers: Arc<dyn InvoiceNumberGenerator>,
    snapshots: Option<Arc<dyn SnapshotProvider>>,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
    config: InvoicingConfig,
}

impl InvoiceService {
    pub fn new(
        repository: Arc<dyn InvoiceRepository>,
        numbers: Arc<dyn InvoiceNumberGenerator>,
        config: InvoicingConfig,
    ) -> Self {
        Self {
            repository,
            numbers,
            snapshots: None,
            locks: DashMap::new(),
            config,
        }
    }

    /// Wire up the booking/visa-booking customer lookup. Without it, only
    /// invoices with explicit customer details can be created.
    pub fn with_snapshot_provider(mut self, snapshots: Arc<dyn SnapshotProvider>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    /// Per-invoice mutex; one unit of mutual exclusion per invoice record.
    fn lock_for(&self, invoice_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(invoice_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    async fn resolve_customer(
        &self,
        input: &CreateInvoice,
    ) -> Result<CustomerSnapshot, InvoiceError> {
        if let Some(customer) = &input.customer {
            return Ok(customer.clone());
        }
        let provider = self.snapshots.as_deref().ok_or_else(|| {
            InvoiceError::Validation(anyhow::anyhow!("Customer details are required"))
        })?;
        match input.related_to {
            RelatedTo::Booking { booking_id } => provider.booking_snapshot(booking_id).await,
            RelatedTo::Visa { visa_booking_id } => {
                provider.visa_booking_snapshot(visa_booking_id).await
            }
            RelatedTo::Custom => Err(InvoiceError::Validation(anyhow::anyhow!(
                "Customer details are required for a custom invoice"
            ))),
        }
    }

    /// Create a draft invoice from customer details and line items.
    #[instrument(skip(self, input), fields(related = ?input.related_to))]
    pub async fn create_invoice(&self, input: CreateInvoice) -> Result<Invoice, InvoiceError> {
        let timer = OPERATION_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();
        let result = self.create_invoice_inner(input).await;
        timer.observe_duration();
        self.count_error(&result);
        result
    }

    async fn create_invoice_inner(&self, input: CreateInvoice) -> Result<Invoice, InvoiceError> {
        let customer = self.resolve_customer(&input).await?;
        customer.validate()?;

        let (items, totals) =
            calculator::aggregate(&input.items, input.discount_mode, input.additional_discount)?;

        let due_date = match input.due_date {
            Some(date) => date,
            None => input
                .issue_date
                .checked_add_days(Days::new(u64::from(self.config.net_terms_days)))
                .ok_or_else(|| {
                    InvoiceError::Validation(anyhow::anyhow!("Issue date is out of range"))
                })?,
        };
        if due_date < input.issue_date {
            return Err(InvoiceError::Validation(anyhow::anyhow!(
                "Due date precedes the issue date"
            )));
        }

        let invoice = Invoice {
            invoice_id: Uuid::new_v4(),
            invoice_number: self.numbers.next_number(),
            customer,
            items,
            discount_mode: input.discount_mode,
            subtotal: totals.subtotal,
            total_discount: totals.total_discount,
            total_tax: totals.total_tax,
            additional_discount: input.additional_discount,
            total_amount: totals.total_amount,
            currency: input.currency.unwrap_or(self.config.default_currency),
            paid_amount: Decimal::ZERO,
            due_amount: totals.total_amount,
            status: InvoiceStatus::Draft,
            issue_date: input.issue_date,
            due_date,
            related_to: input.related_to,
            update_history: Vec::new(),
            version: 0,
            created_utc: Utc::now(),
        };

        self.repository.insert(&invoice).await?;

        INVOICES_TOTAL
            .with_label_values(&[invoice.status.as_str()])
            .inc();
        INVOICE_AMOUNT_TOTAL
            .with_label_values(&[invoice.currency.as_str()])
            .inc_by(invoice.total_amount.to_f64().unwrap_or(0.0));

        info!(
            invoice_id = %invoice.invoice_id,
            invoice_number = %invoice.invoice_number,
            total_amount = %invoice.total_amount,
            currency = %invoice.currency,
            "Invoice created"
        );

        Ok(invoice)
    }

    /// Record a payment against an invoice and re-derive its status.
    #[instrument(skip(self, notes), fields(invoice_id = %invoice_id, amount = %amount))]
    pub async fn record_payment(
        &self,
        invoice_id: Uuid,
        amount: Decimal,
        notes: Option<String>,
        updater_name: &str,
    ) -> Result<(Invoice, PaymentEvent), InvoiceError> {
        let timer = OPERATION_DURATION
            .with_label_values(&["record_payment"])
            .start_timer();
        let lock = self.lock_for(invoice_id);
        let _guard = lock.lock().await;

        let result = async {
            let invoice = self.repository.load(invoice_id).await?;
            let (updated, event) =
                ledger::apply_payment(&invoice, amount, notes, updater_name, Utc::now())?;
            let stored = self.repository.update(&updated).await?;

            LEDGER_EVENTS_TOTAL
                .with_label_values(&[event.kind.as_str()])
                .inc();
            PAYMENT_AMOUNT_TOTAL
                .with_label_values(&[stored.currency.as_str()])
                .inc_by(event.amount.to_f64().unwrap_or(0.0));
            if stored.status != invoice.status {
                INVOICES_TOTAL
                    .with_label_values(&[stored.status.as_str()])
                    .inc();
            }

            info!(
                invoice_id = %stored.invoice_id,
                amount = %event.amount,
                paid_amount = %stored.paid_amount,
                due_amount = %stored.due_amount,
                status = stored.status.as_str(),
                "Payment recorded"
            );
            Ok((stored, event))
        }
        .await;

        timer.observe_duration();
        self.count_error(&result);
        result
    }

    /// Record a refund against an invoice and re-derive its status.
    #[instrument(skip(self, notes), fields(invoice_id = %invoice_id, amount = %amount))]
    pub async fn record_refund(
        &self,
        invoice_id: Uuid,
        amount: Decimal,
        notes: Option<String>,
        updater_name: &str,
    ) -> Result<(Invoice, PaymentEvent), InvoiceError> {
        let timer = OPERATION_DURATION
            .with_label_values(&["record_refund"])
            .start_timer();
        let lock = self.lock_for(invoice_id);
        let _guard = lock.lock().await;

        let result = async {
            let invoice = self.repository.load(invoice_id).await?;
            let (updated, event) =
                ledger::apply_refund(&invoice, amount, notes, updater_name, Utc::now())?;
            let stored = self.repository.update(&updated).await?;

            LEDGER_EVENTS_TOTAL
                .with_label_values(&[event.kind.as_str()])
                .inc();

            info!(
                invoice_id = %stored.invoice_id,
                amount = %event.amount,
                paid_amount = %stored.paid_amount,
                status = stored.status.as_str(),
                "Refund recorded"
            );
            Ok((stored, event))
        }
        .await;

        timer.observe_duration();
        self.count_error(&result);
        result
    }

    /// Cancel an invoice. Legal unless it is paid or already terminal; any
    /// recorded payments stay on the invoice and the caller owns the refund
    /// workflow.
    #[instrument(skip(self, notes), fields(invoice_id = %invoice_id))]
    pub async fn cancel_invoice(
        &self,
        invoice_id: Uuid,
        notes: Option<String>,
        updater_name: &str,
    ) -> Result<Invoice, InvoiceError> {
        let timer = OPERATION_DURATION
            .with_label_values(&["cancel_invoice"])
            .start_timer();
        let result = self
            .transition(invoice_id, InvoiceStatus::Cancelled, notes, updater_name)
            .await;
        timer.observe_duration();
        self.count_error(&result);

        if let Ok(ref invoice) = result {
            if invoice.paid_amount > Decimal::ZERO {
                warn!(
                    invoice_id = %invoice.invoice_id,
                    paid_amount = %invoice.paid_amount,
                    "Cancelled invoice holds payments; refund workflow is the caller's responsibility"
                );
            }
        }
        result
    }

    /// Void an invoice: administrative override, legal from any non-terminal
    /// status.
    #[instrument(skip(self, notes), fields(invoice_id = %invoice_id))]
    pub async fn void_invoice(
        &self,
        invoice_id: Uuid,
        notes: Option<String>,
        updater_name: &str,
    ) -> Result<Invoice, InvoiceError> {
        let timer = OPERATION_DURATION
            .with_label_values(&["void_invoice"])
            .start_timer();
        let result = self
            .transition(invoice_id, InvoiceStatus::Void, notes, updater_name)
            .await;
        timer.observe_duration();
        self.count_error(&result);
        result
    }

    /// Mark a draft invoice as sent.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn mark_sent(
        &self,
        invoice_id: Uuid,
        updater_name: &str,
    ) -> Result<Invoice, InvoiceError> {
        let timer = OPERATION_DURATION
            .with_label_values(&["mark_sent"])
            .start_timer();
        let result = self
            .transition(invoice_id, InvoiceStatus::Sent, None, updater_name)
            .await;
        timer.observe_duration();
        self.count_error(&result);
        result
    }

    async fn transition(
        &self,
        invoice_id: Uuid,
        new_status: InvoiceStatus,
        notes: Option<String>,
        updater_name: &str,
    ) -> Result<Invoice, InvoiceError> {
        let lock = self.lock_for(invoice_id);
        let _guard = lock.lock().await;

        let invoice = self.repository.load(invoice_id).await?;
        let allowed = match new_status {
            InvoiceStatus::Cancelled => status::can_cancel(invoice.status),
            InvoiceStatus::Void => status::can_void(invoice.status),
            InvoiceStatus::Sent => status::can_mark_sent(invoice.status),
            _ => false,
        };
        if !allowed {
            return Err(InvoiceError::InvalidState(anyhow::anyhow!(
                "Invoice {} cannot move from {} to {}",
                invoice.invoice_number,
                invoice.status.as_str(),
                new_status.as_str()
            )));
        }

        let event =
            ledger::status_change_event(&invoice, new_status, notes, updater_name, Utc::now());
        let mut updated = invoice.clone();
        updated.status = new_status;
        updated.update_history.push(event.clone());
        let stored = self.repository.update(&updated).await?;

        LEDGER_EVENTS_TOTAL
            .with_label_values(&[event.kind.as_str()])
            .inc();
        INVOICES_TOTAL
            .with_label_values(&[stored.status.as_str()])
            .inc();

        info!(
            invoice_id = %stored.invoice_id,
            from = invoice.status.as_str(),
            to = stored.status.as_str(),
            "Invoice status changed"
        );
        Ok(stored)
    }

    /// Replace the line items and re-run the aggregator. Legal only while no
    /// payment has been recorded; the first payment freezes the item list.
    #[instrument(skip(self, items), fields(invoice_id = %invoice_id))]
    pub async fn update_items(
        &self,
        invoice_id: Uuid,
        items: Vec<LineItemInput>,
        additional_discount: Decimal,
    ) -> Result<Invoice, InvoiceError> {
        let timer = OPERATION_DURATION
            .with_label_values(&["update_items"])
            .start_timer();
        let lock = self.lock_for(invoice_id);
        let _guard = lock.lock().await;

        let result = async {
            let invoice = self.repository.load(invoice_id).await?;
            if invoice.status.is_terminal() {
                return Err(InvoiceError::InvalidState(anyhow::anyhow!(
                    "Invoice {} is {} and cannot be edited",
                    invoice.invoice_number,
                    invoice.status.as_str()
                )));
            }
            if !invoice.paid_amount.is_zero() {
                return Err(InvoiceError::InvalidState(anyhow::anyhow!(
                    "Line items are frozen once a payment is recorded"
                )));
            }

            let (line_items, totals) =
                calculator::aggregate(&items, invoice.discount_mode, additional_discount)?;
            let mut updated = invoice.clone();
            updated.items = line_items;
            updated.subtotal = totals.subtotal;
            updated.total_discount = totals.total_discount;
            updated.total_tax = totals.total_tax;
            updated.additional_discount = additional_discount;
            updated.total_amount = totals.total_amount;
            updated.due_amount = totals.total_amount;
            let stored = self.repository.update(&updated).await?;

            info!(
                invoice_id = %stored.invoice_id,
                total_amount = %stored.total_amount,
                "Invoice items re-aggregated"
            );
            Ok(stored)
        }
        .await;

        timer.observe_duration();
        self.count_error(&result);
        result
    }

    /// Read-only fetch for display surfaces.
    pub async fn get_invoice(&self, invoice_id: Uuid) -> Result<Invoice, InvoiceError> {
        self.repository.load(invoice_id).await
    }

    /// Read-only listing for display surfaces.
    pub async fn list_invoices(
        &self,
        filter: &ListInvoicesFilter,
    ) -> Result<Vec<Invoice>, InvoiceError> {
        self.repository.list(filter).await
    }

    fn count_error<T>(&self, result: &Result<T, InvoiceError>) {
        if let Err(err) = result {
            ERRORS_TOTAL.with_label_values(&[err.kind()]).inc();
        }
    }
}
