//! Payment ledger for invoicing-core.
//!
//! Pure application of payment and refund events against an invoice. The
//! returned invoice carries the updated paid/due amounts, the recomputed
//! status and the appended audit event; persisting it is the lifecycle
//! service's job.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::InvoiceError;
use crate::models::{Invoice, InvoiceStatus, PaymentEvent, PaymentEventKind};
use crate::services::status::derive_payment_status;

/// Apply a payment to an invoice.
///
/// Rejects non-positive amounts, terminal invoices, and anything above the
/// due amount. No negative amounts: reversals go through [`apply_refund`].
pub fn apply_payment(
    invoice: &Invoice,
    amount: Decimal,
    notes: Option<String>,
    updater_name: &str,
    now: DateTime<Utc>,
) -> Result<(Invoice, PaymentEvent), InvoiceError> {
    if amount <= Decimal::ZERO {
        return Err(InvoiceError::Validation(anyhow::anyhow!(
            "Payment amount must be positive"
        )));
    }
    if invoice.status.is_terminal() {
        return Err(InvoiceError::InvalidState(anyhow::anyhow!(
            "Invoice {} is {} and accepts no payments",
            invoice.invoice_number,
            invoice.status.as_str()
        )));
    }
    if amount > invoice.due_amount {
        return Err(InvoiceError::Overpayment {
            amount,
            max_acceptable: invoice.due_amount,
        });
    }

    let new_paid_amount = invoice.paid_amount + amount;
    let new_status = derive_payment_status(invoice.status, new_paid_amount, invoice.total_amount);
    let event = PaymentEvent {
        event_id: Uuid::new_v4(),
        kind: PaymentEventKind::Payment,
        amount,
        notes,
        previous_paid_amount: invoice.paid_amount,
        new_paid_amount,
        previous_status: invoice.status,
        new_status,
        updater_name: updater_name.to_string(),
        created_utc: now,
    };

    Ok((apply_event(invoice, &event), event))
}

/// Apply a refund to an invoice. The explicit reversal operation; never
/// inferred from a negative payment amount.
pub fn apply_refund(
    invoice: &Invoice,
    amount: Decimal,
    notes: Option<String>,
    updater_name: &str,
    now: DateTime<Utc>,
) -> Result<(Invoice, PaymentEvent), InvoiceError> {
    if amount <= Decimal::ZERO {
        return Err(InvoiceError::Validation(anyhow::anyhow!(
            "Refund amount must be positive"
        )));
    }
    if invoice.status.is_terminal() {
        return Err(InvoiceError::InvalidState(anyhow::anyhow!(
            "Invoice {} is {} and accepts no refunds",
            invoice.invoice_number,
            invoice.status.as_str()
        )));
    }
    if amount > invoice.paid_amount {
        return Err(InvoiceError::Validation(anyhow::anyhow!(
            "Refund {} exceeds the paid amount {}",
            amount,
            invoice.paid_amount
        )));
    }

    let new_paid_amount = invoice.paid_amount - amount;
    let new_status = derive_payment_status(invoice.status, new_paid_amount, invoice.total_amount);
    let event = PaymentEvent {
        event_id: Uuid::new_v4(),
        kind: PaymentEventKind::Refund,
        amount,
        notes,
        previous_paid_amount: invoice.paid_amount,
        new_paid_amount,
        previous_status: invoice.status,
        new_status,
        updater_name: updater_name.to_string(),
        created_utc: now,
    };

    Ok((apply_event(invoice, &event), event))
}

/// Build the audit event for an administrative transition. The paid amount
/// is untouched; only the status moves.
pub fn status_change_event(
    invoice: &Invoice,
    new_status: InvoiceStatus,
    notes: Option<String>,
    updater_name: &str,
    now: DateTime<Utc>,
) -> PaymentEvent {
    PaymentEvent {
        event_id: Uuid::new_v4(),
        kind: PaymentEventKind::StatusChange,
        amount: Decimal::ZERO,
        notes,
        previous_paid_amount: invoice.paid_amount,
        new_paid_amount: invoice.paid_amount,
        previous_status: invoice.status,
        new_status,
        updater_name: updater_name.to_string(),
        created_utc: now,
    }
}

fn apply_event(invoice: &Invoice, event: &PaymentEvent) -> Invoice {
    let mut updated = invoice.clone();
    updated.paid_amount = event.new_paid_amount;
    updated.due_amount = (invoice.total_amount - event.new_paid_amount).max(Decimal::ZERO);
    updated.status = event.new_status;
    updated.update_history.push(event.clone());
    updated
}
