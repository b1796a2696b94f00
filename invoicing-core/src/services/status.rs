//! Invoice status derivation and transition rules.
//!
//! Status is a derived fact of the paid amount, not a freely settable field.
//! The administrative exceptions are `sent` (draft only), `cancelled` and
//! `void`; everything else goes through [`derive_payment_status`].

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{Invoice, InvoiceStatus};

/// Recompute the payment-driven status after the paid amount changed.
///
/// Terminal statuses are preserved. With no payments on record, externally
/// driven states (`draft`, `sent`, `overdue`) are kept as-is; a payment-derived
/// state with nothing paid falls back to `draft` (the refund-to-zero case).
pub fn derive_payment_status(
    current: InvoiceStatus,
    paid_amount: Decimal,
    total_amount: Decimal,
) -> InvoiceStatus {
    if current.is_terminal() {
        return current;
    }
    if paid_amount <= Decimal::ZERO {
        return match current {
            InvoiceStatus::PartiallyPaid | InvoiceStatus::Paid => InvoiceStatus::Draft,
            other => other,
        };
    }
    if paid_amount >= total_amount {
        InvoiceStatus::Paid
    } else {
        InvoiceStatus::PartiallyPaid
    }
}

/// Whether the invoice is past due. Pure read-time predicate; the core never
/// persists `overdue`.
pub fn is_overdue(invoice: &Invoice, today: NaiveDate) -> bool {
    matches!(
        invoice.status,
        InvoiceStatus::Draft | InvoiceStatus::Sent | InvoiceStatus::PartiallyPaid
    ) && invoice.paid_amount < invoice.total_amount
        && invoice.due_date < today
}

/// The status to display as of `today`, overlaying `overdue` where it applies.
pub fn effective_status(invoice: &Invoice, today: NaiveDate) -> InvoiceStatus {
    if is_overdue(invoice, today) {
        InvoiceStatus::Overdue
    } else {
        invoice.status
    }
}

/// Cancellation is legal unless the invoice is paid or already terminal.
pub fn can_cancel(status: InvoiceStatus) -> bool {
    !matches!(
        status,
        InvoiceStatus::Paid | InvoiceStatus::Cancelled | InvoiceStatus::Void
    )
}

/// Voiding is an administrative override, legal from any non-terminal status.
pub fn can_void(status: InvoiceStatus) -> bool {
    !status.is_terminal()
}

/// `sent` is only reachable from `draft`.
pub fn can_mark_sent(status: InvoiceStatus) -> bool {
    matches!(status, InvoiceStatus::Draft)
}
