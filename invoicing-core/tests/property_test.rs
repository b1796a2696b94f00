//! Property-based tests for aggregation, payment application and status
//! derivation invariants.

use chrono::{NaiveDate, TimeZone, Utc};
use invoicing_core::services::{calculator, ledger, status};
use invoicing_core::{
    Currency, CustomerSnapshot, DiscountMode, Invoice, InvoiceError, InvoiceStatus, LineItemInput,
    RelatedTo,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Generate a valid line item: price up to 9999.99, percentage discount,
/// tax up to 25%.
fn arb_item() -> impl Strategy<Value = LineItemInput> {
    (1u32..=20u32, 0i64..1_000_000i64, 0u32..=100u32, 0u32..=25u32).prop_map(
        |(quantity, price_cents, discount, tax_rate)| LineItemInput {
            name: "Item".to_string(),
            description: None,
            quantity,
            unit_price: Decimal::new(price_cents, 2),
            discount: Decimal::from(discount),
            tax_rate: Decimal::from(tax_rate),
        },
    )
}

/// Generate 1-6 valid line items.
fn arb_items() -> impl Strategy<Value = Vec<LineItemInput>> {
    prop::collection::vec(arb_item(), 1..=6)
}

/// Build an aggregated draft invoice from the given items.
fn build_invoice(items: &[LineItemInput]) -> Invoice {
    let (lines, totals) =
        calculator::aggregate(items, DiscountMode::Percentage, Decimal::ZERO).unwrap();
    Invoice {
        invoice_id: Uuid::new_v4(),
        invoice_number: "INV-000001".to_string(),
        customer: CustomerSnapshot {
            name: "Property Tester".to_string(),
            email: "property.tester@example.com".to_string(),
            phone: None,
            address: None,
        },
        items: lines,
        discount_mode: DiscountMode::Percentage,
        subtotal: totals.subtotal,
        total_discount: totals.total_discount,
        total_tax: totals.total_tax,
        additional_discount: Decimal::ZERO,
        total_amount: totals.total_amount,
        currency: Currency::Usd,
        paid_amount: Decimal::ZERO,
        due_amount: totals.total_amount,
        status: InvoiceStatus::Draft,
        issue_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        due_date: NaiveDate::from_ymd_opt(2026, 2, 14).unwrap(),
        related_to: RelatedTo::Custom,
        update_history: Vec::new(),
        version: 0,
        created_utc: Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap(),
    }
}

const ALL_STATUSES: [InvoiceStatus; 7] = [
    InvoiceStatus::Draft,
    InvoiceStatus::Sent,
    InvoiceStatus::PartiallyPaid,
    InvoiceStatus::Paid,
    InvoiceStatus::Overdue,
    InvoiceStatus::Cancelled,
    InvoiceStatus::Void,
];

proptest! {
    /// totals always satisfy
    /// `total_amount = subtotal - total_discount - additional_discount + total_tax`,
    /// and the line totals sum to the invoice total.
    #[test]
    fn aggregate_totals_satisfy_identity(items in arb_items()) {
        let (lines, totals) =
            calculator::aggregate(&items, DiscountMode::Percentage, Decimal::ZERO).unwrap();

        prop_assert_eq!(
            totals.total_amount,
            totals.subtotal - totals.total_discount + totals.total_tax
        );
        let line_sum: Decimal = lines.iter().map(|l| l.total).sum();
        prop_assert_eq!(line_sum, totals.total_amount);
        prop_assert!(totals.total_amount >= Decimal::ZERO);
    }

    /// An accepted additional discount reduces the total by exactly its
    /// amount; a rejected one must actually have exceeded the balance.
    #[test]
    fn additional_discount_reduces_total_exactly(
        items in arb_items(),
        extra_cents in 0i64..1_000_000i64,
    ) {
        let additional = Decimal::new(extra_cents, 2);
        let (_, base) =
            calculator::aggregate(&items, DiscountMode::Percentage, Decimal::ZERO).unwrap();

        match calculator::aggregate(&items, DiscountMode::Percentage, additional) {
            Ok((_, totals)) => {
                prop_assert_eq!(totals.total_amount, base.total_amount - additional);
            }
            Err(InvoiceError::Validation(_)) => {
                prop_assert!(additional > base.total_amount);
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    /// Over any sequence of payment attempts, the due amount never goes
    /// negative, the paid amount never exceeds the total, and the status
    /// stays consistent with the ledger.
    #[test]
    fn payment_sequences_preserve_ledger_invariants(
        items in arb_items(),
        amounts in prop::collection::vec(1i64..200_000i64, 1..12),
    ) {
        let mut invoice = build_invoice(&items);
        let now = Utc.with_ymd_and_hms(2026, 1, 20, 12, 0, 0).unwrap();

        for cents in amounts {
            let amount = Decimal::new(cents, 2);
            match ledger::apply_payment(&invoice, amount, None, "tester", now) {
                Ok((updated, event)) => {
                    prop_assert_eq!(event.previous_paid_amount, invoice.paid_amount);
                    invoice = updated;
                }
                Err(InvoiceError::Overpayment { max_acceptable, .. }) => {
                    prop_assert_eq!(max_acceptable, invoice.due_amount);
                    prop_assert!(amount > invoice.due_amount);
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }

            prop_assert!(invoice.due_amount >= Decimal::ZERO);
            prop_assert!(invoice.paid_amount <= invoice.total_amount);
            prop_assert_eq!(
                invoice.due_amount,
                (invoice.total_amount - invoice.paid_amount).max(Decimal::ZERO)
            );
            prop_assert_eq!(
                invoice.status,
                status::derive_payment_status(
                    invoice.status,
                    invoice.paid_amount,
                    invoice.total_amount
                )
            );
        }
    }

    /// Deriving the status twice from the same inputs yields the same result.
    #[test]
    fn status_derivation_is_idempotent(
        status_index in 0usize..7,
        paid_cents in 0i64..1_000_000i64,
        total_cents in 0i64..1_000_000i64,
    ) {
        let current = ALL_STATUSES[status_index];
        let paid = Decimal::new(paid_cents, 2);
        let total = Decimal::new(total_cents, 2);

        let once = status::derive_payment_status(current, paid, total);
        let twice = status::derive_payment_status(once, paid, total);
        prop_assert_eq!(once, twice);
    }

    /// Flat discounts bounded by the line gross never produce a negative
    /// line total.
    #[test]
    fn flat_discounts_never_go_negative(
        quantity in 1u32..=10u32,
        price_cents in 0i64..100_000i64,
        discount_pct in 0u32..=100u32,
        tax_rate in 0u32..=25u32,
    ) {
        let gross = Decimal::from(quantity) * Decimal::new(price_cents, 2);
        let item = LineItemInput {
            name: "Item".to_string(),
            description: None,
            quantity,
            unit_price: Decimal::new(price_cents, 2),
            discount: gross * Decimal::from(discount_pct) / dec!(100),
            tax_rate: Decimal::from(tax_rate),
        };

        let amounts = calculator::compute_line_amounts(&item, DiscountMode::Flat).unwrap();
        prop_assert!(amounts.total >= Decimal::ZERO);
        prop_assert!(amounts.discount_amount <= amounts.gross);
    }
}
