//! Line-item and invoice total calculation for invoicing-core.
//!
//! Pure functions. Callers re-run [`aggregate`] after every item mutation;
//! nothing here recomputes implicitly.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::error::InvoiceError;
use crate::models::{DiscountMode, LineItem, LineItemInput};

/// Round a monetary amount to 2 decimal places, half away from zero.
fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Derived amounts for a single line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmounts {
    /// `quantity * unit_price`, before discount and tax.
    pub gross: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// Invoice-level aggregates over a set of line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub total_discount: Decimal,
    pub total_tax: Decimal,
    pub total_amount: Decimal,
}

/// Compute one line item's derived amounts.
///
/// The discount applies to the line gross; tax applies to what remains after
/// the discount. Flat discounts larger than the line gross are rejected
/// rather than clamped, so a line total can never go negative.
pub fn compute_line_amounts(
    item: &LineItemInput,
    mode: DiscountMode,
) -> Result<LineAmounts, InvoiceError> {
    if item.name.trim().is_empty() {
        return Err(InvoiceError::Validation(anyhow::anyhow!(
            "Line item name is required"
        )));
    }
    if item.quantity < 1 {
        return Err(InvoiceError::Validation(anyhow::anyhow!(
            "Line item quantity must be at least 1"
        )));
    }
    if item.unit_price.is_sign_negative() {
        return Err(InvoiceError::Validation(anyhow::anyhow!(
            "Unit price cannot be negative"
        )));
    }
    if item.discount.is_sign_negative() {
        return Err(InvoiceError::Validation(anyhow::anyhow!(
            "Discount cannot be negative"
        )));
    }
    if item.tax_rate.is_sign_negative() {
        return Err(InvoiceError::Validation(anyhow::anyhow!(
            "Tax rate cannot be negative"
        )));
    }

    let gross = Decimal::from(item.quantity) * item.unit_price;

    let discount_amount = match mode {
        DiscountMode::Percentage => {
            if item.discount > Decimal::ONE_HUNDRED {
                return Err(InvoiceError::Validation(anyhow::anyhow!(
                    "Percentage discount cannot exceed 100"
                )));
            }
            round_money(gross * item.discount / Decimal::ONE_HUNDRED)
        }
        DiscountMode::Flat => {
            if item.discount > gross {
                return Err(InvoiceError::Validation(anyhow::anyhow!(
                    "Flat discount {} exceeds the line amount {}",
                    item.discount,
                    gross
                )));
            }
            round_money(item.discount)
        }
    };

    let taxable = gross - discount_amount;
    let tax_amount = round_money(taxable * item.tax_rate / Decimal::ONE_HUNDRED);
    let total = taxable + tax_amount;

    Ok(LineAmounts {
        gross,
        discount_amount,
        tax_amount,
        total,
    })
}

/// Materialize a line item from its input and derived amounts.
fn materialize(item: &LineItemInput, amounts: &LineAmounts) -> LineItem {
    LineItem {
        name: item.name.clone(),
        description: item.description.clone(),
        quantity: item.quantity,
        unit_price: item.unit_price,
        discount: item.discount,
        tax_rate: item.tax_rate,
        discount_amount: amounts.discount_amount,
        tax_amount: amounts.tax_amount,
        total: amounts.total,
    }
}

/// Aggregate line items into invoice totals and apply the invoice-level
/// additional discount.
///
/// `total_amount = subtotal - total_discount - additional_discount + total_tax`
/// holds exactly over the rounded per-line components. An additional discount
/// that would push the total below zero is rejected; callers clamp before
/// calling or surface the error.
pub fn aggregate(
    items: &[LineItemInput],
    mode: DiscountMode,
    additional_discount: Decimal,
) -> Result<(Vec<LineItem>, InvoiceTotals), InvoiceError> {
    if items.is_empty() {
        return Err(InvoiceError::Validation(anyhow::anyhow!(
            "Invoice requires at least one line item"
        )));
    }
    if additional_discount.is_sign_negative() {
        return Err(InvoiceError::Validation(anyhow::anyhow!(
            "Additional discount cannot be negative"
        )));
    }

    let mut line_items = Vec::with_capacity(items.len());
    let mut subtotal = Decimal::ZERO;
    let mut total_discount = Decimal::ZERO;
    let mut total_tax = Decimal::ZERO;

    for item in items {
        let amounts = compute_line_amounts(item, mode)?;
        subtotal += amounts.gross;
        total_discount += amounts.discount_amount;
        total_tax += amounts.tax_amount;
        line_items.push(materialize(item, &amounts));
    }

    let additional_discount = round_money(additional_discount);
    let total_amount = subtotal - total_discount - additional_discount + total_tax;
    if total_amount.is_sign_negative() {
        return Err(InvoiceError::Validation(anyhow::anyhow!(
            "Additional discount {} exceeds the remaining invoice balance",
            additional_discount
        )));
    }

    Ok((
        line_items,
        InvoiceTotals {
            subtotal,
            total_discount,
            total_tax,
            total_amount,
        },
    ))
}
