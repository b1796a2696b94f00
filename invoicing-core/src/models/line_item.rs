//! Line item model for invoicing-core.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How the `discount` figure on line items is interpreted.
///
/// One mode applies to the whole invoice; mixing modes across lines of a
/// single invoice is not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountMode {
    /// `discount` is a percentage of the line gross, 0-100.
    Percentage,
    /// `discount` is a flat amount in the invoice currency.
    Flat,
}

impl DiscountMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountMode::Percentage => "percentage",
            DiscountMode::Flat => "flat",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "flat" => DiscountMode::Flat,
            _ => DiscountMode::Percentage,
        }
    }
}

/// Line item on an invoice. The `discount_amount`, `tax_amount` and `total`
/// fields are derived by the calculator and never authored directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub description: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub tax_rate: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// Input for a line item, before derivation.
#[derive(Debug, Clone)]
pub struct LineItemInput {
    pub name: String,
    pub description: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub tax_rate: Decimal,
}
