//! Invoice model for invoicing-core.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::InvoiceError;

use super::line_item::{DiscountMode, LineItem, LineItemInput};
use super::payment::PaymentEvent;

/// Invoice status.
///
/// Only `sent`, `cancelled` and `void` are assigned directly (administrative
/// transitions); the rest are derived from the paid amount, see
/// `services::status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    PartiallyPaid,
    Paid,
    Overdue,
    Cancelled,
    Void,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::PartiallyPaid => "partially_paid",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
            InvoiceStatus::Void => "void",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "sent" => InvoiceStatus::Sent,
            "partially_paid" => InvoiceStatus::PartiallyPaid,
            "paid" => InvoiceStatus::Paid,
            "overdue" => InvoiceStatus::Overdue,
            "cancelled" => InvoiceStatus::Cancelled,
            "void" => InvoiceStatus::Void,
            _ => InvoiceStatus::Draft,
        }
    }

    /// Terminal statuses accept no further payments or transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Cancelled | InvoiceStatus::Void)
    }
}

/// Supported invoice currencies. Display-only, no conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Bdt,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Bdt => "BDT",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Bdt => "৳",
        }
    }
}

impl FromStr for Currency {
    type Err = InvoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "BDT" => Ok(Currency::Bdt),
            _ => Err(InvoiceError::Validation(anyhow::anyhow!(
                "Unsupported currency: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer details copied onto the invoice at creation time. Not a live
/// reference to a booking or user record.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    #[validate(length(min = 1, message = "customer name is required"))]
    pub name: String,
    #[validate(email(message = "customer email is not valid"))]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// What the invoice bills for. The variant carries the reference id, so an
/// invoice can never point at both a booking and a visa booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelatedTo {
    Custom,
    Booking { booking_id: Uuid },
    Visa { visa_booking_id: Uuid },
}

/// Invoice document.
///
/// All monetary aggregates are derived; they change only through the
/// lifecycle service, which re-runs the aggregator or the payment ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub customer: CustomerSnapshot,
    pub items: Vec<LineItem>,
    pub discount_mode: DiscountMode,
    pub subtotal: Decimal,
    pub total_discount: Decimal,
    pub total_tax: Decimal,
    pub additional_discount: Decimal,
    pub total_amount: Decimal,
    pub currency: Currency,
    pub paid_amount: Decimal,
    pub due_amount: Decimal,
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub related_to: RelatedTo,
    /// Append-only audit log, owned by the lifecycle service.
    pub update_history: Vec<PaymentEvent>,
    /// Optimistic concurrency token, bumped by the repository on update.
    pub version: u64,
    pub created_utc: DateTime<Utc>,
}

/// Input for creating an invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    /// Explicit customer details. When `None` and `related_to` names a
    /// booking, the snapshot provider fills this in.
    pub customer: Option<CustomerSnapshot>,
    pub related_to: RelatedTo,
    pub items: Vec<LineItemInput>,
    pub discount_mode: DiscountMode,
    pub additional_discount: Decimal,
    /// Defaults to the configured currency when absent.
    pub currency: Option<Currency>,
    pub issue_date: NaiveDate,
    /// Defaults to `issue_date` plus the configured net terms when absent.
    pub due_date: Option<NaiveDate>,
}
