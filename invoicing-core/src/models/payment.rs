//! Payment event model for invoicing-core.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::invoice::InvoiceStatus;

/// What an audit event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentEventKind {
    Payment,
    Refund,
    /// Administrative transition (sent, cancelled, void). Carries a zero
    /// amount; the paid amount is unchanged.
    StatusChange,
}

impl PaymentEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentEventKind::Payment => "payment",
            PaymentEventKind::Refund => "refund",
            PaymentEventKind::StatusChange => "status_change",
        }
    }
}

/// One entry in an invoice's append-only update history, capturing the paid
/// amount and status before and after the change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub event_id: Uuid,
    pub kind: PaymentEventKind,
    pub amount: Decimal,
    pub notes: Option<String>,
    pub previous_paid_amount: Decimal,
    pub new_paid_amount: Decimal,
    pub previous_status: InvoiceStatus,
    pub new_status: InvoiceStatus,
    pub updater_name: String,
    pub created_utc: DateTime<Utc>,
}
