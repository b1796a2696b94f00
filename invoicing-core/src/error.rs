use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the invoicing core. All operations are all-or-nothing:
/// an error means nothing was persisted.
#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("Validation error: {0}")]
    Validation(anyhow::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] validator::ValidationErrors),

    #[error("Payment of {amount} exceeds the amount due; maximum acceptable is {max_acceptable}")]
    Overpayment {
        amount: Decimal,
        max_acceptable: Decimal,
    },

    #[error("Invalid state: {0}")]
    InvalidState(anyhow::Error),

    #[error("Conflicting concurrent update for invoice {0}")]
    ConcurrencyConflict(Uuid),

    #[error("Invoice not found: {0}")]
    NotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(anyhow::Error),
}

impl From<config::ConfigError> for InvoiceError {
    fn from(err: config::ConfigError) -> Self {
        InvoiceError::Config(anyhow::Error::new(err))
    }
}

impl InvoiceError {
    /// Stable label for the metrics `error_type` dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            InvoiceError::Validation(_) | InvoiceError::InvalidInput(_) => "validation",
            InvoiceError::Overpayment { .. } => "overpayment",
            InvoiceError::InvalidState(_) => "invalid_state",
            InvoiceError::ConcurrencyConflict(_) => "concurrency_conflict",
            InvoiceError::NotFound(_) => "not_found",
            InvoiceError::Storage(_) => "storage",
            InvoiceError::Config(_) => "config",
        }
    }
}
