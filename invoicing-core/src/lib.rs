//! invoicing-core: invoice financial model and payment lifecycle for the
//! travel-agency platform.
//!
//! The library owns how line items, discounts and taxes roll up into invoice
//! totals, how payments apply against those totals, and how the invoice
//! status is derived and transitioned. Transport, persistence and rendering
//! are collaborators behind the contracts in [`services::repository`].

pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod services;
pub mod utils;

pub use config::InvoicingConfig;
pub use error::InvoiceError;
pub use models::{
    CreateInvoice, Currency, CustomerSnapshot, DiscountMode, Invoice, InvoiceStatus, LineItem,
    LineItemInput, PaymentEvent, PaymentEventKind, RelatedTo,
};
pub use services::calculator::{aggregate, compute_line_amounts, InvoiceTotals, LineAmounts};
pub use services::lifecycle::InvoiceService;
pub use services::repository::{
    InMemoryInvoiceRepository, InvoiceNumberGenerator, InvoiceRepository, ListInvoicesFilter,
    SequenceNumberGenerator, SnapshotProvider,
};
pub use services::status::{effective_status, is_overdue};
