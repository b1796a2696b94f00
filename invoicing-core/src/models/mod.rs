//! Domain models for invoicing-core.

mod invoice;
mod line_item;
mod payment;

pub use invoice::{
    CreateInvoice, Currency, CustomerSnapshot, Invoice, InvoiceStatus, RelatedTo,
};
pub use line_item::{DiscountMode, LineItem, LineItemInput};
pub use payment::{PaymentEvent, PaymentEventKind};
