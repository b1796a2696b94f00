use config::{Config as Cfg, File};
use serde::Deserialize;

use crate::error::InvoiceError;
use crate::models::Currency;

/// Invoicing configuration, sourced from `configuration.*` files and
/// `INVOICING_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct InvoicingConfig {
    /// Prefix for generated invoice numbers.
    #[serde(default = "default_number_prefix")]
    pub number_prefix: String,
    /// Days between issue date and the default due date.
    #[serde(default = "default_net_terms_days")]
    pub net_terms_days: u16,
    /// Currency used when an invoice does not name one.
    #[serde(default = "default_currency")]
    pub default_currency: Currency,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_number_prefix() -> String {
    "INV".to_string()
}

fn default_net_terms_days() -> u16 {
    30
}

fn default_currency() -> Currency {
    Currency::Usd
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for InvoicingConfig {
    fn default() -> Self {
        Self {
            number_prefix: default_number_prefix(),
            net_terms_days: default_net_terms_days(),
            default_currency: default_currency(),
            log_level: default_log_level(),
        }
    }
}

impl InvoicingConfig {
    pub fn load() -> Result<Self, InvoiceError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("INVOICING").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
