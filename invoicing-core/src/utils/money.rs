//! Display formatting for monetary amounts.

use rust_decimal::Decimal;

/// Symbol for a currency code; `$` when the code is not recognized.
pub fn currency_symbol(code: &str) -> &'static str {
    match code.to_ascii_uppercase().as_str() {
        "EUR" => "€",
        "GBP" => "£",
        "BDT" => "৳",
        _ => "$",
    }
}

/// Render an amount with its currency symbol and exactly two decimal places.
/// Never fails; unknown codes fall back to the default symbol.
pub fn format_amount(amount: Decimal, code: &str) -> String {
    format!("{}{:.2}", currency_symbol(code), amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn formats_known_currencies() {
        assert_eq!(format_amount(dec!(1234.5), "USD"), "$1234.50");
        assert_eq!(format_amount(dec!(89), "EUR"), "€89.00");
        assert_eq!(format_amount(dec!(0.5), "GBP"), "£0.50");
        assert_eq!(format_amount(dec!(2500), "BDT"), "৳2500.00");
    }

    #[test]
    fn unknown_code_falls_back_to_dollar() {
        assert_eq!(format_amount(dec!(10), "JPY"), "$10.00");
        assert_eq!(format_amount(dec!(10), ""), "$10.00");
    }

    #[test]
    fn lowercase_codes_are_recognized() {
        assert_eq!(format_amount(dec!(5), "eur"), "€5.00");
    }
}
