//! Currencies

use rusty_money::iso::{self, Currency};

/// Look up a supported ISO 4217 currency by its alphabetic code.
pub fn find(code: &str) -> Option<&'static Currency> {
    let currency = match code.trim().to_ascii_uppercase().as_str() {
        "EUR" => iso::EUR,
        "GBP" => iso::GBP,
        "USD" => iso::USD,
        "CHF" => iso::CHF,
        "DKK" => iso::DKK,
        "SEK" => iso::SEK,
        "NOK" => iso::NOK,
        "PLN" => iso::PLN,
        "CZK" => iso::CZK,
        "JPY" => iso::JPY,
        _ => return None,
    };

    Some(currency)
}
