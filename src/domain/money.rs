//! Monetary and volume types, plus pip arithmetic for currency pairs.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Price represented as a Decimal for precision.
pub type Price = Decimal;

/// Account currency amount (balance, P&L, loss limits).
pub type Amount = Decimal;

/// Trade volume in standard lots.
pub type Lots = Decimal;

/// Pip size for a normalised currency pair.
///
/// Yen-quoted pairs move in hundredths, everything else in ten-thousandths.
#[must_use]
pub fn pip_size(pair: &str) -> Decimal {
    if pair.ends_with("JPY") {
        dec!(0.01)
    } else {
        dec!(0.0001)
    }
}

/// Distance between two prices expressed in pips.
///
/// `None` when the distance does not fit in a `Decimal`.
#[must_use]
pub fn price_distance_in_pips(pair: &str, a: Price, b: Price) -> Option<Decimal> {
    a.checked_sub(b)?.abs().checked_div(pip_size(pair))
}

/// Normalise a pair symbol: trimmed, upper-cased, separators removed.
#[must_use]
pub fn normalize_pair(pair: &str) -> String {
    pair.trim()
        .chars()
        .filter(|c| !matches!(c, '/' | '-' | '_' | ' '))
        .flat_map(char::to_uppercase)
        .collect()
}
