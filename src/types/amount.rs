use std::str::FromStr;

use rust_decimal::Decimal;

use crate::types::errors::AmountError;

const GROUPING_SEPARATOR: char = ',';

/// Parses a currency amount as printed in bank notifications, e.g. `1,25,000.50`.
///
/// Grouping separators are dropped regardless of where they appear so that both
/// western (`1,250,000`) and Indian (`12,50,000`) grouping parse to the same value.
pub fn parse_amount(value: &str) -> Result<Decimal, AmountError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(AmountError::Empty);
    }

    let stripped: String = value.chars().filter(|character| *character != GROUPING_SEPARATOR).collect();

    Decimal::from_str(&stripped).map_err(|source| AmountError::InvalidFormat {
        value: value.to_string(),
        source
    })
}
