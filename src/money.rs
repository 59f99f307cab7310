use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{BankError, Result};

/// Round to cents, half away from zero.
pub fn round2(val: Decimal) -> Decimal {
    val.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Parse a user-typed amount. Accepts `,` as the decimal separator and surrounding
/// whitespace; anything else that is not a plain number is rejected.
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    let s = raw.trim().replace(',', ".");
    if s.is_empty() {
        return Err(BankError::validation("Amount must be a number."));
    }
    s.parse::<Decimal>()
        .map_err(|_| BankError::validation(format!("'{}' is not a valid amount.", raw.trim())))
}
