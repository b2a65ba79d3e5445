use rust_decimal::{Decimal, RoundingStrategy};

/// Two decimal places, truncated toward zero. Persisted balances were always
/// produced this way, so half-even or half-up rounding would drift from them.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}
