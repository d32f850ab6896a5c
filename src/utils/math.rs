use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use rust_decimal::{Decimal, RoundingStrategy};

/// Convert a human amount to base units: round(amount * 10^decimals).
///
/// Exact for any decimal count; the result is a base-10 integer string.
/// Returns `None` for negative amounts.
pub fn to_base_units(amount: Decimal, decimals: u32) -> Option<String> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return None;
    }

    // Decimal keeps at most 28 fractional digits, so rounding first is lossless
    // for any scale the amount can carry.
    let rounded = if decimals < amount.scale() {
        amount.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
    } else {
        amount
    };

    let mantissa = BigUint::from(rounded.mantissa().unsigned_abs());
    let shift = decimals - rounded.scale().min(decimals);
    let value = mantissa * BigUint::from(10u32).pow(shift);
    Some(value.to_str_radix(10))
}

/// Render base units as a trimmed decimal string ("1500000", 6 -> "1.5").
pub fn format_base_units(raw: &str, decimals: u32) -> Option<String> {
    let value = BigUint::from_str(raw.trim()).ok()?;
    let divisor = BigUint::from(10u32).pow(decimals);
    let whole = &value / &divisor;
    let fraction = &value % &divisor;

    if fraction.is_zero() {
        return Some(whole.to_str_radix(10));
    }

    let fraction = format!("{:0>width$}", fraction.to_str_radix(10), width = decimals as usize);
    Some(format!("{}.{}", whole, fraction.trim_end_matches('0')))
}

/// Lossy f64 view of a base-unit amount, for display only.
pub fn base_units_to_f64(raw: &str, decimals: u32) -> Option<f64> {
    let value = BigUint::from_str(raw.trim()).ok()?.to_f64()?;
    Some(value / 10f64.powi(decimals as i32))
}
