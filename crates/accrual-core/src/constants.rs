//! Protocol constants. Rates are fixed-point values scaled by [`SCALE`].

/// Fixed-point precision for interest rates (10^18).
///
/// A rate of `SCALE` means 100% growth per second; realistic rates are many
/// orders of magnitude smaller.
pub const SCALE: u64 = 1_000_000_000_000_000_000;

/// Global rate in effect when a ledger is first created: `5 * SCALE / 10^8`
/// per second (5e10).
///
/// # Examples
///
/// ```
/// use accrual_core::constants::{INITIAL_GLOBAL_RATE, SCALE};
/// assert_eq!(INITIAL_GLOBAL_RATE, 50_000_000_000);
/// assert_eq!(INITIAL_GLOBAL_RATE, 5 * SCALE / 100_000_000);
/// ```
pub const INITIAL_GLOBAL_RATE: u64 = 5 * SCALE / 100_000_000;

/// Allowance value treated as unlimited. Delegated transfers never decrement it.
pub const UNLIMITED_ALLOWANCE: u128 = u128::MAX;

/// Length in bytes of an account [`Address`](crate::types::Address).
pub const ADDRESS_LEN: usize = 20;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_rate_below_scale() {
        assert!(INITIAL_GLOBAL_RATE < SCALE);
        assert!(INITIAL_GLOBAL_RATE > 0);
    }

    #[test]
    fn scale_is_ten_to_eighteen() {
        assert_eq!(SCALE, 10u64.pow(18));
    }
}
