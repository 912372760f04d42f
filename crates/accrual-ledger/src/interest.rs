//! Linear interest math.
//!
//! `effective = principal * (SCALE + rate * elapsed) / SCALE`
//!
//! All arithmetic is integer-only and checked. The product is floored once,
//! exactly as the rational value would be, but it is evaluated in pieces so
//! the intermediate never needs more than 128 bits: with `principal = q*SCALE + r`
//! and `rate * elapsed = gq*SCALE + gr`,
//!
//! `principal * (rate * elapsed) / SCALE = q*(rate*elapsed) + r*gq + r*gr / SCALE`
//!
//! where `r` and `gr` are both below `SCALE`. Overflow is reported only when
//! the balance itself leaves `u128`.

use accrual_core::constants::SCALE;
use accrual_core::error::LedgerError;
use accrual_core::types::{AccountState, Timestamp};

const SCALE_WIDE: u128 = SCALE as u128;

/// Growth factor `SCALE + rate * elapsed`, in fixed point.
pub fn growth_factor(rate: u64, elapsed: u64) -> Result<u128, LedgerError> {
    (rate as u128)
        .checked_mul(elapsed as u128)
        .and_then(|accrued| accrued.checked_add(SCALE_WIDE))
        .ok_or(LedgerError::ArithmeticOverflow)
}

/// `floor(principal * accrued / SCALE)` without a 256-bit intermediate.
fn scaled_interest(principal: u128, accrued: u128) -> Result<u128, LedgerError> {
    let (q, r) = (principal / SCALE_WIDE, principal % SCALE_WIDE);
    let (gq, gr) = (accrued / SCALE_WIDE, accrued % SCALE_WIDE);
    // r, gr < SCALE, so r * gr < SCALE^2 < u128::MAX
    let tail = r * gr / SCALE_WIDE;
    q.checked_mul(accrued)
        .and_then(|x| r.checked_mul(gq).and_then(|y| x.checked_add(y)))
        .and_then(|x| x.checked_add(tail))
        .ok_or(LedgerError::ArithmeticOverflow)
}

/// Balance after `elapsed` seconds of linear accrual at `rate`.
///
/// Returns `principal` unchanged when either `elapsed` or `rate` is zero.
pub fn accrue(principal: u128, rate: u64, elapsed: u64) -> Result<u128, LedgerError> {
    if principal == 0 || rate == 0 || elapsed == 0 {
        return Ok(principal);
    }
    // rate and elapsed are u64, so their product always fits in u128
    let accrued = rate as u128 * elapsed as u128;
    principal
        .checked_add(scaled_interest(principal, accrued)?)
        .ok_or(LedgerError::ArithmeticOverflow)
}

/// Seconds elapsed since the account's last settlement.
///
/// A clock reading earlier than `last_synced_at` counts as zero elapsed time.
pub fn elapsed_since_sync(state: &AccountState, now: Timestamp) -> u64 {
    now.saturating_sub(state.last_synced_at)
}

/// Effective balance of `state` at `now`.
pub fn effective_balance(state: &AccountState, now: Timestamp) -> Result<u128, LedgerError> {
    accrue(state.principal, state.rate, elapsed_since_sync(state, now))
}

/// Interest accrued but not yet folded into principal at `now`.
pub fn pending_interest(state: &AccountState, now: Timestamp) -> Result<u128, LedgerError> {
    // effective >= principal because the growth factor is >= SCALE
    Ok(effective_balance(state, now)? - state.principal)
}
