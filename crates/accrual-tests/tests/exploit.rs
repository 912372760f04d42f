//! Rate inheritance and the zero-balance re-pin.
//!
//! An account keeps the rate it was pinned to for as long as it holds a
//! balance. An empty account is re-pinned on its next credit: to the global
//! rate when minted, or to the sender's rate when it receives a transfer.
//! That second path lets any holder of an old, higher rate hand it to a
//! fresh or drained account after the global rate has been lowered. These
//! tests pin that behaviour down.

use accrual_core::constants::INITIAL_GLOBAL_RATE;
use accrual_core::events::LedgerEvent;
use accrual_core::types::Amount;
use accrual_tests::helpers::*;

#[test]
fn reference_scenario() {
    let (mut ledger, clock) = ledger();
    let a = addr(0x0A);
    let b = addr(0x0B);

    ledger.mint(&POOL, &a, TOKEN).unwrap();
    assert_eq!(ledger.effective_balance_of(&a).unwrap(), TOKEN);

    let mut samples = vec![TOKEN];
    for _ in 0..3 {
        clock.advance(TWO_HOURS);
        samples.push(ledger.effective_balance_of(&a).unwrap());
    }
    let deltas: Vec<u128> = samples.windows(2).map(|w| w[1] - w[0]).collect();
    assert!(deltas[0] > 0);
    for d in &deltas {
        assert!(d.abs_diff(deltas[0]) <= 1, "deltas not linear: {deltas:?}");
    }

    ledger.set_global_rate(&ADMIN, LOWER_RATE).unwrap();
    ledger.transfer(&a, &a, &b, Amount::Exact(TOKEN / 2)).unwrap();
    assert_eq!(ledger.rate_of(&b), INITIAL_GLOBAL_RATE);
    assert_eq!(ledger.global_rate(), LOWER_RATE);
}

#[test]
fn inheritance_is_asymmetric() {
    let (mut ledger, clock) = ledger();
    let x = addr(0x10);
    let y = addr(0x11);
    let late = addr(0x12);

    ledger.mint(&POOL, &x, TOKEN).unwrap();
    clock.advance(TWO_HOURS);
    ledger.set_global_rate(&ADMIN, LOWER_RATE).unwrap();
    ledger.mint(&POOL, &late, TOKEN).unwrap();
    assert_eq!(ledger.rate_of(&late), LOWER_RATE);

    // empty recipient takes the sender's older rate
    ledger.transfer(&x, &x, &y, Amount::Exact(1_000)).unwrap();
    assert_eq!(ledger.rate_of(&y), INITIAL_GLOBAL_RATE);

    // funded recipient keeps its own rate whatever the sender's
    ledger.transfer(&late, &late, &x, Amount::Exact(1_000)).unwrap();
    assert_eq!(ledger.rate_of(&x), INITIAL_GLOBAL_RATE);
    ledger.transfer(&x, &x, &late, Amount::Exact(1_000)).unwrap();
    assert_eq!(ledger.rate_of(&late), LOWER_RATE);
}

#[test]
fn drained_account_is_repinned_to_sender_rate() {
    let (mut ledger, clock) = ledger();
    let old = addr(0x20);
    let victim = addr(0x21);
    let sink = addr(0x22);

    ledger.mint(&POOL, &old, TOKEN).unwrap();
    ledger.set_global_rate(&ADMIN, LOWER_RATE).unwrap();
    ledger.mint(&POOL, &victim, TOKEN).unwrap();
    ledger.mint(&POOL, &sink, 1).unwrap();
    assert_eq!(ledger.rate_of(&victim), LOWER_RATE);

    clock.advance(TWO_HOURS);
    let drained = ledger.transfer(&victim, &victim, &sink, Amount::All).unwrap();
    assert!(drained > TOKEN);
    assert_eq!(ledger.principal_of(&victim), 0);

    ledger.transfer(&old, &old, &victim, Amount::Exact(1)).unwrap();
    assert_eq!(ledger.rate_of(&victim), INITIAL_GLOBAL_RATE);
    assert!(ledger.rate_of(&victim) > ledger.global_rate());

    // the funds come back and now earn the old rate
    ledger.transfer(&sink, &sink, &victim, Amount::Exact(drained)).unwrap();
    assert_eq!(ledger.rate_of(&victim), INITIAL_GLOBAL_RATE);
    let before = ledger.effective_balance_of(&victim).unwrap();
    clock.advance(TWO_HOURS);
    let gained = ledger.effective_balance_of(&victim).unwrap() - before;
    let expected =
        before * u128::from(INITIAL_GLOBAL_RATE) * u128::from(TWO_HOURS) / TOKEN;
    assert!(gained.abs_diff(expected) <= 1);
}

#[test]
fn zero_amount_transfer_repins_empty_account() {
    let (mut ledger, _clock) = ledger();
    let old = addr(0x30);
    let empty = addr(0x31);

    ledger.mint(&POOL, &old, TOKEN).unwrap();
    ledger.set_global_rate(&ADMIN, LOWER_RATE).unwrap();
    ledger.transfer(&old, &old, &empty, Amount::Exact(0)).unwrap();

    assert_eq!(ledger.principal_of(&empty), 0);
    assert_eq!(ledger.rate_of(&empty), INITIAL_GLOBAL_RATE);
    // a later mint into the still-empty account pins the current global rate
    ledger.mint(&POOL, &empty, TOKEN).unwrap();
    assert_eq!(ledger.rate_of(&empty), LOWER_RATE);
}

#[test]
fn delegated_transfer_also_passes_rate() {
    let (mut ledger, _clock) = ledger();
    let owner = addr(0x40);
    let spender = addr(0x41);
    let fresh = addr(0x42);

    ledger.mint(&POOL, &owner, TOKEN).unwrap();
    ledger.set_global_rate(&ADMIN, LOWER_RATE).unwrap();
    ledger.approve(&owner, &spender, 500);
    ledger
        .transfer(&spender, &owner, &fresh, Amount::Exact(500))
        .unwrap();

    assert_eq!(ledger.rate_of(&fresh), INITIAL_GLOBAL_RATE);
    assert_eq!(ledger.allowance(&owner, &spender), 0);
}

#[test]
fn exploit_emits_only_ordinary_events() {
    let (mut ledger, _clock) = ledger();
    let old = addr(0x50);
    let fresh = addr(0x51);
    ledger.mint(&POOL, &old, TOKEN).unwrap();
    ledger.set_global_rate(&ADMIN, LOWER_RATE).unwrap();
    ledger.take_events();

    ledger.transfer(&old, &old, &fresh, Amount::Exact(1)).unwrap();
    assert_eq!(
        ledger.take_events(),
        vec![LedgerEvent::Transfer {
            from: Some(old),
            to: Some(fresh),
            amount: 1
        }]
    );
}
