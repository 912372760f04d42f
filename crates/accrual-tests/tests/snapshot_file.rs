//! Snapshots written to disk and restored into a fresh ledger keep every
//! account accruing exactly as before.

use std::io::Write;

use accrual_core::constants::INITIAL_GLOBAL_RATE;
use accrual_core::error::SnapshotError;
use accrual_core::traits::Clock;
use accrual_core::types::Amount;
use accrual_ledger::{AccrualLedger, LedgerSnapshot, ManualClock, MemoryPrincipalStore};
use accrual_tests::helpers::*;

#[test]
fn restored_ledger_accrues_identically() {
    let (mut ledger, clock) = ledger();
    let a = addr(0x01);
    let b = addr(0x02);
    let spender = addr(0x03);

    ledger.mint(&POOL, &a, 3 * TOKEN).unwrap();
    clock.advance(TWO_HOURS);
    ledger.set_global_rate(&ADMIN, LOWER_RATE).unwrap();
    ledger.mint(&POOL, &b, TOKEN).unwrap();
    ledger.transfer(&a, &a, &b, Amount::Exact(TOKEN)).unwrap();
    ledger.approve(&a, &spender, 42);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.snap");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(&ledger.snapshot().encode().unwrap()).unwrap();
    drop(file);

    let bytes = std::fs::read(&path).unwrap();
    let snapshot = LedgerSnapshot::decode(&bytes).unwrap();
    let restored_clock = ManualClock::new(clock.now());
    let mut restored = AccrualLedger::from_snapshot(
        &snapshot,
        MemoryPrincipalStore::new(),
        snapshot.role_table().unwrap(),
        restored_clock.clone(),
    );

    assert_eq!(restored.global_rate(), LOWER_RATE);
    assert_eq!(restored.rate_version(), ledger.rate_version());
    assert_eq!(restored.allowance(&a, &spender), 42);
    assert_eq!(restored.rate_of(&a), INITIAL_GLOBAL_RATE);
    assert_eq!(restored.rate_of(&b), LOWER_RATE);
    assert_eq!(restored.total_supply(), ledger.total_supply());

    clock.advance(86_400);
    restored_clock.advance(86_400);
    for who in [a, b] {
        assert_eq!(
            restored.effective_balance_of(&who).unwrap(),
            ledger.effective_balance_of(&who).unwrap()
        );
    }

    // restored roles still gate privileged calls
    assert!(restored.set_global_rate(&ADMIN, LOWER_RATE + 1).is_err());
    restored.mint(&POOL, &spender, 1).unwrap();
}

#[test]
fn truncated_file_is_rejected() {
    let (mut ledger, _clock) = ledger();
    ledger.mint(&POOL, &addr(0x01), TOKEN).unwrap();
    let bytes = ledger.snapshot().encode().unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&bytes[..bytes.len() / 2]).unwrap();
    let read = std::fs::read(file.path()).unwrap();
    assert!(matches!(
        LedgerSnapshot::decode(&read),
        Err(SnapshotError::Decode(_))
    ));
}

#[test]
fn appended_garbage_is_rejected() {
    let (ledger, _clock) = ledger();
    let mut bytes = ledger.snapshot().encode().unwrap();
    bytes.extend_from_slice(&[0xFF, 0xFF]);
    assert_eq!(
        LedgerSnapshot::decode(&bytes),
        Err(SnapshotError::TrailingBytes(2))
    );
}
