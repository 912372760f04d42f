//! Shared fixtures for the integration tests.

use accrual_core::constants::{INITIAL_GLOBAL_RATE, SCALE};
use accrual_core::types::Address;
use accrual_ledger::{AccrualLedger, ManualClock, MemoryPrincipalStore, RoleTable};
use accrual_vault::{MemoryReserve, Vault};

/// One whole token in base units.
pub const TOKEN: u128 = SCALE as u128;
pub const TWO_HOURS: u64 = 7_200;
/// Rate the global rate is lowered to in the reference scenario.
pub const LOWER_RATE: u64 = 40_000_000_000;

pub const ADMIN: Address = Address([0xA0; 20]);
pub const POOL: Address = Address([0xB0; 20]);

pub type TestLedger = AccrualLedger<MemoryPrincipalStore, RoleTable, ManualClock>;
pub type TestVault = Vault<MemoryReserve, MemoryPrincipalStore, RoleTable, ManualClock>;

/// Address filled with `seed`.
pub fn addr(seed: u8) -> Address {
    Address([seed; 20])
}

/// Ledger at `INITIAL_GLOBAL_RATE` with `POOL` as the only minter, clock at 0.
pub fn ledger() -> (TestLedger, ManualClock) {
    let clock = ManualClock::new(0);
    let ledger = AccrualLedger::in_memory(
        RoleTable::new(ADMIN).with_minter(POOL),
        clock.clone(),
        INITIAL_GLOBAL_RATE,
    );
    (ledger, clock)
}

/// Vault at `POOL` over a fresh ledger. Each of `funded` gets `wallet`
/// underlying units to deposit from.
pub fn vault(funded: &[Address], wallet: u128) -> (TestVault, ManualClock) {
    let (ledger, clock) = ledger();
    let mut reserve = MemoryReserve::new();
    for who in funded {
        reserve.credit(who, wallet).unwrap();
    }
    (Vault::new(POOL, ledger.into_shared(), reserve), clock)
}
