//! In-memory principal store.
//!
//! [`MemoryPrincipalStore`] keeps account records in a `HashMap` and tracks
//! the running sum of materialized principal so `total_principal` is O(1).
//! It does no validation; the ledger commits only settled, checked records.
//! The running sum saturates at `u128::MAX`.

use std::collections::HashMap;

use accrual_core::traits::PrincipalStore;
use accrual_core::types::{AccountState, Address};

#[derive(Clone, Debug, Default)]
pub struct MemoryPrincipalStore {
    /// Account records by address.
    accounts: HashMap<Address, AccountState>,
    /// Sum of `principal` over `accounts`.
    total: u128,
}

impl MemoryPrincipalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of addresses that have ever been written.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl PrincipalStore for MemoryPrincipalStore {
    fn account(&self, who: &Address) -> AccountState {
        self.accounts.get(who).copied().unwrap_or_default()
    }

    fn put_account(&mut self, who: Address, state: AccountState) {
        let previous = self
            .accounts
            .insert(who, state)
            .map(|s| s.principal)
            .unwrap_or(0);
        self.total = self
            .total
            .saturating_sub(previous)
            .saturating_add(state.principal);
    }

    fn accounts(&self) -> Vec<(Address, AccountState)> {
        self.accounts.iter().map(|(a, s)| (*a, *s)).collect()
    }

    fn total_principal(&self) -> u128 {
        self.total
    }
}
