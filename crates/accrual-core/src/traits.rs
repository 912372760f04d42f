//! Trait interfaces for the accrual ledger.
//!
//! These traits define the seams between crates:
//! - [`PrincipalStore`]: raw per-account records (accrual-ledger implements)
//! - [`Authorizer`]: capability checks (accrual-ledger implements)
//! - [`Clock`]: current time source (accrual-ledger implements)
//! - [`Reserve`]: custody of the underlying asset (accrual-vault implements)

use crate::error::{LedgerError, ReserveError};
use crate::types::{AccountState, Address, Capability, Timestamp};

/// Raw account storage wrapped by the accrual ledger.
///
/// The store knows nothing about interest. It holds materialized principal,
/// the pinned rate and the last settlement time exactly as the ledger
/// commits them; settlement is layered on top by the ledger.
pub trait PrincipalStore: Send + Sync {
    /// Record for `who`. Unknown accounts read as [`AccountState::default`].
    fn account(&self, who: &Address) -> AccountState;

    /// Overwrite the record for `who`.
    fn put_account(&mut self, who: Address, state: AccountState);

    /// All known accounts, in unspecified order.
    fn accounts(&self) -> Vec<(Address, AccountState)>;

    /// Sum of materialized principal across all accounts.
    fn total_principal(&self) -> u128;

    /// Materialized principal for `who`.
    ///
    /// Default implementation delegates to [`account`](Self::account).
    fn principal_of(&self, who: &Address) -> u128 {
        self.account(who).principal
    }
}

/// Capability predicate checked at the top of every guarded operation.
///
/// Kept orthogonal to the accrual math so the policy (single owner, role
/// table, allowlist) can change without touching the ledger.
pub trait Authorizer: Send + Sync {
    /// Whether `caller` holds `capability`.
    fn is_authorized(&self, caller: &Address, capability: Capability) -> bool;

    /// Grant or revoke `capability` for `who`. Returns whether anything changed.
    ///
    /// Default implementation rejects role management entirely.
    fn set_role(
        &mut self,
        _who: Address,
        _capability: Capability,
        _enabled: bool,
    ) -> Result<bool, LedgerError> {
        Err(LedgerError::RoleManagementUnsupported)
    }

    /// Every address currently holding `capability`, sorted.
    fn holders(&self, capability: Capability) -> Vec<Address>;
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current Unix time in seconds.
    fn now(&self) -> Timestamp;
}

/// Custody of the underlying asset backing the claim token.
///
/// Sufficiency of the reserve is not tracked against outstanding claims;
/// implementations only refuse payouts they cannot cover.
pub trait Reserve: Send + Sync {
    /// Move `amount` underlying from `from` into the reserve.
    fn pull(&mut self, from: &Address, amount: u128) -> Result<(), ReserveError>;

    /// Pay `amount` underlying out of the reserve to `to`.
    fn pay(&mut self, to: &Address, amount: u128) -> Result<(), ReserveError>;

    /// Underlying currently held by the reserve.
    fn balance(&self) -> u128;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    // ------------------------------------------------------------------
    // Mock: PrincipalStore
    // ------------------------------------------------------------------

    #[derive(Default)]
    struct MockStore {
        accounts: HashMap<Address, AccountState>,
    }

    impl PrincipalStore for MockStore {
        fn account(&self, who: &Address) -> AccountState {
            self.accounts.get(who).copied().unwrap_or_default()
        }

        fn put_account(&mut self, who: Address, state: AccountState) {
            self.accounts.insert(who, state);
        }

        fn accounts(&self) -> Vec<(Address, AccountState)> {
            self.accounts.iter().map(|(a, s)| (*a, *s)).collect()
        }

        fn total_principal(&self) -> u128 {
            self.accounts.values().map(|s| s.principal).sum()
        }
    }

    // ------------------------------------------------------------------
    // Mock: Authorizer
    // ------------------------------------------------------------------

    struct OnlyAdmin(Address);

    impl Authorizer for OnlyAdmin {
        fn is_authorized(&self, caller: &Address, capability: Capability) -> bool {
            capability == Capability::Admin && *caller == self.0
        }

        fn holders(&self, capability: Capability) -> Vec<Address> {
            match capability {
                Capability::Admin => vec![self.0],
                Capability::MintBurn => Vec::new(),
            }
        }
    }

    struct FixedClock(Timestamp);

    impl Clock for FixedClock {
        fn now(&self) -> Timestamp {
            self.0
        }
    }

    #[test]
    fn store_default_principal_of_delegates() {
        let mut store = MockStore::default();
        let a = Address([1; 20]);
        assert_eq!(store.principal_of(&a), 0);
        store.put_account(
            a,
            AccountState {
                principal: 9,
                rate: 1,
                last_synced_at: 0,
            },
        );
        assert_eq!(store.principal_of(&a), 9);
        assert_eq!(store.total_principal(), 9);
    }

    #[test]
    fn store_is_object_safe() {
        let store = MockStore::default();
        let dyn_store: &dyn PrincipalStore = &store;
        assert!(dyn_store.accounts().is_empty());
    }

    #[test]
    fn authorizer_default_set_role_is_unsupported() {
        let mut auth = OnlyAdmin(Address([7; 20]));
        let err = auth
            .set_role(Address([8; 20]), Capability::MintBurn, true)
            .unwrap_err();
        assert_eq!(err, LedgerError::RoleManagementUnsupported);
    }

    #[test]
    fn authorizer_checks_capability() {
        let admin = Address([7; 20]);
        let auth = OnlyAdmin(admin);
        assert!(auth.is_authorized(&admin, Capability::Admin));
        assert!(!auth.is_authorized(&admin, Capability::MintBurn));
        assert!(!auth.is_authorized(&Address::ZERO, Capability::Admin));
    }

    #[test]
    fn clock_is_object_safe() {
        let c = FixedClock(42);
        let dyn_c: &dyn Clock = &c;
        assert_eq!(dyn_c.now(), 42);
    }
}
