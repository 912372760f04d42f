//! Capability policies for guarded ledger operations.
//!
//! - [`RoleTable`]: one fixed admin plus a managed set of mint/burn holders.
//! - [`SingleOwner`]: one address holds every capability.

use std::collections::BTreeSet;

use accrual_core::error::LedgerError;
use accrual_core::traits::Authorizer;
use accrual_core::types::{Address, Capability};

/// Admin plus mint/burn allowlist.
///
/// The admin is fixed at construction; only mint/burn membership changes at
/// runtime. The admin does not implicitly hold mint/burn.
#[derive(Clone, Debug)]
pub struct RoleTable {
    admin: Address,
    minters: BTreeSet<Address>,
}

impl RoleTable {
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            minters: BTreeSet::new(),
        }
    }

    /// Builder-style grant used when wiring a ledger from configuration.
    pub fn with_minter(mut self, who: Address) -> Self {
        self.minters.insert(who);
        self
    }

    pub fn admin(&self) -> Address {
        self.admin
    }
}

impl Authorizer for RoleTable {
    fn is_authorized(&self, caller: &Address, capability: Capability) -> bool {
        match capability {
            Capability::Admin => *caller == self.admin,
            Capability::MintBurn => self.minters.contains(caller),
        }
    }

    fn set_role(
        &mut self,
        who: Address,
        capability: Capability,
        enabled: bool,
    ) -> Result<bool, LedgerError> {
        match capability {
            Capability::Admin => Err(LedgerError::RoleManagementUnsupported),
            Capability::MintBurn if enabled => Ok(self.minters.insert(who)),
            Capability::MintBurn => Ok(self.minters.remove(&who)),
        }
    }

    fn holders(&self, capability: Capability) -> Vec<Address> {
        match capability {
            Capability::Admin => vec![self.admin],
            Capability::MintBurn => self.minters.iter().copied().collect(),
        }
    }
}

/// Every capability held by a single owner.
#[derive(Clone, Copy, Debug)]
pub struct SingleOwner(pub Address);

impl Authorizer for SingleOwner {
    fn is_authorized(&self, caller: &Address, _capability: Capability) -> bool {
        *caller == self.0
    }

    fn holders(&self, _capability: Capability) -> Vec<Address> {
        vec![self.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(seed: u8) -> Address {
        Address([seed; 20])
    }

    #[test]
    fn admin_is_not_implicitly_minter() {
        let table = RoleTable::new(addr(1));
        assert!(table.is_authorized(&addr(1), Capability::Admin));
        assert!(!table.is_authorized(&addr(1), Capability::MintBurn));
    }

    #[test]
    fn grant_and_revoke_mint_burn() {
        let mut table = RoleTable::new(addr(1));
        assert!(table.set_role(addr(2), Capability::MintBurn, true).unwrap());
        assert!(table.is_authorized(&addr(2), Capability::MintBurn));
        // second grant is a no-op
        assert!(!table.set_role(addr(2), Capability::MintBurn, true).unwrap());
        assert!(table.set_role(addr(2), Capability::MintBurn, false).unwrap());
        assert!(!table.is_authorized(&addr(2), Capability::MintBurn));
        assert!(!table.set_role(addr(2), Capability::MintBurn, false).unwrap());
    }

    #[test]
    fn admin_role_is_fixed() {
        let mut table = RoleTable::new(addr(1));
        assert_eq!(
            table.set_role(addr(2), Capability::Admin, true),
            Err(LedgerError::RoleManagementUnsupported)
        );
        assert_eq!(table.admin(), addr(1));
    }

    #[test]
    fn holders_are_sorted() {
        let table = RoleTable::new(addr(9))
            .with_minter(addr(3))
            .with_minter(addr(1))
            .with_minter(addr(2));
        assert_eq!(
            table.holders(Capability::MintBurn),
            vec![addr(1), addr(2), addr(3)]
        );
        assert_eq!(table.holders(Capability::Admin), vec![addr(9)]);
    }

    #[test]
    fn single_owner_holds_everything() {
        let owner = SingleOwner(addr(5));
        assert!(owner.is_authorized(&addr(5), Capability::Admin));
        assert!(owner.is_authorized(&addr(5), Capability::MintBurn));
        assert!(!owner.is_authorized(&addr(6), Capability::MintBurn));
    }

    #[test]
    fn single_owner_cannot_manage_roles() {
        let mut owner = SingleOwner(addr(5));
        assert_eq!(
            owner.set_role(addr(6), Capability::MintBurn, true),
            Err(LedgerError::RoleManagementUnsupported)
        );
    }
}
