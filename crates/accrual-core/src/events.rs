//! Ledger events, appended in commit order and drained by observers.

use serde::{Deserialize, Serialize};

use crate::types::{Address, Capability, Timestamp};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// Principal moved. `from: None` is a mint, `to: None` is a burn.
    Transfer {
        from: Option<Address>,
        to: Option<Address>,
        amount: u128,
    },
    Approval {
        owner: Address,
        spender: Address,
        amount: u128,
    },
    /// Accrued interest folded into principal.
    InterestSettled {
        account: Address,
        amount: u128,
        at: Timestamp,
    },
    GlobalRateUpdated {
        old: u64,
        new: u64,
        version: u64,
    },
    RoleGranted {
        account: Address,
        capability: Capability,
    },
    RoleRevoked {
        account: Address,
        capability: Capability,
    },
}
