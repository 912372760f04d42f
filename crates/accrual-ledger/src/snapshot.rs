//! Persisted ledger layout.
//!
//! A [`LedgerSnapshot`] captures everything the ledger owns: per-account
//! records, allowances, the global rate cell and the capability holders.
//! Encoding uses `bincode` with the standard configuration. Vectors are
//! sorted so equal ledgers encode to equal bytes.

use serde::{Deserialize, Serialize};

use accrual_core::error::SnapshotError;
use accrual_core::traits::{Authorizer, Clock, PrincipalStore};
use accrual_core::types::{AccountState, Address, Capability};

use crate::auth::RoleTable;
use crate::ledger::AccrualLedger;
use crate::rate::GlobalRate;

#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct LedgerSnapshot {
    pub global_rate: u64,
    pub rate_version: u64,
    pub accounts: Vec<(Address, AccountState)>,
    /// `(owner, spender, amount)`.
    pub allowances: Vec<(Address, Address, u128)>,
    pub admins: Vec<Address>,
    pub minters: Vec<Address>,
}

impl LedgerSnapshot {
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let (snapshot, read): (Self, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| SnapshotError::Decode(e.to_string()))?;
        if read != bytes.len() {
            return Err(SnapshotError::TrailingBytes(bytes.len() - read));
        }
        Ok(snapshot)
    }

    /// Role table recorded in the snapshot. Uses the first recorded admin.
    pub fn role_table(&self) -> Option<RoleTable> {
        let admin = *self.admins.first()?;
        Some(
            self.minters
                .iter()
                .fold(RoleTable::new(admin), |table, m| table.with_minter(*m)),
        )
    }
}

impl<S: PrincipalStore, A: Authorizer, C: Clock> AccrualLedger<S, A, C> {
    /// Capture the ledger's persisted state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let mut accounts = self.store.accounts();
        accounts.sort_by_key(|(a, _)| *a);
        let mut allowances: Vec<(Address, Address, u128)> = self
            .allowances
            .iter()
            .map(|((owner, spender), amount)| (*owner, *spender, *amount))
            .collect();
        allowances.sort();
        LedgerSnapshot {
            global_rate: self.global_rate.value(),
            rate_version: self.global_rate.version(),
            accounts,
            allowances,
            admins: self.auth.holders(Capability::Admin),
            minters: self.auth.holders(Capability::MintBurn),
        }
    }

    /// Rebuild a ledger from `snapshot` into `store`.
    ///
    /// Capabilities come from `auth`, not from the snapshot; use
    /// [`LedgerSnapshot::role_table`] to recover the recorded roles. The
    /// event log starts empty.
    pub fn from_snapshot(snapshot: &LedgerSnapshot, mut store: S, auth: A, clock: C) -> Self {
        for (who, state) in &snapshot.accounts {
            store.put_account(*who, *state);
        }
        let mut ledger = Self::new(store, auth, clock, snapshot.global_rate);
        ledger.global_rate = GlobalRate::at_version(snapshot.global_rate, snapshot.rate_version);
        ledger.allowances = snapshot
            .allowances
            .iter()
            .map(|(owner, spender, amount)| ((*owner, *spender), *amount))
            .collect();
        ledger
    }
}
