//! In-memory custody of the underlying asset.
//!
//! [`MemoryReserve`] tracks each address's wallet of underlying units and the
//! pool's own holdings. Payouts can be switched to fail so callers can
//! exercise their rollback path.

use std::collections::HashMap;

use accrual_core::error::ReserveError;
use accrual_core::traits::Reserve;
use accrual_core::types::Address;

#[derive(Clone, Debug, Default)]
pub struct MemoryReserve {
    /// Underlying held outside the pool, by owner.
    wallets: HashMap<Address, u128>,
    /// Underlying held by the pool.
    pool: u128,
    /// When set, every payout is rejected with this reason.
    payout_failure: Option<String>,
}

impl MemoryReserve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `who` underlying units outside the pool (test faucet).
    pub fn credit(&mut self, who: &Address, amount: u128) -> Result<(), ReserveError> {
        let wallet = self.wallets.entry(*who).or_insert(0);
        *wallet = wallet.checked_add(amount).ok_or(ReserveError::Overflow)?;
        Ok(())
    }

    /// Take back underlying previously given with [`credit`](Self::credit).
    pub fn debit(&mut self, who: &Address, amount: u128) -> Result<(), ReserveError> {
        let have = self.wallet_of(who);
        if have < amount {
            return Err(ReserveError::InsufficientFunds { have, need: amount });
        }
        self.wallets.insert(*who, have - amount);
        Ok(())
    }

    /// Underlying `who` holds outside the pool.
    pub fn wallet_of(&self, who: &Address) -> u128 {
        self.wallets.get(who).copied().unwrap_or(0)
    }

    /// Make subsequent payouts fail with `reason`, or succeed again with `None`.
    pub fn set_payout_failure(&mut self, reason: Option<&str>) {
        self.payout_failure = reason.map(str::to_string);
    }
}

impl Reserve for MemoryReserve {
    fn pull(&mut self, from: &Address, amount: u128) -> Result<(), ReserveError> {
        let have = self.wallet_of(from);
        if have < amount {
            return Err(ReserveError::InsufficientFunds { have, need: amount });
        }
        let pool = self.pool.checked_add(amount).ok_or(ReserveError::Overflow)?;
        self.wallets.insert(*from, have - amount);
        self.pool = pool;
        Ok(())
    }

    fn pay(&mut self, to: &Address, amount: u128) -> Result<(), ReserveError> {
        if let Some(reason) = &self.payout_failure {
            return Err(ReserveError::PayoutRejected(reason.clone()));
        }
        if self.pool < amount {
            return Err(ReserveError::InsufficientFunds {
                have: self.pool,
                need: amount,
            });
        }
        let wallet = self.wallet_of(to);
        let credited = wallet.checked_add(amount).ok_or(ReserveError::Overflow)?;
        self.pool -= amount;
        self.wallets.insert(*to, credited);
        Ok(())
    }

    fn balance(&self) -> u128 {
        self.pool
    }
}
