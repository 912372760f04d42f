//! Custodial pool: exchanges underlying units 1:1 for ledger claims.
//!
//! The vault holds the mint/burn capability on a shared ledger. Each
//! deposit and redemption runs inside one ledger atomic section together
//! with its reserve movement, so a failed pull or payout leaves the ledger
//! exactly as it was.

use tracing::{info, warn};

use accrual_core::error::VaultError;
use accrual_core::traits::{Authorizer, Clock, PrincipalStore, Reserve};
use accrual_core::types::{Address, Amount};
use accrual_ledger::{MemoryPrincipalStore, RoleTable, SharedLedger, SystemClock};

pub struct Vault<R, S = MemoryPrincipalStore, A = RoleTable, C = SystemClock> {
    /// Identity used as the mint/burn caller.
    address: Address,
    ledger: SharedLedger<S, A, C>,
    reserve: R,
}

impl<R, S, A, C> Vault<R, S, A, C>
where
    R: Reserve,
    S: PrincipalStore,
    A: Authorizer,
    C: Clock,
{
    pub fn new(address: Address, ledger: SharedLedger<S, A, C>, reserve: R) -> Self {
        Self {
            address,
            ledger,
            reserve,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Handle to the ledger this vault mints into.
    pub fn ledger(&self) -> SharedLedger<S, A, C> {
        SharedLedger::clone(&self.ledger)
    }

    pub fn reserve(&self) -> &R {
        &self.reserve
    }

    pub fn reserve_mut(&mut self) -> &mut R {
        &mut self.reserve
    }

    /// Take `amount` underlying from `depositor` and mint the same amount of
    /// claims to them at the current global rate (if they hold none yet).
    ///
    /// # Errors
    ///
    /// - [`VaultError::ZeroDeposit`] if `amount` is zero
    /// - [`VaultError::Ledger`] if the vault may not mint, or on overflow
    /// - [`VaultError::Reserve`] if the depositor lacks the underlying
    pub fn deposit(&mut self, depositor: &Address, amount: u128) -> Result<(), VaultError> {
        if amount == 0 {
            return Err(VaultError::ZeroDeposit);
        }
        let vault = self.address;
        let reserve = &mut self.reserve;
        let mut ledger = self.ledger.lock();
        ledger.atomically(|l| -> Result<(), VaultError> {
            l.mint(&vault, depositor, amount)?;
            reserve.pull(depositor, amount)?;
            Ok(())
        })?;
        info!(%depositor, amount, "deposit");
        Ok(())
    }

    /// Burn `amount` claims from `holder` and pay out the same amount of
    /// underlying. `Amount::All` redeems the full effective balance.
    /// Returns the amount paid.
    ///
    /// # Errors
    ///
    /// - [`VaultError::Ledger`] if the burn is rejected
    /// - [`VaultError::TransferFailed`] if the payout fails; the burn is rolled back
    pub fn redeem(&mut self, holder: &Address, amount: Amount) -> Result<u128, VaultError> {
        let vault = self.address;
        let reserve = &mut self.reserve;
        let mut ledger = self.ledger.lock();
        let paid = ledger.atomically(|l| -> Result<u128, VaultError> {
            let burned = l.burn(&vault, holder, amount)?;
            reserve.pay(holder, burned).map_err(|e| {
                warn!(%holder, amount = burned, "payout failed, rolling back burn: {e}");
                VaultError::TransferFailed {
                    to: *holder,
                    amount: burned,
                    reason: e.to_string(),
                }
            })?;
            Ok(burned)
        })?;
        info!(%holder, amount = paid, "redeem");
        Ok(paid)
    }

    /// Add underlying to the reserve without minting claims. This is what
    /// backs accrued interest; sufficiency is not checked.
    pub fn fund_rewards(&mut self, from: &Address, amount: u128) -> Result<(), VaultError> {
        self.reserve.pull(from, amount)?;
        info!(%from, amount, reserve = self.reserve.balance(), "rewards funded");
        Ok(())
    }
}
