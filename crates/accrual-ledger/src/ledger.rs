//! The accrual ledger.
//!
//! Wraps a [`PrincipalStore`] and adds settlement to every mutating call.
//! Each operation first computes *settled views* of the accounts it touches
//! (principal brought up to date, clock advanced), validates against those
//! views, and only then commits them. A rejected operation therefore leaves
//! principal, rates, timestamps, allowances and the event log untouched.
//!
//! Rate pinning:
//! - `mint` into an account whose settled balance is zero pins it to the
//!   current global rate.
//! - `transfer` into an account whose settled balance is zero pins it to the
//!   *sender's* rate, whatever the global rate is now. A holder controlling
//!   two addresses can keep an early, higher rate alive indefinitely by
//!   routing top-ups through an empty second address. This is kept as is;
//!   an already funded recipient is never re-pinned.
//!
//! [`atomically`](AccrualLedger::atomically) groups several operations into
//! one unit. While a section is open every write first journals the prior
//! value of the record it replaces, so a rollback touches only those records.
//!
//! Not thread-safe on its own; share it as a [`SharedLedger`] to get the
//! single-writer total order.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use accrual_core::constants::UNLIMITED_ALLOWANCE;
use accrual_core::error::LedgerError;
use accrual_core::events::LedgerEvent;
use accrual_core::traits::{Authorizer, Clock, PrincipalStore};
use accrual_core::types::{AccountState, Address, Amount, Capability, Timestamp};

use crate::auth::RoleTable;
use crate::clock::SystemClock;
use crate::interest;
use crate::rate::{GlobalRate, RateChange};
use crate::store::MemoryPrincipalStore;

/// A ledger behind a mutex; lock order is the total order of operations.
pub type SharedLedger<S = MemoryPrincipalStore, A = RoleTable, C = SystemClock> =
    Arc<Mutex<AccrualLedger<S, A, C>>>;

/// An account record with pending interest folded in, not yet committed.
#[derive(Clone, Copy, Debug)]
struct Settled {
    who: Address,
    state: AccountState,
    interest: u128,
    at: Timestamp,
}

/// Prior value of a record overwritten inside an atomic section.
#[derive(Clone, Copy, Debug)]
enum Undo {
    Account(Address, AccountState),
    Allowance((Address, Address), Option<u128>),
    /// Mint/burn membership to restore.
    Role(Address, bool),
    GlobalRate(GlobalRate),
}

pub struct AccrualLedger<S = MemoryPrincipalStore, A = RoleTable, C = SystemClock> {
    pub(crate) store: S,
    pub(crate) auth: A,
    pub(crate) clock: C,
    pub(crate) global_rate: GlobalRate,
    /// `(owner, spender) -> remaining allowance`.
    pub(crate) allowances: HashMap<(Address, Address), u128>,
    pub(crate) events: Vec<LedgerEvent>,
    /// Undo log of the innermost open atomic section.
    journal: Option<Vec<Undo>>,
}

impl<A: Authorizer, C: Clock> AccrualLedger<MemoryPrincipalStore, A, C> {
    /// Ledger over a fresh in-memory store.
    pub fn in_memory(auth: A, clock: C, initial_rate: u64) -> Self {
        Self::new(MemoryPrincipalStore::new(), auth, clock, initial_rate)
    }
}

impl<S: PrincipalStore, A: Authorizer, C: Clock> AccrualLedger<S, A, C> {
    pub fn new(store: S, auth: A, clock: C, initial_rate: u64) -> Self {
        Self {
            store,
            auth,
            clock,
            global_rate: GlobalRate::new(initial_rate),
            allowances: HashMap::new(),
            events: Vec::new(),
            journal: None,
        }
    }

    /// Wrap in a [`SharedLedger`].
    pub fn into_shared(self) -> SharedLedger<S, A, C> {
        Arc::new(Mutex::new(self))
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Current time according to the ledger's clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// User-facing balance: principal plus interest accrued since the last
    /// settlement. Never mutates state.
    pub fn effective_balance_of(&self, who: &Address) -> Result<u128, LedgerError> {
        interest::effective_balance(&self.store.account(who), self.clock.now())
    }

    /// Materialized principal, excluding unsettled interest.
    pub fn principal_of(&self, who: &Address) -> u128 {
        self.store.principal_of(who)
    }

    /// Interest accrued since the last settlement and not yet in principal.
    pub fn pending_interest_of(&self, who: &Address) -> Result<u128, LedgerError> {
        interest::pending_interest(&self.store.account(who), self.clock.now())
    }

    /// Rate pinned for `who`. Drained accounts keep their last rate.
    pub fn rate_of(&self, who: &Address) -> u64 {
        self.store.account(who).rate
    }

    pub fn last_synced_at(&self, who: &Address) -> Timestamp {
        self.store.account(who).last_synced_at
    }

    pub fn account(&self, who: &Address) -> AccountState {
        self.store.account(who)
    }

    pub fn global_rate(&self) -> u64 {
        self.global_rate.value()
    }

    pub fn rate_version(&self) -> u64 {
        self.global_rate.version()
    }

    /// Sum of materialized principal. Interest not yet settled into any
    /// account is not counted.
    pub fn total_supply(&self) -> u128 {
        self.store.total_principal()
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn authorizer(&self) -> &A {
        &self.auth
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Events committed since the last [`take_events`](Self::take_events).
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Drain the event log.
    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Settlement
    // ------------------------------------------------------------------

    fn settled_view(&self, who: &Address, now: Timestamp) -> Result<Settled, LedgerError> {
        let current = self.store.account(who);
        let effective = interest::effective_balance(&current, now)?;
        Ok(Settled {
            who: *who,
            state: AccountState {
                principal: effective,
                rate: current.rate,
                last_synced_at: current.last_synced_at.max(now),
            },
            interest: effective - current.principal,
            at: now,
        })
    }

    fn commit(&mut self, settled: Settled) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(Undo::Account(settled.who, self.store.account(&settled.who)));
        }
        if settled.interest > 0 {
            debug!(
                account = %settled.who,
                amount = settled.interest,
                "settled accrued interest"
            );
            self.events.push(LedgerEvent::InterestSettled {
                account: settled.who,
                amount: settled.interest,
                at: settled.at,
            });
        }
        self.store.put_account(settled.who, settled.state);
    }

    /// Fold accrued interest for `who` into principal and reset its accrual
    /// clock. Returns the amount materialized; zero when called twice at the
    /// same timestamp.
    pub fn settle(&mut self, who: &Address) -> Result<u128, LedgerError> {
        let settled = self.settled_view(who, self.clock.now())?;
        let materialized = settled.interest;
        self.commit(settled);
        Ok(materialized)
    }

    // ------------------------------------------------------------------
    // Guarded supply operations
    // ------------------------------------------------------------------

    fn require(&self, caller: &Address, capability: Capability) -> Result<(), LedgerError> {
        if self.auth.is_authorized(caller, capability) {
            return Ok(());
        }
        warn!(%caller, %capability, "rejected unauthorized call");
        Err(LedgerError::Unauthorized {
            caller: *caller,
            capability,
        })
    }

    /// Issue `amount` new claim tokens to `to`.
    ///
    /// An account with zero settled balance is pinned to the current global
    /// rate first.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] if `caller` lacks mint/burn
    /// - [`LedgerError::ArithmeticOverflow`] if the balance would exceed `u128`
    pub fn mint(&mut self, caller: &Address, to: &Address, amount: u128) -> Result<(), LedgerError> {
        self.require(caller, Capability::MintBurn)?;
        let now = self.clock.now();
        let mut dst = self.settled_view(to, now)?;
        if !dst.state.is_funded() {
            dst.state.rate = self.global_rate.value();
            debug!(account = %to, rate = dst.state.rate, "pinned global rate on mint");
        }
        dst.state.principal = dst
            .state
            .principal
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        self.commit(dst);
        self.events.push(LedgerEvent::Transfer {
            from: None,
            to: Some(*to),
            amount,
        });
        Ok(())
    }

    /// Destroy claim tokens held by `from`. Returns the amount burned.
    ///
    /// `Amount::All` burns the full balance after settlement.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] if `caller` lacks mint/burn
    /// - [`LedgerError::InsufficientBalance`] if `amount` exceeds the settled balance
    pub fn burn(
        &mut self,
        caller: &Address,
        from: &Address,
        amount: Amount,
    ) -> Result<u128, LedgerError> {
        self.require(caller, Capability::MintBurn)?;
        let now = self.clock.now();
        let mut src = self.settled_view(from, now)?;
        let have = src.state.principal;
        let amount = amount.resolve(have);
        if amount > have {
            return Err(LedgerError::InsufficientBalance { have, need: amount });
        }
        src.state.principal = have - amount;
        self.commit(src);
        self.events.push(LedgerEvent::Transfer {
            from: Some(*from),
            to: None,
            amount,
        });
        Ok(amount)
    }

    // ------------------------------------------------------------------
    // Holder operations
    // ------------------------------------------------------------------

    /// Set the allowance `spender` may move out of `owner`.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) {
        let prior = self.allowances.insert((*owner, *spender), amount);
        self.journal_push(Undo::Allowance((*owner, *spender), prior));
        self.events.push(LedgerEvent::Approval {
            owner: *owner,
            spender: *spender,
            amount,
        });
    }

    /// Move claim tokens from `from` to `to`. Returns the amount moved.
    ///
    /// `caller == from` is a direct transfer; anything else spends allowance
    /// granted by `from` to `caller`. Both accounts are settled as one unit.
    /// If `to` has zero settled balance it inherits `from`'s rate.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InsufficientBalance`] if `amount` exceeds `from`'s settled balance
    /// - [`LedgerError::InsufficientAllowance`] for a delegated transfer beyond the allowance
    /// - [`LedgerError::ArithmeticOverflow`] if `to`'s balance would exceed `u128`
    pub fn transfer(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<u128, LedgerError> {
        let now = self.clock.now();
        let mut src = self.settled_view(from, now)?;
        let have = src.state.principal;
        let amount = amount.resolve(have);
        if amount > have {
            return Err(LedgerError::InsufficientBalance { have, need: amount });
        }
        let delegated = caller != from;
        if delegated {
            let allowed = self.allowance(from, caller);
            if allowed < amount {
                return Err(LedgerError::InsufficientAllowance {
                    have: allowed,
                    need: amount,
                });
            }
        }

        if from == to {
            // Net-zero move; the account is funded unless amount is zero,
            // and inheriting its own rate changes nothing.
            self.commit(src);
        } else {
            let mut dst = self.settled_view(to, now)?;
            if !dst.state.is_funded() {
                if dst.state.rate != src.state.rate {
                    debug!(
                        account = %to,
                        from = %from,
                        old_rate = dst.state.rate,
                        new_rate = src.state.rate,
                        "recipient inherited sender rate"
                    );
                }
                dst.state.rate = src.state.rate;
            }
            dst.state.principal = dst
                .state
                .principal
                .checked_add(amount)
                .ok_or(LedgerError::ArithmeticOverflow)?;
            src.state.principal = have - amount;
            self.commit(src);
            self.commit(dst);
        }

        if delegated {
            self.spend_allowance(from, caller, amount);
        }
        self.events.push(LedgerEvent::Transfer {
            from: Some(*from),
            to: Some(*to),
            amount,
        });
        Ok(amount)
    }

    fn spend_allowance(&mut self, owner: &Address, spender: &Address, amount: u128) {
        let key = (*owner, *spender);
        let Some(remaining) = self.allowances.get_mut(&key) else {
            return;
        };
        if *remaining == UNLIMITED_ALLOWANCE {
            return;
        }
        let prior = *remaining;
        *remaining -= amount;
        self.journal_push(Undo::Allowance(key, Some(prior)));
    }

    fn journal_push(&mut self, undo: Undo) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(undo);
        }
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    /// Lower the rate offered to new entrants.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] if `caller` lacks admin
    /// - [`LedgerError::RateIncreaseRejected`] if `new_rate` exceeds the current rate
    pub fn set_global_rate(
        &mut self,
        caller: &Address,
        new_rate: u64,
    ) -> Result<RateChange, LedgerError> {
        self.require(caller, Capability::Admin)?;
        let prior = self.global_rate;
        let change = self.global_rate.lower_to(new_rate).inspect_err(|e| {
            warn!(%caller, "global rate update rejected: {e}");
        })?;
        self.journal_push(Undo::GlobalRate(prior));
        info!(
            old = change.old,
            new = change.new,
            version = change.version,
            "global rate updated"
        );
        self.events.push(LedgerEvent::GlobalRateUpdated {
            old: change.old,
            new: change.new,
            version: change.version,
        });
        Ok(change)
    }

    /// Grant mint/burn to `who`. Returns `false` if it was already held.
    pub fn grant_mint_burn(&mut self, caller: &Address, who: &Address) -> Result<bool, LedgerError> {
        self.change_role(caller, who, true)
    }

    /// Revoke mint/burn from `who`. Returns `false` if it was not held.
    pub fn revoke_mint_burn(&mut self, caller: &Address, who: &Address) -> Result<bool, LedgerError> {
        self.change_role(caller, who, false)
    }

    fn change_role(
        &mut self,
        caller: &Address,
        who: &Address,
        enabled: bool,
    ) -> Result<bool, LedgerError> {
        self.require(caller, Capability::Admin)?;
        let changed = self.auth.set_role(*who, Capability::MintBurn, enabled)?;
        if changed {
            self.journal_push(Undo::Role(*who, !enabled));
            info!(account = %who, enabled, "mint/burn role changed");
            let capability = Capability::MintBurn;
            self.events.push(if enabled {
                LedgerEvent::RoleGranted {
                    account: *who,
                    capability,
                }
            } else {
                LedgerEvent::RoleRevoked {
                    account: *who,
                    capability,
                }
            });
        }
        Ok(changed)
    }

    // ------------------------------------------------------------------
    // Atomic sections
    // ------------------------------------------------------------------

    /// Run `f` as one all-or-nothing unit.
    ///
    /// If `f` returns `Err`, every ledger change it made (accounts,
    /// allowances, roles, global rate, events) is rolled back. Only records
    /// written inside the section are restored; an account first created
    /// inside it is left as an empty record. Sections nest: an inner rollback
    /// leaves the outer section's earlier writes in place. Side effects
    /// outside the ledger are the closure's responsibility.
    pub fn atomically<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E> {
        let outer = self.journal.replace(Vec::new());
        let event_count = self.events.len();

        let result = f(self);
        let journal = std::mem::replace(&mut self.journal, outer).unwrap_or_default();
        if result.is_err() {
            debug!(records = journal.len(), "rolling back atomic section");
            self.undo(journal);
            self.events.truncate(event_count);
        } else if let Some(outer) = self.journal.as_mut() {
            outer.extend(journal);
        }
        result
    }

    fn undo(&mut self, journal: Vec<Undo>) {
        for record in journal.into_iter().rev() {
            match record {
                Undo::Account(who, state) => self.store.put_account(who, state),
                Undo::Allowance(key, Some(amount)) => {
                    self.allowances.insert(key, amount);
                }
                Undo::Allowance(key, None) => {
                    self.allowances.remove(&key);
                }
                Undo::Role(who, enabled) => {
                    if let Err(e) = self.auth.set_role(who, Capability::MintBurn, enabled) {
                        warn!(account = %who, "could not restore mint/burn role: {e}");
                    }
                }
                Undo::GlobalRate(rate) => self.global_rate = rate,
            }
        }
    }
}
