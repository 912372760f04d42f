//! Replays a JSON list of ledger operations against an in-memory vault.
//!
//! Example input:
//!
//! ```json
//! [
//!   {"op": "deposit", "account": "0x01…", "amount": 1000},
//!   {"op": "advance", "seconds": 7200},
//!   {"op": "set-rate", "rate": 40000000000},
//!   {"op": "transfer", "from": "0x01…", "to": "0x02…", "amount": "all"},
//!   {"op": "redeem", "account": "0x02…", "amount": {"exact": 500}}
//! ]
//! ```
//!
//! Deposits and reward funding credit the depositor's underlying wallet
//! first, so replays never need a separate faucet step. The credit is taken
//! back when the operation fails.
//!
//! Amounts are JSON integers or decimal strings; use a string for anything
//! above `u64::MAX`, e.g. `{"exact": "20000000000000000000"}`.

use std::collections::BTreeSet;
use std::fmt;

use anyhow::{Context, Result};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use tracing::{debug, warn};

use accrual_core::error::{AccrualError, LedgerError, VaultError};
use accrual_core::traits::{Clock, Reserve};
use accrual_core::types::{Address, Amount};
use accrual_ledger::{
    AccrualLedger, LedgerConfig, LedgerSnapshot, ManualClock, MemoryPrincipalStore, RoleTable,
    SharedLedger,
};
use accrual_vault::{MemoryReserve, Vault};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum ReplayOp {
    Deposit {
        account: Address,
        #[serde(deserialize_with = "de_units")]
        amount: u128,
    },
    Redeem {
        account: Address,
        #[serde(deserialize_with = "de_amount")]
        amount: Amount,
    },
    Transfer {
        /// Defaults to `from`; set it to spend an allowance.
        #[serde(default)]
        caller: Option<Address>,
        from: Address,
        to: Address,
        #[serde(deserialize_with = "de_amount")]
        amount: Amount,
    },
    Approve {
        owner: Address,
        spender: Address,
        #[serde(deserialize_with = "de_units")]
        amount: u128,
    },
    SetRate {
        rate: u64,
    },
    Advance {
        seconds: u64,
    },
    FundRewards {
        from: Address,
        #[serde(deserialize_with = "de_units")]
        amount: u128,
    },
}

struct UnitsVisitor;

impl Visitor<'_> for UnitsVisitor {
    type Value = u128;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer or a decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
        Ok(u128::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
        u128::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
        v.parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

fn de_units<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
    deserializer.deserialize_any(UnitsVisitor)
}

/// Wire form of [`Amount`] that also takes string units.
#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum AmountField {
    Exact(#[serde(deserialize_with = "de_units")] u128),
    All,
}

fn de_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
    Ok(match AmountField::deserialize(deserializer)? {
        AmountField::Exact(v) => Amount::Exact(v),
        AmountField::All => Amount::All,
    })
}

impl ReplayOp {
    pub fn parse_list(json: &str) -> Result<Vec<Self>> {
        serde_json::from_str(json).context("invalid replay file")
    }
}

/// One account's state at the end of a replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRow {
    pub account: Address,
    pub principal: u128,
    pub rate: u64,
    pub effective: u128,
}

type ReplayVault = Vault<MemoryReserve, MemoryPrincipalStore, RoleTable, ManualClock>;

pub struct Replay {
    vault: ReplayVault,
    clock: ManualClock,
    admin: Address,
    touched: BTreeSet<Address>,
}

impl Replay {
    /// Fresh ledger from `config` with `vault_address` granted mint/burn.
    pub fn new(config: &LedgerConfig, vault_address: Address) -> Self {
        let clock = ManualClock::new(0);
        let ledger = AccrualLedger::in_memory(
            config.role_table().with_minter(vault_address),
            clock.clone(),
            config.initial_global_rate,
        )
        .into_shared();
        Self {
            vault: Vault::new(vault_address, ledger, MemoryReserve::new()),
            clock,
            admin: config.admin,
            touched: BTreeSet::new(),
        }
    }

    pub fn ledger(&self) -> SharedLedger<MemoryPrincipalStore, RoleTable, ManualClock> {
        self.vault.ledger()
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    pub fn reserve_balance(&self) -> u128 {
        self.vault.reserve().balance()
    }

    /// Underlying `who` holds outside the pool.
    pub fn wallet_of(&self, who: &Address) -> u128 {
        self.vault.reserve().wallet_of(who)
    }

    /// Credit `who` with `amount` underlying and run `f`, which is expected
    /// to spend it. The credit is taken back if `f` fails.
    fn with_credit(
        &mut self,
        who: &Address,
        amount: u128,
        f: impl FnOnce(&mut ReplayVault) -> Result<(), VaultError>,
    ) -> Result<(), AccrualError> {
        self.vault
            .reserve_mut()
            .credit(who, amount)
            .map_err(VaultError::from)?;
        if let Err(e) = f(&mut self.vault) {
            // failed vault calls leave the wallet as it was
            self.vault
                .reserve_mut()
                .debit(who, amount)
                .map_err(VaultError::from)?;
            return Err(e.into());
        }
        Ok(())
    }

    pub fn apply(&mut self, op: &ReplayOp) -> Result<(), AccrualError> {
        debug!(?op, "replay");
        match op {
            ReplayOp::Deposit { account, amount } => {
                self.with_credit(account, *amount, |vault| vault.deposit(account, *amount))?;
                self.touched.insert(*account);
            }
            ReplayOp::Redeem { account, amount } => {
                self.vault.redeem(account, *amount)?;
                self.touched.insert(*account);
            }
            ReplayOp::Transfer {
                caller,
                from,
                to,
                amount,
            } => {
                let caller = caller.unwrap_or(*from);
                self.vault
                    .ledger()
                    .lock()
                    .transfer(&caller, from, to, *amount)?;
                self.touched.extend([*from, *to]);
            }
            ReplayOp::Approve {
                owner,
                spender,
                amount,
            } => {
                self.vault.ledger().lock().approve(owner, spender, *amount);
            }
            ReplayOp::SetRate { rate } => {
                self.vault
                    .ledger()
                    .lock()
                    .set_global_rate(&self.admin, *rate)?;
            }
            ReplayOp::Advance { seconds } => {
                self.clock.advance(*seconds);
            }
            ReplayOp::FundRewards { from, amount } => {
                self.with_credit(from, *amount, |vault| vault.fund_rewards(from, *amount))?;
            }
        }
        Ok(())
    }

    /// Apply every op in order. With `keep_going`, failed ops are logged and
    /// skipped; otherwise the first failure aborts the replay.
    /// Returns the number of ops that failed.
    pub fn run(&mut self, ops: &[ReplayOp], keep_going: bool) -> Result<usize> {
        let mut failed = 0;
        for (i, op) in ops.iter().enumerate() {
            match self.apply(op) {
                Ok(()) => {}
                Err(e) if keep_going => {
                    warn!(index = i, ?op, "op failed: {e}");
                    failed += 1;
                }
                Err(e) => return Err(e).with_context(|| format!("op #{i} ({op:?}) failed")),
            }
        }
        Ok(failed)
    }

    /// Balances of every account the replay touched, in address order.
    pub fn balances(&self) -> Result<Vec<BalanceRow>, LedgerError> {
        let ledger = self.vault.ledger();
        let ledger = ledger.lock();
        self.touched
            .iter()
            .map(|who| {
                let state = ledger.account(who);
                Ok(BalanceRow {
                    account: *who,
                    principal: state.principal,
                    rate: state.rate,
                    effective: ledger.effective_balance_of(who)?,
                })
            })
            .collect()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.vault.ledger().lock().snapshot()
    }
}
