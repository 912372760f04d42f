//! # accrual-ledger: Interest-accruing claim ledger.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! This crate implements the accrual mechanism:
//! - **Linear accrual**: an account's effective balance is
//!   `principal * (SCALE + rate * elapsed) / SCALE`, computed on read.
//! - **Lazy settlement**: interest is folded into principal only when the
//!   account is touched by a mutating operation.
//! - **Rate pinning**: accounts are pinned to the global rate on their first
//!   mint, or to the sender's rate when first funded by a transfer.
//! - **Monotonic global rate**: the administrator may only lower it.

pub mod auth;
pub mod clock;
pub mod config;
pub mod interest;
pub mod ledger;
pub mod rate;
pub mod snapshot;
pub mod store;

pub use auth::{RoleTable, SingleOwner};
pub use clock::{ManualClock, SystemClock};
pub use config::LedgerConfig;
pub use ledger::{AccrualLedger, SharedLedger};
pub use rate::{GlobalRate, RateChange};
pub use snapshot::LedgerSnapshot;
pub use store::MemoryPrincipalStore;
