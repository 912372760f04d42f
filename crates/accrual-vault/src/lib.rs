//! # accrual-vault
//! Custodial pool for the accrual ledger: deposits mint claims 1:1,
//! redemptions burn claims and pay out the underlying.

pub mod reserve;
pub mod vault;

pub use reserve::MemoryReserve;
pub use vault::Vault;
