//! # accrual-core
//! Foundation types and traits for the accrual ledger.

pub mod constants;
pub mod error;
pub mod events;
pub mod traits;
pub mod types;
