//! Integration test suite for the accrual ledger.
//!
//! The tests in `tests/` drive the ledger and vault together through their
//! public APIs and check the accounting invariants under adversarial
//! sequences, including the zero-balance rate re-pin.

pub mod helpers;
