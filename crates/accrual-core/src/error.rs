//! Error types for the accrual ledger.
use thiserror::Error;

use crate::types::{Address, Capability};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("unauthorized: {caller} lacks {capability} capability")] Unauthorized { caller: Address, capability: Capability },
    #[error("rate increase rejected: current {current}, requested {requested}")] RateIncreaseRejected { current: u64, requested: u64 },
    #[error("insufficient balance: have {have}, need {need}")] InsufficientBalance { have: u128, need: u128 },
    #[error("insufficient allowance: have {have}, need {need}")] InsufficientAllowance { have: u128, need: u128 },
    #[error("arithmetic overflow")] ArithmeticOverflow,
    #[error("authorizer does not support role changes")] RoleManagementUnsupported,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReserveError {
    #[error("insufficient underlying: have {have}, need {need}")] InsufficientFunds { have: u128, need: u128 },
    #[error("payout rejected: {0}")] PayoutRejected(String),
    #[error("reserve overflow")] Overflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error(transparent)] Reserve(#[from] ReserveError),
    #[error("deposit amount must be nonzero")] ZeroDeposit,
    #[error("payout of {amount} to {to} failed: {reason}")] TransferFailed { to: Address, amount: u128, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid hex: {0}")] InvalidHex(String),
    #[error("invalid length: {0}")] InvalidLength(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("encode: {0}")] Encode(String),
    #[error("decode: {0}")] Decode(String),
    #[error("trailing bytes after snapshot: {0}")] TrailingBytes(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid rate: {0}")] InvalidRate(String),
    #[error("invalid address in {field}: {source}")] InvalidAddress { field: &'static str, source: AddressError },
    #[error("I/O: {0}")] Io(String),
    #[error("parse: {0}")] Parse(String),
}

#[derive(Error, Debug)]
pub enum AccrualError {
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error(transparent)] Vault(#[from] VaultError),
    #[error(transparent)] Address(#[from] AddressError),
    #[error(transparent)] Snapshot(#[from] SnapshotError),
    #[error(transparent)] Config(#[from] ConfigError),
}
