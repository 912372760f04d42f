//! Ledger configuration.
//!
//! [`LedgerConfig`] has defaults for every field, can be read from a JSON
//! file, and is overlaid with `ACCRUAL_*` environment variables:
//!
//! | Variable | Field |
//! |---|---|
//! | `ACCRUAL_INITIAL_RATE` | `initial_global_rate` |
//! | `ACCRUAL_ADMIN` | `admin` |
//! | `ACCRUAL_MINTERS` | `minters` (comma separated) |
//! | `ACCRUAL_LOG` | `log_level` |
//! | `ACCRUAL_LOG_FORMAT` | `log_format` |

use std::path::Path;

use serde::{Deserialize, Serialize};

use accrual_core::constants::INITIAL_GLOBAL_RATE;
use accrual_core::error::ConfigError;
use accrual_core::traits::Clock;
use accrual_core::types::Address;

use crate::auth::RoleTable;
use crate::ledger::AccrualLedger;
use crate::store::MemoryPrincipalStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Global rate at ledger creation, scaled by `SCALE`.
    pub initial_global_rate: u64,
    /// Holder of the admin capability.
    pub admin: Address,
    /// Initial holders of the mint/burn capability.
    pub minters: Vec<Address>,
    /// Log filter string (e.g. "info", "accrual_ledger=debug").
    pub log_level: String,
    /// "text" or "json".
    pub log_format: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_global_rate: INITIAL_GLOBAL_RATE,
            admin: Address::ZERO,
            minters: Vec::new(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Read a JSON file, then overlay the process environment.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        let cfg: Self = serde_json::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.with_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values returned by `lookup` for the `ACCRUAL_*` keys.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(rate) = lookup("ACCRUAL_INITIAL_RATE") {
            self.initial_global_rate = rate
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidRate(rate.clone()))?;
        }
        if let Some(admin) = lookup("ACCRUAL_ADMIN") {
            self.admin = admin.parse::<Address>().map_err(|source| ConfigError::InvalidAddress {
                field: "ACCRUAL_ADMIN",
                source,
            })?;
        }
        if let Some(minters) = lookup("ACCRUAL_MINTERS") {
            self.minters = minters
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<Address>().map_err(|source| ConfigError::InvalidAddress {
                        field: "ACCRUAL_MINTERS",
                        source,
                    })
                })
                .collect::<Result<_, _>>()?;
        }
        if let Some(level) = lookup("ACCRUAL_LOG") {
            self.log_level = level;
        }
        if let Some(format) = lookup("ACCRUAL_LOG_FORMAT") {
            self.log_format = format;
        }
        Ok(self)
    }

    pub fn role_table(&self) -> RoleTable {
        self.minters
            .iter()
            .fold(RoleTable::new(self.admin), |table, m| table.with_minter(*m))
    }

    /// In-memory ledger wired from this configuration.
    pub fn build_ledger<C: Clock>(&self, clock: C) -> AccrualLedger<MemoryPrincipalStore, RoleTable, C> {
        AccrualLedger::in_memory(self.role_table(), clock, self.initial_global_rate)
    }
}
