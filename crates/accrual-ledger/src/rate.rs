//! The protocol-wide rate offered to new entrants.
//!
//! A single versioned cell with one mutation path, [`GlobalRate::lower_to`].
//! The value is non-increasing for the lifetime of the ledger; setting the
//! current value again is accepted and still bumps the version.

use accrual_core::error::LedgerError;

/// Record of an accepted rate update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateChange {
    pub old: u64,
    pub new: u64,
    /// Version after the update.
    pub version: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlobalRate {
    value: u64,
    version: u64,
}

impl GlobalRate {
    pub fn new(initial: u64) -> Self {
        Self {
            value: initial,
            version: 0,
        }
    }

    /// Rebuild a cell at a known version (used when restoring snapshots).
    pub fn at_version(value: u64, version: u64) -> Self {
        Self { value, version }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    /// Number of accepted updates since creation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Lower the rate to `requested`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::RateIncreaseRejected`] if `requested` exceeds the current value.
    ///   The cell is left untouched.
    pub fn lower_to(&mut self, requested: u64) -> Result<RateChange, LedgerError> {
        if requested > self.value {
            return Err(LedgerError::RateIncreaseRejected {
                current: self.value,
                requested,
            });
        }
        let old = self.value;
        self.value = requested;
        self.version += 1;
        Ok(RateChange {
            old,
            new: requested,
            version: self.version,
        })
    }
}
