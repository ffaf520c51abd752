//! Chain parameters for a dasledger instance.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, LedgerError, Result, constants};

/// Ledger-wide parameters, fixed at genesis and loaded from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainParameters {
    /// Seconds between maintenance boundaries, where expired orders are
    /// swept.
    pub maintenance_interval_secs: u64,
    /// Length of a vault-to-wallet balance-limit window.
    pub limit_window_secs: u64,
    /// Account allowed to complete or reject any wire-out request, in
    /// addition to the requesting account itself.
    pub wire_out_handler: Option<AccountId>,
    /// Head time of the ledger at genesis.
    pub genesis_time: DateTime<Utc>,
}

impl Default for ChainParameters {
    fn default() -> Self {
        Self {
            maintenance_interval_secs: constants::DEFAULT_MAINTENANCE_INTERVAL_SECS,
            limit_window_secs: constants::DEFAULT_LIMIT_WINDOW_SECS,
            wire_out_handler: None,
            genesis_time: DateTime::<Utc>::default(),
        }
    }
}

impl ChainParameters {
    /// Parse and validate parameters from a JSON document. Missing fields
    /// take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.maintenance_interval_secs == 0 {
            return Err(LedgerError::Configuration(
                "maintenance_interval_secs must be positive".into(),
            ));
        }
        if self.limit_window_secs == 0 {
            return Err(LedgerError::Configuration(
                "limit_window_secs must be positive".into(),
            ));
        }
        if self.maintenance_interval_secs.max(self.limit_window_secs) > constants::MAX_INTERVAL_SECS {
            return Err(LedgerError::Configuration(format!(
                "intervals are capped at {} seconds",
                constants::MAX_INTERVAL_SECS
            )));
        }
        Ok(())
    }

    fn seconds(secs: u64) -> Duration {
        Duration::seconds(i64::try_from(secs.min(constants::MAX_INTERVAL_SECS)).unwrap_or_default())
    }

    #[must_use]
    pub fn maintenance_interval(&self) -> Duration {
        Self::seconds(self.maintenance_interval_secs)
    }

    #[must_use]
    pub fn limit_window(&self) -> Duration {
        Self::seconds(self.limit_window_secs)
    }
}
