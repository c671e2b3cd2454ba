//! Ledger configuration
//!
//! Initialization parameters the deployment tooling passes when it stands up
//! a ledger: credit metadata, the ledger-level reserve asset, builders to
//! register up front, and how redeemed credits are accounted for.

use ledger_types::ids::Address;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// What happens to a participant's credits when they exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionMode {
    /// Credits move into the ledger's own custody; the series supply stays
    /// put until an administrative burn. Later redeemers are quoted against
    /// the full minted supply.
    #[default]
    Custody,
    /// Credits are destroyed on exit and the series supply shrinks with them.
    Retire,
}

/// Configuration for a new ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Credit display name.
    pub name: String,
    /// Credit ticker symbol.
    pub symbol: String,
    /// Display precision of credit amounts.
    pub decimals: u8,
    /// Reserve asset held by the ledger itself. `Address::NULL` when unset.
    pub value_token: Address,
    /// Builders registered at initialization.
    pub initial_builders: Vec<Address>,
    /// Redemption accounting.
    pub redemption: RedemptionMode,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            name: "REWARD-CREDIT".to_string(),
            symbol: "RWC".to_string(),
            decimals: 18,
            value_token: Address::NULL,
            initial_builders: Vec::new(),
            redemption: RedemptionMode::default(),
        }
    }
}

impl LedgerConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidMetadata("name must not be empty"));
        }
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::InvalidMetadata("symbol must not be empty"));
        }
        if let Some(null) = self.initial_builders.iter().find(|b| b.is_null()) {
            return Err(ConfigError::InvalidBuilder(*null));
        }
        Ok(())
    }

    pub fn with_redemption(mut self, redemption: RedemptionMode) -> Self {
        self.redemption = redemption;
        self
    }

    pub fn with_value_token(mut self, value_token: Address) -> Self {
        self.value_token = value_token;
        self
    }

    pub fn with_builders(mut self, builders: Vec<Address>) -> Self {
        self.initial_builders = builders;
        self
    }
}
