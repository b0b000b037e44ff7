//! Configuration types for the lending pool ledger

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    BPS_DENOMINATOR, DEFAULT_NATIVE_DECIMALS, DEFAULT_PRICE_DECIMALS, DEFAULT_STABLE_DECIMALS,
};
use crate::errors::{ConfigError, LedgerError};

/// Largest decimals value whose power of ten still fits comfortably in a u128
const MAX_DECIMALS: u8 = 30;

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// API server port
    #[serde(default = "default_api_port")]
    pub port: u16,
}

fn default_api_port() -> u16 {
    18545
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_api_port(),
        }
    }
}

/// Risk parameters as configured. Percentages are whole percent (150 = 150%),
/// rate coefficients are annual basis points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskConfig {
    pub collateralization_ratio: u128,
    pub liquidation_threshold: u128,
    pub base_rate_bps: u128,
    pub optimal_utilization_bps: u128,
    pub slope1_bps: u128,
    pub slope2_bps: u128,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            collateralization_ratio: 150,
            liquidation_threshold: 125,
            base_rate_bps: 200,
            optimal_utilization_bps: 8_000,
            slope1_bps: 400,
            slope2_bps: 7_500,
        }
    }
}

impl RiskConfig {
    /// Check the ordering constraints between the ratios and the rate curve
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.liquidation_threshold < 100 {
            return Err(invalid(format!(
                "liquidation threshold {}% is below 100%",
                self.liquidation_threshold
            )));
        }
        if self.liquidation_threshold >= self.collateralization_ratio {
            return Err(invalid(format!(
                "liquidation threshold {}% must be below collateralization ratio {}%",
                self.liquidation_threshold, self.collateralization_ratio
            )));
        }
        if self.optimal_utilization_bps == 0 || self.optimal_utilization_bps >= BPS_DENOMINATOR {
            return Err(invalid(format!(
                "optimal utilization {} bps must be within (0, {})",
                self.optimal_utilization_bps, BPS_DENOMINATOR
            )));
        }
        let max_rate = self
            .base_rate_bps
            .checked_add(self.slope1_bps)
            .and_then(|r| r.checked_add(self.slope2_bps));
        if max_rate.is_none() {
            return Err(invalid("interest rate coefficients overflow".to_string()));
        }
        Ok(())
    }
}

/// Decimals of the two pooled assets and the stable reserve the pool lends from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    #[serde(default = "default_native_decimals")]
    pub native_decimals: u8,
    #[serde(default = "default_stable_decimals")]
    pub stable_decimals: u8,
    /// Stable base units seeded into the pool at startup
    #[serde(default = "default_stable_reserve")]
    pub stable_reserve: u128,
}

fn default_native_decimals() -> u8 {
    DEFAULT_NATIVE_DECIMALS
}

fn default_stable_decimals() -> u8 {
    DEFAULT_STABLE_DECIMALS
}

fn default_stable_reserve() -> u128 {
    1_000_000 * 10u128.pow(DEFAULT_STABLE_DECIMALS as u32)
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            native_decimals: default_native_decimals(),
            stable_decimals: default_stable_decimals(),
            stable_reserve: default_stable_reserve(),
        }
    }
}

impl AssetConfig {
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.native_decimals > MAX_DECIMALS || self.stable_decimals > MAX_DECIMALS {
            return Err(invalid(format!(
                "asset decimals must not exceed {}",
                MAX_DECIMALS
            )));
        }
        Ok(())
    }
}

/// Fixed oracle quote used by the standalone service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Stable units per one whole native unit, scaled by `10^decimals`
    pub price: u128,
    #[serde(default = "default_price_decimals")]
    pub decimals: u8,
}

fn default_price_decimals() -> u8 {
    DEFAULT_PRICE_DECIMALS
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            price: 2_000 * 10u128.pow(DEFAULT_PRICE_DECIMALS as u32),
            decimals: default_price_decimals(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub risk: RiskConfig,

    #[serde(default)]
    pub assets: AssetConfig,

    #[serde(default)]
    pub oracle: OracleConfig,
}

impl AppConfig {
    /// Load from a JSON file and validate it
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parse from a JSON document and validate it
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        self.risk.validate()?;
        self.assets.validate()?;
        if self.oracle.price == 0 {
            return Err(invalid("oracle price must be greater than zero".to_string()));
        }
        if self.oracle.decimals > MAX_DECIMALS {
            return Err(invalid(format!(
                "oracle decimals must not exceed {}",
                MAX_DECIMALS
            )));
        }
        Ok(())
    }
}

fn invalid(reason: String) -> LedgerError {
    LedgerError::InvalidConfiguration { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 18545);
        assert_eq!(config.risk.collateralization_ratio, 150);
        assert_eq!(config.risk.liquidation_threshold, 125);
        assert_eq!(config.assets.native_decimals, 18);
        assert_eq!(config.oracle.price, 200_000_000_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.risk, config.risk);
        assert_eq!(parsed.oracle, config.oracle);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = AppConfig::from_json(r#"{"server": {"port": 9000}}"#).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.risk, RiskConfig::default());
        assert_eq!(config.assets.stable_decimals, 6);
        assert_eq!(config.assets.stable_reserve, 1_000_000_000_000);
    }

    #[test]
    fn test_threshold_must_be_below_ratio() {
        let risk = RiskConfig {
            liquidation_threshold: 150,
            ..RiskConfig::default()
        };
        let err = risk.validate().unwrap_err();
        assert_eq!(err.error_code(), "invalid_configuration");

        let risk = RiskConfig {
            liquidation_threshold: 90,
            ..RiskConfig::default()
        };
        assert!(risk.validate().is_err());
    }

    #[test]
    fn test_invalid_json_config() {
        let err = AppConfig::from_json(r#"{"oracle": {"price": 0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = AppConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
