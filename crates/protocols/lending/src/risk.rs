//! Risk parameters
//!
//! Validated, immutable copy of the configured ratios, rate curve, and asset
//! decimals.

use ledger_core::{Amount, AssetConfig, LedgerError, Result, RiskConfig};
use serde::Serialize;

use crate::calculator::{self, AssetDecimals, RateCurve};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskParameters {
    collateralization_ratio: Amount,
    liquidation_threshold: Amount,
    base_rate_bps: Amount,
    optimal_utilization_bps: Amount,
    slope1_bps: Amount,
    slope2_bps: Amount,
    native_decimals: u8,
    stable_decimals: u8,
    #[serde(skip)]
    native_unit: Amount,
}

impl RiskParameters {
    pub fn new(risk: &RiskConfig, assets: &AssetConfig) -> Result<Self> {
        risk.validate()?;
        assets.validate()?;
        let native_unit = calculator::pow10(assets.native_decimals as u32).map_err(|_| {
            LedgerError::InvalidConfiguration {
                reason: format!("native decimals {} too large", assets.native_decimals),
            }
        })?;

        Ok(Self {
            collateralization_ratio: risk.collateralization_ratio,
            liquidation_threshold: risk.liquidation_threshold,
            base_rate_bps: risk.base_rate_bps,
            optimal_utilization_bps: risk.optimal_utilization_bps,
            slope1_bps: risk.slope1_bps,
            slope2_bps: risk.slope2_bps,
            native_decimals: assets.native_decimals,
            stable_decimals: assets.stable_decimals,
            native_unit,
        })
    }

    /// Percent of debt value required as collateral to open or grow a loan
    pub fn collateralization_ratio(&self) -> Amount {
        self.collateralization_ratio
    }

    /// Percent of debt value below which a position is liquidatable
    pub fn liquidation_threshold(&self) -> Amount {
        self.liquidation_threshold
    }

    /// One whole native unit in base units (`10^native_decimals`)
    pub fn native_unit(&self) -> Amount {
        self.native_unit
    }

    pub fn decimals(&self) -> AssetDecimals {
        AssetDecimals {
            native: self.native_decimals,
            stable: self.stable_decimals,
        }
    }

    pub fn rate_curve(&self) -> RateCurve {
        RateCurve {
            base_rate_bps: self.base_rate_bps,
            optimal_utilization_bps: self.optimal_utilization_bps,
            slope1_bps: self.slope1_bps,
            slope2_bps: self.slope2_bps,
        }
    }
}

impl Default for RiskParameters {
    fn default() -> Self {
        let risk = RiskConfig::default();
        let assets = AssetConfig::default();
        Self {
            collateralization_ratio: risk.collateralization_ratio,
            liquidation_threshold: risk.liquidation_threshold,
            base_rate_bps: risk.base_rate_bps,
            optimal_utilization_bps: risk.optimal_utilization_bps,
            slope1_bps: risk.slope1_bps,
            slope2_bps: risk.slope2_bps,
            native_decimals: assets.native_decimals,
            stable_decimals: assets.stable_decimals,
            native_unit: 10u128.pow(assets.native_decimals as u32),
        }
    }
}
