//! Lending Calculator
//!
//! Pure integer math for share pricing, oracle conversions, collateral
//! requirements, interest, and health factors.
//! No I/O, no state. Every operation is checked; nothing wraps or saturates
//! unless the function says so.

use ledger_core::constants::{BPS_DENOMINATOR, PERCENT_DENOMINATOR, SECONDS_PER_YEAR};
use ledger_core::{Amount, LedgerError, Result, Timestamp};

use crate::constants::{health, interest};
use crate::state::HealthStatus;

/// Exchange rate between the native and stable asset as reported by the oracle.
///
/// `price` is stable units per one whole native unit, scaled by `10^decimals`
/// (a Chainlink-style answer: 2000 USD/ETH with 8 decimals is `200_000_000_000`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub price: Amount,
    pub decimals: u8,
}

/// Decimals of the pooled assets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetDecimals {
    pub native: u8,
    pub stable: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

pub fn checked_add(a: Amount, b: Amount) -> Result<Amount> {
    a.checked_add(b).ok_or(LedgerError::ArithmeticOverflow)
}

pub fn checked_sub(a: Amount, b: Amount) -> Result<Amount> {
    a.checked_sub(b).ok_or(LedgerError::ArithmeticUnderflow)
}

pub fn pow10(exponent: u32) -> Result<Amount> {
    10u128
        .checked_pow(exponent)
        .ok_or(LedgerError::ArithmeticOverflow)
}

/// `a * b / denominator` with explicit rounding
pub fn mul_div(a: Amount, b: Amount, denominator: Amount, rounding: Rounding) -> Result<Amount> {
    if denominator == 0 {
        return Err(LedgerError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(LedgerError::ArithmeticOverflow)?;
    let quotient = product / denominator;
    match rounding {
        Rounding::Up if product % denominator != 0 => checked_add(quotient, 1),
        _ => Ok(quotient),
    }
}

/// `amount * multiplier * 10^num_exp / (divisor * 10^den_exp)`.
///
/// Common powers of ten are cancelled first so that realistic wei-scale
/// values stay inside u128.
fn scaled(
    amount: Amount,
    multiplier: Amount,
    divisor: Amount,
    num_exp: u32,
    den_exp: u32,
    rounding: Rounding,
) -> Result<Amount> {
    let common = num_exp.min(den_exp);
    let numerator_scale = pow10(num_exp - common)?;
    let denominator_scale = pow10(den_exp - common)?;

    let numerator = amount
        .checked_mul(multiplier)
        .and_then(|v| v.checked_mul(numerator_scale))
        .ok_or(LedgerError::ArithmeticOverflow)?;
    let denominator = divisor
        .checked_mul(denominator_scale)
        .ok_or(LedgerError::ArithmeticOverflow)?;

    mul_div(numerator, 1, denominator, rounding)
}

fn native_plus_price(decimals: AssetDecimals, quote: Quote) -> u32 {
    decimals.native as u32 + quote.decimals as u32
}

// =============================================================================
// Shares
// =============================================================================

/// Shares minted for a deposit.
///
/// Bootstrap (no shares outstanding): `amount / unit`, a 1:1 rate against whole
/// native units. Otherwise the vault formula `amount * supply / liquidity`,
/// which leaves the redemption value of existing shares unchanged.
pub fn shares_for_deposit(
    amount: Amount,
    total_supply: Amount,
    total_liquidity: Amount,
    native_unit: Amount,
) -> Result<Amount> {
    if total_supply == 0 {
        if native_unit == 0 {
            return Err(LedgerError::DivisionByZero);
        }
        return Ok(amount / native_unit);
    }
    mul_div(amount, total_supply, total_liquidity, Rounding::Down)
}

/// Native value currently represented by `shares`: `shares * liquidity / supply`
pub fn redemption_value(
    shares: Amount,
    total_liquidity: Amount,
    total_supply: Amount,
) -> Result<Amount> {
    mul_div(shares, total_liquidity, total_supply, Rounding::Down)
}

// =============================================================================
// Oracle conversions
// =============================================================================

pub fn native_to_stable(
    native: Amount,
    quote: Quote,
    decimals: AssetDecimals,
    rounding: Rounding,
) -> Result<Amount> {
    scaled(
        native,
        quote.price,
        1,
        decimals.stable as u32,
        native_plus_price(decimals, quote),
        rounding,
    )
}

pub fn stable_to_native(
    stable: Amount,
    quote: Quote,
    decimals: AssetDecimals,
    rounding: Rounding,
) -> Result<Amount> {
    scaled(
        stable,
        1,
        quote.price,
        native_plus_price(decimals, quote),
        decimals.stable as u32,
        rounding,
    )
}

/// Native collateral needed to back `debt` at `ratio_pct` percent.
///
/// Computed in one step and rounded up, so a position is never considered
/// covered by a fraction of a wei it does not hold.
pub fn collateral_required(
    debt: Amount,
    ratio_pct: Amount,
    quote: Quote,
    decimals: AssetDecimals,
) -> Result<Amount> {
    if debt == 0 {
        return Ok(0);
    }
    let divisor = quote
        .price
        .checked_mul(PERCENT_DENOMINATOR)
        .ok_or(LedgerError::ArithmeticOverflow)?;
    scaled(
        debt,
        ratio_pct,
        divisor,
        native_plus_price(decimals, quote),
        decimals.stable as u32,
        Rounding::Up,
    )
}

/// Largest total debt that `collateral` can back at `ratio_pct` percent.
///
/// Inverse of [`collateral_required`]: `collateral_required(max) <= collateral`
/// and `collateral_required(max + 1) > collateral`.
pub fn max_debt_for_collateral(
    collateral: Amount,
    ratio_pct: Amount,
    quote: Quote,
    decimals: AssetDecimals,
) -> Result<Amount> {
    let multiplier = quote
        .price
        .checked_mul(PERCENT_DENOMINATOR)
        .ok_or(LedgerError::ArithmeticOverflow)?;
    scaled(
        collateral,
        multiplier,
        ratio_pct,
        decimals.stable as u32,
        native_plus_price(decimals, quote),
        Rounding::Down,
    )
}

// =============================================================================
// Interest
// =============================================================================

/// Pool utilization in basis points, capped at 100%
pub fn utilization_bps(debt_in_native: Amount, total_liquidity: Amount) -> Result<Amount> {
    if debt_in_native == 0 {
        return Ok(0);
    }
    if total_liquidity == 0 {
        return Ok(interest::MAX_UTILIZATION_BPS);
    }
    let utilization = mul_div(debt_in_native, BPS_DENOMINATOR, total_liquidity, Rounding::Down)?;
    Ok(utilization.min(interest::MAX_UTILIZATION_BPS))
}

/// Coefficients of the two-slope rate curve, all in annual basis points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateCurve {
    pub base_rate_bps: Amount,
    pub optimal_utilization_bps: Amount,
    pub slope1_bps: Amount,
    pub slope2_bps: Amount,
}

/// Annual borrow rate for a utilization.
///
/// - utilization <= optimal: `base + u / optimal * slope1`
/// - utilization > optimal: `base + slope1 + (u - optimal) / (1 - optimal) * slope2`
pub fn borrow_rate_bps(utilization: Amount, curve: RateCurve) -> Result<Amount> {
    let utilization = utilization.min(interest::MAX_UTILIZATION_BPS);
    if utilization <= curve.optimal_utilization_bps {
        let increase = mul_div(
            utilization,
            curve.slope1_bps,
            curve.optimal_utilization_bps,
            Rounding::Down,
        )?;
        return checked_add(curve.base_rate_bps, increase);
    }

    let excess = checked_sub(utilization, curve.optimal_utilization_bps)?;
    let span = checked_sub(BPS_DENOMINATOR, curve.optimal_utilization_bps)?;
    let excess_rate = mul_div(excess, curve.slope2_bps, span, Rounding::Down)?;
    checked_add(checked_add(curve.base_rate_bps, curve.slope1_bps)?, excess_rate)
}

/// Simple interest over `[opened_at, now]`, floored. A clock that runs
/// backwards accrues nothing.
pub fn accrued_interest(
    principal: Amount,
    rate_bps: Amount,
    opened_at: Timestamp,
    now: Timestamp,
) -> Result<Amount> {
    if principal == 0 || rate_bps == 0 {
        return Ok(0);
    }
    let elapsed = now.saturating_sub(opened_at) as Amount;
    let numerator = principal
        .checked_mul(rate_bps)
        .and_then(|v| v.checked_mul(elapsed))
        .ok_or(LedgerError::ArithmeticOverflow)?;
    mul_div(numerator, 1, BPS_DENOMINATOR * SECONDS_PER_YEAR, Rounding::Down)
}

// =============================================================================
// Health
// =============================================================================

/// Health factor in basis points, `None` when there is no debt.
///
/// health = collateral * 10_000 / (debt_in_native * threshold / 100)
pub fn health_factor_bps(
    collateral: Amount,
    debt_in_native: Amount,
    liquidation_threshold_pct: Amount,
) -> Result<Option<Amount>> {
    if debt_in_native == 0 {
        return Ok(None);
    }
    let numerator = collateral
        .checked_mul(BPS_DENOMINATOR)
        .and_then(|v| v.checked_mul(PERCENT_DENOMINATOR))
        .ok_or(LedgerError::ArithmeticOverflow)?;
    mul_div(
        numerator,
        1,
        debt_in_native
            .checked_mul(liquidation_threshold_pct)
            .ok_or(LedgerError::ArithmeticOverflow)?,
        Rounding::Down,
    )
    .map(Some)
}

/// Determine health status from health factor
pub fn health_status(health_factor_bps: Option<Amount>) -> HealthStatus {
    match health_factor_bps {
        None => HealthStatus::Healthy,
        Some(hf) if hf >= health::HEALTHY_FACTOR_BPS => HealthStatus::Healthy,
        Some(hf) if hf >= health::WARNING_FACTOR_BPS => HealthStatus::Warning,
        Some(_) => HealthStatus::Danger,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ETH: Amount = 1_000_000_000_000_000_000;
    const USDT: Amount = 1_000_000;

    fn quote(usd_per_eth: Amount) -> Quote {
        Quote {
            price: usd_per_eth * 100_000_000,
            decimals: 8,
        }
    }

    fn decimals() -> AssetDecimals {
        AssetDecimals {
            native: 18,
            stable: 6,
        }
    }

    fn curve() -> RateCurve {
        RateCurve {
            base_rate_bps: 200,
            optimal_utilization_bps: 8_000,
            slope1_bps: 400,
            slope2_bps: 7_500,
        }
    }

    #[test]
    fn test_mul_div_rounding() {
        assert_eq!(mul_div(10, 3, 4, Rounding::Down).unwrap(), 7);
        assert_eq!(mul_div(10, 3, 4, Rounding::Up).unwrap(), 8);
        assert_eq!(mul_div(8, 3, 4, Rounding::Up).unwrap(), 6);
        assert_eq!(
            mul_div(1, 1, 0, Rounding::Down).unwrap_err(),
            LedgerError::DivisionByZero
        );
        assert_eq!(
            mul_div(u128::MAX, 2, 1, Rounding::Down).unwrap_err(),
            LedgerError::ArithmeticOverflow
        );
    }

    #[test]
    fn test_checked_sub_reports_underflow() {
        assert_eq!(checked_sub(1, 2).unwrap_err(), LedgerError::ArithmeticUnderflow);
        assert_eq!(checked_add(u128::MAX, 1).unwrap_err(), LedgerError::ArithmeticOverflow);
    }

    #[test]
    fn test_bootstrap_shares_are_whole_units() {
        assert_eq!(shares_for_deposit(10 * ETH, 0, 0, ETH).unwrap(), 10);
        assert_eq!(shares_for_deposit(ETH / 2, 0, 0, ETH).unwrap(), 0);
    }

    #[test]
    fn test_vault_shares_keep_price() {
        // Pool holds 10 ETH against 10 shares; 20 ETH more mints 20 shares
        assert_eq!(shares_for_deposit(20 * ETH, 10, 10 * ETH, ETH).unwrap(), 20);

        // Pool grew to 12 ETH against 10 shares; 6 ETH mints 5 shares
        assert_eq!(shares_for_deposit(6 * ETH, 10, 12 * ETH, ETH).unwrap(), 5);
    }

    #[test]
    fn test_redemption_value() {
        assert_eq!(redemption_value(2, 10 * ETH, 10).unwrap(), 2 * ETH);
        assert_eq!(redemption_value(5, 12 * ETH, 10).unwrap(), 6 * ETH);
        assert!(redemption_value(1, ETH, 0).is_err());
    }

    #[test]
    fn test_price_conversions() {
        let q = quote(2_000);
        assert_eq!(
            native_to_stable(ETH, q, decimals(), Rounding::Down).unwrap(),
            2_000 * USDT
        );
        assert_eq!(
            stable_to_native(10_000 * USDT, q, decimals(), Rounding::Down).unwrap(),
            5 * ETH
        );
        // 1 micro-USDT at 3000 USD/ETH is not a whole number of wei
        let q = quote(3_000);
        let down = stable_to_native(1, q, decimals(), Rounding::Down).unwrap();
        let up = stable_to_native(1, q, decimals(), Rounding::Up).unwrap();
        assert_eq!(up, down + 1);
    }

    #[test]
    fn test_collateral_required_at_150_percent() {
        // 10_000 USDT at 2000 USD/ETH is 5 ETH; 150% of that is 7.5 ETH
        let required = collateral_required(10_000 * USDT, 150, quote(2_000), decimals()).unwrap();
        assert_eq!(required, 7 * ETH + ETH / 2);
        assert_eq!(collateral_required(0, 150, quote(2_000), decimals()).unwrap(), 0);
    }

    #[test]
    fn test_max_debt_is_inverse_of_required_collateral() {
        let q = quote(2_000);
        let collateral = 10 * ETH;
        let max = max_debt_for_collateral(collateral, 150, q, decimals()).unwrap();
        assert_eq!(max, 13_333_333_333);
        assert!(collateral_required(max, 150, q, decimals()).unwrap() <= collateral);
        assert!(collateral_required(max + 1, 150, q, decimals()).unwrap() > collateral);
    }

    #[test]
    fn test_utilization() {
        assert_eq!(utilization_bps(0, 100).unwrap(), 0);
        assert_eq!(utilization_bps(50, 100).unwrap(), 5_000);
        assert_eq!(utilization_bps(200, 100).unwrap(), 10_000);
        assert_eq!(utilization_bps(1, 0).unwrap(), 10_000);
    }

    #[test]
    fn test_borrow_rate_curve() {
        assert_eq!(borrow_rate_bps(0, curve()).unwrap(), 200);
        // Half of optimal: 200 + 400 / 2
        assert_eq!(borrow_rate_bps(4_000, curve()).unwrap(), 400);
        assert_eq!(borrow_rate_bps(8_000, curve()).unwrap(), 600);
        // Halfway through the steep slope: 200 + 400 + 7500 / 2
        assert_eq!(borrow_rate_bps(9_000, curve()).unwrap(), 4_350);
        assert_eq!(borrow_rate_bps(10_000, curve()).unwrap(), 8_100);
        assert_eq!(borrow_rate_bps(50_000, curve()).unwrap(), 8_100);
    }

    #[test]
    fn test_accrued_interest_one_year() {
        let year = SECONDS_PER_YEAR as Timestamp;
        // 10% of 1000 USDT over a year
        assert_eq!(
            accrued_interest(1_000 * USDT, 1_000, 0, year).unwrap(),
            100 * USDT
        );
        assert_eq!(accrued_interest(1_000 * USDT, 1_000, 100, 100).unwrap(), 0);
        assert_eq!(accrued_interest(1_000 * USDT, 1_000, 100, 50).unwrap(), 0);
        assert_eq!(accrued_interest(0, 1_000, 0, year).unwrap(), 0);
    }

    #[test]
    fn test_health_factor() {
        // collateral 10, debt worth 5, threshold 125%: 10 / 6.25 = 1.6
        let hf = health_factor_bps(10 * ETH, 5 * ETH, 125).unwrap();
        assert_eq!(hf, Some(16_000));
        assert_eq!(health_status(hf), HealthStatus::Healthy);

        let hf = health_factor_bps(9 * ETH, 6 * ETH, 125).unwrap();
        assert_eq!(health_status(hf), HealthStatus::Warning);

        let hf = health_factor_bps(7 * ETH, 6 * ETH, 125).unwrap();
        assert_eq!(health_status(hf), HealthStatus::Danger);

        assert_eq!(health_factor_bps(10 * ETH, 0, 125).unwrap(), None);
        assert_eq!(health_status(None), HealthStatus::Healthy);
    }
}
