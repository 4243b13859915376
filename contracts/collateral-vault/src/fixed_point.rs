//! Precision handling for every ratio check in the vault.
//!
//! Collateral amounts carry 18 fractional digits, borrowed amounts and the
//! price carry 6. Values are non-negative `i128`; callers validate inputs
//! before they reach this module. Every multiplication is checked.

use crate::error::Error;

pub const COLLATERAL_DECIMALS: u32 = 18;
pub const BORROW_DECIMALS: u32 = 6;
pub const PRICE_DECIMALS: u32 = 6;

/// Divisor taking `collateral * price` down to borrow-asset precision.
const VALUE_SCALE: i128 = 10i128.pow(COLLATERAL_DECIMALS + PRICE_DECIMALS - BORROW_DECIMALS);

const PERCENT: i128 = 100;

fn mul(a: i128, b: i128) -> Result<i128, Error> {
    a.checked_mul(b).ok_or(Error::ArithmeticOverflow)
}

fn div_floor(numerator: i128, denominator: i128) -> Result<i128, Error> {
    if denominator == 0 {
        return Err(Error::DivisionByZero);
    }
    Ok(numerator / denominator)
}

fn div_ceil(numerator: i128, denominator: i128) -> Result<i128, Error> {
    if denominator == 0 {
        return Err(Error::DivisionByZero);
    }
    let quotient = numerator / denominator;
    if numerator % denominator == 0 {
        Ok(quotient)
    } else {
        Ok(quotient + 1)
    }
}

/// Value of `collateral_amount` at `price`, in borrow-asset units, floored.
pub fn collateral_value(collateral_amount: i128, price: i128) -> Result<i128, Error> {
    div_floor(mul(collateral_amount, price)?, VALUE_SCALE)
}

/// Collateralization ratio as a whole percentage, floored so it never
/// reports more than the true ratio.
pub fn ratio_percent(
    collateral_amount: i128,
    price: i128,
    borrowed_amount: i128,
) -> Result<i128, Error> {
    if borrowed_amount == 0 {
        return Err(Error::DivisionByZero);
    }
    let value = collateral_value(collateral_amount, price)?;
    div_floor(mul(value, PERCENT)?, borrowed_amount)
}

/// Smallest collateral amount that backs `borrowed_amount` at
/// `target_ratio_percent`, rounded up.
pub fn required_collateral_for(
    borrowed_amount: i128,
    price: i128,
    target_ratio_percent: i128,
) -> Result<i128, Error> {
    let numerator = mul(mul(borrowed_amount, target_ratio_percent)?, VALUE_SCALE)?;
    div_ceil(numerator, mul(PERCENT, price)?)
}

/// Largest total debt `collateral_amount` can carry at `target_ratio_percent`.
pub fn max_debt_for(
    collateral_amount: i128,
    price: i128,
    target_ratio_percent: i128,
) -> Result<i128, Error> {
    let value = collateral_value(collateral_amount, price)?;
    div_floor(mul(value, PERCENT)?, target_ratio_percent)
}

/// Debt that has to be netted against burned collateral so the remainder sits
/// at `target_ratio_percent`. Zero when the position already meets the target.
///
/// Burning `x` worth of collateral and writing off `x` of debt moves the ratio
/// to `(value - x) / (debt - x)`; solving for the target gives
/// `x = (target * debt - 100 * value) / (target - 100)`.
pub fn debt_write_off_for(
    collateral_value: i128,
    borrowed_amount: i128,
    target_ratio_percent: i128,
) -> Result<i128, Error> {
    let owed = mul(borrowed_amount, target_ratio_percent)?;
    let backing = mul(collateral_value, PERCENT)?;
    if owed <= backing {
        return Ok(0);
    }
    div_ceil(owed - backing, target_ratio_percent - PERCENT)
}

/// Returns `(collateral_to_burn, debt_to_write_off)` restoring the position
/// to `target_ratio_percent`. A position worth no more than its debt loses
/// all of its collateral and has only the collateral's value written off.
pub fn deleverage(
    collateral_amount: i128,
    price: i128,
    borrowed_amount: i128,
    target_ratio_percent: i128,
) -> Result<(i128, i128), Error> {
    let value = collateral_value(collateral_amount, price)?;
    let write_off = debt_write_off_for(value, borrowed_amount, target_ratio_percent)?;

    if write_off >= value {
        return Ok((collateral_amount, value.min(borrowed_amount)));
    }

    let remaining_debt = borrowed_amount - write_off;
    let required = required_collateral_for(remaining_debt, price, target_ratio_percent)?;
    let burn = (collateral_amount - required).max(0).min(collateral_amount);

    Ok((burn, write_off))
}

#[cfg(test)]
mod test {
    use super::*;

    const UNIT: i128 = 1_000_000_000_000_000_000;
    const USD: i128 = 1_000_000;

    #[test]
    fn test_collateral_value_rescales_to_borrow_precision() {
        assert_eq!(collateral_value(UNIT, 300 * USD), Ok(300 * USD));
        assert_eq!(collateral_value(UNIT / 2, 745 * USD), Ok(372_500_000));
        // 1 wei at $1 is far below one micro-dollar
        assert_eq!(collateral_value(1, USD), Ok(0));
    }

    #[test]
    fn test_collateral_value_overflow() {
        assert_eq!(collateral_value(i128::MAX, 2), Err(Error::ArithmeticOverflow));
    }

    #[test]
    fn test_ratio_percent() {
        assert_eq!(ratio_percent(UNIT, 300 * USD, 150 * USD), Ok(200));
        assert_eq!(ratio_percent(UNIT, 300 * USD, 200 * USD), Ok(150));
        assert_eq!(ratio_percent(UNIT, 745 * USD, 372_500_000), Ok(200));
    }

    #[test]
    fn test_ratio_percent_floors() {
        // 500 / 372.50 = 134.23%
        assert_eq!(ratio_percent(UNIT, 500 * USD, 372_500_000), Ok(134));
        // One micro-dollar more debt drops an exact 200% to 199%
        assert_eq!(ratio_percent(UNIT, 300 * USD, 150 * USD + 1), Ok(199));
    }

    #[test]
    fn test_ratio_percent_without_debt() {
        assert_eq!(ratio_percent(UNIT, 300 * USD, 0), Err(Error::DivisionByZero));
    }

    #[test]
    fn test_required_collateral_rounds_up() {
        assert_eq!(required_collateral_for(150 * USD, 200 * USD, 200), Ok(3 * UNIT / 2));
        // 1e-6 debt at $3 needs 666_666_666_666.67 wei
        assert_eq!(required_collateral_for(1, 3 * USD, 200), Ok(666_666_666_667));
        assert_eq!(required_collateral_for(0, 3 * USD, 200), Ok(0));
    }

    #[test]
    fn test_required_collateral_zero_price() {
        assert_eq!(required_collateral_for(USD, 0, 200), Err(Error::DivisionByZero));
    }

    #[test]
    fn test_max_debt_for() {
        assert_eq!(max_debt_for(UNIT, 300 * USD, 200), Ok(150 * USD));
        assert_eq!(max_debt_for(0, 300 * USD, 200), Ok(0));
    }

    #[test]
    fn test_debt_write_off() {
        assert_eq!(debt_write_off_for(500 * USD, 372_500_000, 200), Ok(245 * USD));
        assert_eq!(debt_write_off_for(300 * USD, 150 * USD, 200), Ok(0));
        assert_eq!(debt_write_off_for(400 * USD, 150 * USD, 200), Ok(0));
    }

    #[test]
    fn test_deleverage_lands_on_target() {
        let (burn, write_off) = deleverage(UNIT, 500 * USD, 372_500_000, 200).unwrap();
        assert_eq!(burn, 49 * UNIT / 100);
        assert_eq!(write_off, 245 * USD);
        let ratio = ratio_percent(UNIT - burn, 500 * USD, 372_500_000 - write_off);
        assert_eq!(ratio, Ok(200));
    }

    #[test]
    fn test_deleverage_with_rounding() {
        let collateral = 1_234_567_890_123_456_789;
        let price = 321_987_654;
        let borrowed = 250 * USD;
        assert!(ratio_percent(collateral, price, borrowed).unwrap() < 200);

        let (burn, write_off) = deleverage(collateral, price, borrowed, 200).unwrap();
        assert!(burn > 0 && burn < collateral);
        let ratio = ratio_percent(collateral - burn, price, borrowed - write_off).unwrap();
        assert_eq!(ratio, 200);

        // Burning a single extra wei would already breach the target
        let over_burned = ratio_percent(collateral - burn - 1, price, borrowed - write_off).unwrap();
        assert_eq!(over_burned, 199);
    }

    #[test]
    fn test_deleverage_underwater_position() {
        // $100 of collateral against $150 of debt
        let (burn, write_off) = deleverage(UNIT, 100 * USD, 150 * USD, 200).unwrap();
        assert_eq!(burn, UNIT);
        assert_eq!(write_off, 100 * USD);
    }

    #[test]
    fn test_deleverage_exactly_at_par() {
        let (burn, write_off) = deleverage(UNIT, 150 * USD, 150 * USD, 200).unwrap();
        assert_eq!(burn, UNIT);
        assert_eq!(write_off, 150 * USD);
    }
}
