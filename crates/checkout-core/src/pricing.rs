//! Price Calculation
//!
//! All amounts are integer minor units; `Decimal` is only used for the
//! percentage step and the major-unit string handed to wallet providers.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::model::CouponResult;

/// Apply a coupon discount to a price in minor units
///
/// Invalid or missing coupons leave the price untouched. The result never
/// drops below zero.
pub fn apply_coupon(price: i64, coupon: Option<&CouponResult>) -> i64 {
    let Some(coupon) = coupon.filter(|c| c.valid) else {
        return price;
    };

    let mut total = Decimal::from(price);

    if let Some(percent) = coupon.percent_off {
        let discount = (total * percent / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        total -= discount;
    }

    if let Some(amount) = coupon.amount_off {
        total -= Decimal::from(amount);
    }

    let total = total.max(Decimal::ZERO);
    i64::try_from(total).unwrap_or(price)
}

/// Format minor units as a major-unit string with exactly two decimals
pub fn format_major_units(minor: i64) -> String {
    Decimal::new(minor, 2).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn coupon(percent: Option<Decimal>, amount: Option<i64>) -> CouponResult {
        CouponResult {
            id: "C1".into(),
            valid: true,
            percent_off: percent,
            amount_off: amount,
        }
    }

    #[test]
    fn test_no_coupon() {
        assert_eq!(apply_coupon(1000, None), 1000);
    }

    #[test]
    fn test_invalid_coupon_ignored() {
        let mut c = coupon(Some(dec!(50)), None);
        c.valid = false;
        assert_eq!(apply_coupon(1000, Some(&c)), 1000);
    }

    #[test]
    fn test_percent_off_rounds_half_away_from_zero() {
        assert_eq!(apply_coupon(2500, Some(&coupon(Some(dec!(25)), None))), 1875);
        // 999 * 0.5 = 499.5 -> 500 off
        assert_eq!(apply_coupon(999, Some(&coupon(Some(dec!(50)), None))), 499);
    }

    #[test]
    fn test_amount_off_clamps_at_zero() {
        assert_eq!(apply_coupon(1000, Some(&coupon(None, Some(300)))), 700);
        assert_eq!(apply_coupon(1000, Some(&coupon(None, Some(5000)))), 0);
    }

    #[test]
    fn test_format_major_units() {
        assert_eq!(format_major_units(1000), "10.00");
        assert_eq!(format_major_units(5), "0.05");
        assert_eq!(format_major_units(0), "0.00");
        assert_eq!(format_major_units(19999), "199.99");
    }

    #[test]
    fn test_display_matches_total_over_100() {
        let prices = [1, 99, 100, 1234, 25000, 49999];
        let coupons = [
            None,
            Some(coupon(Some(dec!(10)), None)),
            Some(coupon(Some(dec!(33)), None)),
            Some(coupon(None, Some(250))),
        ];
        for price in prices {
            for c in &coupons {
                let total = apply_coupon(price, c.as_ref());
                let expected = format!("{}.{:02}", total / 100, total % 100);
                assert_eq!(format_major_units(total), expected);
            }
        }
    }
}
