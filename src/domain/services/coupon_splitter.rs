//! Coupon splitting across tax codes
//!
//! The back office records a discount as a product line carrying a tax
//! code, so a storefront coupon on an order with several tax codes has to
//! become one discount line per code. Each code gets the share of the
//! coupon matching its share of the order value. Only the first coupon of
//! an order is used.
//!
//! Every line but the last is rounded to cents; the last one takes
//! whatever is left, so the split lines always add up to the coupon value.

use rust_decimal::Decimal;
use serde::Serialize;
use crate::domain::aggregates::{Coupon, OrderDetail};
use crate::domain::services::totals::{aggregate, grand_total};
use crate::domain::value_objects::{round_half_down, TaxId};
use crate::{ConnectorError, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SplitDiscountLine {
    pub tax_id: TaxId,
    pub tax_rate: Decimal,
    /// Positive; negated when it becomes an order line.
    pub amount: Decimal,
    pub code: String,
}

pub fn split(lines: &[OrderDetail], coupons: &[Coupon]) -> Result<Vec<SplitDiscountLine>> {
    let Some(coupon) = coupons.first() else { return Ok(Vec::new()) };
    if lines.is_empty() {
        return Ok(Vec::new());
    }

    let mut split_lines: Vec<SplitDiscountLine> = Vec::new();
    for line in lines {
        if split_lines.iter().all(|s| s.tax_id != line.tax_id) {
            split_lines.push(SplitDiscountLine {
                tax_id: line.tax_id,
                tax_rate: line.tax_rate,
                amount: Decimal::ZERO,
                code: coupon.code.clone(),
            });
        }
    }

    if let [only] = split_lines.as_mut_slice() {
        only.amount = coupon.amount;
        return Ok(split_lines);
    }

    let totals = aggregate(lines)?;
    let order_total = grand_total(&totals)?;
    let last = split_lines.len() - 1;
    let mut running_total = Decimal::ZERO;

    for (i, (split_line, total)) in split_lines.iter_mut().zip(&totals).enumerate() {
        debug_assert_eq!(split_line.tax_id, total.tax_id);
        if i < last {
            split_line.amount = round_half_down(share(coupon.amount, total.amount, order_total)?, 2);
            running_total = running_total.checked_add(split_line.amount).ok_or_else(|| overflow(&coupon.code))?;
        } else {
            split_line.amount = coupon.amount.checked_sub(running_total).ok_or_else(|| overflow(&coupon.code))?;
        }
    }

    Ok(split_lines)
}

/// `value × part / whole`, multiplying first unless the product overflows.
/// A zero `whole` gives a zero share.
fn share(value: Decimal, part: Decimal, whole: Decimal) -> Result<Decimal> {
    if whole.is_zero() {
        return Ok(Decimal::ZERO);
    }
    match value.checked_mul(part) {
        Some(product) => product.checked_div(whole),
        None => part.checked_div(whole).and_then(|ratio| value.checked_mul(ratio)),
    }
    .ok_or_else(|| ConnectorError::AmountOverflow(format!("coupon share of {part} in {whole}")))
}

fn overflow(code: &str) -> ConnectorError {
    ConnectorError::AmountOverflow(format!("coupon {code}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::services::totals::tests::line;
    use rust_decimal_macros::dec;

    fn coupon(amount: Decimal) -> Vec<Coupon> {
        vec![Coupon::new("TEST", amount)]
    }

    fn sum(split_lines: &[SplitDiscountLine]) -> Decimal {
        split_lines.iter().map(|s| s.amount).sum()
    }

    fn amounts(split_lines: &[SplitDiscountLine]) -> Vec<Decimal> {
        split_lines.iter().map(|s| s.amount).collect()
    }

    #[test]
    fn test_empty_inputs_return_nothing() {
        assert!(split(&[], &[]).unwrap().is_empty());
        assert!(split(&[], &coupon(dec!(10))).unwrap().is_empty());
        assert!(split(&[line(1, dec!(20), dec!(5), 1)], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_one_tax_code_takes_full_value() {
        let lines = [line(1, dec!(20), dec!(5), 1), line(1, dec!(20), dec!(10), 1)];
        let result = split(&lines, &coupon(dec!(10))).unwrap();
        assert_eq!(result, vec![SplitDiscountLine {
            tax_id: TaxId::new(1), tax_rate: dec!(20), amount: dec!(10), code: "TEST".into(),
        }]);
    }

    #[test]
    fn test_one_tax_code_value_is_not_rounded() {
        let result = split(&[line(1, dec!(20), dec!(3), 1)], &coupon(dec!(1.005))).unwrap();
        assert_eq!(result[0].amount, dec!(1.005));
    }

    #[test]
    fn test_two_tax_codes_ninety_ten() {
        let lines = [line(1, dec!(20), dec!(90), 1), line(2, dec!(5), dec!(10), 1)];
        let result = split(&lines, &coupon(dec!(10))).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!((result[0].tax_id, result[0].tax_rate, result[0].amount), (TaxId::new(1), dec!(20), dec!(9)));
        assert_eq!((result[1].tax_id, result[1].tax_rate, result[1].amount), (TaxId::new(2), dec!(5), dec!(1)));
        assert_eq!(sum(&result), dec!(10));
    }

    #[test]
    fn test_three_tax_codes() {
        let lines = [
            line(1, dec!(20), dec!(70), 1),
            line(2, dec!(5), dec!(10), 1),
            line(3, dec!(10), dec!(20), 1),
        ];
        let result = split(&lines, &coupon(dec!(10))).unwrap();
        assert_eq!(amounts(&result), vec![dec!(7), dec!(1), dec!(2)]);
        assert_eq!(result[2].tax_rate, dec!(10));
        assert_eq!(sum(&result), dec!(10));
    }

    #[test]
    fn test_last_line_absorbs_rounding() {
        let lines = [line(1, dec!(20), dec!(100), 1), line(2, dec!(5), dec!(10), 1)];
        let result = split(&lines, &coupon(dec!(10))).unwrap();
        assert_eq!(amounts(&result), vec![dec!(9.09), dec!(0.91)]);
        assert_eq!(sum(&result), dec!(10));
    }

    #[test]
    fn test_multi_quantity_lines() {
        let lines = [line(1, dec!(5), dec!(5), 3), line(2, dec!(20), dec!(3), 2)];
        let result = split(&lines, &coupon(dec!(2.1))).unwrap();
        assert_eq!((result[0].tax_rate, result[0].amount), (dec!(5), dec!(1.5)));
        assert_eq!((result[1].tax_rate, result[1].amount), (dec!(20), dec!(0.6)));
        assert_eq!(sum(&result), dec!(2.1));
    }

    #[test]
    fn test_three_lines_two_tax_codes() {
        let lines = [
            line(1, dec!(20), dec!(100), 1),
            line(2, dec!(5), dec!(10), 1),
            line(1, dec!(20), dec!(11), 5),
        ];
        let result = split(&lines, &coupon(dec!(10))).unwrap();
        assert_eq!(result.len(), 2);
        // 155 / 165 of the coupon
        assert_eq!(amounts(&result), vec![dec!(9.39), dec!(0.61)]);
    }

    #[test]
    fn test_tax_rate_comes_from_first_line_of_code() {
        let lines = [line(1, dec!(20), dec!(10), 1), line(2, dec!(5), dec!(10), 1), line(1, dec!(17.5), dec!(10), 1)];
        let result = split(&lines, &coupon(dec!(3))).unwrap();
        assert_eq!(result[0].tax_rate, dec!(20));
    }

    #[test]
    fn test_only_first_coupon_used() {
        let lines = [line(1, dec!(20), dec!(50), 1), line(2, dec!(5), dec!(50), 1)];
        let coupons = vec![Coupon::new("FIRST", dec!(4)), Coupon::new("SECOND", dec!(100))];
        let result = split(&lines, &coupons).unwrap();
        assert!(result.iter().all(|s| s.code == "FIRST"));
        assert_eq!(sum(&result), dec!(4));
    }

    #[test]
    fn test_midpoint_rounds_toward_zero() {
        // 0.125 exactly for the first code
        let lines = [line(1, dec!(20), dec!(1), 1), line(2, dec!(5), dec!(7), 1)];
        let result = split(&lines, &coupon(dec!(1))).unwrap();
        assert_eq!(amounts(&result), vec![dec!(0.12), dec!(0.88)]);
    }

    #[test]
    fn test_zero_value_order_gives_everything_to_last_code() {
        let lines = [line(1, dec!(20), dec!(0), 1), line(2, dec!(5), dec!(0), 1)];
        let result = split(&lines, &coupon(dec!(5))).unwrap();
        assert_eq!(amounts(&result), vec![dec!(0), dec!(5)]);
    }

    #[test]
    fn test_split_is_repeatable() {
        let lines = [
            line(1, dec!(20), dec!(33.33), 1),
            line(2, dec!(5), dec!(33.33), 2),
            line(3, dec!(0), dec!(0.01), 7),
        ];
        let coupons = coupon(dec!(7.77));
        let first = split(&lines, &coupons).unwrap();
        let second = split(&lines, &coupons).unwrap();
        assert_eq!(first, second);
        assert_eq!(sum(&first), dec!(7.77));
    }

    #[test]
    fn test_sum_is_exact_for_awkward_shares() {
        for value in [dec!(0.01), dec!(0.99), dec!(1.01), dec!(13.37), dec!(99.99)] {
            let lines = [
                line(1, dec!(20), dec!(1), 3),
                line(2, dec!(5), dec!(1), 3),
                line(3, dec!(10), dec!(1), 3),
            ];
            let result = split(&lines, &coupon(value)).unwrap();
            assert_eq!(sum(&result), value, "coupon {value}");
        }
    }

    #[test]
    fn test_large_amounts_do_not_overflow() {
        let value = Decimal::from(100_000_000_000_000_i64);
        let lines = [line(1, dec!(20), Decimal::from(1_000_000_000_000_000_i64), 1), line(2, dec!(5), dec!(1), 1)];
        let result = split(&lines, &coupon(value)).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(sum(&result), value);
        assert!(result[1].amount >= Decimal::ZERO && result[1].amount < dec!(1));
    }

    #[test]
    fn test_unrepresentable_line_total_is_an_error() {
        let lines = [line(1, dec!(20), Decimal::MAX, 2), line(2, dec!(5), dec!(1), 1)];
        assert!(matches!(split(&lines, &coupon(dec!(10))), Err(ConnectorError::AmountOverflow(_))));
    }
}
