//! Per-tax-code totals of order lines

use rust_decimal::Decimal;
use crate::domain::aggregates::OrderDetail;
use crate::domain::value_objects::TaxId;
use crate::{ConnectorError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaxCodeTotal {
    pub tax_id: TaxId,
    pub amount: Decimal,
}

/// Sums `price × qty` per tax code. One entry per distinct tax code, in the
/// order the codes first appear in `lines`.
pub fn aggregate(lines: &[OrderDetail]) -> Result<Vec<TaxCodeTotal>> {
    let mut totals: Vec<TaxCodeTotal> = Vec::new();
    for line in lines {
        let line_total = line.line_total()?;
        match totals.iter_mut().find(|t| t.tax_id == line.tax_id) {
            Some(total) => {
                total.amount = total.amount.checked_add(line_total)
                    .ok_or_else(|| ConnectorError::AmountOverflow(format!("total for tax code {}", line.tax_id)))?;
            }
            None => totals.push(TaxCodeTotal { tax_id: line.tax_id, amount: line_total }),
        }
    }
    Ok(totals)
}

pub fn grand_total(totals: &[TaxCodeTotal]) -> Result<Decimal> {
    totals.iter().try_fold(Decimal::ZERO, |sum, t| {
        sum.checked_add(t.amount).ok_or_else(|| ConnectorError::AmountOverflow("order total".into()))
    })
}
