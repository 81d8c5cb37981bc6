//! GST line arithmetic. Intra-state supply only: CGST and SGST at configurable
//! halves of the GST rate. There is no IGST path.

use crate::config::AppConfig;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRates {
    pub cgst_pct: Decimal,
    pub sgst_pct: Decimal,
}

impl Default for TaxRates {
    fn default() -> Self {
        Self {
            cgst_pct: dec!(9),
            sgst_pct: dec!(9),
        }
    }
}

impl From<&AppConfig> for TaxRates {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            cgst_pct: cfg.cgst_rate_pct,
            sgst_pct: cfg.sgst_rate_pct,
        }
    }
}

/// Rounds half away from zero to paise.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTax {
    pub taxable_value: Decimal,
    pub cgst_amount: Decimal,
    pub sgst_amount: Decimal,
    pub line_total: Decimal,
}

pub fn compute_line(quantity: Decimal, rate: Decimal, rates: TaxRates) -> LineTax {
    let taxable_value = round2(quantity * rate);
    let cgst_amount = round2(taxable_value * rates.cgst_pct / dec!(100));
    let sgst_amount = round2(taxable_value * rates.sgst_pct / dec!(100));
    LineTax {
        taxable_value,
        cgst_amount,
        sgst_amount,
        line_total: taxable_value + cgst_amount + sgst_amount,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub taxable_value: Decimal,
    pub cgst_amount: Decimal,
    pub sgst_amount: Decimal,
    pub total_amount: Decimal,
}

impl InvoiceTotals {
    /// Header totals are plain sums of the already rounded lines.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a LineTax>) -> Self {
        lines.into_iter().fold(Self::default(), |acc, line| Self {
            taxable_value: acc.taxable_value + line.taxable_value,
            cgst_amount: acc.cgst_amount + line.cgst_amount,
            sgst_amount: acc.sgst_amount + line.sgst_amount,
            total_amount: acc.total_amount + line.line_total,
        })
    }
}
