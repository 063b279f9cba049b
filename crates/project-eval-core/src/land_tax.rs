use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::disposal::DisposalSchedule;
use crate::inputs::TaxParameters;
use crate::period::{PeriodSeries, TimeHorizon};
use crate::types::{Money, Rate};

/// Development fees as a fraction of land + development cost.
const DEVELOPMENT_FEE_RATE: Rate = dec!(0.10);
/// Additional deduction on land + development cost.
const ADDITIONAL_DEDUCTION_RATE: Rate = dec!(0.20);

/// Progressive brackets on appreciation / deductions: (upper bound, rate,
/// quick-deduction coefficient applied to deductions).
const BRACKETS: [(Option<Decimal>, Rate, Rate); 4] = [
    (Some(dec!(0.5)), dec!(0.30), dec!(0)),
    (Some(dec!(1)), dec!(0.40), dec!(0.05)),
    (Some(dec!(2)), dec!(0.50), dec!(0.15)),
    (None, dec!(0.60), dec!(0.35)),
];

/// Rate and quick-deduction coefficient for an appreciation ratio.
pub fn bracket(ratio: Decimal) -> (Rate, Rate) {
    for (upper, rate, quick) in BRACKETS {
        match upper {
            Some(bound) if ratio > bound => continue,
            _ => return (rate, quick),
        }
    }
    (dec!(0.60), dec!(0.35))
}

#[derive(Debug, Clone, Serialize)]
pub struct LandTaxSchedule {
    pub transfer_income: PeriodSeries,
    pub land_cost: PeriodSeries,
    pub development_cost: PeriodSeries,
    pub development_fees: PeriodSeries,
    pub related_taxes: PeriodSeries,
    pub additional_deduction: PeriodSeries,
    pub deductions: PeriodSeries,
    pub appreciation: PeriodSeries,
    /// Appreciation / deductions; `None` where there is nothing to deduct
    pub appreciation_ratio: Vec<Option<Decimal>>,
    pub rate: PeriodSeries,
    pub quick_deduction: PeriodSeries,
    pub tax: PeriodSeries,
}

/// Land appreciation tax on disposals, period by period.
pub fn calculate_land_tax(
    horizon: &TimeHorizon,
    disposal: &DisposalSchedule,
    tax: &TaxParameters,
) -> LandTaxSchedule {
    let mut schedule = LandTaxSchedule {
        transfer_income: disposal.revenue.clone(),
        land_cost: disposal.land_amortization.clone(),
        development_cost: disposal.cost.clone(),
        development_fees: horizon.zero_series(),
        related_taxes: horizon.zero_series(),
        additional_deduction: horizon.zero_series(),
        deductions: horizon.zero_series(),
        appreciation: horizon.zero_series(),
        appreciation_ratio: vec![None; horizon.total_periods() as usize],
        rate: horizon.zero_series(),
        quick_deduction: horizon.zero_series(),
        tax: horizon.zero_series(),
    };

    for n in horizon.periods() {
        let income = schedule.transfer_income.get(n);
        if income.is_zero() {
            continue;
        }
        let base: Money = schedule.land_cost.get(n) + schedule.development_cost.get(n);
        let fees = base * DEVELOPMENT_FEE_RATE;
        let related = income * tax.surcharge_rate() * tax.output_vat_rate;
        let additional = base * ADDITIONAL_DEDUCTION_RATE;
        let deductions = base + fees + related + additional;
        let appreciation = income - deductions;

        schedule.development_fees.set(n, fees);
        schedule.related_taxes.set(n, related);
        schedule.additional_deduction.set(n, additional);
        schedule.deductions.set(n, deductions);
        schedule.appreciation.set(n, appreciation);

        if appreciation <= Decimal::ZERO {
            continue;
        }
        let ratio = if deductions > Decimal::ZERO {
            Some(appreciation / deductions)
        } else {
            None
        };
        let (rate, quick) = match ratio {
            Some(r) => bracket(r),
            None => bracket(Decimal::MAX),
        };
        let i = (n - 1) as usize;
        schedule.appreciation_ratio[i] = ratio;
        schedule.rate.set(n, rate);
        schedule.quick_deduction.set(n, quick);
        schedule
            .tax
            .set(n, (appreciation * rate - deductions * quick).max(Decimal::ZERO));
    }
    schedule
}
