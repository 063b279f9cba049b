use std::collections::VecDeque;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::cost::PeriodCostBreakdown;
use crate::disposal::DisposalSchedule;
use crate::inputs::{ProjectInputs, TaxParameters};
use crate::investment::AssetFormation;
use crate::period::{PeriodSeries, TimeHorizon};
use crate::types::Money;

// ---------------------------------------------------------------------------
// Taxable income policies
// ---------------------------------------------------------------------------

/// Turns per-period gross profit into taxable income and the loss offset
/// used in each period.
pub trait TaxableIncomePolicy {
    fn name(&self) -> &'static str;

    /// Returns `(taxable_income, loss_offset)` per period.
    fn taxable_income(&self, gross_profit: &[Money]) -> (Vec<Money>, Vec<Money>);
}

/// Taxable income = max(0, gross profit).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCarryforward;

impl TaxableIncomePolicy for NoCarryforward {
    fn name(&self) -> &'static str {
        "no loss carry-forward"
    }

    fn taxable_income(&self, gross_profit: &[Money]) -> (Vec<Money>, Vec<Money>) {
        (
            gross_profit.iter().map(|g| (*g).max(Decimal::ZERO)).collect(),
            vec![Decimal::ZERO; gross_profit.len()],
        )
    }
}

/// Losses offset later profits for up to `years` periods, oldest first.
#[derive(Debug, Clone, Copy)]
pub struct LossCarryforward {
    pub years: u32,
}

impl TaxableIncomePolicy for LossCarryforward {
    fn name(&self) -> &'static str {
        "loss carry-forward"
    }

    fn taxable_income(&self, gross_profit: &[Money]) -> (Vec<Money>, Vec<Money>) {
        let mut open_losses: VecDeque<(usize, Money)> = VecDeque::new();
        let mut taxable = Vec::with_capacity(gross_profit.len());
        let mut offsets = Vec::with_capacity(gross_profit.len());

        for (t, gross) in gross_profit.iter().enumerate() {
            while let Some((origin, _)) = open_losses.front() {
                if t - origin > self.years as usize {
                    open_losses.pop_front();
                } else {
                    break;
                }
            }

            if *gross < Decimal::ZERO {
                open_losses.push_back((t, -*gross));
                taxable.push(Decimal::ZERO);
                offsets.push(Decimal::ZERO);
                continue;
            }

            let mut income = *gross;
            let mut offset = Decimal::ZERO;
            while income > Decimal::ZERO {
                let Some(front) = open_losses.front_mut() else {
                    break;
                };
                let used = front.1.min(income);
                front.1 -= used;
                income -= used;
                offset += used;
                if front.1.is_zero() {
                    open_losses.pop_front();
                }
            }
            taxable.push(income);
            offsets.push(offset);
        }
        (taxable, offsets)
    }
}

/// Policy selected by the tax parameters.
pub fn policy_for(tax: &TaxParameters) -> Box<dyn TaxableIncomePolicy> {
    if tax.apply_loss_carryforward {
        Box::new(LossCarryforward {
            years: tax.loss_carryforward_years,
        })
    } else {
        Box::new(NoCarryforward)
    }
}

// ---------------------------------------------------------------------------
// Revenue and VAT
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RevenueStatement {
    pub sales: PeriodSeries,
    pub disposal: PeriodSeries,
    pub total: PeriodSeries,
    pub output_vat: PeriodSeries,
    /// Input tax from construction credited against output VAT
    pub input_credit_used: PeriodSeries,
    pub vat_payable: PeriodSeries,
    pub city_maintenance: PeriodSeries,
    pub education_surcharge: PeriodSeries,
    pub surcharges: PeriodSeries,
    /// Input tax not yet credited at the end of each period
    pub unused_credit: PeriodSeries,
}

pub fn calculate_revenue(
    horizon: &TimeHorizon,
    inputs: &ProjectInputs,
    formation: &AssetFormation,
    disposal: &DisposalSchedule,
) -> RevenueStatement {
    let tax = &inputs.tax;
    let sales = horizon.operation_series(&inputs.revenue.annual);
    let total = sales.plus(&disposal.revenue);
    let output_vat = total.scaled(tax.output_vat_rate);

    let mut input_credit_used = horizon.zero_series();
    let mut unused_credit = horizon.zero_series();
    let mut credit = formation.deductible_input_tax;
    for n in horizon.periods() {
        if horizon.is_operation(n) {
            let used = credit.min(output_vat.get(n)).max(Decimal::ZERO);
            credit -= used;
            input_credit_used.set(n, used);
        }
        unused_credit.set(n, credit);
    }
    let vat_payable = output_vat.minus(&input_credit_used);
    let city_maintenance = vat_payable.scaled(tax.city_maintenance_rate);
    let education_surcharge = vat_payable.scaled(tax.education_surcharge_rate);
    let surcharges = city_maintenance.plus(&education_surcharge);

    RevenueStatement {
        sales,
        disposal: disposal.revenue.clone(),
        total,
        output_vat,
        input_credit_used,
        vat_payable,
        city_maintenance,
        education_surcharge,
        surcharges,
        unused_credit,
    }
}

// ---------------------------------------------------------------------------
// Profit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ProfitStatement {
    pub policy: String,
    pub revenue: PeriodSeries,
    pub total_cost: PeriodSeries,
    pub gross_profit: PeriodSeries,
    pub loss_offset: PeriodSeries,
    pub taxable_income: PeriodSeries,
    pub income_tax: PeriodSeries,
    pub net_profit: PeriodSeries,
    pub surplus_reserve: PeriodSeries,
    /// Profit available to (and paid out to) investors
    pub distributable: PeriodSeries,
    pub retained: PeriodSeries,
}

/// Revenue less total cost, taxed under `policy`. Surcharges, operating
/// interest and land appreciation tax are not deducted here.
pub fn calculate_profit(
    horizon: &TimeHorizon,
    tax: &TaxParameters,
    revenue: &RevenueStatement,
    costs: &PeriodCostBreakdown,
    policy: &dyn TaxableIncomePolicy,
) -> ProfitStatement {
    let gross_profit = revenue.total.minus(&costs.total);
    let (taxable, offsets) = policy.taxable_income(gross_profit.values());

    let mut taxable_income = horizon.zero_series();
    let mut loss_offset = horizon.zero_series();
    for n in horizon.periods() {
        let i = (n - 1) as usize;
        taxable_income.set(n, taxable.get(i).copied().unwrap_or(Decimal::ZERO));
        loss_offset.set(n, offsets.get(i).copied().unwrap_or(Decimal::ZERO));
    }

    let income_tax = taxable_income.scaled(tax.corporate_tax_rate);
    let net_profit = gross_profit.minus(&income_tax);
    let surplus_reserve = net_profit.map(|p| p.max(Decimal::ZERO) * tax.surplus_reserve_rate);
    let distributable = net_profit
        .minus(&surplus_reserve)
        .map(|p| p.max(Decimal::ZERO));
    let retained = net_profit.minus(&distributable).cumulative();

    ProfitStatement {
        policy: policy.name().to_string(),
        revenue: revenue.total.clone(),
        total_cost: costs.total.clone(),
        gross_profit,
        loss_offset,
        taxable_income,
        income_tax,
        net_profit,
        surplus_reserve,
        distributable,
        retained,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_no_carryforward_floors_at_zero() {
        let (taxable, offsets) = NoCarryforward.taxable_income(&[dec!(-50), dec!(80), dec!(0)]);
        assert_eq!(taxable, vec![dec!(0), dec!(80), dec!(0)]);
        assert!(offsets.iter().all(|o| o.is_zero()));
    }

    #[test]
    fn test_carryforward_offsets_oldest_first() {
        let policy = LossCarryforward { years: 5 };
        let (taxable, offsets) = policy.taxable_income(&[dec!(-50), dec!(-30), dec!(60), dec!(40)]);
        assert_eq!(taxable, vec![dec!(0), dec!(0), dec!(0), dec!(20)]);
        assert_eq!(offsets, vec![dec!(0), dec!(0), dec!(60), dec!(20)]);
    }

    #[test]
    fn test_carryforward_losses_expire() {
        let policy = LossCarryforward { years: 2 };
        let (taxable, _) = policy.taxable_income(&[dec!(-100), dec!(0), dec!(0), dec!(70)]);
        // Loss from period 0 is three periods old by period 3
        assert_eq!(taxable[3], dec!(70));
    }

    #[test]
    fn test_policy_selection() {
        let mut tax = TaxParameters::default();
        assert_eq!(policy_for(&tax).name(), "no loss carry-forward");
        tax.apply_loss_carryforward = true;
        assert_eq!(policy_for(&tax).name(), "loss carry-forward");
    }

    #[test]
    fn test_net_profit_and_appropriation() {
        let h = TimeHorizon::new(1, 2).unwrap();
        let tax = TaxParameters::default();
        let revenue = RevenueStatement {
            sales: h.operation_constant(dec!(100)),
            disposal: h.zero_series(),
            total: h.operation_constant(dec!(100)),
            output_vat: h.zero_series(),
            input_credit_used: h.zero_series(),
            vat_payable: h.zero_series(),
            city_maintenance: h.zero_series(),
            education_surcharge: h.zero_series(),
            surcharges: h.zero_series(),
            unused_credit: h.zero_series(),
        };
        let mut costs_total = h.operation_constant(dec!(60));
        costs_total.set(3, dec!(140));
        let costs = PeriodCostBreakdown {
            materials: costs_total.clone(),
            fuel: h.zero_series(),
            labor: h.zero_series(),
            repair: h.zero_series(),
            depreciation: h.zero_series(),
            amortization: h.zero_series(),
            total: costs_total,
            material_lines: Vec::new(),
            fuel_lines: Vec::new(),
            labor_lines: Vec::new(),
            wages: Decimal::ZERO,
            welfare: Decimal::ZERO,
            repair_only: h.zero_series(),
            other_expense: h.zero_series(),
        };
        let p = calculate_profit(&h, &tax, &revenue, &costs, &NoCarryforward);
        assert_eq!(p.gross_profit.get(2), dec!(40));
        assert_eq!(p.income_tax.get(2), dec!(10));
        assert_eq!(p.net_profit.get(2), dec!(30));
        assert_eq!(p.surplus_reserve.get(2), dec!(3));
        assert_eq!(p.distributable.get(2), dec!(27));
        // Loss period: no tax, nothing distributed
        assert_eq!(p.income_tax.get(3), Decimal::ZERO);
        assert_eq!(p.net_profit.get(3), dec!(-40));
        assert_eq!(p.distributable.get(3), Decimal::ZERO);
        assert_eq!(p.retained.get(3), dec!(3) - dec!(40));
    }
}
