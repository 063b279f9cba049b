use rust_decimal::Decimal;
use serde::Serialize;

use crate::depreciation::DepreciationResult;
use crate::inputs::{CostCategory, CostInputs};
use crate::investment::AssetFormation;
use crate::period::{sum_series, PeriodSeries, TimeHorizon};
use crate::types::Money;

/// A named cost line spread over the horizon.
#[derive(Debug, Clone, Serialize)]
pub struct CostLine {
    pub name: String,
    pub values: PeriodSeries,
}

/// Labor cost of one staff role.
#[derive(Debug, Clone, Serialize)]
pub struct LaborLine {
    pub role: String,
    pub headcount: u32,
    pub annual_salary: Money,
    /// `headcount * annual_salary`
    pub wages: Money,
}

/// The six cost components per period, plus the detail behind them.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodCostBreakdown {
    pub materials: PeriodSeries,
    pub fuel: PeriodSeries,
    pub labor: PeriodSeries,
    /// Repair plus other expense, both on the fixed-asset base
    pub repair: PeriodSeries,
    pub depreciation: PeriodSeries,
    pub amortization: PeriodSeries,
    pub total: PeriodSeries,
    pub material_lines: Vec<CostLine>,
    pub fuel_lines: Vec<CostLine>,
    pub labor_lines: Vec<LaborLine>,
    pub wages: Money,
    pub welfare: Money,
    pub repair_only: PeriodSeries,
    pub other_expense: PeriodSeries,
}

impl PeriodCostBreakdown {
    /// Cash operating cost: total cost less the non-cash charges.
    pub fn operating_cost(&self) -> PeriodSeries {
        self.total.minus(&self.depreciation).minus(&self.amortization)
    }
}

fn category_lines(horizon: &TimeHorizon, categories: &[CostCategory]) -> Vec<CostLine> {
    categories
        .iter()
        .map(|c| CostLine {
            name: c.name.clone(),
            values: horizon.operation_series(&c.values),
        })
        .collect()
}

/// Annual labor: `Σ(headcount × salary) × (1 + welfare)`.
pub fn annual_labor_cost(costs: &CostInputs) -> (Vec<LaborLine>, Money, Money) {
    let lines: Vec<LaborLine> = costs
        .staff
        .iter()
        .map(|r| LaborLine {
            role: r.role.clone(),
            headcount: r.headcount,
            annual_salary: r.annual_salary,
            wages: Decimal::from(r.headcount) * r.annual_salary,
        })
        .collect();
    let wages: Money = lines.iter().map(|l| l.wages).sum();
    let welfare = wages * costs.welfare_rate;
    (lines, wages, welfare)
}

pub fn aggregate_costs(
    horizon: &TimeHorizon,
    costs: &CostInputs,
    formation: &AssetFormation,
    depreciation: &DepreciationResult,
) -> PeriodCostBreakdown {
    let material_lines = category_lines(horizon, &costs.materials);
    let fuel_lines = category_lines(horizon, &costs.fuels);
    let materials = sum_series(horizon, material_lines.iter().map(|l| &l.values));
    let fuel = sum_series(horizon, fuel_lines.iter().map(|l| &l.values));

    let (labor_lines, wages, welfare) = annual_labor_cost(costs);
    let labor = horizon.operation_constant(wages + welfare);

    let base = formation.fixed_asset_excluding_interest;
    let repair_only = horizon.operation_constant(base * costs.repair_rate);
    let other_expense = horizon.operation_constant(base * costs.other_expense_rate);
    let repair = repair_only.plus(&other_expense);

    let total = sum_series(
        horizon,
        [
            &materials,
            &fuel,
            &labor,
            &repair,
            &depreciation.depreciation,
            &depreciation.amortization,
        ],
    );

    PeriodCostBreakdown {
        materials,
        fuel,
        labor,
        repair,
        depreciation: depreciation.depreciation.clone(),
        amortization: depreciation.amortization.clone(),
        total,
        material_lines,
        fuel_lines,
        labor_lines,
        wages,
        welfare,
        repair_only,
        other_expense,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::{ProjectInputs, StaffRole};
    use crate::investment::form_assets;
    use crate::{depreciation::calculate_depreciation, disposal::calculate_disposal};
    use rust_decimal_macros::dec;

    fn breakdown(inputs: &ProjectInputs) -> (TimeHorizon, PeriodCostBreakdown) {
        let h = inputs.horizon().unwrap();
        let f = form_assets(&h, inputs).unwrap();
        let d = calculate_disposal(&h, &f, &inputs.disposal, inputs.costs.sales_expense_rate);
        let dep = calculate_depreciation(&h, inputs, &f, &d);
        (h, aggregate_costs(&h, &inputs.costs, &f, &dep))
    }

    #[test]
    fn test_labor_with_welfare() {
        let mut inputs = ProjectInputs::default();
        inputs.costs.staff = vec![
            StaffRole { role: "管理人员".into(), headcount: 2, annual_salary: dec!(10) },
            StaffRole { role: "技术人员".into(), headcount: 3, annual_salary: dec!(8) },
        ];
        let (h, c) = breakdown(&inputs);
        // (20 + 24) * 1.14
        assert_eq!(c.labor.get(h.first_operation_period()), dec!(50.16));
        assert_eq!(c.labor.get(1), Decimal::ZERO);
        assert_eq!(c.labor.get(h.last_period()), dec!(50.16));
    }

    #[test]
    fn test_materials_zero_filled_and_summed() {
        let mut inputs = ProjectInputs::default();
        inputs.basic.construction_periods = 1;
        inputs.basic.operation_periods = 4;
        inputs.costs.materials = vec![
            CostCategory { name: "钢材".into(), values: vec![dec!(10), dec!(20)] },
            CostCategory { name: "水泥".into(), values: vec![dec!(5)] },
        ];
        let (_, c) = breakdown(&inputs);
        assert_eq!(c.materials.values(), &[dec!(0), dec!(15), dec!(20), dec!(0), dec!(0)]);
    }

    #[test]
    fn test_total_is_sum_of_six_components() {
        let mut inputs = ProjectInputs::default();
        inputs.investment.building_works = dec!(1090);
        inputs.costs.fuels = vec![CostCategory { name: "电力".into(), values: vec![dec!(3); 17] }];
        let (h, c) = breakdown(&inputs);
        for n in h.periods() {
            let six = c.materials.get(n)
                + c.fuel.get(n)
                + c.labor.get(n)
                + c.repair.get(n)
                + c.depreciation.get(n)
                + c.amortization.get(n);
            assert_eq!(c.total.get(n), six);
        }
        assert_eq!(c.total.get(1), Decimal::ZERO);
        assert!(c.repair.get(4) > Decimal::ZERO);
    }
}
