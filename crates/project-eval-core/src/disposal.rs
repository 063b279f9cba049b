use rust_decimal::Decimal;
use serde::Serialize;

use crate::inputs::DisposalPlan;
use crate::investment::AssetFormation;
use crate::period::{PeriodSeries, TimeHorizon};
use crate::types::{Money, Rate};

/// Disposal totals and their apportionment over operation periods.
#[derive(Debug, Clone, Serialize)]
pub struct DisposalSchedule {
    /// Building original value sold
    pub building_cost: Money,
    /// Land-use right original value sold
    pub land_cost: Money,
    /// `building_cost * markup`
    pub revenue_total: Money,
    /// Apportionment ratio applied in each period
    pub ratios: PeriodSeries,
    pub revenue: PeriodSeries,
    pub cost: PeriodSeries,
    pub land_amortization: PeriodSeries,
    /// Selling expense on disposal revenue
    pub sales_expense: PeriodSeries,
}

impl DisposalSchedule {
    /// Total cost of everything sold, building and land.
    pub fn total_cost(&self) -> Money {
        self.building_cost + self.land_cost
    }
}

/// Spread `total` over operation periods starting at the first one. Ratios
/// past the end of the horizon are dropped (validation reports them).
pub fn apportion(horizon: &TimeHorizon, total: Money, ratios: &[Rate]) -> PeriodSeries {
    let mut series = horizon.zero_series();
    let first = horizon.first_operation_period();
    for (i, ratio) in ratios.iter().enumerate() {
        let n = first + i as u32;
        if horizon.is_operation(n) {
            series.set(n, total * ratio);
        }
    }
    series
}

pub fn calculate_disposal(
    horizon: &TimeHorizon,
    formation: &AssetFormation,
    plan: &DisposalPlan,
    sales_expense_rate: Rate,
) -> DisposalSchedule {
    let ratios = plan.apportionment_ratios();

    let building_cost = formation.building * plan.building_ratio;
    let land_cost = formation.land_use_right * plan.land_ratio;
    let revenue_total = building_cost * plan.markup;

    let revenue = apportion(horizon, revenue_total, &ratios);
    let sales_expense = revenue.scaled(sales_expense_rate);

    DisposalSchedule {
        building_cost,
        land_cost,
        revenue_total,
        ratios: apportion(horizon, Decimal::ONE, &ratios),
        cost: apportion(horizon, building_cost, &ratios),
        land_amortization: apportion(horizon, land_cost, &ratios),
        revenue,
        sales_expense,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::ProjectInputs;
    use crate::investment::form_assets;
    use rust_decimal_macros::dec;

    fn formation_with_building(inputs: &mut ProjectInputs) -> (TimeHorizon, AssetFormation) {
        inputs.investment.building_works = dec!(109000);
        inputs.loan.loan_share = Decimal::ZERO;
        let h = inputs.horizon().unwrap();
        let f = form_assets(&h, inputs).unwrap();
        (h, f)
    }

    #[test]
    fn test_disposal_cost_and_revenue() {
        let mut inputs = ProjectInputs::default();
        let (h, f) = formation_with_building(&mut inputs);
        let d = calculate_disposal(&h, &f, &inputs.disposal, dec!(0.02));
        assert_eq!(d.building_cost, dec!(25000));
        assert_eq!(d.revenue_total, dec!(62500));
        // Periods 4 and 5 are the first two operation periods
        assert_eq!(d.cost.get(4), dec!(2500));
        assert_eq!(d.cost.get(5), dec!(7500));
        assert_eq!(d.cost.get(8), Decimal::ZERO);
        assert_eq!(d.cost.get(3), Decimal::ZERO);
        assert_eq!(d.sales_expense.get(4), dec!(125));
    }

    #[test]
    fn test_default_apportionment_reconciles() {
        let mut inputs = ProjectInputs::default();
        let (h, f) = formation_with_building(&mut inputs);
        let d = calculate_disposal(&h, &f, &inputs.disposal, Decimal::ZERO);
        let first_four: Decimal = (4..=7).map(|n| d.cost.get(n)).sum();
        assert!((first_four - d.building_cost).abs() < dec!(0.000001));
        assert!((d.revenue.sum() - d.revenue_total).abs() < dec!(0.000001));
    }

    #[test]
    fn test_apportion_drops_ratios_past_horizon() {
        let h = TimeHorizon::new(1, 2).unwrap();
        let s = apportion(&h, dec!(100), &[dec!(0.5), dec!(0.25), dec!(0.25)]);
        assert_eq!(s.values(), &[dec!(0), dec!(50), dec!(25)]);
    }
}
