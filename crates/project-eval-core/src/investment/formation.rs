use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::inputs::{InvestmentCosts, ProjectInputs};
use crate::investment::loan::{build_loan_schedule, LoanSchedule};
use crate::period::{PeriodSeries, TimeHorizon};
use crate::types::{Money, Rate};
use crate::ProjectEvalResult;

/// Plan-table split of each construction period's investment.
pub const ENGINEERING_SPLIT: Rate = dec!(0.7);
pub const OTHER_SPLIT: Rate = dec!(0.2);
pub const RESERVE_SPLIT: Rate = dec!(0.1);

// ---------------------------------------------------------------------------
// Line items
// ---------------------------------------------------------------------------

/// Grouping of a line item in the investment estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CostGroup {
    /// Building and production engineering works
    Engineering,
    /// Management, technical services, supporting facilities
    OtherFixed,
    LandUse,
    Patent,
    Preparation,
}

/// Asset class an engineering line item forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineeringTarget {
    Building,
    Equipment,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineItem {
    pub name: &'static str,
    pub group: CostGroup,
    pub target: Option<EngineeringTarget>,
    pub tax_rate: Rate,
    pub inclusive: Money,
    pub exclusive: Money,
    pub input_tax: Money,
}

impl LineItem {
    fn new(
        name: &'static str,
        group: CostGroup,
        target: Option<EngineeringTarget>,
        tax_rate: Rate,
        inclusive: Money,
    ) -> Self {
        let exclusive = tax_exclusive(inclusive, tax_rate);
        Self {
            name,
            group,
            target,
            tax_rate,
            inclusive,
            exclusive,
            input_tax: inclusive - exclusive,
        }
    }
}

/// Strip embedded VAT: `inclusive / (1 + rate)`.
pub fn tax_exclusive(inclusive: Money, rate: Rate) -> Money {
    inclusive / (Decimal::ONE + rate)
}

pub fn line_items(costs: &InvestmentCosts) -> Vec<LineItem> {
    use CostGroup::*;
    use EngineeringTarget::*;
    let r = &costs.vat_rates;
    vec![
        LineItem::new("建筑工程费", Engineering, Some(Building), r.construction, costs.building_works),
        LineItem::new("建筑设备购置费", Engineering, Some(Building), r.equipment, costs.building_equipment),
        LineItem::new("建筑设备安装费", Engineering, Some(Building), r.construction, costs.building_installation),
        LineItem::new("生产设备购置费", Engineering, Some(Equipment), r.equipment, costs.production_equipment),
        LineItem::new("生产设备安装费", Engineering, Some(Equipment), r.equipment, costs.production_installation),
        LineItem::new("项目管理费", OtherFixed, None, r.service, costs.management_fee),
        LineItem::new("技术服务费", OtherFixed, None, r.service, costs.technical_service_fee),
        LineItem::new("配套设施费", OtherFixed, None, r.construction, costs.supporting_facilities_fee),
        LineItem::new("土地使用费", LandUse, None, r.land, costs.land_use_fee),
        LineItem::new("专利及专有技术费", Patent, None, r.service, costs.patent_fee),
        LineItem::new("生产准备及开办费", Preparation, None, r.construction, costs.preparation_fee),
    ]
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Per-period construction investment plan.
#[derive(Debug, Clone, Serialize)]
pub struct InvestmentPlan {
    /// Static investment (line items + basic reserve) spent in each period
    pub static_investment: PeriodSeries,
    pub escalation_reserve: PeriodSeries,
    /// Static investment + escalation reserve
    pub construction_investment: PeriodSeries,
    pub engineering: PeriodSeries,
    pub other: PeriodSeries,
    pub reserve: PeriodSeries,
    pub loan_draws: PeriodSeries,
    /// Equity put in each period, including construction interest and
    /// working capital
    pub equity: PeriodSeries,
    pub working_capital: PeriodSeries,
}

/// Asset-formation totals. Built once per run and read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct AssetFormation {
    pub line_items: Vec<LineItem>,
    pub engineering_cost: Money,
    pub other_fixed_cost: Money,
    pub basic_reserve: Money,
    pub escalation_reserve: Money,
    pub construction_interest: Money,
    pub building: Money,
    pub equipment: Money,
    pub land_use_right: Money,
    pub patent: Money,
    pub other_asset: Money,
    pub fixed_asset_total: Money,
    pub intangible_total: Money,
    /// Fixed-asset original value without capitalized interest; base for
    /// repair and other expense
    pub fixed_asset_excluding_interest: Money,
    pub deductible_input_tax: Money,
    pub total_inclusive: Money,
    pub working_capital: Money,
    pub total_investment: Money,
    pub total_investment_with_interest: Money,
    pub total_project_investment: Money,
    pub plan: InvestmentPlan,
    pub loan: LoanSchedule,
}

impl AssetFormation {
    pub fn line_item(&self, name: &str) -> Option<&LineItem> {
        self.line_items.iter().find(|item| item.name == name)
    }

    fn sum_exclusive(items: &[LineItem], group: CostGroup) -> Money {
        items
            .iter()
            .filter(|item| item.group == group)
            .map(|item| item.exclusive)
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Convert line items, derive reserves, plan the construction spend, run the
/// loan and allocate everything to the asset classes. Pure: same inputs give
/// the same formation.
pub fn form_assets(horizon: &TimeHorizon, inputs: &ProjectInputs) -> ProjectEvalResult<AssetFormation> {
    let costs = &inputs.investment;
    let items = line_items(costs);

    let engineering_cost = AssetFormation::sum_exclusive(&items, CostGroup::Engineering);
    let other_fixed_cost = AssetFormation::sum_exclusive(&items, CostGroup::OtherFixed);
    let preparation_cost = AssetFormation::sum_exclusive(&items, CostGroup::Preparation);
    let basic_reserve = (engineering_cost + other_fixed_cost + preparation_cost) * costs.basic_reserve_rate;

    let total_inclusive: Money = items.iter().map(|item| item.inclusive).sum();
    let deductible_input_tax: Money = items.iter().map(|item| item.input_tax).sum();

    // ── Construction plan ──
    let static_total = total_inclusive + basic_reserve;
    let shares = period_shares(horizon, costs);
    let mut static_investment = horizon.zero_series();
    let mut escalation = horizon.zero_series();
    let mut escalation_factor = Decimal::ONE;
    let mut allocated = Decimal::ZERO;
    for (i, share) in shares.iter().enumerate() {
        let n = i as u32 + 1;
        // Last period takes the remainder so the plan sums to the total
        let spent = if i + 1 == shares.len() {
            static_total - allocated
        } else {
            static_total * share
        };
        allocated += spent;
        escalation_factor *= Decimal::ONE + costs.escalation_rates.get(i).copied().unwrap_or(Decimal::ZERO);
        static_investment.set(n, spent);
        escalation.set(n, spent * (escalation_factor - Decimal::ONE));
    }
    let escalation_reserve = escalation.sum();
    let construction_investment = static_investment.plus(&escalation);

    let loan_draws = construction_investment.scaled(inputs.loan.loan_share);
    let loan = build_loan_schedule(horizon, &loan_draws, &inputs.loan)?;
    let construction_interest = loan.construction_interest;

    let working_capital = inputs.basic.working_capital;
    let mut wc_series = horizon.zero_series();
    wc_series.set(horizon.first_operation_period(), working_capital);
    let equity = construction_investment
        .minus(&loan_draws)
        .plus(&loan.construction_interest_series(horizon))
        .plus(&wc_series);

    let plan = InvestmentPlan {
        engineering: construction_investment.scaled(ENGINEERING_SPLIT),
        other: construction_investment.scaled(OTHER_SPLIT),
        reserve: construction_investment.scaled(RESERVE_SPLIT),
        static_investment,
        escalation_reserve: escalation,
        construction_investment,
        loan_draws,
        equity,
        working_capital: wc_series,
    };

    // ── Asset classes ──
    let building_direct: Money = items
        .iter()
        .filter(|item| item.target == Some(EngineeringTarget::Building))
        .map(|item| item.exclusive)
        .sum();
    let equipment_direct = engineering_cost - building_direct;

    let shared_without_interest = other_fixed_cost + basic_reserve + escalation_reserve;
    let (building_share, equipment_share) = if engineering_cost.is_zero() {
        (Decimal::ONE, Decimal::ZERO)
    } else {
        let b = building_direct / engineering_cost;
        (b, Decimal::ONE - b)
    };

    let building = building_direct + (shared_without_interest + construction_interest) * building_share;
    let equipment = equipment_direct + (shared_without_interest + construction_interest) * equipment_share;
    let fixed_asset_total = building + equipment;

    let land_use_right = AssetFormation::sum_exclusive(&items, CostGroup::LandUse);
    let patent = AssetFormation::sum_exclusive(&items, CostGroup::Patent);

    let total_investment = total_inclusive + basic_reserve + escalation_reserve;
    let total_investment_with_interest = total_investment + construction_interest;

    Ok(AssetFormation {
        line_items: items,
        engineering_cost,
        other_fixed_cost,
        basic_reserve,
        escalation_reserve,
        construction_interest,
        building,
        equipment,
        land_use_right,
        patent,
        other_asset: preparation_cost,
        fixed_asset_total,
        intangible_total: land_use_right + patent,
        fixed_asset_excluding_interest: fixed_asset_total - construction_interest,
        deductible_input_tax,
        total_inclusive,
        working_capital,
        total_investment,
        total_investment_with_interest,
        total_project_investment: total_investment_with_interest + working_capital,
        plan,
        loan,
    })
}

/// Share of investment per construction period; even split when none given.
fn period_shares(horizon: &TimeHorizon, costs: &InvestmentCosts) -> Vec<Rate> {
    let c = horizon.construction_periods() as usize;
    if costs.period_shares.len() == c {
        costs.period_shares.clone()
    } else {
        vec![Decimal::ONE / Decimal::from(c as u64); c]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::LoanParameters;
    use rust_decimal_macros::dec;

    fn tolerance() -> Decimal {
        dec!(0.000001)
    }

    fn no_loan() -> LoanParameters {
        LoanParameters {
            loan_share: Decimal::ZERO,
            ..LoanParameters::default()
        }
    }

    #[test]
    fn test_tax_exclusive_conversion() {
        assert_eq!(tax_exclusive(dec!(109000), dec!(0.09)), dec!(100000));
        assert_eq!(tax_exclusive(dec!(113), dec!(0.13)), dec!(100));
    }

    #[test]
    fn test_building_original_value_without_loan() {
        let mut inputs = ProjectInputs::default();
        inputs.investment.building_works = dec!(109000);
        inputs.loan = no_loan();
        let h = inputs.horizon().unwrap();
        let f = form_assets(&h, &inputs).unwrap();
        assert_eq!(f.building, dec!(100000));
        assert_eq!(f.equipment, Decimal::ZERO);
        assert_eq!(f.deductible_input_tax, dec!(9000));
        assert_eq!(f.total_investment, dec!(109000));
        assert_eq!(f.construction_interest, Decimal::ZERO);
    }

    #[test]
    fn test_basic_reserve_base() {
        let mut inputs = ProjectInputs::default();
        inputs.investment.building_works = dec!(109);
        inputs.investment.management_fee = dec!(106);
        inputs.investment.preparation_fee = dec!(109);
        inputs.investment.land_use_fee = dec!(500);
        inputs.investment.basic_reserve_rate = dec!(0.10);
        inputs.loan = no_loan();
        let h = inputs.horizon().unwrap();
        let f = form_assets(&h, &inputs).unwrap();
        // (100 + 100 + 100) * 10%, land excluded
        assert_eq!(f.basic_reserve, dec!(30));
        // Shared costs all land on the building when it is the only engineering item
        assert_eq!(f.building, dec!(100) + dec!(100) + dec!(30));
        assert_eq!(f.other_asset, dec!(100));
        assert_eq!(f.land_use_right, dec!(500));
    }

    #[test]
    fn test_shared_costs_split_by_engineering_share() {
        let mut inputs = ProjectInputs::default();
        inputs.investment.building_works = dec!(327);
        inputs.investment.production_equipment = dec!(113);
        inputs.investment.technical_service_fee = dec!(42.4);
        inputs.loan = no_loan();
        let h = inputs.horizon().unwrap();
        let f = form_assets(&h, &inputs).unwrap();
        // Engineering 300 + 100, other fixed 40 split 3:1
        assert!((f.building - dec!(330)).abs() < tolerance());
        assert!((f.equipment - dec!(110)).abs() < tolerance());
        assert!((f.fixed_asset_total - dec!(440)).abs() < tolerance());
    }

    #[test]
    fn test_interest_capitalized_into_fixed_assets() {
        let mut inputs = ProjectInputs::default();
        inputs.basic.construction_periods = 2;
        inputs.investment.building_works = dec!(2000);
        inputs.investment.vat_rates.construction = Decimal::ZERO;
        inputs.loan.interest_rate = dec!(0.10);
        inputs.loan.loan_share = dec!(1);
        let h = inputs.horizon().unwrap();
        let f = form_assets(&h, &inputs).unwrap();
        // Draws 1000 + 1000 -> interest 50 + 150
        assert_eq!(f.construction_interest, dec!(200));
        assert_eq!(f.building, dec!(2200));
        assert_eq!(f.fixed_asset_excluding_interest, dec!(2000));
        assert_eq!(f.total_investment_with_interest, dec!(2200));
        assert_eq!(f.plan.equity.get(1), dec!(50));
        assert_eq!(f.plan.equity.get(2), dec!(150));
    }

    #[test]
    fn test_escalation_reserve_compounds() {
        let mut inputs = ProjectInputs::default();
        inputs.basic.construction_periods = 2;
        inputs.investment.building_works = dec!(200);
        inputs.investment.vat_rates.construction = Decimal::ZERO;
        inputs.investment.escalation_rates = vec![dec!(0.10), dec!(0.10)];
        inputs.loan = no_loan();
        let h = inputs.horizon().unwrap();
        let f = form_assets(&h, &inputs).unwrap();
        // 100 * 0.1 + 100 * 0.21
        assert_eq!(f.plan.escalation_reserve.get(1), dec!(10));
        assert_eq!(f.plan.escalation_reserve.get(2), dec!(21));
        assert_eq!(f.escalation_reserve, dec!(31));
        assert_eq!(f.total_investment, dec!(231));
    }

    #[test]
    fn test_plan_split_and_idempotence() {
        let mut inputs = ProjectInputs::default();
        inputs.investment.building_works = dec!(300);
        let h = inputs.horizon().unwrap();
        let first = form_assets(&h, &inputs).unwrap();
        let second = form_assets(&h, &inputs).unwrap();
        assert_eq!(first.building, second.building);
        assert_eq!(first.construction_interest, second.construction_interest);
        let per_period = first.plan.construction_investment.get(1);
        assert_eq!(first.plan.engineering.get(1), per_period * dec!(0.7));
        assert_eq!(first.plan.construction_investment.sum(), first.total_investment);
    }
}
