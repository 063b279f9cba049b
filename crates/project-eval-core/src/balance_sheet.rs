use rust_decimal::Decimal;
use serde::Serialize;

use crate::cost::PeriodCostBreakdown;
use crate::depreciation::{AssetClass, DepreciationResult};
use crate::investment::AssetFormation;
use crate::land_tax::LandTaxSchedule;
use crate::period::{sum_series, PeriodSeries, TimeHorizon};
use crate::profit::{ProfitStatement, RevenueStatement};

/// Period-end balance sheet.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceSheet {
    /// Accumulated cash surplus
    pub cash: PeriodSeries,
    pub construction_in_progress: PeriodSeries,
    pub fixed_assets: PeriodSeries,
    pub intangible_and_other: PeriodSeries,
    /// Net value of disposed assets not yet written off
    pub disposal_stock: PeriodSeries,
    pub input_tax_credit: PeriodSeries,
    pub working_capital: PeriodSeries,
    pub total_assets: PeriodSeries,
    pub loan_balance: PeriodSeries,
    pub paid_in_capital: PeriodSeries,
    pub retained_earnings: PeriodSeries,
    /// Cumulative operating interest, surcharges and land appreciation tax,
    /// which the profit statement does not deduct
    pub unabsorbed_charges: PeriodSeries,
    pub total_equity: PeriodSeries,
    pub total_liabilities_and_equity: PeriodSeries,
    /// `None` where total assets are zero
    pub debt_ratio: Vec<Option<Decimal>>,
}

pub struct BalanceSheetContext<'a> {
    pub horizon: &'a TimeHorizon,
    pub formation: &'a AssetFormation,
    pub depreciation: &'a DepreciationResult,
    pub costs: &'a PeriodCostBreakdown,
    pub revenue: &'a RevenueStatement,
    pub profit: &'a ProfitStatement,
    pub land_tax: &'a LandTaxSchedule,
}

pub fn build_balance_sheet(ctx: &BalanceSheetContext<'_>) -> BalanceSheet {
    let h = ctx.horizon;
    let plan = &ctx.formation.plan;
    let loan = &ctx.formation.loan;
    let operating_cost = ctx.costs.operating_cost();
    let operating_interest = loan.operating_interest(h);

    let cash_in = sum_series(
        h,
        [
            &plan.equity,
            &plan.loan_draws,
            &ctx.revenue.total,
            &ctx.revenue.input_credit_used,
        ],
    );
    let cash_out = sum_series(
        h,
        [
            &plan.construction_investment,
            &loan.interest,
            &plan.working_capital,
            &operating_cost,
            &ctx.revenue.surcharges,
            &ctx.land_tax.tax,
            &ctx.profit.income_tax,
            &loan.principal,
            &ctx.profit.distributable,
        ],
    );
    let cash = cash_in.minus(&cash_out).cumulative();

    let mut construction_in_progress = h.zero_series();
    let capitalized = plan
        .construction_investment
        .plus(&loan.construction_interest_series(h))
        .cumulative();
    for n in 1..h.first_operation_period() {
        construction_in_progress.set(n, capitalized.get(n));
    }

    let fixed_assets = ctx
        .depreciation
        .net_value_of(h, &[AssetClass::Building, AssetClass::Equipment]);
    let intangible_and_other = ctx.depreciation.net_value_of(
        h,
        &[AssetClass::LandUseRight, AssetClass::Patent, AssetClass::Other],
    );
    let disposal_stock = ctx
        .depreciation
        .net_value_of(h, &[AssetClass::DisposedBuilding, AssetClass::DisposedLand]);

    // Input tax sits inside construction in progress until operation starts
    let mut input_tax_credit = h.zero_series();
    for n in h.operation_period_numbers() {
        input_tax_credit.set(n, ctx.revenue.unused_credit.get(n));
    }
    let working_capital = plan.working_capital.cumulative();

    let total_assets = sum_series(
        h,
        [
            &cash,
            &construction_in_progress,
            &fixed_assets,
            &intangible_and_other,
            &disposal_stock,
            &input_tax_credit,
            &working_capital,
        ],
    );

    let loan_balance = loan.closing_balance.clone();
    let paid_in_capital = plan.equity.cumulative();
    let retained_earnings = ctx.profit.retained.clone();
    let unabsorbed_charges = sum_series(
        h,
        [&operating_interest, &ctx.revenue.surcharges, &ctx.land_tax.tax],
    )
    .cumulative()
    .map(|v| -v);
    let total_equity = sum_series(h, [&paid_in_capital, &retained_earnings, &unabsorbed_charges]);
    let total_liabilities_and_equity = loan_balance.plus(&total_equity);

    let debt_ratio = h
        .periods()
        .map(|n| {
            let assets = total_assets.get(n);
            if assets.is_zero() {
                None
            } else {
                Some(loan_balance.get(n) / assets)
            }
        })
        .collect();

    BalanceSheet {
        cash,
        construction_in_progress,
        fixed_assets,
        intangible_and_other,
        disposal_stock,
        input_tax_credit,
        working_capital,
        total_assets,
        loan_balance,
        paid_in_capital,
        retained_earnings,
        unabsorbed_charges,
        total_equity,
        total_liabilities_and_equity,
        debt_ratio,
    }
}
