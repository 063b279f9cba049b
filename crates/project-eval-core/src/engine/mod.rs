//! Runs the calculators in dependency order and assembles the named tables.
//!
//! Every call builds its own state from the inputs; nothing is cached
//! between runs.

mod tables;

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::balance_sheet::{build_balance_sheet, BalanceSheet, BalanceSheetContext};
use crate::cash_flow::{build_cash_flows, evaluate, CashFlowContext, CashFlowMetrics, CashFlowStatements};
use crate::cost::{aggregate_costs, PeriodCostBreakdown};
use crate::depreciation::{calculate_depreciation, DepreciationResult};
use crate::disposal::{calculate_disposal, DisposalSchedule};
use crate::inputs::ProjectInputs;
use crate::investment::{form_assets, AssetFormation};
use crate::land_tax::{calculate_land_tax, LandTaxSchedule};
use crate::period::TimeHorizon;
use crate::profit::{calculate_profit, calculate_revenue, policy_for, ProfitStatement, RevenueStatement};
use crate::table::ResultSet;
use crate::types::{with_metadata, ComputationOutput, Rate};
use crate::ProjectEvalResult;

pub const INVESTMENT_ESTIMATE: &str = "1建设投资";
pub const WORKING_CAPITAL: &str = "2流动资金";
pub const INVESTMENT_PLAN: &str = "3投资计划";
pub const LOAN_REPAYMENT: &str = "4还本付息";
pub const DEPRECIATION: &str = "5-4折旧";
pub const AMORTIZATION: &str = "5-5摊销";
pub const MATERIAL_COST: &str = "5-1材料";
pub const FUEL_COST: &str = "5-2燃料";
pub const LABOR_COST: &str = "5-3工资";
pub const TOTAL_COST: &str = "5总成本";
pub const REVENUE: &str = "6收入";
pub const PROFIT: &str = "7利润";
pub const FINANCE_CASH_FLOW: &str = "8财务现金";
pub const BALANCE_SHEET: &str = "9资产负债";
pub const PROJECT_CASH_FLOW: &str = "10项目现金";
pub const EQUITY_CASH_FLOW: &str = "11资本金现金";
pub const INVESTOR_CASH_FLOW: &str = "12各方现金";
pub const FINANCIAL_SUMMARY: &str = "财务分析结果汇总";
pub const LAND_TAX: &str = "土地增值税计算";
pub const PROPERTY_SALE: &str = "房产销售及土增";
pub const DISPOSAL_PLAN: &str = "资产销售计划";

/// Table names in output order.
pub const TABLE_NAMES: [&str; 21] = [
    INVESTMENT_ESTIMATE,
    WORKING_CAPITAL,
    INVESTMENT_PLAN,
    LOAN_REPAYMENT,
    DEPRECIATION,
    AMORTIZATION,
    MATERIAL_COST,
    FUEL_COST,
    LABOR_COST,
    TOTAL_COST,
    REVENUE,
    PROFIT,
    FINANCE_CASH_FLOW,
    BALANCE_SHEET,
    PROJECT_CASH_FLOW,
    EQUITY_CASH_FLOW,
    INVESTOR_CASH_FLOW,
    FINANCIAL_SUMMARY,
    LAND_TAX,
    PROPERTY_SALE,
    DISPOSAL_PLAN,
];

/// Headline metrics of the run.
#[derive(Debug, Clone, Serialize)]
pub struct FinancialIndicators {
    /// On the finance cash flow
    pub finance: CashFlowMetrics,
    /// On the post-tax project investment cash flow
    pub project_post_tax: CashFlowMetrics,
    pub project_pre_tax: CashFlowMetrics,
    pub equity: CashFlowMetrics,
    pub investor: CashFlowMetrics,
}

/// Every intermediate result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct Projection {
    pub horizon: TimeHorizon,
    pub formation: AssetFormation,
    pub disposal: DisposalSchedule,
    pub depreciation: DepreciationResult,
    pub costs: PeriodCostBreakdown,
    pub revenue: RevenueStatement,
    pub profit: ProfitStatement,
    pub land_tax: LandTaxSchedule,
    pub cash_flows: CashFlowStatements,
    pub balance_sheet: BalanceSheet,
    pub indicators: FinancialIndicators,
    pub discount_rate: Rate,
    pub warnings: Vec<String>,
}

/// Validate the inputs and run every calculator in order.
pub fn project(inputs: &ProjectInputs) -> ProjectEvalResult<Projection> {
    let (horizon, mut warnings) = inputs.validate()?;
    debug!(
        target: "project_eval::engine",
        construction = horizon.construction_periods(),
        operation = horizon.operation_periods(),
        "inputs validated"
    );

    // ── Investment and asset formation ──
    let formation = form_assets(&horizon, inputs)?;
    debug!(
        target: "project_eval::engine",
        total_investment = %formation.total_investment,
        construction_interest = %formation.construction_interest,
        fixed_assets = %formation.fixed_asset_total,
        input_tax = %formation.deductible_input_tax,
        "assets formed"
    );

    // ── Disposal ──
    let disposal = calculate_disposal(&horizon, &formation, &inputs.disposal, inputs.costs.sales_expense_rate);
    debug!(
        target: "project_eval::engine",
        disposal_cost = %disposal.total_cost(),
        disposal_revenue = %disposal.revenue_total,
        "disposal apportioned"
    );

    // ── Depreciation and amortization ──
    let depreciation = calculate_depreciation(&horizon, inputs, &formation, &disposal);
    debug!(
        target: "project_eval::engine",
        depreciation = %depreciation.depreciation.sum(),
        amortization = %depreciation.amortization.sum(),
        "schedules built"
    );

    // ── Cost ──
    let costs = aggregate_costs(&horizon, &inputs.costs, &formation, &depreciation);
    debug!(target: "project_eval::engine", total_cost = %costs.total.sum(), "costs aggregated");

    // ── Revenue, tax and profit ──
    let revenue = calculate_revenue(&horizon, inputs, &formation, &disposal);
    let policy = policy_for(&inputs.tax);
    let profit = calculate_profit(&horizon, &inputs.tax, &revenue, &costs, policy.as_ref());
    debug!(
        target: "project_eval::engine",
        policy = policy.name(),
        revenue = %revenue.total.sum(),
        net_profit = %profit.net_profit.sum(),
        "profit computed"
    );
    let land_tax = calculate_land_tax(&horizon, &disposal, &inputs.tax);

    // ── Cash flow and metrics ──
    let cash_flows = build_cash_flows(&CashFlowContext {
        horizon: &horizon,
        formation: &formation,
        depreciation: &depreciation,
        costs: &costs,
        revenue: &revenue,
        profit: &profit,
        land_tax: &land_tax,
    });
    let balance_sheet = build_balance_sheet(&BalanceSheetContext {
        horizon: &horizon,
        formation: &formation,
        depreciation: &depreciation,
        costs: &costs,
        revenue: &revenue,
        profit: &profit,
        land_tax: &land_tax,
    });

    let rate = inputs.tax.discount_rate;
    let indicators = FinancialIndicators {
        finance: evaluate(FINANCE_CASH_FLOW, cash_flows.finance.net.values(), rate, &mut warnings),
        project_post_tax: evaluate(
            "项目投资（所得税后）",
            cash_flows.project.post_tax_net.values(),
            rate,
            &mut warnings,
        ),
        project_pre_tax: evaluate(
            "项目投资（所得税前）",
            cash_flows.project.pre_tax.net.values(),
            rate,
            &mut warnings,
        ),
        equity: evaluate(EQUITY_CASH_FLOW, cash_flows.equity.line.net.values(), rate, &mut warnings),
        investor: evaluate(INVESTOR_CASH_FLOW, cash_flows.investor.line.net.values(), rate, &mut warnings),
    };
    debug!(
        target: "project_eval::engine",
        npv = ?indicators.finance.npv,
        irr = ?indicators.finance.irr,
        payback = ?indicators.finance.payback,
        "metrics evaluated"
    );

    Ok(Projection {
        horizon,
        formation,
        disposal,
        depreciation,
        costs,
        revenue,
        profit,
        land_tax,
        cash_flows,
        balance_sheet,
        indicators,
        discount_rate: rate,
        warnings,
    })
}

/// Single entry point: validate, calculate and return every named table.
pub fn run_all_calculations(inputs: &ProjectInputs) -> ProjectEvalResult<ComputationOutput<ResultSet>> {
    let start = Instant::now();
    let projection = project(inputs)?;
    let result = tables::build_tables(&projection)?;
    let elapsed = start.elapsed().as_micros() as u64;

    info!(
        target: "project_eval::engine",
        project = %inputs.basic.project_name,
        tables = result.len(),
        warnings = projection.warnings.len(),
        elapsed_us = elapsed,
        "projection complete"
    );

    Ok(with_metadata(
        "Construction-project economic evaluation (straight-line depreciation, average-balance construction interest, discounted cash flow)",
        inputs,
        projection.warnings,
        elapsed,
        result,
    ))
}
