//! Cash-flow statements and the metrics computed on them.

use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cost::PeriodCostBreakdown;
use crate::depreciation::{AssetClass, DepreciationResult};
use crate::error::ProjectEvalError;
use crate::investment::AssetFormation;
use crate::land_tax::LandTaxSchedule;
use crate::period::{sum_series, PeriodSeries, TimeHorizon};
use crate::profit::{ProfitStatement, RevenueStatement};
use crate::time_value::{self, Payback};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::ProjectEvalResult;

/// Inflow, outflow, net and cumulative net per period.
#[derive(Debug, Clone, Serialize)]
pub struct CashFlowLine {
    pub inflow: PeriodSeries,
    pub outflow: PeriodSeries,
    pub net: PeriodSeries,
    pub cumulative: PeriodSeries,
}

impl CashFlowLine {
    pub fn new(inflow: PeriodSeries, outflow: PeriodSeries) -> Self {
        let net = inflow.minus(&outflow);
        let cumulative = net.cumulative();
        Self {
            inflow,
            outflow,
            net,
            cumulative,
        }
    }
}

/// NPV, IRR and payback on one net flow series. Each is `None` when it
/// cannot be computed.
#[derive(Debug, Clone, Serialize)]
pub struct CashFlowMetrics {
    pub npv: Option<Money>,
    pub irr: Option<Rate>,
    pub payback: Payback,
    pub payback_interpolated: Option<Decimal>,
}

/// Initial IRR guess; the discount rate is usually close.
const IRR_GUESS: Rate = dec!(0.1);

/// Evaluate a flow series, recording a warning for every metric that is
/// unavailable.
pub fn evaluate(name: &str, flows: &[Money], rate: Rate, warnings: &mut Vec<String>) -> CashFlowMetrics {
    let npv = match time_value::npv(rate, flows) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(target: "project_eval::metrics", series = name, error = %e, "NPV unavailable");
            warnings.push(format!("{name}: NPV unavailable ({e})"));
            None
        }
    };
    let irr = match time_value::irr(flows, IRR_GUESS) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(target: "project_eval::metrics", series = name, error = %e, "IRR unavailable");
            warnings.push(format!("{name}: IRR unavailable ({e})"));
            None
        }
    };
    let payback = time_value::payback_period(&time_value::cumulative(flows));
    if payback == Payback::NotRecovered {
        warn!(target: "project_eval::metrics", series = name, "investment not recovered within the horizon");
        warnings.push(format!("{name}: investment not recovered within the horizon"));
    }
    CashFlowMetrics {
        npv,
        irr,
        payback,
        payback_interpolated: time_value::payback_period_interpolated(flows),
    }
}

/// An ad-hoc net flow series, one value per period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesInput {
    pub cash_flows: Vec<Money>,
    #[serde(default = "default_discount_rate")]
    pub discount_rate: Rate,
}

fn default_discount_rate() -> Rate {
    dec!(0.06)
}

/// NPV, IRR and payback of a standalone series, outside a full projection.
pub fn analyze_series(input: &SeriesInput) -> ProjectEvalResult<ComputationOutput<CashFlowMetrics>> {
    let start = Instant::now();
    if input.cash_flows.is_empty() {
        return Err(ProjectEvalError::InsufficientData(
            "at least one cash flow is required".into(),
        ));
    }
    if input.discount_rate <= dec!(-1) {
        return Err(ProjectEvalError::invalid("discount_rate", "must be greater than -1"));
    }

    let mut warnings = Vec::new();
    let metrics = evaluate("cash_flows", &input.cash_flows, input.discount_rate, &mut warnings);
    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Discounted cash flow metrics (NPV, IRR by Newton-Raphson with bisection fallback, static payback)",
        input,
        warnings,
        elapsed,
        metrics,
    ))
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// Project investment cash flow, before and after income tax.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectCashFlow {
    pub sales: PeriodSeries,
    pub disposal_revenue: PeriodSeries,
    pub residual_value: PeriodSeries,
    pub working_capital_recovery: PeriodSeries,
    pub construction_investment: PeriodSeries,
    pub working_capital: PeriodSeries,
    pub operating_cost: PeriodSeries,
    pub surcharges: PeriodSeries,
    pub land_tax: PeriodSeries,
    pub pre_tax: CashFlowLine,
    pub income_tax: PeriodSeries,
    pub post_tax_net: PeriodSeries,
    pub post_tax_cumulative: PeriodSeries,
}

#[derive(Debug, Clone, Serialize)]
pub struct EquityCashFlow {
    pub equity_capital: PeriodSeries,
    pub principal: PeriodSeries,
    pub interest: PeriodSeries,
    pub line: CashFlowLine,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvestorCashFlow {
    pub distributed_profit: PeriodSeries,
    pub residual_distribution: PeriodSeries,
    pub paid_in_capital: PeriodSeries,
    pub line: CashFlowLine,
}

#[derive(Debug, Clone, Serialize)]
pub struct CashFlowStatements {
    /// Construction investment out, revenue in, cash operating cost out
    pub finance: CashFlowLine,
    pub project: ProjectCashFlow,
    pub equity: EquityCashFlow,
    pub investor: InvestorCashFlow,
}

pub struct CashFlowContext<'a> {
    pub horizon: &'a TimeHorizon,
    pub formation: &'a AssetFormation,
    pub depreciation: &'a DepreciationResult,
    pub costs: &'a PeriodCostBreakdown,
    pub revenue: &'a RevenueStatement,
    pub profit: &'a ProfitStatement,
    pub land_tax: &'a LandTaxSchedule,
}

pub fn build_cash_flows(ctx: &CashFlowContext<'_>) -> CashFlowStatements {
    let h = ctx.horizon;
    let last = h.last_period();
    let plan = &ctx.formation.plan;
    let operating_cost = ctx.costs.operating_cost();

    // ── Finance cash flow ──
    let finance = CashFlowLine::new(
        ctx.revenue.total.clone(),
        plan.construction_investment.plus(&operating_cost),
    );

    // ── Project investment cash flow ──
    let fixed_net = ctx
        .depreciation
        .net_value_of(h, &[AssetClass::Building, AssetClass::Equipment]);
    let mut residual_value = h.zero_series();
    residual_value.set(last, fixed_net.get(last));
    let mut working_capital_recovery = h.zero_series();
    working_capital_recovery.set(last, ctx.formation.working_capital);

    let inflow = sum_series(
        h,
        [
            &ctx.revenue.sales,
            &ctx.revenue.disposal,
            &residual_value,
            &working_capital_recovery,
        ],
    );
    let outflow = sum_series(
        h,
        [
            &plan.construction_investment,
            &plan.working_capital,
            &operating_cost,
            &ctx.revenue.surcharges,
            &ctx.land_tax.tax,
        ],
    );
    let pre_tax = CashFlowLine::new(inflow.clone(), outflow);
    let post_tax_net = pre_tax.net.minus(&ctx.profit.income_tax);
    let project = ProjectCashFlow {
        sales: ctx.revenue.sales.clone(),
        disposal_revenue: ctx.revenue.disposal.clone(),
        residual_value: residual_value.clone(),
        working_capital_recovery: working_capital_recovery.clone(),
        construction_investment: plan.construction_investment.clone(),
        working_capital: plan.working_capital.clone(),
        operating_cost: operating_cost.clone(),
        surcharges: ctx.revenue.surcharges.clone(),
        land_tax: ctx.land_tax.tax.clone(),
        pre_tax,
        income_tax: ctx.profit.income_tax.clone(),
        post_tax_cumulative: post_tax_net.cumulative(),
        post_tax_net,
    };

    // ── Equity cash flow ──
    let loan = &ctx.formation.loan;
    let operating_interest = loan.operating_interest(h);
    let equity_outflow = sum_series(
        h,
        [
            &plan.equity,
            &loan.principal,
            &operating_interest,
            &operating_cost,
            &ctx.revenue.surcharges,
            &ctx.land_tax.tax,
            &ctx.profit.income_tax,
        ],
    );
    let equity = EquityCashFlow {
        equity_capital: plan.equity.clone(),
        principal: loan.principal.clone(),
        interest: operating_interest,
        line: CashFlowLine::new(inflow, equity_outflow),
    };

    // ── Investor cash flow ──
    let mut residual_distribution = h.zero_series();
    let recoverable = residual_value.get(last) + working_capital_recovery.get(last) - loan.ending_balance(h);
    residual_distribution.set(last, recoverable.max(Decimal::ZERO));
    let investor = InvestorCashFlow {
        distributed_profit: ctx.profit.distributable.clone(),
        residual_distribution: residual_distribution.clone(),
        paid_in_capital: plan.equity.clone(),
        line: CashFlowLine::new(
            ctx.profit.distributable.plus(&residual_distribution),
            plan.equity.clone(),
        ),
    };

    CashFlowStatements {
        finance,
        project,
        equity,
        investor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cash_flow_line_cumulative() {
        let h = TimeHorizon::new(1, 2).unwrap();
        let mut inflow = h.zero_series();
        inflow.set(2, dec!(80));
        inflow.set(3, dec!(80));
        let mut outflow = h.zero_series();
        outflow.set(1, dec!(100));
        let line = CashFlowLine::new(inflow, outflow);
        assert_eq!(line.net.values(), &[dec!(-100), dec!(80), dec!(80)]);
        assert_eq!(line.cumulative.get(3), line.net.sum());
    }

    #[test]
    fn test_evaluate_reports_unavailable_irr() {
        let mut warnings = Vec::new();
        let m = evaluate("test", &[dec!(-100), dec!(-10)], dec!(0.06), &mut warnings);
        assert!(m.npv.is_some());
        assert!(m.irr.is_none());
        assert_eq!(m.payback, Payback::NotRecovered);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_evaluate_good_series() {
        let mut warnings = Vec::new();
        let m = evaluate("test", &[dec!(-1000), dec!(400), dec!(400), dec!(400)], dec!(0.0), &mut warnings);
        assert_eq!(m.npv, Some(dec!(200)));
        assert!(m.irr.is_some());
        assert_eq!(m.payback, Payback::Recovered(4));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_analyze_series_envelope() {
        let input: SeriesInput = serde_json::from_str(r#"{"cash_flows": ["-100", "-10"]}"#).unwrap();
        assert_eq!(input.discount_rate, dec!(0.06));
        let out = analyze_series(&input).unwrap();
        assert!(out.result.irr.is_none());
        assert_eq!(out.warnings.len(), 2);

        let empty = SeriesInput {
            cash_flows: vec![],
            discount_rate: dec!(0.06),
        };
        assert!(analyze_series(&empty).is_err());
    }
}
