use rust_decimal::Decimal;

use crate::depreciation::AssetSchedule;
use crate::inputs::{FUEL_TOTAL_LABEL, MATERIAL_TOTAL_LABEL};
use crate::investment::CostGroup;
use crate::period::{PeriodSeries, TimeHorizon};
use crate::table::{Cell, ResultSet, ResultTable};
use crate::time_value::Payback;
use crate::types::Money;
use crate::ProjectEvalResult;

use super::*;

const NOT_RECOVERED: &str = "未回收";

pub(super) fn build_tables(p: &Projection) -> ProjectEvalResult<ResultSet> {
    let mut set = ResultSet::new();
    set.insert(investment_estimate(p)?);
    set.insert(working_capital(p)?);
    set.insert(investment_plan(p)?);
    set.insert(loan_repayment(p)?);
    set.insert(schedule_table(DEPRECIATION, "折旧费", &p.horizon, p.depreciation.depreciable())?);
    set.insert(schedule_table(AMORTIZATION, "摊销费", &p.horizon, p.depreciation.amortizable())?);
    set.insert(material_cost(p)?);
    set.insert(fuel_cost(p)?);
    set.insert(labor_cost(p)?);
    set.insert(total_cost(p)?);
    set.insert(revenue(p)?);
    set.insert(profit(p)?);
    set.insert(finance_cash_flow(p)?);
    set.insert(balance_sheet(p)?);
    set.insert(project_cash_flow(p)?);
    set.insert(equity_cash_flow(p)?);
    set.insert(investor_cash_flow(p)?);
    set.insert(financial_summary(p)?);
    set.insert(land_tax(p)?);
    set.insert(property_sale(p)?);
    set.insert(disposal_plan(p)?);
    Ok(set)
}

fn periodic(name: &str, horizon: &TimeHorizon, rows: &[(&str, &PeriodSeries)]) -> ProjectEvalResult<ResultTable> {
    let mut table = ResultTable::periodic(name, horizon);
    for (label, series) in rows {
        table.push_series(label, series)?;
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Investment
// ---------------------------------------------------------------------------

fn investment_estimate(p: &Projection) -> ProjectEvalResult<ResultTable> {
    let f = &p.formation;
    let mut table = ResultTable::with_columns(
        INVESTMENT_ESTIMATE,
        vec!["含税金额".into(), "不含税金额".into(), "进项税额".into()],
    );
    let amounts = |incl: Money, excl: Money| vec![Cell::Value(incl), Cell::Value(excl), Cell::Value(incl - excl)];

    for item in &f.line_items {
        table.push_row(item.name, amounts(item.inclusive, item.exclusive))?;
    }
    let subtotal = |groups: &[CostGroup]| -> (Money, Money) {
        f.line_items
            .iter()
            .filter(|i| groups.contains(&i.group))
            .fold((Decimal::ZERO, Decimal::ZERO), |(a, b), i| (a + i.inclusive, b + i.exclusive))
    };
    let (eng_incl, eng_excl) = subtotal(&[CostGroup::Engineering]);
    table.push_row("工程费小计", amounts(eng_incl, eng_excl))?;
    let (other_incl, other_excl) = subtotal(&[
        CostGroup::OtherFixed,
        CostGroup::LandUse,
        CostGroup::Patent,
        CostGroup::Preparation,
    ]);
    table.push_row("工程建设其他费小计", amounts(other_incl, other_excl))?;
    table.push_row("基本预备费", amounts(f.basic_reserve, f.basic_reserve))?;
    table.push_row("涨价预备费", amounts(f.escalation_reserve, f.escalation_reserve))?;
    table.push_row(
        "建设投资合计",
        amounts(f.total_investment, f.total_investment - f.deductible_input_tax),
    )?;
    table.push_row("建设期利息", amounts(f.construction_interest, f.construction_interest))?;
    table.push_row("流动资金", amounts(f.working_capital, f.working_capital))?;
    table.push_row(
        "项目总投资",
        amounts(f.total_project_investment, f.total_project_investment - f.deductible_input_tax),
    )?;

    let formed = |value: Money| vec![Cell::Text("-".into()), Cell::Value(value), Cell::Text("-".into())];
    table.push_row("形成固定资产（房屋建筑物）", formed(f.building))?;
    table.push_row("形成固定资产（机器设备）", formed(f.equipment))?;
    table.push_row("形成无形资产（土地使用权）", formed(f.land_use_right))?;
    table.push_row("形成无形资产（专利及专有技术）", formed(f.patent))?;
    table.push_row("形成其他资产", formed(f.other_asset))?;
    Ok(table)
}

fn working_capital(p: &Projection) -> ProjectEvalResult<ResultTable> {
    let plan = &p.formation.plan;
    periodic(
        WORKING_CAPITAL,
        &p.horizon,
        &[
            ("流动资金占用", &plan.working_capital.cumulative()),
            ("流动资金增加额", &plan.working_capital),
            ("流动资金回收", &p.cash_flows.project.working_capital_recovery),
        ],
    )
}

fn investment_plan(p: &Projection) -> ProjectEvalResult<ResultTable> {
    let plan = &p.formation.plan;
    let interest = p.formation.loan.construction_interest_series(&p.horizon);
    let total = plan.construction_investment.plus(&interest).plus(&plan.working_capital);
    periodic(
        INVESTMENT_PLAN,
        &p.horizon,
        &[
            ("工程费", &plan.engineering),
            ("其他费", &plan.other),
            ("预备费", &plan.reserve),
            ("建设投资", &plan.construction_investment),
            ("其中：静态投资", &plan.static_investment),
            ("其中：涨价预备费", &plan.escalation_reserve),
            ("建设期利息", &interest),
            ("流动资金", &plan.working_capital),
            ("总投资", &total),
            ("借款", &plan.loan_draws),
            ("项目资本金", &plan.equity),
        ],
    )
}

fn loan_repayment(p: &Projection) -> ProjectEvalResult<ResultTable> {
    let loan = &p.formation.loan;
    periodic(
        LOAN_REPAYMENT,
        &p.horizon,
        &[
            ("期初借款余额", &loan.opening_balance),
            ("当期借款", &loan.draws),
            ("当期应计利息", &loan.interest),
            ("当期还本付息", &loan.payment),
            ("其中：还本", &loan.principal),
            ("付息", &loan.interest),
            ("期末借款余额", &loan.closing_balance),
        ],
    )
}

// ---------------------------------------------------------------------------
// Depreciation and cost
// ---------------------------------------------------------------------------

fn schedule_table<'a>(
    name: &str,
    charge_label: &str,
    horizon: &TimeHorizon,
    schedules: impl Iterator<Item = &'a AssetSchedule>,
) -> ProjectEvalResult<ResultTable> {
    let mut table = ResultTable::periodic(name, horizon);
    let mut original = horizon.zero_series();
    let mut charge = horizon.zero_series();
    let mut net = horizon.zero_series();
    for s in schedules {
        let label = s.class.label();
        table.push_series(&format!("{label}原值"), &s.original_value)?;
        table.push_series(&format!("{label}{charge_label}"), &s.charge)?;
        table.push_series(&format!("{label}净值"), &s.net_value)?;
        original = original.plus(&s.original_value);
        charge = charge.plus(&s.charge);
        net = net.plus(&s.net_value);
    }
    table.push_series("原值合计", &original)?;
    table.push_series(&format!("{charge_label}合计"), &charge)?;
    table.push_series("净值合计", &net)?;
    Ok(table)
}

fn material_cost(p: &Projection) -> ProjectEvalResult<ResultTable> {
    let mut table = ResultTable::periodic(MATERIAL_COST, &p.horizon);
    for line in &p.costs.material_lines {
        table.push_series(&line.name, &line.values)?;
    }
    table.push_series(MATERIAL_TOTAL_LABEL, &p.costs.materials)?;
    Ok(table)
}

fn fuel_cost(p: &Projection) -> ProjectEvalResult<ResultTable> {
    let mut table = ResultTable::periodic(FUEL_COST, &p.horizon);
    for line in &p.costs.fuel_lines {
        table.push_series(&line.name, &line.values)?;
    }
    table.push_series(FUEL_TOTAL_LABEL, &p.costs.fuel)?;
    Ok(table)
}

fn labor_cost(p: &Projection) -> ProjectEvalResult<ResultTable> {
    let h = &p.horizon;
    let mut table = ResultTable::periodic(LABOR_COST, h);
    for line in &p.costs.labor_lines {
        table.push_series(&format!("{}人数", line.role), &h.operation_constant(Decimal::from(line.headcount)))?;
        table.push_series(&format!("{}工资", line.role), &h.operation_constant(line.wages))?;
    }
    table.push_series("工资合计", &h.operation_constant(p.costs.wages))?;
    table.push_series("福利费", &h.operation_constant(p.costs.welfare))?;
    table.push_series("工资及福利费合计", &p.costs.labor)?;
    Ok(table)
}

fn total_cost(p: &Projection) -> ProjectEvalResult<ResultTable> {
    let c = &p.costs;
    periodic(
        TOTAL_COST,
        &p.horizon,
        &[
            ("外购原材料费", &c.materials),
            ("外购燃料及动力费", &c.fuel),
            ("工资及福利费", &c.labor),
            ("修理费", &c.repair_only),
            ("其他费用", &c.other_expense),
            ("折旧费", &c.depreciation),
            ("摊销费", &c.amortization),
            ("总成本费用", &c.total),
            ("经营成本", &c.operating_cost()),
        ],
    )
}

// ---------------------------------------------------------------------------
// Revenue and profit
// ---------------------------------------------------------------------------

fn revenue(p: &Projection) -> ProjectEvalResult<ResultTable> {
    let r = &p.revenue;
    periodic(
        REVENUE,
        &p.horizon,
        &[
            ("产品销售收入", &r.sales),
            ("资产处置收入", &r.disposal),
            ("营业收入合计", &r.total),
            ("销项税额", &r.output_vat),
            ("进项税抵扣", &r.input_credit_used),
            ("应纳增值税", &r.vat_payable),
            ("城市维护建设税", &r.city_maintenance),
            ("教育费附加", &r.education_surcharge),
            ("税金及附加合计", &r.surcharges),
            ("未抵扣进项税余额", &r.unused_credit),
        ],
    )
}

fn profit(p: &Projection) -> ProjectEvalResult<ResultTable> {
    let s = &p.profit;
    periodic(
        PROFIT,
        &p.horizon,
        &[
            ("营业收入", &s.revenue),
            ("总成本费用", &s.total_cost),
            ("利润总额", &s.gross_profit),
            ("弥补以前年度亏损", &s.loss_offset),
            ("应纳税所得额", &s.taxable_income),
            ("所得税", &s.income_tax),
            ("净利润", &s.net_profit),
            ("法定盈余公积金", &s.surplus_reserve),
            ("可供投资者分配利润", &s.distributable),
            ("累计留存收益", &s.retained),
        ],
    )
}

// ---------------------------------------------------------------------------
// Cash flow and balance sheet
// ---------------------------------------------------------------------------

fn finance_cash_flow(p: &Projection) -> ProjectEvalResult<ResultTable> {
    let f = &p.cash_flows.finance;
    periodic(
        FINANCE_CASH_FLOW,
        &p.horizon,
        &[
            ("现金流入", &f.inflow),
            ("现金流出", &f.outflow),
            ("净现金流量", &f.net),
            ("累计净现金流量", &f.cumulative),
        ],
    )
}

fn balance_sheet(p: &Projection) -> ProjectEvalResult<ResultTable> {
    let b = &p.balance_sheet;
    let mut table = periodic(
        BALANCE_SHEET,
        &p.horizon,
        &[
            ("货币资金", &b.cash),
            ("在建工程", &b.construction_in_progress),
            ("固定资产净值", &b.fixed_assets),
            ("无形及其他资产净值", &b.intangible_and_other),
            ("待售资产净值", &b.disposal_stock),
            ("待抵扣进项税", &b.input_tax_credit),
            ("流动资金", &b.working_capital),
            ("资产合计", &b.total_assets),
            ("建设投资借款", &b.loan_balance),
            ("负债合计", &b.loan_balance),
            ("实收资本", &b.paid_in_capital),
            ("留存收益", &b.retained_earnings),
            ("未计入成本的利息及税费", &b.unabsorbed_charges),
            ("所有者权益合计", &b.total_equity),
            ("负债及所有者权益合计", &b.total_liabilities_and_equity),
        ],
    )?;
    table.push_row(
        "资产负债率",
        b.debt_ratio.iter().map(|r| Cell::from(*r)).collect(),
    )?;
    Ok(table)
}

fn project_cash_flow(p: &Projection) -> ProjectEvalResult<ResultTable> {
    let c = &p.cash_flows.project;
    periodic(
        PROJECT_CASH_FLOW,
        &p.horizon,
        &[
            ("产品销售收入", &c.sales),
            ("资产处置收入", &c.disposal_revenue),
            ("回收固定资产余值", &c.residual_value),
            ("回收流动资金", &c.working_capital_recovery),
            ("现金流入", &c.pre_tax.inflow),
            ("建设投资", &c.construction_investment),
            ("流动资金", &c.working_capital),
            ("经营成本", &c.operating_cost),
            ("税金及附加", &c.surcharges),
            ("土地增值税", &c.land_tax),
            ("现金流出", &c.pre_tax.outflow),
            ("所得税前净现金流量", &c.pre_tax.net),
            ("累计所得税前净现金流量", &c.pre_tax.cumulative),
            ("所得税", &c.income_tax),
            ("所得税后净现金流量", &c.post_tax_net),
            ("累计所得税后净现金流量", &c.post_tax_cumulative),
        ],
    )
}

fn equity_cash_flow(p: &Projection) -> ProjectEvalResult<ResultTable> {
    let e = &p.cash_flows.equity;
    let project = &p.cash_flows.project;
    periodic(
        EQUITY_CASH_FLOW,
        &p.horizon,
        &[
            ("现金流入", &e.line.inflow),
            ("项目资本金", &e.equity_capital),
            ("借款本金偿还", &e.principal),
            ("借款利息支付", &e.interest),
            ("经营成本", &project.operating_cost),
            ("税金及附加", &project.surcharges),
            ("土地增值税", &project.land_tax),
            ("所得税", &project.income_tax),
            ("现金流出", &e.line.outflow),
            ("净现金流量", &e.line.net),
            ("累计净现金流量", &e.line.cumulative),
        ],
    )
}

fn investor_cash_flow(p: &Projection) -> ProjectEvalResult<ResultTable> {
    let i = &p.cash_flows.investor;
    periodic(
        INVESTOR_CASH_FLOW,
        &p.horizon,
        &[
            ("分配利润", &i.distributed_profit),
            ("期末资产余值分配", &i.residual_distribution),
            ("现金流入", &i.line.inflow),
            ("实缴资本", &i.paid_in_capital),
            ("现金流出", &i.line.outflow),
            ("净现金流量", &i.line.net),
            ("累计净现金流量", &i.line.cumulative),
        ],
    )
}

// ---------------------------------------------------------------------------
// Summary and disposal tables
// ---------------------------------------------------------------------------

fn payback_cell(payback: Payback) -> Cell {
    match payback {
        Payback::Recovered(n) => Cell::Value(Decimal::from(n)),
        Payback::NotRecovered => Cell::Text(NOT_RECOVERED.into()),
    }
}

fn financial_summary(p: &Projection) -> ProjectEvalResult<ResultTable> {
    let f = &p.formation;
    let m = &p.indicators;
    let h = &p.horizon;
    let mut table = ResultTable::with_columns(FINANCIAL_SUMMARY, vec!["数值".into()]);
    let mut row = |label: &str, cell: Cell| table.push_row(label, vec![cell]);

    row("项目总投资", f.total_project_investment.into())?;
    row("建设投资", f.total_investment.into())?;
    row("建设期利息", f.construction_interest.into())?;
    row("流动资金", f.working_capital.into())?;
    row("财务净现值", m.finance.npv.into())?;
    row("财务内部收益率", m.finance.irr.into())?;
    row("投资回收期", payback_cell(m.finance.payback))?;
    row("项目投资财务净现值（所得税前）", m.project_pre_tax.npv.into())?;
    row("项目投资财务内部收益率（所得税前）", m.project_pre_tax.irr.into())?;
    row("项目投资财务净现值（所得税后）", m.project_post_tax.npv.into())?;
    row("项目投资财务内部收益率（所得税后）", m.project_post_tax.irr.into())?;
    row(
        "项目投资回收期（所得税后，静态）",
        m.project_post_tax
            .payback_interpolated
            .map(Cell::Value)
            .unwrap_or_else(|| Cell::Text(NOT_RECOVERED.into())),
    )?;
    row("资本金财务内部收益率", m.equity.irr.into())?;
    row("投资各方财务内部收益率", m.investor.irr.into())?;
    row("基准折现率", p.discount_rate.into())?;
    row("建设期", Decimal::from(h.construction_periods()).into())?;
    row("运营期", Decimal::from(h.operation_periods()).into())?;
    row("计算期", Decimal::from(h.total_periods()).into())?;
    Ok(table)
}

fn land_tax(p: &Projection) -> ProjectEvalResult<ResultTable> {
    let l = &p.land_tax;
    let mut table = periodic(
        LAND_TAX,
        &p.horizon,
        &[
            ("转让收入", &l.transfer_income),
            ("土地成本", &l.land_cost),
            ("开发成本", &l.development_cost),
            ("开发费用", &l.development_fees),
            ("与转让有关的税金", &l.related_taxes),
            ("加计扣除", &l.additional_deduction),
            ("扣除项目合计", &l.deductions),
            ("增值额", &l.appreciation),
        ],
    )?;
    table.push_row(
        "增值率",
        l.appreciation_ratio
            .iter()
            .map(|r| r.map(Cell::Value).unwrap_or(Cell::Value(Decimal::ZERO)))
            .collect(),
    )?;
    table.push_series("适用税率", &l.rate)?;
    table.push_series("速算扣除系数", &l.quick_deduction)?;
    table.push_series("土地增值税", &l.tax)?;
    Ok(table)
}

fn property_sale(p: &Projection) -> ProjectEvalResult<ResultTable> {
    let d = &p.disposal;
    let sale_cost = d.cost.plus(&d.land_amortization);
    let operating_profit = d
        .revenue
        .minus(&sale_cost)
        .minus(&d.sales_expense)
        .minus(&p.land_tax.related_taxes)
        .minus(&p.land_tax.tax);
    periodic(
        PROPERTY_SALE,
        &p.horizon,
        &[
            ("销售收入", &d.revenue),
            ("销售成本", &sale_cost),
            ("销售费用", &d.sales_expense),
            ("销售税金及附加", &p.land_tax.related_taxes),
            ("土地增值税", &p.land_tax.tax),
            ("经营利润", &operating_profit),
        ],
    )
}

fn disposal_plan(p: &Projection) -> ProjectEvalResult<ResultTable> {
    let d = &p.disposal;
    periodic(
        DISPOSAL_PLAN,
        &p.horizon,
        &[
            ("分摊比例", &d.ratios),
            ("处置房屋建筑物成本", &d.cost),
            ("处置土地使用权成本", &d.land_amortization),
            ("处置收入", &d.revenue),
            ("销售费用", &d.sales_expense),
        ],
    )
}
