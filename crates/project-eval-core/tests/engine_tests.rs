use pretty_assertions::assert_eq;
use project_eval_core::engine::{
    BALANCE_SHEET, DEPRECIATION, DISPOSAL_PLAN, FINANCE_CASH_FLOW, FINANCIAL_SUMMARY, MATERIAL_COST, PROFIT,
};
use project_eval_core::inputs::{CostCategory, StaffRole, MATERIAL_TOTAL_LABEL};
use project_eval_core::time_value;
use project_eval_core::{run_all_calculations, Cell, ProjectEvalError, ProjectInputs, ResultSet, TABLE_NAMES};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn tolerance() -> Decimal {
    dec!(0.000001)
}

fn label(n: u32) -> String {
    format!("第{n}年")
}

/// A full project: every line item, staff, materials, revenue and a loan.
fn sample_inputs() -> ProjectInputs {
    let mut inputs = ProjectInputs::default();
    inputs.basic.project_name = "示范项目".into();
    inputs.basic.working_capital = dec!(900);

    let inv = &mut inputs.investment;
    inv.building_works = dec!(109000);
    inv.building_equipment = dec!(11300);
    inv.building_installation = dec!(5450);
    inv.production_equipment = dec!(56500);
    inv.production_installation = dec!(11300);
    inv.management_fee = dec!(1060);
    inv.technical_service_fee = dec!(2120);
    inv.supporting_facilities_fee = dec!(1090);
    inv.land_use_fee = dec!(20000);
    inv.patent_fee = dec!(636);
    inv.preparation_fee = dec!(545);
    inv.basic_reserve_rate = dec!(0.05);
    inv.escalation_rates = vec![dec!(0.02), dec!(0.02), dec!(0.02)];
    inv.period_shares = vec![dec!(0.3), dec!(0.4), dec!(0.3)];

    inputs.revenue.annual = vec![dec!(42000); 17];
    inputs.costs.materials = vec![
        CostCategory { name: "钢材".into(), values: vec![dec!(6000); 17] },
        CostCategory { name: "辅料".into(), values: vec![dec!(1500); 10] },
    ];
    inputs.costs.fuels = vec![CostCategory { name: "电力".into(), values: vec![dec!(2200); 17] }];
    inputs.costs.staff = vec![
        StaffRole { role: "管理人员".into(), headcount: 10, annual_salary: dec!(12) },
        StaffRole { role: "技术人员".into(), headcount: 25, annual_salary: dec!(10) },
        StaffRole { role: "保安人员".into(), headcount: 6, annual_salary: dec!(6) },
        StaffRole { role: "保洁人员".into(), headcount: 4, annual_salary: dec!(5) },
    ];
    inputs.tax.output_vat_rate = dec!(0.09);
    inputs
}

fn run(inputs: &ProjectInputs) -> ResultSet {
    run_all_calculations(inputs).unwrap().result
}

// ===========================================================================
// Table set shape
// ===========================================================================

#[test]
fn test_all_tables_present_in_order() {
    let set = run(&sample_inputs());
    let names: Vec<&str> = set.names().collect();
    assert_eq!(names, TABLE_NAMES.to_vec());
}

#[test]
fn test_every_table_fully_populated() {
    let inputs = sample_inputs();
    let set = run(&inputs);
    let labels: Vec<String> = (1..=20).map(label).collect();
    for table in set.tables() {
        assert!(table.is_rectangular(), "{} is not rectangular", table.name);
        assert!(!table.rows.is_empty(), "{} has no rows", table.name);
        if table.columns.len() > 3 {
            assert_eq!(table.columns, labels, "{} columns", table.name);
        }
    }
}

#[test]
fn test_construction_periods_carry_no_operating_values() {
    let set = run(&sample_inputs());
    let materials = set.get(MATERIAL_COST).unwrap();
    let profit = set.get(PROFIT).unwrap();
    for n in 1..=3 {
        assert_eq!(materials.value("外购原材料费合计", &label(n)), Some(Decimal::ZERO));
        assert_eq!(profit.value("营业收入", &label(n)), Some(Decimal::ZERO));
    }
    assert_eq!(materials.value("外购原材料费合计", &label(4)), Some(dec!(7500)));
    // 辅料 stops after its tenth operation period
    assert_eq!(materials.value("外购原材料费合计", &label(14)), Some(dec!(6000)));
}

// ===========================================================================
// Worked scenarios
// ===========================================================================

#[test]
fn test_building_depreciation_scenario() {
    let mut inputs = ProjectInputs::default();
    inputs.investment.building_works = dec!(109000);
    inputs.disposal.building_ratio = Decimal::ZERO;
    inputs.loan.loan_share = Decimal::ZERO;

    let set = run(&inputs);
    let table = set.get(DEPRECIATION).unwrap();
    for n in 1..=3 {
        assert_eq!(table.value("房屋建筑物折旧费", &label(n)), Some(Decimal::ZERO));
    }
    for n in 4..=20 {
        assert_eq!(table.value("房屋建筑物折旧费", &label(n)), Some(dec!(4750)));
    }
    assert_eq!(table.value("房屋建筑物原值", &label(4)), Some(dec!(100000)));
}

#[test]
fn test_disposal_scenario() {
    let mut inputs = ProjectInputs::default();
    inputs.investment.building_works = dec!(109000);
    inputs.loan.loan_share = Decimal::ZERO;

    let set = run(&inputs);
    let plan = set.get(DISPOSAL_PLAN).unwrap();
    assert_eq!(plan.value("处置房屋建筑物成本", &label(4)), Some(dec!(2500)));
    assert_eq!(plan.value("处置房屋建筑物成本", &label(5)), Some(dec!(7500)));
    assert_eq!(plan.value("处置房屋建筑物成本", &label(8)), Some(Decimal::ZERO));

    let revenue: Decimal = (4..=7)
        .map(|n| plan.value("处置收入", &label(n)).unwrap())
        .sum();
    assert!((revenue - dec!(62500)).abs() < tolerance());

    // Self-held 75% depreciates alongside the disposed write-off
    let dep = set.get(DEPRECIATION).unwrap();
    assert_eq!(dep.value("房屋建筑物折旧费", &label(4)), Some(dec!(3562.5)));
    assert_eq!(dep.value("折旧费合计", &label(4)), Some(dec!(6062.5)));
}

#[test]
fn test_summary_npv_matches_finance_cash_flow() {
    let inputs = sample_inputs();
    let set = run(&inputs);
    let finance = set.get(FINANCE_CASH_FLOW).unwrap();
    let flows: Vec<Decimal> = (1..=20)
        .map(|n| finance.value("净现金流量", &label(n)).unwrap())
        .collect();
    let expected = time_value::npv(inputs.tax.discount_rate, &flows).unwrap();

    let summary = set.get(FINANCIAL_SUMMARY).unwrap();
    let npv = summary.value("财务净现值", "数值").unwrap();
    assert!((npv - expected).abs() < tolerance());

    let irr = summary.value("财务内部收益率", "数值").unwrap();
    assert!(time_value::npv(irr, &flows).unwrap().abs() < dec!(0.001));

    let cumulative = time_value::cumulative(&flows);
    let payback = summary.value("投资回收期", "数值").unwrap();
    let idx = (payback - Decimal::ONE).to_string().parse::<usize>().unwrap();
    assert!(cumulative[idx] >= Decimal::ZERO);
    assert!(cumulative[..idx].iter().all(|c| *c < Decimal::ZERO));
}

#[test]
fn test_balance_sheet_balances() {
    for apply_carryforward in [false, true] {
        let mut inputs = sample_inputs();
        inputs.tax.apply_loss_carryforward = apply_carryforward;
        let set = run(&inputs);
        let bs = set.get(BALANCE_SHEET).unwrap();
        for n in 1..=20 {
            let assets = bs.value("资产合计", &label(n)).unwrap();
            let funding = bs.value("负债及所有者权益合计", &label(n)).unwrap();
            assert!(
                (assets - funding).abs() < tolerance(),
                "period {n}: assets {assets} vs liabilities+equity {funding}"
            );
        }
    }
}

// ===========================================================================
// Degradation and validation
// ===========================================================================

#[test]
fn test_unrecoverable_project_reports_not_available() {
    let mut inputs = ProjectInputs::default();
    inputs.investment.building_works = dec!(1000);
    inputs.disposal.building_ratio = Decimal::ZERO;
    inputs.disposal.land_ratio = Decimal::ZERO;

    let output = run_all_calculations(&inputs).unwrap();
    let summary = output.result.get(FINANCIAL_SUMMARY).unwrap();
    assert_eq!(summary.cell("财务内部收益率", "数值"), Some(&Cell::NotAvailable));
    assert_eq!(summary.cell("投资回收期", "数值"), Some(&Cell::Text("未回收".into())));
    assert!(summary.value("财务净现值", "数值").unwrap() < Decimal::ZERO);
    assert!(output.warnings.iter().any(|w| w.contains("IRR unavailable")));

    let json = serde_json::to_value(&output.result).unwrap();
    assert_eq!(
        json[FINANCIAL_SUMMARY]["rows"][5]["cells"][0],
        serde_json::json!("N/A")
    );
}

#[test]
fn test_zero_useful_life_is_not_an_error() {
    let mut inputs = sample_inputs();
    inputs.assets.patent.useful_life = 0;
    let set = run(&inputs);
    let amort = set.get("5-5摊销").unwrap();
    for n in 1..=20 {
        assert_eq!(amort.value("专利及专有技术摊销费", &label(n)), Some(Decimal::ZERO));
    }
}

#[test]
fn test_fatal_validation_aborts_run() {
    let mut inputs = sample_inputs();
    inputs.basic.operation_periods = 0;
    let err = run_all_calculations(&inputs).unwrap_err();
    assert!(matches!(err, ProjectEvalError::InvalidInput { ref field, .. } if field == "operation_periods"));

    let mut inputs = sample_inputs();
    inputs.disposal.apportionment = vec![dec!(0.2), dec!(0.2)];
    assert!(run_all_calculations(&inputs).is_err());

    inputs.disposal.strict = false;
    let output = run_all_calculations(&inputs).unwrap();
    assert!(output.warnings.iter().any(|w| w.contains("not reconcile")));
}

#[test]
fn test_oversized_horizon_rejected_up_front() {
    let mut inputs = sample_inputs();
    inputs.basic.construction_periods = u32::MAX - 1;
    inputs.basic.operation_periods = 4;
    let err = run_all_calculations(&inputs).unwrap_err();
    assert!(matches!(err, ProjectEvalError::InvalidInput { ref field, .. } if field == "construction_periods"));
}

#[test]
fn test_category_named_like_total_row_rejected_up_front() {
    let mut inputs = sample_inputs();
    inputs.costs.materials[1].name = MATERIAL_TOTAL_LABEL.into();
    assert!(inputs.validate().is_err());
    let err = run_all_calculations(&inputs).unwrap_err();
    assert!(matches!(err, ProjectEvalError::InvalidInput { ref field, .. } if field == "costs.materials"));
}

#[test]
fn test_loss_carryforward_reduces_tax() {
    let mut inputs = sample_inputs();
    // Heavy early costs produce losses in the first operation periods
    inputs.costs.materials[0].values = vec![dec!(60000), dec!(60000), dec!(1000), dec!(1000)];
    let without = run(&inputs);
    inputs.tax.apply_loss_carryforward = true;
    let with = run(&inputs);

    let tax_total = |set: &ResultSet| -> Decimal {
        let t = set.get(PROFIT).unwrap();
        (1..=20).map(|n| t.value("所得税", &label(n)).unwrap()).sum()
    };
    assert!(tax_total(&with) < tax_total(&without));
    let offset: Decimal = (1..=20)
        .map(|n| with.get(PROFIT).unwrap().value("弥补以前年度亏损", &label(n)).unwrap())
        .sum();
    assert!(offset > Decimal::ZERO);
}

#[test]
fn test_repeated_runs_leave_no_residue() {
    let a = sample_inputs();
    let mut b = sample_inputs();
    b.investment.building_works = dec!(5000);
    b.basic.operation_periods = 10;

    let first = serde_json::to_string(&run(&a)).unwrap();
    let _ = run(&b);
    let again = serde_json::to_string(&run(&a)).unwrap();
    assert_eq!(first, again);
}

#[test]
fn test_envelope_metadata() {
    let output = run_all_calculations(&sample_inputs()).unwrap();
    assert!(output.methodology.contains("economic evaluation"));
    assert_eq!(output.metadata.precision, "rust_decimal_128bit");
    assert_eq!(output.assumptions["basic"]["project_name"], serde_json::json!("示范项目"));
}
