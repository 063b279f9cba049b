use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ProjectEvalError;
use crate::period::TimeHorizon;
use crate::types::{Money, Rate};
use crate::ProjectEvalResult;

/// Tolerance used when checking that ratio lists sum to one.
pub const RATIO_TOLERANCE: Decimal = dec!(0.000001);

/// Front-loaded disposal apportionment over the first four operation periods.
/// Total rows of the material and fuel tables; category names may not take them.
pub const MATERIAL_TOTAL_LABEL: &str = "外购原材料费合计";
pub const FUEL_TOTAL_LABEL: &str = "外购燃料及动力费合计";

pub const DEFAULT_APPORTIONMENT: [Rate; 4] = [dec!(0.10), dec!(0.30), dec!(0.30), dec!(0.30)];

// ---------------------------------------------------------------------------
// Input sections
// ---------------------------------------------------------------------------

/// Project identity, horizon and working capital.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicInfo {
    pub project_name: String,
    /// Construction periods (years), at least 1
    pub construction_periods: u32,
    /// Operation periods (years), at least 1
    pub operation_periods: u32,
    /// Working capital put in at the first operation period and recovered at
    /// the end of the horizon
    pub working_capital: Money,
}

impl Default for BasicInfo {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            construction_periods: 3,
            operation_periods: 17,
            working_capital: Decimal::ZERO,
        }
    }
}

/// VAT rates used to strip embedded input tax from investment line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VatRates {
    pub equipment: Rate,
    pub construction: Rate,
    pub service: Rate,
    pub land: Rate,
}

impl Default for VatRates {
    fn default() -> Self {
        Self {
            equipment: dec!(0.13),
            construction: dec!(0.09),
            service: dec!(0.06),
            land: Decimal::ZERO,
        }
    }
}

/// Construction investment line items, all tax-inclusive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestmentCosts {
    pub building_works: Money,
    pub building_equipment: Money,
    pub building_installation: Money,
    pub production_equipment: Money,
    pub production_installation: Money,
    pub management_fee: Money,
    pub technical_service_fee: Money,
    pub supporting_facilities_fee: Money,
    pub land_use_fee: Money,
    pub patent_fee: Money,
    pub preparation_fee: Money,
    /// Basic reserve as a fraction of engineering + other fixed + preparation
    pub basic_reserve_rate: Rate,
    /// Price escalation per construction period; empty means no escalation reserve
    pub escalation_rates: Vec<Rate>,
    /// Share of investment spent in each construction period; empty means an even split
    pub period_shares: Vec<Rate>,
    pub vat_rates: VatRates,
}

/// Straight-line depreciation parameters for a fixed-asset class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepreciableClass {
    pub useful_life: u32,
    pub salvage_rate: Rate,
}

/// Straight-line amortization parameters (no salvage).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizableClass {
    pub useful_life: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetParameters {
    pub building: DepreciableClass,
    pub equipment: DepreciableClass,
    pub land_use_right: AmortizableClass,
    pub patent: AmortizableClass,
    pub other: AmortizableClass,
}

impl Default for AssetParameters {
    fn default() -> Self {
        Self {
            building: DepreciableClass {
                useful_life: 20,
                salvage_rate: dec!(0.05),
            },
            equipment: DepreciableClass {
                useful_life: 10,
                salvage_rate: dec!(0.05),
            },
            land_use_right: AmortizableClass { useful_life: 50 },
            patent: AmortizableClass { useful_life: 6 },
            other: AmortizableClass { useful_life: 5 },
        }
    }
}

/// Sale of part of the building and land-use right during operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisposalPlan {
    /// Fraction of the building fixed asset sold
    pub building_ratio: Rate,
    /// Fraction of the land-use right sold
    pub land_ratio: Rate,
    /// Sale price as a multiple of disposed cost
    pub markup: Decimal,
    /// Fraction of the disposal recognized in each operation period, starting
    /// with the first; empty means [`DEFAULT_APPORTIONMENT`]
    pub apportionment: Vec<Rate>,
    /// Reject (rather than warn about) apportionments that do not reconcile
    pub strict: bool,
}

impl Default for DisposalPlan {
    fn default() -> Self {
        Self {
            building_ratio: dec!(0.25),
            land_ratio: dec!(0.25),
            markup: dec!(2.5),
            apportionment: DEFAULT_APPORTIONMENT.to_vec(),
            strict: true,
        }
    }
}

impl DisposalPlan {
    pub fn building_self_hold_ratio(&self) -> Rate {
        Decimal::ONE - self.building_ratio
    }

    pub fn land_self_hold_ratio(&self) -> Rate {
        Decimal::ONE - self.land_ratio
    }

    pub fn apportionment_ratios(&self) -> Vec<Rate> {
        if self.apportionment.is_empty() {
            DEFAULT_APPORTIONMENT.to_vec()
        } else {
            self.apportionment.clone()
        }
    }
}

/// Product sales revenue, one value per operation period.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RevenueSchedule {
    pub annual: Vec<Money>,
}

/// A purchased material or fuel line with one value per operation period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostCategory {
    pub name: String,
    #[serde(default)]
    pub values: Vec<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffRole {
    pub role: String,
    pub headcount: u32,
    /// Annual salary per head
    pub annual_salary: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CostInputs {
    pub materials: Vec<CostCategory>,
    pub fuels: Vec<CostCategory>,
    pub staff: Vec<StaffRole>,
    pub welfare_rate: Rate,
    /// Repair cost as a fraction of fixed-asset original value
    pub repair_rate: Rate,
    /// Other manufacturing/administrative expense on the same base
    pub other_expense_rate: Rate,
    /// Selling expense as a fraction of disposal revenue
    pub sales_expense_rate: Rate,
}

impl Default for CostInputs {
    fn default() -> Self {
        let role = |name: &str| StaffRole {
            role: name.to_string(),
            headcount: 0,
            annual_salary: Decimal::ZERO,
        };
        Self {
            materials: Vec::new(),
            fuels: Vec::new(),
            staff: vec![
                role("管理人员"),
                role("技术人员"),
                role("保安人员"),
                role("保洁人员"),
            ],
            welfare_rate: dec!(0.14),
            repair_rate: dec!(0.005),
            other_expense_rate: Decimal::ZERO,
            sales_expense_rate: dec!(0.02),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxParameters {
    pub corporate_tax_rate: Rate,
    pub city_maintenance_rate: Rate,
    pub education_surcharge_rate: Rate,
    /// Output VAT on product and disposal sales
    pub output_vat_rate: Rate,
    /// Statutory surplus reserve appropriated from positive net profit
    pub surplus_reserve_rate: Rate,
    pub discount_rate: Rate,
    pub loss_carryforward_years: u32,
    /// Offset earlier losses against later taxable income
    pub apply_loss_carryforward: bool,
}

impl Default for TaxParameters {
    fn default() -> Self {
        Self {
            corporate_tax_rate: dec!(0.25),
            city_maintenance_rate: dec!(0.07),
            education_surcharge_rate: dec!(0.05),
            output_vat_rate: Decimal::ZERO,
            surplus_reserve_rate: dec!(0.10),
            discount_rate: dec!(0.06),
            loss_carryforward_years: 5,
            apply_loss_carryforward: false,
        }
    }
}

impl TaxParameters {
    pub fn surcharge_rate(&self) -> Rate {
        self.city_maintenance_rate + self.education_surcharge_rate
    }
}

/// How the construction loan is repaid during operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepaymentMethod {
    /// Same principal every period (等额本金)
    EqualPrincipal,
    /// Same total payment every period (等额本息)
    EqualInstallment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanParameters {
    pub interest_rate: Rate,
    pub repayment_periods: u32,
    pub repayment_method: RepaymentMethod,
    /// Fraction of each construction period's investment funded by the loan
    pub loan_share: Rate,
}

impl Default for LoanParameters {
    fn default() -> Self {
        Self {
            interest_rate: dec!(0.0588),
            repayment_periods: 15,
            repayment_method: RepaymentMethod::EqualPrincipal,
            loan_share: dec!(0.5),
        }
    }
}

/// Complete parameter object for one evaluation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectInputs {
    pub basic: BasicInfo,
    pub investment: InvestmentCosts,
    pub assets: AssetParameters,
    pub disposal: DisposalPlan,
    pub revenue: RevenueSchedule,
    pub costs: CostInputs,
    pub tax: TaxParameters,
    pub loan: LoanParameters,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl ProjectInputs {
    pub fn horizon(&self) -> ProjectEvalResult<TimeHorizon> {
        TimeHorizon::new(self.basic.construction_periods, self.basic.operation_periods)
    }

    /// Check every precondition of the run. Returns the horizon and the
    /// non-fatal findings; the first fatal finding aborts.
    pub fn validate(&self) -> ProjectEvalResult<(TimeHorizon, Vec<String>)> {
        let horizon = self.horizon()?;
        let mut warnings = Vec::new();

        non_negative("basic.working_capital", self.basic.working_capital)?;

        let inv = &self.investment;
        for (field, value) in [
            ("investment.building_works", inv.building_works),
            ("investment.building_equipment", inv.building_equipment),
            ("investment.building_installation", inv.building_installation),
            ("investment.production_equipment", inv.production_equipment),
            ("investment.production_installation", inv.production_installation),
            ("investment.management_fee", inv.management_fee),
            ("investment.technical_service_fee", inv.technical_service_fee),
            ("investment.supporting_facilities_fee", inv.supporting_facilities_fee),
            ("investment.land_use_fee", inv.land_use_fee),
            ("investment.patent_fee", inv.patent_fee),
            ("investment.preparation_fee", inv.preparation_fee),
            ("investment.basic_reserve_rate", inv.basic_reserve_rate),
        ] {
            non_negative(field, value)?;
        }
        for (field, rate) in [
            ("investment.vat_rates.equipment", inv.vat_rates.equipment),
            ("investment.vat_rates.construction", inv.vat_rates.construction),
            ("investment.vat_rates.service", inv.vat_rates.service),
            ("investment.vat_rates.land", inv.vat_rates.land),
        ] {
            fraction(field, rate)?;
        }
        for rate in &inv.escalation_rates {
            if *rate <= dec!(-1) {
                return Err(ProjectEvalError::invalid(
                    "investment.escalation_rates",
                    "Escalation rate must be greater than -100%",
                ));
            }
        }
        let construction = horizon.construction_periods() as usize;
        if inv.escalation_rates.len() > construction {
            warnings.push(format!(
                "{} escalation rates supplied for {construction} construction periods; the excess is ignored",
                inv.escalation_rates.len()
            ));
        }
        if !inv.period_shares.is_empty() {
            if inv.period_shares.len() != construction {
                return Err(ProjectEvalError::invalid(
                    "investment.period_shares",
                    format!(
                        "Expected {construction} shares (one per construction period), got {}",
                        inv.period_shares.len()
                    ),
                ));
            }
            for share in &inv.period_shares {
                non_negative("investment.period_shares", *share)?;
            }
            let total: Decimal = inv.period_shares.iter().sum();
            if (total - Decimal::ONE).abs() > RATIO_TOLERANCE {
                return Err(ProjectEvalError::invalid(
                    "investment.period_shares",
                    format!("Shares must sum to 1, got {total}"),
                ));
            }
        }

        for (field, rate) in [
            ("assets.building.salvage_rate", self.assets.building.salvage_rate),
            ("assets.equipment.salvage_rate", self.assets.equipment.salvage_rate),
        ] {
            fraction(field, rate)?;
        }

        self.validate_disposal(&horizon, &mut warnings)?;

        let operation = horizon.operation_periods() as usize;
        if self.revenue.annual.len() > operation {
            warnings.push(format!(
                "revenue.annual has {} values for {operation} operation periods; the excess is ignored",
                self.revenue.annual.len()
            ));
        }
        for category in self.costs.materials.iter().chain(self.costs.fuels.iter()) {
            if category.values.len() > operation {
                warnings.push(format!(
                    "cost category '{}' has {} values for {operation} operation periods; the excess is ignored",
                    category.name,
                    category.values.len()
                ));
            }
        }
        unique_names(
            "costs.materials",
            self.costs.materials.iter().map(|c| c.name.as_str()),
            Some(MATERIAL_TOTAL_LABEL),
        )?;
        unique_names(
            "costs.fuels",
            self.costs.fuels.iter().map(|c| c.name.as_str()),
            Some(FUEL_TOTAL_LABEL),
        )?;
        unique_names("costs.staff", self.costs.staff.iter().map(|r| r.role.as_str()), None)?;
        for role in &self.costs.staff {
            non_negative("costs.staff.annual_salary", role.annual_salary)?;
        }
        for (field, rate) in [
            ("costs.welfare_rate", self.costs.welfare_rate),
            ("costs.repair_rate", self.costs.repair_rate),
            ("costs.other_expense_rate", self.costs.other_expense_rate),
            ("costs.sales_expense_rate", self.costs.sales_expense_rate),
        ] {
            non_negative(field, rate)?;
        }

        let tax = &self.tax;
        for (field, rate) in [
            ("tax.corporate_tax_rate", tax.corporate_tax_rate),
            ("tax.city_maintenance_rate", tax.city_maintenance_rate),
            ("tax.education_surcharge_rate", tax.education_surcharge_rate),
            ("tax.output_vat_rate", tax.output_vat_rate),
            ("tax.surplus_reserve_rate", tax.surplus_reserve_rate),
        ] {
            fraction(field, rate)?;
        }
        if tax.discount_rate <= dec!(-1) {
            return Err(ProjectEvalError::invalid(
                "tax.discount_rate",
                "Discount rate must be greater than -100%",
            ));
        }

        let loan = &self.loan;
        non_negative("loan.interest_rate", loan.interest_rate)?;
        fraction("loan.loan_share", loan.loan_share)?;
        if loan.loan_share > Decimal::ZERO && loan.repayment_periods == 0 {
            return Err(ProjectEvalError::invalid(
                "loan.repayment_periods",
                "Repayment period must be at least 1 when a loan is drawn",
            ));
        }
        if loan.loan_share > Decimal::ZERO && loan.repayment_periods > horizon.operation_periods() {
            warnings.push(format!(
                "Loan repayment over {} periods exceeds the {} operation periods; the balance left at the end is reported",
                loan.repayment_periods,
                horizon.operation_periods()
            ));
        }

        Ok((horizon, warnings))
    }

    fn validate_disposal(
        &self,
        horizon: &TimeHorizon,
        warnings: &mut Vec<String>,
    ) -> ProjectEvalResult<()> {
        let plan = &self.disposal;
        fraction("disposal.building_ratio", plan.building_ratio)?;
        fraction("disposal.land_ratio", plan.land_ratio)?;
        non_negative("disposal.markup", plan.markup)?;

        let ratios = plan.apportionment_ratios();
        for ratio in &ratios {
            non_negative("disposal.apportionment", *ratio)?;
        }

        let total: Decimal = ratios.iter().sum();
        if (total - Decimal::ONE).abs() > RATIO_TOLERANCE {
            let message = format!(
                "Disposal apportionment sums to {total}, not 1; disposal totals will not reconcile"
            );
            if plan.strict {
                return Err(ProjectEvalError::invalid("disposal.apportionment", message));
            }
            warnings.push(message);
        }

        let operation = horizon.operation_periods() as usize;
        if ratios.len() > operation {
            let beyond: Decimal = ratios[operation..].iter().sum();
            let message = format!(
                "Disposal apportionment has {} entries for {operation} operation periods; {beyond} of the disposal falls outside the horizon",
                ratios.len()
            );
            if plan.strict && !beyond.is_zero() {
                return Err(ProjectEvalError::invalid("disposal.apportionment", message));
            }
            warnings.push(message);
        }
        Ok(())
    }
}

fn non_negative(field: &str, value: Decimal) -> ProjectEvalResult<()> {
    if value < Decimal::ZERO {
        return Err(ProjectEvalError::invalid(field, "Value cannot be negative"));
    }
    Ok(())
}

/// Names become row labels, so they must be non-empty and distinct.
fn unique_names<'a>(
    field: &str,
    names: impl Iterator<Item = &'a str>,
    reserved: Option<&str>,
) -> ProjectEvalResult<()> {
    let mut seen = std::collections::HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(ProjectEvalError::invalid(field, "Name cannot be empty"));
        }
        if reserved == Some(name) {
            return Err(ProjectEvalError::invalid(
                field,
                format!("'{name}' is the table's total row"),
            ));
        }
        if !seen.insert(name) {
            return Err(ProjectEvalError::invalid(
                field,
                format!("Duplicate name '{name}'"),
            ));
        }
    }
    Ok(())
}

fn fraction(field: &str, value: Decimal) -> ProjectEvalResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ProjectEvalError::invalid(
            field,
            format!("Must be between 0 and 1, got {value}"),
        ));
    }
    Ok(())
}
