//! Construction investment: tax conversion, reserves, the per-period plan,
//! the construction loan and the resulting asset classes.

pub mod formation;
pub mod loan;

pub use formation::{form_assets, tax_exclusive, AssetFormation, CostGroup, InvestmentPlan, LineItem};
pub use loan::{build_loan_schedule, LoanSchedule};
