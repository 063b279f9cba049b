use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::inputs::{LoanParameters, RepaymentMethod};
use crate::period::{PeriodSeries, TimeHorizon};
use crate::time_value::pmt;
use crate::types::Money;
use crate::ProjectEvalResult;

/// Construction loan: draws, interest and repayment over the whole horizon.
#[derive(Debug, Clone, Serialize)]
pub struct LoanSchedule {
    pub opening_balance: PeriodSeries,
    pub draws: PeriodSeries,
    /// Interest accrued in each period; construction-period interest uses the
    /// average-balance approximation
    pub interest: PeriodSeries,
    pub principal: PeriodSeries,
    pub payment: PeriodSeries,
    pub closing_balance: PeriodSeries,
    pub total_drawn: Money,
    pub construction_interest: Money,
}

impl LoanSchedule {
    /// Interest falling in operation periods (expensed, not capitalized).
    pub fn operating_interest(&self, horizon: &TimeHorizon) -> PeriodSeries {
        let mut series = horizon.zero_series();
        for n in horizon.operation_period_numbers() {
            series.set(n, self.interest.get(n));
        }
        series
    }

    pub fn construction_interest_series(&self, horizon: &TimeHorizon) -> PeriodSeries {
        let mut series = horizon.zero_series();
        for n in 1..horizon.first_operation_period() {
            series.set(n, self.interest.get(n));
        }
        series
    }

    pub fn ending_balance(&self, horizon: &TimeHorizon) -> Money {
        self.closing_balance.get(horizon.last_period())
    }
}

/// Build the loan schedule from per-period construction draws.
///
/// During construction the balance is the cumulative draw and interest is
/// `(opening + draw / 2) * rate`; it is paid from equity, so it never joins
/// the balance. Repayment starts at the first operation period.
pub fn build_loan_schedule(
    horizon: &TimeHorizon,
    draws: &PeriodSeries,
    params: &LoanParameters,
) -> ProjectEvalResult<LoanSchedule> {
    let rate = params.interest_rate;
    let total_drawn = draws.sum();

    let mut opening_balance = horizon.zero_series();
    let mut interest = horizon.zero_series();
    let mut principal = horizon.zero_series();
    let mut payment = horizon.zero_series();
    let mut closing_balance = horizon.zero_series();

    let mut balance = Decimal::ZERO;
    for n in 1..horizon.first_operation_period() {
        let draw = draws.get(n);
        opening_balance.set(n, balance);
        interest.set(n, (balance + draw / dec!(2)) * rate);
        payment.set(n, interest.get(n));
        balance += draw;
        closing_balance.set(n, balance);
    }
    let construction_interest = interest.sum();

    let installment = match params.repayment_method {
        RepaymentMethod::EqualInstallment if total_drawn > Decimal::ZERO => {
            -pmt(rate, params.repayment_periods, total_drawn, Decimal::ZERO)?
        }
        _ => Decimal::ZERO,
    };
    let level_principal = if params.repayment_periods > 0 {
        total_drawn / Decimal::from(params.repayment_periods)
    } else {
        total_drawn
    };

    for n in horizon.operation_period_numbers() {
        opening_balance.set(n, balance);
        if balance <= Decimal::ZERO {
            continue;
        }
        let period_interest = balance * rate;
        let offset = horizon.operation_offset(n).unwrap_or(0) as u32;
        let repaid = if offset >= params.repayment_periods {
            Decimal::ZERO
        } else {
            match params.repayment_method {
                RepaymentMethod::EqualPrincipal => level_principal.min(balance),
                RepaymentMethod::EqualInstallment => {
                    // Final installment clears rounding residue
                    if offset + 1 == params.repayment_periods {
                        balance
                    } else {
                        (installment - period_interest).max(Decimal::ZERO).min(balance)
                    }
                }
            }
        };
        balance -= repaid;
        interest.set(n, period_interest);
        principal.set(n, repaid);
        payment.set(n, period_interest + repaid);
        closing_balance.set(n, balance);
    }

    Ok(LoanSchedule {
        opening_balance,
        draws: draws.clone(),
        interest,
        principal,
        payment,
        closing_balance,
        total_drawn,
        construction_interest,
    })
}
