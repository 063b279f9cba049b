use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ProjectEvalError;
use crate::types::{Money, Rate};
use crate::ProjectEvalResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const MAX_BISECTION_ITERATIONS: u32 = 200;
/// Bracket width at which bisection stops and hands over to a Newton polish.
const BISECTION_WIDTH: Decimal = dec!(0.0000000000000000001);
const RATE_FLOOR: Decimal = dec!(-0.99);
const RATE_CEILING: Decimal = dec!(100);

/// Rates tried, in order, when looking for a bracket around the IRR.
const BRACKET_GRID: [Decimal; 12] = [
    dec!(-0.9),
    dec!(-0.5),
    dec!(-0.2),
    dec!(0),
    dec!(0.05),
    dec!(0.1),
    dec!(0.25),
    dec!(0.5),
    dec!(1),
    dec!(3),
    dec!(10),
    dec!(100),
];

/// Net Present Value of a series of cash flows, the first one undiscounted.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> ProjectEvalResult<Money> {
    if rate <= dec!(-1) {
        return Err(ProjectEvalError::invalid(
            "rate",
            "Discount rate must be greater than -100%",
        ));
    }

    discounted(rate, cash_flows)
        .map(|(value, _)| value)
        .ok_or_else(|| {
            ProjectEvalError::FinancialImpossibility(format!(
                "NPV at rate {rate} exceeds the representable range"
            ))
        })
}

/// Internal Rate of Return. Newton-Raphson from `guess`, falling back to
/// bisection over a bracketed interval when Newton stalls or diverges.
pub fn irr(cash_flows: &[Money], guess: Rate) -> ProjectEvalResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(ProjectEvalError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }
    let has_negative = cash_flows.iter().any(|cf| cf.is_sign_negative() && !cf.is_zero());
    let has_positive = cash_flows.iter().any(|cf| cf.is_sign_positive() && !cf.is_zero());
    if !(has_negative && has_positive) {
        return Err(ProjectEvalError::FinancialImpossibility(
            "Cash flows never change sign; IRR does not exist".into(),
        ));
    }

    if let Some(rate) = newton(cash_flows, guess) {
        return Ok(rate);
    }
    bisection(cash_flows)
}

fn newton(cash_flows: &[Money], guess: Rate) -> Option<Rate> {
    let mut rate = guess.clamp(RATE_FLOOR, RATE_CEILING);

    for _ in 0..MAX_IRR_ITERATIONS {
        let (npv_val, dnpv) = discounted(rate, cash_flows)?;

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Some(rate);
        }
        if dnpv.is_zero() {
            return None;
        }

        rate -= npv_val.checked_div(dnpv)?;

        // Guard against divergence
        if rate < RATE_FLOOR {
            rate = RATE_FLOOR;
        } else if rate > RATE_CEILING {
            rate = RATE_CEILING;
        }
    }
    None
}

fn bisection(cash_flows: &[Money]) -> ProjectEvalResult<Rate> {
    let evaluated: Vec<(Rate, Money)> = BRACKET_GRID
        .iter()
        .filter_map(|r| discounted(*r, cash_flows).map(|(v, _)| (*r, v)))
        .collect();

    if let Some((r, _)) = evaluated.iter().find(|(_, v)| v.is_zero()) {
        return Ok(*r);
    }

    let bracket = evaluated
        .windows(2)
        .find(|w| w[0].1.is_sign_negative() != w[1].1.is_sign_negative());

    let Some(pair) = bracket else {
        return Err(ProjectEvalError::ConvergenceFailure {
            function: "IRR".into(),
            iterations: MAX_IRR_ITERATIONS,
            last_delta: evaluated
                .iter()
                .map(|(_, v)| v.abs())
                .min()
                .unwrap_or(Decimal::MAX),
        });
    };

    let (mut lo, mut lo_val) = pair[0];
    let mut hi = pair[1].0;
    let mut last_delta = lo_val;

    for _ in 0..MAX_BISECTION_ITERATIONS {
        let mid = (lo + hi) / dec!(2);
        let Some((mid_val, _)) = discounted(mid, cash_flows) else {
            break;
        };
        last_delta = mid_val;
        if mid_val.abs() < CONVERGENCE_THRESHOLD {
            return Ok(mid);
        }
        if (hi - lo).abs() < BISECTION_WIDTH {
            return Ok(newton(cash_flows, mid).unwrap_or(mid));
        }
        if mid_val.is_sign_negative() == lo_val.is_sign_negative() {
            lo = mid;
            lo_val = mid_val;
        } else {
            hi = mid;
        }
    }

    Err(ProjectEvalError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS + MAX_BISECTION_ITERATIONS,
        last_delta,
    })
}

/// NPV and its derivative with respect to the rate. `None` when an
/// intermediate value leaves the Decimal range.
fn discounted(rate: Rate, cash_flows: &[Money]) -> Option<(Money, Money)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut value = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            match discount.checked_mul(one_plus_r) {
                Some(d) => discount = d,
                // Remaining terms are below Decimal resolution
                None if one_plus_r > Decimal::ONE => break,
                None => return None,
            }
        }
        value = value.checked_add(cf.checked_div(discount)?)?;
        if t > 0 {
            let term = Decimal::from(t as u64)
                .checked_mul(*cf)?
                .checked_div(discount.checked_mul(one_plus_r)?)?;
            derivative = derivative.checked_sub(term)?;
        }
    }
    Some((value, derivative))
}

/// Annuity payment that amortizes `present_value` over `nper` periods.
pub fn pmt(rate: Rate, nper: u32, present_value: Money, future_value: Money) -> ProjectEvalResult<Money> {
    if nper == 0 {
        return Err(ProjectEvalError::invalid("nper", "Number of periods must be > 0"));
    }

    if rate.is_zero() {
        return Ok(-(present_value + future_value) / Decimal::from(nper));
    }

    let one_plus_r = Decimal::ONE + rate;
    let factor = one_plus_r.powd(Decimal::from(nper));
    let annuity_factor = (factor - Decimal::ONE) / rate;

    if annuity_factor.is_zero() {
        return Err(ProjectEvalError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    Ok(-(present_value * factor + future_value) / annuity_factor)
}

/// Running sum of a flow sequence.
pub fn cumulative(cash_flows: &[Money]) -> Vec<Money> {
    let mut running = Decimal::ZERO;
    cash_flows
        .iter()
        .map(|cf| {
            running += cf;
            running
        })
        .collect()
}

/// Outcome of a payback search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payback {
    /// 1-based period in which the cumulative flow first becomes non-negative
    Recovered(u32),
    NotRecovered,
}

impl Payback {
    pub fn period(self) -> Option<u32> {
        match self {
            Payback::Recovered(n) => Some(n),
            Payback::NotRecovered => None,
        }
    }
}

/// First 1-based period whose cumulative flow is non-negative.
pub fn payback_period(cumulative_flows: &[Money]) -> Payback {
    cumulative_flows
        .iter()
        .position(|c| *c >= Decimal::ZERO)
        .map(|i| Payback::Recovered(i as u32 + 1))
        .unwrap_or(Payback::NotRecovered)
}

/// Static payback with linear interpolation inside the recovery period:
/// `T - 1 + |cum[T-1]| / flow[T]`. `None` when never recovered.
pub fn payback_period_interpolated(cash_flows: &[Money]) -> Option<Decimal> {
    let cum = cumulative(cash_flows);
    let recovered = payback_period(&cum).period()?;
    let idx = (recovered - 1) as usize;

    let prior = if idx == 0 { Decimal::ZERO } else { cum[idx - 1] };
    let flow = cash_flows[idx];
    if flow.is_zero() {
        return Some(Decimal::from(recovered));
    }
    Some(Decimal::from(recovered - 1) + prior.abs() / flow)
}
