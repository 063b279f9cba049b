//! Period index for a construction-then-operation calculation horizon.
//!
//! Periods are numbered from 1. Numbers `1..=C` are construction periods and
//! `C+1..=C+O` are operation periods. Every per-period quantity in the engine
//! is a [`PeriodSeries`] of exactly `C+O` entries; the label↔number mapping
//! (`第n年`) lives here and nowhere else.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ProjectEvalError;
use crate::types::Money;
use crate::ProjectEvalResult;

const LABEL_PREFIX: &str = "第";
const LABEL_SUFFIX: &str = "年";
/// Upper bound on either phase length.
pub const MAX_PHASE_PERIODS: u32 = 100;

/// Classification of a single period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Construction,
    Operation,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Construction => "建设期",
            Phase::Operation => "运营期",
        }
    }
}

/// Construction and operation lengths of one calculation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeHorizon {
    construction_periods: u32,
    operation_periods: u32,
}

impl TimeHorizon {
    pub fn new(construction_periods: u32, operation_periods: u32) -> ProjectEvalResult<Self> {
        if construction_periods == 0 {
            return Err(ProjectEvalError::invalid(
                "construction_periods",
                "Construction period must be at least 1",
            ));
        }
        if operation_periods == 0 {
            return Err(ProjectEvalError::invalid(
                "operation_periods",
                "Operation period must be at least 1",
            ));
        }
        for (field, value) in [
            ("construction_periods", construction_periods),
            ("operation_periods", operation_periods),
        ] {
            if value > MAX_PHASE_PERIODS {
                return Err(ProjectEvalError::invalid(
                    field,
                    format!("At most {MAX_PHASE_PERIODS} periods are supported, got {value}"),
                ));
            }
        }
        Ok(Self {
            construction_periods,
            operation_periods,
        })
    }

    pub fn construction_periods(&self) -> u32 {
        self.construction_periods
    }

    pub fn operation_periods(&self) -> u32 {
        self.operation_periods
    }

    pub fn total_periods(&self) -> u32 {
        self.construction_periods + self.operation_periods
    }

    pub fn first_operation_period(&self) -> u32 {
        self.construction_periods + 1
    }

    pub fn last_period(&self) -> u32 {
        self.total_periods()
    }

    /// Label of period `n`, e.g. `第4年`.
    pub fn label(&self, n: u32) -> ProjectEvalResult<String> {
        self.check_period(n)?;
        Ok(format_label(n))
    }

    /// Period number for a label produced by [`TimeHorizon::label`].
    pub fn index_of(&self, label: &str) -> ProjectEvalResult<u32> {
        let n = label
            .trim()
            .strip_prefix(LABEL_PREFIX)
            .and_then(|rest| rest.strip_suffix(LABEL_SUFFIX))
            .and_then(|digits| digits.parse::<u32>().ok())
            .ok_or_else(|| {
                ProjectEvalError::invalid("period_label", format!("Unrecognised period label '{label}'"))
            })?;
        self.check_period(n)?;
        Ok(n)
    }

    pub fn is_construction(&self, n: u32) -> bool {
        n >= 1 && n <= self.construction_periods
    }

    pub fn is_operation(&self, n: u32) -> bool {
        n > self.construction_periods && n <= self.total_periods()
    }

    pub fn phase(&self, n: u32) -> Option<Phase> {
        if self.is_construction(n) {
            Some(Phase::Construction)
        } else if self.is_operation(n) {
            Some(Phase::Operation)
        } else {
            None
        }
    }

    /// 0-based position of an operation period (first operation period = 0).
    pub fn operation_offset(&self, n: u32) -> Option<usize> {
        if self.is_operation(n) {
            Some((n - self.construction_periods - 1) as usize)
        } else {
            None
        }
    }

    /// 0-based position of a construction period.
    pub fn construction_offset(&self, n: u32) -> Option<usize> {
        if self.is_construction(n) {
            Some((n - 1) as usize)
        } else {
            None
        }
    }

    /// Period numbers in order.
    pub fn periods(&self) -> impl Iterator<Item = u32> {
        1..=self.total_periods()
    }

    pub fn operation_period_numbers(&self) -> impl Iterator<Item = u32> {
        self.first_operation_period()..=self.total_periods()
    }

    pub fn labels(&self) -> Vec<String> {
        self.periods().map(format_label).collect()
    }

    pub fn zero_series(&self) -> PeriodSeries {
        self.filled_series(Decimal::ZERO)
    }

    pub fn filled_series(&self, default: Money) -> PeriodSeries {
        PeriodSeries(vec![default; self.total_periods() as usize])
    }

    /// Spread an operation-indexed input list over the horizon. Missing
    /// entries are zero; entries beyond the operation period are dropped
    /// (callers report them).
    pub fn operation_series(&self, values: &[Money]) -> PeriodSeries {
        let mut series = self.zero_series();
        for n in self.operation_period_numbers() {
            if let Some(offset) = self.operation_offset(n) {
                series.set(n, values.get(offset).copied().unwrap_or(Decimal::ZERO));
            }
        }
        series
    }

    /// Same value in every operation period, zero during construction.
    pub fn operation_constant(&self, value: Money) -> PeriodSeries {
        let mut series = self.zero_series();
        for n in self.operation_period_numbers() {
            series.set(n, value);
        }
        series
    }

    fn check_period(&self, n: u32) -> ProjectEvalResult<()> {
        if n == 0 || n > self.total_periods() {
            return Err(ProjectEvalError::invalid(
                "period",
                format!("Period {n} is outside 1..={}", self.total_periods()),
            ));
        }
        Ok(())
    }
}

fn format_label(n: u32) -> String {
    format!("{LABEL_PREFIX}{n}{LABEL_SUFFIX}")
}

/// Fixed-length per-period values, addressed by 1-based period number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PeriodSeries(Vec<Money>);

impl PeriodSeries {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value in period `n`; zero for a period outside the horizon.
    pub fn get(&self, n: u32) -> Money {
        n.checked_sub(1)
            .and_then(|i| self.0.get(i as usize))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn set(&mut self, n: u32, value: Money) {
        if let Some(slot) = n.checked_sub(1).and_then(|i| self.0.get_mut(i as usize)) {
            *slot = value;
        }
    }

    pub fn add(&mut self, n: u32, value: Money) {
        if let Some(slot) = n.checked_sub(1).and_then(|i| self.0.get_mut(i as usize)) {
            *slot += value;
        }
    }

    pub fn values(&self) -> &[Money] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Money> {
        self.0.iter()
    }

    pub fn sum(&self) -> Money {
        self.0.iter().sum()
    }

    /// Running total; the last entry equals [`PeriodSeries::sum`].
    pub fn cumulative(&self) -> PeriodSeries {
        let mut running = Decimal::ZERO;
        PeriodSeries(
            self.0
                .iter()
                .map(|v| {
                    running += v;
                    running
                })
                .collect(),
        )
    }

    pub fn scaled(&self, factor: Decimal) -> PeriodSeries {
        PeriodSeries(self.0.iter().map(|v| v * factor).collect())
    }

    pub fn plus(&self, other: &PeriodSeries) -> PeriodSeries {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn minus(&self, other: &PeriodSeries) -> PeriodSeries {
        self.zip_with(other, |a, b| a - b)
    }

    pub fn map(&self, f: impl Fn(Money) -> Money) -> PeriodSeries {
        PeriodSeries(self.0.iter().map(|v| f(*v)).collect())
    }

    fn zip_with(&self, other: &PeriodSeries, f: impl Fn(Money, Money) -> Money) -> PeriodSeries {
        debug_assert_eq!(self.len(), other.len(), "series from different horizons");
        PeriodSeries(
            self.0
                .iter()
                .enumerate()
                .map(|(i, a)| f(*a, other.0.get(i).copied().unwrap_or(Decimal::ZERO)))
                .collect(),
        )
    }
}

/// Sum several same-horizon series element-wise.
pub fn sum_series<'a>(
    horizon: &TimeHorizon,
    series: impl IntoIterator<Item = &'a PeriodSeries>,
) -> PeriodSeries {
    series
        .into_iter()
        .fold(horizon.zero_series(), |acc, s| acc.plus(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_labels_and_classification() {
        let h = TimeHorizon::new(3, 17).unwrap();
        assert_eq!(h.total_periods(), 20);
        assert_eq!(h.labels().len(), 20);
        assert_eq!(h.labels()[0], "第1年");
        assert_eq!(h.labels()[19], "第20年");
        assert!(h.is_construction(3));
        assert!(!h.is_operation(3));
        assert!(h.is_operation(4));
        assert!(!h.is_construction(4));
        assert_eq!(h.phase(21), None);
        assert_eq!(h.first_operation_period(), 4);
        assert_eq!(h.operation_offset(4), Some(0));
        assert_eq!(h.operation_offset(2), None);
    }

    #[test]
    fn test_label_round_trip() {
        let h = TimeHorizon::new(2, 5).unwrap();
        for n in h.periods() {
            let label = h.label(n).unwrap();
            assert_eq!(h.index_of(&label).unwrap(), n);
        }
        assert!(h.label(0).is_err());
        assert!(h.label(8).is_err());
        assert!(h.index_of("第8年").is_err());
        assert!(h.index_of("year 1").is_err());
    }

    #[test]
    fn test_rejects_oversized_phases() {
        assert!(TimeHorizon::new(MAX_PHASE_PERIODS, MAX_PHASE_PERIODS).is_ok());
        assert!(matches!(
            TimeHorizon::new(u32::MAX - 1, 4),
            Err(ProjectEvalError::InvalidInput { ref field, .. }) if field == "construction_periods"
        ));
        assert!(matches!(
            TimeHorizon::new(3, MAX_PHASE_PERIODS + 1),
            Err(ProjectEvalError::InvalidInput { ref field, .. }) if field == "operation_periods"
        ));
    }

    #[test]
    fn test_rejects_empty_phases() {
        assert!(matches!(
            TimeHorizon::new(0, 10),
            Err(ProjectEvalError::InvalidInput { ref field, .. }) if field == "construction_periods"
        ));
        assert!(matches!(
            TimeHorizon::new(2, 0),
            Err(ProjectEvalError::InvalidInput { ref field, .. }) if field == "operation_periods"
        ));
    }

    #[test]
    fn test_operation_series_zero_fills() {
        let h = TimeHorizon::new(2, 3).unwrap();
        let s = h.operation_series(&[dec!(10), dec!(20)]);
        assert_eq!(
            s.values(),
            &[dec!(0), dec!(0), dec!(10), dec!(20), dec!(0)]
        );
    }

    #[test]
    fn test_cumulative_last_equals_sum() {
        let h = TimeHorizon::new(1, 3).unwrap();
        let mut s = h.zero_series();
        s.set(1, dec!(-100));
        s.set(2, dec!(40));
        s.set(3, dec!(40));
        s.set(4, dec!(40));
        let cum = s.cumulative();
        assert_eq!(cum.get(4), s.sum());
        assert_eq!(cum.get(2), dec!(-60));
        assert_eq!(s.get(0), Decimal::ZERO);
        assert_eq!(s.get(99), Decimal::ZERO);
    }
}
