use proptest::prelude::*;
use project_eval_core::depreciation::{straight_line, AssetClass};
use project_eval_core::disposal::apportion;
use project_eval_core::period::Phase;
use project_eval_core::time_value::{self, Payback};
use project_eval_core::TimeHorizon;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn money() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..1_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn flows() -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(money(), 1..40)
}

proptest! {
    #[test]
    fn horizon_labels_and_phases(c in 1u32..10, o in 1u32..40) {
        let h = TimeHorizon::new(c, o).unwrap();
        let labels = h.labels();
        prop_assert_eq!(labels.len() as u32, c + o);
        for n in h.periods() {
            let expected = if n <= c { Phase::Construction } else { Phase::Operation };
            prop_assert_eq!(h.phase(n), Some(expected));
            prop_assert_eq!(h.index_of(&labels[(n - 1) as usize]).unwrap(), n);
        }
        prop_assert_eq!(h.phase(0), None);
        prop_assert_eq!(h.phase(c + o + 1), None);
    }

    #[test]
    fn npv_at_zero_rate_is_the_sum(cf in flows()) {
        let total: Decimal = cf.iter().sum();
        prop_assert_eq!(time_value::npv(Decimal::ZERO, &cf).unwrap(), total);
    }

    #[test]
    fn cumulative_ends_at_the_sum(cf in flows()) {
        let cum = time_value::cumulative(&cf);
        prop_assert_eq!(cum.len(), cf.len());
        prop_assert_eq!(*cum.last().unwrap(), cf.iter().sum::<Decimal>());
    }

    #[test]
    fn payback_is_first_non_negative_cumulative(cf in flows()) {
        let cum = time_value::cumulative(&cf);
        match time_value::payback_period(&cum) {
            Payback::Recovered(n) => {
                let idx = (n - 1) as usize;
                prop_assert!(cum[idx] >= Decimal::ZERO);
                prop_assert!(cum[..idx].iter().all(|c| *c < Decimal::ZERO));
            }
            Payback::NotRecovered => prop_assert!(cum.iter().all(|c| *c < Decimal::ZERO)),
        }
    }

    #[test]
    fn irr_zeroes_npv_when_it_exists(
        outlay in 1_000i64..100_000,
        inflow in 100i64..50_000,
        years in 2usize..20,
    ) {
        let mut cf = vec![Decimal::from(-outlay)];
        cf.extend(std::iter::repeat(Decimal::from(inflow)).take(years));
        if let Ok(rate) = time_value::irr(&cf, dec!(0.1)) {
            let residual = time_value::npv(rate, &cf).unwrap();
            let tolerance = Decimal::from(outlay) * dec!(0.000000001);
            prop_assert!(residual.abs() <= tolerance, "npv at irr {} is {}", rate, residual);
        }
    }

    #[test]
    fn straight_line_charge_is_even(
        value in 1i64..10_000_000,
        life in 1u32..60,
        salvage_pct in 0u32..=20,
        o in 1u32..30,
    ) {
        prop_assume!(life > o);
        let h = TimeHorizon::new(2, o).unwrap();
        let value = Decimal::from(value);
        let salvage = Decimal::new(salvage_pct as i64, 2);
        let s = straight_line(&h, AssetClass::Equipment, value, life, salvage);
        let expected = value * (Decimal::ONE - salvage) / Decimal::from(life);
        prop_assert_eq!(s.charge.get(1), Decimal::ZERO);
        prop_assert_eq!(s.charge.get(2), Decimal::ZERO);
        for n in h.operation_period_numbers() {
            prop_assert_eq!(s.charge.get(n), expected);
        }
        prop_assert!(s.net_value.get(h.last_period()) >= Decimal::ZERO);
    }

    #[test]
    fn apportionment_reconciles(total in 0i64..1_000_000, o in 4u32..20) {
        let h = TimeHorizon::new(3, o).unwrap();
        let total = Decimal::from(total);
        let ratios = [dec!(0.10), dec!(0.30), dec!(0.30), dec!(0.30)];
        let series = apportion(&h, total, &ratios);
        prop_assert_eq!(series.sum(), total);
        prop_assert_eq!(series.get(3), Decimal::ZERO);
        prop_assert_eq!(series.get(4), total * dec!(0.10));
    }
}
