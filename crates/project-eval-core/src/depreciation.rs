//! Straight-line depreciation and amortization per asset class.
//!
//! Self-held portions are charged evenly from the first operation period
//! until net value reaches zero. Disposed portions are recognized in full at
//! the first operation period and written off on the disposal schedule.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::disposal::DisposalSchedule;
use crate::inputs::ProjectInputs;
use crate::investment::AssetFormation;
use crate::period::{sum_series, PeriodSeries, TimeHorizon};
use crate::types::{Money, Rate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssetClass {
    Building,
    Equipment,
    LandUseRight,
    Patent,
    Other,
    DisposedBuilding,
    DisposedLand,
}

impl AssetClass {
    pub fn label(self) -> &'static str {
        match self {
            AssetClass::Building => "房屋建筑物",
            AssetClass::Equipment => "机器设备",
            AssetClass::LandUseRight => "土地使用权",
            AssetClass::Patent => "专利及专有技术",
            AssetClass::Other => "其他资产",
            AssetClass::DisposedBuilding => "处置房屋建筑物",
            AssetClass::DisposedLand => "处置土地使用权",
        }
    }

    /// Fixed assets depreciate; everything else amortizes.
    pub fn is_depreciable(self) -> bool {
        matches!(
            self,
            AssetClass::Building | AssetClass::Equipment | AssetClass::DisposedBuilding
        )
    }

    pub fn is_disposed(self) -> bool {
        matches!(self, AssetClass::DisposedBuilding | AssetClass::DisposedLand)
    }
}

/// Timelines for one asset sub-class.
#[derive(Debug, Clone, Serialize)]
pub struct AssetSchedule {
    pub class: AssetClass,
    /// Value recognized; non-zero only at the first operation period
    pub base: Money,
    pub useful_life: u32,
    pub salvage_rate: Rate,
    pub original_value: PeriodSeries,
    pub charge: PeriodSeries,
    pub net_value: PeriodSeries,
}

/// Straight-line periodic charge. A zero useful life means the class is
/// absent and charges nothing.
pub fn periodic_charge(value: Money, useful_life: u32, salvage_rate: Rate) -> Money {
    if useful_life == 0 {
        return Decimal::ZERO;
    }
    value * (Decimal::ONE - salvage_rate) / Decimal::from(useful_life)
}

/// Schedule for a self-held portion.
pub fn straight_line(
    horizon: &TimeHorizon,
    class: AssetClass,
    value: Money,
    useful_life: u32,
    salvage_rate: Rate,
) -> AssetSchedule {
    let per_period = periodic_charge(value, useful_life, salvage_rate);
    let mut schedule = recognize(horizon, class, value, useful_life, salvage_rate);

    let mut remaining = value;
    for n in horizon.operation_period_numbers() {
        let charge = per_period.min(remaining).max(Decimal::ZERO);
        remaining -= charge;
        schedule.charge.set(n, charge);
        schedule.net_value.set(n, remaining.max(Decimal::ZERO));
    }
    schedule
}

/// Schedule for a disposed portion: written off along `recognition`, which
/// holds the amount recognized per period.
pub fn disposal_write_off(
    horizon: &TimeHorizon,
    class: AssetClass,
    cost: Money,
    recognition: &PeriodSeries,
) -> AssetSchedule {
    let mut schedule = recognize(horizon, class, cost, 0, Decimal::ZERO);

    let mut remaining = cost;
    for n in horizon.operation_period_numbers() {
        let charge = recognition.get(n).min(remaining).max(Decimal::ZERO);
        remaining -= charge;
        schedule.charge.set(n, charge);
        schedule.net_value.set(n, remaining.max(Decimal::ZERO));
    }
    schedule
}

fn recognize(
    horizon: &TimeHorizon,
    class: AssetClass,
    value: Money,
    useful_life: u32,
    salvage_rate: Rate,
) -> AssetSchedule {
    let mut original_value = horizon.zero_series();
    original_value.set(horizon.first_operation_period(), value);
    AssetSchedule {
        class,
        base: value,
        useful_life,
        salvage_rate,
        original_value,
        charge: horizon.zero_series(),
        net_value: horizon.zero_series(),
    }
}

/// All asset schedules plus the combined depreciation and amortization maps.
#[derive(Debug, Clone, Serialize)]
pub struct DepreciationResult {
    pub schedules: Vec<AssetSchedule>,
    pub depreciation: PeriodSeries,
    pub amortization: PeriodSeries,
}

impl DepreciationResult {
    pub fn schedule(&self, class: AssetClass) -> Option<&AssetSchedule> {
        self.schedules.iter().find(|s| s.class == class)
    }

    pub fn depreciable(&self) -> impl Iterator<Item = &AssetSchedule> {
        self.schedules.iter().filter(|s| s.class.is_depreciable())
    }

    pub fn amortizable(&self) -> impl Iterator<Item = &AssetSchedule> {
        self.schedules.iter().filter(|s| !s.class.is_depreciable())
    }

    /// Net value summed over the given classes.
    pub fn net_value_of(&self, horizon: &TimeHorizon, classes: &[AssetClass]) -> PeriodSeries {
        sum_series(
            horizon,
            self.schedules
                .iter()
                .filter(|s| classes.contains(&s.class))
                .map(|s| &s.net_value),
        )
    }

    pub fn total_original_value(&self, horizon: &TimeHorizon) -> PeriodSeries {
        sum_series(horizon, self.schedules.iter().map(|s| &s.original_value))
    }

    pub fn total_net_value(&self, horizon: &TimeHorizon) -> PeriodSeries {
        sum_series(horizon, self.schedules.iter().map(|s| &s.net_value))
    }

    pub fn total_charge(&self) -> PeriodSeries {
        self.depreciation.plus(&self.amortization)
    }
}

pub fn calculate_depreciation(
    horizon: &TimeHorizon,
    inputs: &ProjectInputs,
    formation: &AssetFormation,
    disposal: &DisposalSchedule,
) -> DepreciationResult {
    let assets = &inputs.assets;
    let plan = &inputs.disposal;

    let schedules = vec![
        straight_line(
            horizon,
            AssetClass::Building,
            formation.building * plan.building_self_hold_ratio(),
            assets.building.useful_life,
            assets.building.salvage_rate,
        ),
        straight_line(
            horizon,
            AssetClass::Equipment,
            formation.equipment,
            assets.equipment.useful_life,
            assets.equipment.salvage_rate,
        ),
        disposal_write_off(horizon, AssetClass::DisposedBuilding, disposal.building_cost, &disposal.cost),
        straight_line(
            horizon,
            AssetClass::LandUseRight,
            formation.land_use_right * plan.land_self_hold_ratio(),
            assets.land_use_right.useful_life,
            Decimal::ZERO,
        ),
        straight_line(
            horizon,
            AssetClass::Patent,
            formation.patent,
            assets.patent.useful_life,
            Decimal::ZERO,
        ),
        straight_line(
            horizon,
            AssetClass::Other,
            formation.other_asset,
            assets.other.useful_life,
            Decimal::ZERO,
        ),
        disposal_write_off(
            horizon,
            AssetClass::DisposedLand,
            disposal.land_cost,
            &disposal.land_amortization,
        ),
    ];

    let depreciation = sum_series(
        horizon,
        schedules.iter().filter(|s| s.class.is_depreciable()).map(|s| &s.charge),
    );
    let amortization = sum_series(
        horizon,
        schedules.iter().filter(|s| !s.class.is_depreciable()).map(|s| &s.charge),
    );

    DepreciationResult {
        schedules,
        depreciation,
        amortization,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_building_straight_line() {
        let h = TimeHorizon::new(3, 17).unwrap();
        let s = straight_line(&h, AssetClass::Building, dec!(100000), 20, dec!(0.05));
        for n in 1..=3 {
            assert_eq!(s.charge.get(n), Decimal::ZERO);
        }
        for n in 4..=20 {
            assert_eq!(s.charge.get(n), dec!(4750));
        }
        assert_eq!(s.original_value.get(4), dec!(100000));
        assert_eq!(s.original_value.get(5), Decimal::ZERO);
        assert_eq!(s.net_value.get(20), dec!(100000) - dec!(4750) * dec!(17));
    }

    #[test]
    fn test_zero_life_charges_nothing() {
        assert_eq!(periodic_charge(dec!(500), 0, dec!(0.05)), Decimal::ZERO);
        let h = TimeHorizon::new(1, 3).unwrap();
        let s = straight_line(&h, AssetClass::Patent, dec!(500), 0, Decimal::ZERO);
        assert_eq!(s.charge.sum(), Decimal::ZERO);
        assert_eq!(s.net_value.get(4), dec!(500));
    }

    #[test]
    fn test_net_value_clamped_at_zero() {
        let h = TimeHorizon::new(1, 8).unwrap();
        let s = straight_line(&h, AssetClass::Other, dec!(300), 5, Decimal::ZERO);
        assert_eq!(s.charge.get(2), dec!(60));
        assert_eq!(s.charge.get(6), dec!(60));
        assert_eq!(s.charge.get(7), Decimal::ZERO);
        assert_eq!(s.net_value.get(9), Decimal::ZERO);
        let mut previous = s.net_value.get(2);
        for n in 3..=9 {
            assert!(s.net_value.get(n) <= previous);
            previous = s.net_value.get(n);
        }
    }

    #[test]
    fn test_disposed_write_off_follows_schedule() {
        let h = TimeHorizon::new(3, 17).unwrap();
        let mut recognition = h.zero_series();
        recognition.set(4, dec!(2500));
        recognition.set(5, dec!(7500));
        recognition.set(6, dec!(7500));
        recognition.set(7, dec!(7500));
        let s = disposal_write_off(&h, AssetClass::DisposedBuilding, dec!(25000), &recognition);
        assert_eq!(s.original_value.get(4), dec!(25000));
        assert_eq!(s.net_value.get(4), dec!(22500));
        assert_eq!(s.net_value.get(7), Decimal::ZERO);
        assert_eq!(s.charge.sum(), dec!(25000));
    }
}
