//! Property tests for gauge math.

use bluefruit_playground_ble::presentation::{FillIndicator, GaugeScale, LevelMeter, NeedleGauge};
use bluefruit_playground_ble::clamp_unit;
use proptest::prelude::*;

proptest! {
    #[test]
    fn normalize_stays_in_unit_range(
        min in -1.0e6f32..1.0e6,
        span in 0.001f32..1.0e6,
        value in proptest::num::f32::ANY,
    ) {
        let scale = GaugeScale::new(min, min + span);
        let progress = scale.normalize(value);
        prop_assert!((0.0..=1.0).contains(&progress));
    }

    #[test]
    fn needle_stays_within_sweep(value in proptest::num::f32::ANY) {
        let gauge = NeedleGauge::PRESSURE;
        let pos = gauge.position(Some(value));
        prop_assert!(pos.degrees >= gauge.min_degrees);
        prop_assert!(pos.degrees <= gauge.max_degrees);
    }

    #[test]
    fn level_meter_never_exceeds_levels(value in proptest::num::f32::ANY) {
        let fill = LevelMeter::SOUND.fill(Some(value));
        prop_assert!(fill.lit <= fill.levels);
        prop_assert!((0.0..=1.0).contains(&fill.proportion));
    }

    #[test]
    fn fills_stay_in_unit_range(value in proptest::num::f32::ANY) {
        prop_assert!((0.0..=1.0).contains(&FillIndicator::HUMIDITY.fill(Some(value))));
        prop_assert!((0.0..=1.0).contains(&FillIndicator::LIGHT.fill(Some(value))));
    }

    #[test]
    fn normalize_is_monotonic(a in 900.0f32..1100.0, b in 900.0f32..1100.0) {
        let scale = GaugeScale::PRESSURE;
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(scale.normalize(lo) <= scale.normalize(hi));
    }

    #[test]
    fn clamp_unit_stays_in_range(value in proptest::num::f32::ANY) {
        prop_assert!((0.0..=1.0).contains(&clamp_unit(value)));
    }
}
