use proptest::prelude::*;

use super::mock_device::Behavior;

/// Any behavior a single stage call can exhibit, hangs excluded
pub fn stage_behavior_strategy() -> impl Strategy<Value = Behavior> {
    prop_oneof![
        4 => Just(Behavior::Succeed),
        2 => Just(Behavior::PendingSucceed),
        2 => Just(Behavior::Fail),
        2 => Just(Behavior::PendingFail),
        1 => Just(Behavior::Panic),
    ]
}

/// Per-device behavior for (set_mode, arm, takeoff)
pub fn device_script_strategy() -> impl Strategy<Value = (Behavior, Behavior, Behavior)> {
    (
        stage_behavior_strategy(),
        stage_behavior_strategy(),
        stage_behavior_strategy(),
    )
}

/// A fleet of 0..24 scripted devices
pub fn fleet_script_strategy() -> impl Strategy<Value = Vec<(Behavior, Behavior, Behavior)>> {
    prop::collection::vec(device_script_strategy(), 0..24)
}

/// Altitudes the handler must accept
pub fn valid_altitude_strategy() -> impl Strategy<Value = f64> {
    (1u32..=200_000).prop_map(|mm| f64::from(mm) / 1_000.0)
}

/// Altitudes the handler must reject
pub fn invalid_altitude_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        (-1_000_000i32..=0).prop_map(|mm| f64::from(mm) / 1_000.0),
        (200_001u32..=10_000_000).prop_map(|mm| f64::from(mm) / 1_000.0),
    ]
}
