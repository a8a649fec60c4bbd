// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::sync::Arc;

use proptest::prelude::*;
use thermgov::governor::{
    ControlOutput, Governor, GovernorOptions, IrOverheatCase, SensorSample,
};
use thermgov::profile::{ModeTier, PerformanceMode, PlatformProfile, PlatformVariant};

fn reference() -> PlatformProfile {
    PlatformProfile::reference().unwrap()
}

fn governor_with(profile: PlatformProfile, options: GovernorOptions) -> Governor {
    Governor::new(Arc::new(profile), options).unwrap()
}

fn variant(index: u8) -> PlatformVariant {
    PlatformVariant::try_from(index).unwrap()
}

fn tier(index: u8) -> ModeTier {
    ModeTier::try_from(index).unwrap()
}

fn sample(cpu: f64, ir: f64, gpu_usage: f64, mode_tier: ModeTier) -> SensorSample {
    SensorSample {
        cpu: Some(cpu),
        gpu: Some(50.0),
        ambient: Some(30.0),
        ir: Some(ir),
        gpu_usage: Some(gpu_usage),
        mode_tier: Some(mode_tier),
        ..Default::default()
    }
}

/// Drive `ticks` short ticks with a long cycle every 30, collecting the IR
/// events fired per cycle and every output.
fn drive(
    governor: &mut Governor,
    ticks: usize,
    mut sample_at: impl FnMut(usize) -> SensorSample,
) -> (Vec<Option<IrOverheatCase>>, Vec<ControlOutput>) {
    let mut events = Vec::new();
    let mut outputs = Vec::new();
    for i in 0..ticks {
        outputs.push(governor.tick(Some(&sample_at(i))));
        if governor.ir_cycle_due() {
            let event = governor.long_cycle();
            outputs.push(governor.output(event));
            events.push(event);
        }
    }
    (events, outputs)
}

// ==================== IR overheat scenario ====================

#[test]
fn test_ir_overheat_steps_pl1_down_to_tier_floor() {
    let mut governor = governor_with(
        reference(),
        GovernorOptions {
            variant: variant(2),
            ..Default::default()
        },
    );
    let l2 = tier(2);

    // 30 quiet ticks, then the IR sensor climbs past 50 °C and stays there
    let (events, outputs) = drive(&mut governor, 330, |i| {
        let ir = if i < 30 { 36.0 } else { 53.0 };
        sample(60.0, ir, 5.0, l2)
    });

    assert_eq!(events.len(), 11);
    assert_eq!(events[0], None);
    for event in &events[1..] {
        assert_eq!(*event, Some(IrOverheatCase::IrOverheatThresholdDecreasePl1));
    }

    let pl1_after_events: Vec<i32> = outputs
        .iter()
        .filter(|o| o.ir_event.is_some())
        .map(|o| o.pl1.current)
        .collect();
    assert_eq!(
        pl1_after_events,
        vec![50, 45, 40, 35, 30, 25, 25, 25, 25, 25]
    );
    assert!(outputs.iter().all(|o| o.pl1.current >= 25));
    assert!(outputs.iter().all(|o| o.pl1.lower == 25));
}

#[test]
fn test_ir_release_raises_pl1_back() {
    let mut governor = governor_with(
        reference(),
        GovernorOptions {
            variant: variant(2),
            ..Default::default()
        },
    );
    let l2 = tier(2);

    // two overheat cycles, then a long cool-down below the release threshold
    let (_, outputs) = drive(&mut governor, 60, |_| sample(60.0, 53.0, 5.0, l2));
    assert_eq!(outputs.last().unwrap().pl1.current, 45);

    let (events, _) = drive(&mut governor, 300, |_| sample(60.0, 20.0, 5.0, l2));
    assert!(events
        .iter()
        .flatten()
        .any(|e| *e == IrOverheatCase::IrReleaseThresholdIncreasePl1));
    assert_eq!(governor.state().pl1, 55);
}

#[test]
fn test_gps_reduction_between_thresholds() {
    // variant 1: overheat 46, gps 45
    let mut governor = governor_with(
        reference(),
        GovernorOptions {
            variant: variant(1),
            ..Default::default()
        },
    );
    let (events, _) = drive(&mut governor, 30, |_| sample(60.0, 45.5, 5.0, tier(0)));
    assert_eq!(events, vec![Some(IrOverheatCase::IrGpsThresholdDecreaseGps)]);
    assert_eq!(governor.state().gps, 95);
}

#[test]
fn test_profile_ir_cycle_sets_evaluation_cadence() {
    let mut profile = reference();
    profile.ir_cycle = 10;
    let mut governor = governor_with(
        profile,
        GovernorOptions {
            variant: variant(2),
            ..Default::default()
        },
    );
    let (events, outputs) = drive(&mut governor, 30, |_| sample(60.0, 53.0, 5.0, tier(2)));

    assert_eq!(
        events,
        vec![Some(IrOverheatCase::IrOverheatThresholdDecreasePl1); 3]
    );
    let pl1: Vec<i32> = outputs
        .iter()
        .filter(|o| o.ir_event.is_some())
        .map(|o| o.pl1.current)
        .collect();
    assert_eq!(pl1, vec![50, 45, 40]);
}

#[test]
fn test_long_cycle_waits_for_full_ir_cycle() {
    let mut governor = governor_with(reference(), GovernorOptions::default());
    for _ in 0..29 {
        governor.tick(Some(&sample(60.0, 53.0, 5.0, tier(2))));
        assert_eq!(governor.long_cycle(), None);
    }
    governor.tick(Some(&sample(60.0, 53.0, 5.0, tier(2))));
    assert!(governor.long_cycle().is_some());
}

// ==================== Overheat clamp ====================

fn without_ir(cpu: f64) -> SensorSample {
    SensorSample {
        cpu: Some(cpu),
        gpu: Some(50.0),
        ambient: Some(30.0),
        gpu_usage: Some(5.0),
        ..Default::default()
    }
}

#[test]
fn test_overheat_clamp_lifts_without_ir_channel() {
    let mut governor = governor_with(reference(), GovernorOptions::default());
    let out = governor.tick(Some(&without_ir(95.0)));
    assert!(out.overheat);
    assert_eq!(out.pl1.current, 25);

    let (events, outputs) = drive(&mut governor, 300, |_| without_ir(50.0));
    assert!(events.is_empty());
    let last = outputs.last().unwrap();
    assert!(!last.overheat);
    assert_eq!(last.pl1.current, 55);
    assert_eq!(last.pl1.upper, 55);
    assert_eq!(governor.state().pl1_hold, None);
}

#[test]
fn test_overheat_clamp_holds_while_hot() {
    let mut governor = governor_with(reference(), GovernorOptions::default());
    let (_, outputs) = drive(&mut governor, 20, |_| without_ir(95.0));
    assert!(outputs.iter().all(|o| o.overheat && o.pl1.current == 25));
    assert_eq!(governor.state().pl1_hold, Some(55));
}

// ==================== Mode tier ====================

#[test]
fn test_mode_tier_kept_when_sample_omits_it() {
    let mut governor = governor_with(
        reference(),
        GovernorOptions {
            mode: PerformanceMode::L5,
            ..Default::default()
        },
    );
    assert_eq!(governor.bounds().lower, 35);

    let mut untagged = sample(60.0, 30.0, 5.0, tier(0));
    untagged.mode_tier = None;
    let out = governor.tick(Some(&untagged));
    assert_eq!(out.pl1.lower, 35);
    assert_eq!(governor.tier(), tier(5));

    // a platform-reported tier still takes over
    let out = governor.tick(Some(&sample(60.0, 30.0, 5.0, tier(2))));
    assert_eq!(out.pl1.lower, 25);
}

#[test]
fn test_mode_change_tier_survives_untagged_ticks() {
    let mut governor = governor_with(reference(), GovernorOptions::default());
    governor.apply_performance_mode(PerformanceMode::L6);
    let out = governor.tick(Some(&without_ir(60.0)));
    assert_eq!(governor.tier(), tier(6));
    assert_eq!(out.pl1.lower, 35);
}

// ==================== PL1 bound arbitration ====================

#[test]
fn test_gaming_bound_tightens_configured_bound() {
    let mut profile = reference();
    profile.pl1_upper_bounds.gaming = 70;
    let mut governor = governor_with(
        profile,
        GovernorOptions {
            mode: PerformanceMode::Performance,
            ..Default::default()
        },
    );
    assert_eq!(governor.state().configured_upper_bound, 90);

    let out = governor.tick(Some(&sample(60.0, 30.0, 35.0, tier(0))));
    assert_eq!(out.pl1.upper, 70);

    let out = governor.tick(Some(&sample(60.0, 30.0, 12.0, tier(0))));
    assert_eq!(out.pl1.upper, 90);
}

#[test]
fn test_gaming_bound_never_loosens() {
    let mut profile = reference();
    profile.pl1_upper_bounds.gaming = 95;
    let mut governor = governor_with(
        profile,
        GovernorOptions {
            mode: PerformanceMode::Performance,
            ..Default::default()
        },
    );
    let out = governor.tick(Some(&sample(60.0, 30.0, 35.0, tier(0))));
    assert_eq!(out.pl1.upper, 90);
}

#[test]
fn test_gaming_threshold_override() {
    let mut profile = reference();
    profile.pl1_upper_bounds.gaming = 70;
    let mut governor = governor_with(
        profile,
        GovernorOptions {
            mode: PerformanceMode::Performance,
            gaming_usage_threshold: Some(50.0),
            ..Default::default()
        },
    );
    let out = governor.tick(Some(&sample(60.0, 30.0, 35.0, tier(0))));
    assert_eq!(out.pl1.upper, 90);
}

#[test]
fn test_higher_tier_raises_lower_bound() {
    let mut governor = governor_with(reference(), GovernorOptions::default());
    let out = governor.tick(Some(&sample(60.0, 30.0, 5.0, tier(6))));
    assert_eq!(out.pl1.lower, 35);
    assert!(out.pl1.current >= 35);
}

proptest! {
    #[test]
    fn prop_pl1_stays_within_bounds(
        steps in prop::collection::vec(
            (30.0f64..100.0, 20.0f64..70.0, 0.0f64..100.0, 0u8..8),
            1..200,
        ),
        variant_index in 0u8..8,
    ) {
        let mut governor = governor_with(
            reference(),
            GovernorOptions {
                variant: variant(variant_index),
                ..Default::default()
            },
        );
        for (i, (cpu, ir, usage, tier_index)) in steps.iter().enumerate() {
            let out = governor.tick(Some(&sample(*cpu, *ir, *usage, tier(*tier_index))));
            prop_assert!(out.pl1.lower <= out.pl1.current);
            prop_assert!(out.pl1.current <= out.pl1.upper);
            if i % 30 == 29 {
                governor.long_cycle();
                let out = governor.output(None);
                prop_assert!(out.pl1.lower <= out.pl1.current);
                prop_assert!(out.pl1.current <= out.pl1.upper);
            }
        }
    }
}

// ==================== Smoothing ====================

#[test]
fn test_constant_input_converges_heating_and_cooling() {
    let mut governor = governor_with(reference(), GovernorOptions::default());
    governor.tick(Some(&sample(40.0, 30.0, 5.0, tier(0))));
    for _ in 0..100 {
        governor.tick(Some(&sample(80.0, 30.0, 5.0, tier(0))));
    }
    assert!((governor.state().smoothed.cpu - 80.0).abs() < 1e-6);

    for _ in 0..1000 {
        governor.tick(Some(&sample(40.0, 30.0, 5.0, tier(0))));
    }
    assert!((governor.state().smoothed.cpu - 40.0).abs() < 1e-6);
}

#[test]
fn test_constant_input_converges_idle() {
    let mut governor = governor_with(reference(), GovernorOptions::default());
    governor.tick(Some(&sample(40.0, 30.0, 5.0, tier(0))));
    for _ in 0..400 {
        let mut idle = sample(80.0, 30.0, 5.0, tier(0));
        idle.idle = true;
        governor.tick(Some(&idle));
    }
    assert!((governor.state().smoothed.cpu - 80.0).abs() < 1e-6);
}

// ==================== Fans ====================

#[test]
fn test_fan_outputs_stable_for_identical_input() {
    let mut governor = governor_with(reference(), GovernorOptions::default());
    let first = governor.tick(Some(&sample(70.0, 40.0, 5.0, tier(0))));
    let second = governor.tick(Some(&sample(70.0, 40.0, 5.0, tier(0))));
    assert_eq!(first.fans, second.fans);
    assert!(first.fans.ir.is_some());
}

#[test]
fn test_fan_duty_flat_above_curve() {
    let mut governor = governor_with(reference(), GovernorOptions::default());
    let out = governor.tick(Some(&sample(99.0, 30.0, 5.0, tier(0))));
    // default CPU curve tops out at 40%
    assert_eq!(out.fans.cpu, 40);
}

#[test]
fn test_absent_channel_is_not_a_fault() {
    let mut governor = governor_with(reference(), GovernorOptions::default());
    let out = governor.tick(Some(&SensorSample {
        cpu: Some(55.0),
        gpu: Some(50.0),
        ..Default::default()
    }));
    assert!(!out.sensor_fault);
    assert_eq!(governor.state().ir_cycle_counter, 0);
}

#[test]
fn test_unreadable_channel_is_a_fault() {
    let mut governor = governor_with(reference(), GovernorOptions::default());
    let out = governor.tick(Some(&SensorSample {
        cpu: Some(f64::NAN),
        ..Default::default()
    }));
    assert!(out.sensor_fault);
}
