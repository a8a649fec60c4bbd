// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use thermgov::error::{GovernorError, Result};
use thermgov::governor::{ControlOutput, Governor, GovernorOptions, IrOverheatCase, SensorSample};
use thermgov::hardware::{Actuator, ScriptedSensors, SensorSource};
use thermgov::profile::{ModeTier, PlatformProfile, PlatformVariant};
use thermgov::runtime::{GovernorLoop, Heartbeat, LoopConfig};
use tokio::sync::watch;

/// Actuator that keeps everything it is given.
#[derive(Clone, Default)]
struct Recorder {
    outputs: Arc<Mutex<Vec<ControlOutput>>>,
    heartbeats: Arc<Mutex<Vec<Heartbeat>>>,
    fail_apply: bool,
    fail_report: bool,
}

impl Recorder {
    fn failing() -> Self {
        Self {
            fail_apply: true,
            ..Default::default()
        }
    }

    fn failing_reports() -> Self {
        Self {
            fail_report: true,
            ..Default::default()
        }
    }

    fn outputs(&self) -> Vec<ControlOutput> {
        self.outputs.lock().unwrap().clone()
    }

    fn heartbeats(&self) -> Vec<Heartbeat> {
        self.heartbeats.lock().unwrap().clone()
    }
}

#[async_trait]
impl Actuator for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    async fn apply(&mut self, output: &ControlOutput) -> Result<()> {
        if self.fail_apply {
            return Err(GovernorError::Actuator("fan write rejected".to_string()));
        }
        self.outputs.lock().unwrap().push(output.clone());
        Ok(())
    }

    async fn report(&mut self, heartbeat: &Heartbeat) -> Result<()> {
        if self.fail_report {
            return Err(GovernorError::Actuator("status sink closed".to_string()));
        }
        self.heartbeats.lock().unwrap().push(heartbeat.clone());
        Ok(())
    }
}

/// Sensor source slower than any sane I/O timeout.
struct SlowSensors;

#[async_trait]
impl SensorSource for SlowSensors {
    fn name(&self) -> &str {
        "slow"
    }

    async fn read(&mut self) -> Result<SensorSample> {
        tokio::time::sleep(Duration::from_secs(1)).await;
        Ok(SensorSample::default())
    }
}

/// Fails the first `fail_reads` reads, then returns a healthy sample.
struct FlakySensors {
    fail_reads: u64,
    reads: u64,
}

#[async_trait]
impl SensorSource for FlakySensors {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn read(&mut self) -> Result<SensorSample> {
        self.reads += 1;
        if self.reads <= self.fail_reads {
            return Err(GovernorError::Sensor("i2c timeout".to_string()));
        }
        Ok(sample(55.0, 36.0))
    }
}

fn sample(cpu: f64, ir: f64) -> SensorSample {
    SensorSample {
        cpu: Some(cpu),
        gpu: Some(50.0),
        ambient: Some(30.0),
        ir: Some(ir),
        gpu_usage: Some(5.0),
        mode_tier: Some(ModeTier::try_from(2).unwrap()),
        ..Default::default()
    }
}

fn governor(variant: u8) -> Governor {
    let profile = Arc::new(PlatformProfile::reference().unwrap());
    Governor::new(
        profile,
        GovernorOptions {
            variant: PlatformVariant::try_from(variant).unwrap(),
            ..Default::default()
        },
    )
    .unwrap()
}

fn repeating(sample: SensorSample) -> ScriptedSensors {
    ScriptedSensors::new(vec![sample]).repeat_last(true)
}

#[tokio::test(start_paused = true)]
async fn test_loop_runs_all_three_cadences() {
    let recorder = Recorder::default();
    let control = GovernorLoop::new(
        governor(2),
        repeating(sample(60.0, 36.0)),
        recorder.clone(),
        LoopConfig::default(),
    )
    .unwrap();

    let handle = control.spawn();
    tokio::time::sleep(Duration::from_millis(65_500)).await;
    let summary = handle.stop().await.unwrap();

    assert!((65..=67).contains(&summary.ticks));
    assert_eq!(summary.long_cycles, 2);
    assert_eq!(summary.heartbeats, 2);
    assert_eq!(summary.ir_events, 0);
    assert_eq!(summary.faults.total(), 0);
    assert!(!summary.degraded);

    assert_eq!(recorder.outputs().len() as u64, summary.ticks);
    let beats = recorder.heartbeats();
    assert_eq!(beats.len(), 2);
    assert_eq!(beats[0].cpu_history, vec![60.0, 60.0, 60.0]);
}

#[tokio::test(start_paused = true)]
async fn test_loop_applies_ir_events() {
    let recorder = Recorder::default();
    let control = GovernorLoop::new(
        governor(2),
        repeating(sample(60.0, 53.0)),
        recorder.clone(),
        LoopConfig::default(),
    )
    .unwrap();

    let handle = control.spawn();
    tokio::time::sleep(Duration::from_millis(65_500)).await;
    let summary = handle.stop().await.unwrap();

    assert_eq!(summary.ir_events, 2);
    let events: Vec<(IrOverheatCase, i32)> = recorder
        .outputs()
        .iter()
        .filter_map(|o| o.ir_event.map(|e| (e, o.pl1.current)))
        .collect();
    assert_eq!(
        events,
        vec![
            (IrOverheatCase::IrOverheatThresholdDecreasePl1, 50),
            (IrOverheatCase::IrOverheatThresholdDecreasePl1, 45),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_loop_uses_profile_ir_cycle() {
    let mut profile = PlatformProfile::reference().unwrap();
    profile.ir_cycle = 10;
    let governor = Governor::new(
        Arc::new(profile),
        GovernorOptions {
            variant: PlatformVariant::try_from(2).unwrap(),
            ..Default::default()
        },
    )
    .unwrap();
    let recorder = Recorder::default();
    let control = GovernorLoop::new(
        governor,
        repeating(sample(60.0, 53.0)),
        recorder.clone(),
        LoopConfig::default(),
    )
    .unwrap();

    let handle = control.spawn();
    tokio::time::sleep(Duration::from_millis(29_500)).await;
    let summary = handle.stop().await.unwrap();

    assert_eq!(summary.long_cycles, 0);
    assert_eq!(summary.ir_events, 3);
    let pl1: Vec<i32> = recorder
        .outputs()
        .iter()
        .filter(|o| o.ir_event.is_some())
        .map(|o| o.pl1.current)
        .collect();
    assert_eq!(pl1, vec![50, 45, 40]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_heartbeat_counts_as_actuator_fault() {
    let recorder = Recorder::failing_reports();
    let control = GovernorLoop::new(
        governor(0),
        repeating(sample(55.0, 36.0)),
        recorder.clone(),
        LoopConfig::default(),
    )
    .unwrap();

    let handle = control.spawn();
    tokio::time::sleep(Duration::from_millis(65_500)).await;
    let summary = handle.stop().await.unwrap();

    assert_eq!(summary.heartbeats, 2);
    assert_eq!(summary.faults.actuator_faults, 2);
    assert_eq!(summary.faults.sensor_faults, 0);
    assert!(recorder.heartbeats().is_empty());
    assert_eq!(recorder.outputs().len() as u64, summary.ticks);
}

#[tokio::test(start_paused = true)]
async fn test_persistent_sensor_faults_degrade() {
    let recorder = Recorder::default();
    let control = GovernorLoop::new(
        governor(2),
        ScriptedSensors::new(Vec::new()),
        recorder.clone(),
        LoopConfig::default(),
    )
    .unwrap();

    let handle = control.spawn();
    tokio::time::sleep(Duration::from_millis(95_500)).await;
    let summary = handle.stop().await.unwrap();

    assert!(summary.degraded);
    assert_eq!(summary.faults.sensor_faults, summary.ticks);
    assert_eq!(summary.ir_events, 0);

    let last = recorder.outputs().pop().unwrap();
    assert!(last.degraded);
    assert_eq!(last.pl1.current, last.pl1.lower);
    // default curve maximum
    assert_eq!(last.fans.cpu, 40);

    let beats = recorder.heartbeats();
    assert_eq!(beats.len(), 3);
    assert!(!beats[1].degraded);
    assert!(beats[2].degraded);
}

#[tokio::test(start_paused = true)]
async fn test_clean_long_cycle_leaves_degraded() {
    let recorder = Recorder::default();
    let control = GovernorLoop::new(
        governor(2),
        FlakySensors {
            fail_reads: 90,
            reads: 0,
        },
        recorder.clone(),
        LoopConfig::default(),
    )
    .unwrap();

    let handle = control.spawn();
    tokio::time::sleep(Duration::from_millis(100_500)).await;
    assert!(recorder.outputs().last().unwrap().degraded);

    tokio::time::sleep(Duration::from_millis(25_000)).await;
    let summary = handle.stop().await.unwrap();
    assert!(!summary.degraded);
    assert_eq!(summary.faults.faulted_cycles, 0);
    assert_eq!(summary.faults.sensor_faults, 90);
    assert!(!recorder.outputs().last().unwrap().degraded);
}

#[tokio::test(start_paused = true)]
async fn test_slow_sensor_counts_missed_ticks() {
    let recorder = Recorder::default();
    let control = GovernorLoop::new(governor(0), SlowSensors, recorder.clone(), LoopConfig::default())
        .unwrap();

    let handle = control.spawn();
    tokio::time::sleep(Duration::from_millis(5_500)).await;
    let summary = handle.stop().await.unwrap();

    assert_eq!(summary.ticks, 0);
    assert!(summary.faults.missed_ticks >= 5);
    assert!(recorder.outputs().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_actuator_faults_degrade() {
    let recorder = Recorder::failing();
    let control = GovernorLoop::new(
        governor(0),
        repeating(sample(55.0, 36.0)),
        recorder.clone(),
        LoopConfig::default(),
    )
    .unwrap();

    let handle = control.spawn();
    tokio::time::sleep(Duration::from_millis(95_500)).await;
    let summary = handle.stop().await.unwrap();

    assert!(summary.degraded);
    assert_eq!(summary.faults.sensor_faults, 0);
    assert_eq!(summary.faults.actuator_faults, summary.ticks);
    assert!(recorder.heartbeats().last().unwrap().degraded);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_stop_sender_ends_loop() {
    let control = GovernorLoop::new(
        governor(0),
        repeating(sample(55.0, 36.0)),
        Recorder::default(),
        LoopConfig::default(),
    )
    .unwrap();

    let (stop_tx, stop_rx) = watch::channel(false);
    let task = tokio::spawn(control.run(stop_rx));
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    drop(stop_tx);

    let summary = task.await.unwrap().unwrap();
    assert!((3..=5).contains(&summary.ticks));
}

#[test]
fn test_invalid_loop_config_rejected() {
    let result = GovernorLoop::new(
        governor(0),
        repeating(sample(55.0, 36.0)),
        Recorder::default(),
        LoopConfig {
            short_interval: Duration::ZERO,
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(GovernorError::Config(_))));
}
