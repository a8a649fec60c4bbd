// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Live control loop command

use std::time::Duration;

use crate::cli::{OutputFormat, RunArgs};
use crate::config::Settings;
use crate::error::Result;
use crate::hardware::{load_trace, Actuator, LogActuator, ScriptedSensors, SensorSource, SysfsSensors};
use crate::runtime::{GovernorLoop, LoopSummary};

/// Execute the run command
pub async fn execute(args: &RunArgs, settings: &Settings, format: OutputFormat) -> Result<()> {
    let mut governor = super::build_governor(settings, &args.overrides)?;
    governor.reset();
    let config = settings.loop_config();
    let actuator = LogActuator::new().with_stdout(format == OutputFormat::Json);

    let summary = match &args.trace {
        Some(path) => {
            let sensors = ScriptedSensors::new(load_trace(path)?).repeat_last(true);
            drive(GovernorLoop::new(governor, sensors, actuator, config)?, args.duration).await?
        }
        None => {
            let sensors = SysfsSensors::new(settings.sensors.clone(), None);
            sensors.ensure_readable().await?;
            drive(GovernorLoop::new(governor, sensors, actuator, config)?, args.duration).await?
        }
    };

    match format {
        OutputFormat::Json => super::print_json(&summary),
        OutputFormat::Text => {
            println!("{}", describe_summary(&summary));
            Ok(())
        }
    }
}

/// Run the loop until Ctrl+C or the optional deadline, then stop it cleanly.
async fn drive<S, A>(control: GovernorLoop<S, A>, duration: Option<u64>) -> Result<LoopSummary>
where
    S: SensorSource + 'static,
    A: Actuator + 'static,
{
    let handle = control.spawn();
    match duration {
        Some(secs) => {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
                _ = tokio::signal::ctrl_c() => {}
            }
        }
        None => tokio::signal::ctrl_c().await?,
    }
    tracing::info!(target: "thermgov.runtime", "stopping control loop");
    handle.stop().await
}

fn describe_summary(summary: &LoopSummary) -> String {
    let faults = &summary.faults;
    format!(
        "stopped after {} ticks: {} long cycles, {} IR events, faults sensor={} actuator={} missed={}{}",
        summary.ticks,
        summary.long_cycles,
        summary.ir_events,
        faults.sensor_faults,
        faults.actuator_faults,
        faults.missed_ticks,
        if summary.degraded { " (degraded)" } else { "" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_summary() {
        let mut summary = LoopSummary {
            ticks: 120,
            long_cycles: 4,
            ir_events: 2,
            ..Default::default()
        };
        let text = describe_summary(&summary);
        assert!(text.starts_with("stopped after 120 ticks"));
        assert!(!text.contains("degraded"));

        summary.degraded = true;
        assert!(describe_summary(&summary).ends_with("(degraded)"));
    }
}
