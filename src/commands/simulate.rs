// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Trace replay command

use crate::cli::{OutputFormat, SimulateArgs};
use crate::config::Settings;
use crate::error::Result;
use crate::governor::ControlOutput;
use crate::hardware::load_trace;
use crate::runtime::{replay, ReplayReport};

/// Execute the simulate command
pub fn execute(args: &SimulateArgs, settings: &Settings, format: OutputFormat) -> Result<()> {
    let trace = load_trace(&args.trace)?;
    let mut governor = super::build_governor(settings, &args.overrides)?;
    let mut report = replay(&mut governor, &trace, &settings.loop_config());
    if args.changes_only {
        report.outputs = changes(&report.outputs);
    }

    match format {
        OutputFormat::Json => super::print_json(&report),
        OutputFormat::Text => {
            print!("{}", render_text(&report));
            Ok(())
        }
    }
}

/// Keep the first output, IR events, and outputs that differ from the one
/// before in anything but the tick number.
pub fn changes(outputs: &[ControlOutput]) -> Vec<ControlOutput> {
    let mut kept = Vec::new();
    let mut previous: Option<&ControlOutput> = None;
    for output in outputs {
        let keep = match previous {
            None => true,
            Some(prev) => {
                output.ir_event.is_some()
                    || prev.fans != output.fans
                    || prev.pl1 != output.pl1
                    || prev.gps != output.gps
                    || prev.throttling != output.throttling
                    || prev.overheat != output.overheat
                    || prev.sensor_fault != output.sensor_fault
                    || prev.degraded != output.degraded
            }
        };
        if keep {
            kept.push(output.clone());
        }
        previous = Some(output);
    }
    kept
}

/// One line per output.
pub fn format_output(output: &ControlOutput) -> String {
    let mut line = format!(
        "{:>5}  cpu {:>3}%  gpu {:>3}%",
        output.tick, output.fans.cpu, output.fans.gpu
    );
    if let Some(ir) = output.fans.ir {
        line.push_str(&format!("  ir {:>3}%", ir));
    }
    line.push_str(&format!(
        "  PL1 {:>3} [{}..{}]  GPS {:>3}",
        output.pl1.current, output.pl1.lower, output.pl1.upper, output.gps
    ));
    if let Some(event) = output.ir_event {
        line.push_str(&format!("  {}", event));
    }
    let flags = [
        (output.throttling, "throttling"),
        (output.overheat, "overheat"),
        (output.sensor_fault, "sensor-fault"),
        (output.degraded, "degraded"),
    ];
    for (set, name) in flags {
        if set {
            line.push_str("  ");
            line.push_str(name);
        }
    }
    line
}

fn render_text(report: &ReplayReport) -> String {
    let mut text = String::new();
    for output in &report.outputs {
        text.push_str(&format_output(output));
        text.push('\n');
    }
    let summary = &report.summary;
    text.push_str(&format!(
        "\n{} ticks, {} long cycles, {} IR events, {} sensor faults{}\n",
        summary.ticks,
        summary.long_cycles,
        summary.ir_events,
        summary.faults.sensor_faults,
        if summary.degraded { ", degraded" } else { "" }
    ));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governor::{FanDuties, IrOverheatCase, Pl1Directive};

    fn output(tick: u64, cpu_fan: u8) -> ControlOutput {
        ControlOutput {
            tick,
            fans: FanDuties {
                cpu: cpu_fan,
                gpu: 21,
                ir: Some(24),
            },
            pl1: Pl1Directive {
                lower: 25,
                upper: 55,
                current: 50,
            },
            gps: 100,
            ir_event: None,
            throttling: false,
            overheat: false,
            sensor_fault: false,
            degraded: false,
        }
    }

    #[test]
    fn test_changes_drops_repeats() {
        let mut event = output(3, 22);
        event.ir_event = Some(IrOverheatCase::IrPl1ThresholdDecreasePl1);
        let outputs = vec![output(1, 22), output(2, 22), event, output(4, 23)];
        let kept = changes(&outputs);
        let ticks: Vec<u64> = kept.iter().map(|o| o.tick).collect();
        assert_eq!(ticks, vec![1, 3, 4]);
    }

    #[test]
    fn test_format_output_line() {
        let mut out = output(7, 26);
        out.ir_event = Some(IrOverheatCase::IrOverheatThresholdDecreasePl1);
        out.degraded = true;
        let line = format_output(&out);
        assert!(line.contains("cpu  26%"));
        assert!(line.contains("ir  24%"));
        assert!(line.contains("PL1  50 [25..55]"));
        assert!(line.contains("IrOverheatThresholdDecreasePl1"));
        assert!(line.ends_with("degraded"));
        assert!(!line.contains("throttling"));
    }

    #[test]
    fn test_render_text_summary() {
        let report = ReplayReport {
            outputs: vec![output(1, 22)],
            ..Default::default()
        };
        let text = render_text(&report);
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("0 IR events"));
    }
}
