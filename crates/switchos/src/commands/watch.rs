//! Watch command handler: poll until interrupted, printing sensor values
//! after every refresh cycle.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use switchos_core::{Coordinator, CoordinatorConfig, SensorSet, SensorState, StateSink};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::sensors::{self, SensorReport};

/// Collects the states written during one refresh cycle.
#[derive(Default)]
struct BufferSink {
    states: Mutex<Vec<SensorState>>,
}

impl BufferSink {
    fn drain(&self) -> Vec<SensorState> {
        std::mem::take(&mut *self.states.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl StateSink for BufferSink {
    fn write_state(&self, state: &SensorState) {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(state.clone());
    }
}

/// Keep the newest state per sensor, in first-seen order. More than one
/// cycle can land in the buffer before the loop wakes.
fn latest_per_sensor(states: Vec<SensorState>) -> Vec<SensorState> {
    let mut latest: Vec<SensorState> = Vec::with_capacity(states.len());
    for state in states {
        match latest.iter().position(|s| s.unique_id == state.unique_id) {
            Some(i) => latest[i] = state,
            None => latest.push(state),
        }
    }
    latest
}

fn render_cycle(
    buffer: &BufferSink,
    filter: Option<&str>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let reports: Vec<_> = latest_per_sensor(buffer.drain())
        .into_iter()
        .map(|state| SensorReport {
            state,
            enabled: true,
        })
        .filter(|r| filter.is_none_or(|f| r.state.key.contains(f)))
        .collect();
    if reports.is_empty() {
        return Ok(());
    }

    let color = output::should_color(global.color);
    let out = match global.output {
        // One JSON document per line keeps the output streamable.
        OutputFormat::Json | OutputFormat::JsonCompact => reports
            .iter()
            .map(|r| output::render_json(r, true))
            .collect::<Result<Vec<_>, _>>()?
            .join("\n"),
        format => {
            output::render_list(format, &reports, |r| sensors::to_row(r, color), sensors::to_line)?
        }
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(
    mut config: CoordinatorConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(interval) = args.interval {
        config = config.with_refresh_interval(interval);
    }
    if !config.polls() {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "watch needs a non-zero refresh interval".into(),
        });
    }

    let coordinator = Coordinator::setup(config.clone(), super::http_source(&config)?).await?;

    let buffer = Arc::new(BufferSink::default());
    let sink: Arc<dyn StateSink> = buffer.clone();
    let set = SensorSet::build(&coordinator, &sink)?;
    if let Some(key) = args.key.as_deref() {
        if !set.enabled().any(|s| s.description().key.contains(key)) {
            return Err(CliError::NoSensor { key: key.into() });
        }
    }

    let mut stream = coordinator.subscribe();
    set.publish_all();
    render_cycle(&buffer, args.key.as_deref(), global)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut cycles = 0_u64;
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                debug!("interrupted");
                break;
            }
            changed = stream.changed() => {
                let Some(state) = changed else { break };
                if let Some(err) = &state.last_error {
                    warn!(error = %err, "refresh failed; showing last good values");
                }
                render_cycle(&buffer, args.key.as_deref(), global)?;

                cycles += 1;
                if args.count.is_some_and(|n| cycles >= n) {
                    break;
                }
            }
        }
    }

    drop(set);
    coordinator.teardown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use switchos_core::{DeviceClass, Unit};

    use super::*;

    fn reading(unique_id: &str, value: f64) -> SensorState {
        SensorState {
            unique_id: unique_id.into(),
            key: "cpu_temperature",
            port: None,
            value: Some(value),
            available: true,
            device_class: DeviceClass::Temperature,
            unit: Unit::Celsius,
            precision: 0,
        }
    }

    #[test]
    fn two_buffered_cycles_collapse_to_the_newest_states() {
        let buffer = BufferSink::default();
        for state in [reading("S1_a", 40.0), reading("S1_b", 1.0)] {
            buffer.write_state(&state);
        }
        for state in [reading("S1_a", 41.0), reading("S1_b", 2.0)] {
            buffer.write_state(&state);
        }

        let latest = latest_per_sensor(buffer.drain());
        let values: Vec<_> = latest.iter().map(|s| (s.unique_id.as_str(), s.value)).collect();
        assert_eq!(values, vec![("S1_a", Some(41.0)), ("S1_b", Some(2.0))]);
        assert!(buffer.drain().is_empty());
    }
}
