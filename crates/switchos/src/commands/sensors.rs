//! Sensors command handler, plus the row types shared with `watch`.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use switchos_core::{CoordinatorConfig, Sensor, SensorSet, SensorState, StateSink};

use crate::cli::{GlobalOpts, SensorsArgs};
use crate::error::CliError;
use crate::output::{self, reading};

/// Sink for one-shot reads; values are pulled directly instead.
struct Discard;

impl StateSink for Discard {
    fn write_state(&self, _: &SensorState) {}
}

/// One sensor as printed.
#[derive(Debug, Clone, Serialize)]
pub struct SensorReport {
    #[serde(flatten)]
    pub state: SensorState,
    pub enabled: bool,
}

impl SensorReport {
    pub fn new(sensor: &Sensor) -> Self {
        Self {
            state: sensor.state(),
            enabled: sensor.is_enabled(),
        }
    }
}

#[derive(Tabled)]
pub struct SensorRow {
    #[tabled(rename = "Sensor")]
    key: String,
    #[tabled(rename = "Port")]
    port: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Available")]
    available: String,
}

pub fn to_row(report: &SensorReport, color: bool) -> SensorRow {
    let state = &report.state;
    let key = if report.enabled {
        state.key.to_owned()
    } else {
        format!("{} (unsupported)", state.key)
    };
    SensorRow {
        key,
        port: state.port.clone().unwrap_or_default(),
        value: reading(state.value, state.precision, state.unit.symbol()),
        available: output::availability(state.available, color),
    }
}

pub fn to_line(report: &SensorReport) -> String {
    let value = report
        .state
        .value
        .map_or_else(|| "unknown".to_owned(), |v| v.to_string());
    format!("{}={value}", report.state.unique_id)
}

/// Keep reports whose key contains `filter`.
pub fn matching(reports: Vec<SensorReport>, filter: Option<&str>) -> Result<Vec<SensorReport>, CliError> {
    let Some(filter) = filter else {
        return Ok(reports);
    };
    let kept: Vec<_> = reports
        .into_iter()
        .filter(|r| r.state.key.contains(filter))
        .collect();
    if kept.is_empty() {
        return Err(CliError::NoSensor { key: filter.into() });
    }
    Ok(kept)
}

pub async fn handle(
    config: CoordinatorConfig,
    args: SensorsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let all = args.all;
    let reports = super::oneshot(config, move |coordinator| async move {
        let sink: Arc<dyn StateSink> = Arc::new(Discard);
        let set = SensorSet::build(&coordinator, &sink)?;
        Ok(set
            .sensors()
            .iter()
            .filter(|s| all || s.is_enabled())
            .map(|s| SensorReport::new(s))
            .collect::<Vec<_>>())
    })
    .await?;

    let reports = matching(reports, args.key.as_deref())?;
    let color = output::should_color(global.color);
    let out = output::render_list(global.output, &reports, |r| to_row(r, color), to_line)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
