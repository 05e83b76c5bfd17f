//! Snapshot command handler.

use std::fmt::Write;
use std::sync::Arc;

use tabled::Tabled;

use switchos_core::{CoordinatorConfig, PsuMetrics, Snapshot};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, reading};

#[derive(Tabled)]
struct PortRow {
    #[tabled(rename = "#")]
    number: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "PoE Power")]
    power: String,
    #[tabled(rename = "PoE Current")]
    current: String,
    #[tabled(rename = "PoE Voltage")]
    voltage: String,
}

fn port_rows(snapshot: &Snapshot) -> Vec<PortRow> {
    snapshot
        .ports
        .iter()
        .map(|port| {
            let poe = snapshot.poe_port(port.index);
            PortRow {
                number: port.label(),
                name: port.name.clone(),
                power: reading(poe.and_then(|p| p.power), 1, "W"),
                current: reading(poe.and_then(|p| p.current), 0, "mA"),
                voltage: reading(poe.and_then(|p| p.voltage), 1, "V"),
            }
        })
        .collect()
}

fn psu_line(out: &mut String, label: &str, psu: Option<&PsuMetrics>) {
    if let Some(psu) = psu {
        let _ = writeln!(
            out,
            "{label:<12} {} / {} / {}",
            reading(psu.current, 0, "mA"),
            reading(psu.voltage, 2, "V"),
            reading(psu.power, 1, "W"),
        );
    }
}

fn detail(snapshot: &Snapshot) -> String {
    let id = &snapshot.identity;
    let sys = &snapshot.system;
    let mut out = String::new();

    let _ = writeln!(out, "{:<12} {}", "Name", id.name);
    let _ = writeln!(out, "{:<12} {}", "Model", id.model);
    let _ = writeln!(out, "{:<12} {}", "Serial", id.serial_number);
    let _ = writeln!(out, "{:<12} {}", "MAC", id.mac);
    let _ = writeln!(out, "{:<12} {}", "Firmware", id.firmware);
    let _ = writeln!(out, "{:<12} {}", "CPU temp", reading(sys.cpu_temperature, 0, "°C"));
    psu_line(&mut out, "PSU1", sys.psu1.as_ref());
    psu_line(&mut out, "PSU2", sys.psu2.as_ref());
    if sys.total_power.is_some() {
        let _ = writeln!(out, "{:<12} {}", "Total power", reading(sys.total_power, 1, "W"));
    }
    let _ = writeln!(
        out,
        "{:<12} {}",
        "PoE",
        if snapshot.supports_poe() { "yes" } else { "no" }
    );
    let fetched = snapshot.fetched_at.with_timezone(&chrono::Local);
    let _ = writeln!(out, "{:<12} {}", "Fetched", fetched.format("%Y-%m-%d %H:%M:%S"));

    if !snapshot.ports.is_empty() {
        out.push('\n');
        out.push_str(&output::render_table(&port_rows(snapshot)));
    }
    out
}

fn plain(snapshot: &Snapshot) -> String {
    let mut lines = vec![
        format!("serial={}", snapshot.identity.serial_number),
        format!("model={}", snapshot.identity.model),
    ];
    if let Some(t) = snapshot.system.cpu_temperature {
        lines.push(format!("cpu_temperature={t}"));
    }
    if let Some(p) = snapshot.system.total_power {
        lines.push(format!("total_power={p}"));
    }
    lines.push(format!("ports={}", snapshot.port_count()));
    lines.join("\n")
}

pub async fn handle(config: CoordinatorConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let snapshot: Arc<Snapshot> = super::oneshot(config, |c| async move { c.current_snapshot() }).await?;

    let out = output::render_single(global.output, snapshot.as_ref(), detail, plain)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
