//! Rendering of lights, their state and errors: JSON on stdout by default,
//! rounded tables with `--table`, JSON errors on stderr.

use serde_json::{json, Value};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::config::OutputMode;
use crate::error::AppError;
use crate::models::registry::DeviceRegistry;
use crate::router::LightStatus;

#[derive(Tabled)]
struct LightRow {
    #[tabled(rename = "#")]
    ordinal: usize,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "ADDRESS")]
    address: String,
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "#")]
    ordinal: usize,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "POWER")]
    power: String,
    #[tabled(rename = "BRIGHTNESS")]
    brightness: String,
    #[tabled(rename = "TEMPERATURE")]
    temperature: String,
}

/// Print `rows` as a table or `value` as JSON, depending on the mode.
pub fn emit<T: Tabled>(mode: OutputMode, rows: &[T], value: &Value) {
    match mode {
        OutputMode::Table if rows.is_empty() => println!("No lights."),
        OutputMode::Table => println!("{}", Table::new(rows).with(Style::rounded())),
        OutputMode::Json => println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_default()
        ),
    }
}

/// Print the error as JSON on stderr and return the process exit code.
pub fn report(err: &AppError) -> i32 {
    eprintln!(
        "{}",
        serde_json::to_string_pretty(&err.to_json()).unwrap_or_default()
    );
    err.exit_code()
}

pub fn power_label(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

pub fn print_registry(registry: &DeviceRegistry, mode: OutputMode) {
    let rows: Vec<LightRow> = registry
        .targets()
        .map(|t| LightRow {
            ordinal: t.ordinal,
            name: t.name,
            address: t.address,
        })
        .collect();
    let value: Vec<Value> = registry
        .targets()
        .map(|t| json!({"ordinal": t.ordinal, "name": t.name, "address": t.address}))
        .collect();
    emit(mode, &rows, &json!(value));
}

fn status_row(status: &LightStatus) -> StatusRow {
    let (power, brightness, temperature) = match &status.state {
        Ok(state) => (
            power_label(state.on).to_string(),
            state.brightness.to_string(),
            state.temperature.to_string(),
        ),
        Err(_) => ("offline".to_string(), "-".to_string(), "-".to_string()),
    };
    StatusRow {
        ordinal: status.target.ordinal,
        name: status.target.name.clone(),
        power,
        brightness,
        temperature,
    }
}

fn status_json(status: &LightStatus) -> Value {
    let mut obj = json!({
        "ordinal": status.target.ordinal,
        "name": status.target.name,
        "address": status.target.address,
    });
    match &status.state {
        Ok(state) => {
            obj["online"] = json!(true);
            obj["power"] = json!(power_label(state.on));
            obj["brightness"] = json!(state.brightness.value());
            obj["temperature"] = json!(state.temperature.value());
        }
        Err(err) => {
            obj["online"] = json!(false);
            obj["error"] = json!(err.to_string());
        }
    }
    obj
}

pub fn print_statuses(statuses: &[LightStatus], mode: OutputMode) {
    let rows: Vec<StatusRow> = statuses.iter().map(status_row).collect();
    let value: Vec<Value> = statuses.iter().map(status_json).collect();
    emit(mode, &rows, &json!(value));
}
