use serde_json::json;
use tabled::Tabled;

use crate::api::device_client::DeviceClient;
use crate::cli::output::{emit, power_label, print_statuses};
use crate::config::{OutputMode, RuntimeConfig};
use crate::control::{Command, ControlService, Property, Setting, Step, Summary};
use crate::error::AppError;
use crate::models::registry::Target;
use crate::router::{CommandRouter, Outcome};

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "ADDRESS")]
    address: String,
    #[tabled(rename = "RESULT")]
    result: String,
}

/// Run a control command: everything except `list` and `detect`.
pub async fn handle(args: &[String], config: &RuntimeConfig) -> Result<(), AppError> {
    let client = DeviceClient::new()?;
    let mut router = CommandRouter::new(config.settings_store(), ControlService::new(client));
    let instruction = router.parse(args)?;

    match router.execute(instruction).await? {
        Outcome::Applied {
            command,
            targets,
            summary,
        } => print_applied(command, &targets, &summary, config.output_mode),
        Outcome::Toggled { target, on } => {
            let value = json!({"light": target.name, "power": power_label(on)});
            let row = ResultRow {
                name: target.name,
                address: target.address,
                result: power_label(on).to_string(),
            };
            emit(config.output_mode, &[row], &value);
        }
        Outcome::Status(statuses) => print_statuses(&statuses, config.output_mode),
    }
    Ok(())
}

fn command_label(command: Command) -> String {
    let property = |p: Property| match p {
        Property::Brightness => "brightness",
        Property::Temperature => "temperature",
    };
    match command {
        Command::TurnOn => "on".into(),
        Command::TurnOff => "off".into(),
        Command::Toggle => "toggle".into(),
        Command::Set(Setting::Brightness(b)) => format!("brightness {}", b.value()),
        Command::Set(Setting::Temperature(k)) => format!("temperature {}", k.value()),
        Command::Adjust(p, Step::Increase) => format!("{} +", property(p)),
        Command::Adjust(p, Step::Decrease) => format!("{} -", property(p)),
        Command::Equalize(p) => format!("{} =", property(p)),
    }
}

fn print_applied(command: Command, targets: &[Target], summary: &Summary, mode: OutputMode) {
    let rows: Vec<ResultRow> = targets
        .iter()
        .map(|t| ResultRow {
            name: t.name.clone(),
            address: t.address.clone(),
            result: match (summary.applied.get(&t.address), summary.errors.get(&t.address)) {
                (Some(applied), _) => format!("✓ {applied}"),
                (None, Some(err)) => format!("✗ {err}"),
                (None, None) => "-".to_string(),
            },
        })
        .collect();

    let lights: Vec<serde_json::Value> = targets
        .iter()
        .map(|t| {
            let mut obj = json!({"name": t.name, "address": t.address});
            if let Some(applied) = summary.applied.get(&t.address) {
                obj["ok"] = json!(true);
                if let serde_json::Value::Object(fields) = applied.to_json() {
                    for (key, value) in fields {
                        obj[key] = value;
                    }
                }
            } else if let Some(err) = summary.errors.get(&t.address) {
                obj["ok"] = json!(false);
                obj["error"] = json!(err.error_type());
                obj["message"] = json!(err.to_string());
            }
            obj
        })
        .collect();

    let value = json!({
        "command": command_label(command),
        "succeeded": summary.succeeded,
        "failed": summary.failed,
        "lights": lights,
    });
    emit(mode, &rows, &value);
}
