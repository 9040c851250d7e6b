//! Turns user intent into control operations.
//!
//! One-shot argument vectors become an [`Instruction`] that is fully validated
//! against the registry before any device is contacted. Interactive key input
//! goes through a [`Session`], which owns the selection, the focus state
//! machine and the status message shown to the operator.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::control::{Command, ControlService, Property, Setting, Step, Summary};
use crate::error::{AppError, DeviceError};
use crate::focus::{Direction, FocusStateMachine};
use crate::models::light_state::{Brightness, DeviceState, Kelvin};
use crate::models::registry::{DeviceRegistry, RegistryStore, Target};
use crate::resolve::resolve_device;
use crate::selection::SelectionModel;
use crate::settings::{Settings, SettingsStore};

/// Which lights a one-shot instruction addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets {
    All,
    One(Target),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Retrying read-invert-write on a single light.
    FastToggle,
    Apply(Command),
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub targets: Targets,
    pub action: Action,
}

/// Per-light state as reported by `status`.
#[derive(Debug, Clone)]
pub struct LightStatus {
    pub target: Target,
    pub state: Result<DeviceState, DeviceError>,
}

/// What a one-shot instruction produced.
#[derive(Debug, Clone)]
pub enum Outcome {
    Applied {
        command: Command,
        targets: Vec<Target>,
        summary: Summary,
    },
    Toggled {
        target: Target,
        on: bool,
    },
    Status(Vec<LightStatus>),
}

fn property_name(property: Property) -> &'static str {
    match property {
        Property::Brightness => "brightness",
        Property::Temperature => "temperature",
    }
}

/// Parse the value argument of `bright` / `temp`: `+`, `-`, `=` or a number.
pub fn parse_value(property: Property, raw: &str) -> Result<Command, AppError> {
    match raw.trim() {
        "+" => Ok(Command::Adjust(property, Step::Increase)),
        "-" => Ok(Command::Adjust(property, Step::Decrease)),
        "=" => Ok(Command::Equalize(property)),
        value => {
            let number: i64 = value.parse().map_err(|_| {
                AppError::InvalidInput(format!(
                    "Invalid {} value: {}",
                    property_name(property),
                    value
                ))
            })?;
            let setting = match property {
                Property::Brightness => Setting::Brightness(Brightness::new(number)?),
                Property::Temperature => Setting::Temperature(Kelvin::new(number)?),
            };
            Ok(Command::Set(setting))
        }
    }
}

/// Parse a one-shot argument vector such as `["bright", "+"]` or
/// `["Desk", "temp", "4800"]`.
pub fn parse_args(registry: &DeviceRegistry, args: &[String]) -> Result<Instruction, AppError> {
    let Some((head, rest)) = args.split_first() else {
        return Err(AppError::InvalidInput("No command given".into()));
    };
    if registry.is_empty() {
        return Err(AppError::NotConfigured);
    }

    match head.as_str() {
        "on" | "off" | "bright" | "temp" | "status" => Ok(Instruction {
            targets: Targets::All,
            action: parse_action(head, rest)?,
        }),
        identifier => {
            let target = resolve_device(registry, identifier)?;
            let action = match rest.split_first() {
                None => Action::FastToggle,
                Some((verb, rest)) => parse_action(verb, rest)?,
            };
            Ok(Instruction {
                targets: Targets::One(target),
                action,
            })
        }
    }
}

fn parse_action(verb: &str, rest: &[String]) -> Result<Action, AppError> {
    let (action, consumed) = match verb {
        "on" => (Action::Apply(Command::TurnOn), 0),
        "off" => (Action::Apply(Command::TurnOff), 0),
        "status" => (Action::Status, 0),
        "bright" => {
            let raw = value_arg(verb, rest)?;
            (Action::Apply(parse_value(Property::Brightness, raw)?), 1)
        }
        "temp" => {
            let raw = value_arg(verb, rest)?;
            (Action::Apply(parse_value(Property::Temperature, raw)?), 1)
        }
        other => {
            return Err(AppError::InvalidInput(format!(
                "Unknown command: {other}. Available commands: on, off, bright, temp, status"
            )))
        }
    };
    if let Some(extra) = rest.get(consumed) {
        return Err(AppError::InvalidInput(format!("Unexpected argument: {extra}")));
    }
    Ok(action)
}

fn value_arg<'a>(verb: &str, rest: &'a [String]) -> Result<&'a str, AppError> {
    rest.first().map(String::as_str).ok_or_else(|| {
        AppError::InvalidInput(format!("Usage: keylight {verb} <+|-|=|value>"))
    })
}

/// Record an explicit value as the new default, but only when every
/// targeted light accepted it.
fn remember_setting(
    settings: &mut Settings,
    store: &SettingsStore,
    command: Command,
    summary: &Summary,
) -> Result<bool, AppError> {
    let Command::Set(setting) = command else {
        return Ok(false);
    };
    if !summary.is_complete_success() {
        debug!(failed = summary.failed, "not persisting default after partial failure");
        return Ok(false);
    }
    match setting {
        Setting::Brightness(b) => settings.set_brightness(b),
        Setting::Temperature(k) => settings.set_temperature(k),
    }
    store.save(settings)?;
    info!(?setting, "default updated");
    Ok(true)
}

/// One-shot command execution against the persisted registry.
pub struct CommandRouter {
    store: SettingsStore,
    settings: Settings,
    registry: DeviceRegistry,
    control: ControlService,
}

impl CommandRouter {
    pub fn new(store: SettingsStore, control: ControlService) -> Self {
        let settings = store.load();
        let registry = DeviceRegistry::new(settings.lights.clone());
        Self {
            store,
            settings,
            registry,
            control,
        }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn parse(&self, args: &[String]) -> Result<Instruction, AppError> {
        parse_args(&self.registry, args)
    }

    /// Run a parsed instruction. A single-target command that fails, or a
    /// command where every targeted light failed, is an error.
    pub async fn execute(&mut self, instruction: Instruction) -> Result<Outcome, AppError> {
        let targets: Vec<Target> = match instruction.targets {
            Targets::All => self.registry.targets().collect(),
            Targets::One(target) => vec![target],
        };
        let addresses: Vec<String> = targets.iter().map(|t| t.address.clone()).collect();

        match instruction.action {
            Action::FastToggle => {
                let target = targets
                    .into_iter()
                    .next()
                    .ok_or_else(|| AppError::NoTargets("No lights selected".into()))?;
                match self.control.client().toggle_fast(&target.address).await {
                    Ok(on) => Ok(Outcome::Toggled { target, on }),
                    Err(source) => Err(AppError::Device {
                        name: target.name,
                        source,
                    }),
                }
            }
            Action::Status => {
                let states = self.control.read_all(&addresses).await;
                let statuses = targets
                    .into_iter()
                    .zip(states)
                    .map(|(target, (_, state))| LightStatus { target, state })
                    .collect();
                Ok(Outcome::Status(statuses))
            }
            Action::Apply(command) => {
                let summary = self.control.apply(command, &addresses).await?;
                if summary.succeeded == 0 {
                    if let Some((address, source)) = summary.errors.iter().next() {
                        return Err(AppError::Device {
                            name: self.registry.name_of(address).to_string(),
                            source: source.clone(),
                        });
                    }
                }
                remember_setting(&mut self.settings, &self.store, command, &summary)?;
                Ok(Outcome::Applied {
                    command,
                    targets,
                    summary,
                })
            }
        }
    }

    /// Replace the registry with freshly discovered lights and persist it.
    /// An empty result leaves everything untouched.
    pub fn replace_lights(&mut self, lights: IndexMap<String, String>) -> Result<bool, AppError> {
        if lights.is_empty() {
            return Ok(false);
        }
        self.settings.lights = lights.clone();
        self.store.save(&self.settings)?;
        self.registry = DeviceRegistry::new(lights);
        Ok(true)
    }
}

/// Interactive input, already decoded from key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    SelectAll,
    SelectOrdinal(usize),
    Move(Direction),
    Activate,
    Discover,
    Quit,
}

/// Work the caller has to start after a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    StartDiscovery,
    Quit,
}

/// State of one interactive session.
pub struct Session {
    registry: Arc<RegistryStore>,
    selection: SelectionModel,
    focus: FocusStateMachine,
    control: ControlService,
    store: SettingsStore,
    settings: Settings,
    statuses: Vec<(String, Result<DeviceState, DeviceError>)>,
    message: String,
    discovering: bool,
}

impl Session {
    pub fn new(store: SettingsStore, settings: Settings, control: ControlService) -> Self {
        let registry = Arc::new(RegistryStore::new(DeviceRegistry::new(
            settings.lights.clone(),
        )));
        Self {
            registry,
            selection: SelectionModel::new(),
            focus: FocusStateMachine::new(settings.defaults()),
            control,
            store,
            settings,
            statuses: Vec::new(),
            message: String::new(),
            discovering: false,
        }
    }

    pub fn registry(&self) -> Arc<DeviceRegistry> {
        self.registry.snapshot()
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn focus(&self) -> &FocusStateMachine {
        &self.focus
    }

    pub fn control(&self) -> &ControlService {
        &self.control
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_discovering(&self) -> bool {
        self.discovering
    }

    /// Latest polled state per address, in registry order.
    pub fn statuses(&self) -> &[(String, Result<DeviceState, DeviceError>)] {
        &self.statuses
    }

    pub async fn dispatch(&mut self, input: Input) -> Effect {
        match input {
            Input::SelectAll => {
                self.selection.select_all();
                self.message = "✓ Controlling all lights".into();
            }
            Input::SelectOrdinal(ordinal) => {
                let registry = self.registry.snapshot();
                if self.selection.select_ordinal(ordinal, &registry) {
                    if let Some(target) = registry.by_ordinal(ordinal) {
                        self.message = format!("✓ Controlling {}", target.name);
                    }
                }
            }
            Input::Move(direction) => self.focus.on_move(direction),
            Input::Activate => self.activate().await,
            Input::Discover => {
                if self.discovering {
                    return Effect::None;
                }
                self.discovering = true;
                self.message = "Discovering lights...".into();
                return Effect::StartDiscovery;
            }
            Input::Quit => return Effect::Quit,
        }
        Effect::None
    }

    async fn activate(&mut self) {
        let command = self.focus.commit();
        let registry = self.registry.snapshot();
        let addresses = self.selection.resolve_addresses(&registry);

        let summary = match self.control.apply(command, &addresses).await {
            Ok(summary) => summary,
            Err(e) => {
                self.message = format!("✗ {e}");
                return;
            }
        };

        if let Err(e) = remember_setting(&mut self.settings, &self.store, command, &summary) {
            warn!(error = %e, "could not save settings");
        }
        self.message = activation_message(command, &summary);
    }

    /// Install the result of a detached discovery. Found lights replace the
    /// registry and are persisted in one step.
    pub fn finish_discovery(&mut self, result: Result<IndexMap<String, String>, AppError>) {
        self.discovering = false;
        let lights = match result {
            Ok(lights) => lights,
            Err(e) => {
                warn!(error = %e, "discovery failed");
                self.message = "Error: Failed to discover".into();
                return;
            }
        };
        if lights.is_empty() {
            self.message = "⚠ No lights found".into();
            return;
        }

        let count = lights.len();
        self.settings.lights = lights.clone();
        if let Err(e) = self.store.save(&self.settings) {
            warn!(error = %e, "could not save discovered lights");
        }
        self.registry.replace(lights);
        self.statuses.clear();
        self.message = format!("✓ Discovered {count} light(s)");
    }

    /// Install polled states. Results taken against an older registry are
    /// dropped.
    pub fn update_statuses(
        &mut self,
        version: u64,
        statuses: Vec<(String, Result<DeviceState, DeviceError>)>,
    ) -> bool {
        if version != self.registry.snapshot().version() {
            debug!(version, "discarding stale status poll");
            return false;
        }
        self.statuses = statuses;
        true
    }
}

fn activation_message(command: Command, summary: &Summary) -> String {
    let ok = summary.is_complete_success();
    match command {
        Command::Toggle if ok => format!("✓ {} light(s) toggled", summary.succeeded),
        Command::Toggle => "✗ Error toggling lights".into(),
        Command::TurnOn if ok => "✓ Lights turned on".into(),
        Command::TurnOn => "✗ Error turning on lights".into(),
        Command::TurnOff if ok => "✓ Lights turned off".into(),
        Command::TurnOff => "✗ Error turning off lights".into(),
        Command::Set(Setting::Brightness(b)) if ok => format!("✓ Brightness set to {b}"),
        Command::Set(Setting::Temperature(k)) if ok => format!("✓ Temperature set to {k}"),
        Command::Set(Setting::Brightness(_)) => "✗ Error setting brightness".into(),
        Command::Set(Setting::Temperature(_)) => "✗ Error setting temperature".into(),
        Command::Adjust(property, _) | Command::Equalize(property) if ok => {
            format!("✓ {} updated", property_name(property))
        }
        Command::Adjust(property, _) | Command::Equalize(property) => {
            format!("✗ Error adjusting {}", property_name(property))
        }
    }
}
