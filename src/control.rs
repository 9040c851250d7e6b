use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use indexmap::IndexSet;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::device_client::DeviceClient;
use crate::error::{AppError, DeviceError};
use crate::models::light_state::{Brightness, DeviceState, Kelvin, LightPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Brightness,
    Temperature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Increase,
    Decrease,
}

/// An explicit value to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    Brightness(Brightness),
    Temperature(Kelvin),
}

/// One logical command, fanned out over every targeted light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TurnOn,
    TurnOff,
    /// Read-then-invert per light.
    Toggle,
    Set(Setting),
    /// ±5% brightness or ±200K, relative to each light's own live value.
    Adjust(Property, Step),
    /// Write the mean of all readable values to every light.
    Equalize(Property),
}

/// The value a light ended up with after a successful command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Power(bool),
    Brightness(Brightness),
    Temperature(Kelvin),
}

impl Applied {
    pub fn to_json(self) -> serde_json::Value {
        match self {
            Applied::Power(on) => serde_json::json!({"power": if on { "on" } else { "off" }}),
            Applied::Brightness(b) => serde_json::json!({"brightness": b.value()}),
            Applied::Temperature(k) => serde_json::json!({"temperature": k.value()}),
        }
    }
}

impl fmt::Display for Applied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Applied::Power(true) => f.write_str("on"),
            Applied::Power(false) => f.write_str("off"),
            Applied::Brightness(b) => write!(f, "brightness {b}"),
            Applied::Temperature(k) => write!(f, "temperature {k}"),
        }
    }
}

impl From<Setting> for Applied {
    fn from(setting: Setting) -> Self {
        match setting {
            Setting::Brightness(b) => Applied::Brightness(b),
            Setting::Temperature(k) => Applied::Temperature(k),
        }
    }
}

/// Aggregated, order-independent outcome of a fanned-out command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
    pub errors: BTreeMap<String, DeviceError>,
    pub applied: BTreeMap<String, Applied>,
}

impl Summary {
    fn record(&mut self, address: String, outcome: Result<Applied, DeviceError>) {
        match outcome {
            Ok(applied) => {
                self.succeeded += 1;
                self.applied.insert(address, applied);
            }
            Err(err) => {
                self.failed += 1;
                self.errors.insert(address, err);
            }
        }
    }

    /// At least one light was targeted and none failed.
    pub fn is_complete_success(&self) -> bool {
        self.failed == 0 && self.succeeded > 0
    }
}

/// Fans commands out over a set of addresses, one task per light.
#[derive(Debug, Clone)]
pub struct ControlService {
    client: DeviceClient,
}

impl ControlService {
    pub fn new(client: DeviceClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &DeviceClient {
        &self.client
    }

    /// Apply `command` to every distinct address. Names sharing an address
    /// are one fixture and are contacted once.
    pub async fn apply(
        &self,
        command: Command,
        addresses: &[String],
    ) -> Result<Summary, AppError> {
        if addresses.is_empty() {
            return Err(AppError::NoTargets("No lights selected".into()));
        }
        let unique: Vec<String> = addresses
            .iter()
            .cloned()
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();
        let addresses = unique.as_slice();

        let summary = match command {
            Command::TurnOn => self.set_power(addresses, true).await,
            Command::TurnOff => self.set_power(addresses, false).await,
            Command::Toggle => {
                self.fan_out(addresses, |client, address| async move {
                    client.toggle_slow(&address).await.map(Applied::Power)
                })
                .await
            }
            Command::Set(setting) => self.set_value(addresses, setting).await,
            Command::Adjust(property, step) => {
                self.fan_out(addresses, move |client, address| async move {
                    let state = client.read(&address).await?;
                    let setting = adjusted(&state, property, step);
                    client.write(&address, &patch_for(setting)).await?;
                    Ok(Applied::from(setting))
                })
                .await
            }
            Command::Equalize(property) => self.equalize(addresses, property).await?,
        };

        info!(
            ?command,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "command applied"
        );
        Ok(summary)
    }

    /// Read every address concurrently. Results keep the order of `addresses`.
    pub async fn read_all(
        &self,
        addresses: &[String],
    ) -> Vec<(String, Result<DeviceState, DeviceError>)> {
        let handles: Vec<_> = addresses
            .iter()
            .map(|address| {
                let client = self.client.clone();
                let address = address.clone();
                let handle = tokio::spawn({
                    let address = address.clone();
                    async move { client.read(&address).await }
                });
                (address, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (address, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(DeviceError::Offline(format!("read task failed: {e}"))),
            };
            results.push((address, result));
        }
        results
    }

    async fn set_power(&self, addresses: &[String], on: bool) -> Summary {
        self.fan_out(addresses, move |client, address| async move {
            client.write(&address, &LightPatch::power(on)).await?;
            Ok(Applied::Power(on))
        })
        .await
    }

    async fn set_value(&self, addresses: &[String], setting: Setting) -> Summary {
        self.fan_out(addresses, move |client, address| async move {
            client.write(&address, &patch_for(setting)).await?;
            Ok(Applied::from(setting))
        })
        .await
    }

    async fn equalize(
        &self,
        addresses: &[String],
        property: Property,
    ) -> Result<Summary, AppError> {
        let readings: Vec<i64> = self
            .read_all(addresses)
            .await
            .into_iter()
            .filter_map(|(address, result)| match result {
                Ok(state) => Some(match property {
                    Property::Brightness => i64::from(state.brightness.value()),
                    Property::Temperature => i64::from(state.temperature.value()),
                }),
                Err(err) => {
                    warn!(%address, error = %err, "excluded from average");
                    None
                }
            })
            .collect();

        let Some(average) = mean(&readings) else {
            return Err(AppError::NoTargets("Could not read any lights".into()));
        };

        let setting = match property {
            Property::Brightness => Setting::Brightness(Brightness::clamped(average)),
            Property::Temperature => Setting::Temperature(Kelvin::clamped(average)),
        };
        info!(?setting, readable = readings.len(), "equalizing");
        Ok(self.set_value(addresses, setting).await)
    }

    /// Spawn `op` once per address and wait for all of them. A slow or failing
    /// light never holds up the others beyond its own timeout.
    async fn fan_out<F, Fut>(&self, addresses: &[String], op: F) -> Summary
    where
        F: Fn(DeviceClient, String) -> Fut,
        Fut: Future<Output = Result<Applied, DeviceError>> + Send + 'static,
    {
        let handles: Vec<(String, JoinHandle<Result<Applied, DeviceError>>)> = addresses
            .iter()
            .map(|address| {
                let task = op(self.client.clone(), address.clone());
                (address.clone(), tokio::spawn(task))
            })
            .collect();

        let mut summary = Summary::default();
        for (address, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(DeviceError::Offline(format!("device task failed: {e}"))),
            };
            if let Err(err) = &outcome {
                warn!(%address, error = %err, "device call failed");
            }
            summary.record(address, outcome);
        }
        summary
    }
}

fn adjusted(state: &DeviceState, property: Property, step: Step) -> Setting {
    let sign = match step {
        Step::Increase => 1,
        Step::Decrease => -1,
    };
    match property {
        Property::Brightness => {
            Setting::Brightness(state.brightness.offset(sign * Brightness::STEP))
        }
        Property::Temperature => {
            Setting::Temperature(state.temperature.offset(sign * Kelvin::STEP))
        }
    }
}

fn patch_for(setting: Setting) -> LightPatch {
    match setting {
        Setting::Brightness(b) => LightPatch::brightness(b),
        Setting::Temperature(k) => LightPatch::temperature(k),
    }
}

/// Truncating integer mean, `None` for no values.
fn mean(values: &[i64]) -> Option<i64> {
    let count = i64::try_from(values.len()).ok().filter(|c| *c > 0)?;
    Some(values.iter().sum::<i64>() / count)
}
