use serde::{Deserialize, Serialize};

use crate::models::light_state::{Brightness, DeviceState, Kelvin, LightPatch};

/// Body of `GET /elgato/lights`.
#[derive(Debug, Deserialize)]
pub struct LightsResponse {
    #[serde(default)]
    pub lights: Vec<WireLight>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WireLight {
    pub on: i64,
    pub brightness: i64,
    pub temperature: i64,
}

impl WireLight {
    pub fn into_state(self) -> DeviceState {
        DeviceState {
            on: self.on != 0,
            brightness: Brightness::clamped(self.brightness),
            temperature: Kelvin::from_wire(self.temperature),
        }
    }
}

/// Body of `PUT /elgato/lights`.
#[derive(Debug, Serialize)]
pub struct LightsUpdate {
    pub lights: Vec<WireLightUpdate>,
}

#[derive(Debug, Default, Serialize)]
pub struct WireLightUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<u16>,
}

impl From<&LightPatch> for LightsUpdate {
    fn from(patch: &LightPatch) -> Self {
        Self {
            lights: vec![WireLightUpdate {
                on: patch.on.map(u8::from),
                brightness: patch.brightness.map(Brightness::value),
                temperature: patch.temperature.map(Kelvin::to_wire),
            }],
        }
    }
}
