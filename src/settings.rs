use std::fs;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::light_state::{Brightness, Kelvin};

/// The persisted settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub lights: IndexMap<String, String>,
    #[serde(default = "default_brightness")]
    pub last_brightness: i64,
    #[serde(default = "default_temperature")]
    pub last_temperature: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_selected_light: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lights: IndexMap::new(),
            last_brightness: default_brightness(),
            last_temperature: default_temperature(),
            last_selected_light: None,
        }
    }
}

fn default_brightness() -> i64 {
    i64::from(Brightness::DEFAULT.value())
}

fn default_temperature() -> i64 {
    i64::from(Kelvin::DEFAULT.value())
}

/// Starting values for the interactive adjusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistedDefaults {
    pub brightness: Brightness,
    pub temperature: Kelvin,
}

impl Default for PersistedDefaults {
    fn default() -> Self {
        Self {
            brightness: Brightness::DEFAULT,
            temperature: Kelvin::DEFAULT,
        }
    }
}

impl Settings {
    /// Unset (zero) values fall back to the defaults; anything else is
    /// clamped into range.
    pub fn defaults(&self) -> PersistedDefaults {
        let fallback = PersistedDefaults::default();
        PersistedDefaults {
            brightness: match self.last_brightness {
                0 => fallback.brightness,
                v => Brightness::clamped(v),
            },
            temperature: match self.last_temperature {
                0 => fallback.temperature,
                v => Kelvin::clamped(v),
            },
        }
    }

    pub fn set_brightness(&mut self, brightness: Brightness) {
        self.last_brightness = i64::from(brightness.value());
    }

    pub fn set_temperature(&mut self, temperature: Kelvin) {
        self.last_temperature = i64::from(temperature.value());
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<IndexMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// JSON file backed settings store.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.config/keylight/config.json`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("keylight")
            .join("config.json")
    }

    /// Load settings. A missing or unparsable file yields the defaults.
    pub fn load(&self) -> Settings {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "no settings file, using defaults");
                return Settings::default();
            }
        };
        match serde_json::from_str(&data) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "unreadable settings file, using defaults"
                );
                Settings::default()
            }
        }
    }

    /// Write the whole document. The file is replaced via rename so readers
    /// never see a partial write.
    pub fn save(&self, settings: &Settings) -> Result<(), AppError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let data = serde_json::to_string_pretty(settings)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}
