use std::path::PathBuf;

use crate::cli::Cli;
use crate::settings::SettingsStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Json,
    Table,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub output_mode: OutputMode,
    /// Number of `-v` flags.
    pub verbose: u8,
    pub settings_path: PathBuf,
    pub log_file: PathBuf,
}

impl RuntimeConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            output_mode: if cli.table {
                OutputMode::Table
            } else {
                OutputMode::Json
            },
            verbose: cli.verbose,
            settings_path: cli
                .config
                .clone()
                .unwrap_or_else(SettingsStore::default_path),
            log_file: cli.log_file.clone(),
        }
    }

    pub fn settings_store(&self) -> SettingsStore {
        SettingsStore::new(&self.settings_path)
    }
}
