//! Interactive terminal view, started when `keylight` runs without a command.
//!
//! Logs go to a file (default `/tmp/keylight.log`) so they never corrupt the
//! screen. Discovery and status polling run as detached tasks and report
//! back through the app's action channel.

pub mod app;
pub mod event;
pub mod terminal;
pub mod view;

use std::sync::Arc;

use tracing::info;

use crate::api::device_client::DeviceClient;
use crate::config::RuntimeConfig;
use crate::control::ControlService;
use crate::discovery::{Discovery, MdnsDiscovery, BLOCKING_BUDGET};
use crate::error::AppError;
use crate::logging;
use crate::router::Session;

pub use app::App;

pub async fn run(config: &RuntimeConfig) -> Result<(), AppError> {
    let _guard = logging::init_file(config.verbose, &config.log_file)?;

    let store = config.settings_store();
    let mut settings = store.load();
    let discovery: Arc<dyn Discovery> = Arc::new(MdnsDiscovery::new());

    if settings.lights.is_empty() {
        println!("No lights configured. Discovering...");
        let found = discovery.discover(BLOCKING_BUDGET).await?;
        if found.is_empty() {
            return Err(AppError::Discovery("No lights found".into()));
        }
        info!(count = found.len(), "first run discovery");
        settings.lights = found;
        store.save(&settings)?;
    }

    let session = Session::new(store, settings, ControlService::new(DeviceClient::new()?));
    terminal::install_panic_hook();
    App::new(session, discovery).run().await
}
