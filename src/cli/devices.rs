use crate::api::device_client::DeviceClient;
use crate::cli::output::print_registry;
use crate::config::RuntimeConfig;
use crate::control::ControlService;
use crate::discovery::{Discovery, MdnsDiscovery, BLOCKING_BUDGET};
use crate::error::AppError;
use crate::models::registry::DeviceRegistry;
use crate::router::CommandRouter;

pub async fn handle_list(config: &RuntimeConfig) -> Result<(), AppError> {
    let settings = config.settings_store().load();
    let registry = DeviceRegistry::new(settings.lights);
    if registry.is_empty() {
        return Err(AppError::NotConfigured);
    }
    print_registry(&registry, config.output_mode);
    Ok(())
}

pub async fn handle_detect(config: &RuntimeConfig) -> Result<(), AppError> {
    let found = MdnsDiscovery::new().discover(BLOCKING_BUDGET).await?;
    if found.is_empty() {
        return Err(AppError::Discovery("No lights found".into()));
    }

    let client = DeviceClient::new()?;
    let mut router = CommandRouter::new(config.settings_store(), ControlService::new(client));
    router.replace_lights(found)?;
    print_registry(router.registry(), config.output_mode);
    Ok(())
}
