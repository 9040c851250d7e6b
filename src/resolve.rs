use crate::error::AppError;
use crate::models::registry::{DeviceRegistry, Target};

/// Resolve a light by ordinal or name.
///
/// Resolution priority:
/// 1. Positive integer: 1-based ordinal
/// 2. Exact name match
/// 3. Case-insensitive name match
/// 4. Partial name match (only if exactly one result)
pub fn resolve_device(registry: &DeviceRegistry, identifier: &str) -> Result<Target, AppError> {
    let identifier = identifier.trim();

    if let Ok(ordinal) = identifier.parse::<usize>() {
        if ordinal > 0 {
            return registry
                .by_ordinal(ordinal)
                .ok_or_else(|| AppError::DeviceNotFound(identifier.to_string()));
        }
    }

    if let Some(target) = registry.by_name(identifier) {
        return Ok(target);
    }

    let wanted = identifier.to_lowercase();

    if let Some(target) = registry
        .targets()
        .find(|t| t.name.to_lowercase() == wanted)
    {
        return Ok(target);
    }

    let mut partial: Vec<Target> = registry
        .targets()
        .filter(|t| t.name.to_lowercase().contains(&wanted))
        .collect();

    match partial.len() {
        1 => Ok(partial.remove(0)),
        0 => Err(AppError::DeviceNotFound(identifier.to_string())),
        _ => {
            let names: Vec<&str> = partial.iter().map(|t| t.name.as_str()).collect();
            Err(AppError::InvalidInput(format!(
                "Multiple lights match '{}': {}",
                identifier,
                names.join(", ")
            )))
        }
    }
}
