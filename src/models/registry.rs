use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use serde::Serialize;

/// A named light and where to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub ordinal: usize,
    pub name: String,
    pub address: String,
}

/// Immutable, ordered snapshot of the known lights. Iteration order defines
/// ordinals (1-based). A new discovery produces a new snapshot with a higher
/// version; snapshots are never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRegistry {
    version: u64,
    lights: IndexMap<String, String>,
}

impl DeviceRegistry {
    pub fn new(lights: IndexMap<String, String>) -> Self {
        Self { version: 0, lights }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn targets(&self) -> impl Iterator<Item = Target> + '_ {
        self.lights
            .iter()
            .enumerate()
            .map(|(i, (name, address))| Target {
                ordinal: i + 1,
                name: name.clone(),
                address: address.clone(),
            })
    }

    pub fn addresses(&self) -> Vec<String> {
        self.lights.values().cloned().collect()
    }

    pub fn by_ordinal(&self, ordinal: usize) -> Option<Target> {
        let index = ordinal.checked_sub(1)?;
        self.lights
            .get_index(index)
            .map(|(name, address)| Target {
                ordinal,
                name: name.clone(),
                address: address.clone(),
            })
    }

    pub fn by_name(&self, name: &str) -> Option<Target> {
        self.lights
            .get_full(name)
            .map(|(index, name, address)| Target {
                ordinal: index + 1,
                name: name.clone(),
                address: address.clone(),
            })
    }

    /// Display name for an address, falling back to the address itself.
    pub fn name_of<'a>(&'a self, address: &'a str) -> &'a str {
        self.lights
            .iter()
            .find(|(_, a)| a.as_str() == address)
            .map_or(address, |(name, _)| name.as_str())
    }
}

/// Slot holding the current registry snapshot. Readers take an `Arc` and keep
/// working on it even if discovery swaps in a replacement meanwhile.
#[derive(Debug)]
pub struct RegistryStore {
    slot: ArcSwap<DeviceRegistry>,
}

impl RegistryStore {
    pub fn new(registry: DeviceRegistry) -> Self {
        Self {
            slot: ArcSwap::from_pointee(registry),
        }
    }

    pub fn snapshot(&self) -> Arc<DeviceRegistry> {
        self.slot.load_full()
    }

    /// Atomically replace the whole registry. Returns the new snapshot.
    pub fn replace(&self, lights: IndexMap<String, String>) -> Arc<DeviceRegistry> {
        self.slot.rcu(|current| DeviceRegistry {
            version: current.version + 1,
            lights: lights.clone(),
        });
        self.slot.load_full()
    }
}
