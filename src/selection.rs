use crate::models::registry::DeviceRegistry;

/// Which lights the next command targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionMode {
    #[default]
    All,
    /// 1-based position in the registry.
    ByOrdinal(usize),
}

#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    mode: SelectionMode,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn select_all(&mut self) {
        self.mode = SelectionMode::All;
    }

    /// Select a single light. Unknown ordinals leave the current mode alone
    /// and return `false`.
    pub fn select_ordinal(&mut self, ordinal: usize, registry: &DeviceRegistry) -> bool {
        if registry.by_ordinal(ordinal).is_none() {
            return false;
        }
        self.mode = SelectionMode::ByOrdinal(ordinal);
        true
    }

    pub fn resolve_addresses(&self, registry: &DeviceRegistry) -> Vec<String> {
        match self.mode {
            SelectionMode::All => registry.addresses(),
            SelectionMode::ByOrdinal(ordinal) => registry
                .by_ordinal(ordinal)
                .map(|target| vec![target.address])
                .unwrap_or_default(),
        }
    }
}
