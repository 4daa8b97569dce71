use crate::config::StaticItem;
use crate::error::RegistryError;
use crate::model::{Entry, LaunchHandle};
use crate::registry::Registry;
use log::{info, warn};

/// Entries declared under `[[items]]` in the config file.
pub struct ItemsRegistry {
    items: Vec<StaticItem>,
}

impl ItemsRegistry {
    pub fn new(items: Vec<StaticItem>) -> Self {
        Self { items }
    }
}

impl Registry for ItemsRegistry {
    fn name(&self) -> &str {
        "items"
    }

    fn enumerate_applications(&self) -> Result<Vec<Entry>, RegistryError> {
        let mut entries = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let argv = match shlex::split(&item.command) {
                Some(argv) if !argv.is_empty() => argv,
                _ => {
                    warn!("Skipping item {:?}: cannot parse command {:?}", item.name, item.command);
                    continue;
                }
            };
            let handle = LaunchHandle {
                id: format!("item:{}", item.name),
                argv,
                terminal: item.terminal,
                source: None,
            };
            entries.push(Entry::new(item.name.clone(), handle).with_icon(item.icon.clone()));
        }
        info!("ItemsRegistry: found {} entries", entries.len());
        Ok(entries)
    }
}
