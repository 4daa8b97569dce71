use crate::model::Entry;
use crate::registry::Registry;
use log::{info, warn};
use regex::Regex;

/// Every launchable entry, in enumeration order. Filled once, read-only after.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<Entry>,
}

impl Catalog {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Concatenates the registries in order. A registry that fails is logged
    /// and contributes nothing; the launcher still starts.
    pub fn load(registries: &[Box<dyn Registry>], exclude: &[String]) -> Self {
        let patterns: Vec<Regex> = exclude
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(err) => {
                    warn!("Ignoring exclude pattern {:?}: {}", pattern, err);
                    None
                }
            })
            .collect();

        let mut entries = Vec::new();
        for registry in registries {
            match registry.enumerate_applications() {
                Ok(found) => entries.extend(found.into_iter().filter(|e| !is_excluded(e, &patterns))),
                Err(err) => warn!("Registry {} unavailable: {}", registry.name(), err),
            }
        }

        info!("Catalog: loaded {} entries", entries.len());
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }
}

fn is_excluded(entry: &Entry, patterns: &[Regex]) -> bool {
    patterns
        .iter()
        .any(|re| re.is_match(&entry.display_name) || re.is_match(&entry.handle.id))
}
