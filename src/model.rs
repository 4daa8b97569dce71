use std::path::PathBuf;

/// Everything the launch dispatcher needs to start an entry.
/// The search and selection code never looks inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchHandle {
    pub id: String,                // Desktop-file ID or "item:<name>"
    pub argv: Vec<String>,         // Program followed by its arguments
    pub terminal: bool,            // Needs to run inside a terminal emulator
    pub source: Option<PathBuf>,   // File the entry was read from, if any
}

/// One launchable application. Immutable once the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub display_name: String,
    pub icon: Option<String>,      // Icon name or absolute path
    pub handle: LaunchHandle,
}

impl Entry {
    pub fn new(display_name: impl Into<String>, handle: LaunchHandle) -> Self {
        Self {
            display_name: display_name.into(),
            icon: None,
            handle,
        }
    }

    pub fn with_icon(mut self, icon: Option<String>) -> Self {
        self.icon = icon;
        self
    }
}

#[cfg(test)]
pub(crate) fn entry(name: &str) -> Entry {
    Entry::new(
        name,
        LaunchHandle {
            id: format!("{}.desktop", name.to_lowercase()),
            argv: vec![name.to_lowercase()],
            terminal: false,
            source: None,
        },
    )
}
