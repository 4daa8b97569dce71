use crate::catalog::Catalog;
use crate::error::SessionError;
use crate::executor::Launcher;
use crate::input::{InputEvent, InputResolver, Phase};
use crate::model::Entry;
use crate::search::SearchIndex;
use crate::selection::SelectionTracker;
use log::{error, info};

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    Cancelled,
    Launched(String),
    LaunchFailed(String),
    NothingSelected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Idle,
    Terminated(Termination),
}

/// A single launcher run. Owns the catalog and everything derived from it;
/// the presentation layer borrows it to draw and feeds it input events.
pub struct Session {
    catalog: Catalog,
    index: SearchIndex,
    selection: SelectionTracker,
    resolver: InputResolver,
}

impl Session {
    pub fn new(catalog: Catalog, wrap_selection: bool) -> Self {
        let index = SearchIndex::new(&catalog);
        let mut selection = SelectionTracker::new(wrap_selection);
        selection.on_visible_set_changed(index.visible());

        Self {
            catalog,
            index,
            selection,
            resolver: InputResolver::new(),
        }
    }

    pub fn dispatch(&mut self, event: InputEvent, launcher: &mut dyn Launcher) -> Result<Outcome, SessionError> {
        let outcome = match self.resolver.accept(event)? {
            InputEvent::TextChanged(text) => {
                let visible = self.index.set_filter(&text);
                self.selection.on_visible_set_changed(visible);
                Outcome::Idle
            }
            InputEvent::Move(direction) => {
                self.selection.move_by(direction);
                Outcome::Idle
            }
            InputEvent::Cancel => Outcome::Terminated(Termination::Cancelled),
            InputEvent::Confirm => Outcome::Terminated(self.launch_current(launcher)),
        };

        if let Outcome::Terminated(reason) = &outcome {
            info!("Session terminated: {:?}", reason);
        }
        Ok(outcome)
    }

    fn launch_current(&self, launcher: &mut dyn Launcher) -> Termination {
        let Some(entry) = self.current() else {
            return Termination::NothingSelected;
        };
        match launcher.launch(&entry.handle) {
            Ok(()) => Termination::Launched(entry.display_name.clone()),
            Err(err) => {
                error!("Failed to launch \"{}\": {}", entry.display_name, err);
                Termination::LaunchFailed(entry.display_name.clone())
            }
        }
    }

    pub fn filter(&self) -> &str {
        self.index.filter()
    }

    /// Catalog indices currently shown, in catalog order.
    pub fn visible(&self) -> &[usize] {
        self.index.visible()
    }

    pub fn visible_entries(&self) -> impl Iterator<Item = &Entry> {
        self.index.visible().iter().filter_map(|&i| self.catalog.get(i))
    }

    /// Highlighted position within `visible()`.
    pub fn selection(&self) -> Option<usize> {
        self.selection.selected()
    }

    pub fn current(&self) -> Option<&Entry> {
        self.selection
            .current(self.index.visible())
            .and_then(|i| self.catalog.get(i))
    }

    pub fn phase(&self) -> Phase {
        self.resolver.phase()
    }
}
