use crate::catalog::Catalog;
use log::debug;

/// Live text filter over a catalog.
///
/// Matching is a case-insensitive substring test against the display name.
/// Results stay in catalog order: there is no scoring. Names are lowercased
/// once up front, so a filter update is a single pass over the catalog.
pub struct SearchIndex {
    folded: Vec<String>,
    filter: String,
    visible: Vec<usize>,
}

impl SearchIndex {
    pub fn new(catalog: &Catalog) -> Self {
        let folded: Vec<String> = catalog.iter().map(|e| e.display_name.to_lowercase()).collect();
        let visible = (0..folded.len()).collect();
        Self {
            folded,
            filter: String::new(),
            visible,
        }
    }

    /// Recomputes the visible set for `text` and returns it as catalog indices.
    pub fn set_filter(&mut self, text: &str) -> &[usize] {
        let needle = text.to_lowercase();
        self.visible = self
            .folded
            .iter()
            .enumerate()
            .filter(|(_, name)| name.contains(needle.as_str()))
            .map(|(i, _)| i)
            .collect();
        self.filter = text.to_string();

        debug!("SearchIndex: filter={:?}, visible={}", self.filter, self.visible.len());
        &self.visible
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn visible(&self) -> &[usize] {
        &self.visible
    }
}
