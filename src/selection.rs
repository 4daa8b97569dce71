#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Highlighted position within the visible set, if any.
///
/// Positions index the visible set, not the catalog. Every change of the
/// visible set jumps back to its first entry.
#[derive(Debug)]
pub struct SelectionTracker {
    cursor: Option<usize>,
    len: usize,
    wrap: bool,
}

impl SelectionTracker {
    /// With `wrap` off, moving past either end does nothing.
    pub fn new(wrap: bool) -> Self {
        Self {
            cursor: None,
            len: 0,
            wrap,
        }
    }

    pub fn on_visible_set_changed(&mut self, visible: &[usize]) {
        self.len = visible.len();
        self.cursor = if visible.is_empty() { None } else { Some(0) };
    }

    pub fn move_by(&mut self, direction: Direction) {
        let Some(cursor) = self.cursor else { return };
        let last = self.len - 1;

        self.cursor = Some(match (direction, self.wrap) {
            (Direction::Next, _) if cursor < last => cursor + 1,
            (Direction::Next, true) => 0,
            (Direction::Previous, _) if cursor > 0 => cursor - 1,
            (Direction::Previous, true) => last,
            (_, false) => cursor,
        });
    }

    pub fn selected(&self) -> Option<usize> {
        self.cursor
    }

    /// Catalog index of the highlighted entry.
    pub fn current(&self, visible: &[usize]) -> Option<usize> {
        self.cursor.and_then(|pos| visible.get(pos).copied())
    }
}
