//! Scrollable list widget.
//!
//! The owner pushes fully rendered lines with [`ScrollableList::set_items`]
//! on every cycle; the widget only keeps the cursor, the scroll offset and the
//! border styling. There is no diffing between two sets of items: the cursor
//! keeps its numeric index, clamped to the new length, even when the row it
//! pointed at moved or disappeared.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Bounded-height list with a clamped cursor.
#[derive(Debug, Clone)]
pub struct ScrollableList {
    items: Vec<Line<'static>>,
    header: Option<Line<'static>>,
    cursor: Option<usize>,
    offset: usize,
    height: usize,
    label: String,
    borders: Borders,
    focused: bool,
    cursor_visible: bool,
}

impl ScrollableList {
    /// Empty list with a border label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            header: None,
            cursor: None,
            offset: 0,
            height: 0,
            label: label.into(),
            borders: Borders::TOP,
            focused: false,
            cursor_visible: false,
        }
    }

    /// Which borders to draw.
    #[must_use]
    pub const fn with_borders(mut self, borders: Borders) -> Self {
        self.borders = borders;
        self
    }

    /// Replace all items. The cursor index is kept and clamped.
    pub fn set_items(&mut self, items: Vec<Line<'static>>) {
        self.items = items;
        self.cursor = match (self.items.len(), self.cursor) {
            (0, _) => None,
            (len, Some(cursor)) => Some(cursor.min(len - 1)),
            (_, None) => Some(0),
        };
        self.scroll_to_cursor();
    }

    /// Current items.
    pub fn items(&self) -> &[Line<'static>] {
        &self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when there is nothing to show.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Cursor position, `None` when empty.
    pub const fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Line under the cursor.
    pub fn selected(&self) -> Option<&Line<'static>> {
        self.cursor.and_then(|c| self.items.get(c))
    }

    /// Move the cursor one row up, stopping at the first row.
    pub fn cursor_up(&mut self) {
        if let Some(cursor) = self.cursor {
            self.cursor = Some(cursor.saturating_sub(1));
            self.scroll_to_cursor();
        }
    }

    /// Move the cursor one row down, stopping at the last row.
    pub fn cursor_down(&mut self) {
        if let Some(cursor) = self.cursor {
            let last = self.items.len().saturating_sub(1);
            self.cursor = Some((cursor + 1).min(last));
            self.scroll_to_cursor();
        }
    }

    /// First visible row.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Number of rows that fit in the panel.
    pub fn set_height(&mut self, height: usize) {
        self.height = height;
        self.scroll_to_cursor();
    }

    /// Rows currently in view, with their index.
    pub fn visible(&self) -> impl Iterator<Item = (usize, &Line<'static>)> {
        let take = if self.height == 0 { self.items.len() } else { self.height };
        self.items.iter().enumerate().skip(self.offset).take(take)
    }

    /// Border label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Replace the border label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Column header drawn above the items.
    pub fn set_header(&mut self, header: Line<'static>) {
        self.header = Some(header);
    }

    /// Highlight the border as the focused panel.
    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Whether the border is highlighted.
    pub const fn is_focused(&self) -> bool {
        self.focused
    }

    /// Show or hide the cursor highlight.
    pub fn set_cursor_visibility(&mut self, visible: bool) {
        self.cursor_visible = visible;
    }

    fn scroll_to_cursor(&mut self) {
        let Some(cursor) = self.cursor else {
            self.offset = 0;
            return;
        };
        if self.height == 0 {
            return;
        }
        if cursor < self.offset {
            self.offset = cursor;
        } else if cursor >= self.offset + self.height {
            self.offset = cursor + 1 - self.height;
        }
        self.offset = self.offset.min(self.items.len().saturating_sub(self.height));
    }

    /// Draw the list into `area`, adjusting the visible height to it.
    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(self.borders)
            .title(self.label.clone())
            .border_style(if self.focused {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            });

        let inner = block.inner(area);
        let header_rows = usize::from(self.header.is_some());
        self.set_height(usize::from(inner.height).saturating_sub(header_rows));

        let mut rows: Vec<ListItem> = Vec::with_capacity(self.height + header_rows);
        if let Some(header) = &self.header {
            rows.push(ListItem::new(header.clone()));
        }
        let highlighted = self.cursor.filter(|_| self.cursor_visible);
        for (idx, line) in self.visible() {
            let item = ListItem::new(line.clone());
            rows.push(if Some(idx) == highlighted {
                item.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                item
            });
        }

        frame.render_widget(List::new(rows).block(block), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(n: usize) -> Vec<Line<'static>> {
        (0..n).map(|i| Line::from(format!("row {i}"))).collect()
    }

    #[test]
    fn empty_list_has_no_cursor() {
        let mut list = ScrollableList::new(" Queue ");
        assert_eq!(list.cursor(), None);
        list.cursor_down();
        list.cursor_up();
        assert_eq!(list.cursor(), None);
        assert!(list.selected().is_none());
    }

    #[test]
    fn cursor_starts_at_first_row() {
        let mut list = ScrollableList::new("");
        list.set_items(lines(3));
        assert_eq!(list.cursor(), Some(0));
    }

    #[test]
    fn cursor_clamps_without_wrapping() {
        let mut list = ScrollableList::new("");
        list.set_items(lines(3));
        list.cursor_up();
        assert_eq!(list.cursor(), Some(0));
        for _ in 0..10 {
            list.cursor_down();
        }
        assert_eq!(list.cursor(), Some(2));
    }

    #[test]
    fn cursor_index_survives_content_replacement() {
        let mut list = ScrollableList::new("");
        list.set_items(lines(5));
        list.cursor_down();
        list.cursor_down();
        // Rows 0 and 1 finished; the cursor still points at index 2, which
        // is now a different logical row.
        let shifted: Vec<Line<'static>> = (2..7).map(|i| Line::from(format!("row {i}"))).collect();
        list.set_items(shifted);
        assert_eq!(list.cursor(), Some(2));
        assert_eq!(list.selected(), Some(&Line::from("row 4")));
    }

    #[test]
    fn cursor_clamps_when_content_shrinks() {
        let mut list = ScrollableList::new("");
        list.set_items(lines(5));
        for _ in 0..4 {
            list.cursor_down();
        }
        list.set_items(lines(2));
        assert_eq!(list.cursor(), Some(1));
        list.set_items(Vec::new());
        assert_eq!(list.cursor(), None);
    }

    #[test]
    fn offset_follows_cursor() {
        let mut list = ScrollableList::new("");
        list.set_items(lines(10));
        list.set_height(3);
        for _ in 0..5 {
            list.cursor_down();
        }
        assert_eq!(list.cursor(), Some(5));
        assert_eq!(list.offset(), 3);
        let visible: Vec<usize> = list.visible().map(|(i, _)| i).collect();
        assert_eq!(visible, vec![3, 4, 5]);
        for _ in 0..5 {
            list.cursor_up();
        }
        assert_eq!(list.offset(), 0);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn cursor_stays_in_bounds(
                len in 0usize..40,
                height in 0usize..10,
                moves in prop::collection::vec(any::<bool>(), 0..80),
            ) {
                let mut list = ScrollableList::new("");
                list.set_items(lines(len));
                list.set_height(height);
                for down in moves {
                    if down { list.cursor_down() } else { list.cursor_up() }
                    match list.cursor() {
                        Some(c) => prop_assert!(c < len),
                        None => prop_assert_eq!(len, 0),
                    }
                }
            }
        }
    }
}
