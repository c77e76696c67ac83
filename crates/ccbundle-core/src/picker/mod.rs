//! Picker: an addressable, filterable, collapsible list of grouped items
//!
//! Rows are addressed by their index in the item list. One extra virtual row,
//! the trailing action row, lives at index `items.len()` when the picker has
//! an action label; it is never stored as an [`Item`].

pub mod filter;

pub use filter::{compute_view, Facet, FacetSet, ViewQuery};

use crate::item::Item;
use crate::value::truncate;
use std::collections::{BTreeSet, HashSet};

/// Action row label while a discovery scan is running
pub const SEARCHING_LABEL: &str = "Searching…";

const DEFAULT_HEIGHT: usize = 20;
const DEFAULT_WIDTH: usize = 80;

/// Cursor movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// What [`Picker::activate`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerAction {
    /// The row under the cursor was toggled
    Toggled,
    /// The header under the cursor was collapsed or expanded
    CollapseToggled,
    /// The action row asked for a discovery scan
    Scan,
}

/// Kind of a rendered row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Item,
    Header { collapsed: bool },
    Description,
    Action,
}

/// A row inside the viewport, ready for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Item index, or `items.len()` for the action row
    pub index: usize,
    pub kind: RowKind,
    /// Display text cut to the viewport width
    pub text: String,
    pub selected: bool,
    pub read_only: bool,
    pub base_inherited: bool,
    pub is_cursor: bool,
}

/// Selection list for one section of one tab
#[derive(Debug, Clone)]
pub struct Picker {
    items: Vec<Item>,
    cursor: usize,
    scroll: usize,
    height: usize,
    width: usize,
    filter_text: String,
    needle: String,
    facets: FacetSet,
    collapsed: HashSet<usize>,
    searching: bool,
    focused: bool,
    action_label: Option<String>,
}

impl Picker {
    /// Create a picker with the cursor on the first selectable row
    pub fn new(items: Vec<Item>) -> Self {
        let mut picker = Self {
            items,
            cursor: 0,
            scroll: 0,
            height: DEFAULT_HEIGHT,
            width: DEFAULT_WIDTH,
            filter_text: String::new(),
            needle: String::new(),
            facets: FacetSet::default(),
            collapsed: HashSet::new(),
            searching: false,
            focused: false,
            action_label: None,
        };
        picker.cursor = picker.first_selectable_stop();
        picker
    }

    /// Add a trailing action row with `label`
    #[must_use]
    pub fn with_action(mut self, label: impl Into<String>) -> Self {
        self.action_label = Some(label.into());
        if self.stops().len() == 1 {
            self.cursor = self.items.len();
        }
        self
    }

    #[must_use]
    pub fn with_viewport(mut self, height: usize, width: usize) -> Self {
        self.set_viewport(height, width);
        self
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The item under the cursor (`None` on the action row)
    pub fn current_item(&self) -> Option<&Item> {
        self.items.get(self.cursor)
    }

    pub fn has_action(&self) -> bool {
        self.action_label.is_some()
    }

    pub fn is_on_action_row(&self) -> bool {
        self.has_action() && self.cursor == self.items.len()
    }

    /// Action row text, if there is an action row
    pub fn action_text(&self) -> Option<&str> {
        let label = self.action_label.as_deref()?;
        Some(if self.searching { SEARCHING_LABEL } else { label })
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn facets(&self) -> &FacetSet {
        &self.facets
    }

    pub fn is_collapsed(&self, header_idx: usize) -> bool {
        self.collapsed.contains(&header_idx)
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn set_searching(&mut self, searching: bool) {
        self.searching = searching;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    // ---------------------------------------------------------------------
    // View
    // ---------------------------------------------------------------------

    /// Indices of the item rows currently shown
    pub fn visible_rows(&self) -> Vec<usize> {
        let query = ViewQuery {
            needle: &self.needle,
            facets: &self.facets,
        };
        compute_view(&self.items, &query, &self.collapsed)
    }

    /// Visible rows plus the action row
    fn display_rows(&self) -> Vec<usize> {
        let mut rows = self.visible_rows();
        if self.has_action() {
            rows.push(self.items.len());
        }
        rows
    }

    /// Rows the cursor may rest on: visible non-description rows and the action row
    fn stops(&self) -> Vec<usize> {
        let mut stops: Vec<usize> = self
            .visible_rows()
            .into_iter()
            .filter(|&idx| !self.items[idx].is_description())
            .collect();
        if self.has_action() {
            stops.push(self.items.len());
        }
        stops
    }

    fn first_selectable_stop(&self) -> usize {
        let stops = self.stops();
        stops
            .iter()
            .copied()
            .find(|&idx| self.items.get(idx).is_some_and(Item::is_selectable))
            .or_else(|| stops.first().copied())
            .unwrap_or(self.items.len())
    }

    /// Put the cursor back on a stop after the view changed under it
    fn settle_cursor(&mut self) {
        if !self.stops().contains(&self.cursor) {
            self.cursor = self.first_selectable_stop();
        }
        self.ensure_cursor_visible();
    }

    fn ensure_cursor_visible(&mut self) {
        let rows = self.display_rows();
        if let Some(pos) = rows.iter().position(|&idx| idx == self.cursor) {
            if pos < self.scroll {
                self.scroll = pos;
            } else if pos >= self.scroll + self.height {
                self.scroll = pos + 1 - self.height;
            }
        }
        self.scroll = self.scroll.min(rows.len().saturating_sub(self.height));
    }

    /// Resize the viewport; a zero height is treated as one row
    pub fn set_viewport(&mut self, height: usize, width: usize) {
        self.height = height.max(1);
        self.width = width;
        self.ensure_cursor_visible();
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll
    }

    /// Rows inside the viewport
    pub fn window(&self) -> Vec<Row> {
        self.display_rows()
            .into_iter()
            .skip(self.scroll)
            .take(self.height)
            .map(|idx| self.row(idx))
            .collect()
    }

    fn row(&self, idx: usize) -> Row {
        let is_cursor = idx == self.cursor;
        let Some(item) = self.items.get(idx) else {
            return Row {
                index: idx,
                kind: RowKind::Action,
                text: truncate(self.action_text().unwrap_or_default(), self.width),
                selected: false,
                read_only: self.searching,
                base_inherited: false,
                is_cursor,
            };
        };
        let kind = if item.is_header() {
            RowKind::Header {
                collapsed: self.collapsed.contains(&idx),
            }
        } else if item.is_description() {
            RowKind::Description
        } else {
            RowKind::Item
        };
        Row {
            index: idx,
            kind,
            text: truncate(&item.display, self.width),
            selected: item.selected,
            read_only: item.read_only,
            base_inherited: item.base_inherited,
            is_cursor,
        }
    }

    // ---------------------------------------------------------------------
    // Input
    // ---------------------------------------------------------------------

    /// Move one stop up or down, clamping at the ends
    pub fn navigate(&mut self, direction: Direction) {
        let stops = self.stops();
        let Some(last) = stops.len().checked_sub(1) else {
            return;
        };
        match stops.iter().position(|&idx| idx == self.cursor) {
            Some(pos) => {
                let next = match direction {
                    Direction::Up => pos.saturating_sub(1),
                    Direction::Down => (pos + 1).min(last),
                };
                self.cursor = stops[next];
            }
            None => self.cursor = stops[0],
        }
        self.ensure_cursor_visible();
    }

    /// Flip the row under the cursor; returns whether anything changed
    pub fn toggle(&mut self) -> bool {
        match self.items.get_mut(self.cursor) {
            Some(item) if item.is_togglable() => {
                item.selected = !item.selected;
                true
            }
            _ => false,
        }
    }

    /// Act on the cursor row: toggle an item, fold a header, or request a scan
    pub fn activate(&mut self) -> Option<PickerAction> {
        if self.is_on_action_row() {
            return (!self.searching).then_some(PickerAction::Scan);
        }
        let item = self.items.get(self.cursor)?;
        if item.is_header() {
            let idx = self.cursor;
            self.toggle_collapse(idx);
            Some(PickerAction::CollapseToggled)
        } else {
            self.toggle().then_some(PickerAction::Toggled)
        }
    }

    /// Select every visible togglable row; returns how many changed
    pub fn select_all(&mut self) -> usize {
        self.set_visible(true)
    }

    /// Deselect every visible togglable row; returns how many changed
    pub fn select_none(&mut self) -> usize {
        self.set_visible(false)
    }

    fn set_visible(&mut self, selected: bool) -> usize {
        let mut changed = 0;
        for idx in self.visible_rows() {
            let item = &mut self.items[idx];
            if item.is_togglable() && item.selected != selected {
                item.selected = selected;
                changed += 1;
            }
        }
        changed
    }

    pub fn set_filter_text(&mut self, text: impl Into<String>) {
        self.filter_text = text.into();
        self.needle = self.filter_text.to_lowercase();
        self.settle_cursor();
    }

    pub fn toggle_facet(&mut self, chip: Facet) {
        self.facets.toggle(chip);
        self.settle_cursor();
    }

    /// Fold or unfold the group under `header_idx`; no-op unless it is a header
    pub fn toggle_collapse(&mut self, header_idx: usize) -> bool {
        if !self.items.get(header_idx).is_some_and(Item::is_header) {
            return false;
        }
        if !self.collapsed.remove(&header_idx) {
            self.collapsed.insert(header_idx);
        }
        self.settle_cursor();
        true
    }

    /// Collapse every group whose selectable rows are all read-only
    pub fn auto_collapse_read_only(&mut self) {
        let mut header: Option<usize> = None;
        let mut any = false;
        let mut all_locked = true;
        let mut to_collapse = Vec::new();

        for (idx, item) in self.items.iter().enumerate() {
            if item.is_header() {
                if let (Some(h), true, true) = (header, any, all_locked) {
                    to_collapse.push(h);
                }
                header = Some(idx);
                any = false;
                all_locked = true;
            } else if item.is_selectable() {
                any = true;
                all_locked &= item.read_only;
            }
        }
        if let (Some(h), true, true) = (header, any, all_locked) {
            to_collapse.push(h);
        }

        self.collapsed.extend(to_collapse);
        self.settle_cursor();
    }

    // ---------------------------------------------------------------------
    // Contents
    // ---------------------------------------------------------------------

    /// Append rows, dropping any selectable row whose key already exists
    ///
    /// A header (with its descriptions) is only appended once one of its rows
    /// survives, and is skipped when it repeats the label of the list's last
    /// group so repeated merges from one source stay in one group. Rows are
    /// never inserted above the end: a source whose group is not last gets a
    /// second header with the same label, and the indices of existing rows,
    /// collapsed headers, and the cursor stay valid. Returns the number of
    /// selectable rows added.
    pub fn add_items(&mut self, new_items: Vec<Item>) -> usize {
        let was_empty = self.stops().iter().all(|&idx| idx >= self.items.len());
        let was_on_action = self.is_on_action_row();
        let mut known: HashSet<String> = self.all_keys().into_iter().collect();
        let mut pending: Vec<Item> = Vec::new();
        let mut appended: Vec<Item> = Vec::new();
        let mut added = 0;

        for item in new_items {
            if item.is_header() {
                pending.clear();
                pending.push(item);
                continue;
            }
            if item.is_description() {
                pending.push(item);
                continue;
            }
            let Some(key) = item.key.clone() else {
                continue;
            };
            if !known.insert(key) {
                continue;
            }
            if !pending.is_empty() {
                let last_header = self
                    .items
                    .iter()
                    .chain(appended.iter())
                    .rev()
                    .find(|existing| existing.is_header());
                let continues_last_group = pending[0].is_header()
                    && last_header.is_some_and(|h| h.display == pending[0].display);
                if continues_last_group {
                    pending.clear();
                } else {
                    appended.append(&mut pending);
                }
            }
            appended.push(item);
            added += 1;
        }

        self.items.extend(appended);
        if was_on_action || (was_empty && added > 0) {
            self.cursor = if was_on_action && !was_empty {
                self.items.len()
            } else {
                self.first_selectable_stop()
            };
        }
        self.ensure_cursor_visible();
        added
    }

    /// Swap in a new item list, keeping filter, facets, and viewport
    pub fn replace_items(&mut self, items: Vec<Item>) {
        let was_on_action = self.is_on_action_row();
        self.items = items;
        let items = &self.items;
        self.collapsed
            .retain(|&idx| items.get(idx).is_some_and(Item::is_header));
        if was_on_action {
            self.cursor = self.items.len();
        }
        self.settle_cursor();
    }

    /// Keys of selected rows
    pub fn selected_keys(&self) -> BTreeSet<String> {
        self.items
            .iter()
            .filter(|item| item.is_selectable() && item.selected)
            .filter_map(|item| item.key.clone())
            .collect()
    }

    /// Keys of every selectable row
    pub fn all_keys(&self) -> BTreeSet<String> {
        self.items.iter().filter_map(|item| item.key.clone()).collect()
    }

    pub fn item_by_key(&self, key: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.key.as_deref() == Some(key))
    }

    /// Select exactly the rows whose key is in `keys`
    pub fn set_selection(&mut self, keys: &BTreeSet<String>) {
        for item in self.items.iter_mut().filter(|item| item.is_selectable()) {
            item.selected = item.key.as_ref().is_some_and(|key| keys.contains(key));
        }
    }

    /// Flag rows whose key is in the base selection
    pub fn mark_base_inherited(&mut self, base_keys: &BTreeSet<String>) {
        for item in self.items.iter_mut().filter(|item| item.is_selectable()) {
            item.base_inherited = item.key.as_ref().is_some_and(|key| base_keys.contains(key));
        }
    }

    /// Lock every row owned by `owner`: read-only and selected
    pub fn lock_owned_by(&mut self, owner: &str) -> usize {
        self.update_owned(owner, |item| {
            item.read_only = true;
            item.selected = true;
        })
    }

    /// Unlock every row owned by `owner`, optionally deselecting it too
    pub fn release_owned_by(&mut self, owner: &str, deselect: bool) -> usize {
        self.update_owned(owner, |item| {
            item.read_only = false;
            if deselect {
                item.selected = false;
            }
        })
    }

    fn update_owned(&mut self, owner: &str, update: impl Fn(&mut Item)) -> usize {
        let mut count = 0;
        for item in &mut self.items {
            if item.owner.as_deref() == Some(owner) {
                update(item);
                count += 1;
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grouped() -> Picker {
        Picker::new(vec![
            Item::header("header1"),
            Item::new("a", "itemA"),
            Item::header("header2"),
            Item::new("b", "itemB"),
            Item::new("c", "itemC"),
        ])
    }

    #[test]
    fn test_initial_cursor_skips_to_first_selectable() {
        assert_eq!(grouped().cursor(), 1);
    }

    #[test]
    fn test_navigation_stops_on_headers_and_clamps() {
        let mut picker = grouped();
        picker.navigate(Direction::Down);
        assert_eq!(picker.cursor(), 2);
        picker.navigate(Direction::Down);
        assert_eq!(picker.cursor(), 3);
        picker.navigate(Direction::Down);
        picker.navigate(Direction::Down);
        assert_eq!(picker.cursor(), 4);
        for _ in 0..10 {
            picker.navigate(Direction::Up);
        }
        assert_eq!(picker.cursor(), 0);
    }

    #[test]
    fn test_navigation_skips_descriptions() {
        let mut picker = Picker::new(vec![
            Item::header("h"),
            Item::description("about"),
            Item::new("a", "a"),
        ]);
        assert_eq!(picker.cursor(), 2);
        picker.navigate(Direction::Up);
        assert_eq!(picker.cursor(), 0);
        picker.navigate(Direction::Down);
        assert_eq!(picker.cursor(), 2);
    }

    #[test]
    fn test_toggle_ignores_headers_and_read_only() {
        let mut picker = Picker::new(vec![
            Item::header("h"),
            Item::new("a", "a").owned_by("p@m", true),
            Item::new("b", "b"),
        ]);
        assert_eq!(picker.cursor(), 1);
        assert!(!picker.toggle());
        assert!(picker.items()[1].selected);
        picker.navigate(Direction::Up);
        assert!(!picker.toggle());
        picker.navigate(Direction::Down);
        picker.navigate(Direction::Down);
        assert!(picker.toggle());
        assert!(picker.items()[2].selected);
    }

    #[test]
    fn test_action_row_is_last_stop() {
        let mut picker = grouped().with_action("Search for more…");
        for _ in 0..10 {
            picker.navigate(Direction::Down);
        }
        assert!(picker.is_on_action_row());
        assert_eq!(picker.activate(), Some(PickerAction::Scan));

        picker.set_searching(true);
        assert_eq!(picker.action_text(), Some(SEARCHING_LABEL));
        assert_eq!(picker.activate(), None);
        assert!(!picker.toggle());
    }

    #[test]
    fn test_activate_on_header_collapses() {
        let mut picker = grouped();
        picker.navigate(Direction::Down);
        assert_eq!(picker.activate(), Some(PickerAction::CollapseToggled));
        assert!(picker.is_collapsed(2));
        assert_eq!(picker.visible_rows(), vec![0, 1, 2]);
    }

    #[test]
    fn test_collapse_hides_cursor_row_moves_cursor() {
        let mut picker = grouped();
        picker.navigate(Direction::Down);
        picker.navigate(Direction::Down);
        assert_eq!(picker.cursor(), 3);
        picker.toggle_collapse(2);
        assert_eq!(picker.cursor(), 1);
        assert!(!picker.toggle_collapse(3));
        assert!(!picker.toggle_collapse(99));
    }

    #[test]
    fn test_window_scrolls_with_cursor() {
        let items = (0..10).map(|i| Item::new(format!("k{i}"), format!("item {i}"))).collect();
        let mut picker = Picker::new(items).with_viewport(3, 5);
        for _ in 0..5 {
            picker.navigate(Direction::Down);
        }
        let window = picker.window();
        assert_eq!(window.len(), 3);
        assert_eq!(window.last().map(|r| r.index), Some(5));
        assert!(window.last().is_some_and(|r| r.is_cursor));
        assert_eq!(window[0].text, "item…");
        assert_eq!(picker.scroll_offset(), 3);
    }

    #[test]
    fn test_add_items_extends_trailing_group() {
        let mut picker = Picker::new(vec![Item::header("~/code/app"), Item::new("a", "a")]);
        let added = picker.add_items(vec![Item::header("~/code/app"), Item::new("b", "b")]);
        assert_eq!(added, 1);
        assert_eq!(picker.len(), 3);
        let added = picker.add_items(vec![Item::header("~/code/web"), Item::new("a", "dup")]);
        assert_eq!(added, 0);
        assert_eq!(picker.len(), 3);
    }

    #[test]
    fn test_add_items_into_empty_picker_places_cursor() {
        let mut picker = Picker::new(Vec::new()).with_action("Search");
        assert!(picker.is_on_action_row());
        picker.add_items(vec![Item::header("src"), Item::new("x", "x")]);
        assert_eq!(picker.cursor(), 1);
    }

    #[test]
    fn test_add_items_keeps_action_cursor() {
        let mut picker = grouped().with_action("Search");
        for _ in 0..10 {
            picker.navigate(Direction::Down);
        }
        picker.add_items(vec![Item::new("z", "z")]);
        assert!(picker.is_on_action_row());
        assert_eq!(picker.cursor(), 6);
    }

    #[test]
    fn test_owner_lock_and_release() {
        let mut picker = Picker::new(vec![
            Item::new("x", "x").owned_by("p@m", false),
            Item::new("y", "y").owned_by("p@m", false).selected(true),
            Item::new("z", "z"),
        ]);
        assert_eq!(picker.lock_owned_by("p@m"), 2);
        assert!(picker.items()[0].read_only && picker.items()[0].selected);
        assert_eq!(picker.release_owned_by("p@m", true), 2);
        assert!(!picker.items()[1].read_only && !picker.items()[1].selected);
        assert!(!picker.items()[2].selected);
    }
}
