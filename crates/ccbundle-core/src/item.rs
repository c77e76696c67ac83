//! Selectable rows

/// What kind of row an [`Item`] is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemKind {
    /// A keyed, togglable row
    #[default]
    Selectable,
    /// Group heading; owns the rows below it up to the next header
    Header,
    /// Explanatory text; never a cursor stop
    Description,
}

/// One row of a picker
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Item {
    /// Unique among selectable rows; `None` for headers and descriptions
    pub key: Option<String>,
    /// Text shown in the list
    pub display: String,
    pub kind: ItemKind,
    pub selected: bool,
    /// Selection is controlled elsewhere (e.g. by an owning plugin)
    pub read_only: bool,
    /// Selected in the base view (only meaningful in profile views)
    pub base_inherited: bool,
    /// Secondary label, searchable
    pub tag: Option<String>,
    /// Origin label (plugin, provider), searchable
    pub provider_tag: Option<String>,
    /// Plugin key whose selection locks this row
    pub owner: Option<String>,
}

impl Item {
    /// A selectable row, initially unselected
    pub fn new(key: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            display: display.into(),
            ..Self::default()
        }
    }

    /// A group header
    pub fn header(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            kind: ItemKind::Header,
            ..Self::default()
        }
    }

    /// A description row
    pub fn description(text: impl Into<String>) -> Self {
        Self {
            display: text.into(),
            kind: ItemKind::Description,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    #[must_use]
    pub fn with_provider_tag(mut self, provider: impl Into<String>) -> Self {
        self.provider_tag = Some(provider.into());
        self
    }

    /// Mark the row as owned by `plugin`; `locked` makes it read-only and selected
    #[must_use]
    pub fn owned_by(mut self, plugin: impl Into<String>, locked: bool) -> Self {
        let plugin = plugin.into();
        self.provider_tag.get_or_insert_with(|| plugin.clone());
        self.owner = Some(plugin);
        if locked {
            self.read_only = true;
            self.selected = true;
        }
        self
    }

    pub fn is_header(&self) -> bool {
        self.kind == ItemKind::Header
    }

    pub fn is_description(&self) -> bool {
        self.kind == ItemKind::Description
    }

    pub fn is_selectable(&self) -> bool {
        self.kind == ItemKind::Selectable
    }

    /// Selectable and not locked
    pub fn is_togglable(&self) -> bool {
        self.is_selectable() && !self.read_only
    }

    /// Case-insensitive substring match on display text, tag, or provider tag
    ///
    /// `needle` must already be lowercase.
    pub fn matches_text(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        std::iter::once(self.display.as_str())
            .chain(self.tag.as_deref())
            .chain(self.provider_tag.as_deref())
            .any(|field| field.to_lowercase().contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_text_checks_all_labels() {
        let item = Item::new("k", "GitHub Server")
            .with_tag("stdio")
            .with_provider_tag("tools@market");
        assert!(item.matches_text("github"));
        assert!(item.matches_text("stdio"));
        assert!(item.matches_text("market"));
        assert!(!item.matches_text("slack"));
    }

    #[test]
    fn test_owned_by_locks() {
        let item = Item::new("cmd:lint:fix", "fix").owned_by("lint@tools", true);
        assert!(item.read_only);
        assert!(item.selected);
        assert!(!item.is_togglable());
        assert_eq!(item.provider_tag.as_deref(), Some("lint@tools"));

        let free = Item::new("cmd:lint:fix", "fix").owned_by("lint@tools", false);
        assert!(!free.read_only);
        assert!(!free.selected);
    }
}
