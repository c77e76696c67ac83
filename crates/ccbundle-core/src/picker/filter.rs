//! Filter and facet engine
//!
//! A pure function from an item list plus filter state to the list of row
//! indices that should be shown.

use crate::item::Item;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Quick-filter chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Facet {
    /// No facet filtering
    All,
    /// Only selected rows
    Selected,
    /// Only rows inherited from the base selection
    Base,
    /// Only read-only rows
    Locked,
}

impl Facet {
    /// Chips in display order
    pub const CHIPS: [Facet; 4] = [Facet::All, Facet::Selected, Facet::Base, Facet::Locked];

    fn admits(self, item: &Item) -> bool {
        match self {
            Self::All => true,
            Self::Selected => item.selected,
            Self::Base => item.base_inherited,
            Self::Locked => item.read_only,
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "All",
            Self::Selected => "Selected",
            Self::Base => "Base",
            Self::Locked => "Locked",
        })
    }
}

/// Active chips
///
/// Holds either exactly `{All}` or a non-empty set of other chips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetSet {
    active: BTreeSet<Facet>,
}

impl Default for FacetSet {
    fn default() -> Self {
        Self {
            active: BTreeSet::from([Facet::All]),
        }
    }
}

impl FacetSet {
    /// Flip a chip
    ///
    /// Activating `All` clears the others. Activating any other chip clears
    /// `All`. Deactivating the last non-`All` chip brings `All` back.
    pub fn toggle(&mut self, chip: Facet) {
        if chip == Facet::All {
            *self = Self::default();
            return;
        }
        if !self.active.remove(&chip) {
            self.active.remove(&Facet::All);
            self.active.insert(chip);
        }
        if self.active.is_empty() {
            self.active.insert(Facet::All);
        }
    }

    pub fn is_all(&self) -> bool {
        self.active.contains(&Facet::All)
    }

    pub fn contains(&self, chip: Facet) -> bool {
        self.active.contains(&chip)
    }

    pub fn iter(&self) -> impl Iterator<Item = Facet> + '_ {
        self.active.iter().copied()
    }

    /// Every active chip admits the item
    pub fn admits(&self, item: &Item) -> bool {
        self.active.iter().all(|chip| chip.admits(item))
    }
}

/// Filter text plus chips
#[derive(Debug, Clone, Copy)]
pub struct ViewQuery<'a> {
    /// Lowercased filter text
    pub needle: &'a str,
    pub facets: &'a FacetSet,
}

impl ViewQuery<'_> {
    /// Whether any predicate narrows the view
    pub fn is_active(&self) -> bool {
        !self.needle.is_empty() || !self.facets.is_all()
    }

    /// A selectable row satisfies every active predicate
    pub fn matches(&self, item: &Item) -> bool {
        item.is_selectable() && item.matches_text(self.needle) && self.facets.admits(item)
    }
}

/// Indices of the rows to show, in list order
///
/// With an active query, a selectable row is shown when it matches, and a
/// header when any row of its group matches; collapse state is ignored and
/// description rows are hidden. Without one, headers are always shown and a
/// group's other rows are shown unless its header is collapsed.
pub fn compute_view(items: &[Item], query: &ViewQuery<'_>, collapsed: &HashSet<usize>) -> Vec<usize> {
    let mut rows = Vec::with_capacity(items.len());

    if !query.is_active() {
        let mut group_collapsed = false;
        for (idx, item) in items.iter().enumerate() {
            if item.is_header() {
                group_collapsed = collapsed.contains(&idx);
                rows.push(idx);
            } else if !group_collapsed {
                rows.push(idx);
            }
        }
        return rows;
    }

    let mut pending_header: Option<usize> = None;
    for (idx, item) in items.iter().enumerate() {
        if item.is_header() {
            pending_header = Some(idx);
        } else if query.matches(item) {
            if let Some(header) = pending_header.take() {
                rows.push(header);
            }
            rows.push(idx);
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Item> {
        vec![
            Item::header("Tools"),
            Item::description("Things that help"),
            Item::new("a", "alpha").selected(true),
            Item::new("b", "beta"),
            Item::header("Docs"),
            Item::new("c", "gamma").selected(true),
        ]
    }

    #[test]
    fn test_facet_toggle_sequence() {
        let mut facets = FacetSet::default();
        assert!(facets.is_all());

        facets.toggle(Facet::Selected);
        assert_eq!(facets.iter().collect::<Vec<_>>(), vec![Facet::Selected]);

        facets.toggle(Facet::Base);
        assert_eq!(facets.iter().collect::<Vec<_>>(), vec![Facet::Selected, Facet::Base]);

        facets.toggle(Facet::Selected);
        facets.toggle(Facet::Base);
        assert!(facets.is_all());
        assert_eq!(facets.iter().count(), 1);
    }

    #[test]
    fn test_all_chip_clears_others() {
        let mut facets = FacetSet::default();
        facets.toggle(Facet::Locked);
        facets.toggle(Facet::All);
        assert!(facets.is_all());
        assert!(!facets.contains(Facet::Locked));
        facets.toggle(Facet::All);
        assert!(facets.is_all());
    }

    #[test]
    fn test_unfiltered_view_respects_collapse() {
        let items = sample();
        let facets = FacetSet::default();
        let query = ViewQuery { needle: "", facets: &facets };
        assert_eq!(compute_view(&items, &query, &HashSet::new()), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(compute_view(&items, &query, &HashSet::from([0])), vec![0, 4, 5]);
    }

    #[test]
    fn test_filtered_view_ignores_collapse() {
        let items = sample();
        let facets = FacetSet::default();
        let query = ViewQuery { needle: "gam", facets: &facets };
        assert_eq!(compute_view(&items, &query, &HashSet::from([4])), vec![4, 5]);
    }

    #[test]
    fn test_facets_and_text_combine() {
        let items = sample();
        let mut facets = FacetSet::default();
        facets.toggle(Facet::Selected);
        let query = ViewQuery { needle: "", facets: &facets };
        assert_eq!(compute_view(&items, &query, &HashSet::new()), vec![0, 2, 4, 5]);

        let query = ViewQuery { needle: "alpha", facets: &facets };
        assert_eq!(compute_view(&items, &query, &HashSet::new()), vec![0, 2]);

        let query = ViewQuery { needle: "beta", facets: &facets };
        assert!(compute_view(&items, &query, &HashSet::new()).is_empty());
    }
}
