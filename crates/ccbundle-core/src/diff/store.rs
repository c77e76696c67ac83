//! Per-profile, per-section diff storage with the save/rebuild lifecycle

use super::{compute_diff, effective_keys, ProfileDiffs, SectionDiff};
use crate::picker::Picker;
use crate::section::Section;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Stored diffs for every named profile
#[derive(Debug, Clone, Default)]
pub struct ProfileDiffStore {
    profiles: BTreeMap<String, ProfileDiffs>,
}

impl ProfileDiffStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a profile with no overrides; returns false if it already exists
    pub fn create_profile(&mut self, name: &str) -> bool {
        if self.profiles.contains_key(name) {
            return false;
        }
        self.profiles.insert(name.to_string(), ProfileDiffs::new());
        true
    }

    pub fn remove_profile(&mut self, name: &str) -> bool {
        self.profiles.remove(name).is_some()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    #[must_use]
    pub fn diffs(&self, profile: &str) -> Option<&ProfileDiffs> {
        self.profiles.get(profile)
    }

    /// Stored diff for one section; an existing profile with no entry has an empty diff
    #[must_use]
    pub fn get(&self, profile: &str, section: Section) -> Option<SectionDiff> {
        self.profiles
            .get(profile)
            .map(|diffs| diffs.get(&section).cloned().unwrap_or_default())
    }

    /// Replace all diffs of a profile, creating it if needed
    pub fn set_diffs(&mut self, profile: &str, diffs: ProfileDiffs) {
        let diffs = diffs.into_iter().filter(|(_, diff)| !diff.is_empty()).collect();
        self.profiles.insert(profile.to_string(), diffs);
    }

    /// Store `diff` for `(profile, section)`; no-op for an unknown profile
    pub fn put(&mut self, profile: &str, section: Section, diff: SectionDiff) -> bool {
        let Some(diffs) = self.profiles.get_mut(profile) else {
            debug!(profile, %section, "Ignoring diff for unknown profile");
            return false;
        };
        if diff.is_empty() {
            diffs.remove(&section);
        } else {
            diffs.insert(section, diff);
        }
        true
    }

    /// Snapshot the profile picker's selection as a diff against base
    ///
    /// Only keys with a row in `target` are recomputed; stored adds and
    /// removes of keys the picker does not show are kept.
    pub fn save_diff(&mut self, profile: &str, section: Section, base: &Picker, target: &Picker) -> bool {
        let rows = target.all_keys();
        let mut diff = compute_diff(&base.selected_keys(), &target.selected_keys());
        if let Some(stored) = self.get(profile, section) {
            diff.adds.extend(stored.adds.into_iter().filter(|key| !rows.contains(key)));
            diff.removes.extend(stored.removes.into_iter().filter(|key| !rows.contains(key)));
        }
        self.put(profile, section, diff)
    }

    /// Effective selection of `(profile, section)` against `base_keys`
    #[must_use]
    pub fn effective(&self, profile: &str, section: Section, base_keys: &BTreeSet<String>) -> Option<BTreeSet<String>> {
        self.get(profile, section).map(|diff| effective_keys(&diff, base_keys))
    }

    /// Regenerate a profile picker from the current base picker
    ///
    /// The base rows are copied, rows selected in base are flagged as
    /// inherited, and selection is set to the stored diff applied to the
    /// current base selection. The target keeps its filter, facets, and
    /// viewport. Unknown profiles leave the target untouched.
    pub fn rebuild_section(&self, profile: &str, section: Section, base: &Picker, target: &mut Picker) -> bool {
        let Some(diff) = self.get(profile, section) else {
            debug!(profile, %section, "Ignoring rebuild for unknown profile");
            return false;
        };
        let base_keys = base.selected_keys();
        let selected = effective_keys(&diff, &base_keys);

        target.replace_items(base.items().to_vec());
        target.mark_base_inherited(&base_keys);
        target.set_selection(&selected);
        true
    }
}
