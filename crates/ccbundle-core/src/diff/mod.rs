//! Section diffs: a profile's selection expressed relative to base
//!
//! A profile never stores its selection directly. It stores, per section, the
//! keys it adds on top of base and the base keys it removes; the effective
//! selection is recomputed from the current base every time it is needed, so
//! later edits to base flow into every profile that does not override them.

pub mod persist;
pub mod store;

pub use persist::{diffs_to_profile, profile_to_section_diffs, KeyDiff, ProfileDefinition, ValueDiff};
pub use store::ProfileDiffStore;

use crate::section::Section;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Keys a profile adds to and removes from base, for one section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDiff {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub adds: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub removes: BTreeSet<String>,
}

/// Per-section diffs of one profile
pub type ProfileDiffs = BTreeMap<Section, SectionDiff>;

impl SectionDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.removes.is_empty()
    }

    /// The part of this diff whose keys start with `prefix`, prefix stripped
    #[must_use]
    pub fn strip_prefix(&self, prefix: &str) -> Self {
        let strip = |keys: &BTreeSet<String>| {
            keys.iter()
                .filter_map(|key| key.strip_prefix(prefix))
                .map(str::to_string)
                .collect()
        };
        Self {
            adds: strip(&self.adds),
            removes: strip(&self.removes),
        }
    }

    /// Prefix every key with `prefix`
    #[must_use]
    pub fn with_prefix(&self, prefix: &str) -> Self {
        let add = |keys: &BTreeSet<String>| keys.iter().map(|key| format!("{prefix}{key}")).collect();
        Self {
            adds: add(&self.adds),
            removes: add(&self.removes),
        }
    }

    /// Union of two diffs over disjoint key spaces
    #[must_use]
    pub fn union(mut self, other: Self) -> Self {
        self.adds.extend(other.adds);
        self.removes.extend(other.removes);
        self
    }
}

/// `adds = profile - base`, `removes = base - profile`
pub fn compute_diff<B, P, S, T>(base: B, profile: P) -> SectionDiff
where
    B: IntoIterator<Item = S>,
    P: IntoIterator<Item = T>,
    S: AsRef<str>,
    T: AsRef<str>,
{
    let base: BTreeSet<String> = base.into_iter().map(|k| k.as_ref().to_string()).collect();
    let profile: BTreeSet<String> = profile.into_iter().map(|k| k.as_ref().to_string()).collect();
    SectionDiff {
        adds: profile.difference(&base).cloned().collect(),
        removes: base.difference(&profile).cloned().collect(),
    }
}

/// `(base - removes) ∪ adds`
pub fn effective_keys<B, S>(diff: &SectionDiff, base: B) -> BTreeSet<String>
where
    B: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    base.into_iter()
        .map(|k| k.as_ref().to_string())
        .filter(|k| !diff.removes.contains(k))
        .chain(diff.adds.iter().cloned())
        .collect()
}
