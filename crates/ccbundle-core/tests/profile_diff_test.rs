//! Profile diffs across base edits

use ccbundle_core::item::Item;
use ccbundle_core::picker::Picker;
use ccbundle_core::{ProfileDiffStore, Section, SectionDiff};
use std::collections::BTreeSet;

fn keys(keys: &[&str]) -> BTreeSet<String> {
    keys.iter().map(|k| (*k).to_string()).collect()
}

fn picker(all: &[&str], selected: &[&str]) -> Picker {
    Picker::new(
        all.iter()
            .map(|k| Item::new(*k, *k).selected(selected.contains(k)))
            .collect(),
    )
}

#[test]
fn test_diff_survives_base_mutation() {
    let mut store = ProfileDiffStore::new();
    store.create_profile("p");

    let mut base = picker(&["a", "b", "c"], &["a", "b"]);
    let mut profile = picker(&["a", "b", "c"], &["b"]);
    assert!(store.save_diff("p", Section::Settings, &base, &profile));
    assert_eq!(
        store.get("p", Section::Settings),
        Some(SectionDiff {
            adds: BTreeSet::new(),
            removes: keys(&["a"]),
        })
    );

    base.set_selection(&keys(&["a"]));
    assert!(store.rebuild_section("p", Section::Settings, &base, &mut profile));
    assert!(profile.selected_keys().is_empty());

    base.set_selection(&keys(&["a", "c"]));
    store.rebuild_section("p", Section::Settings, &base, &mut profile);
    assert_eq!(profile.selected_keys(), keys(&["c"]));
    let inherited: Vec<&str> = profile
        .items()
        .iter()
        .filter(|i| i.base_inherited)
        .filter_map(|i| i.key.as_deref())
        .collect();
    assert_eq!(inherited, vec!["a", "c"]);
}

#[test]
fn test_adds_stay_selected_when_base_catches_up() {
    let mut store = ProfileDiffStore::new();
    store.create_profile("p");

    let mut base = picker(&["a", "b"], &[]);
    let mut profile = picker(&["a", "b"], &["b"]);
    store.save_diff("p", Section::Hooks, &base, &profile);

    base.set_selection(&keys(&["b"]));
    store.rebuild_section("p", Section::Hooks, &base, &mut profile);
    assert_eq!(profile.selected_keys(), keys(&["b"]));

    // saving again drops the now-redundant add
    store.save_diff("p", Section::Hooks, &base, &profile);
    assert_eq!(store.get("p", Section::Hooks), Some(SectionDiff::default()));
    assert!(store.diffs("p").is_some_and(|d| d.is_empty()));
}

#[test]
fn test_rebuild_keeps_filter_state() {
    let mut store = ProfileDiffStore::new();
    store.create_profile("p");
    let base = picker(&["alpha", "beta"], &["alpha"]);
    let mut profile = picker(&["alpha", "beta"], &["alpha"]);
    profile.set_filter_text("bet");

    store.rebuild_section("p", Section::Settings, &base, &mut profile);
    assert_eq!(profile.filter_text(), "bet");
    assert_eq!(profile.visible_rows(), vec![1]);
}

#[test]
fn test_unknown_profile_is_ignored() {
    let mut store = ProfileDiffStore::new();
    let base = picker(&["a"], &["a"]);
    let mut target = picker(&["z"], &[]);

    assert!(!store.save_diff("ghost", Section::Plugins, &base, &target));
    assert!(!store.rebuild_section("ghost", Section::Plugins, &base, &mut target));
    assert_eq!(target.all_keys(), keys(&["z"]));
    assert_eq!(store.get("ghost", Section::Plugins), None);
    assert_eq!(store.effective("ghost", Section::Plugins, &keys(&["a"])), None);
}

#[test]
fn test_profiles_are_independent() {
    let mut store = ProfileDiffStore::new();
    store.create_profile("one");
    store.create_profile("two");

    let base = picker(&["a", "b"], &["a"]);
    store.save_diff("one", Section::Plugins, &base, &picker(&["a", "b"], &["a", "b"]));
    store.save_diff("two", Section::Plugins, &base, &picker(&["a", "b"], &[]));

    let base_keys = keys(&["a"]);
    assert_eq!(store.effective("one", Section::Plugins, &base_keys), Some(keys(&["a", "b"])));
    assert_eq!(store.effective("two", Section::Plugins, &base_keys), Some(BTreeSet::new()));

    assert!(store.remove_profile("one"));
    assert_eq!(store.names().collect::<Vec<_>>(), vec!["two"]);
}
