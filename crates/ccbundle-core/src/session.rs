//! Wizard session: every picker, the diff store, and discovery in one context
//!
//! The session owns one picker per (tab, section). The base tab is the
//! reference selection; each profile tab shows base with the profile's
//! stored diff applied. Leaving a profile tab or section saves its diff;
//! entering one rebuilds it from the current base.

use crate::bundle::{BundleOptions, ExistingConfig, SectionSelection};
use crate::catalog::{Catalog, ValueTable};
use crate::config::{DiscoveryConfig, PickerConfig, WizardConfig};
use crate::diff::{diffs_to_profile, profile_to_section_diffs, ProfileDefinition, ProfileDiffStore, SectionDiff};
use crate::discovery::{DiscoveryCoordinator, ScanJob, ScanKind, ScanOutcome};
use crate::picker::{Direction, Facet, Picker, PickerAction};
use crate::secrets::SecretRedactor;
use crate::section::Section;
use ccbundle_scanner::discover::CrawlOptions;
use ccbundle_scanner::Inventory;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// Label of the action row in sections fed by discovery
pub const SEARCH_ACTION_LABEL: &str = "Search for more…";

type Pickers = BTreeMap<Section, Picker>;

/// A tab of the wizard
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tab {
    Base,
    Profile(String),
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => f.write_str("Base"),
            Self::Profile(name) => f.write_str(name),
        }
    }
}

/// State of one bundle-building session
#[derive(Debug)]
pub struct WizardSession {
    base: Pickers,
    profiles: BTreeMap<String, Pickers>,
    descriptions: BTreeMap<String, String>,
    store: ProfileDiffStore,
    values: ValueTable,
    coordinator: DiscoveryCoordinator,
    crawl: CrawlOptions,
    discovery: DiscoveryConfig,
    viewport: PickerConfig,
    active_tab: Tab,
    active_section: Section,
}

impl WizardSession {
    /// Build the base tab from `inventory`, seeded from `existing` in an edit session
    #[must_use]
    pub fn new(inventory: &Inventory, existing: Option<&ExistingConfig>, config: &WizardConfig) -> Self {
        let catalog = Catalog::new(inventory, existing.map(|e| &e.options));
        let selected_plugins = catalog.selected_plugins();

        let mut coordinator = DiscoveryCoordinator::new();
        if let Some(existing) = existing {
            coordinator = coordinator.with_seed(existing.options.clone());
        }

        let mut base = Pickers::new();
        for section in Section::ALL {
            let picker = new_picker(section, catalog.items(section, &selected_plugins), config.picker);
            coordinator.register_known(section, picker.all_keys());
            base.insert(section, picker);
        }

        let mut crawl = config.crawl_options(&inventory.host.home_dir);
        crawl.plugin_dirs = inventory
            .plugins
            .iter()
            .filter_map(|p| p.path.clone().map(|path| (p.key.clone(), path)))
            .collect();

        let mut session = Self {
            base,
            profiles: BTreeMap::new(),
            descriptions: BTreeMap::new(),
            store: ProfileDiffStore::new(),
            values: ValueTable::from_inventory(inventory),
            coordinator,
            crawl,
            discovery: config.discovery.clone(),
            viewport: config.picker,
            active_tab: Tab::Base,
            active_section: Section::Plugins,
        };

        if let Some(existing) = existing {
            for (name, definition) in &existing.profiles {
                session.load_profile(name, definition);
            }
        }
        session.refresh_focus();
        session
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn active_tab(&self) -> &Tab {
        &self.active_tab
    }

    pub fn active_section(&self) -> Section {
        self.active_section
    }

    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.store.names()
    }

    pub fn store(&self) -> &ProfileDiffStore {
        &self.store
    }

    pub fn values(&self) -> &ValueTable {
        &self.values
    }

    pub fn coordinator(&self) -> &DiscoveryCoordinator {
        &self.coordinator
    }

    /// Picker of `(tab, section)`
    pub fn picker(&self, tab: &Tab, section: Section) -> Option<&Picker> {
        match tab {
            Tab::Base => self.base.get(&section),
            Tab::Profile(name) => self.profiles.get(name)?.get(&section),
        }
    }

    /// Picker of the active tab and section
    pub fn active_picker(&self) -> Option<&Picker> {
        self.picker(&self.active_tab, self.active_section)
    }

    fn active_picker_mut(&mut self) -> Option<&mut Picker> {
        let section = self.active_section;
        match &self.active_tab {
            Tab::Base => self.base.get_mut(&section),
            Tab::Profile(name) => self.profiles.get_mut(name)?.get_mut(&section),
        }
    }

    /// Plugins selected in base
    pub fn selected_plugins(&self) -> BTreeSet<String> {
        self.base
            .get(&Section::Plugins)
            .map(Picker::selected_keys)
            .unwrap_or_default()
    }

    // ---------------------------------------------------------------------
    // Profiles and tabs
    // ---------------------------------------------------------------------

    /// Add a profile that starts identical to base
    pub fn create_profile(&mut self, name: &str) -> bool {
        if !self.store.create_profile(name) {
            debug!(profile = name, "Profile already exists");
            return false;
        }
        self.build_profile_pickers(name);
        true
    }

    fn load_profile(&mut self, name: &str, definition: &ProfileDefinition) {
        for (key, value) in &definition.settings.add {
            self.values
                .settings
                .entry(key.clone())
                .or_insert_with(|| value.clone().into());
        }
        for (key, config) in &definition.mcp.add {
            self.values.mcp.entry(key.clone()).or_insert_with(|| config.clone());
        }
        if let Some(description) = &definition.description {
            self.descriptions.insert(name.to_string(), description.clone());
        }
        self.store.set_diffs(name, profile_to_section_diffs(definition));
        self.build_profile_pickers(name);
    }

    fn build_profile_pickers(&mut self, name: &str) {
        let mut pickers = Pickers::new();
        for (&section, base) in &self.base {
            let mut picker = new_picker(section, base.items().to_vec(), self.viewport);
            self.store.rebuild_section(name, section, base, &mut picker);
            pickers.insert(section, picker);
        }
        apply_ownership(&mut pickers);
        for picker in pickers.values_mut() {
            picker.auto_collapse_read_only();
        }
        self.profiles.insert(name.to_string(), pickers);
    }

    /// Drop a profile; the session returns to base if it was active
    pub fn remove_profile(&mut self, name: &str) -> bool {
        if !self.store.remove_profile(name) {
            return false;
        }
        self.profiles.remove(name);
        self.descriptions.remove(name);
        if self.active_tab == Tab::Profile(name.to_string()) {
            self.active_tab = Tab::Base;
            self.refresh_focus();
        }
        true
    }

    pub fn set_profile_description(&mut self, name: &str, description: impl Into<String>) -> bool {
        if !self.store.contains(name) {
            return false;
        }
        self.descriptions.insert(name.to_string(), description.into());
        true
    }

    /// Switch tabs: save every section of the profile being left, rebuild the one entered
    pub fn focus_tab(&mut self, tab: Tab) -> bool {
        if let Tab::Profile(name) = &tab {
            if !self.store.contains(name) {
                debug!(profile = %name, "Ignoring focus on unknown profile");
                return false;
            }
        }
        if tab == self.active_tab {
            return true;
        }
        if let Tab::Profile(leaving) = self.active_tab.clone() {
            for section in Section::ALL {
                self.save_section(&leaving, section);
            }
        }
        if let Tab::Profile(entering) = &tab {
            self.rebuild_profile(entering);
        }
        self.active_tab = tab;
        self.refresh_focus();
        true
    }

    /// Switch sections within the active tab
    pub fn focus_section(&mut self, section: Section) {
        if section == self.active_section {
            return;
        }
        if let Tab::Profile(name) = self.active_tab.clone() {
            self.save_section(&name, self.active_section);
            self.rebuild_section(&name, section);
        }
        self.active_section = section;
        self.refresh_focus();
    }

    fn save_section(&mut self, profile: &str, section: Section) {
        let (Some(base), Some(target)) = (
            self.base.get(&section),
            self.profiles.get(profile).and_then(|p| p.get(&section)),
        ) else {
            return;
        };
        self.store.save_diff(profile, section, base, target);
    }

    fn rebuild_section(&mut self, profile: &str, section: Section) {
        let (Some(base), Some(pickers)) = (self.base.get(&section), self.profiles.get_mut(profile)) else {
            return;
        };
        if let Some(target) = pickers.get_mut(&section) {
            self.store.rebuild_section(profile, section, base, target);
        }
        if section.has_plugin_owned_items() {
            apply_ownership(pickers);
        }
    }

    fn rebuild_profile(&mut self, profile: &str) {
        let Some(pickers) = self.profiles.get_mut(profile) else {
            return;
        };
        for (section, target) in pickers.iter_mut() {
            if let Some(base) = self.base.get(section) {
                self.store.rebuild_section(profile, *section, base, target);
            }
        }
        apply_ownership(pickers);
    }

    fn refresh_focus(&mut self) {
        let active = (self.active_tab.clone(), self.active_section);
        let tabs = std::iter::once((Tab::Base, &mut self.base)).chain(
            self.profiles
                .iter_mut()
                .map(|(name, pickers)| (Tab::Profile(name.clone()), pickers)),
        );
        for (tab, pickers) in tabs {
            for (&section, picker) in pickers.iter_mut() {
                picker.set_focused(tab == active.0 && section == active.1);
            }
        }
    }

    /// Resize every picker
    pub fn set_viewport(&mut self, height: usize, width: usize) {
        self.viewport = PickerConfig {
            viewport_height: height,
            viewport_width: width,
        };
        for picker in self.base.values_mut().chain(self.profiles.values_mut().flat_map(|p| p.values_mut())) {
            picker.set_viewport(height, width);
        }
    }

    // ---------------------------------------------------------------------
    // Input on the active picker
    // ---------------------------------------------------------------------

    pub fn navigate(&mut self, direction: Direction) {
        if let Some(picker) = self.active_picker_mut() {
            picker.navigate(direction);
        }
    }

    pub fn toggle(&mut self) -> bool {
        let changed = self.active_picker_mut().is_some_and(Picker::toggle);
        if changed {
            self.after_selection_change();
        }
        changed
    }

    pub fn select_all(&mut self) -> usize {
        let changed = self.active_picker_mut().map_or(0, Picker::select_all);
        if changed > 0 {
            self.after_selection_change();
        }
        changed
    }

    pub fn select_none(&mut self) -> usize {
        let changed = self.active_picker_mut().map_or(0, Picker::select_none);
        if changed > 0 {
            self.after_selection_change();
        }
        changed
    }

    /// Activate the cursor row; the action row starts a discovery scan
    pub fn activate(&mut self) -> Option<PickerAction> {
        let action = self.active_picker_mut()?.activate()?;
        match action {
            PickerAction::Toggled => self.after_selection_change(),
            PickerAction::Scan => {
                if let Some(kind) = ScanKind::for_section(self.active_section) {
                    self.start_discovery(kind);
                }
            }
            PickerAction::CollapseToggled => {}
        }
        Some(action)
    }

    pub fn set_filter_text(&mut self, text: &str) {
        if let Some(picker) = self.active_picker_mut() {
            picker.set_filter_text(text);
        }
    }

    pub fn toggle_facet(&mut self, chip: Facet) {
        if let Some(picker) = self.active_picker_mut() {
            picker.toggle_facet(chip);
        }
    }

    pub fn toggle_collapse(&mut self, header_idx: usize) -> bool {
        self.active_picker_mut()
            .is_some_and(|picker| picker.toggle_collapse(header_idx))
    }

    fn after_selection_change(&mut self) {
        let section = self.active_section;
        match self.active_tab.clone() {
            Tab::Base => self.on_base_changed(section),
            Tab::Profile(name) => {
                if section == Section::Plugins {
                    if let Some(pickers) = self.profiles.get_mut(&name) {
                        apply_ownership(pickers);
                    }
                }
            }
        }
    }

    /// Propagate a base edit: ownership first, then every profile's copy
    fn on_base_changed(&mut self, section: Section) {
        let sections: Vec<Section> = if section == Section::Plugins {
            apply_ownership(&mut self.base);
            Section::ALL.to_vec()
        } else {
            vec![section]
        };
        let names: Vec<String> = self.profiles.keys().cloned().collect();
        for name in names {
            for &section in &sections {
                self.rebuild_section(&name, section);
            }
        }
    }

    // ---------------------------------------------------------------------
    // Discovery
    // ---------------------------------------------------------------------

    fn discovery_enabled(&self, kind: ScanKind) -> bool {
        match kind {
            ScanKind::ClaudeMd => self.discovery.claude_md,
            ScanKind::Mcp => self.discovery.mcp,
            ScanKind::CommandsSkills => self.discovery.commands_skills,
        }
    }

    /// Start the configured crawl for `kind`
    pub fn start_discovery(&mut self, kind: ScanKind) -> bool {
        if !self.discovery_enabled(kind) {
            debug!(?kind, "Discovery disabled by config");
            return false;
        }
        let options = self.crawl.clone();
        self.start_discovery_with(kind, Box::new(move || kind.run(&options)))
    }

    /// Start every enabled crawl
    pub fn start_all_discovery(&mut self) -> usize {
        ScanKind::ALL
            .into_iter()
            .filter(|&kind| self.start_discovery(kind))
            .count()
    }

    /// Start `job` as the scan for `kind` and mark its pickers as searching
    pub fn start_discovery_with(&mut self, kind: ScanKind, job: ScanJob) -> bool {
        if !self.coordinator.start(kind, job) {
            return false;
        }
        let section = kind.section();
        for pickers in std::iter::once(&mut self.base).chain(self.profiles.values_mut()) {
            if let Some(picker) = pickers.get_mut(&section) {
                picker.set_searching(true);
            }
        }
        true
    }

    /// Merge scans that have finished; returns how many new items arrived
    pub fn poll_discovery(&mut self) -> usize {
        let outcomes = self.coordinator.poll();
        outcomes.into_iter().map(|outcome| self.merge_outcome(outcome)).sum()
    }

    /// Block until every running scan has finished, then merge
    pub fn wait_for_discovery(&mut self) -> usize {
        let outcomes = self.coordinator.wait_all();
        outcomes.into_iter().map(|outcome| self.merge_outcome(outcome)).sum()
    }

    fn merge_outcome(&mut self, outcome: ScanOutcome) -> usize {
        let section = outcome.kind.section();
        let selected_plugins = self.selected_plugins();
        let Some(base) = self.base.get_mut(&section) else {
            return 0;
        };
        let store = &self.store;
        let mut targets: Vec<(SectionDiff, &mut Picker)> = self
            .profiles
            .iter_mut()
            .filter_map(|(name, pickers)| {
                let diff = store.get(name, section).unwrap_or_default();
                pickers.get_mut(&section).map(|picker| (diff, picker))
            })
            .collect();
        let accepted = self.coordinator.merge(outcome, &selected_plugins, base, &mut targets);
        for found in &accepted {
            self.values.absorb(found);
        }
        if !accepted.is_empty() && section.has_plugin_owned_items() {
            for pickers in self.profiles.values_mut() {
                apply_ownership(pickers);
            }
        }
        accepted.len()
    }

    // ---------------------------------------------------------------------
    // Output
    // ---------------------------------------------------------------------

    /// The base selection; plugin-owned rows travel with their plugin and are left out
    pub fn build_options(&self) -> BundleOptions {
        let mut options = BundleOptions::default();
        for (&section, picker) in &self.base {
            let candidates: BTreeSet<String> = picker
                .items()
                .iter()
                .filter(|item| item.is_selectable() && !item.read_only)
                .filter_map(|item| item.key.clone())
                .collect();
            let selected: BTreeSet<String> = picker
                .selected_keys()
                .into_iter()
                .filter(|key| candidates.contains(key))
                .collect();
            let selection = SectionSelection {
                complete: selected.len() == candidates.len(),
                selected,
            };
            options.set_section(section, &selection);
        }
        options
    }

    /// Every profile in its stored form; the active profile is saved first
    pub fn profile_definitions(&mut self, redactor: &dyn SecretRedactor) -> BTreeMap<String, ProfileDefinition> {
        if let Tab::Profile(name) = self.active_tab.clone() {
            for section in Section::ALL {
                self.save_section(&name, section);
            }
        }
        let mut definitions = BTreeMap::new();
        for name in self.store.names() {
            let Some(diffs) = self.store.diffs(name) else {
                continue;
            };
            let mut diffs = diffs.clone();
            for (section, diff) in &mut diffs {
                if let Some(base) = self.base.get(section) {
                    let owned = |key: &String| base.item_by_key(key).is_some_and(|item| item.owner.is_some());
                    diff.adds.retain(|key| !owned(key));
                    diff.removes.retain(|key| !owned(key));
                }
            }
            let mut definition = diffs_to_profile(&diffs, &self.values, redactor);
            definition.description = self.descriptions.get(name).cloned();
            definitions.insert(name.to_string(), definition);
        }
        definitions
    }
}

fn new_picker(section: Section, items: Vec<crate::item::Item>, viewport: PickerConfig) -> Picker {
    let mut picker = Picker::new(items).with_viewport(viewport.viewport_height, viewport.viewport_width);
    if ScanKind::for_section(section).is_some() {
        picker = picker.with_action(SEARCH_ACTION_LABEL);
    }
    picker.auto_collapse_read_only();
    picker
}

/// Lock rows owned by selected plugins and release rows of the others
fn apply_ownership(pickers: &mut Pickers) {
    let Some(plugins) = pickers.get(&Section::Plugins) else {
        return;
    };
    let selected = plugins.selected_keys();
    let all = plugins.all_keys();
    for (_, picker) in pickers.iter_mut().filter(|(s, _)| s.has_plugin_owned_items()) {
        for plugin in &all {
            if selected.contains(plugin) {
                picker.lock_owned_by(plugin);
            } else if picker
                .items()
                .iter()
                .any(|item| item.read_only && item.owner.as_deref() == Some(plugin.as_str()))
            {
                picker.release_owned_by(plugin, true);
            }
        }
    }
}
