//! Background discovery scans and their merge into live pickers
//!
//! Each scan runs on its own thread and reports back exactly once over a
//! channel. The owning loop polls for finished scans and merges them into
//! the base picker and every profile picker of the scan's section.

use crate::bundle::BundleOptions;
use crate::diff::SectionDiff;
use crate::item::Item;
use crate::picker::Picker;
use crate::section::Section;
use ccbundle_scanner::discover::{self, CrawlOptions, DiscoveredItem, DiscoveredValue, Provenance};
use ccbundle_scanner::ScanResult;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use tracing::{debug, info, warn};

/// The three background crawls
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScanKind {
    ClaudeMd,
    Mcp,
    CommandsSkills,
}

impl ScanKind {
    pub const ALL: [ScanKind; 3] = [ScanKind::ClaudeMd, ScanKind::Mcp, ScanKind::CommandsSkills];

    /// Section whose pickers receive this scan's results
    #[must_use]
    pub fn section(self) -> Section {
        match self {
            Self::ClaudeMd => Section::ClaudeMd,
            Self::Mcp => Section::McpServers,
            Self::CommandsSkills => Section::CommandsSkills,
        }
    }

    /// The scan feeding `section`, if any
    #[must_use]
    pub fn for_section(section: Section) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.section() == section)
    }

    /// Run the crawl synchronously
    pub fn run(self, options: &CrawlOptions) -> ScanResult<Vec<DiscoveredItem>> {
        match self {
            Self::ClaudeMd => discover::crawl_claude_md(options),
            Self::Mcp => discover::crawl_mcp_configs(options),
            Self::CommandsSkills => discover::crawl_commands_skills(options),
        }
    }
}

/// A scan to run in the background
pub type ScanJob = Box<dyn FnOnce() -> ScanResult<Vec<DiscoveredItem>> + Send + 'static>;

/// The single result of a finished scan; failures arrive as an empty list
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub kind: ScanKind,
    pub items: Vec<DiscoveredItem>,
}

/// Launches scans and merges their results exactly once
#[derive(Debug, Default)]
pub struct DiscoveryCoordinator {
    pending: BTreeMap<ScanKind, Receiver<ScanResult<Vec<DiscoveredItem>>>>,
    known: HashMap<Section, HashSet<String>>,
    discovered: HashMap<Section, BTreeMap<String, Provenance>>,
    seed: Option<BundleOptions>,
}

impl DiscoveryCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Edit session: new finds are selected only when `previous` names them
    #[must_use]
    pub fn with_seed(mut self, previous: BundleOptions) -> Self {
        self.seed = Some(previous);
        self
    }

    /// Record the inventory keys of `section`; discoveries with these keys are skipped
    pub fn register_known(&mut self, section: Section, keys: impl IntoIterator<Item = String>) {
        self.known.entry(section).or_default().extend(keys);
    }

    /// Start `job` unless a scan of `kind` is already running
    pub fn start(&mut self, kind: ScanKind, job: ScanJob) -> bool {
        if self.pending.contains_key(&kind) {
            debug!(?kind, "Scan already running");
            return false;
        }
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(job());
        });
        self.pending.insert(kind, rx);
        debug!(?kind, "Scan started");
        true
    }

    #[must_use]
    pub fn is_scanning(&self, kind: ScanKind) -> bool {
        self.pending.contains_key(&kind)
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Collect every scan that has finished since the last poll
    pub fn poll(&mut self) -> Vec<ScanOutcome> {
        let mut finished = Vec::new();
        for (&kind, rx) in &self.pending {
            match rx.try_recv() {
                Ok(result) => finished.push(outcome(kind, Some(result))),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => finished.push(outcome(kind, None)),
            }
        }
        for done in &finished {
            self.pending.remove(&done.kind);
        }
        finished
    }

    /// Block until every running scan has reported
    pub fn wait_all(&mut self) -> Vec<ScanOutcome> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .map(|(kind, rx)| outcome(kind, rx.recv().ok()))
            .collect()
    }

    /// Provenance of a discovered key
    #[must_use]
    pub fn provenance(&self, section: Section, key: &str) -> Option<&Provenance> {
        self.discovered.get(&section)?.get(key)
    }

    /// Keys discovered so far in `section`
    pub fn discovered_keys(&self, section: Section) -> impl Iterator<Item = &str> {
        self.discovered
            .get(&section)
            .into_iter()
            .flat_map(|keys| keys.keys().map(String::as_str))
    }

    /// Merge a finished scan into the base picker and every profile picker
    ///
    /// Keys already in the inventory or already discovered are skipped. New
    /// rows are grouped under a header per discovery source. A row owned by a
    /// plugin in `selected_plugins` is locked on. Each profile picker comes
    /// with that profile's stored diff for the section: its copies mark rows
    /// selected in base as inherited and then apply the diff, so a stored
    /// add or remove of a newly found key keeps its effect. Returns the
    /// accepted items.
    pub fn merge(
        &mut self,
        outcome: ScanOutcome,
        selected_plugins: &BTreeSet<String>,
        base: &mut Picker,
        profiles: &mut [(SectionDiff, &mut Picker)],
    ) -> Vec<DiscoveredItem> {
        let section = outcome.kind.section();
        base.set_searching(false);
        for (_, picker) in profiles.iter_mut() {
            picker.set_searching(false);
        }

        let known = self.known.entry(section).or_default();
        let discovered = self.discovered.entry(section).or_default();
        let mut accepted = Vec::new();
        for found in outcome.items {
            if known.contains(&found.key) || discovered.contains_key(&found.key) {
                continue;
            }
            discovered.insert(found.key.clone(), found.provenance.clone());
            accepted.push(found);
        }
        if accepted.is_empty() {
            debug!(%section, "Scan found nothing new");
            return accepted;
        }

        let mut groups: Vec<(String, Vec<Item>)> = Vec::new();
        for found in &accepted {
            let item = self.discovered_row(section, found, selected_plugins);
            match groups.iter_mut().find(|(source, _)| *source == found.provenance.source) {
                Some((_, items)) => items.push(item),
                None => groups.push((found.provenance.source.clone(), vec![item])),
            }
        }
        let rows: Vec<Item> = groups
            .into_iter()
            .flat_map(|(source, items)| std::iter::once(Item::header(source)).chain(items))
            .collect();

        let added = base.add_items(rows.clone());
        for (diff, picker) in profiles.iter_mut() {
            let copies = rows.iter().cloned().map(|item| profile_copy(item, diff)).collect();
            picker.add_items(copies);
        }
        info!(%section, added, "Merged discovered items");
        accepted
    }

    fn discovered_row(&self, section: Section, found: &DiscoveredItem, selected_plugins: &BTreeSet<String>) -> Item {
        let item = match &found.value {
            DiscoveredValue::ClaudeMd { .. } => Item::new(&found.key, &found.key),
            DiscoveredValue::McpServer(server) => {
                Item::new(&found.key, &server.name).with_tag(server.transport.as_str())
            }
            DiscoveredValue::Command(command) => {
                let item = Item::new(&found.key, format!("/{}", command.name));
                match command.description.as_deref().filter(|d| !d.is_empty()) {
                    Some(description) => item.with_tag(description),
                    None => item,
                }
            }
            DiscoveredValue::Skill(skill) => {
                Item::new(&found.key, &skill.name).with_tag(&skill.description)
            }
        };
        let item = item.with_provider_tag(&found.provenance.source);
        match &found.provenance.owner_plugin {
            Some(owner) => item.owned_by(owner, selected_plugins.contains(owner)),
            None => {
                let selected = match &self.seed {
                    Some(previous) => previous.explicitly_lists(section, &found.key),
                    None => true,
                };
                item.selected(selected)
            }
        }
    }
}

/// A discovered row as one profile sees it
fn profile_copy(mut item: Item, diff: &SectionDiff) -> Item {
    if !item.is_selectable() {
        return item;
    }
    item.base_inherited = item.selected;
    if item.owner.is_none() {
        if let Some(key) = item.key.as_deref() {
            item.selected = (item.selected && !diff.removes.contains(key)) || diff.adds.contains(key);
        }
    }
    item
}

fn outcome(kind: ScanKind, result: Option<ScanResult<Vec<DiscoveredItem>>>) -> ScanOutcome {
    let items = match result {
        Some(Ok(items)) => items,
        Some(Err(e)) => {
            warn!(?kind, "Scan failed, treating as empty: {e}");
            Vec::new()
        }
        None => {
            warn!(?kind, "Scan ended without a result");
            Vec::new()
        }
    };
    ScanOutcome { kind, items }
}
