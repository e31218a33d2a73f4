use crate::catalog::{self, ResourceSeed};
use chrono::{DateTime, Local};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Workflow {
    Role,
    Kubeconfig,
}

impl Workflow {
    pub const ALL: [Self; 2] = [Self::Role, Self::Kubeconfig];

    pub fn title(self) -> &'static str {
        match self {
            Self::Role => "Role Generator",
            Self::Kubeconfig => "Kubeconfig Generator",
        }
    }

    pub fn blurb(self) -> &'static str {
        match self {
            Self::Role => "Create Kubernetes RBAC roles with fine-grained permissions",
            Self::Kubeconfig => {
                "Generate kubeconfig files for service accounts with specific permissions"
            }
        }
    }

    pub fn artifact_label(self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::Kubeconfig => "kubeconfig",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "role" | "roles" | "rbac" => Some(Self::Role),
            "kubeconfig" | "kc" | "config" => Some(Self::Kubeconfig),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Role => 0,
            Self::Kubeconfig => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Role => Self::Kubeconfig,
            Self::Kubeconfig => Self::Role,
        }
    }
}

impl Display for Workflow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.artifact_label())
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResourceEntry {
    pub name: &'static str,
    pub api_group: &'static str,
    pub supported_verbs: &'static [&'static str],
    pub selected: bool,
    /// Always a subset of `supported_verbs`, kept in the same order.
    pub selected_verbs: Vec<&'static str>,
    pub expanded: bool,
}

impl ResourceEntry {
    fn from_seed(seed: &ResourceSeed) -> Self {
        Self {
            name: seed.name,
            api_group: seed.api_group,
            supported_verbs: seed.verbs,
            selected: false,
            selected_verbs: Vec::new(),
            expanded: false,
        }
    }

    pub fn has_verb(&self, verb: &str) -> bool {
        self.selected_verbs.iter().any(|selected| *selected == verb)
    }

    pub fn all_verbs_selected(&self) -> bool {
        self.supported_verbs.iter().all(|verb| self.has_verb(verb))
    }
}

/// Per-session resource and verb selection for one workflow.
///
/// Every operation is total: indices past the end and verbs the entry does
/// not support leave the state untouched.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SelectionState {
    entries: Vec<ResourceEntry>,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::from_catalog(catalog::catalog())
    }
}

impl SelectionState {
    pub fn from_catalog(seeds: &[ResourceSeed]) -> Self {
        Self {
            entries: seeds.iter().map(ResourceEntry::from_seed).collect(),
        }
    }

    pub fn entries(&self) -> &[ResourceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn toggle_expand(&mut self, index: usize) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.expanded = !entry.expanded;
        }
    }

    pub fn toggle_resource_selected(&mut self, index: usize) {
        if let Some(entry) = self.entries.get_mut(index) {
            if !entry.selected {
                entry.selected_verbs.clear();
            }
            entry.selected = !entry.selected;
        }
    }

    pub fn toggle_verb(&mut self, index: usize, verb: &str) {
        let Some(entry) = self.entries.get_mut(index) else {
            return;
        };
        if !entry.supported_verbs.iter().any(|supported| *supported == verb) {
            return;
        }

        let enabled = !entry.has_verb(verb);
        let current = std::mem::take(&mut entry.selected_verbs);
        entry.selected_verbs = entry
            .supported_verbs
            .iter()
            .copied()
            .filter(|candidate| {
                if *candidate == verb {
                    enabled
                } else {
                    current.contains(candidate)
                }
            })
            .collect();
    }

    pub fn select_all(&mut self, selected: bool) {
        for entry in &mut self.entries {
            entry.selected = selected;
            entry.selected_verbs = if selected {
                entry.supported_verbs.to_vec()
            } else {
                Vec::new()
            };
        }
    }

    pub fn select_all_verbs(&mut self, index: usize, selected: bool) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.selected_verbs = if selected {
                entry.supported_verbs.to_vec()
            } else {
                Vec::new()
            };
        }
    }

    pub fn all_selected(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|entry| entry.selected)
    }

    pub fn any_selected(&self) -> bool {
        self.entries.iter().any(|entry| entry.selected)
    }

    pub fn all_verbs_selected(&self, index: usize) -> bool {
        self.entries
            .get(index)
            .is_some_and(ResourceEntry::all_verbs_selected)
    }

    pub fn selected_entries(&self) -> impl Iterator<Item = &ResourceEntry> {
        self.entries.iter().filter(|entry| entry.selected)
    }

    pub fn selected_count(&self) -> usize {
        self.selected_entries().count()
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum NamespacePhase {
    Loading,
    Loaded(Vec<String>),
    Failed(String),
}

impl NamespacePhase {
    pub fn namespaces(&self) -> &[String] {
        match self {
            Self::Loaded(namespaces) => namespaces,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GeneratedFile {
    /// Account name the request was issued for, not whatever the form holds now.
    pub account: String,
    pub content: String,
    pub received_at: DateTime<Local>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SubmissionState {
    Idle,
    /// Rejected by the form checks; nothing was sent.
    Invalid(String),
    Pending { ticket: u64 },
    Success(GeneratedFile),
    Failure(String),
}

impl SubmissionState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    pub fn generated(&self) -> Option<&GeneratedFile> {
        match self {
            Self::Success(file) => Some(file),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Invalid(message) | Self::Failure(message) => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NamespacePhase, SelectionState, SubmissionState, Workflow};

    fn pods_index(state: &SelectionState) -> usize {
        state
            .entries()
            .iter()
            .position(|entry| entry.name == "pods")
            .unwrap()
    }

    #[test]
    fn select_all_round_trip_clears_everything() {
        let mut state = SelectionState::default();
        state.toggle_expand(2);
        state.select_all(true);
        assert!(state.all_selected());
        assert!(state.entries().iter().all(|entry| entry.all_verbs_selected()));

        state.select_all(false);
        assert!(
            state
                .entries()
                .iter()
                .all(|entry| !entry.selected && entry.selected_verbs.is_empty())
        );
        assert!(state.entries()[2].expanded);
    }

    #[test]
    fn select_all_is_idempotent() {
        let mut once = SelectionState::default();
        once.select_all(true);
        let mut twice = once.clone();
        twice.select_all(true);
        assert_eq!(once, twice);
    }

    #[test]
    fn selecting_resource_resets_verbs() {
        let mut state = SelectionState::default();
        state.select_all_verbs(0, true);
        assert!(!state.entries()[0].selected);
        assert_eq!(state.entries()[0].selected_verbs.len(), 7);

        state.toggle_resource_selected(0);
        assert!(state.entries()[0].selected);
        assert!(state.entries()[0].selected_verbs.is_empty());

        state.toggle_verb(0, "get");
        state.toggle_resource_selected(0);
        assert!(!state.entries()[0].selected);
        assert_eq!(state.entries()[0].selected_verbs, vec!["get"]);

        state.toggle_resource_selected(0);
        assert!(state.entries()[0].selected_verbs.is_empty());
    }

    #[test]
    fn select_all_verbs_touches_only_one_entry() {
        let mut state = SelectionState::default();
        state.toggle_resource_selected(3);
        state.toggle_verb(3, "watch");
        let before = state.clone();

        state.select_all_verbs(1, true);
        state.select_all_verbs(1, false);
        assert!(state.entries()[1].selected_verbs.is_empty());
        for (index, entry) in state.entries().iter().enumerate() {
            if index != 1 {
                assert_eq!(entry, &before.entries()[index]);
            }
        }
    }

    #[test]
    fn toggle_verb_keeps_catalog_order_and_ignores_unknown() {
        let mut state = SelectionState::default();
        let pods = pods_index(&state);
        state.toggle_verb(pods, "list");
        state.toggle_verb(pods, "get");
        state.toggle_verb(pods, "escalate");
        assert_eq!(state.entries()[pods].selected_verbs, vec!["get", "list"]);
        assert!(!state.entries()[pods].selected);

        state.toggle_verb(pods, "get");
        assert_eq!(state.entries()[pods].selected_verbs, vec!["list"]);
    }

    #[test]
    fn out_of_range_operations_are_noops() {
        let mut state = SelectionState::default();
        let before = state.clone();
        let past_end = state.len() + 4;
        state.toggle_expand(past_end);
        state.toggle_resource_selected(past_end);
        state.toggle_verb(past_end, "get");
        state.select_all_verbs(past_end, true);
        assert_eq!(state, before);
        assert!(!state.all_verbs_selected(past_end));
    }

    #[test]
    fn expand_does_not_touch_selection() {
        let mut state = SelectionState::default();
        state.toggle_expand(0);
        assert!(state.entries()[0].expanded);
        assert!(!state.entries()[0].selected);
        state.toggle_expand(0);
        assert!(!state.entries()[0].expanded);
    }

    #[test]
    fn workflow_tokens_and_phase_accessors() {
        assert_eq!(Workflow::from_token("Role"), Some(Workflow::Role));
        assert_eq!(Workflow::from_token("kc"), Some(Workflow::Kubeconfig));
        assert_eq!(Workflow::from_token("pods"), None);
        assert_eq!(Workflow::Role.other(), Workflow::Kubeconfig);

        assert!(NamespacePhase::Loading.namespaces().is_empty());
        assert_eq!(
            NamespacePhase::Loaded(vec!["default".to_string()]).namespaces(),
            ["default".to_string()]
        );
        assert!(SubmissionState::Pending { ticket: 1 }.is_pending());
        assert_eq!(
            SubmissionState::Failure("boom".to_string()).error(),
            Some("boom")
        );
    }
}
