use crate::api::ApiError;
use crate::input::Action;
use crate::model::{GeneratedFile, NamespacePhase, SelectionState, SubmissionState, Workflow};
use crate::submit::{Artifact, Submission};
use chrono::Local;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InputMode {
    Normal,
    EditName,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Screen {
    Selector,
    Workflow(Workflow),
}

/// One navigable line of a workflow form.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FormRow {
    Name,
    Namespace,
    SelectAll,
    Resource(usize),
    Verbs(usize),
    Generate,
    Save,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    None,
    Generate {
        ticket: u64,
        submission: Submission,
    },
    SaveArtifact {
        workflow: Workflow,
        artifact: Artifact,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    Namespaces(Result<Vec<String>, ApiError>),
    Generated {
        workflow: Workflow,
        ticket: u64,
        account: String,
        result: Result<String, ApiError>,
    },
}

#[derive(Debug, Clone)]
pub struct WorkflowForm {
    name: String,
    namespace: String,
    selection: SelectionState,
    cursor: usize,
    verb_cursor: usize,
    submission: SubmissionState,
    saved_to: Option<PathBuf>,
    preview_scroll: u16,
}

impl WorkflowForm {
    fn new(namespace: &str) -> Self {
        Self {
            name: String::new(),
            namespace: namespace.to_string(),
            selection: SelectionState::default(),
            cursor: 0,
            verb_cursor: 0,
            submission: SubmissionState::Idle,
            saved_to: None,
            preview_scroll: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn submission(&self) -> &SubmissionState {
        &self.submission
    }

    pub fn saved_to(&self) -> Option<&PathBuf> {
        self.saved_to.as_ref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn verb_cursor(&self) -> usize {
        self.verb_cursor
    }

    pub fn preview_scroll(&self) -> u16 {
        self.preview_scroll
    }

    pub fn rows(&self) -> Vec<FormRow> {
        let mut rows = vec![FormRow::Name, FormRow::Namespace, FormRow::SelectAll];
        for (index, entry) in self.selection.entries().iter().enumerate() {
            rows.push(FormRow::Resource(index));
            if entry.expanded {
                rows.push(FormRow::Verbs(index));
            }
        }
        rows.push(FormRow::Generate);
        if self.submission.generated().is_some() {
            rows.push(FormRow::Save);
        }
        rows
    }

    pub fn current_row(&self) -> FormRow {
        let rows = self.rows();
        rows.get(self.cursor)
            .copied()
            .unwrap_or_else(|| rows.last().copied().unwrap_or(FormRow::Name))
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.rows().len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, len as isize - 1) as usize;
        self.verb_cursor = 0;
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.rows().len().saturating_sub(1));
    }

    fn focus_row(&mut self, row: FormRow) {
        if let Some(position) = self.rows().iter().position(|candidate| *candidate == row) {
            self.cursor = position;
        }
    }

    fn resource_under_cursor(&self) -> Option<usize> {
        match self.current_row() {
            FormRow::Resource(index) | FormRow::Verbs(index) => Some(index),
            _ => None,
        }
    }

    fn clear_outcome(&mut self) {
        self.submission = SubmissionState::Idle;
        self.saved_to = None;
        self.preview_scroll = 0;
        self.clamp_cursor();
    }
}

pub struct App {
    running: bool,
    mode: InputMode,
    screen: Screen,
    selector_index: usize,
    forms: HashMap<Workflow, WorkflowForm>,
    namespaces: NamespacePhase,
    status: String,
    show_help: bool,
    api_base_url: String,
    output_dir: PathBuf,
    next_ticket: u64,
}

impl App {
    pub fn new(
        api_base_url: String,
        namespace: &str,
        output_dir: PathBuf,
        workflow: Option<Workflow>,
    ) -> Self {
        let forms = Workflow::ALL
            .iter()
            .copied()
            .map(|workflow| (workflow, WorkflowForm::new(namespace)))
            .collect::<HashMap<_, _>>();

        Self {
            running: true,
            mode: InputMode::Normal,
            screen: workflow.map_or(Screen::Selector, Screen::Workflow),
            selector_index: workflow.map_or(0, Workflow::index),
            forms,
            namespaces: NamespacePhase::Loading,
            status: "Ready".to_string(),
            show_help: false,
            api_base_url,
            output_dir,
            next_ticket: 1,
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn selector_index(&self) -> usize {
        self.selector_index
    }

    pub fn namespaces(&self) -> &NamespacePhase {
        &self.namespaces
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    pub fn active_workflow(&self) -> Option<Workflow> {
        match self.screen {
            Screen::Selector => None,
            Screen::Workflow(workflow) => Some(workflow),
        }
    }

    pub fn form(&self, workflow: Workflow) -> &WorkflowForm {
        &self.forms[&workflow]
    }

    fn form_mut(&mut self, workflow: Workflow) -> &mut WorkflowForm {
        self.forms
            .entry(workflow)
            .or_insert_with(|| WorkflowForm::new("default"))
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn apply_action(&mut self, action: Action) -> AppCommand {
        if self.show_help && !matches!(action, Action::ToggleHelp) {
            self.show_help = false;
            if matches!(action, Action::Back) {
                return AppCommand::None;
            }
        }

        if matches!(action, Action::Quit) {
            self.running = false;
            self.status = "Exit requested".to_string();
            return AppCommand::None;
        }
        if matches!(action, Action::ToggleHelp) {
            self.show_help = !self.show_help;
            return AppCommand::None;
        }

        match self.screen {
            Screen::Selector => self.apply_selector_action(action),
            Screen::Workflow(workflow) => match self.mode {
                InputMode::EditName => self.apply_edit_action(workflow, action),
                InputMode::Normal => self.apply_form_action(workflow, action),
            },
        }
    }

    fn apply_selector_action(&mut self, action: Action) -> AppCommand {
        match action {
            Action::Up | Action::Left | Action::PrevWorkflow => {
                self.selector_index = self.selector_index.saturating_sub(1);
            }
            Action::Down | Action::Right | Action::NextWorkflow => {
                self.selector_index = (self.selector_index + 1).min(Workflow::ALL.len() - 1);
            }
            Action::Activate | Action::Toggle => {
                self.open_workflow(Workflow::ALL[self.selector_index]);
            }
            Action::ChooseWorkflow(number) => {
                if let Some(workflow) = Workflow::ALL.get(usize::from(number).saturating_sub(1)) {
                    self.open_workflow(*workflow);
                }
            }
            _ => {}
        }
        AppCommand::None
    }

    fn open_workflow(&mut self, workflow: Workflow) {
        self.screen = Screen::Workflow(workflow);
        self.selector_index = workflow.index();
        self.mode = InputMode::Normal;
        self.status = format!("{} ready", workflow.title());
        debug!("opened workflow {workflow}");
    }

    fn apply_edit_action(&mut self, workflow: Workflow, action: Action) -> AppCommand {
        match action {
            Action::InputChar(c) => self.form_mut(workflow).name.push(c),
            Action::Backspace => {
                self.form_mut(workflow).name.pop();
            }
            Action::SubmitInput | Action::CancelInput => {
                self.mode = InputMode::Normal;
                let name = self.form(workflow).name.trim().to_string();
                self.status = if name.is_empty() {
                    "Name cleared".to_string()
                } else {
                    format!("ServiceAccount name set to '{name}'")
                };
            }
            _ => {}
        }
        AppCommand::None
    }

    fn apply_form_action(&mut self, workflow: Workflow, action: Action) -> AppCommand {
        match action {
            Action::Up => self.form_mut(workflow).move_cursor(-1),
            Action::Down => self.form_mut(workflow).move_cursor(1),
            Action::Top => {
                let form = self.form_mut(workflow);
                form.cursor = 0;
                form.verb_cursor = 0;
            }
            Action::Bottom => {
                let form = self.form_mut(workflow);
                form.cursor = form.rows().len().saturating_sub(1);
                form.verb_cursor = 0;
            }
            Action::Left => self.shift_horizontal(workflow, -1),
            Action::Right => self.shift_horizontal(workflow, 1),
            Action::Toggle => return self.toggle_current(workflow),
            Action::Activate => return self.activate_current(workflow),
            Action::ToggleExpand => {
                if let Some(index) = self.form(workflow).resource_under_cursor() {
                    let form = self.form_mut(workflow);
                    form.selection.toggle_expand(index);
                    form.focus_row(FormRow::Resource(index));
                }
            }
            Action::SelectAllResources => self.toggle_all_resources(workflow),
            Action::SelectAllVerbs => {
                if let Some(index) = self.form(workflow).resource_under_cursor() {
                    let form = self.form_mut(workflow);
                    let all = form.selection.all_verbs_selected(index);
                    form.selection.select_all_verbs(index, !all);
                }
            }
            Action::Generate => return self.submit(workflow),
            Action::Save => return self.save(workflow),
            Action::EditName => self.start_edit_name(workflow),
            Action::NextWorkflow | Action::PrevWorkflow => {
                self.open_workflow(workflow.other());
            }
            Action::ChooseWorkflow(number) => {
                if let Some(target) = Workflow::ALL.get(usize::from(number).saturating_sub(1)) {
                    self.open_workflow(*target);
                }
            }
            Action::Back => {
                self.screen = Screen::Selector;
                self.status = "Choose a generator".to_string();
            }
            Action::PreviewDown => {
                let form = self.form_mut(workflow);
                form.preview_scroll = form.preview_scroll.saturating_add(10);
            }
            Action::PreviewUp => {
                let form = self.form_mut(workflow);
                form.preview_scroll = form.preview_scroll.saturating_sub(10);
            }
            Action::Quit
            | Action::ToggleHelp
            | Action::SubmitInput
            | Action::CancelInput
            | Action::Backspace
            | Action::InputChar(_) => {}
        }
        AppCommand::None
    }

    fn toggle_current(&mut self, workflow: Workflow) -> AppCommand {
        match self.form(workflow).current_row() {
            FormRow::Name => self.start_edit_name(workflow),
            FormRow::Namespace => self.cycle_namespace(workflow, 1),
            FormRow::SelectAll => self.toggle_all_resources(workflow),
            FormRow::Resource(index) => {
                self.form_mut(workflow)
                    .selection
                    .toggle_resource_selected(index);
            }
            FormRow::Verbs(index) => self.toggle_verb_under_cursor(workflow, index),
            FormRow::Generate => return self.submit(workflow),
            FormRow::Save => return self.save(workflow),
        }
        AppCommand::None
    }

    fn activate_current(&mut self, workflow: Workflow) -> AppCommand {
        match self.form(workflow).current_row() {
            FormRow::Resource(index) => {
                self.form_mut(workflow).selection.toggle_expand(index);
                AppCommand::None
            }
            _ => self.toggle_current(workflow),
        }
    }

    fn shift_horizontal(&mut self, workflow: Workflow, delta: isize) {
        match self.form(workflow).current_row() {
            FormRow::Namespace => self.cycle_namespace(workflow, delta),
            FormRow::Verbs(index) => {
                let form = self.form_mut(workflow);
                let count = form
                    .selection
                    .entries()
                    .get(index)
                    .map_or(0, |entry| entry.supported_verbs.len());
                let next = form.verb_cursor as isize + delta;
                form.verb_cursor = next.clamp(0, count.saturating_sub(1) as isize) as usize;
            }
            _ => {}
        }
    }

    fn toggle_verb_under_cursor(&mut self, workflow: Workflow, index: usize) {
        let form = self.form_mut(workflow);
        let verb = form
            .selection
            .entries()
            .get(index)
            .and_then(|entry| entry.supported_verbs.get(form.verb_cursor).copied());
        if let Some(verb) = verb {
            form.selection.toggle_verb(index, verb);
        }
    }

    fn toggle_all_resources(&mut self, workflow: Workflow) {
        let form = self.form_mut(workflow);
        let all = form.selection.all_selected();
        form.selection.select_all(!all);
        self.status = if all {
            "Deselected all resources".to_string()
        } else {
            "Selected all resources with every verb".to_string()
        };
    }

    fn start_edit_name(&mut self, workflow: Workflow) {
        self.form_mut(workflow).focus_row(FormRow::Name);
        self.mode = InputMode::EditName;
        self.status = "Editing name: Enter to confirm".to_string();
    }

    fn cycle_namespace(&mut self, workflow: Workflow, delta: isize) {
        let namespaces = match &self.namespaces {
            NamespacePhase::Loaded(namespaces) if !namespaces.is_empty() => namespaces.clone(),
            NamespacePhase::Loaded(_) => {
                self.status = "No namespaces available".to_string();
                return;
            }
            NamespacePhase::Loading => {
                self.status = "Loading namespaces…".to_string();
                return;
            }
            NamespacePhase::Failed(error) => {
                self.status = format!("Failed to load namespaces: {error}");
                return;
            }
        };

        let form = self.form_mut(workflow);
        let len = namespaces.len() as isize;
        let next = match namespaces.iter().position(|ns| *ns == form.namespace) {
            Some(current) => (current as isize + delta).rem_euclid(len),
            None => 0,
        };
        form.namespace = namespaces[next as usize].clone();
        let namespace = form.namespace.clone();
        self.status = format!("Namespace: {namespace}");
    }

    fn submit(&mut self, workflow: Workflow) -> AppCommand {
        if self.form(workflow).submission.is_pending() {
            self.status = "Generation already in progress".to_string();
            return AppCommand::None;
        }

        self.form_mut(workflow).clear_outcome();
        let form = self.form(workflow);
        let prepared = Submission::prepare(workflow, &form.name, &form.namespace, &form.selection);
        match prepared {
            Ok(submission) => {
                let ticket = self.next_ticket;
                self.next_ticket += 1;
                self.form_mut(workflow).submission = SubmissionState::Pending { ticket };
                self.status = format!(
                    "Generating {} for '{}'…",
                    workflow.artifact_label(),
                    submission.account()
                );
                info!(
                    "submitting {workflow} request ticket={ticket} account={}",
                    submission.account()
                );
                AppCommand::Generate { ticket, submission }
            }
            Err(error) => {
                self.status = error.to_string();
                self.form_mut(workflow).submission = SubmissionState::Invalid(error.to_string());
                AppCommand::None
            }
        }
    }

    fn save(&mut self, workflow: Workflow) -> AppCommand {
        let Some(file) = self.form(workflow).submission.generated() else {
            self.status = format!("Generate a {} first", workflow.artifact_label());
            return AppCommand::None;
        };
        let artifact = Artifact::new(workflow, &file.account, file.content.clone());
        AppCommand::SaveArtifact { workflow, artifact }
    }

    pub fn set_saved(&mut self, workflow: Workflow, path: PathBuf) {
        self.status = format!("Saved {}", path.display());
        self.form_mut(workflow).saved_to = Some(path);
    }

    pub fn apply_backend_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Namespaces(Ok(namespaces)) => {
                self.status = format!("Loaded {} namespaces", namespaces.len());
                self.namespaces = NamespacePhase::Loaded(namespaces);
            }
            BackendEvent::Namespaces(Err(error)) => {
                warn!("namespace fetch failed: {error}");
                self.status = format!("Failed to load namespaces: {error}");
                self.namespaces = NamespacePhase::Failed(error.to_string());
            }
            BackendEvent::Generated {
                workflow,
                ticket,
                account,
                result,
            } => {
                let form = self.form_mut(workflow);
                if form.submission != (SubmissionState::Pending { ticket }) {
                    debug!("dropping stale {workflow} response ticket={ticket}");
                    return;
                }
                match result {
                    Ok(content) => {
                        form.submission = SubmissionState::Success(GeneratedFile {
                            account,
                            content,
                            received_at: Local::now(),
                        });
                        form.focus_row(FormRow::Save);
                        self.status = match workflow {
                            Workflow::Kubeconfig => "Kubeconfig generated successfully!",
                            Workflow::Role => "Role generated successfully!",
                        }
                        .to_string();
                    }
                    Err(error) => {
                        warn!("{workflow} generation failed: {error}");
                        form.submission = SubmissionState::Failure(error.to_string());
                        self.status = error.to_string();
                    }
                }
            }
        }
    }
}
