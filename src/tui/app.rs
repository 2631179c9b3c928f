//! Main TUI application state and event loop

use std::io::{self, IsTerminal, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::{Frame, Terminal};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info};

use crate::api::HttpApi;
use crate::cache::{Invalidate, Query, QueryCache, QueryKey};
use crate::error::ApiError;
use crate::forms::{FieldErrors, PlanNodeForm, ScenarioForm, ServiceForm};
use crate::model::{current_scenario, PlanNode, Scenario, ScenarioId, Service, User};
use crate::nodes::{
    build_tree_checked, find_node, ExplorerState, PendingDialog, PlanNodeWithChildren,
};

use super::dialog::{draw_confirm, draw_form_dialog, FormDialog, FormKind};
use super::tasks::{AdminOutcome, AdminRequest, Completion, Tasks};
use super::views::{
    draw_dashboard_view, draw_explorer_view, draw_scenarios_view, draw_services_view,
    node_at_cursor, row_of, DashboardContext, ExplorerContext, ExplorerViewState,
    ScenariosViewState, ServicesViewState,
};
use super::widgets::{
    draw_command_palette, draw_message_box, draw_status_bar, StatusTone, COLOR_BG,
};

const PAGE_JUMP: isize = 10;

/// Settings for launching the TUI
#[derive(Clone, Debug)]
pub struct TuiOptions {
    /// Refetch everything this often; zero disables it
    pub refresh: Duration,
    pub id_preview_chars: usize,
    pub start_in_explorer: bool,
}

/// Which view is active
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum ViewKind {
    #[default]
    Dashboard,
    Explorer,
    Scenarios,
    Services,
}

impl ViewKind {
    const ALL: [ViewKind; 4] = [
        ViewKind::Dashboard,
        ViewKind::Explorer,
        ViewKind::Scenarios,
        ViewKind::Services,
    ];

    fn label(&self) -> &'static str {
        match self {
            ViewKind::Dashboard => "dashboard",
            ViewKind::Explorer => "explorer",
            ViewKind::Scenarios => "scenarios",
            ViewKind::Services => "services",
        }
    }

    fn next(self) -> Self {
        let index = Self::ALL.iter().position(|v| *v == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

/// Scenario actions waiting for y/n
#[derive(Clone, Debug)]
enum ConfirmAction {
    Activate(Scenario),
    Delete(Scenario),
}

struct PendingConfirm {
    action: ConfirmAction,
    busy: bool,
}

/// Main application state
pub struct App {
    tasks: Tasks,
    completions: UnboundedReceiver<Completion>,
    cache: QueryCache,
    options: TuiOptions,

    /// Current view
    current_view: ViewKind,

    user: Query<User>,
    scenarios: Query<Vec<Scenario>>,
    services: Query<Vec<Service>>,
    forest: Query<Vec<PlanNodeWithChildren>>,

    /// Scenario the loaded forest belongs to
    forest_scenario: Option<ScenarioId>,

    /// Explicitly viewed scenario; `None` follows the current one
    viewed_scenario: Option<ScenarioId>,

    explorer: ExplorerState,
    explorer_view: ExplorerViewState,
    scenarios_view: ScenariosViewState,
    services_view: ServicesViewState,

    form: Option<FormDialog>,
    confirm: Option<PendingConfirm>,
    delete_in_flight: bool,

    /// Error the user has to acknowledge
    error_popup: Option<String>,

    /// Status message and tone
    status_message: String,
    status_tone: StatusTone,

    /// Command mode state
    command_mode: bool,
    command_buffer: String,

    /// Last refresh time for auto-reload
    last_refresh: Instant,

    should_quit: bool,
}

impl App {
    fn new(tasks: Tasks, completions: UnboundedReceiver<Completion>, options: TuiOptions) -> Self {
        let current_view = if options.start_in_explorer {
            ViewKind::Explorer
        } else {
            ViewKind::Dashboard
        };

        Self {
            tasks,
            completions,
            cache: QueryCache::new(),
            options,
            current_view,
            user: Query::Loading,
            scenarios: Query::Loading,
            services: Query::Loading,
            forest: Query::Loading,
            forest_scenario: None,
            viewed_scenario: None,
            explorer: ExplorerState::new(),
            explorer_view: ExplorerViewState::default(),
            scenarios_view: ScenariosViewState::default(),
            services_view: ServicesViewState::default(),
            form: None,
            confirm: None,
            delete_in_flight: false,
            error_popup: None,
            status_message: "Press 1-4 to switch views, ':' for commands, 'q' to quit".to_string(),
            status_tone: StatusTone::Info,
            command_mode: false,
            command_buffer: String::new(),
            last_refresh: Instant::now(),
            should_quit: false,
        }
    }

    fn set_status<S: Into<String>>(&mut self, message: S, tone: StatusTone) {
        self.status_message = message.into();
        self.status_tone = tone;
    }

    fn current_scenario(&self) -> Option<&Scenario> {
        self.scenarios.ready().and_then(|list| current_scenario(list))
    }

    fn forest_slice(&self) -> &[PlanNodeWithChildren] {
        self.forest.ready().map(Vec::as_slice).unwrap_or(&[])
    }

    fn visible_row_count(&self) -> usize {
        self.explorer.visible_rows(self.forest_slice()).len()
    }

    fn viewed_label(&self) -> String {
        let Some(id) = self.forest_scenario.as_ref().or(self.viewed_scenario.as_ref()) else {
            return "no current scenario".to_string();
        };
        let name = self
            .scenarios
            .ready()
            .and_then(|list| list.iter().find(|s| &s.id == id))
            .map(|s| s.name.clone())
            .unwrap_or_else(|| id.to_string());
        if self.current_scenario().map(|s| &s.id) == Some(id) {
            format!("{} (current)", name)
        } else {
            format!("{} (read-only)", name)
        }
    }

    /// Refetch what is stale and apply finished calls
    fn tick(&mut self) {
        if !self.options.refresh.is_zero() && self.last_refresh.elapsed() >= self.options.refresh {
            self.refresh_all();
        }
        for key in self.cache.begin_refetch() {
            debug!("Fetching {:?}", key);
            self.tasks.fetch(key, self.viewed_scenario.clone());
        }
        while let Ok(completion) = self.completions.try_recv() {
            self.apply(completion);
        }
    }

    fn refresh_all(&mut self) {
        for key in QueryKey::ALL {
            self.cache.invalidate(key);
        }
        self.last_refresh = Instant::now();
    }

    fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::User(result) => {
                self.cache.finish_refetch(QueryKey::CurrentUser);
                self.user = into_query(result, "Failed to load your account.");
            }
            Completion::Scenarios(result) => {
                self.cache.finish_refetch(QueryKey::Scenarios);
                self.scenarios = into_query(result, "Failed to load scenarios.");
                let len = self.scenarios.ready().map_or(0, Vec::len);
                self.scenarios_view.move_selection(0, len);
                self.forget_missing_viewed_scenario();
            }
            Completion::Services(result) => {
                self.cache.finish_refetch(QueryKey::Services);
                self.services = into_query(result, "Failed to load services.");
                let len = self.services.ready().map_or(0, Vec::len);
                self.services_view.move_selection(0, len);
            }
            Completion::PlanNodes {
                requested,
                resolved,
                result,
            } => {
                self.cache.finish_refetch(QueryKey::PlanNodes);
                if requested != self.viewed_scenario {
                    debug!("Dropping plan nodes fetched for {:?}", requested);
                    return;
                }
                self.forest_scenario = resolved;
                self.forest = match result {
                    Ok(nodes) => match build_tree_checked(&nodes) {
                        Ok(forest) => {
                            self.explorer.sync_with_tree(&forest);
                            Query::Ready(forest)
                        }
                        Err(err) => Query::Unavailable(err.to_string()),
                    },
                    Err(err) => Query::Unavailable(err.user_message("Failed to load plan nodes.")),
                };
                let rows = self.visible_row_count();
                self.explorer_view.clamp(rows);
            }
            Completion::NodeSubmitted(outcome) => {
                let own_dialog = outcome.dialog_seq == self.explorer.dialog_seq();
                self.explorer.finish_submit(outcome, &mut self.cache);
                if self.explorer.dialog().is_open() {
                    if let Some(form) = self.form.as_mut().filter(|_| own_dialog) {
                        form.submitting = false;
                    }
                } else if matches!(
                    self.form.as_ref().map(|f| &f.kind),
                    Some(FormKind::PlanNode(_))
                ) {
                    self.form = None;
                }
                self.take_notice();
            }
            Completion::NodeDeleted(outcome) => {
                self.delete_in_flight = false;
                self.explorer.finish_delete(outcome, &mut self.cache);
                self.take_notice();
            }
            Completion::Admin(outcome) => self.apply_admin(outcome),
        }
    }

    fn apply_admin(&mut self, outcome: AdminOutcome) {
        if let Some(message) = outcome.error_message() {
            info!("{:?} failed: {}", outcome.kind, message);
            if let Some(form) = self.form.as_mut() {
                form.submitting = false;
            }
            if let Some(confirm) = self.confirm.as_mut() {
                confirm.busy = false;
            }
            self.error_popup = Some(message);
            return;
        }

        for key in outcome.kind.invalidates() {
            self.cache.invalidate(*key);
        }
        if self.form.as_ref().is_some_and(|f| f.submitting) {
            self.form = None;
        }
        if self.confirm.as_ref().is_some_and(|c| c.busy) {
            self.confirm = None;
        }
        if let Ok(message) = outcome.result {
            self.set_status(message, StatusTone::Success);
        }
    }

    /// Move the explorer's notice into the status bar or the error popup
    fn take_notice(&mut self) {
        let Some(notice) = self.explorer.notice().cloned() else {
            return;
        };
        self.explorer.dismiss_notice();
        if notice.is_blocking() {
            self.error_popup = Some(notice.message);
        } else {
            self.set_status(notice.message, notice.tone.into());
        }
    }

    fn forget_missing_viewed_scenario(&mut self) {
        let Some(viewed) = &self.viewed_scenario else {
            return;
        };
        let known = self
            .scenarios
            .ready()
            .map_or(true, |list| list.iter().any(|s| &s.id == viewed));
        if !known {
            info!("Viewed scenario {} is gone, following the current one", viewed);
            self.view_scenario(None);
        }
    }

    /// Switch the explorer to `id`; the current scenario means "follow current"
    fn view_scenario(&mut self, id: Option<ScenarioId>) {
        let current = self.current_scenario().map(|s| s.id.clone());
        let id = id.filter(|id| Some(id) != current.as_ref());
        if id == self.viewed_scenario {
            return;
        }
        self.viewed_scenario = id;
        self.forest = Query::Loading;
        self.forest_scenario = None;
        self.cache.invalidate(QueryKey::PlanNodes);
        let label = self.viewed_label();
        self.set_status(format!("Viewing {}", label), StatusTone::Info);
    }

    fn cycle_viewed_scenario(&mut self, delta: isize) {
        let Some(list) = self.scenarios.ready() else {
            return;
        };
        if list.is_empty() {
            return;
        }
        let viewed = self
            .viewed_scenario
            .clone()
            .or_else(|| self.current_scenario().map(|s| s.id.clone()));
        let index = viewed
            .and_then(|id| list.iter().position(|s| s.id == id))
            .unwrap_or(0) as isize;
        let len = list.len() as isize;
        let next = list[(index + delta).rem_euclid(len) as usize].id.clone();
        self.view_scenario(Some(next));
    }

    fn enter_command_mode(&mut self) {
        self.command_mode = true;
        self.command_buffer.clear();
        self.set_status(":", StatusTone::Info);
    }

    fn switch_view(&mut self, view: ViewKind) {
        self.current_view = view;
        self.set_status(format!("Switched to {} view", view.label()), StatusTone::Info);
    }

    fn execute_command(&mut self, command: &str) {
        match command {
            "dashboard" | "d" => self.switch_view(ViewKind::Dashboard),
            "explorer" | "e" => self.switch_view(ViewKind::Explorer),
            "scenarios" | "s" => self.switch_view(ViewKind::Scenarios),
            "services" | "v" => self.switch_view(ViewKind::Services),
            "current" | "c" => self.view_scenario(None),
            "refresh" | "r" => {
                self.refresh_all();
                self.set_status("Refreshing…", StatusTone::Info);
            }
            "q" | "quit" => self.should_quit = true,
            _ => {
                self.set_status(format!("Unknown command: {}", command), StatusTone::Error);
            }
        }
    }

    fn handle_command_key(&mut self, key: KeyEvent) -> bool {
        if !self.command_mode {
            return false;
        }
        match key.code {
            KeyCode::Esc => {
                self.command_mode = false;
                self.command_buffer.clear();
                self.set_status("Command canceled", StatusTone::Info);
            }
            KeyCode::Enter => {
                let command = self.command_buffer.trim().to_string();
                self.command_mode = false;
                self.command_buffer.clear();
                if command.is_empty() {
                    self.set_status("Empty command", StatusTone::Info);
                } else {
                    self.execute_command(&command);
                }
            }
            KeyCode::Backspace | KeyCode::Delete => {
                self.command_buffer.pop();
            }
            KeyCode::Char(c) => {
                self.command_buffer.push(c);
            }
            _ => {}
        }
        true
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.error_popup.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.error_popup = None;
            }
            return;
        }
        if self.form.is_some() {
            self.handle_form_key(key);
            return;
        }
        if let PendingDialog::ConfirmingDelete(_) = self.explorer.dialog() {
            self.handle_delete_key(key);
            return;
        }
        if self.confirm.is_some() {
            self.handle_confirm_key(key);
            return;
        }
        if self.handle_command_key(key) {
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char(':') => self.enter_command_mode(),
            KeyCode::Char('1') => self.switch_view(ViewKind::Dashboard),
            KeyCode::Char('2') => self.switch_view(ViewKind::Explorer),
            KeyCode::Char('3') => self.switch_view(ViewKind::Scenarios),
            KeyCode::Char('4') => self.switch_view(ViewKind::Services),
            KeyCode::Tab => self.switch_view(self.current_view.next()),
            KeyCode::Char('r') if ctrl => {
                self.refresh_all();
                self.set_status("Refreshing…", StatusTone::Info);
            }
            _ => match self.current_view {
                ViewKind::Dashboard => {}
                ViewKind::Explorer => self.handle_explorer_key(key),
                ViewKind::Scenarios => self.handle_scenarios_key(key),
                ViewKind::Services => self.handle_services_key(key),
            },
        }
    }

    fn handle_explorer_key(&mut self, key: KeyEvent) {
        let rows = self.visible_row_count();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.explorer_view.move_cursor(1, rows),
            KeyCode::Up | KeyCode::Char('k') => self.explorer_view.move_cursor(-1, rows),
            KeyCode::PageDown => self.explorer_view.move_cursor(PAGE_JUMP, rows),
            KeyCode::PageUp => self.explorer_view.move_cursor(-PAGE_JUMP, rows),
            KeyCode::Enter | KeyCode::Char(' ') => {
                let forest = self.forest.ready().map(Vec::as_slice).unwrap_or(&[]);
                if let Some(node) = node_at_cursor(&self.explorer, forest, self.explorer_view.cursor()) {
                    self.explorer.select_and_maybe_expand(node);
                }
            }
            KeyCode::Right | KeyCode::Char('l') => self.set_expanded(true),
            KeyCode::Left | KeyCode::Char('h') => self.set_expanded(false),
            KeyCode::Char('n') => self.open_create_form(true),
            KeyCode::Char('N') => self.open_create_form(false),
            KeyCode::Char('e') => self.open_edit_form(),
            KeyCode::Char('d') => self.request_delete(),
            KeyCode::Char(']') => self.cycle_viewed_scenario(1),
            KeyCode::Char('[') => self.cycle_viewed_scenario(-1),
            KeyCode::Char('c') => self.view_scenario(None),
            _ => {}
        }
    }

    /// Open or close the node under the cursor, keeping the cursor on it
    fn set_expanded(&mut self, open: bool) {
        let forest = self.forest.ready().map(Vec::as_slice).unwrap_or(&[]);
        let Some(node) = node_at_cursor(&self.explorer, forest, self.explorer_view.cursor()) else {
            return;
        };
        if self.explorer.is_expanded(&node.node.id) != open {
            self.explorer.toggle_expand(node);
        }
        if let Some(row) = row_of(&self.explorer, forest, &node.node.id) {
            self.explorer_view.list_state.select(Some(row));
        }
    }

    fn open_create_form(&mut self, under_selection: bool) {
        let Some(scenario_id) = self.forest_scenario.clone() else {
            self.set_status("No scenario to add nodes to", StatusTone::Warning);
            return;
        };
        let forest = self.forest.ready().map(Vec::as_slice).unwrap_or(&[]);
        let parent = if under_selection {
            self.explorer.selected_node(forest).map(|n| n.node.clone())
        } else {
            None
        };

        self.explorer.request_create(parent.as_ref());
        let Some(target) = self.explorer.form_target(&scenario_id) else {
            return;
        };
        let title = match &parent {
            Some(parent) => format!("New node under \"{}\"", parent.title),
            None => "New root node".to_string(),
        };
        self.form = Some(FormDialog::plan_node(
            target,
            &PlanNodeForm::for_create(parent.as_ref()),
            title,
        ));
    }

    fn selected_plan_node(&self) -> Option<PlanNode> {
        self.explorer
            .selected_node(self.forest_slice())
            .map(|n| n.node.clone())
    }

    fn open_edit_form(&mut self) {
        let Some(node) = self.selected_plan_node() else {
            self.set_status("Select a node first (Enter)", StatusTone::Warning);
            return;
        };
        let current = self.current_scenario().cloned();
        if !self.explorer.request_edit(&node, current.as_ref()) {
            self.set_status("This node is read-only outside the current scenario", StatusTone::Warning);
            return;
        }
        if let Some(target) = self.explorer.form_target(&node.scenario_id) {
            self.form = Some(FormDialog::plan_node(
                target,
                &PlanNodeForm::for_edit(&node),
                format!("Edit \"{}\"", node.title),
            ));
        }
    }

    fn request_delete(&mut self) {
        let Some(node) = self.selected_plan_node() else {
            self.set_status("Select a node first (Enter)", StatusTone::Warning);
            return;
        };
        let current = self.current_scenario().cloned();
        if !self.explorer.request_delete(&node, current.as_ref()) {
            self.set_status("This node is read-only outside the current scenario", StatusTone::Warning);
        }
    }

    fn handle_delete_key(&mut self, key: KeyEvent) {
        let PendingDialog::ConfirmingDelete(node_id) = self.explorer.dialog().clone() else {
            return;
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') if !self.delete_in_flight => {
                self.delete_in_flight = true;
                self.tasks.delete_node(node_id);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.explorer.cancel(),
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let Some(confirm) = self.confirm.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') if !confirm.busy => {
                confirm.busy = true;
                let request = match confirm.action.clone() {
                    ConfirmAction::Activate(scenario) => AdminRequest::ActivateScenario(scenario),
                    ConfirmAction::Delete(scenario) => AdminRequest::DeleteScenario(scenario),
                };
                self.tasks.admin(request);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.confirm = None,
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                if matches!(form.kind, FormKind::PlanNode(_)) {
                    self.explorer.cancel();
                }
                self.form = None;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Left => form.cycle_choice(false),
            KeyCode::Right => form.cycle_choice(true),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => self.submit_form(),
            KeyCode::Char(c) => form.input(c),
            _ => {}
        }
    }

    fn submit_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        if form.submitting {
            return;
        }

        let request = match form.kind.clone() {
            FormKind::PlanNode(target) => {
                let values = form.to_plan_node_form();
                if let Some(request) = self.explorer.prepare_submit(&values, &target) {
                    form.submitting = true;
                    self.tasks.submit_node(request);
                }
                return;
            }
            FormKind::CreateScenario => form
                .to_scenario_form()
                .to_create_dto()
                .map(AdminRequest::CreateScenario),
            FormKind::EditScenario(id) => form
                .to_scenario_form()
                .to_update_dto()
                .map(|dto| AdminRequest::UpdateScenario(id, dto)),
            FormKind::RolloverScenario(source) => form
                .to_scenario_form()
                .to_rollover_dto()
                .map(|dto| AdminRequest::RolloverScenario(source, dto)),
            FormKind::CreateService => form
                .to_service_form()
                .to_create_dto()
                .map(AdminRequest::CreateService),
        };

        match request {
            Ok(request) => {
                form.errors = FieldErrors::new();
                form.submitting = true;
                self.tasks.admin(request);
            }
            Err(errors) => form.errors = errors,
        }
    }

    fn handle_scenarios_key(&mut self, key: KeyEvent) {
        let len = self.scenarios.ready().map_or(0, Vec::len);
        let selected = self.scenarios_view.selected(&self.scenarios).cloned();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.scenarios_view.move_selection(1, len),
            KeyCode::Up | KeyCode::Char('k') => self.scenarios_view.move_selection(-1, len),
            KeyCode::Char('n') => {
                self.form = Some(FormDialog::scenario(
                    FormKind::CreateScenario,
                    &ScenarioForm::default(),
                    "New scenario",
                ));
            }
            _ => {
                let Some(scenario) = selected else {
                    return;
                };
                match key.code {
                    KeyCode::Enter => {
                        self.view_scenario(Some(scenario.id.clone()));
                        self.current_view = ViewKind::Explorer;
                    }
                    KeyCode::Char('a') if scenario.is_current => {
                        self.set_status(format!("\"{}\" is already current", scenario.name), StatusTone::Info);
                    }
                    KeyCode::Char('a') => {
                        self.confirm = Some(PendingConfirm {
                            action: ConfirmAction::Activate(scenario),
                            busy: false,
                        });
                    }
                    KeyCode::Char('e') => {
                        self.form = Some(FormDialog::scenario(
                            FormKind::EditScenario(scenario.id.clone()),
                            &ScenarioForm::for_edit(&scenario),
                            format!("Edit \"{}\"", scenario.name),
                        ));
                    }
                    KeyCode::Char('r') => {
                        self.form = Some(FormDialog::scenario(
                            FormKind::RolloverScenario(scenario.clone()),
                            &ScenarioForm::for_rollover(&scenario),
                            format!("Roll over \"{}\"", scenario.name),
                        ));
                    }
                    KeyCode::Char('d') => {
                        self.confirm = Some(PendingConfirm {
                            action: ConfirmAction::Delete(scenario),
                            busy: false,
                        });
                    }
                    _ => {}
                }
            }
        }
    }

    fn handle_services_key(&mut self, key: KeyEvent) {
        let len = self.services.ready().map_or(0, Vec::len);
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.services_view.move_selection(1, len),
            KeyCode::Up | KeyCode::Char('k') => self.services_view.move_selection(-1, len),
            KeyCode::Char('n') => self.form = Some(FormDialog::service(&ServiceForm::default())),
            _ => {}
        }
    }

    fn state_line(&self) -> String {
        let user = self
            .user
            .ready()
            .map(|u| u.name.clone())
            .unwrap_or_else(|| "-".to_string());
        match self.current_view {
            ViewKind::Explorer => {
                let nodes: usize = self
                    .forest_slice()
                    .iter()
                    .map(PlanNodeWithChildren::subtree_len)
                    .sum();
                format!(
                    "View: {} · Scenario: {} · Nodes: {} · User: {}",
                    self.current_view.label(),
                    self.viewed_label(),
                    nodes,
                    user
                )
            }
            _ => format!(
                "View: {} · Scenario: {} · User: {}",
                self.current_view.label(),
                self.viewed_label(),
                user
            ),
        }
    }

    fn help_line(&self) -> &'static str {
        match self.current_view {
            ViewKind::Dashboard => "Keys: 1-4/Tab views · ^r refresh · : cmd · q quit",
            ViewKind::Explorer => {
                "Keys: j/k nav · Enter select · h/l fold · n child · N root · e edit · d delete · [/] scenario · c current"
            }
            ViewKind::Scenarios => {
                "Keys: j/k nav · Enter explore · a activate · n new · e edit · r rollover · d delete"
            }
            ViewKind::Services => "Keys: j/k nav · n new service · 1-4/Tab views · q quit",
        }
    }
}

fn into_query<T>(result: Result<T, ApiError>, fallback: &str) -> Query<T> {
    match result {
        Ok(value) => Query::Ready(value),
        Err(err) => Query::Unavailable(err.user_message(fallback)),
    }
}

/// Run the TUI until the user quits. Blocks; API calls run on `handle`.
pub fn run_tui(api: HttpApi, handle: Handle, options: TuiOptions) -> Result<()> {
    if !io::stdout().is_terminal() {
        bail!("The TUI requires a real terminal");
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let tasks = Tasks::new(Arc::new(api), handle, tx);
    let mut app = App::new(tasks, rx, options);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_event_loop(&mut terminal, &mut app);

    cleanup_terminal(terminal)?;
    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.tick();

        terminal.draw(|frame| draw_ui(frame, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == event::KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn draw_ui(frame: &mut Frame<'_>, app: &mut App) {
    // Background
    frame.render_widget(
        Block::default().style(Style::default().bg(COLOR_BG)),
        frame.size(),
    );

    // Layout: main content + status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(10), Constraint::Length(5)].as_ref())
        .split(frame.size());

    match app.current_view {
        ViewKind::Dashboard => {
            let ctx = DashboardContext {
                user: &app.user,
                scenarios: &app.scenarios,
                services: &app.services,
                forest: &app.forest,
            };
            draw_dashboard_view(frame, chunks[0], &ctx);
        }
        ViewKind::Explorer => {
            let ctx = ExplorerContext {
                forest: &app.forest,
                explorer: &app.explorer,
                current: app.scenarios.ready().and_then(|list| current_scenario(list)),
                viewed_label: app.viewed_label(),
                id_preview_chars: app.options.id_preview_chars,
            };
            draw_explorer_view(frame, chunks[0], &mut app.explorer_view, &ctx);
        }
        ViewKind::Scenarios => {
            let viewed = app
                .viewed_scenario
                .clone()
                .or_else(|| app.current_scenario().map(|s| s.id.clone()));
            draw_scenarios_view(
                frame,
                chunks[0],
                &mut app.scenarios_view,
                &app.scenarios,
                viewed.as_ref(),
            );
        }
        ViewKind::Services => {
            draw_services_view(frame, chunks[0], &mut app.services_view, &app.services);
        }
    }

    draw_status_bar(
        frame,
        chunks[1],
        &app.status_message,
        app.status_tone,
        &app.state_line(),
        app.help_line(),
    );

    if let Some(form) = &app.form {
        let errors = match form.kind {
            FormKind::PlanNode(_) => app.explorer.form_errors(),
            _ => &form.errors,
        };
        draw_form_dialog(frame, frame.size(), form, errors);
    }

    if let PendingDialog::ConfirmingDelete(node_id) = app.explorer.dialog() {
        let title = find_node(app.forest_slice(), node_id)
            .map(|n| n.node.title.clone())
            .unwrap_or_else(|| node_id.to_string());
        draw_confirm(
            frame,
            frame.size(),
            "Delete node",
            &format!("Delete \"{}\"? This cannot be undone.", title),
            app.delete_in_flight,
        );
    }

    if let Some(confirm) = &app.confirm {
        let (title, question) = match &confirm.action {
            ConfirmAction::Activate(s) => (
                "Activate scenario",
                format!("Make \"{}\" the current scenario?", s.name),
            ),
            ConfirmAction::Delete(s) => (
                "Delete scenario",
                format!("Delete \"{}\" and all of its plan nodes?", s.name),
            ),
        };
        draw_confirm(frame, frame.size(), title, &question, confirm.busy);
    }

    if let Some(message) = &app.error_popup {
        draw_message_box(
            frame,
            frame.size(),
            "Error",
            StatusTone::Error,
            vec![
                Line::from(message.clone()),
                Line::default(),
                Line::from("Press Enter to dismiss"),
            ],
        );
    }

    // Draw command palette if active
    if app.command_mode {
        draw_command_palette(frame, frame.size(), &app.command_buffer);
    }
}

fn cleanup_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::model::NodeId;
    use crate::nodes::build_tree;
    use crate::nodes::tree::tests::plan_node;
    use crate::nodes::{DeleteOutcome, SubmitOutcome};
    use crate::tui::tasks::AdminKind;
    use chrono::NaiveDate;

    fn app() -> App {
        let api = HttpApi::new(&ApiConfig::default(), None).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let tasks = Tasks::new(Arc::new(api), Handle::current(), tx);
        let options = TuiOptions {
            refresh: Duration::ZERO,
            id_preview_chars: 18,
            start_in_explorer: true,
        };
        App::new(tasks, rx, options)
    }

    fn current(id: &str) -> Scenario {
        Scenario {
            id: ScenarioId::from(id),
            name: "FY25".to_string(),
            description: None,
            start_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            is_locked: false,
            is_current: true,
            created_at: None,
            updated_at: None,
            created_by: None,
            updated_by: None,
        }
    }

    /// App with one selected node of `scenario_id` and "s-current" as current
    fn app_with_selected_node(scenario_id: &str) -> App {
        let mut app = app();
        app.scenarios = Query::Ready(vec![current("s-current")]);
        let mut node = plan_node("n1", None, 0);
        node.scenario_id = ScenarioId::from(scenario_id);
        let forest = build_tree(&[node]);
        app.explorer.select_and_maybe_expand(&forest[0]);
        app.forest = Query::Ready(forest);
        app
    }

    #[tokio::test]
    async fn test_plan_nodes_for_another_scenario_are_dropped() {
        let mut app = app();
        app.viewed_scenario = Some(ScenarioId::from("s-other"));

        app.apply(Completion::PlanNodes {
            requested: None,
            resolved: Some(ScenarioId::from("s-current")),
            result: Ok(vec![plan_node("a", None, 0)]),
        });
        assert_eq!(app.forest, Query::Loading);

        app.apply(Completion::PlanNodes {
            requested: Some(ScenarioId::from("s-other")),
            resolved: Some(ScenarioId::from("s-other")),
            result: Ok(vec![plan_node("a", None, 0), plan_node("b", Some("a"), 0)]),
        });
        assert_eq!(app.forest.ready().map(Vec::len), Some(1));
        assert_eq!(app.forest_scenario, Some(ScenarioId::from("s-other")));
        assert_eq!(app.explorer_view.cursor(), Some(0));
    }

    #[tokio::test]
    async fn test_failed_fetch_shows_unavailable() {
        let mut app = app();
        app.apply(Completion::PlanNodes {
            requested: None,
            resolved: None,
            result: Err(ApiError::Rejected {
                status: 500,
                message: None,
            }),
        });
        assert_eq!(
            app.forest,
            Query::Unavailable("Failed to load plan nodes.".to_string())
        );
    }

    #[tokio::test]
    async fn test_admin_failure_keeps_form_and_blocks() {
        let mut app = app();
        let mut form = FormDialog::service(&ServiceForm::default());
        form.submitting = true;
        app.form = Some(form);

        app.apply(Completion::Admin(AdminOutcome {
            kind: AdminKind::CreateService,
            result: Err(ApiError::Rejected {
                status: 409,
                message: Some("Slug already taken".to_string()),
            }),
        }));
        assert_eq!(app.error_popup.as_deref(), Some("Slug already taken"));
        assert!(!app.form.as_ref().unwrap().submitting);

        // Typing goes nowhere until the error is acknowledged
        app.handle_key(KeyEvent::from(KeyCode::Char('x')));
        assert_eq!(app.form.as_ref().unwrap().to_service_form().name, "");
        app.handle_key(KeyEvent::from(KeyCode::Enter));
        assert!(app.error_popup.is_none());
        assert!(app.form.is_some());
    }

    #[tokio::test]
    async fn test_admin_success_closes_form_and_invalidates() {
        let mut app = app();
        for key in app.cache.begin_refetch() {
            app.cache.finish_refetch(key);
        }
        let mut form = FormDialog::service(&ServiceForm::default());
        form.submitting = true;
        app.form = Some(form);

        app.apply(Completion::Admin(AdminOutcome {
            kind: AdminKind::CreateService,
            result: Ok("Created service \"Billing\"".to_string()),
        }));
        assert!(app.form.is_none());
        assert!(app.cache.is_stale(QueryKey::Services));
        assert!(!app.cache.is_stale(QueryKey::PlanNodes));
        assert_eq!(app.status_tone, StatusTone::Success);
    }

    #[tokio::test]
    async fn test_read_only_node_cannot_be_edited_from_keys() {
        let mut app = app_with_selected_node("s-old");
        app.handle_key(KeyEvent::from(KeyCode::Char('e')));
        assert!(app.form.is_none());
        assert_eq!(app.status_tone, StatusTone::Warning);

        app.handle_key(KeyEvent::from(KeyCode::Char('d')));
        assert_eq!(app.explorer.dialog(), &PendingDialog::Closed);
    }

    #[tokio::test]
    async fn test_edit_opens_prefilled_form() {
        let mut app = app_with_selected_node("s-current");
        app.handle_key(KeyEvent::from(KeyCode::Char('e')));
        let form = app.form.as_ref().unwrap();
        assert_eq!(form.to_plan_node_form().title, "Node n1");
        assert_eq!(
            app.explorer.dialog(),
            &PendingDialog::Editing(NodeId::from("n1"))
        );

        app.handle_key(KeyEvent::from(KeyCode::Esc));
        assert!(app.form.is_none());
        assert_eq!(app.explorer.dialog(), &PendingDialog::Closed);
    }

    #[tokio::test]
    async fn test_rejected_delete_keeps_confirmation_open() {
        let mut app = app_with_selected_node("s-current");
        app.handle_key(KeyEvent::from(KeyCode::Char('d')));
        assert_eq!(
            app.explorer.dialog(),
            &PendingDialog::ConfirmingDelete(NodeId::from("n1"))
        );

        app.delete_in_flight = true;
        app.apply(Completion::NodeDeleted(DeleteOutcome {
            node_id: NodeId::from("n1"),
            result: Err(ApiError::Rejected {
                status: 409,
                message: Some("Node has child nodes".to_string()),
            }),
        }));
        assert!(!app.delete_in_flight);
        assert_eq!(app.error_popup.as_deref(), Some("Node has child nodes"));
        assert!(app.explorer.dialog().is_open());

        app.handle_key(KeyEvent::from(KeyCode::Enter));
        app.handle_key(KeyEvent::from(KeyCode::Char('n')));
        assert_eq!(app.explorer.dialog(), &PendingDialog::Closed);
    }

    #[tokio::test]
    async fn test_late_save_keeps_reopened_form() {
        let mut app = app();
        app.forest_scenario = Some(ScenarioId::from("s-current"));
        app.forest = Query::Ready(Vec::new());

        app.handle_key(KeyEvent::from(KeyCode::Char('N')));
        let target = app
            .explorer
            .form_target(&ScenarioId::from("s-current"))
            .unwrap();
        let values = PlanNodeForm {
            title: "Growth".to_string(),
            ..PlanNodeForm::for_create(None)
        };
        let request = app.explorer.prepare_submit(&values, &target).unwrap();

        app.handle_key(KeyEvent::from(KeyCode::Esc));
        app.handle_key(KeyEvent::from(KeyCode::Char('N')));
        app.handle_key(KeyEvent::from(KeyCode::Char('x')));
        // The reopened form has its own save in flight
        app.form.as_mut().unwrap().submitting = true;

        let mut saved = plan_node("new", None, 0);
        saved.title = "Growth".to_string();
        app.apply(Completion::NodeSubmitted(SubmitOutcome {
            issued_from: request.issued_from,
            dialog_seq: request.dialog_seq,
            result: Ok(saved),
        }));

        assert_eq!(app.explorer.dialog(), &PendingDialog::CreatingRoot);
        let form = app.form.as_ref().unwrap();
        assert_eq!(form.to_plan_node_form().title, "x");
        assert!(form.submitting);
        assert_eq!(app.status_tone, StatusTone::Success);
    }

    #[tokio::test]
    async fn test_viewing_current_scenario_follows_it() {
        let mut app = app();
        app.scenarios = Query::Ready(vec![current("s-current")]);
        app.view_scenario(Some(ScenarioId::from("s-current")));
        assert_eq!(app.viewed_scenario, None);

        app.view_scenario(Some(ScenarioId::from("s-old")));
        assert_eq!(app.viewed_scenario, Some(ScenarioId::from("s-old")));
        assert_eq!(app.forest, Query::Loading);

        // Scenario list no longer has it
        app.apply(Completion::Scenarios(Ok(vec![current("s-current")])));
        assert_eq!(app.viewed_scenario, None);
    }
}
