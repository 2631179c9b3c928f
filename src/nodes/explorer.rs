//! Explorer state: expansion, selection, read-only derivation and the
//! create/edit/delete dialog workflow over a plan-node forest.
//!
//! Network-bound steps are split in three so the UI loop never blocks:
//! a request phase on the state (`prepare_submit`, `request_delete`), an
//! execution phase that only needs the API (`execute_submit`,
//! `execute_delete`), and a completion phase applied back to the state
//! (`finish_submit`, `finish_delete`). Completions carry the dialog or
//! node id they were issued for, so the user may move the selection while
//! a call is in flight.

use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::tree::{find_node, PlanNodeWithChildren};
use crate::api::PlanNodeMutations;
use crate::cache::{Invalidate, QueryKey};
use crate::error::ApiError;
use crate::forms::{FieldErrors, PlanNodeForm};
use crate::model::{CreatePlanNodeDto, NodeId, PlanNode, Scenario, ScenarioId, UpdatePlanNodeDto};

const DELETE_FALLBACK: &str = "Failed to delete the node.";
const SAVE_FALLBACK: &str = "Failed to save the node.";

/// Which dialog, if any, is waiting on the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PendingDialog {
    #[default]
    Closed,
    CreatingRoot,
    CreatingChildOf(NodeId),
    Editing(NodeId),
    ConfirmingDelete(NodeId),
}

impl PendingDialog {
    pub fn is_open(&self) -> bool {
        !matches!(self, PendingDialog::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeTone {
    Info,
    Success,
    Warning,
    Error,
}

/// Message for the user about the last action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub tone: NoticeTone,
    pub message: String,
}

impl Notice {
    fn new(tone: NoticeTone, message: impl Into<String>) -> Self {
        Self {
            tone,
            message: message.into(),
        }
    }

    /// Errors must be acknowledged before the user carries on
    pub fn is_blocking(&self) -> bool {
        self.tone == NoticeTone::Error
    }
}

/// What a submitted plan-node form applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormTarget {
    Create {
        scenario_id: ScenarioId,
        parent_id: Option<NodeId>,
    },
    Edit {
        node_id: NodeId,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitAction {
    Create(CreatePlanNodeDto),
    Update(NodeId, UpdatePlanNodeDto),
}

/// A validated form ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitRequest {
    pub issued_from: PendingDialog,
    /// Generation of the dialog the form was submitted from
    pub dialog_seq: u64,
    pub action: SubmitAction,
}

#[derive(Debug)]
pub struct SubmitOutcome {
    pub issued_from: PendingDialog,
    pub dialog_seq: u64,
    pub result: Result<PlanNode, ApiError>,
}

#[derive(Debug)]
pub struct DeleteOutcome {
    pub node_id: NodeId,
    pub result: Result<(), ApiError>,
}

/// One line of the rendered explorer
#[derive(Debug, Clone, Copy)]
pub enum ExplorerRow<'a> {
    Node {
        depth: usize,
        node: &'a PlanNodeWithChildren,
        expanded: bool,
    },
    /// Marker under an expanded container with no children
    Empty { depth: usize },
}

impl<'a> ExplorerRow<'a> {
    pub fn node(&self) -> Option<&'a PlanNodeWithChildren> {
        match self {
            ExplorerRow::Node { node, .. } => Some(node),
            ExplorerRow::Empty { .. } => None,
        }
    }
}

/// Whether `selected` must not be edited while `current` is the current
/// scenario. Advisory only; the backend makes the final call.
pub fn compute_read_only(selected: Option<&PlanNode>, current: Option<&Scenario>) -> bool {
    match (selected, current) {
        (Some(node), Some(scenario)) => node.scenario_id != scenario.id,
        _ => false,
    }
}

/// Per-session UI state of the plan-node explorer
#[derive(Debug, Default)]
pub struct ExplorerState {
    expanded: HashSet<NodeId>,
    selected_id: Option<NodeId>,
    dialog: PendingDialog,
    /// Bumped whenever a dialog opens or closes, so two dialogs of the
    /// same kind are told apart
    dialog_seq: u64,
    form_errors: FieldErrors,
    notice: Option<Notice>,
}

impl ExplorerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: &NodeId) -> bool {
        self.expanded.contains(id)
    }

    pub fn selected_id(&self) -> Option<&NodeId> {
        self.selected_id.as_ref()
    }

    pub fn dialog(&self) -> &PendingDialog {
        &self.dialog
    }

    pub fn dialog_seq(&self) -> u64 {
        self.dialog_seq
    }

    pub fn form_errors(&self) -> &FieldErrors {
        &self.form_errors
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn selected_node<'a>(
        &self,
        forest: &'a [PlanNodeWithChildren],
    ) -> Option<&'a PlanNodeWithChildren> {
        self.selected_id.as_ref().and_then(|id| find_node(forest, id))
    }

    /// Open or close `node`. Nodes without a toggle are left alone.
    pub fn toggle_expand(&mut self, node: &PlanNodeWithChildren) {
        if !node.is_expandable() {
            return;
        }
        let id = &node.node.id;
        if !self.expanded.remove(id) {
            self.expanded.insert(id.clone());
        }
    }

    /// Select `node`; containers also toggle open/closed
    pub fn select_and_maybe_expand(&mut self, node: &PlanNodeWithChildren) {
        self.selected_id = Some(node.node.id.clone());
        if node.node.node_type.is_container() {
            self.toggle_expand(node);
        }
    }

    pub fn request_create(&mut self, parent: Option<&PlanNode>) {
        self.open(match parent {
            Some(parent) => PendingDialog::CreatingChildOf(parent.id.clone()),
            None => PendingDialog::CreatingRoot,
        });
    }

    /// Open the edit dialog; ignored for read-only nodes. Returns whether
    /// the dialog opened.
    pub fn request_edit(&mut self, node: &PlanNode, current: Option<&Scenario>) -> bool {
        if compute_read_only(Some(node), current) {
            debug!("Edit of read-only node {} ignored", node.id);
            return false;
        }
        self.open(PendingDialog::Editing(node.id.clone()));
        true
    }

    /// Open the delete confirmation; ignored for read-only nodes
    pub fn request_delete(&mut self, node: &PlanNode, current: Option<&Scenario>) -> bool {
        if compute_read_only(Some(node), current) {
            debug!("Delete of read-only node {} ignored", node.id);
            return false;
        }
        self.open(PendingDialog::ConfirmingDelete(node.id.clone()));
        true
    }

    pub fn cancel(&mut self) {
        self.open(PendingDialog::Closed);
    }

    fn open(&mut self, dialog: PendingDialog) {
        self.dialog = dialog;
        self.dialog_seq += 1;
        self.form_errors.clear();
    }

    /// Target of the open create/edit dialog, nodes going into `scenario_id`
    pub fn form_target(&self, scenario_id: &ScenarioId) -> Option<FormTarget> {
        match &self.dialog {
            PendingDialog::CreatingRoot => Some(FormTarget::Create {
                scenario_id: scenario_id.clone(),
                parent_id: None,
            }),
            PendingDialog::CreatingChildOf(parent) => Some(FormTarget::Create {
                scenario_id: scenario_id.clone(),
                parent_id: Some(parent.clone()),
            }),
            PendingDialog::Editing(node_id) => Some(FormTarget::Edit {
                node_id: node_id.clone(),
            }),
            PendingDialog::Closed | PendingDialog::ConfirmingDelete(_) => None,
        }
    }

    /// Validate `form` for `target`. Invalid input is recorded as field
    /// errors and nothing is returned, so no call goes out.
    pub fn prepare_submit(&mut self, form: &PlanNodeForm, target: &FormTarget) -> Option<SubmitRequest> {
        let action = match target {
            FormTarget::Create {
                scenario_id,
                parent_id,
            } => form
                .to_create_dto(scenario_id, parent_id.as_ref())
                .map(SubmitAction::Create),
            FormTarget::Edit { node_id } => form
                .to_update_dto()
                .map(|dto| SubmitAction::Update(node_id.clone(), dto)),
        };

        match action {
            Ok(action) => {
                self.form_errors.clear();
                Some(SubmitRequest {
                    issued_from: self.dialog.clone(),
                    dialog_seq: self.dialog_seq,
                    action,
                })
            }
            Err(errors) => {
                debug!("Form rejected locally: {}", errors);
                self.form_errors = errors;
                None
            }
        }
    }

    pub fn finish_submit(&mut self, outcome: SubmitOutcome, cache: &mut impl Invalidate) {
        match outcome.result {
            Ok(node) => {
                info!("Saved plan node {} ({})", node.id, node.title);
                if self.dialog == outcome.issued_from && self.dialog_seq == outcome.dialog_seq {
                    self.cancel();
                }
                cache.invalidate(QueryKey::PlanNodes);
                self.notice = Some(Notice::new(
                    NoticeTone::Success,
                    format!("Saved \"{}\"", node.title),
                ));
            }
            Err(err) if err.is_not_implemented() => {
                warn!("{}", err);
                self.notice = Some(Notice::new(NoticeTone::Warning, err.to_string()));
            }
            Err(err) => {
                warn!("Saving plan node failed: {}", err);
                self.notice = Some(Notice::new(NoticeTone::Error, err.user_message(SAVE_FALLBACK)));
            }
        }
    }

    /// Validate, send and apply a form in one go. Returns whether it was
    /// saved.
    pub async fn submit_form<M: PlanNodeMutations + ?Sized>(
        &mut self,
        form: &PlanNodeForm,
        target: &FormTarget,
        api: &M,
        cache: &mut impl Invalidate,
    ) -> bool {
        let Some(request) = self.prepare_submit(form, target) else {
            return false;
        };
        let outcome = execute_submit(api, request).await;
        let saved = outcome.result.is_ok();
        self.finish_submit(outcome, cache);
        saved
    }

    pub fn finish_delete(&mut self, outcome: DeleteOutcome, cache: &mut impl Invalidate) {
        let pending = PendingDialog::ConfirmingDelete(outcome.node_id.clone());
        match outcome.result {
            Ok(()) => {
                info!("Deleted plan node {}", outcome.node_id);
                if self.selected_id.as_ref() == Some(&outcome.node_id) {
                    self.selected_id = None;
                }
                self.expanded.remove(&outcome.node_id);
                if self.dialog == pending {
                    self.cancel();
                }
                cache.invalidate(QueryKey::PlanNodes);
                self.notice = Some(Notice::new(NoticeTone::Success, "Node deleted"));
            }
            Err(err) => {
                warn!("Deleting plan node {} failed: {}", outcome.node_id, err);
                self.notice = Some(Notice::new(
                    NoticeTone::Error,
                    err.user_message(DELETE_FALLBACK),
                ));
            }
        }
    }

    /// Delete `node` and apply the result. Not retried on failure.
    pub async fn confirm_delete<M: PlanNodeMutations + ?Sized>(
        &mut self,
        node: &PlanNode,
        api: &M,
        cache: &mut impl Invalidate,
    ) -> bool {
        let outcome = execute_delete(api, node.id.clone()).await;
        let deleted = outcome.result.is_ok();
        self.finish_delete(outcome, cache);
        deleted
    }

    /// Drop selection and expansion of ids no longer in `forest`
    pub fn sync_with_tree(&mut self, forest: &[PlanNodeWithChildren]) {
        if let Some(id) = &self.selected_id {
            if find_node(forest, id).is_none() {
                self.selected_id = None;
            }
        }
        self.expanded.retain(|id| find_node(forest, id).is_some());
    }

    /// Rows currently on screen, top to bottom
    pub fn visible_rows<'a>(&self, forest: &'a [PlanNodeWithChildren]) -> Vec<ExplorerRow<'a>> {
        let mut rows = Vec::new();
        self.push_rows(forest, 0, &mut rows);
        rows
    }

    fn push_rows<'a>(
        &self,
        siblings: &'a [PlanNodeWithChildren],
        depth: usize,
        rows: &mut Vec<ExplorerRow<'a>>,
    ) {
        for node in siblings {
            let expanded = node.is_expandable() && self.is_expanded(&node.node.id);
            rows.push(ExplorerRow::Node {
                depth,
                node,
                expanded,
            });
            if !expanded {
                continue;
            }
            if node.has_children() {
                self.push_rows(&node.children, depth + 1, rows);
            } else {
                rows.push(ExplorerRow::Empty { depth: depth + 1 });
            }
        }
    }
}

pub async fn execute_submit<M: PlanNodeMutations + ?Sized>(
    api: &M,
    request: SubmitRequest,
) -> SubmitOutcome {
    let result = match &request.action {
        SubmitAction::Create(dto) => api.create_plan_node(dto).await,
        SubmitAction::Update(id, dto) => api.update_plan_node(id, dto).await,
    };
    SubmitOutcome {
        issued_from: request.issued_from,
        dialog_seq: request.dialog_seq,
        result,
    }
}

pub async fn execute_delete<M: PlanNodeMutations + ?Sized>(api: &M, node_id: NodeId) -> DeleteOutcome {
    let result = api.delete_plan_node(&node_id).await;
    DeleteOutcome { node_id, result }
}
