//! Background API calls for the TUI
//!
//! Every call runs on the tokio runtime and reports back through an
//! unbounded channel the event loop drains between frames.

use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::api::{HttpApi, PlanDataSource};
use crate::cache::QueryKey;
use crate::error::ApiError;
use crate::model::{
    CreateScenarioDto, CreateServiceDto, NodeId, PlanNode, RolloverScenarioDto, Scenario,
    ScenarioId, Service, UpdateScenarioDto, User,
};
use crate::nodes::explorer::SubmitRequest;
use crate::nodes::{execute_delete, execute_submit, DeleteOutcome, SubmitOutcome};

/// Scenario and service changes made outside the explorer
#[derive(Debug, Clone)]
pub enum AdminRequest {
    ActivateScenario(Scenario),
    CreateScenario(CreateScenarioDto),
    UpdateScenario(ScenarioId, UpdateScenarioDto),
    DeleteScenario(Scenario),
    RolloverScenario(Scenario, RolloverScenarioDto),
    CreateService(CreateServiceDto),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminKind {
    ActivateScenario,
    CreateScenario,
    UpdateScenario,
    DeleteScenario,
    RolloverScenario,
    CreateService,
}

impl AdminKind {
    /// Queries a successful change makes stale
    pub fn invalidates(self) -> &'static [QueryKey] {
        match self {
            AdminKind::ActivateScenario | AdminKind::RolloverScenario => {
                &[QueryKey::Scenarios, QueryKey::PlanNodes]
            }
            AdminKind::CreateScenario | AdminKind::UpdateScenario | AdminKind::DeleteScenario => {
                &[QueryKey::Scenarios]
            }
            AdminKind::CreateService => &[QueryKey::Services],
        }
    }

    fn failure(self) -> &'static str {
        match self {
            AdminKind::ActivateScenario => "Failed to activate the scenario.",
            AdminKind::CreateScenario => "Failed to create the scenario.",
            AdminKind::UpdateScenario => "Failed to update the scenario.",
            AdminKind::DeleteScenario => "Failed to delete the scenario.",
            AdminKind::RolloverScenario => "Failed to roll the scenario over.",
            AdminKind::CreateService => "Failed to create the service.",
        }
    }
}

impl AdminRequest {
    pub fn kind(&self) -> AdminKind {
        match self {
            AdminRequest::ActivateScenario(_) => AdminKind::ActivateScenario,
            AdminRequest::CreateScenario(_) => AdminKind::CreateScenario,
            AdminRequest::UpdateScenario(..) => AdminKind::UpdateScenario,
            AdminRequest::DeleteScenario(_) => AdminKind::DeleteScenario,
            AdminRequest::RolloverScenario(..) => AdminKind::RolloverScenario,
            AdminRequest::CreateService(_) => AdminKind::CreateService,
        }
    }
}

#[derive(Debug)]
pub struct AdminOutcome {
    pub kind: AdminKind,
    /// Success message for the status bar
    pub result: Result<String, ApiError>,
}

impl AdminOutcome {
    pub fn error_message(&self) -> Option<String> {
        self.result
            .as_ref()
            .err()
            .map(|err| err.user_message(self.kind.failure()))
    }
}

#[derive(Debug)]
pub enum Completion {
    User(Result<User, ApiError>),
    Scenarios(Result<Vec<Scenario>, ApiError>),
    Services(Result<Vec<Service>, ApiError>),
    PlanNodes {
        /// Scenario explicitly viewed when the fetch went out
        requested: Option<ScenarioId>,
        /// Scenario the nodes belong to
        resolved: Option<ScenarioId>,
        result: Result<Vec<PlanNode>, ApiError>,
    },
    NodeSubmitted(SubmitOutcome),
    NodeDeleted(DeleteOutcome),
    Admin(AdminOutcome),
}

/// Spawns API calls and routes their results to the event loop
#[derive(Clone)]
pub struct Tasks {
    api: Arc<HttpApi>,
    handle: Handle,
    tx: UnboundedSender<Completion>,
}

impl Tasks {
    pub fn new(api: Arc<HttpApi>, handle: Handle, tx: UnboundedSender<Completion>) -> Self {
        Self { api, handle, tx }
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            if tx.send(task.await).is_err() {
                debug!("TUI closed before a background call finished");
            }
        });
    }

    /// Refetch `key`. Plan nodes come from `viewed`, or the current
    /// scenario when none is picked.
    pub fn fetch(&self, key: QueryKey, viewed: Option<ScenarioId>) {
        let api = Arc::clone(&self.api);
        match key {
            QueryKey::CurrentUser => self.spawn(async move { Completion::User(api.me().await) }),
            QueryKey::Scenarios => {
                self.spawn(async move { Completion::Scenarios(api.list_scenarios().await) })
            }
            QueryKey::Services => {
                self.spawn(async move { Completion::Services(api.list_services().await) })
            }
            QueryKey::PlanNodes => self.spawn(async move {
                let resolved = match &viewed {
                    Some(id) => Ok(Some(id.clone())),
                    None => api
                        .fetch_current_scenario()
                        .await
                        .map(|current| current.map(|s| s.id)),
                };
                match resolved {
                    Ok(resolved) => {
                        let result = api.fetch_plan_nodes(resolved.as_ref()).await;
                        Completion::PlanNodes {
                            requested: viewed,
                            resolved,
                            result,
                        }
                    }
                    Err(err) => Completion::PlanNodes {
                        requested: viewed,
                        resolved: None,
                        result: Err(err),
                    },
                }
            }),
        }
    }

    pub fn submit_node(&self, request: SubmitRequest) {
        let api = Arc::clone(&self.api);
        self.spawn(async move { Completion::NodeSubmitted(execute_submit(api.as_ref(), request).await) });
    }

    pub fn delete_node(&self, node_id: NodeId) {
        let api = Arc::clone(&self.api);
        self.spawn(async move { Completion::NodeDeleted(execute_delete(api.as_ref(), node_id).await) });
    }

    pub fn admin(&self, request: AdminRequest) {
        let api = Arc::clone(&self.api);
        self.spawn(async move { Completion::Admin(run_admin(&api, request).await) });
    }
}

async fn run_admin(api: &HttpApi, request: AdminRequest) -> AdminOutcome {
    let kind = request.kind();
    let result = match request {
        AdminRequest::ActivateScenario(scenario) => api
            .activate_scenario(&scenario.id)
            .await
            .map(|()| format!("\"{}\" is now the current scenario", scenario.name)),
        AdminRequest::CreateScenario(dto) => api
            .create_scenario(&dto)
            .await
            .map(|created| format!("Created scenario \"{}\"", created.name)),
        AdminRequest::UpdateScenario(id, dto) => api
            .update_scenario(&id, &dto)
            .await
            .map(|updated| format!("Updated scenario \"{}\"", updated.name)),
        AdminRequest::DeleteScenario(scenario) => api
            .delete_scenario(&scenario.id)
            .await
            .map(|()| format!("Deleted scenario \"{}\"", scenario.name)),
        AdminRequest::RolloverScenario(source, dto) => api
            .rollover_scenario(&source.id, &dto)
            .await
            .map(|created| format!("Created \"{}\" from \"{}\"", created.name, source.name)),
        AdminRequest::CreateService(dto) => api
            .create_service(&dto)
            .await
            .map(|created| format!("Created service \"{}\"", created.name)),
    };
    AdminOutcome { kind, result }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_switches_refresh_plan_nodes() {
        assert!(AdminKind::ActivateScenario
            .invalidates()
            .contains(&QueryKey::PlanNodes));
        assert!(AdminKind::RolloverScenario
            .invalidates()
            .contains(&QueryKey::PlanNodes));
        assert_eq!(AdminKind::UpdateScenario.invalidates(), &[QueryKey::Scenarios]);
        assert_eq!(AdminKind::CreateService.invalidates(), &[QueryKey::Services]);
    }

    #[test]
    fn test_admin_error_message_prefers_server_text() {
        let outcome = AdminOutcome {
            kind: AdminKind::ActivateScenario,
            result: Err(ApiError::Rejected {
                status: 400,
                message: Some("Scenario is locked".to_string()),
            }),
        };
        assert_eq!(outcome.error_message().as_deref(), Some("Scenario is locked"));

        let outcome = AdminOutcome {
            kind: AdminKind::DeleteScenario,
            result: Err(ApiError::Rejected {
                status: 500,
                message: None,
            }),
        };
        assert_eq!(
            outcome.error_message().as_deref(),
            Some("Failed to delete the scenario.")
        );
    }
}
