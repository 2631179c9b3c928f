//! Backend interfaces consumed by the explorer, and their HTTP implementation

mod client;

pub use client::HttpApi;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::model::{
    CreatePlanNodeDto, NodeId, PlanNode, Scenario, ScenarioId, UpdatePlanNodeDto,
};

/// Read side: where flat node lists and the current scenario come from
#[async_trait]
pub trait PlanDataSource: Send + Sync {
    /// Nodes of one scenario. With no scenario there is nothing to show.
    async fn fetch_plan_nodes(
        &self,
        scenario_id: Option<&ScenarioId>,
    ) -> Result<Vec<PlanNode>, ApiError>;

    async fn fetch_current_scenario(&self) -> Result<Option<Scenario>, ApiError>;
}

/// Write side for plan nodes
#[async_trait]
pub trait PlanNodeMutations: Send + Sync {
    async fn create_plan_node(&self, dto: &CreatePlanNodeDto) -> Result<PlanNode, ApiError>;

    /// The backend exposes no update route yet; implementations answer
    /// [`ApiError::NotImplemented`]
    async fn update_plan_node(
        &self,
        id: &NodeId,
        dto: &UpdatePlanNodeDto,
    ) -> Result<PlanNode, ApiError>;

    async fn delete_plan_node(&self, id: &NodeId) -> Result<(), ApiError>;
}
