//! Plan node records and the node-type hierarchy rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ScenarioId;

/// Opaque plan node identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        NodeId(value)
    }
}

/// Kind of a plan node.
///
/// Containers group other nodes and are expandable even when empty;
/// entity types (`Job`, `AdjustmentBuffer`) carry entries directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum NodeType {
    Initiative,
    Project,
    SubProject,
    Job,
    AdjustmentBuffer,
}

impl NodeType {
    pub const ALL: [NodeType; 5] = [
        NodeType::Initiative,
        NodeType::Project,
        NodeType::SubProject,
        NodeType::Job,
        NodeType::AdjustmentBuffer,
    ];

    pub fn is_container(self) -> bool {
        matches!(
            self,
            NodeType::Initiative | NodeType::Project | NodeType::SubProject
        )
    }

    /// Parent/child pairs accepted by the backend
    pub fn can_be_child_of(self, parent: NodeType) -> bool {
        matches!(
            (parent, self),
            (NodeType::Initiative, NodeType::Project)
                | (NodeType::Project, NodeType::SubProject)
                | (NodeType::Project, NodeType::Job)
                | (NodeType::Project, NodeType::AdjustmentBuffer)
                | (NodeType::SubProject, NodeType::SubProject)
                | (NodeType::SubProject, NodeType::Job)
                | (NodeType::SubProject, NodeType::AdjustmentBuffer)
        )
    }

    pub fn can_be_root(self) -> bool {
        matches!(self, NodeType::Initiative)
    }

    /// Type preselected in the create form for a node under `parent`
    pub fn default_for_parent(parent: Option<NodeType>) -> NodeType {
        match parent {
            None => NodeType::Initiative,
            Some(parent) => NodeType::ALL
                .into_iter()
                .find(|candidate| candidate.can_be_child_of(parent))
                .unwrap_or(NodeType::Project),
        }
    }

    pub fn next(self) -> Self {
        match self {
            NodeType::Initiative => NodeType::Project,
            NodeType::Project => NodeType::SubProject,
            NodeType::SubProject => NodeType::Job,
            NodeType::Job => NodeType::AdjustmentBuffer,
            NodeType::AdjustmentBuffer => NodeType::Initiative,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            NodeType::Initiative => NodeType::AdjustmentBuffer,
            NodeType::Project => NodeType::Initiative,
            NodeType::SubProject => NodeType::Project,
            NodeType::Job => NodeType::SubProject,
            NodeType::AdjustmentBuffer => NodeType::Job,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NodeType::Initiative => "Initiative",
            NodeType::Project => "Project",
            NodeType::SubProject => "SubProject",
            NodeType::Job => "Job",
            NodeType::AdjustmentBuffer => "AdjustmentBuffer",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            NodeType::Initiative => "Initiative (strategy / domain)",
            NodeType::Project => "Project",
            NodeType::SubProject => "Sub Project",
            NodeType::Job => "Job (measure)",
            NodeType::AdjustmentBuffer => "Adjustment Buffer",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "initiative" => Ok(NodeType::Initiative),
            "project" => Ok(NodeType::Project),
            "subproject" => Ok(NodeType::SubProject),
            "job" => Ok(NodeType::Job),
            "adjustmentbuffer" | "buffer" => Ok(NodeType::AdjustmentBuffer),
            _ => Err(format!("Unknown node type: {}", s)),
        }
    }
}

/// A plan node as served by `GET /plan-nodes`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlanNode {
    pub id: NodeId,

    pub scenario_id: ScenarioId,

    #[serde(default)]
    pub parent_id: Option<NodeId>,

    /// Backend-assigned lineage key, passed through as received
    #[serde(default)]
    pub lineage_id: Option<String>,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    pub node_type: NodeType,

    #[serde(default)]
    pub display_order: i32,

    #[serde(default)]
    pub service_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_by: String,
}

/// Body of `POST /plan-nodes`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CreatePlanNodeDto {
    pub scenario_id: ScenarioId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,

    pub title: String,

    pub node_type: NodeType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub display_order: i32,
}

/// Partial update of a plan node
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UpdatePlanNodeDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_types() {
        assert!(NodeType::Initiative.is_container());
        assert!(NodeType::Project.is_container());
        assert!(NodeType::SubProject.is_container());
        assert!(!NodeType::Job.is_container());
        assert!(!NodeType::AdjustmentBuffer.is_container());
    }

    #[test]
    fn test_hierarchy_rules() {
        assert!(NodeType::Project.can_be_child_of(NodeType::Initiative));
        assert!(NodeType::SubProject.can_be_child_of(NodeType::SubProject));
        assert!(!NodeType::Job.can_be_child_of(NodeType::Initiative));
        assert!(!NodeType::Project.can_be_child_of(NodeType::Job));
        assert!(NodeType::Initiative.can_be_root());
        assert!(!NodeType::Project.can_be_root());
    }

    #[test]
    fn test_default_for_parent() {
        assert_eq!(NodeType::default_for_parent(None), NodeType::Initiative);
        assert_eq!(
            NodeType::default_for_parent(Some(NodeType::Initiative)),
            NodeType::Project
        );
        assert_eq!(
            NodeType::default_for_parent(Some(NodeType::Project)),
            NodeType::SubProject
        );
        assert_eq!(
            NodeType::default_for_parent(Some(NodeType::Job)),
            NodeType::Project
        );
    }

    #[test]
    fn test_parse_node_type() {
        assert_eq!("sub-project".parse::<NodeType>(), Ok(NodeType::SubProject));
        assert_eq!(
            "AdjustmentBuffer".parse::<NodeType>(),
            Ok(NodeType::AdjustmentBuffer)
        );
        assert!("task".parse::<NodeType>().is_err());
    }

    #[test]
    fn test_deserialize_backend_node() {
        let json = r#"{
            "id": "5d1c",
            "scenario_id": "s-1",
            "parent_id": null,
            "lineage_id": "l-1",
            "title": "Growth",
            "description": null,
            "node_type": "Initiative",
            "display_order": 3,
            "service_id": null,
            "created_at": "2025-04-01T09:00:00Z",
            "updated_at": "2025-04-01T09:00:00Z",
            "created_by": "u-1",
            "updated_by": "u-1"
        }"#;

        let node: PlanNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.id, NodeId::from("5d1c"));
        assert_eq!(node.node_type, NodeType::Initiative);
        assert_eq!(node.display_order, 3);
        assert!(node.parent_id.is_none());
    }

    #[test]
    fn test_create_dto_omits_absent_fields() {
        let dto = CreatePlanNodeDto {
            scenario_id: ScenarioId::from("s-1"),
            parent_id: None,
            title: "Root".to_string(),
            node_type: NodeType::Initiative,
            description: None,
            display_order: 0,
        };

        let value = serde_json::to_value(&dto).unwrap();
        assert!(value.get("parent_id").is_none());
        assert!(value.get("description").is_none());
        assert_eq!(value["node_type"], "Initiative");
    }
}
