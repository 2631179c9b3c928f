use crate::model::{CreatePlanNodeDto, NodeId, NodeType, PlanNode, ScenarioId, UpdatePlanNodeDto};

use super::{optional_text, parse_order, FieldErrors};

/// Raw values of the plan node create/edit dialog
#[derive(Debug, Clone, PartialEq)]
pub struct PlanNodeForm {
    pub title: String,
    /// `None` until the user picks a type
    pub node_type: Option<NodeType>,
    pub description: String,
    pub display_order: String,
}

impl Default for PlanNodeForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            node_type: Some(NodeType::Project),
            description: String::new(),
            display_order: "0".to_string(),
        }
    }
}

impl PlanNodeForm {
    /// Blank form for a new node under `parent`
    pub fn for_create(parent: Option<&PlanNode>) -> Self {
        Self {
            node_type: Some(NodeType::default_for_parent(parent.map(|p| p.node_type))),
            ..Self::default()
        }
    }

    /// Form prefilled from an existing node
    pub fn for_edit(node: &PlanNode) -> Self {
        Self {
            title: node.title.clone(),
            node_type: Some(node.node_type),
            description: node.description.clone().unwrap_or_default(),
            display_order: node.display_order.to_string(),
        }
    }

    fn check(&self) -> (FieldErrors, i32) {
        let mut errors = FieldErrors::new();
        if self.title.trim().is_empty() {
            errors.add("title", "Title is required");
        }
        if self.node_type.is_none() {
            errors.add("node_type", "Select a node type");
        }
        let order = match parse_order(&self.display_order) {
            Ok(order) => order,
            Err(msg) => {
                errors.add("display_order", msg);
                0
            }
        };
        (errors, order)
    }

    pub fn to_create_dto(
        &self,
        scenario_id: &ScenarioId,
        parent_id: Option<&NodeId>,
    ) -> Result<CreatePlanNodeDto, FieldErrors> {
        let (mut errors, display_order) = self.check();
        let node_type = self.node_type.unwrap_or(NodeType::Project);
        if parent_id.is_none() && self.node_type.is_some() && !node_type.can_be_root() {
            errors.add("node_type", "Only an initiative can be a root node");
        }
        errors.into_result(CreatePlanNodeDto {
            scenario_id: scenario_id.clone(),
            parent_id: parent_id.cloned(),
            title: self.title.trim().to_string(),
            node_type,
            description: optional_text(&self.description),
            display_order,
        })
    }

    pub fn to_update_dto(&self) -> Result<UpdatePlanNodeDto, FieldErrors> {
        let (errors, display_order) = self.check();
        errors.into_result(UpdatePlanNodeDto {
            title: Some(self.title.trim().to_string()),
            description: optional_text(&self.description),
            display_order: Some(display_order),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_create() {
        let form = PlanNodeForm {
            title: "  Platform  ".to_string(),
            node_type: Some(NodeType::Project),
            description: " ".to_string(),
            display_order: "4".to_string(),
        };

        let dto = form
            .to_create_dto(&ScenarioId::from("s-1"), Some(&NodeId::from("p")))
            .unwrap();
        assert_eq!(dto.title, "Platform");
        assert_eq!(dto.display_order, 4);
        assert_eq!(dto.parent_id, Some(NodeId::from("p")));
        assert!(dto.description.is_none());
    }

    #[test]
    fn test_every_bad_field_reported() {
        let form = PlanNodeForm {
            title: String::new(),
            node_type: None,
            description: String::new(),
            display_order: "abc".to_string(),
        };

        let errors = form.to_create_dto(&ScenarioId::from("s-1"), None).unwrap_err();
        assert_eq!(errors.get("title"), Some("Title is required"));
        assert_eq!(errors.get("node_type"), Some("Select a node type"));
        assert_eq!(errors.get("display_order"), Some("Display order must be a number"));
    }

    #[test]
    fn test_root_must_be_initiative() {
        let form = PlanNodeForm {
            title: "Platform".to_string(),
            ..PlanNodeForm::default()
        };
        let errors = form.to_create_dto(&ScenarioId::from("s-1"), None).unwrap_err();
        assert_eq!(errors.get("node_type"), Some("Only an initiative can be a root node"));

        let root = PlanNodeForm {
            node_type: Some(NodeType::Initiative),
            ..form.clone()
        };
        assert!(root.to_create_dto(&ScenarioId::from("s-1"), None).is_ok());
        assert!(form
            .to_create_dto(&ScenarioId::from("s-1"), Some(&NodeId::from("p")))
            .is_ok());
    }

    #[test]
    fn test_create_defaults_follow_parent_type() {
        assert_eq!(PlanNodeForm::for_create(None).node_type, Some(NodeType::Initiative));

        let mut parent = crate::nodes::tree::tests::plan_node("p", None, 0);
        parent.node_type = NodeType::Initiative;
        assert_eq!(
            PlanNodeForm::for_create(Some(&parent)).node_type,
            Some(NodeType::Project)
        );
    }
}
