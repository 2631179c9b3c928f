use crate::nodes::PlanNodeWithChildren;

use super::node_glyph;

/// Indented outline of the whole forest, everything expanded
pub fn render_tree(forest: &[PlanNodeWithChildren]) -> String {
    let mut out = String::new();
    if forest.is_empty() {
        out.push_str("(no plan nodes)\n");
        return out;
    }
    for node in forest {
        push_node(&mut out, node, 0);
    }
    out
}

fn push_node(out: &mut String, node: &PlanNodeWithChildren, depth: usize) {
    let indent = "  ".repeat(depth);
    out.push_str(&format!(
        "{}{} {} [{}] ({})\n",
        indent,
        node_glyph(node.node.node_type, node.has_children()),
        node.node.title,
        node.node.node_type.label(),
        node.node.id
    ));
    if node.node.node_type.is_container() && !node.has_children() {
        out.push_str(&format!("{}  (Empty)\n", indent));
    }
    for child in &node.children {
        push_node(out, child, depth + 1);
    }
}

pub fn render_tree_json(forest: &[PlanNodeWithChildren]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(forest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeType;
    use crate::nodes::build_tree;
    use crate::nodes::tree::tests::plan_node;

    #[test]
    fn test_outline_indents_children() {
        let mut job = plan_node("job", Some("proj"), 0);
        job.node_type = NodeType::Job;
        job.title = "Build".to_string();
        let mut proj = plan_node("proj", None, 0);
        proj.title = "Checkout".to_string();
        let mut empty = plan_node("empty", None, 1);
        empty.title = "Later".to_string();

        let text = render_tree(&build_tree(&[job, proj, empty]));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "📂 Checkout [Project] (proj)");
        assert_eq!(lines[1], "  ▣ Build [Job] (job)");
        assert_eq!(lines[2], "📁 Later [Project] (empty)");
        assert_eq!(lines[3], "  (Empty)");
    }

    #[test]
    fn test_json_flattens_node_fields() {
        let forest = build_tree(&[plan_node("a", None, 0), plan_node("b", Some("a"), 0)]);
        let value: serde_json::Value = serde_json::from_str(&render_tree_json(&forest).unwrap()).unwrap();
        assert_eq!(value[0]["id"], "a");
        assert_eq!(value[0]["children"][0]["id"], "b");
        assert_eq!(value[0]["children"][0]["parent_id"], "a");
    }
}
