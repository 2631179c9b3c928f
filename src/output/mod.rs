//! Plain-text rendering shared by the CLI and the TUI

mod table;
mod tree;

pub use table::{scenario_table, service_table, user_summary};
pub use tree::{render_tree, render_tree_json};

use crate::model::NodeType;

/// Glyph shown in front of a node, folders open when expanded
pub fn node_glyph(node_type: NodeType, expanded: bool) -> &'static str {
    match node_type {
        NodeType::Initiative => "◈",
        NodeType::Project | NodeType::SubProject if expanded => "📂",
        NodeType::Project | NodeType::SubProject => "📁",
        NodeType::Job => "▣",
        NodeType::AdjustmentBuffer => "◌",
    }
}

/// First `chars` characters of an id, with an ellipsis when cut
pub fn id_preview(id: &str, chars: usize) -> String {
    match id.char_indices().nth(chars) {
        Some((cut, _)) => format!("{}...", &id[..cut]),
        None => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_preview_cuts_long_ids() {
        let id = "0f8c2b9e-4d1a-4c7e-9b3f-2a6d8e1c5f70";
        assert_eq!(id_preview(id, 18), "0f8c2b9e-4d1a-4c7e...");
        assert_eq!(id_preview("short", 18), "short");
        assert_eq!(id_preview("exactly18charslong", 18), "exactly18charslong");
    }

    #[test]
    fn test_folders_open_when_expanded() {
        assert_eq!(node_glyph(NodeType::Project, true), "📂");
        assert_eq!(node_glyph(NodeType::SubProject, false), "📁");
        assert_eq!(node_glyph(NodeType::Job, true), "▣");
    }
}
