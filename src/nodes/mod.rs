//! Plan-node hierarchy: tree building and the explorer workflow

pub mod explorer;
pub mod tree;

pub use explorer::{
    compute_read_only, execute_delete, execute_submit, DeleteOutcome, ExplorerRow, ExplorerState,
    FormTarget, Notice, NoticeTone, PendingDialog, SubmitOutcome,
};
pub use tree::{build_tree, build_tree_checked, find_node, PlanNodeWithChildren};
