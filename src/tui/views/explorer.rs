//! Explorer view - plan-node tree with a detail panel

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::cache::Query;
use crate::model::{NodeId, PlanNode, Scenario};
use crate::nodes::{compute_read_only, ExplorerRow, ExplorerState, PlanNodeWithChildren};
use crate::output::{id_preview, node_glyph};
use crate::tui::widgets::{
    highlight_style, themed_block, COLOR_ACCENT, COLOR_FOCUS, COLOR_MUTED, COLOR_PANEL,
};
use crate::tui::{ellipsize, format_date, sanitize_text, wrap_text};

/// Cursor over the visible rows
#[derive(Default)]
pub struct ExplorerViewState {
    pub list_state: ListState,
}

impl ExplorerViewState {
    pub fn cursor(&self) -> Option<usize> {
        self.list_state.selected()
    }

    pub fn move_cursor(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.list_state.select(None);
            return;
        }
        let current = self.list_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1) as usize;
        self.list_state.select(Some(next));
    }

    /// Keep the cursor on a row after the tree changed
    pub fn clamp(&mut self, len: usize) {
        match self.list_state.selected() {
            _ if len == 0 => self.list_state.select(None),
            None => self.list_state.select(Some(0)),
            Some(index) if index >= len => self.list_state.select(Some(len - 1)),
            Some(_) => {}
        }
    }
}

/// Data the explorer view renders
pub struct ExplorerContext<'a> {
    pub forest: &'a Query<Vec<PlanNodeWithChildren>>,
    pub explorer: &'a ExplorerState,
    pub current: Option<&'a Scenario>,
    pub viewed_label: String,
    pub id_preview_chars: usize,
}

/// Text of one tree row
pub fn row_label(row: &ExplorerRow<'_>) -> String {
    match row {
        ExplorerRow::Node {
            depth,
            node,
            expanded,
        } => {
            let toggle = match (node.is_expandable(), expanded) {
                (false, _) => " ",
                (true, true) => "▾",
                (true, false) => "▸",
            };
            format!(
                "{}{} {} {}",
                "  ".repeat(*depth),
                toggle,
                node_glyph(node.node.node_type, *expanded),
                sanitize_text(&node.node.title)
            )
        }
        ExplorerRow::Empty { depth } => format!("{}  (Empty)", "  ".repeat(*depth)),
    }
}

fn draw_tree(frame: &mut Frame<'_>, area: Rect, view: &mut ExplorerViewState, ctx: &ExplorerContext<'_>) {
    let title = format!("Plan · {}", ctx.viewed_label);
    let block = themed_block(title, COLOR_FOCUS);

    let forest = match ctx.forest {
        Query::Ready(forest) => forest,
        Query::Loading => {
            frame.render_widget(Paragraph::new("Loading plan nodes…").block(block), area);
            return;
        }
        Query::Unavailable(message) => {
            let paragraph = Paragraph::new(vec![
                Line::styled("Could not load plan nodes", Style::default().fg(Color::Red)),
                Line::from(message.clone()),
            ])
            .block(block)
            .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }
    };

    if forest.is_empty() {
        let paragraph = Paragraph::new("No plan nodes yet. Press N to add a root node.")
            .style(Style::default().fg(COLOR_MUTED))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let selected = ctx.explorer.selected_id();
    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = ctx
        .explorer
        .visible_rows(forest)
        .iter()
        .map(|row| {
            let style = match row {
                ExplorerRow::Empty { .. } => Style::default().fg(COLOR_MUTED),
                ExplorerRow::Node { node, .. } if Some(&node.node.id) == selected => {
                    Style::default().fg(COLOR_FOCUS).add_modifier(Modifier::BOLD)
                }
                ExplorerRow::Node { .. } => Style::default(),
            };
            ListItem::new(Line::styled(ellipsize(&row_label(row), width), style))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .style(Style::default().bg(COLOR_PANEL).fg(Color::White))
        .highlight_style(highlight_style());
    frame.render_stateful_widget(list, area, &mut view.list_state);
}

/// Lines of the detail panel for `node`
pub fn detail_lines(node: &PlanNode, read_only: bool, id_chars: usize, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let mut header = vec![
        Span::styled(
            format!("[{}]", node.node_type.label()),
            Style::default().fg(Color::Blue),
        ),
        Span::raw(" "),
        Span::styled(
            format!("ID: {}", id_preview(node.id.as_str(), id_chars)),
            Style::default().fg(COLOR_MUTED),
        ),
    ];
    if read_only {
        header.push(Span::styled("  read-only", Style::default().fg(Color::Yellow)));
    }
    lines.push(Line::from(header));
    lines.push(Line::styled(
        sanitize_text(&node.title),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    lines.push(Line::default());

    lines.push(Line::from(vec![
        Span::styled("Created: ", Style::default().fg(COLOR_MUTED)),
        Span::raw(format_date(&node.created_at)),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Created by: ", Style::default().fg(COLOR_MUTED)),
        Span::raw(id_preview(&node.created_by, id_chars)),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Order: ", Style::default().fg(COLOR_MUTED)),
        Span::raw(node.display_order.to_string()),
    ]));
    lines.push(Line::default());

    lines.push(Line::styled(
        "Description",
        Style::default().add_modifier(Modifier::BOLD),
    ));
    match node.description.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(description) => {
            for line in wrap_text(description, width.max(10)) {
                lines.push(Line::from(format!("  {}", line)));
            }
        }
        None => lines.push(Line::styled(
            "  No description set.",
            Style::default().fg(COLOR_MUTED),
        )),
    }

    lines
}

fn draw_detail(frame: &mut Frame<'_>, area: Rect, ctx: &ExplorerContext<'_>) {
    let forest = ctx.forest.ready().map(Vec::as_slice).unwrap_or(&[]);
    let width = area.width.saturating_sub(6) as usize;
    let lines = match ctx.explorer.selected_node(forest) {
        Some(selected) => {
            let read_only = compute_read_only(Some(&selected.node), ctx.current);
            detail_lines(&selected.node, read_only, ctx.id_preview_chars, width)
        }
        None => vec![Line::styled(
            "Select a node to see its details",
            Style::default().fg(COLOR_MUTED),
        )],
    };

    let paragraph = Paragraph::new(lines)
        .style(Style::default().bg(COLOR_PANEL).fg(Color::White))
        .block(themed_block("Detail", COLOR_ACCENT))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Draw the full explorer view (tree + detail)
pub fn draw_explorer_view(
    frame: &mut Frame<'_>,
    area: Rect,
    view: &mut ExplorerViewState,
    ctx: &ExplorerContext<'_>,
) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)].as_ref())
        .split(area);

    draw_tree(frame, chunks[0], view, ctx);
    draw_detail(frame, chunks[1], ctx);
}

/// Node under the cursor, if the cursor is on a node row
pub fn node_at_cursor<'a>(
    explorer: &ExplorerState,
    forest: &'a [PlanNodeWithChildren],
    cursor: Option<usize>,
) -> Option<&'a PlanNodeWithChildren> {
    let index = cursor?;
    explorer.visible_rows(forest).get(index).and_then(|row| row.node())
}

/// Row index of `id` among the visible rows
pub fn row_of(explorer: &ExplorerState, forest: &[PlanNodeWithChildren], id: &NodeId) -> Option<usize> {
    explorer
        .visible_rows(forest)
        .iter()
        .position(|row| row.node().is_some_and(|node| &node.node.id == id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeType;
    use crate::nodes::build_tree;
    use crate::nodes::tree::tests::plan_node;

    fn forest() -> Vec<PlanNodeWithChildren> {
        let mut proj = plan_node("proj", None, 0);
        proj.title = "Checkout".to_string();
        let mut job = plan_node("job", Some("proj"), 0);
        job.node_type = NodeType::Job;
        job.title = "Build".to_string();
        let mut empty = plan_node("empty", None, 1);
        empty.title = "Later".to_string();
        build_tree(&[proj, job, empty])
    }

    #[test]
    fn test_row_labels_show_toggles_and_empty_marker() {
        let forest = forest();
        let mut explorer = ExplorerState::new();
        explorer.toggle_expand(&forest[0]);
        explorer.toggle_expand(&forest[1]);

        let labels: Vec<String> = explorer.visible_rows(&forest).iter().map(row_label).collect();
        assert_eq!(
            labels,
            vec!["▾ 📂 Checkout", "    ▣ Build", "▾ 📂 Later", "    (Empty)"]
        );
    }

    #[test]
    fn test_cursor_lookup() {
        let forest = forest();
        let mut explorer = ExplorerState::new();
        explorer.toggle_expand(&forest[0]);

        let at = node_at_cursor(&explorer, &forest, Some(1)).unwrap();
        assert_eq!(at.node.id, NodeId::from("job"));
        assert_eq!(row_of(&explorer, &forest, &NodeId::from("empty")), Some(2));
        assert!(node_at_cursor(&explorer, &forest, Some(9)).is_none());
    }

    #[test]
    fn test_detail_falls_back_without_description() {
        let node = plan_node("0f8c2b9e-4d1a-4c7e-9b3f-2a6d8e1c5f70", None, 0);
        let text: Vec<String> = detail_lines(&node, true, 18, 40)
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert!(text[0].contains("ID: 0f8c2b9e-4d1a-4c7e..."));
        assert!(text[0].contains("read-only"));
        assert!(text.iter().any(|line| line.contains("No description set.")));
    }

    #[test]
    fn test_cursor_clamps_to_rows() {
        let mut view = ExplorerViewState::default();
        view.clamp(3);
        assert_eq!(view.cursor(), Some(0));
        view.move_cursor(10, 3);
        assert_eq!(view.cursor(), Some(2));
        view.clamp(1);
        assert_eq!(view.cursor(), Some(0));
        view.clamp(0);
        assert_eq!(view.cursor(), None);
    }
}
