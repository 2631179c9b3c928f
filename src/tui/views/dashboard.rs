//! Dashboard view - who is signed in and what is current

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use crate::cache::Query;
use crate::model::{current_scenario, Scenario, Service, User};
use crate::nodes::PlanNodeWithChildren;
use crate::tui::widgets::{themed_block, COLOR_FOCUS, COLOR_MUTED, COLOR_PANEL};

pub struct DashboardContext<'a> {
    pub user: &'a Query<User>,
    pub scenarios: &'a Query<Vec<Scenario>>,
    pub services: &'a Query<Vec<Service>>,
    pub forest: &'a Query<Vec<PlanNodeWithChildren>>,
}

fn heading(text: &'static str) -> Line<'static> {
    Line::styled(text, Style::default().add_modifier(Modifier::BOLD))
}

fn field(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<12}", label), Style::default().fg(COLOR_MUTED)),
        Span::raw(value),
    ])
}

fn pending<T>(query: &Query<T>) -> Option<Line<'static>> {
    match query {
        Query::Ready(_) => None,
        Query::Loading => Some(Line::styled("  Loading…", Style::default().fg(COLOR_MUTED))),
        Query::Unavailable(message) => Some(Line::styled(
            format!("  {}", message),
            Style::default().fg(Color::Red),
        )),
    }
}

pub fn dashboard_lines(ctx: &DashboardContext<'_>) -> Vec<Line<'static>> {
    let mut lines = vec![heading("Account")];
    match ctx.user.ready() {
        Some(user) => {
            lines.push(field("Name", user.name.clone()));
            lines.push(field("Email", user.email.clone()));
            lines.push(field("Role", user.role.clone().unwrap_or_else(|| "-".to_string())));
        }
        None => lines.extend(pending(ctx.user)),
    }
    lines.push(Line::default());

    lines.push(heading("Current scenario"));
    match ctx.scenarios.ready() {
        Some(scenarios) => match current_scenario(scenarios) {
            Some(current) => {
                lines.push(field("Name", current.name.clone()));
                lines.push(field(
                    "Period",
                    format!("{} to {}", current.start_date, current.end_date),
                ));
                if current.is_locked {
                    lines.push(field("Status", "locked".to_string()));
                }
            }
            None => lines.push(Line::styled(
                "  No current scenario. Activate one in the scenarios view.",
                Style::default().fg(Color::Yellow),
            )),
        },
        None => lines.extend(pending(ctx.scenarios)),
    }
    lines.push(Line::default());

    lines.push(heading("Totals"));
    let count = |query: Option<usize>| query.map_or_else(|| "…".to_string(), |n| n.to_string());
    lines.push(field("Scenarios", count(ctx.scenarios.ready().map(Vec::len))));
    lines.push(field("Services", count(ctx.services.ready().map(Vec::len))));
    lines.push(field(
        "Plan nodes",
        count(
            ctx.forest
                .ready()
                .map(|forest| forest.iter().map(PlanNodeWithChildren::subtree_len).sum()),
        ),
    ));

    lines
}

pub fn draw_dashboard_view(frame: &mut Frame<'_>, area: Rect, ctx: &DashboardContext<'_>) {
    let paragraph = Paragraph::new(dashboard_lines(ctx))
        .style(Style::default().bg(COLOR_PANEL).fg(Color::White))
        .block(themed_block("Dashboard", COLOR_FOCUS))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_dashboard_reports_loading_and_errors() {
        let user = Query::Unavailable("Not signed in or session expired; run `planctl login`".to_string());
        let ctx = DashboardContext {
            user: &user,
            scenarios: &Query::Ready(Vec::new()),
            services: &Query::Loading,
            forest: &Query::Ready(Vec::new()),
        };
        let lines = text(&dashboard_lines(&ctx));
        assert!(lines[1].contains("planctl login"));
        assert!(lines.iter().any(|l| l.contains("No current scenario")));
        assert!(lines.iter().any(|l| l.contains("Services") && l.contains('…')));
        assert!(lines.iter().any(|l| l.contains("Plan nodes") && l.ends_with('0')));
    }
}
