//! Scenarios view - list, activate and roll over scenarios

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Paragraph, Row, Table, TableState};
use ratatui::Frame;

use crate::cache::Query;
use crate::model::{Scenario, ScenarioId};
use crate::tui::ellipsize;
use crate::tui::widgets::{highlight_style, themed_block, COLOR_FOCUS, COLOR_MUTED, COLOR_PANEL};

#[derive(Default)]
pub struct ScenariosViewState {
    pub table_state: TableState,
}

impl ScenariosViewState {
    pub fn move_selection(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.table_state.select(None);
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1) as usize;
        self.table_state.select(Some(next));
    }

    pub fn selected<'a>(&self, scenarios: &'a Query<Vec<Scenario>>) -> Option<&'a Scenario> {
        let index = self.table_state.selected()?;
        scenarios.ready().and_then(|list| list.get(index))
    }
}

pub fn draw_scenarios_view(
    frame: &mut Frame<'_>,
    area: Rect,
    state: &mut ScenariosViewState,
    scenarios: &Query<Vec<Scenario>>,
    viewed: Option<&ScenarioId>,
) {
    let block = themed_block("Scenarios", COLOR_FOCUS);
    let scenarios = match scenarios {
        Query::Ready(list) => list,
        Query::Loading => {
            frame.render_widget(Paragraph::new("Loading scenarios…").block(block), area);
            return;
        }
        Query::Unavailable(message) => {
            frame.render_widget(
                Paragraph::new(message.clone())
                    .style(Style::default().fg(Color::Red))
                    .block(block),
                area,
            );
            return;
        }
    };
    if scenarios.is_empty() {
        frame.render_widget(
            Paragraph::new("No scenarios yet. Press n to create one.")
                .style(Style::default().fg(COLOR_MUTED))
                .block(block),
            area,
        );
        return;
    }
    if state.table_state.selected().is_none() {
        state.table_state.select(Some(0));
    }

    let headers = Row::new(vec!["", "Name", "Start", "End", "Status"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows = scenarios.iter().map(|scenario| {
        let status = match (scenario.is_current, scenario.is_locked) {
            (true, true) => "current, locked",
            (true, false) => "current",
            (false, true) => "locked",
            (false, false) => "",
        };
        let marker = if Some(&scenario.id) == viewed { "◉" } else { " " };
        let style = if scenario.is_current {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        Row::new(vec![
            marker.to_string(),
            ellipsize(&scenario.name, 40),
            scenario.start_date.to_string(),
            scenario.end_date.to_string(),
            status.to_string(),
        ])
        .style(style)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(1),
            Constraint::Percentage(45),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(16),
        ],
    )
    .header(headers)
    .block(block)
    .column_spacing(2)
    .style(Style::default().bg(COLOR_PANEL).fg(Color::White))
    .highlight_style(highlight_style());

    frame.render_stateful_widget(table, area, &mut state.table_state);
}
