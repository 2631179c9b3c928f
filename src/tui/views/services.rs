//! Services view

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Paragraph, Row, Table, TableState};
use ratatui::Frame;

use crate::cache::Query;
use crate::model::Service;
use crate::tui::ellipsize;
use crate::tui::widgets::{highlight_style, themed_block, COLOR_FOCUS, COLOR_MUTED, COLOR_PANEL};

#[derive(Default)]
pub struct ServicesViewState {
    pub table_state: TableState,
}

impl ServicesViewState {
    pub fn move_selection(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.table_state.select(None);
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1) as usize;
        self.table_state.select(Some(next));
    }
}

pub fn draw_services_view(
    frame: &mut Frame<'_>,
    area: Rect,
    state: &mut ServicesViewState,
    services: &Query<Vec<Service>>,
) {
    let block = themed_block("Services", COLOR_FOCUS);
    let services = match services {
        Query::Ready(list) => list,
        Query::Loading => {
            frame.render_widget(Paragraph::new("Loading services…").block(block), area);
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
    if services.is_empty() {
        frame.render_widget(
            Paragraph::new("No services yet. Press n to create one.")
                .style(Style::default().fg(COLOR_MUTED))
                .block(block),
            area,
        );
        return;
    }

    let mut sorted: Vec<&Service> = services.iter().collect();
    sorted.sort_by_key(|s| s.display_order);

    let headers = Row::new(vec!["Order", "Name", "Slug"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = sorted.iter().map(|service| {
        Row::new(vec![
            service.display_order.to_string(),
            ellipsize(&service.name, 40),
            service.slug.clone(),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Percentage(50),
            Constraint::Percentage(40),
        ],
    )
    .header(headers)
    .block(block)
    .column_spacing(2)
    .style(Style::default().bg(COLOR_PANEL).fg(Color::White))
    .highlight_style(highlight_style());

    frame.render_stateful_widget(table, area, &mut state.table_state);
}
