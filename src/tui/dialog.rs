//! Modal form and confirmation dialogs

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::forms::{FieldErrors, PlanNodeForm, ScenarioForm, ServiceForm};
use crate::model::{NodeType, Scenario, ScenarioId};
use crate::nodes::FormTarget;

use super::widgets::{centered_rect, themed_block, COLOR_FOCUS, COLOR_MUTED, COLOR_PANEL};

/// What a form dialog saves into
#[derive(Debug, Clone, PartialEq)]
pub enum FormKind {
    PlanNode(FormTarget),
    CreateScenario,
    EditScenario(ScenarioId),
    RolloverScenario(Scenario),
    CreateService,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    /// Picked with left/right
    NodeType(Option<NodeType>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub key: &'static str,
    pub label: &'static str,
    pub value: FieldValue,
}

impl FormField {
    fn text(key: &'static str, label: &'static str, value: &str) -> Self {
        Self {
            key,
            label,
            value: FieldValue::Text(value.to_string()),
        }
    }

    fn display(&self) -> String {
        match &self.value {
            FieldValue::Text(text) => text.clone(),
            FieldValue::NodeType(Some(node_type)) => {
                format!("◂ {} ▸", node_type.description())
            }
            FieldValue::NodeType(None) => "◂ select a type ▸".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormDialog {
    pub kind: FormKind,
    pub title: String,
    pub fields: Vec<FormField>,
    pub focus: usize,
    /// Validation errors for forms that are not plan nodes
    pub errors: FieldErrors,
    /// A save is in flight
    pub submitting: bool,
}

impl FormDialog {
    fn new(kind: FormKind, title: impl Into<String>, fields: Vec<FormField>) -> Self {
        Self {
            kind,
            title: title.into(),
            fields,
            focus: 0,
            errors: FieldErrors::new(),
            submitting: false,
        }
    }

    pub fn plan_node(target: FormTarget, form: &PlanNodeForm, title: impl Into<String>) -> Self {
        Self::new(
            FormKind::PlanNode(target),
            title,
            vec![
                FormField::text("title", "Title", &form.title),
                FormField {
                    key: "node_type",
                    label: "Type",
                    value: FieldValue::NodeType(form.node_type),
                },
                FormField::text("description", "Description", &form.description),
                FormField::text("display_order", "Display order", &form.display_order),
            ],
        )
    }

    pub fn scenario(kind: FormKind, form: &ScenarioForm, title: impl Into<String>) -> Self {
        Self::new(
            kind,
            title,
            vec![
                FormField::text("name", "Name", &form.name),
                FormField::text("description", "Description", &form.description),
                FormField::text("start_date", "Start date (YYYY-MM-DD)", &form.start_date),
                FormField::text("end_date", "End date (YYYY-MM-DD)", &form.end_date),
            ],
        )
    }

    pub fn service(form: &ServiceForm) -> Self {
        Self::new(
            FormKind::CreateService,
            "New service",
            vec![
                FormField::text("name", "Name", &form.name),
                FormField::text("slug", "Slug", &form.slug),
                FormField::text("display_order", "Display order", &form.display_order),
            ],
        )
    }

    fn text(&self, key: &str) -> String {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .and_then(|f| match &f.value {
                FieldValue::Text(text) => Some(text.clone()),
                FieldValue::NodeType(_) => None,
            })
            .unwrap_or_default()
    }

    pub fn to_plan_node_form(&self) -> PlanNodeForm {
        let node_type = self.fields.iter().find_map(|f| match f.value {
            FieldValue::NodeType(node_type) => Some(node_type),
            FieldValue::Text(_) => None,
        });
        PlanNodeForm {
            title: self.text("title"),
            node_type: node_type.flatten(),
            description: self.text("description"),
            display_order: self.text("display_order"),
        }
    }

    pub fn to_scenario_form(&self) -> ScenarioForm {
        ScenarioForm {
            name: self.text("name"),
            description: self.text("description"),
            start_date: self.text("start_date"),
            end_date: self.text("end_date"),
        }
    }

    pub fn to_service_form(&self) -> ServiceForm {
        ServiceForm {
            name: self.text("name"),
            slug: self.text("slug"),
            display_order: self.text("display_order"),
        }
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len().max(1);
    }

    pub fn prev_field(&mut self) {
        let len = self.fields.len().max(1);
        self.focus = (self.focus + len - 1) % len;
    }

    /// Step the focused choice field; text fields ignore it
    pub fn cycle_choice(&mut self, forward: bool) {
        if let Some(FormField {
            value: FieldValue::NodeType(node_type),
            ..
        }) = self.fields.get_mut(self.focus)
        {
            let next = match *node_type {
                Some(current) if forward => current.next(),
                Some(current) => current.prev(),
                None => NodeType::ALL[0],
            };
            *node_type = Some(next);
        }
    }

    pub fn input(&mut self, c: char) {
        if let Some(FormField {
            value: FieldValue::Text(text),
            ..
        }) = self.fields.get_mut(self.focus)
        {
            text.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(FormField {
            value: FieldValue::Text(text),
            ..
        }) = self.fields.get_mut(self.focus)
        {
            text.pop();
        }
    }
}

/// Draw `dialog` with `errors` under the offending fields
pub fn draw_form_dialog(frame: &mut Frame<'_>, area: Rect, dialog: &FormDialog, errors: &FieldErrors) {
    let popup = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup);

    let mut lines: Vec<Line> = Vec::new();
    for (index, field) in dialog.fields.iter().enumerate() {
        let focused = index == dialog.focus;
        let label_style = if focused {
            Style::default().fg(COLOR_FOCUS).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        lines.push(Line::from(Span::styled(field.label, label_style)));

        let cursor = if focused && matches!(field.value, FieldValue::Text(_)) {
            "▏"
        } else {
            ""
        };
        lines.push(Line::from(format!("  {}{}", field.display(), cursor)));

        if let Some(message) = errors.get(field.key) {
            lines.push(Line::from(Span::styled(
                format!("  {}", message),
                Style::default().fg(Color::Red),
            )));
        }
        lines.push(Line::default());
    }

    let footer = if dialog.submitting {
        "Saving…"
    } else {
        "Tab next field · ←/→ change type · Enter save · Esc cancel"
    };
    lines.push(Line::from(Span::styled(footer, Style::default().fg(COLOR_MUTED))));

    let paragraph = Paragraph::new(lines)
        .style(Style::default().bg(COLOR_PANEL).fg(Color::White))
        .block(themed_block(dialog.title.clone(), COLOR_FOCUS))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, popup);
}

/// Draw a yes/no question
pub fn draw_confirm(frame: &mut Frame<'_>, area: Rect, title: &str, question: &str, busy: bool) {
    let popup = centered_rect(50, 25, area);
    frame.render_widget(Clear, popup);
    let footer = if busy { "Working…" } else { "y confirm · n/Esc cancel" };
    let lines = vec![
        Line::from(question.to_string()),
        Line::default(),
        Line::from(Span::styled(footer, Style::default().fg(COLOR_MUTED))),
    ];
    let paragraph = Paragraph::new(lines)
        .style(Style::default().bg(COLOR_PANEL).fg(Color::White))
        .block(themed_block(title.to_string(), Color::Yellow))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, popup);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScenarioId;

    fn target() -> FormTarget {
        FormTarget::Create {
            scenario_id: ScenarioId::from("s-current"),
            parent_id: None,
        }
    }

    #[test]
    fn test_typing_goes_to_focused_text_field() {
        let mut dialog = FormDialog::plan_node(target(), &PlanNodeForm::default(), "New node");
        for c in "Launch".chars() {
            dialog.input(c);
        }
        dialog.next_field();
        dialog.input('x');
        dialog.next_field();
        dialog.input('y');
        dialog.backspace();
        dialog.input('z');

        let form = dialog.to_plan_node_form();
        assert_eq!(form.title, "Launch");
        assert_eq!(form.node_type, Some(NodeType::Project));
        assert_eq!(form.description, "z");
        assert_eq!(form.display_order, "0");
    }

    #[test]
    fn test_type_cycles_with_arrows() {
        let mut dialog = FormDialog::plan_node(target(), &PlanNodeForm::default(), "New node");
        dialog.cycle_choice(true);
        assert_eq!(dialog.to_plan_node_form().node_type, Some(NodeType::Project));

        dialog.focus = 1;
        dialog.cycle_choice(true);
        assert_eq!(
            dialog.to_plan_node_form().node_type,
            Some(NodeType::Project.next())
        );
        dialog.cycle_choice(false);
        assert_eq!(dialog.to_plan_node_form().node_type, Some(NodeType::Project));
    }

    #[test]
    fn test_focus_wraps_around() {
        let mut dialog = FormDialog::service(&ServiceForm::default());
        dialog.prev_field();
        assert_eq!(dialog.focus, 2);
        dialog.next_field();
        assert_eq!(dialog.focus, 0);
    }

    #[test]
    fn test_scenario_fields_round_trip() {
        let form = ScenarioForm {
            name: "FY26".to_string(),
            description: String::new(),
            start_date: "2026-04-01".to_string(),
            end_date: "2027-03-31".to_string(),
        };
        let dialog = FormDialog::scenario(FormKind::CreateScenario, &form, "New scenario");
        assert_eq!(dialog.to_scenario_form(), form);
    }
}
