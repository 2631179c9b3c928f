use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

use crate::model::{CreateScenarioDto, RolloverScenarioDto, Scenario, UpdateScenarioDto};

use super::{optional_text, FieldErrors};

static DATE_RE: OnceLock<Regex> = OnceLock::new();

fn date_re() -> &'static Regex {
    DATE_RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"))
}

/// Raw values of the scenario create/edit/rollover form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioForm {
    pub name: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
}

impl ScenarioForm {
    pub fn for_edit(scenario: &Scenario) -> Self {
        Self {
            name: scenario.name.clone(),
            description: scenario.description.clone().unwrap_or_default(),
            start_date: scenario.start_date.to_string(),
            end_date: scenario.end_date.to_string(),
        }
    }

    /// Prefilled with next-year defaults derived from `source`
    pub fn for_rollover(source: &Scenario) -> Self {
        let defaults = RolloverScenarioDto::next_year(source);
        Self {
            name: defaults.name,
            description: String::new(),
            start_date: defaults.start_date.to_string(),
            end_date: defaults.end_date.to_string(),
        }
    }

    fn check(&self) -> (FieldErrors, Option<(NaiveDate, NaiveDate)>) {
        let mut errors = FieldErrors::new();
        if self.name.trim().is_empty() {
            errors.add("name", "Scenario name is required");
        }
        let start = parse_date(&self.start_date, "start_date", "Start date", &mut errors);
        let end = parse_date(&self.end_date, "end_date", "End date", &mut errors);
        let range = match (start, end) {
            (Some(start), Some(end)) if end < start => {
                errors.add("end_date", "End date must not be before start date");
                None
            }
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        };
        (errors, range)
    }

    pub fn to_create_dto(&self) -> Result<CreateScenarioDto, FieldErrors> {
        match self.check() {
            (errors, Some((start_date, end_date))) if errors.is_empty() => Ok(CreateScenarioDto {
                name: self.name.trim().to_string(),
                description: optional_text(&self.description),
                start_date,
                end_date,
            }),
            (errors, _) => Err(errors),
        }
    }

    pub fn to_update_dto(&self) -> Result<UpdateScenarioDto, FieldErrors> {
        self.to_create_dto().map(|dto| UpdateScenarioDto {
            name: Some(dto.name),
            // Always sent so a cleared description reaches the backend
            description: Some(dto.description.unwrap_or_default()),
            start_date: Some(dto.start_date),
            end_date: Some(dto.end_date),
        })
    }

    pub fn to_rollover_dto(&self) -> Result<RolloverScenarioDto, FieldErrors> {
        self.to_create_dto().map(|dto| RolloverScenarioDto {
            name: dto.name,
            start_date: dto.start_date,
            end_date: dto.end_date,
        })
    }
}

fn parse_date(
    raw: &str,
    field: &'static str,
    label: &str,
    errors: &mut FieldErrors,
) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        errors.add(field, format!("{} is required", label));
        return None;
    }
    if !date_re().is_match(trimmed) {
        errors.add(field, "Enter a valid date (YYYY-MM-DD)");
        return None;
    }
    match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, "Enter a valid date (YYYY-MM-DD)");
            None
        }
    }
}
