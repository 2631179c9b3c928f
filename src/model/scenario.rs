use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque scenario identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ScenarioId(pub String);

impl ScenarioId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScenarioId {
    fn from(value: &str) -> Self {
        ScenarioId(value.to_string())
    }
}

impl From<String> for ScenarioId {
    fn from(value: String) -> Self {
        ScenarioId(value)
    }
}

/// A named, dated planning universe
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Scenario {
    pub id: ScenarioId,
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    #[serde(default)]
    pub is_locked: bool,

    #[serde(default)]
    pub is_current: bool,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub updated_by: Option<String>,
}

/// The scenario flagged as current, if any
pub fn current_scenario(scenarios: &[Scenario]) -> Option<&Scenario> {
    scenarios.iter().find(|s| s.is_current)
}

/// Body of `POST /scenarios`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CreateScenarioDto {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Body of `PATCH /scenarios/{id}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UpdateScenarioDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

/// Body of `POST /scenarios/{id}/rollover`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RolloverScenarioDto {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl RolloverScenarioDto {
    /// Next-year copy of `source`: same span shifted by twelve months
    pub fn next_year(source: &Scenario) -> Self {
        let shift = |date: NaiveDate| date.checked_add_months(Months::new(12)).unwrap_or(date);
        Self {
            name: format!("Next Year Plan (from {})", source.name),
            start_date: shift(source.start_date),
            end_date: shift(source.end_date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(id: &str, current: bool) -> Scenario {
        Scenario {
            id: ScenarioId::from(id),
            name: format!("FY {}", id),
            description: None,
            start_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            is_locked: false,
            is_current: current,
            created_at: None,
            updated_at: None,
            created_by: None,
            updated_by: None,
        }
    }

    #[test]
    fn test_current_scenario_lookup() {
        let scenarios = vec![scenario("a", false), scenario("b", true)];
        assert_eq!(current_scenario(&scenarios).unwrap().id, ScenarioId::from("b"));
        assert!(current_scenario(&scenarios[..1]).is_none());
    }

    #[test]
    fn test_rollover_defaults() {
        let dto = RolloverScenarioDto::next_year(&scenario("a", true));
        assert_eq!(dto.name, "Next Year Plan (from FY a)");
        assert_eq!(dto.start_date, NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
        assert_eq!(dto.end_date, NaiveDate::from_ymd_opt(2027, 3, 31).unwrap());
    }

    #[test]
    fn test_rollover_clamps_leap_day() {
        let mut source = scenario("leap", false);
        source.end_date = NaiveDate::from_ymd_opt(2028, 2, 29).unwrap();
        let dto = RolloverScenarioDto::next_year(&source);
        assert_eq!(dto.end_date, NaiveDate::from_ymd_opt(2029, 2, 28).unwrap());
    }
}
