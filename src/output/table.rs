use crate::model::{Scenario, Service, User};

pub fn scenario_table(scenarios: &[Scenario]) -> String {
    let mut out = String::new();
    if scenarios.is_empty() {
        out.push_str("No scenarios yet.\n");
        return out;
    }

    let name_width = scenarios
        .iter()
        .map(|s| s.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    out.push_str(&format!(
        "  {:<name_width$}  {:<10}  {:<10}  {:<8}  ID\n",
        "NAME", "START", "END", "STATUS"
    ));
    for scenario in scenarios {
        let marker = if scenario.is_current { "*" } else { " " };
        let status = if scenario.is_locked {
            "locked"
        } else if scenario.is_current {
            "current"
        } else {
            ""
        };
        out.push_str(&format!(
            "{} {:<name_width$}  {}  {}  {:<8}  {}\n",
            marker, scenario.name, scenario.start_date, scenario.end_date, status, scenario.id
        ));
    }
    out
}

pub fn service_table(services: &[Service]) -> String {
    let mut out = String::new();
    if services.is_empty() {
        out.push_str("No services yet.\n");
        return out;
    }

    let mut sorted: Vec<&Service> = services.iter().collect();
    sorted.sort_by_key(|s| s.display_order);

    let name_width = sorted
        .iter()
        .map(|s| s.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("NAME".len());
    let slug_width = sorted
        .iter()
        .map(|s| s.slug.len())
        .max()
        .unwrap_or(0)
        .max("SLUG".len());

    out.push_str(&format!(
        "{:>5}  {:<name_width$}  {:<slug_width$}  ID\n",
        "ORDER", "NAME", "SLUG"
    ));
    for service in sorted {
        out.push_str(&format!(
            "{:>5}  {:<name_width$}  {:<slug_width$}  {}\n",
            service.display_order, service.name, service.slug, service.id
        ));
    }
    out
}

pub fn user_summary(user: &User) -> String {
    let mut out = String::new();
    out.push_str(&format!("Name:  {}\n", user.name));
    out.push_str(&format!("Email: {}\n", user.email));
    out.push_str(&format!("Role:  {}\n", user.role.as_deref().unwrap_or("-")));
    out.push_str(&format!("ID:    {}\n", user.id));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScenarioId;
    use chrono::NaiveDate;

    fn scenario(name: &str, current: bool) -> Scenario {
        Scenario {
            id: ScenarioId::from(format!("id-{}", name)),
            name: name.to_string(),
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
    fn test_current_scenario_is_marked() {
        let table = scenario_table(&[scenario("FY25", true), scenario("FY26", false)]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("* FY25"));
        assert!(lines[1].contains("current"));
        assert!(lines[2].starts_with("  FY26"));
    }

    #[test]
    fn test_services_sorted_by_order() {
        let service = |name: &str, order| Service {
            id: name.to_string(),
            name: name.to_string(),
            slug: name.to_lowercase(),
            display_order: order,
            created_at: None,
            updated_at: None,
        };
        let table = service_table(&[service("Web", 2), service("Api", 1)]);
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[1].contains("Api"));
        assert!(lines[2].contains("Web"));
    }

    #[test]
    fn test_empty_lists() {
        assert_eq!(scenario_table(&[]), "No scenarios yet.\n");
        assert_eq!(service_table(&[]), "No services yet.\n");
    }
}
