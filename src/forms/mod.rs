//! Local form validation
//!
//! Forms hold raw text as typed by the user. `validate` turns them into
//! request bodies or per-field messages; no network call is made for a
//! form that fails validation.

mod login;
mod node;
mod scenario;
mod service;

pub use login::LoginForm;
pub use node::PlanNodeForm;
pub use scenario::ScenarioForm;
pub use service::ServiceForm;

use std::collections::BTreeMap;
use thiserror::Error;

/// Validation messages keyed by field name
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("{}", join_messages(.errors))]
pub struct FieldErrors {
    errors: BTreeMap<&'static str, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.errors.iter().map(|(field, msg)| (*field, msg.as_str()))
    }

    /// `Ok(value)` when no errors were recorded
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

fn join_messages(errors: &BTreeMap<&'static str, String>) -> String {
    errors
        .iter()
        .map(|(field, msg)| format!("{}: {}", field, msg))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse a display order as typed; blank means zero
pub(crate) fn parse_order(raw: &str) -> Result<i32, &'static str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse::<i32>().map_err(|_| "Display order must be a number")
}

/// `None` for blank optional text
pub(crate) fn optional_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_error_per_field_wins() {
        let mut errors = FieldErrors::new();
        errors.add("title", "Title is required");
        errors.add("title", "Title is too long");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("title"), Some("Title is required"));
    }

    #[test]
    fn test_parse_order() {
        assert_eq!(parse_order(""), Ok(0));
        assert_eq!(parse_order(" 12 "), Ok(12));
        assert_eq!(parse_order("-3"), Ok(-3));
        assert!(parse_order("first").is_err());
    }

    #[test]
    fn test_display_joins_fields() {
        let mut errors = FieldErrors::new();
        errors.add("title", "Title is required");
        errors.add("display_order", "Display order must be a number");
        assert_eq!(
            errors.to_string(),
            "display_order: Display order must be a number; title: Title is required"
        );

        let err: Box<dyn std::error::Error> = Box::new(errors);
        assert!(err.to_string().starts_with("display_order:"));
    }
}
