use regex::Regex;
use std::sync::OnceLock;

use crate::model::CreateServiceDto;

use super::{parse_order, FieldErrors};

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceForm {
    pub name: String,
    pub slug: String,
    pub display_order: String,
}

impl Default for ServiceForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            slug: String::new(),
            display_order: "0".to_string(),
        }
    }
}

impl ServiceForm {
    pub fn to_create_dto(&self) -> Result<CreateServiceDto, FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.name.trim().is_empty() {
            errors.add("name", "Service name is required");
        }
        let slug = self.slug.trim();
        if slug.is_empty() {
            errors.add("slug", "Slug is required");
        } else if !slug_re().is_match(slug) {
            errors.add("slug", "Use lower-case letters, digits and hyphens");
        }
        let display_order = match parse_order(&self.display_order) {
            Ok(order) if order < 0 => {
                errors.add("display_order", "Enter a number of 0 or more");
                0
            }
            Ok(order) => order,
            Err(msg) => {
                errors.add("display_order", msg);
                0
            }
        };
        errors.into_result(CreateServiceDto {
            name: self.name.trim().to_string(),
            slug: slug.to_string(),
            display_order,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_service() {
        let form = ServiceForm {
            name: "Ad Platform".to_string(),
            slug: "ad-platform".to_string(),
            display_order: "2".to_string(),
        };
        let dto = form.to_create_dto().unwrap();
        assert_eq!(dto.slug, "ad-platform");
        assert_eq!(dto.display_order, 2);
    }

    #[test]
    fn test_rejects_bad_slug_and_negative_order() {
        let form = ServiceForm {
            name: "Ads".to_string(),
            slug: "Ad Platform".to_string(),
            display_order: "-1".to_string(),
        };
        let errors = form.to_create_dto().unwrap_err();
        assert_eq!(
            errors.get("slug"),
            Some("Use lower-case letters, digits and hyphens")
        );
        assert_eq!(errors.get("display_order"), Some("Enter a number of 0 or more"));
    }
}
