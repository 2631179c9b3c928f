use crate::model::LoginRequest;

use super::FieldErrors;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn to_request(&self) -> Result<LoginRequest, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = self.email.trim();
        if email.is_empty() {
            errors.add("email", "Email is required");
        } else if !email.contains('@') {
            errors.add("email", "Invalid email format");
        }
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.into_result(LoginRequest {
            email: email.to_string(),
            password: self.password.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_validation() {
        let form = LoginForm {
            email: "planner".to_string(),
            password: String::new(),
        };
        let errors = form.to_request().unwrap_err();
        assert_eq!(errors.get("email"), Some("Invalid email format"));
        assert_eq!(errors.get("password"), Some("Password is required"));

        let ok = LoginForm {
            email: " planner@example.com ".to_string(),
            password: "secret".to_string(),
        };
        assert_eq!(ok.to_request().unwrap().email, "planner@example.com");
    }
}
