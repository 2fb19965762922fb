use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::schemas::{field_errors, FieldErrors};

#[derive(Debug, Default, Deserialize, Validate)]
#[validate(schema(function = "passwords_match", skip_on_field_errors = false))]
pub struct SignupForm {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 150, message = "Enter a username of at most 150 characters."),
        custom(function = "username_charset")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(length(
        min = 8,
        message = "This password is too short. It must contain at least 8 characters."
    ))]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

/// Field errors for the sign-up page. The password mismatch is a struct-level
/// rule and is shown under `password2`.
pub fn signup_field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut fields = field_errors(errors);
    if let Some(mismatch) = fields.remove("__all__") {
        fields.entry("password2".to_owned()).or_default().extend(mismatch);
    }
    fields
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Letters, digits and `@ . + - _`.
fn username_charset(username: &str) -> Result<(), ValidationError> {
    let ok = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if ok {
        Ok(())
    } else {
        Err(ValidationError::new("username_charset").with_message(
            "Usernames may contain only letters, numbers and @/./+/-/_ characters.".into(),
        ))
    }
}

fn passwords_match(form: &SignupForm) -> Result<(), ValidationError> {
    if form.password1 == form.password2 {
        Ok(())
    } else {
        Err(ValidationError::new("password_mismatch")
            .with_message("The two password fields didn't match.".into()))
    }
}
