//! Client-side credential checks mirroring the server's account policy.

use std::fmt;
use thiserror::Error;

pub const USERNAME_MIN_LEN: usize = 5;
pub const PASSWORD_MIN_LEN: usize = 6;

/// Login only requires presence; registration applies the full policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    MinLength(usize),
    /// At least one ASCII uppercase letter and one digit
    Pattern,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub rule: Rule,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.field {
            Field::Username => "Username",
            Field::Password => "Password",
        };
        match self.rule {
            Rule::Required => write!(f, "{name} is required"),
            Rule::MinLength(n) => write!(f, "{name} must be at least {n} characters"),
            Rule::Pattern => write!(
                f,
                "{name} must contain at least one uppercase letter and one digit"
            ),
        }
    }
}

/// One entry per failing field, first failing rule only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn for_field(&self, field: Field) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }
}

fn check_username(mode: CredentialMode, username: &str) -> Option<Rule> {
    if username.is_empty() {
        return Some(Rule::Required);
    }
    if mode == CredentialMode::Register && username.chars().count() < USERNAME_MIN_LEN {
        return Some(Rule::MinLength(USERNAME_MIN_LEN));
    }
    None
}

fn check_password(mode: CredentialMode, password: &str) -> Option<Rule> {
    if password.is_empty() {
        return Some(Rule::Required);
    }
    if mode == CredentialMode::Login {
        return None;
    }
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Some(Rule::MinLength(PASSWORD_MIN_LEN));
    }
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_upper && has_digit) {
        return Some(Rule::Pattern);
    }
    None
}

pub fn validate_credentials(
    mode: CredentialMode,
    username: &str,
    password: &str,
) -> Result<(), ValidationErrors> {
    let errors: Vec<FieldError> = [
        check_username(mode, username).map(|rule| FieldError {
            field: Field::Username,
            rule,
        }),
        check_password(mode, password).map(|rule| FieldError {
            field: Field::Password,
            rule,
        }),
    ]
    .into_iter()
    .flatten()
    .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}
