//! Input validation for user-supplied fields.
//!
//! Everything here is a pure function over raw values, cheap enough to run
//! on every keystroke. Predicates answer yes/no; the `check_*` functions
//! return the [`FieldError`] a form should display next to the field.
//!
//! The password rules intentionally come in two strengths:
//! [`is_strong_password`] demands mixed character classes while
//! [`check_password`] only enforces presence and minimum length.

use std::sync::LazyLock;

use regex::Regex;

use crate::task::{
    CreateTaskRequest, MAX_TASK_DESCRIPTION_LENGTH, MAX_TASK_TITLE_LENGTH, MIN_TASK_TITLE_LENGTH,
    UpdateTaskRequest,
};

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Symbols that satisfy the "special character" rule of [`is_strong_password`].
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*";

/// `None` only if the pattern fails to compile, which rejects every address.
static EMAIL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
        .map_err(|e| tracing::error!(error = %e, "email pattern failed to compile"))
        .ok()
});

/// A rejected field value, displayed as the message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("Email is required")]
    EmailRequired,
    #[error("Please enter a valid email address")]
    EmailInvalid,
    #[error("Password is required")]
    PasswordRequired,
    #[error("Password must be at least 8 characters long")]
    PasswordTooShort,
    #[error("Task title is required")]
    TitleRequired,
    #[error("Task title must be at least 3 characters long")]
    TitleTooShort,
    #[error("Task title must not exceed 200 characters")]
    TitleTooLong,
    #[error("Task description must not exceed 2000 characters")]
    DescriptionTooLong,
}

impl FieldError {
    /// Name of the form field the error belongs to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmailRequired | Self::EmailInvalid => "email",
            Self::PasswordRequired | Self::PasswordTooShort => "password",
            Self::TitleRequired | Self::TitleTooShort | Self::TitleTooLong => "title",
            Self::DescriptionTooLong => "description",
        }
    }
}

/// Returns `true` for `local@domain.tld` shaped addresses.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email))
}

/// Returns `true` if the password has at least 8 characters and contains a
/// lowercase letter, an uppercase letter, a digit and one of `!@#$%^&*`.
///
/// Only the text before the first line break counts towards any of these.
#[must_use]
pub fn is_strong_password(password: &str) -> bool {
    let first_line = password
        .find(is_line_terminator)
        .map_or(password, |end| &password[..end]);
    first_line.chars().count() >= MIN_PASSWORD_LENGTH
        && first_line.chars().any(|c| c.is_ascii_lowercase())
        && first_line.chars().any(|c| c.is_ascii_uppercase())
        && first_line.chars().any(|c| c.is_ascii_digit())
        && first_line.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
}

const fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Returns `true` if the value is present and not blank.
#[must_use]
pub fn is_not_empty(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Returns `true` if the value is present and strictly greater than zero.
#[must_use]
pub fn is_positive_number(value: Option<f64>) -> bool {
    value.is_some_and(|v| v > 0.0)
}

/// Checks an email field.
///
/// # Errors
///
/// [`FieldError::EmailRequired`] for blank input,
/// [`FieldError::EmailInvalid`] for anything not shaped like an address.
pub fn check_email(email: &str) -> Result<(), FieldError> {
    if email.trim().is_empty() {
        return Err(FieldError::EmailRequired);
    }
    if !is_valid_email(email) {
        return Err(FieldError::EmailInvalid);
    }
    Ok(())
}

/// Checks a password field for presence and minimum length only.
///
/// # Errors
///
/// [`FieldError::PasswordRequired`] for blank input,
/// [`FieldError::PasswordTooShort`] below 8 characters.
pub fn check_password(password: &str) -> Result<(), FieldError> {
    if password.trim().is_empty() {
        return Err(FieldError::PasswordRequired);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(FieldError::PasswordTooShort);
    }
    Ok(())
}

/// Checks a task title.
///
/// The lower bound applies to the trimmed title, the upper bound to the
/// title as typed.
///
/// # Errors
///
/// [`FieldError::TitleRequired`], [`FieldError::TitleTooShort`] or
/// [`FieldError::TitleTooLong`].
pub fn check_task_title(title: &str) -> Result<(), FieldError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(FieldError::TitleRequired);
    }
    if trimmed.chars().count() < MIN_TASK_TITLE_LENGTH {
        return Err(FieldError::TitleTooShort);
    }
    if title.chars().count() > MAX_TASK_TITLE_LENGTH {
        return Err(FieldError::TitleTooLong);
    }
    Ok(())
}

/// Checks a task description. An empty description is accepted.
///
/// # Errors
///
/// [`FieldError::DescriptionTooLong`] above 2000 characters.
pub fn check_task_description(description: &str) -> Result<(), FieldError> {
    if description.chars().count() > MAX_TASK_DESCRIPTION_LENGTH {
        return Err(FieldError::DescriptionTooLong);
    }
    Ok(())
}

/// Renders a check result as a display string: empty when the field is
/// acceptable, the error message otherwise.
#[must_use]
pub fn field_error_message(result: Result<(), FieldError>) -> String {
    result.err().map(|e| e.to_string()).unwrap_or_default()
}

impl CreateTaskRequest {
    /// Applies the title and description rules.
    ///
    /// # Errors
    ///
    /// Returns the first rejected field.
    pub fn validate(&self) -> Result<(), FieldError> {
        check_task_title(&self.title)?;
        self.description
            .as_deref()
            .map_or(Ok(()), check_task_description)
    }
}

impl UpdateTaskRequest {
    /// Applies the title and description rules to the fields present.
    ///
    /// # Errors
    ///
    /// Returns the first rejected field.
    pub fn validate(&self) -> Result<(), FieldError> {
        if let Some(title) = &self.title {
            check_task_title(title)?;
        }
        self.description
            .as_deref()
            .map_or(Ok(()), check_task_description)
    }
}
