//! Internal helpers for input validation, shared by every write path.

use crate::{EngineError, ResultEngine};

/// Email suffixes accepted for new identities (compared case-insensitively).
pub const ALLOWED_EMAIL_DOMAINS: [&str; 2] = ["@esi-sba.dz", "@gmail.com"];

pub(crate) const EMAIL_MAX_LEN: usize = 254;
pub(crate) const PERSON_NAME_MAX_LEN: usize = 150;
pub(crate) const LABEL_MAX_LEN: usize = 50;
pub(crate) const COURSE_CODE_MAX_LEN: usize = 20;
pub(crate) const STATUS_MAX_LEN: usize = 30;

/// Trim and validate a required text field.
pub(crate) fn required_text(value: &str, field: &str, max_len: usize) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::invalid(field, "This field may not be blank."));
    }
    if trimmed.chars().count() > max_len {
        return Err(EngineError::invalid(
            field,
            format!("Ensure this field has no more than {max_len} characters."),
        ));
    }
    Ok(trimmed.to_string())
}

/// Like [`required_text`], falling back to `default` when the value is absent.
pub(crate) fn text_or_default(
    value: Option<&str>,
    field: &str,
    max_len: usize,
    default: &str,
) -> ResultEngine<String> {
    match value {
        Some(value) => required_text(value, field, max_len),
        None => Ok(default.to_string()),
    }
}

/// Validate the shape and domain of an email address.
pub fn validate_email(value: &str) -> ResultEngine<String> {
    let email = required_text(value, "email", EMAIL_MAX_LEN)?;

    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(EngineError::invalid("email", "Enter a valid email address."));
    }

    let lowered = email.to_lowercase();
    if !ALLOWED_EMAIL_DOMAINS
        .iter()
        .any(|suffix| lowered.ends_with(suffix))
    {
        return Err(EngineError::invalid(
            "email",
            format!(
                "Email must end with {}",
                ALLOWED_EMAIL_DOMAINS.join(" or ")
            ),
        ));
    }

    Ok(email)
}

/// Username is the local-part of the email.
pub fn username_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or_default().to_string()
}

/// Escape `%`, `_` and the escape char itself for a `LIKE ... ESCAPE '\'`
/// pattern.
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
