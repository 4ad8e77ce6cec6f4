//! Full-record validation
//!
//! Every persisted type implements [`Validate`]. A type's `clean_fields`
//! pushes each failed constraint into a shared [`ValidationErrors`], and the
//! capabilities it is composed from (date frame, timestamps, slug) contribute
//! to the same collection. Nothing short-circuits, so the outcome does not
//! depend on the order in which capabilities are checked.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::dates::{is_partial_date, PARTIAL_DATE_PATTERN};
use crate::error::ValidationErrors;

/// Names, labels, roles, classification, contact fields, identifiers.
pub const SHORT_TEXT_MAX: usize = 128;
/// Other-name notes.
pub const LONG_NOTE_MAX: usize = 256;
/// Person summary.
pub const SUMMARY_MAX: usize = 512;
/// Partial-date strings.
pub const DATE_MAX: usize = 10;
/// URL fields.
pub const URL_MAX: usize = 200;
/// Email fields.
pub const EMAIL_MAX: usize = 254;
/// Slugs.
pub const SLUG_MAX: usize = 255;
/// Contact type code.
pub const CONTACT_TYPE_MAX: usize = 12;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
        .expect("valid email regex")
});

const URL_SCHEMES: [&str; 4] = ["http", "https", "ftp", "ftps"];

/// Full validation of a record before it is persisted.
pub trait Validate {
    /// Model name used in error reports.
    fn model_name(&self) -> &'static str;

    /// Check every field constraint, recording failures.
    fn clean_fields(&self, errors: &mut ValidationErrors);

    /// Run all checks and fail with every violated constraint.
    fn full_clean(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new(self.model_name());
        self.clean_fields(&mut errors);
        errors.into_result()
    }
}

/// Reject blank required text.
pub fn require_text(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "blank", "This field cannot be blank.");
    }
}

/// Reject a missing required relation.
pub fn require_reference(errors: &mut ValidationErrors, field: &str, value: Option<Uuid>) {
    match value {
        Some(id) if !id.is_nil() => {}
        _ => errors.add(field, "null", "This field cannot be null."),
    }
}

/// Reject text longer than `max` characters.
pub fn check_max_length(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    let length = value.chars().count();
    if length > max {
        errors.add(
            field,
            "max_length",
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                max, length
            ),
        );
    }
}

/// Same as [`check_max_length`] for optional fields.
pub fn check_optional_length(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
    max: usize,
) {
    if let Some(value) = value {
        check_max_length(errors, field, value, max);
    }
}

/// Reject a present value that is not a partial date.
///
/// The error code is `invalid_<field>` so that callers can tell which of
/// several date fields failed without parsing messages.
pub fn check_partial_date(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    let Some(value) = value else { return };
    check_max_length(errors, field, value, DATE_MAX);
    if !is_partial_date(value) {
        errors.add(
            field,
            format!("invalid_{}", field),
            format!(
                "{} must follow the given pattern: {}",
                field.replace('_', " "),
                PARTIAL_DATE_PATTERN
            ),
        );
    }
}

/// Reject a present, non-empty value that is not an email address.
pub fn check_email(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return;
    };
    check_max_length(errors, field, value, EMAIL_MAX);
    if !EMAIL_RE.is_match(value) {
        errors.add(field, "invalid", "Enter a valid email address.");
    }
}

/// Reject a value that is not an absolute web or ftp URL.
pub fn check_url(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    check_max_length(errors, field, value, URL_MAX);
    let valid = match url::Url::parse(value) {
        Ok(parsed) => {
            URL_SCHEMES.contains(&parsed.scheme()) && parsed.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    };
    if !valid {
        errors.add(field, "invalid", "Enter a valid URL.");
    }
}

/// [`check_url`] for optional fields.
pub fn check_optional_url(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    if let Some(value) = value {
        check_url(errors, field, value);
    }
}
