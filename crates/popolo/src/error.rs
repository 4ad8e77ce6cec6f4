//! Error types for schema construction, validation and persistence
//!
//! This module defines the two error kinds the schema layer can raise on its
//! own (configuration and validation) plus the errors surfaced by the
//! persistence layer when a save or delete cannot be carried out.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::schema::EntityKind;

/// Configuration errors.
///
/// Raised while building the schema. These are fatal: without a valid
/// application binding no foreign key can be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required setting is absent.
    #[error("You must configure {0} in your settings to point to your Popolo application")]
    MissingSetting(String),

    /// A setting is present but unusable.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Setting name.
        key: String,
        /// What is wrong with it.
        message: String,
    },
}

/// A single failed field constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name as it appears in the persisted layout
    pub field: String,

    /// Machine-readable code (`blank`, `max_length`, `invalid_founding_date`, ...)
    pub code: String,

    /// Human-readable description
    pub message: String,
}

impl FieldError {
    /// Create a new field error.
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.field, self.message, self.code)
    }
}

/// Every constraint a record failed during full validation.
///
/// Validation never stops at the first failure; all mixins and field checks
/// contribute to the same collection so callers can report them together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    /// Model the record belongs to (e.g. "Person", "PersonContactDetail")
    pub model: String,

    /// Failed constraints, in the order they were checked
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Create an empty collection for a model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            errors: Vec::new(),
        }
    }

    /// Record a failure.
    pub fn add(
        &mut self,
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.errors.push(FieldError::new(field, code, message));
    }

    /// Whether nothing has failed.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether a given field has at least one failure.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Whether a given field failed with a given code.
    pub fn has_error(&self, field: &str, code: &str) -> bool {
        self.errors.iter().any(|e| e.field == field && e.code == code)
    }

    /// Failures for a single field.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors.iter().filter(move |e| e.field == field)
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed validation", self.model)?;
        for (i, error) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}", sep, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Errors surfaced by the persistence layer.
#[derive(Debug, Error)]
pub enum PopoloError {
    /// Schema could not be bound to the host application
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Record failed pre-save validation and was not persisted
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// No record with this id
    #[error("{model} {id} not found")]
    NotFound {
        /// Model looked up (e.g. "Person", "PersonContactDetail")
        model: String,
        /// Requested id
        id: Uuid,
    },

    /// A foreign key points at a record that does not exist
    #[error("{field} references unknown {kind} {id}")]
    UnknownReference {
        /// Foreign key field
        field: String,
        /// Kind of record the field points at
        kind: EntityKind,
        /// Dangling id
        id: Uuid,
    },

    /// The id is already used by a row of a different auxiliary table
    #[error("{id} is already used by a {model} row")]
    IdConflict {
        /// Table of the row holding the id (e.g. "PersonContactDetail")
        model: String,
        /// Conflicting id
        id: Uuid,
    },

    /// Another record of the same kind already owns this slug
    #[error("{kind} slug '{slug}' is already taken")]
    DuplicateSlug {
        /// Kind of record
        kind: EntityKind,
        /// Conflicting slug
        slug: String,
    },
}

/// Result type for persistence operations.
pub type PopoloResult<T> = Result<T, PopoloError>;

impl PopoloError {
    /// Whether the caller can fix this by changing the submitted record.
    ///
    /// Configuration errors are the only kind that are not.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PopoloError::Config(_))
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            PopoloError::Config(_) => "CONFIG_ERROR",
            PopoloError::Validation(_) => "VALIDATION_ERROR",
            PopoloError::NotFound { .. } => "NOT_FOUND",
            PopoloError::UnknownReference { .. } => "UNKNOWN_REFERENCE",
            PopoloError::IdConflict { .. } => "ID_CONFLICT",
            PopoloError::DuplicateSlug { .. } => "DUPLICATE_SLUG",
        }
    }

    /// Field-level detail when this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            PopoloError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_collect_and_report() {
        let mut errors = ValidationErrors::new("Person");
        assert!(errors.is_empty());

        errors.add("name", "blank", "This field cannot be blank.");
        errors.add("birth_date", "invalid_birth_date", "bad shape");

        assert!(errors.has_field("name"));
        assert!(errors.has_error("birth_date", "invalid_birth_date"));
        assert!(!errors.has_error("name", "max_length"));
        assert_eq!(errors.for_field("name").count(), 1);

        let rendered = errors.to_string();
        assert!(rendered.starts_with("Person failed validation: name"));
        assert!(rendered.contains("; birth_date"));
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_empty_validation_errors_is_ok() {
        assert!(ValidationErrors::new("Post").into_result().is_ok());
    }

    #[test]
    fn test_error_codes() {
        let err = PopoloError::from(ConfigError::MissingSetting("POPOLO_APP_NAME".into()));
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("POPOLO_APP_NAME"));

        let err = PopoloError::DuplicateSlug {
            kind: EntityKind::Person,
            slug: "jane-doe".into(),
        };
        assert_eq!(err.error_code(), "DUPLICATE_SLUG");
        assert!(err.is_client_error());
        assert!(err.validation_errors().is_none());
    }
}
