//! Core error types for the back-office.
//!
//! [`AdminError`] covers request errors, storage errors, validation errors and
//! configuration errors. Each variant maps to an HTTP status code via
//! [`AdminError::status_code`].

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Key under which form-level (non-field) validation messages are stored.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// A collection of validation messages keyed by field name.
///
/// Form-level messages live under [`NON_FIELD_ERRORS`]. Messages accumulate,
/// so a single `ValidationError` can report every problem in a submission.
///
/// # Examples
///
/// ```
/// use backoffice_core::error::{ValidationError, NON_FIELD_ERRORS};
///
/// let mut err = ValidationError::new("HTML tags are not allowed.");
/// err.add("title", "This field is required.");
/// assert_eq!(err.messages_for(NON_FIELD_ERRORS), ["HTML tags are not allowed."]);
/// assert_eq!(err.messages_for("title"), ["This field is required."]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    /// Messages per field name.
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    /// Creates a form-level validation error with a single message.
    pub fn new(message: impl Into<String>) -> Self {
        Self::for_field(NON_FIELD_ERRORS, message)
    }

    /// Creates a validation error attached to one field.
    pub fn for_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::default();
        err.add(field, message);
        err
    }

    /// Adds a message for the given field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Merges all messages of `other` into this error.
    pub fn extend(&mut self, other: Self) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
    }

    /// Returns `true` if no messages have been recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the messages recorded for a field.
    pub fn messages_for(&self, field: &str) -> &[String] {
        self.errors.get(field).map_or(&[], Vec::as_slice)
    }

    /// Returns the form-level messages.
    pub fn non_field_errors(&self) -> &[String] {
        self.messages_for(NON_FIELD_ERRORS)
    }

    /// Converts into `Ok(())` when empty, `Err(self)` otherwise.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                if field == NON_FIELD_ERRORS {
                    write!(f, "{message}")?;
                } else {
                    write!(f, "{field}: {message}")?;
                }
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for the back-office.
#[derive(Error, Debug)]
pub enum AdminError {
    // ── Request errors ───────────────────────────────────────────────

    /// HTTP 400 Bad Request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP 401 Unauthorized.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// HTTP 403 Forbidden.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// HTTP 404 Not Found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP 409 Conflict.
    #[error("Conflict: {0}")]
    Conflict(String),

    // ── Validation ───────────────────────────────────────────────────

    /// One or more fields failed validation.
    #[error("Validation error: {0}")]
    Validation(ValidationError),

    // ── Storage ──────────────────────────────────────────────────────

    /// A storage-layer failure.
    #[error("Database error: {0}")]
    Database(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ── Serialization / IO ───────────────────────────────────────────

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AdminError {
    /// Returns the HTTP status code associated with this error.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::PermissionDenied(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Database(_)
            | Self::Configuration(_)
            | Self::Serialization(_)
            | Self::Io(_)
            | Self::Internal(_) => 500,
        }
    }
}

impl From<ValidationError> for AdminError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result alias used throughout the back-office crates.
pub type AdminResult<T> = Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_new_is_form_level() {
        let err = ValidationError::new("Bad input.");
        assert_eq!(err.non_field_errors(), ["Bad input."]);
        assert_eq!(err.to_string(), "Bad input.");
    }

    #[test]
    fn test_validation_error_field_display() {
        let err = ValidationError::for_field("title", "This field is required.");
        assert_eq!(err.to_string(), "title: This field is required.");
        assert!(err.non_field_errors().is_empty());
    }

    #[test]
    fn test_validation_error_extend_accumulates() {
        let mut err = ValidationError::for_field("title", "Too long.");
        err.extend(ValidationError::for_field("title", "Required."));
        err.extend(ValidationError::new("Form broken."));
        assert_eq!(err.messages_for("title").len(), 2);
        assert_eq!(err.non_field_errors().len(), 1);
    }

    #[test]
    fn test_validation_error_into_result() {
        assert!(ValidationError::default().into_result().is_ok());
        assert!(ValidationError::new("x").into_result().is_err());
    }

    #[test]
    fn test_admin_error_status_codes() {
        assert_eq!(AdminError::BadRequest("x".into()).status_code(), 400);
        assert_eq!(AdminError::Unauthorized("x".into()).status_code(), 401);
        assert_eq!(AdminError::PermissionDenied("x".into()).status_code(), 403);
        assert_eq!(AdminError::NotFound("x".into()).status_code(), 404);
        assert_eq!(AdminError::Conflict("x".into()).status_code(), 409);
        assert_eq!(
            AdminError::Validation(ValidationError::new("x")).status_code(),
            400
        );
        assert_eq!(AdminError::Database("x".into()).status_code(), 500);
        assert_eq!(AdminError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn test_admin_error_display() {
        let err = AdminError::NotFound("blog.post 7".into());
        assert_eq!(err.to_string(), "Not found: blog.post 7");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: AdminError = io_err.into();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn test_serde_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: AdminError = json_err.into();
        assert!(matches!(err, AdminError::Serialization(_)));
    }
}
