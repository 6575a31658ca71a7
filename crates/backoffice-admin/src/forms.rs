//! Admin edit forms.
//!
//! A [`ModelForm`] turns a JSON submission into cleaned field values for one
//! [`ModelAdmin`]. Cleaning runs in this order:
//!
//! 1. Read-only, system-managed and unknown fields are dropped.
//! 2. Each submitted value is type-checked and normalized.
//! 3. Required fields are checked (on update, against the merged object).
//! 4. The custom [`AdminForm::clean`] hook runs on the merged values.
//! 5. Related objects referenced by relation fields must exist.
//!
//! Errors from every step accumulate into one [`ValidationError`].

use std::collections::HashSet;

use backoffice_core::{AdminError, AdminResult, ValidationError};
use serde_json::{Map, Value};

use crate::db::{object_pk, AdminDbExecutor};
use crate::model_admin::{FieldSchema, FieldType, ModelAdmin};

/// Message for a missing required value.
pub const REQUIRED: &str = "This field is required.";
/// Message for a foreign key naming no existing object.
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

/// Custom behavior layered over the generated model form.
///
/// # Examples
///
/// ```
/// use backoffice_admin::forms::AdminForm;
/// use backoffice_core::ValidationError;
/// use serde_json::{Map, Value};
///
/// struct NoShouting;
///
/// impl AdminForm for NoShouting {
///     fn clean(&self, cleaned: &Map<String, Value>) -> Result<(), ValidationError> {
///         match cleaned.get("title").and_then(Value::as_str) {
///             Some(t) if t.chars().any(char::is_lowercase) => Ok(()),
///             Some(_) => Err(ValidationError::new("Please do not shout.")),
///             None => Ok(()),
///         }
///     }
/// }
/// ```
pub trait AdminForm: Send + Sync {
    /// Overrides the display label of a field.
    fn label(&self, field: &str) -> Option<&str> {
        let _ = field;
        None
    }

    /// Cross-field validation over the cleaned values.
    fn clean(&self, cleaned: &Map<String, Value>) -> Result<(), ValidationError> {
        let _ = cleaned;
        Ok(())
    }
}

/// The edit form of one model.
pub struct ModelForm<'a> {
    admin: &'a ModelAdmin,
    fields: Vec<String>,
    custom: Option<&'a dyn AdminForm>,
}

impl<'a> ModelForm<'a> {
    /// The form used by the admin's add and change views.
    pub fn for_admin(admin: &'a ModelAdmin) -> Self {
        Self {
            admin,
            fields: admin.editable_fields(),
            custom: admin.form.as_deref(),
        }
    }

    /// A plain form over `fields`, without the admin's custom form.
    ///
    /// Used for inline rows and in-place list edits.
    pub fn plain(admin: &'a ModelAdmin, fields: &[String]) -> Self {
        Self {
            admin,
            fields: fields
                .iter()
                .filter(|f| admin.field(f).is_some() && !admin.is_readonly(f))
                .cloned()
                .collect(),
            custom: None,
        }
    }

    /// Returns the fields that accept submitted values.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Cleans a submission without touching storage.
    ///
    /// `existing` is the stored object when changing, `None` when adding.
    /// Returns only the submitted fields, cleaned.
    pub fn clean(
        &self,
        existing: Option<&Value>,
        data: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ValidationError> {
        let mut errors = ValidationError::default();
        let mut cleaned = Map::new();

        for name in &self.fields {
            let Some(field) = self.admin.field(name) else {
                continue;
            };
            let Some(raw) = data.get(name) else {
                continue;
            };
            match clean_value(field, raw) {
                Ok(value) => {
                    cleaned.insert(name.clone(), value);
                }
                Err(message) => errors.add(name.clone(), message),
            }
        }

        let mut merged = Map::new();
        for name in &self.fields {
            let value = cleaned
                .get(name)
                .or_else(|| existing.and_then(|e| e.get(name)))
                .cloned();
            if let Some(value) = value {
                merged.insert(name.clone(), value);
            }
        }

        for name in &self.fields {
            let Some(field) = self.admin.field(name) else {
                continue;
            };
            if field.required
                && errors.messages_for(name).is_empty()
                && merged.get(name).map_or(true, is_empty_value)
            {
                errors.add(name.clone(), REQUIRED);
                merged.remove(name);
            }
        }

        if let Some(custom) = self.custom {
            for field in errors.errors.keys() {
                merged.remove(field);
            }
            if let Err(form_errors) = custom.clean(&merged) {
                errors.extend(form_errors);
            }
        }

        errors.into_result().map(|()| cleaned)
    }

    /// Cleans a submission and checks that referenced objects exist.
    pub async fn validate(
        &self,
        db: &dyn AdminDbExecutor,
        existing: Option<&Value>,
        data: &Map<String, Value>,
    ) -> AdminResult<Map<String, Value>> {
        let (cleaned, mut errors) = match self.clean(existing, data) {
            Ok(cleaned) => (cleaned, ValidationError::default()),
            Err(errors) => (self.valid_subset(data, &errors), errors),
        };

        errors.extend(self.check_relations(db, &cleaned).await?);
        if errors.is_empty() {
            Ok(cleaned)
        } else {
            Err(AdminError::Validation(errors))
        }
    }

    /// The submitted values that cleaned without errors.
    fn valid_subset(&self, data: &Map<String, Value>, errors: &ValidationError) -> Map<String, Value> {
        let mut subset = Map::new();
        for name in &self.fields {
            if !errors.messages_for(name).is_empty() {
                continue;
            }
            let (Some(field), Some(raw)) = (self.admin.field(name), data.get(name)) else {
                continue;
            };
            if let Ok(value) = clean_value(field, raw) {
                subset.insert(name.clone(), value);
            }
        }
        subset
    }

    async fn check_relations(
        &self,
        db: &dyn AdminDbExecutor,
        cleaned: &Map<String, Value>,
    ) -> AdminResult<ValidationError> {
        let mut errors = ValidationError::default();
        for (name, value) in cleaned {
            let Some(field) = self.admin.field(name) else {
                continue;
            };
            let Some(target) = field.related_model.as_deref() else {
                continue;
            };
            match (field.field_type, value) {
                (FieldType::ForeignKey, Value::Number(n)) => {
                    let Some(pk) = n.as_i64() else { continue };
                    match db.get_object(target, pk).await {
                        Ok(_) => {}
                        Err(AdminError::NotFound(_)) => errors.add(name.clone(), INVALID_CHOICE),
                        Err(other) => return Err(other),
                    }
                }
                (FieldType::ManyToManyField, Value::Array(items)) if !items.is_empty() => {
                    let pks: Vec<i64> = items.iter().filter_map(Value::as_i64).collect();
                    let found: HashSet<i64> = db
                        .objects_by_pks(target, &pks)
                        .await?
                        .iter()
                        .filter_map(object_pk)
                        .collect();
                    for pk in pks.iter().filter(|pk| !found.contains(pk)) {
                        errors.add(
                            name.clone(),
                            format!("Select a valid choice. {pk} is not one of the available choices."),
                        );
                    }
                }
                _ => {}
            }
        }
        Ok(errors)
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Type-checks and normalizes one submitted value.
fn clean_value(field: &FieldSchema, raw: &Value) -> Result<Value, String> {
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let value = match field.field_type {
        FieldType::CharField | FieldType::TextField => {
            let Some(s) = raw.as_str() else {
                return Err("Enter a valid value.".to_string());
            };
            let s = s.trim();
            if let Some(max) = field.max_length {
                let len = s.chars().count();
                if len > max {
                    return Err(format!(
                        "Ensure this value has at most {max} characters (it has {len})."
                    ));
                }
            }
            Value::String(s.to_string())
        }
        FieldType::BooleanField => match raw {
            Value::Bool(_) => raw.clone(),
            other => return Err(format!("'{other}' value must be either True or False.")),
        },
        FieldType::IntegerField | FieldType::AutoField => match raw.as_i64() {
            Some(n) => Value::from(n),
            None => return Err("Enter a whole number.".to_string()),
        },
        FieldType::DateTimeField => match raw.as_str() {
            Some(s) if chrono::DateTime::parse_from_rfc3339(s).is_ok() => raw.clone(),
            _ => return Err("Enter a valid date/time.".to_string()),
        },
        FieldType::ForeignKey => match raw.as_i64() {
            Some(n) => Value::from(n),
            None => return Err(INVALID_CHOICE.to_string()),
        },
        FieldType::ManyToManyField => {
            let Some(items) = raw.as_array() else {
                return Err("Enter a list of values.".to_string());
            };
            let mut seen = HashSet::new();
            let mut pks = Vec::with_capacity(items.len());
            for item in items {
                let Some(pk) = item.as_i64() else {
                    return Err(format!("'{item}' is not a valid value."));
                };
                if seen.insert(pk) {
                    pks.push(Value::from(pk));
                }
            }
            Value::Array(pks)
        }
    };

    if !field.choices.is_empty() && !is_empty_value(&value) {
        let text = value.as_str().map_or_else(|| value.to_string(), String::from);
        if !field.choices.iter().any(|c| c.value == text) {
            return Err(format!(
                "Select a valid choice. {text} is not one of the available choices."
            ));
        }
    }
    Ok(value)
}
