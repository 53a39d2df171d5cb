//! Field-level validation errors shared by search queries and offer forms.

use std::collections::BTreeMap;

use thiserror::Error;

/// One or more rejected input fields, keyed by field name.
///
/// Only the first message per field is kept, which matches how the board's
/// forms display a single hint under each input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("validation failed: {}", summary(.fields))]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

fn summary(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Returns `Ok(value)` when no errors were recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field was rejected.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Records an error when `value` is blank. Returns the trimmed value.
pub(crate) fn required<'a>(errors: &mut ValidationErrors, field: &str, value: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, format!("The {} field is required.", label(field)));
    }
    trimmed
}

/// Records an error when `value` is longer than `max` characters.
pub(crate) fn max_chars(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(
            field,
            format!(
                "The {} field must not be greater than {max} characters.",
                label(field)
            ),
        );
    }
}

/// Normalises an optional text input: blank strings become `None`.
pub(crate) fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

fn label(field: &str) -> String {
    field.replace('_', " ")
}
