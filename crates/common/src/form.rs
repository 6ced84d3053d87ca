//! Per-field form errors.

use std::collections::BTreeMap;
use std::fmt;

/// Validation messages keyed by form field name.
///
/// Produced when a submitted form is rejected; the page handler re-renders
/// the form and shows each message next to its field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Create an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an error set holding a single message.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Add a message for a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Merge another error set into this one.
    pub fn extend(&mut self, other: Self) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
    }

    /// Messages for a field (empty if the field is valid).
    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.errors.get(field).map_or(&[], Vec::as_slice)
    }

    /// Whether any field has errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Names of the fields with errors.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl From<&validator::ValidationErrors> for FieldErrors {
    fn from(err: &validator::ValidationErrors) -> Self {
        let mut errors = Self::new();
        for (field, field_errors) in err.field_errors() {
            for e in field_errors {
                let message = e
                    .message
                    .as_ref()
                    .map_or_else(|| e.code.to_string(), ToString::to_string);
                errors.add(&field, message);
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "This field is required."))]
        text: String,
    }

    #[test]
    fn test_from_validation_errors_keeps_messages() {
        let err = Sample {
            text: String::new(),
        }
        .validate()
        .unwrap_err();

        let errors = FieldErrors::from(&err);
        assert_eq!(errors.get("text"), ["This field is required.".to_string()]);
        assert!(errors.get("group").is_empty());
    }

    #[test]
    fn test_extend_and_display() {
        let mut errors = FieldErrors::single("text", "required");
        errors.extend(FieldErrors::single("image", "not an image"));

        assert_eq!(errors.fields().collect::<Vec<_>>(), ["image", "text"]);
        assert_eq!(errors.to_string(), "image: not an image; text: required");
    }
}
