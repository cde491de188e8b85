//! Structural validation of decoded messages.

use thiserror::Error;

/// Accumulated set of invalid fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("invalid field(s): {}", .fields.join(", "))]
pub struct ValidationError {
    fields: Vec<String>,
}

impl ValidationError {
    /// Create an empty validation error.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validation error for a single field.
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            fields: vec![name.into()],
        }
    }

    /// Record an invalid field.
    pub fn push(&mut self, name: impl Into<String>) {
        self.fields.push(name.into());
    }

    /// Record the fields of a nested message under `prefix`.
    pub fn extend_nested(&mut self, prefix: &str, nested: Result<(), ValidationError>) {
        if let Err(nested) = nested {
            self.fields
                .extend(nested.fields.into_iter().map(|f| format!("{prefix}.{f}")));
        }
    }

    /// Invalid field names.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Check if no field was recorded.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Structural validation for a decoded message.
pub trait Validate {
    /// Check that required fields are present and keys are well-formed.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Take a required nested message, recording it as invalid when absent or
/// malformed.
pub fn take_required<T: Validate>(
    errors: &mut ValidationError,
    name: &str,
    value: Option<T>,
) -> Option<T> {
    match value {
        Some(value) => {
            let result = value.validate();
            let valid = result.is_ok();
            errors.extend_nested(name, result);
            valid.then_some(value)
        }
        None => {
            errors.push(name);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_fields() {
        let mut err = ValidationError::new();
        err.push("process_guid");
        err.push("cell_id");
        assert_eq!(err.to_string(), "invalid field(s): process_guid, cell_id");
    }

    #[test]
    fn nested_fields_are_prefixed() {
        let mut err = ValidationError::new();
        err.extend_nested("actual_lrp_key", Err(ValidationError::field("domain")));
        err.extend_nested("actual_lrp_instance_key", Ok(()));
        assert_eq!(err.fields(), ["actual_lrp_key.domain".to_string()]);
    }

    #[test]
    fn empty_is_ok() {
        assert!(ValidationError::new().into_result().is_ok());
        assert!(ValidationError::field("x").into_result().is_err());
    }
}
