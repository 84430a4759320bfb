//! Entity model error types.

use thiserror::Error;

/// Result type for entity model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while materializing or mutating entities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// An identifying field (`id` or `module_id`) is absent from the payload.
    #[error("missing required field `{0}`")]
    MissingRequiredField(String),

    /// An identifying field is present but is not an integer.
    #[error("required field `{field}` must be an integer, got {found}")]
    InvalidRequiredField { field: String, found: String },

    /// A schema names a nested entity type that is not in the catalog.
    #[error("unknown entity type `{type_name}` for field `{field}`")]
    UnknownTypeDescriptor { type_name: String, field: String },

    /// An entity was expected but the value is not a JSON object.
    #[error("expected a JSON object for `{0}`")]
    NotAnObject(String),
}

impl ModelError {
    pub(crate) fn invalid_required(field: &str, found: impl Into<String>) -> Self {
        Self::InvalidRequiredField {
            field: field.to_string(),
            found: found.into(),
        }
    }
}
