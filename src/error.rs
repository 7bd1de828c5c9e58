//! Error types for dynconf.

use std::fmt;

/// Result type alias for dynconf operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors produced by the configuration engine.
///
/// Each failure class gets its own variant so callers can match on the class
/// instead of inspecting message strings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration source could not be read.
    #[error("failed to load configuration: {0}")]
    Load(String),

    /// A source was read but could not be deserialized into the target type.
    #[error("failed to deserialize configuration: {0}")]
    Deserialize(String),

    /// The candidate snapshot failed validation; the previous one is kept.
    #[error("configuration validation failed: {0}")]
    Validation(String),

    /// A reload hook reported failure while the coordinator runs under
    /// [`HookPolicy::Abort`](crate::core::HookPolicy).
    #[error("reload hook #{index} failed: {reason}")]
    Hook {
        /// Position of the hook in registration order.
        index: usize,
        /// The hook's error message.
        reason: String,
    },

    /// A filesystem watch could not be established or operated.
    #[error("file watch error: {0}")]
    Watch(String),

    /// Underlying IO failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validation error for configuration validation.
#[derive(Debug)]
pub enum ValidationError {
    /// Custom validation error with a message.
    Custom(String),

    /// A specific field has an invalid value.
    InvalidField {
        /// The field name/path.
        field: String,
        /// The reason why it's invalid.
        reason: String,
    },
}

impl ValidationError {
    /// Create a custom validation error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(msg) => write!(f, "{}", msg),
            Self::InvalidField { field, reason } => {
                write!(f, "field '{}' is invalid: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        ConfigError::Validation(err.to_string())
    }
}
