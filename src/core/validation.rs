//! Configuration validation support.

use crate::error::ValidationError;

/// Trait for self-validating configuration types.
///
/// Implement this on a configuration struct and pass `T::validate` to the
/// builder so invalid candidates are rejected before installation and the
/// previous snapshot keeps serving.
///
/// # Examples
///
/// ```rust
/// use dynconf::core::Validate;
/// use dynconf::error::ValidationError;
///
/// struct ServerConfig {
///     port: u16,
/// }
///
/// impl Validate for ServerConfig {
///     fn validate(&self) -> Result<(), ValidationError> {
///         if self.port < 1024 {
///             return Err(ValidationError::invalid_field("port", "must be >= 1024"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Validate {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` describing what failed.
    fn validate(&self) -> Result<(), ValidationError>;
}
