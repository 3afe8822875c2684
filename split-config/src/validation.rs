// Configuration validation

use crate::{ConfigError, Result};
use std::time::Duration;

/// Trait for validating configuration
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Configuration validator with rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate that a value is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                field
            )));
        }
        Ok(())
    }

    /// Validate that an optional value, when given, is not empty
    pub fn not_empty_if_set(value: Option<&str>, field: &str) -> Result<()> {
        match value {
            Some(value) => Self::not_empty(value, field),
            None => Ok(()),
        }
    }

    /// Validate that a value is in a list of allowed values
    pub fn one_of<T: PartialEq + std::fmt::Debug>(
        value: &T,
        allowed: &[T],
        field: &str,
    ) -> Result<()> {
        if !allowed.contains(value) {
            return Err(ConfigError::ValidationError(format!(
                "{} must be one of {:?}, got {:?}",
                field, allowed, value
            )));
        }
        Ok(())
    }

    /// Validate URL format
    pub fn is_url(value: &str, field: &str) -> Result<()> {
        if !value.starts_with("http://") && !value.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "{} must be a valid URL",
                field
            )));
        }
        Ok(())
    }

    /// Validate that a base URL has no trailing slash
    pub fn no_trailing_slash(value: &str, field: &str) -> Result<()> {
        if value.ends_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot contain a trailing slash",
                field
            )));
        }
        Ok(())
    }

    /// Validate that a timeout is non-zero
    pub fn non_zero(value: Duration, field: &str) -> Result<()> {
        if value.is_zero() {
            return Err(ConfigError::ValidationError(format!(
                "{} must be greater than zero",
                field
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_empty_validation() {
        assert!(ConfigValidator::not_empty("value", "field").is_ok());
        assert!(ConfigValidator::not_empty("", "field").is_err());
        assert!(ConfigValidator::not_empty("  ", "field").is_err());
        assert!(ConfigValidator::not_empty_if_set(None, "field").is_ok());
        assert!(ConfigValidator::not_empty_if_set(Some(""), "field").is_err());
    }

    #[test]
    fn test_one_of_validation() {
        let allowed = ["client_side", "server_side", "admin"];
        assert!(ConfigValidator::one_of(&"admin", &allowed, "type").is_ok());
        assert!(ConfigValidator::one_of(&"root", &allowed, "type").is_err());
    }

    #[test]
    fn test_url_validation() {
        assert!(ConfigValidator::is_url("https://example.com", "field").is_ok());
        assert!(ConfigValidator::is_url("http://example.com", "field").is_ok());
        assert!(ConfigValidator::is_url("example.com", "field").is_err());
        assert!(ConfigValidator::no_trailing_slash("https://example.com/v2/", "field").is_err());
    }

    #[test]
    fn test_non_zero_validation() {
        assert!(ConfigValidator::non_zero(Duration::from_secs(1), "field").is_ok());
        assert!(ConfigValidator::non_zero(Duration::ZERO, "field").is_err());
    }
}
