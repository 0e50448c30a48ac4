//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::engine::{EngineConfig, InferenceConfig, LearningConfig};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 71,
            ValidationError::ParseError(_) => 72,
            ValidationError::InvalidValue { .. } => 73,
            ValidationError::VersionMismatch { .. } => 74,
        }
    }
}

fn invalid(field: &str, message: String) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message,
    }
}

/// Validate a complete configuration semantically.
pub fn validate_config(config: &EngineConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }
    validate_inference(&config.inference)?;
    validate_learning(&config.learning)?;
    Ok(())
}

/// Validate inference settings.
pub fn validate_inference(config: &InferenceConfig) -> ValidationResult<()> {
    if !config.ipfp_epsilon.is_finite() || config.ipfp_epsilon <= 0.0 {
        return Err(invalid(
            "inference.ipfp_epsilon",
            format!("Must be finite and > 0, got {}", config.ipfp_epsilon),
        ));
    }
    if config.ipfp_max_iterations == 0 {
        return Err(invalid(
            "inference.ipfp_max_iterations",
            "Must be at least 1".to_string(),
        ));
    }
    if config.precision > 15 {
        return Err(invalid(
            "inference.precision",
            format!("Must be at most 15 digits, got {}", config.precision),
        ));
    }
    Ok(())
}

/// Validate learning settings.
pub fn validate_learning(config: &LearningConfig) -> ValidationResult<()> {
    if !config.stop_ratio.is_finite() || config.stop_ratio <= 0.0 {
        return Err(invalid(
            "learning.stop_ratio",
            format!("Must be finite and > 0, got {}", config.stop_ratio),
        ));
    }
    if config.max_iterations == 0 {
        return Err(invalid(
            "learning.max_iterations",
            "Must be at least 1".to_string(),
        ));
    }
    if !config.pseudo_count.is_finite() || config.pseudo_count < 0.0 {
        return Err(invalid(
            "learning.pseudo_count",
            format!("Must be finite and >= 0, got {}", config.pseudo_count),
        ));
    }
    if config.workers == 0 {
        return Err(invalid("learning.workers", "Must be at least 1".to_string()));
    }
    if !config.likelihood_tolerance.is_finite() || config.likelihood_tolerance < 0.0 {
        return Err(invalid(
            "learning.likelihood_tolerance",
            format!("Must be finite and >= 0, got {}", config.likelihood_tolerance),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        validate_config(&EngineConfig::default()).unwrap();
        validate_inference(&InferenceConfig::strict()).unwrap();
        validate_learning(&LearningConfig::smoothed()).unwrap();
    }

    #[test]
    fn test_rejects_non_positive_epsilon() {
        let mut config = EngineConfig::default();
        config.inference.ipfp_epsilon = 0.0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "inference.ipfp_epsilon"));
        assert_eq!(err.code(), 73);
    }

    #[test]
    fn test_rejects_zero_workers_and_negative_prior() {
        let mut learning = LearningConfig::default();
        learning.workers = 0;
        assert!(validate_learning(&learning).is_err());

        let mut learning = LearningConfig::default();
        learning.pseudo_count = -1.0;
        assert!(validate_learning(&learning).is_err());
    }

    #[test]
    fn test_rejects_version_mismatch() {
        let config = EngineConfig {
            schema_version: "0.0.1".into(),
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::VersionMismatch { .. })
        ));
    }
}
