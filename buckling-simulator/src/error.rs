use thiserror::Error;

/// Rejected construction or configuration parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("grid dimensions must be positive (nx={nx}, ny={ny})")]
    EmptyGrid { nx: usize, ny: usize },

    #[error("grid spacing must be positive and finite, got dx={0}")]
    NonPositiveSpacing(f64),

    #[error("{name} must be positive, got {value}")]
    NonPositiveParameter { name: &'static str, value: f64 },

    #[error("radius of curvature {name} must be non-zero, got {value}")]
    ZeroCurvatureRadius { name: &'static str, value: f64 },

    #[error("{name} must be finite, got {value}")]
    NonFiniteParameter { name: &'static str, value: f64 },

    #[error("{name} must be non-negative, got {value}")]
    NegativeAmplitude { name: &'static str, value: f64 },
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Rejects NaN and infinities.
pub(crate) fn require_finite(name: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::NonFiniteParameter { name, value })
    }
}

/// Rejects non-finite, zero and negative values.
pub(crate) fn require_positive(name: &'static str, value: f64) -> ConfigResult<()> {
    require_finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::NonPositiveParameter { name, value })
    }
}
