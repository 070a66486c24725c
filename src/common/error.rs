//! Error types for rust_navigation
//!
//! Planning outcomes are reported through `PlanStatus`; these errors cover
//! malformed inputs and configuration problems.

use std::fmt;

/// Main error type for the navigation stack
#[derive(Debug)]
pub enum PlannerError {
    /// Pose rotation axis is too far from vertical to project onto the ground plane
    NonVerticalRotation { axis_z: f64 },
    /// Invalid parameter
    InvalidParameter(String),
    /// Configuration could not be parsed
    ConfigError(String),
    /// I/O error
    IoError(std::io::Error),
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerError::NonVerticalRotation { axis_z } => write!(
                f,
                "Non-vertical rotation: axis z component {:.4} is outside tolerance",
                axis_z
            ),
            PlannerError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            PlannerError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            PlannerError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for PlannerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlannerError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PlannerError {
    fn from(e: std::io::Error) -> Self {
        PlannerError::IoError(e)
    }
}

impl From<serde_yaml::Error> for PlannerError {
    fn from(e: serde_yaml::Error) -> Self {
        PlannerError::ConfigError(e.to_string())
    }
}

/// Result type alias for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlannerError::InvalidParameter("negative padding".to_string());
        assert_eq!(format!("{}", err), "Invalid parameter: negative padding");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PlannerError = io_err.into();
        assert!(matches!(err, PlannerError::IoError(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
