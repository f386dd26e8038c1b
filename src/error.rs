//! Error types for mold-sched

use thiserror::Error;

/// Main error type for scheduling runs
#[derive(Error, Debug)]
pub enum SchedError {
    /// Malformed or inconsistent instance/solution data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A task cannot be placed within its packing bound
    #[error("Infeasible placement: {0}")]
    Infeasible(String),

    /// Parse error in an instance or solution file
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for mold-sched operations
pub type SchedResult<T> = Result<T, SchedError>;

impl From<serde_yaml::Error> for SchedError {
    fn from(err: serde_yaml::Error) -> Self {
        SchedError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for SchedError {
    fn from(err: serde_json::Error) -> Self {
        SchedError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchedError::InvalidInput("negative duration".to_string());
        assert_eq!(err.to_string(), "Invalid input: negative duration");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SchedError = io_err.into();
        assert!(matches!(err, SchedError::Io(_)));
    }
}
