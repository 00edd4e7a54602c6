//! Error types for the disk chooser
//!
//! Provides structured error types for requirement parsing, constraint
//! evaluation, allocation and the external collaborators (probes, resolvers).

use thiserror::Error;

/// Unified error type for the disk chooser
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unsupported {operator} operator in : {expression}")]
    UnsupportedOperator { operator: String, expression: String },

    // =========================================================================
    // Constraint Evaluation Errors
    // =========================================================================
    #[error("Invalid magnitude '{value}': {reason}")]
    InvalidMagnitude { value: String, reason: String },

    #[error("Numeric comparison on non-numeric operand: {value}")]
    NonNumericOperand { value: String },

    // =========================================================================
    // Allocation Errors
    // =========================================================================
    #[error("Could only find {matched} of the {expected} expected devices")]
    AllocationShortfall { matched: usize, expected: usize },

    // =========================================================================
    // Collaborator Errors
    // =========================================================================
    #[error("{collaborator} failed: {reason}")]
    Collaborator { collaborator: String, reason: String },

    // =========================================================================
    // Parse / IO Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Broad classification of a failure, used by the calling boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid requirements or request; never retried
    Configuration,
    /// Fewer slots matched than were declared
    AllocationShortfall,
    /// An external probe or resolver failed
    Collaborator,
    /// Anything else (IO, malformed input files)
    Internal,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_)
            | Error::UnsupportedOperator { .. }
            | Error::InvalidMagnitude { .. }
            | Error::NonNumericOperand { .. } => ErrorKind::Configuration,

            Error::AllocationShortfall { .. } => ErrorKind::AllocationShortfall,

            Error::Collaborator { .. } => ErrorKind::Collaborator,

            Error::JsonParse(_) | Error::YamlParse(_) | Error::Io(_) => ErrorKind::Internal,
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::Configuration => 2,
            ErrorKind::AllocationShortfall => 3,
            ErrorKind::Collaborator => 4,
            ErrorKind::Internal => 1,
        }
    }

    /// Check if re-running the same invocation could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Collaborator)
    }

    /// Build a collaborator error
    pub fn collaborator(collaborator: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Collaborator {
            collaborator: collaborator.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for the disk chooser
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = Error::Configuration("disk 'x' should have a 'count' value defined".into());
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.exit_code(), 2);

        let err = Error::UnsupportedOperator {
            operator: "between".into(),
            expression: "between(1, 2)".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = Error::AllocationShortfall {
            matched: 1,
            expected: 2,
        };
        assert_eq!(err.kind(), ErrorKind::AllocationShortfall);
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.to_string(), "Could only find 1 of the 2 expected devices");
    }

    #[test]
    fn test_error_retryable() {
        let transient = Error::collaborator("lsblk", "exit status 32");
        assert!(transient.is_retryable());
        assert_eq!(transient.exit_code(), 4);

        let config_err = Error::Configuration("invalid".into());
        assert!(!config_err.is_retryable());
    }
}
