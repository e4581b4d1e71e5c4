use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("{entity} '{id}' not found")]
    NotFoundError { entity: &'static str, id: String },

    #[error("Conflict: {message}")]
    ConflictError { message: String },

    #[error("Storage error in '{path}': {message}")]
    StorageError { path: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Lookup,
    Consistency,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DeskError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::ConflictError {
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFoundError {
            entity,
            id: id.into(),
        }
    }

    pub fn storage(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ValidationError { .. } => ErrorCategory::Input,
            Self::NotFoundError { .. } => ErrorCategory::Lookup,
            Self::ConflictError { .. } => ErrorCategory::Consistency,
            Self::IoError(_) | Self::SerializationError(_) | Self::StorageError { .. } => {
                ErrorCategory::Storage
            }
            Self::ConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    // 嚴重程度決定 CLI 的結束碼
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Lookup => ErrorSeverity::Medium,
            ErrorCategory::Consistency => ErrorSeverity::High,
            ErrorCategory::Storage | ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ValidationError { message } => format!("Invalid input: {}", message),
            Self::NotFoundError { entity, id } => format!("No {} with id '{}' exists", entity, id),
            Self::ConflictError { message } => format!("Operation rejected: {}", message),
            Self::StorageError { path, message } => {
                format!("Data file '{}' could not be used: {}", path, message)
            }
            Self::IoError(e) => format!("File access failed: {}", e),
            Self::SerializationError(e) => format!("Could not encode data: {}", e),
            Self::ConfigError { message } => format!("Configuration problem: {}", message),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ValidationError { .. } => "Check the field values and try again",
            Self::NotFoundError { .. } => "Use the list command to see existing ids",
            Self::ConflictError { .. } => {
                "Cancel the blocking reservations or choose another room or date range"
            }
            Self::StorageError { .. } => {
                "Repair or remove the damaged data file; a missing file is treated as empty"
            }
            Self::IoError(_) => "Check that the data directory exists and is writable",
            Self::SerializationError(_) => "Report this as a bug together with the command used",
            Self::ConfigError { .. } => {
                "Fix the configuration file or pass overrides on the command line"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, DeskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_by_category() {
        assert_eq!(DeskError::validation("x").severity(), ErrorSeverity::Medium);
        assert_eq!(DeskError::not_found("hotel", "H1").severity(), ErrorSeverity::Medium);
        assert_eq!(DeskError::conflict("x").severity(), ErrorSeverity::High);
        assert_eq!(
            DeskError::storage("hotels.json", "bad").severity(),
            ErrorSeverity::Critical
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = DeskError::not_found("customer", "C9");
        assert_eq!(err.to_string(), "customer 'C9' not found");
        assert!(err.user_friendly_message().contains("C9"));
    }
}
