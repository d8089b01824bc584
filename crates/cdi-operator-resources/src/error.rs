//! Error types for cdi-operator-resources

use thiserror::Error;

use crate::schema::SchemaViolation;

/// Result type for resource and bundle emission
pub type Result<T> = std::result::Result<T, ResourceError>;

/// Errors that can occur while emitting resources or assembling a bundle
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResourceError {
    /// Requested resource group is not registered
    #[error("group {group} does not exist{}", suggestion_hint(.suggestion))]
    UnknownGroup {
        group: String,
        suggestion: Option<String>,
    },

    /// Bundle version is not a semantic version
    #[error("invalid version '{version}': {source}")]
    InvalidVersion {
        version: String,
        #[source]
        source: semver::Error,
    },

    /// Install strategy payload could not be serialized
    #[error("failed to encode install strategy: {0}")]
    EncodingFailed(#[source] serde_json::Error),

    /// A factory produced an object without apiVersion or kind
    #[error("uninitialized group/version/kind for object '{name}'")]
    UninitializedGvk { name: String },

    /// A schema declaration is malformed
    #[error("schema validation failed: {0}")]
    Schema(#[from] SchemaViolation),

    /// A served version's schema cannot be used for validation
    #[error("schema for version '{version}' is unusable: {message}")]
    InvalidSchema { version: String, message: String },
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{}'?)", s),
        None => String::new(),
    }
}

/// Error kinds, independent of the message carried by each error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownGroup,
    InvalidVersion,
    EncodingFailed,
    UninitializedGvk,
    SchemaValidation,
}

impl ResourceError {
    /// Kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownGroup { .. } => ErrorKind::UnknownGroup,
            Self::InvalidVersion { .. } => ErrorKind::InvalidVersion,
            Self::EncodingFailed(_) => ErrorKind::EncodingFailed,
            Self::UninitializedGvk { .. } => ErrorKind::UninitializedGvk,
            Self::Schema(_) | Self::InvalidSchema { .. } => ErrorKind::SchemaValidation,
        }
    }

    /// Check if this error was caused by caller input (as opposed to a defect)
    pub fn is_input_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::UnknownGroup | ErrorKind::InvalidVersion
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_group_message_contains_group() {
        let err = ResourceError::UnknownGroup {
            group: "does-not-exist".to_string(),
            suggestion: None,
        };
        assert_eq!(err.to_string(), "group does-not-exist does not exist");
        assert_eq!(err.kind(), ErrorKind::UnknownGroup);
        assert!(err.is_input_error());
    }

    #[test]
    fn test_unknown_group_with_suggestion() {
        let err = ResourceError::UnknownGroup {
            group: "operator-rabc".to_string(),
            suggestion: Some("operator-rbac".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("operator-rabc"));
        assert!(msg.contains("did you mean 'operator-rbac'"));
    }

    #[test]
    fn test_invalid_version_kind() {
        let source = semver::Version::parse("not-a-version").unwrap_err();
        let err = ResourceError::InvalidVersion {
            version: "not-a-version".to_string(),
            source,
        };
        assert_eq!(err.kind(), ErrorKind::InvalidVersion);
        assert!(err.to_string().contains("not-a-version"));
    }
}
