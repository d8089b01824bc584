//! CLI error types with exit code handling
//!
//! Library errors are folded into [`CliError`], which carries the exit code
//! the process should terminate with.

use cdi_operator_core::CoreError;
use cdi_operator_resources::{ErrorKind, ResourceError};
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Caller input was rejected (unknown group, bad version, bad config)
    #[error("Invalid input: {message}")]
    #[diagnostic(code(cdi_operator_gen::input))]
    Input {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(cdi_operator_gen::io))]
    Io { message: String },

    /// A generated value could not be serialized
    #[error("Failed to serialize output: {message}")]
    #[diagnostic(code(cdi_operator_gen::output))]
    Output { message: String },

    /// Internal error (unexpected library failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(cdi_operator_gen::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Input { .. } => exit_codes::INPUT_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Output { .. } => exit_codes::ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create an input error with help text
    pub fn input_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn output(err: impl std::fmt::Display) -> Self {
        Self::Output {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(io) => io.into(),
            other => CliError::Input {
                message: other.to_string(),
                help: Some("check the --config file and the CDI_* environment".to_string()),
            },
        }
    }
}

impl From<ResourceError> for CliError {
    fn from(err: ResourceError) -> Self {
        let message = err.to_string();
        if !err.is_input_error() {
            return match err.kind() {
                ErrorKind::EncodingFailed => CliError::Output { message },
                _ => CliError::Internal { message },
            };
        }

        let help = match err.kind() {
            ErrorKind::UnknownGroup => "run `cdi-operator-gen groups` to list the available groups",
            _ => "versions must be semantic versions such as 1.2.3 (see --csv-version)",
        };
        CliError::input_with_help(message, help)
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let unknown: CliError = ResourceError::UnknownGroup {
            group: "nope".to_string(),
            suggestion: None,
        }
        .into();
        assert_eq!(unknown.exit_code(), exit_codes::INPUT_ERROR);

        let io: CliError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(io.exit_code(), exit_codes::IO_ERROR);

        let internal: CliError = ResourceError::UninitializedGvk {
            name: String::new(),
        }
        .into();
        assert_eq!(internal.exit_code(), exit_codes::ERROR);

        let mut crd = cdi_operator_resources::schema::build_crd();
        crd.spec.versions[1].storage = false;
        let schema: CliError = cdi_operator_resources::schema::ensure_valid_crd(&crd)
            .unwrap_err()
            .into();
        assert!(matches!(schema, CliError::Internal { .. }));
        assert_eq!(schema.exit_code(), exit_codes::ERROR);
    }

    #[test]
    fn test_config_errors_are_input_errors() {
        let err: CliError = CoreError::InvalidConfig {
            message: "namespace must not be empty".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_codes::INPUT_ERROR);
        assert!(err.to_string().contains("namespace"));
    }
}
