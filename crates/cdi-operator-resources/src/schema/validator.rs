//! Custom resource validation against a served version's schema

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use serde_json::Value as JsonValue;

use crate::error::{ResourceError, Result};

/// One failed check on a custom resource document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrViolation {
    /// JSON pointer into the document, `(root)` for the document itself
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for CrViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validator for custom resources of one served version
pub struct CrValidator {
    version: String,
    compiled: jsonschema::Validator,
}

impl CrValidator {
    /// Compile the `openAPIV3Schema` of `version`
    pub fn new(crd: &CustomResourceDefinition, version: &str) -> Result<Self> {
        let unusable = |message: String| ResourceError::InvalidSchema {
            version: version.to_string(),
            message,
        };

        let schema = crd
            .spec
            .versions
            .iter()
            .find(|v| v.name == version)
            .ok_or_else(|| unusable("version is not served".to_string()))?
            .schema
            .as_ref()
            .and_then(|s| s.open_api_v3_schema.as_ref())
            .ok_or_else(|| unusable("no openAPIV3Schema".to_string()))?;

        let json_schema = serde_json::to_value(schema).map_err(ResourceError::EncodingFailed)?;
        let compiled = jsonschema::validator_for(&json_schema)
            .map_err(|e| unusable(format!("Invalid schema: {}", e)))?;

        Ok(Self {
            version: version.to_string(),
            compiled,
        })
    }

    /// Compile the schema of the storage version
    pub fn for_storage_version(crd: &CustomResourceDefinition) -> Result<Self> {
        let version = crd
            .spec
            .versions
            .iter()
            .find(|v| v.storage)
            .map(|v| v.name.clone())
            .unwrap_or_default();
        Self::new(crd, &version)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_valid(&self, resource: &JsonValue) -> bool {
        self.compiled.is_valid(resource)
    }

    /// Validate a custom resource document, returning every violation
    pub fn validate(&self, resource: &JsonValue) -> Vec<CrViolation> {
        if self.compiled.is_valid(resource) {
            return Vec::new();
        }

        self.compiled
            .iter_errors(resource)
            .map(|e| {
                let path = e.instance_path.to_string();
                CrViolation {
                    path: if path.is_empty() {
                        "(root)".to_string()
                    } else {
                        path
                    },
                    message: e.to_string().replace('"', "'"),
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for CrValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrValidator")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}
