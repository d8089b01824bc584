//! Emission configuration
//!
//! A `Config` is built once by the caller and read by every factory. It can
//! be constructed in code through [`Config::builder`] or loaded from a YAML
//! or JSON document.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::images::ImageSet;

/// Input record for resource and bundle emission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Version reported by the operator (`OPERATOR_VERSION`)
    #[serde(default)]
    pub operator_version: String,

    /// Namespace the operator is installed into
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Pull policy for every CDI container
    #[serde(default = "default_pull_policy")]
    pub image_pull_policy: String,

    /// Log verbosity passed to the operator
    #[serde(default = "default_verbosity")]
    pub verbosity: String,

    /// Component images
    #[serde(default)]
    pub images: ImageSet,

    /// Whether the operator deploys cluster-scoped resources itself
    #[serde(default = "default_true")]
    pub deploy_cluster_resources: bool,

    /// Base64-encoded PNG shown by the lifecycle manager
    #[serde(default)]
    pub icon_base64: String,

    /// Version of the lifecycle bundle being generated
    #[serde(default)]
    pub csv_version: String,

    /// Version of the bundle this one replaces (empty for the first release)
    #[serde(default)]
    pub replaces_csv_version: String,
}

fn default_namespace() -> String {
    "cdi".to_string()
}

fn default_pull_policy() -> String {
    "IfNotPresent".to_string()
}

fn default_verbosity() -> String {
    "1".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            operator_version: String::new(),
            namespace: default_namespace(),
            image_pull_policy: default_pull_policy(),
            verbosity: default_verbosity(),
            images: ImageSet::default(),
            deploy_cluster_resources: true,
            icon_base64: String::new(),
            csv_version: String::new(),
            replaces_csv_version: String::new(),
        }
    }
}

impl Config {
    /// Start building a configuration from defaults
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Parse a configuration from YAML (JSON is accepted as a YAML subset)
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            let config: Config = serde_json::from_str(&content)?;
            config.validate()?;
            return Ok(config);
        }
        Self::from_yaml_str(&content)
    }

    /// Check the fields every factory relies on
    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(CoreError::InvalidConfig {
                message: "namespace must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Copy of this configuration with image defaults filled in
    pub fn with_image_defaults(&self) -> Self {
        Self {
            images: self.images.clone().fill_defaults(),
            ..self.clone()
        }
    }

    /// `DEPLOY_CLUSTER_RESOURCES` value
    pub fn deploy_cluster_resources_value(&self) -> &'static str {
        if self.deploy_cluster_resources {
            "true"
        } else {
            "false"
        }
    }
}

/// Fluent builder for [`Config`]
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn operator_version(mut self, version: impl Into<String>) -> Self {
        self.config.operator_version = version.into();
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    pub fn image_pull_policy(mut self, policy: impl Into<String>) -> Self {
        self.config.image_pull_policy = policy.into();
        self
    }

    pub fn verbosity(mut self, verbosity: impl Into<String>) -> Self {
        self.config.verbosity = verbosity.into();
        self
    }

    pub fn images(mut self, images: ImageSet) -> Self {
        self.config.images = images;
        self
    }

    pub fn deploy_cluster_resources(mut self, deploy: bool) -> Self {
        self.config.deploy_cluster_resources = deploy;
        self
    }

    pub fn icon_base64(mut self, icon: impl Into<String>) -> Self {
        self.config.icon_base64 = icon.into();
        self
    }

    pub fn csv_version(mut self, version: impl Into<String>) -> Self {
        self.config.csv_version = version.into();
        self
    }

    pub fn replaces_csv_version(mut self, version: impl Into<String>) -> Self {
        self.config.replaces_csv_version = version.into();
        self
    }

    /// Finish the configuration, filling image defaults
    pub fn build(self) -> Config {
        self.config.with_image_defaults()
    }

    /// Finish the configuration without touching the images
    pub fn build_raw(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builder_fills_image_defaults() {
        let config = Config::builder()
            .namespace("ns")
            .operator_version("2.0")
            .build();

        assert_eq!(config.namespace, "ns");
        assert_eq!(config.operator_version, "2.0");
        assert!(config.images.is_filled());
        assert!(config.deploy_cluster_resources);
    }

    #[test]
    fn test_build_raw_keeps_empty_images() {
        let config = Config::builder().build_raw();
        assert!(!config.images.is_filled());
    }

    #[test]
    fn test_parse_yaml_with_defaults() {
        let yaml = r#"
operatorVersion: v1.2.3
namespace: cdi-system
images:
  controllerImage: C
  uplodaProxyImage: UP
"#;
        let config = Config::from_yaml_str(yaml).unwrap();

        assert_eq!(config.operator_version, "v1.2.3");
        assert_eq!(config.namespace, "cdi-system");
        assert_eq!(config.image_pull_policy, "IfNotPresent");
        assert_eq!(config.verbosity, "1");
        assert_eq!(config.images.controller_image, "C");
        assert_eq!(config.images.upload_proxy_image, "UP");
        assert!(config.deploy_cluster_resources);
    }

    #[test]
    fn test_empty_namespace_is_rejected() {
        let err = Config::from_yaml_str("namespace: ''").unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig { .. }));
        assert!(err.to_string().contains("namespace"));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"namespace":"x","csvVersion":"1.2.3"}}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.namespace, "x");
        assert_eq!(config.csv_version, "1.2.3");
    }

    #[test]
    fn test_deploy_cluster_resources_value() {
        let config = Config::builder().deploy_cluster_resources(false).build();
        assert_eq!(config.deploy_cluster_resources_value(), "false");
        assert_eq!(Config::default().deploy_cluster_resources_value(), "true");
    }
}
