//! Lifecycle-manager types
//!
//! The subset of the `operators.coreos.com/v1alpha1` ClusterServiceVersion
//! the CDI bundle fills in. The install strategy payload is kept as raw JSON
//! so the bundle carries the exact bytes that were encoded.

use k8s_openapi::api::apps::v1::DeploymentSpec;
use k8s_openapi::api::rbac::v1::PolicyRule;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::collections::BTreeMap;

use crate::error::{ResourceError, Result};

/// Install strategy name for deployment-based operators
pub const DEPLOYMENT_STRATEGY: &str = "deployment";

#[derive(CustomResource, Clone, Debug, Serialize, Deserialize)]
#[kube(
    group = "operators.coreos.com",
    version = "v1alpha1",
    kind = "ClusterServiceVersion",
    plural = "clusterserviceversions",
    shortname = "csv",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterServiceVersionSpec {
    pub display_name: String,
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub version: semver::Version,
    pub maturity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaces: Option<String>,
    #[serde(default)]
    pub maintainers: Vec<Maintainer>,
    pub provider: AppLink,
    #[serde(default)]
    pub links: Vec<AppLink>,
    #[serde(default)]
    pub icon: Vec<Icon>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    pub selector: LabelSelector,
    pub install_modes: Vec<InstallMode>,
    pub install: NamedInstallStrategy,
    pub customresourcedefinitions: CustomResourceDefinitions,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maintainer {
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppLink {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    #[serde(rename = "base64data")]
    pub data: String,
    #[serde(rename = "mediatype")]
    pub media_type: String,
}

/// Install modes understood by the lifecycle manager
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstallModeType {
    OwnNamespace,
    SingleNamespace,
    MultiNamespace,
    AllNamespaces,
}

impl InstallModeType {
    pub const ALL: [InstallModeType; 4] = [
        InstallModeType::OwnNamespace,
        InstallModeType::SingleNamespace,
        InstallModeType::MultiNamespace,
        InstallModeType::AllNamespaces,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallMode {
    #[serde(rename = "type")]
    pub type_: InstallModeType,
    pub supported: bool,
}

/// Named strategy with its encoded payload
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NamedInstallStrategy {
    pub strategy: String,
    pub spec: Box<RawValue>,
}

impl NamedInstallStrategy {
    /// Encode a deployment strategy payload
    pub fn deployment(details: &StrategyDetailsDeployment) -> Result<Self> {
        let spec = serde_json::value::to_raw_value(details).map_err(ResourceError::EncodingFailed)?;
        Ok(Self {
            strategy: DEPLOYMENT_STRATEGY.to_string(),
            spec,
        })
    }

    /// Decode the payload of a deployment strategy
    pub fn decode_deployment(&self) -> Result<StrategyDetailsDeployment> {
        serde_json::from_str(self.spec.get()).map_err(ResourceError::EncodingFailed)
    }
}

/// Payload of the `deployment` install strategy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDetailsDeployment {
    pub permissions: Vec<StrategyDeploymentPermissions>,
    pub cluster_permissions: Vec<StrategyDeploymentPermissions>,
    pub deployments: Vec<StrategyDeploymentSpec>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDeploymentPermissions {
    pub service_account_name: String,
    pub rules: Vec<PolicyRule>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyDeploymentSpec {
    pub name: String,
    pub spec: DeploymentSpec,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomResourceDefinitions {
    #[serde(default)]
    pub owned: Vec<CrdDescription>,
}

/// Description of a CRD the operator owns
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrdDescription {
    pub name: String,
    pub version: String,
    pub kind: String,
    pub display_name: String,
    pub description: String,
    #[serde(default)]
    pub resources: Vec<ApiResourceReference>,
    #[serde(default)]
    pub spec_descriptors: Vec<Descriptor>,
    #[serde(default)]
    pub status_descriptors: Vec<Descriptor>,
}

/// Resource kind created by instances of an owned CRD
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResourceReference {
    pub name: String,
    pub kind: String,
    pub version: String,
}

/// UI hint for one field of an owned CRD
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub path: String,
    pub display_name: String,
    pub description: String,
    #[serde(rename = "x-descriptors")]
    pub x_descriptors: Vec<String>,
}

impl Descriptor {
    pub fn new(path: &str, display_name: &str, description: &str, x_descriptor: &str) -> Self {
        Self {
            path: path.to_string(),
            display_name: display_name.to_string(),
            description: description.to_string(),
            x_descriptors: vec![x_descriptor.to_string()],
        }
    }
}
