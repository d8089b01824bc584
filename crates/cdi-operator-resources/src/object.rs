//! Emitted objects
//!
//! `ResourceObject` wraps each `k8s-openapi` type a group can produce. It
//! serializes untagged, so every object carries its own `apiVersion` and
//! `kind` exactly as the wrapped type writes them.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, ServiceAccount};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::{ClusterResourceScope, Metadata, NamespaceResourceScope, Resource};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{ResourceError, Result};

/// One emitted object
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
#[allow(clippy::large_enum_variant)]
pub enum ResourceObject {
    ClusterRole(ClusterRole),
    ClusterRoleBinding(ClusterRoleBinding),
    ServiceAccount(ServiceAccount),
    Role(Role),
    RoleBinding(RoleBinding),
    Deployment(Deployment),
    ConfigMap(ConfigMap),
    CustomResourceDefinition(CustomResourceDefinition),
}

/// Dispatch to the wrapped object
macro_rules! each_object {
    ($value:expr, $obj:ident => $body:expr) => {
        match $value {
            ResourceObject::ClusterRole($obj) => $body,
            ResourceObject::ClusterRoleBinding($obj) => $body,
            ResourceObject::ServiceAccount($obj) => $body,
            ResourceObject::Role($obj) => $body,
            ResourceObject::RoleBinding($obj) => $body,
            ResourceObject::Deployment($obj) => $body,
            ResourceObject::ConfigMap($obj) => $body,
            ResourceObject::CustomResourceDefinition($obj) => $body,
        }
    };
}

fn api_version_of<K: Resource>(_: &K) -> &'static str {
    K::API_VERSION
}

fn kind_of<K: Resource>(_: &K) -> &'static str {
    K::KIND
}

trait Scoped {
    const NAMESPACED: bool;
}

impl Scoped for NamespaceResourceScope {
    const NAMESPACED: bool = true;
}

impl Scoped for ClusterResourceScope {
    const NAMESPACED: bool = false;
}

fn is_namespaced<K>(_: &K) -> bool
where
    K: Resource,
    K::Scope: Scoped,
{
    <K::Scope as Scoped>::NAMESPACED
}

impl ResourceObject {
    pub fn kind(&self) -> &'static str {
        each_object!(self, obj => kind_of(obj))
    }

    pub fn api_version(&self) -> &'static str {
        each_object!(self, obj => api_version_of(obj))
    }

    pub fn metadata(&self) -> &ObjectMeta {
        each_object!(self, obj => obj.metadata())
    }

    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata().namespace.as_deref()
    }

    pub fn labels(&self) -> Option<&BTreeMap<String, String>> {
        self.metadata().labels.as_ref()
    }

    /// Whether the object's kind lives in a namespace
    pub fn is_namespaced(&self) -> bool {
        each_object!(self, obj => is_namespaced(obj))
    }

    pub fn as_deployment(&self) -> Option<&Deployment> {
        match self {
            Self::Deployment(deployment) => Some(deployment),
            _ => None,
        }
    }

    pub fn as_crd(&self) -> Option<&CustomResourceDefinition> {
        match self {
            Self::CustomResourceDefinition(crd) => Some(crd),
            _ => None,
        }
    }

    /// Check the object is addressable: it has a kind, an apiVersion and a name
    pub fn validate_gvk(&self) -> Result<()> {
        if self.kind().is_empty() || self.api_version().is_empty() || self.name().is_empty() {
            return Err(ResourceError::UninitializedGvk {
                name: self.name().to_string(),
            });
        }
        Ok(())
    }

    /// File-friendly identifier, `<kind>-<name>` in lowercase
    pub fn file_stem(&self) -> String {
        format!("{}-{}", self.kind().to_lowercase(), self.name())
    }
}

impl std::fmt::Display for ResourceObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.namespace() {
            Some(ns) => write!(f, "{} {}/{}", self.kind(), ns, self.name()),
            None => write!(f, "{} {}", self.kind(), self.name()),
        }
    }
}

macro_rules! impl_from {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for ResourceObject {
            fn from(value: $ty) -> Self {
                ResourceObject::$variant(value)
            }
        }
    };
}

impl_from!(ClusterRole, ClusterRole);
impl_from!(ClusterRoleBinding, ClusterRoleBinding);
impl_from!(ServiceAccount, ServiceAccount);
impl_from!(Role, Role);
impl_from!(RoleBinding, RoleBinding);
impl_from!(Deployment, Deployment);
impl_from!(ConfigMap, ConfigMap);
impl_from!(CustomResourceDefinition, CustomResourceDefinition);

/// Check every object of a factory's output is addressable
pub fn validate_gvks(objects: &[ResourceObject]) -> Result<()> {
    objects.iter().try_for_each(ResourceObject::validate_gvk)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named_cm(name: &str) -> ResourceObject {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("ns".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
        .into()
    }

    #[test]
    fn test_kind_and_api_version() {
        let cm = named_cm("cm");
        assert_eq!(cm.kind(), "ConfigMap");
        assert_eq!(cm.api_version(), "v1");
        assert!(cm.is_namespaced());

        let crd: ResourceObject = CustomResourceDefinition::default().into();
        assert_eq!(crd.kind(), "CustomResourceDefinition");
        assert_eq!(crd.api_version(), "apiextensions.k8s.io/v1");
        assert!(!crd.is_namespaced());

        let role: ResourceObject = ClusterRole::default().into();
        assert_eq!(role.api_version(), "rbac.authorization.k8s.io/v1");
        assert!(!role.is_namespaced());
    }

    #[test]
    fn test_untagged_serialization_carries_type_meta() {
        let json = serde_json::to_value(named_cm("cm")).unwrap();
        assert_eq!(json["apiVersion"], "v1");
        assert_eq!(json["kind"], "ConfigMap");
        assert_eq!(json["metadata"]["name"], "cm");
    }

    #[test]
    fn test_unnamed_object_fails_gvk_check() {
        let objects = vec![named_cm("a"), ServiceAccount::default().into()];
        let err = validate_gvks(&objects).unwrap_err();
        assert!(matches!(err, ResourceError::UninitializedGvk { .. }));
        assert!(validate_gvks(&objects[..1]).is_ok());
    }

    #[test]
    fn test_display_and_file_stem() {
        let cm = named_cm("leader");
        assert_eq!(cm.to_string(), "ConfigMap ns/leader");
        assert_eq!(cm.file_stem(), "configmap-leader");
    }
}
