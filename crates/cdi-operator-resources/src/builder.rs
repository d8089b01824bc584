//! Constructors for the objects needed to install the operator
//!
//! Every constructor stamps the builder's operator labels on the object it
//! returns. The common label set is kept alongside for component objects.

use cdi_operator_core::naming;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    ConfigMap, Container, ContainerPort, PodSecurityContext, PodSpec, PodTemplateSpec,
    ServiceAccount, Toleration,
};
use k8s_openapi::api::rbac::v1::{
    ClusterRole, ClusterRoleBinding, PolicyRule, Role, RoleBinding, RoleRef, Subject,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::collections::BTreeMap;

const RBAC_GROUP: &str = "rbac.authorization.k8s.io";

/// Resource constructors sharing one pair of label sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBuilder {
    common_labels: BTreeMap<String, String>,
    operator_labels: BTreeMap<String, String>,
}

impl Default for ResourceBuilder {
    fn default() -> Self {
        Self::new(naming::common_labels(), naming::operator_labels())
    }
}

impl ResourceBuilder {
    pub fn new(
        common_labels: BTreeMap<String, String>,
        operator_labels: BTreeMap<String, String>,
    ) -> Self {
        Self {
            common_labels,
            operator_labels,
        }
    }

    /// Add the common labels to `labels`, keeping keys already present
    pub fn with_common_labels(&self, labels: BTreeMap<String, String>) -> BTreeMap<String, String> {
        naming::with_labels(labels, &self.common_labels)
    }

    /// Add the operator labels to `labels`, keeping keys already present
    pub fn with_operator_labels(
        &self,
        labels: BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        naming::with_labels(labels, &self.operator_labels)
    }

    fn operator_meta(&self, name: &str, namespace: Option<&str>) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: namespace.map(str::to_string),
            labels: Some(self.operator_labels.clone()),
            ..Default::default()
        }
    }

    fn service_account_subject(service_account: &str, namespace: &str) -> Subject {
        Subject {
            kind: "ServiceAccount".to_string(),
            name: service_account.to_string(),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        }
    }

    /// Cluster-scoped grant bundle
    pub fn operator_cluster_role(&self, name: &str, rules: Vec<PolicyRule>) -> ClusterRole {
        ClusterRole {
            metadata: self.operator_meta(name, None),
            rules: Some(rules),
            ..Default::default()
        }
    }

    /// Bind a service account to a cluster role of the same name as the binding
    pub fn operator_cluster_role_binding(
        &self,
        service_account: &str,
        cluster_role: &str,
        service_account_namespace: &str,
    ) -> ClusterRoleBinding {
        ClusterRoleBinding {
            metadata: self.operator_meta(cluster_role, None),
            role_ref: RoleRef {
                api_group: RBAC_GROUP.to_string(),
                kind: "ClusterRole".to_string(),
                name: cluster_role.to_string(),
            },
            subjects: Some(vec![Self::service_account_subject(
                service_account,
                service_account_namespace,
            )]),
        }
    }

    pub fn operator_service_account(&self, name: &str, namespace: &str) -> ServiceAccount {
        ServiceAccount {
            metadata: self.operator_meta(name, Some(namespace)),
            ..Default::default()
        }
    }

    /// Namespaced grant bundle
    pub fn role(&self, name: &str, namespace: &str, rules: Vec<PolicyRule>) -> Role {
        Role {
            metadata: self.operator_meta(name, Some(namespace)),
            rules: Some(rules),
        }
    }

    /// Bind a service account to a role in the service account's namespace
    pub fn role_binding(
        &self,
        service_account: &str,
        role: &str,
        service_account_namespace: &str,
    ) -> RoleBinding {
        RoleBinding {
            metadata: self.operator_meta(role, Some(service_account_namespace)),
            role_ref: RoleRef {
                api_group: RBAC_GROUP.to_string(),
                kind: "Role".to_string(),
                name: role.to_string(),
            },
            subjects: Some(vec![Self::service_account_subject(
                service_account,
                service_account_namespace,
            )]),
        }
    }

    /// Deployment skeleton without containers
    ///
    /// The pods are selected by `{selector_key: selector_value}` and run as
    /// non-root on linux nodes, tolerating the critical-addons taint. The
    /// caller adds the container.
    pub fn operator_deployment(
        &self,
        name: &str,
        namespace: &str,
        selector_key: &str,
        selector_value: &str,
        service_account: &str,
        replicas: i32,
    ) -> Deployment {
        let selector =
            BTreeMap::from([(selector_key.to_string(), selector_value.to_string())]);
        let labels = self.with_operator_labels(selector.clone());

        Deployment {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                labels: Some(labels.clone()),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: Some(replicas),
                selector: LabelSelector {
                    match_labels: Some(selector),
                    ..Default::default()
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(labels),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        service_account_name: Some(service_account.to_string()),
                        security_context: Some(PodSecurityContext {
                            run_as_non_root: Some(true),
                            ..Default::default()
                        }),
                        node_selector: Some(BTreeMap::from([(
                            "kubernetes.io/os".to_string(),
                            "linux".to_string(),
                        )])),
                        tolerations: Some(vec![Toleration {
                            key: Some("CriticalAddonsOnly".to_string()),
                            operator: Some("Exists".to_string()),
                            ..Default::default()
                        }]),
                        containers: Vec::new(),
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Empty config map, used by the operator for leader election
    pub fn config_map(
        &self,
        name: &str,
        namespace: &str,
        labels: BTreeMap<String, String>,
    ) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                labels: Some(self.with_operator_labels(labels)),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Container exposing the given ports
    pub fn ports_container(
        &self,
        name: &str,
        image: &str,
        pull_policy: &str,
        ports: Vec<ContainerPort>,
    ) -> Container {
        Container {
            name: name.to_string(),
            image: Some(image.to_string()),
            image_pull_policy: Some(pull_policy.to_string()),
            ports: Some(ports),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdi_operator_core::naming::labels;

    fn has_operator_label(meta: &ObjectMeta) -> bool {
        meta.labels
            .as_ref()
            .and_then(|l| l.get(labels::OPERATOR))
            .is_some_and(|v| v.is_empty())
    }

    #[test]
    fn test_cluster_role_binding_refs_role() {
        let builder = ResourceBuilder::default();
        let binding = builder.operator_cluster_role_binding("sa", "cluster-role", "ns");

        assert_eq!(binding.metadata.name.as_deref(), Some("cluster-role"));
        assert!(binding.metadata.namespace.is_none());
        assert_eq!(binding.role_ref.kind, "ClusterRole");
        assert_eq!(binding.role_ref.name, "cluster-role");

        let subjects = binding.subjects.unwrap();
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].kind, "ServiceAccount");
        assert_eq!(subjects[0].namespace.as_deref(), Some("ns"));
        assert!(has_operator_label(&binding.metadata));
    }

    #[test]
    fn test_role_binding_is_namespaced() {
        let builder = ResourceBuilder::default();
        let binding = builder.role_binding("sa", "role", "ns");

        assert_eq!(binding.metadata.namespace.as_deref(), Some("ns"));
        assert_eq!(binding.role_ref.kind, "Role");
        assert!(has_operator_label(&binding.metadata));
    }

    #[test]
    fn test_deployment_skeleton() {
        let builder = ResourceBuilder::default();
        let deployment = builder.operator_deployment("op", "ns", "name", "op", "sa", 1);

        let spec = deployment.spec.unwrap();
        assert_eq!(spec.replicas, Some(1));
        assert_eq!(
            spec.selector.match_labels,
            Some(BTreeMap::from([("name".to_string(), "op".to_string())]))
        );

        let template_labels = spec.template.metadata.unwrap().labels.unwrap();
        assert_eq!(template_labels["name"], "op");
        assert_eq!(template_labels[labels::OPERATOR], "");

        let pod = spec.template.spec.unwrap();
        assert_eq!(pod.service_account_name.as_deref(), Some("sa"));
        assert!(pod.containers.is_empty());
        assert_eq!(
            pod.security_context.and_then(|s| s.run_as_non_root),
            Some(true)
        );
        assert!(has_operator_label(&deployment.metadata));
    }

    #[test]
    fn test_config_map_keeps_caller_labels() {
        let builder = ResourceBuilder::default();
        let extra = BTreeMap::from([("tier".to_string(), "infra".to_string())]);
        let cm = builder.config_map("cm", "ns", extra);

        let merged = cm.metadata.labels.unwrap();
        assert_eq!(merged["tier"], "infra");
        assert_eq!(merged[labels::OPERATOR], "");
        assert!(cm.data.is_none());
    }

    #[test]
    fn test_common_labels_do_not_override() {
        let builder = ResourceBuilder::default();
        let merged = builder.with_common_labels(BTreeMap::from([(
            labels::MANAGED_BY.to_string(),
            "someone-else".to_string(),
        )]));

        assert_eq!(merged[labels::MANAGED_BY], "someone-else");
        assert_eq!(merged[labels::CDI], "");
    }
}
