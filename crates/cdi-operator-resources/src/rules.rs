//! Policy rules granted to the CDI operator
//!
//! Two bundles are produced: cluster rules (bound through the operator's
//! cluster role) and namespaced rules (bound through its role in the install
//! namespace). The cluster bundle ends with the rules of the CDI components
//! the operator deploys, which come from a [`ClusterRulesProvider`].

use cdi_operator_core::naming::{CDI_GROUP, UPLOAD_GROUP};
use k8s_openapi::api::rbac::v1::PolicyRule;

const FULL: &[&str] = &["get", "list", "watch", "create", "update", "patch", "delete"];
const READ: &[&str] = &["get", "list", "watch"];

/// Validating webhooks owned by CDI
pub const VALIDATING_WEBHOOKS: &[&str] = &[
    "cdi-api-dataimportcron-validate",
    "cdi-api-populator-validate",
    "cdi-api-datavolume-validate",
    "cdi-api-validate",
    "objecttransfer-api-validate",
];

/// Mutating webhooks owned by CDI
pub const MUTATING_WEBHOOKS: &[&str] = &["cdi-api-datavolume-mutate", "cdi-api-pvc-mutate"];

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Build a rule over every object of the given resources
pub fn rule(api_groups: &[&str], resources: &[&str], verbs: &[&str]) -> PolicyRule {
    PolicyRule {
        api_groups: Some(strings(api_groups)),
        resources: Some(strings(resources)),
        verbs: strings(verbs),
        ..Default::default()
    }
}

/// Build a rule restricted to named objects
pub fn named_rule(
    api_groups: &[&str],
    resources: &[&str],
    resource_names: &[&str],
    verbs: &[&str],
) -> PolicyRule {
    PolicyRule {
        resource_names: Some(strings(resource_names)),
        ..rule(api_groups, resources, verbs)
    }
}

/// Source of cluster rules contributed by the components the operator deploys
pub trait ClusterRulesProvider: Send + Sync {
    fn cluster_rules(&self) -> Vec<PolicyRule>;
}

/// Cluster rules of the CDI api-server, controller and upload proxy
#[derive(Debug, Clone, Copy, Default)]
pub struct CdiComponentRules;

impl CdiComponentRules {
    pub fn apiserver_rules() -> Vec<PolicyRule> {
        vec![
            rule(&["authorization.k8s.io"], &["subjectaccessreviews"], &["create"]),
            rule(&[""], &["configmaps"], READ),
            rule(&[""], &["persistentvolumeclaims"], &["get"]),
            rule(&[CDI_GROUP], &["datavolumes"], &["list", "get"]),
            rule(&[CDI_GROUP], &["cdis"], &["get"]),
            rule(&[CDI_GROUP], &["cdis/finalizers"], &["*"]),
        ]
    }

    pub fn controller_rules() -> Vec<PolicyRule> {
        vec![
            rule(&[""], &["events"], &["create", "patch"]),
            rule(
                &[""],
                &["persistentvolumeclaims", "persistentvolumes"],
                &["get", "list", "watch", "create", "update", "delete"],
            ),
            rule(
                &[""],
                &["persistentvolumeclaims/finalizers", "pods/finalizers"],
                &["update"],
            ),
            rule(
                &[""],
                &["pods", "services"],
                &["get", "list", "watch", "create", "delete"],
            ),
            rule(&[""], &["configmaps"], &["get"]),
            rule(&["extensions"], &["ingresses"], READ),
            rule(&["storage.k8s.io"], &["storageclasses"], READ),
            rule(&["route.openshift.io"], &["routes"], READ),
            rule(&["config.openshift.io"], &["proxies"], READ),
            rule(&[CDI_GROUP], &["*"], &["*"]),
            rule(
                &["snapshot.storage.k8s.io"],
                &["volumesnapshots", "volumesnapshotclasses"],
                &["*"],
            ),
            rule(&["snapshot.storage.k8s.io"], &["volumesnapshots/finalizers"], &["update"]),
            rule(
                &["apiextensions.k8s.io"],
                &["customresourcedefinitions"],
                READ,
            ),
        ]
    }

    pub fn uploadproxy_rules() -> Vec<PolicyRule> {
        vec![
            rule(&[""], &["persistentvolumeclaims"], &["get"]),
            rule(&[""], &["pods"], &["get"]),
        ]
    }
}

impl ClusterRulesProvider for CdiComponentRules {
    fn cluster_rules(&self) -> Vec<PolicyRule> {
        let mut rules = Self::apiserver_rules();
        rules.extend(Self::controller_rules());
        rules.extend(Self::uploadproxy_rules());
        rules
    }
}

/// Rules the operator needs on cluster-scoped resources
pub fn cluster_rules(provider: &dyn ClusterRulesProvider) -> Vec<PolicyRule> {
    let mut rules = vec![
        rule(
            &["rbac.authorization.k8s.io"],
            &["clusterrolebindings", "clusterroles"],
            &["get", "list", "watch", "create", "update", "delete"],
        ),
        rule(&[""], &["pods", "services"], &["get", "list", "watch", "delete"]),
        rule(
            &["security.openshift.io"],
            &["securitycontextconstraints"],
            &["get", "list", "watch", "update", "create"],
        ),
        rule(
            &["apiextensions.k8s.io"],
            &["customresourcedefinitions", "customresourcedefinitions/status"],
            &["get", "list", "watch", "create", "update", "delete"],
        ),
        rule(&[CDI_GROUP, UPLOAD_GROUP], &["*"], &["*"]),
        rule(
            &["admissionregistration.k8s.io"],
            &["validatingwebhookconfigurations", "mutatingwebhookconfigurations"],
            &["create", "list", "watch"],
        ),
        named_rule(
            &["admissionregistration.k8s.io"],
            &["validatingwebhookconfigurations"],
            VALIDATING_WEBHOOKS,
            &["get", "update", "delete"],
        ),
        named_rule(
            &["admissionregistration.k8s.io"],
            &["mutatingwebhookconfigurations"],
            MUTATING_WEBHOOKS,
            &["get", "update", "delete"],
        ),
        rule(
            &["apiregistration.k8s.io"],
            &["apiservices"],
            &["get", "list", "watch", "create", "update", "delete"],
        ),
    ];
    rules.extend(provider.cluster_rules());
    rules
}

/// Rules the operator needs in its own namespace
pub fn namespaced_rules() -> Vec<PolicyRule> {
    vec![
        rule(
            &["rbac.authorization.k8s.io"],
            &["rolebindings", "roles"],
            &["get", "list", "watch", "create", "update", "delete"],
        ),
        rule(
            &[""],
            &["serviceaccounts", "configmaps", "events", "secrets", "services"],
            FULL,
        ),
        rule(
            &["apps"],
            &["deployments", "deployments/finalizers"],
            &["get", "list", "watch", "create", "update", "delete"],
        ),
        rule(
            &["route.openshift.io"],
            &["routes", "routes/custom-host"],
            &["get", "list", "watch", "create", "update"],
        ),
        rule(&["config.openshift.io"], &["proxies"], READ),
        rule(
            &["monitoring.coreos.com"],
            &["servicemonitors", "prometheusrules"],
            &["get", "list", "watch", "create", "delete", "update", "patch"],
        ),
        rule(
            &["coordination.k8s.io"],
            &["leases"],
            &["get", "create", "update"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grants(rules: &[PolicyRule], group: &str, resource: &str, verb: &str) -> bool {
        rules.iter().any(|r| {
            r.api_groups.iter().flatten().any(|g| g == group)
                && r.resources.iter().flatten().any(|res| res == resource || res == "*")
                && r.verbs.iter().any(|v| v == verb || v == "*")
        })
    }

    #[test]
    fn test_cluster_rules_cover_operator_needs() {
        let rules = cluster_rules(&CdiComponentRules);

        assert!(grants(&rules, "rbac.authorization.k8s.io", "clusterroles", "delete"));
        assert!(grants(&rules, "security.openshift.io", "securitycontextconstraints", "update"));
        assert!(grants(&rules, "", "pods", "delete"));
        assert!(grants(&rules, "", "services", "get"));
        assert!(grants(&rules, "apiextensions.k8s.io", "customresourcedefinitions", "create"));
        assert!(grants(&rules, "cdi.kubevirt.io", "datavolumes", "patch"));
        assert!(grants(&rules, "upload.cdi.kubevirt.io", "uploadtokenrequests", "create"));
        assert!(grants(&rules, "apiregistration.k8s.io", "apiservices", "update"));
    }

    #[test]
    fn test_operator_rules_do_not_depend_on_provider() {
        struct NoExtraRules;
        impl ClusterRulesProvider for NoExtraRules {
            fn cluster_rules(&self) -> Vec<PolicyRule> {
                Vec::new()
            }
        }

        let rules = cluster_rules(&NoExtraRules);
        for resource in ["pods", "services"] {
            for verb in ["get", "list", "watch", "delete"] {
                assert!(grants(&rules, "", resource, verb), "{} {}", verb, resource);
            }
            assert!(!grants(&rules, "", resource, "create"), "{}", resource);
        }
    }

    #[test]
    fn test_webhook_updates_are_restricted_by_name() {
        let rules = cluster_rules(&CdiComponentRules);
        let named: Vec<_> = rules
            .iter()
            .filter(|r| r.verbs.contains(&"update".to_string()))
            .filter(|r| {
                r.resources
                    .iter()
                    .flatten()
                    .any(|res| res.ends_with("webhookconfigurations"))
            })
            .collect();

        assert_eq!(named.len(), 2);
        assert!(named.iter().all(|r| r.resource_names.is_some()));
        assert_eq!(
            named[1].resource_names.as_deref(),
            Some(&["cdi-api-datavolume-mutate".to_string(), "cdi-api-pvc-mutate".to_string()][..])
        );
    }

    #[test]
    fn test_provider_rules_are_appended_last() {
        struct Fixed;
        impl ClusterRulesProvider for Fixed {
            fn cluster_rules(&self) -> Vec<PolicyRule> {
                vec![rule(&["example.io"], &["widgets"], &["get"])]
            }
        }

        let rules = cluster_rules(&Fixed);
        assert_eq!(rules.len(), 10);
        assert_eq!(
            rules.last().and_then(|r| r.api_groups.clone()),
            Some(vec!["example.io".to_string()])
        );
    }

    #[test]
    fn test_component_rules_order() {
        let rules = CdiComponentRules.cluster_rules();
        let apiserver = CdiComponentRules::apiserver_rules();
        let controller = CdiComponentRules::controller_rules();

        assert_eq!(rules[..apiserver.len()], apiserver[..]);
        assert_eq!(
            rules[apiserver.len()..apiserver.len() + controller.len()],
            controller[..]
        );
        assert_eq!(
            rules.len(),
            apiserver.len() + controller.len() + CdiComponentRules::uploadproxy_rules().len()
        );
    }

    #[test]
    fn test_namespaced_rules() {
        let rules = namespaced_rules();

        for resource in ["serviceaccounts", "configmaps", "events", "secrets", "services"] {
            assert!(grants(&rules, "", resource, "delete"), "{}", resource);
        }
        assert!(grants(&rules, "apps", "deployments/finalizers", "update"));
        assert!(grants(&rules, "route.openshift.io", "routes/custom-host", "create"));
        assert!(grants(&rules, "coordination.k8s.io", "leases", "update"));
        assert!(!grants(&rules, "coordination.k8s.io", "leases", "delete"));
    }
}
