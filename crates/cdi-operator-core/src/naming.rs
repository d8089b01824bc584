//! Names, label keys and API coordinates shared by every emitted object
//!
//! Everything the operator installs is named from the `cdi` vendor prefix.
//! Keeping the constants in one place lets the resource factories and the
//! lifecycle bundle agree on names without a second source of truth.

use std::collections::BTreeMap;

/// Vendor prefix used for all operator object names
pub const VENDOR_PREFIX: &str = "cdi";

/// Name of the operator deployment, service account and container
pub const OPERATOR_NAME: &str = "cdi-operator";

/// Service account the operator runs as
pub const SERVICE_ACCOUNT_NAME: &str = OPERATOR_NAME;

/// Namespaced role granted to the operator
pub const ROLE_NAME: &str = OPERATOR_NAME;

/// Cluster role granted to the operator
pub const CLUSTER_ROLE_NAME: &str = "cdi-operator-cluster";

/// Config map the operator uses for leader election
pub const LEADER_ELECTION_CONFIG_MAP: &str = "cdi-operator-leader-election-helper";

/// Prefix of the lifecycle bundle name (`cdioperator.<version>`)
pub const CSV_NAME_PREFIX: &str = "cdioperator";

/// Label selecting the operator pods
pub const OPERATOR_SELECTOR_KEY: &str = "name";

/// API group of the operator configuration resource
pub const CDI_GROUP: &str = "cdi.kubevirt.io";

/// API group served by the upload proxy
pub const UPLOAD_GROUP: &str = "upload.cdi.kubevirt.io";

/// Operator configuration resource naming
pub mod cdi {
    pub const KIND: &str = "CDI";
    pub const LIST_KIND: &str = "CDIList";
    pub const PLURAL: &str = "cdis";
    pub const SINGULAR: &str = "cdi";
    pub const SHORT_NAMES: [&str; 2] = ["cdi", "cdis"];
    /// Fully qualified CRD name (`<plural>.<group>`)
    pub const CRD_NAME: &str = "cdis.cdi.kubevirt.io";
    /// Name of the status schema supplied to the status provider
    pub const STATUS_NAME: &str = "CDIStatus";
    /// Older served version
    pub const VERSION_V1ALPHA1: &str = "v1alpha1";
    /// Served storage version
    pub const VERSION_V1BETA1: &str = "v1beta1";
}

/// Label keys
pub mod labels {
    /// Carried by every object the operator installs
    pub const OPERATOR: &str = "operator.cdi.kubevirt.io";
    /// Carried by every object the operator manages on behalf of CDI
    pub const CDI: &str = "cdi.kubevirt.io";
    /// Marks pods that expose metrics
    pub const PROMETHEUS: &str = "prometheus.cdi.kubevirt.io";
    pub const PROMETHEUS_VALUE: &str = "true";
    pub const MANAGED_BY: &str = "app.kubernetes.io/managed-by";
    pub const COMPONENT: &str = "app.kubernetes.io/component";
    /// Lifecycle-manager ownership label
    pub const ALM_OWNER: &str = "alm-owner-cdi";
    pub const OPERATED_BY: &str = "operated-by";
}

/// Labels applied to every object the operator itself needs to run
pub fn operator_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(labels::OPERATOR.to_string(), String::new())])
}

/// Labels applied to CDI component objects created by the operator
pub fn common_labels() -> BTreeMap<String, String> {
    BTreeMap::from([
        (labels::CDI.to_string(), String::new()),
        (labels::MANAGED_BY.to_string(), OPERATOR_NAME.to_string()),
        (labels::COMPONENT.to_string(), "storage".to_string()),
    ])
}

/// Merge `existing` into `labels` without overwriting keys already in `labels`
pub fn with_labels(
    mut labels: BTreeMap<String, String>,
    existing: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    for (key, value) in existing {
        labels.entry(key.clone()).or_insert_with(|| value.clone());
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_label_is_empty_valued() {
        let labels = operator_labels();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels.get(labels::OPERATOR).map(String::as_str), Some(""));
    }

    #[test]
    fn test_with_labels_keeps_existing_keys() {
        let own = BTreeMap::from([("name".to_string(), "cdi-operator".to_string())]);
        let extra = BTreeMap::from([
            ("name".to_string(), "other".to_string()),
            ("tier".to_string(), "infra".to_string()),
        ]);

        let merged = with_labels(own, &extra);
        assert_eq!(merged["name"], "cdi-operator");
        assert_eq!(merged["tier"], "infra");
    }

    #[test]
    fn test_crd_name_matches_plural_and_group() {
        assert_eq!(cdi::CRD_NAME, format!("{}.{}", cdi::PLURAL, CDI_GROUP));
    }
}
