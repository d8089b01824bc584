//! Lifecycle bundle assembly
//!
//! Builds the `ClusterServiceVersion` that packages the operator for the
//! lifecycle manager. The install strategy embeds the deployment spec and
//! rule sets produced by the resource factories, so the bundle and the
//! `operator-*` groups never disagree.

use cdi_operator_core::naming::{self, labels};
use cdi_operator_core::Config;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::collections::BTreeMap;

use crate::error::{ResourceError, Result};
use crate::olm::{
    ApiResourceReference, AppLink, ClusterServiceVersion, ClusterServiceVersionSpec,
    CrdDescription, CustomResourceDefinitions, Descriptor, Icon, InstallMode, InstallModeType,
    Maintainer, NamedInstallStrategy, StrategyDeploymentPermissions, StrategyDeploymentSpec,
    StrategyDetailsDeployment,
};
use crate::operator::operator_deployment;
use crate::rules::{cluster_rules, namespaced_rules, CdiComponentRules, ClusterRulesProvider};

const DESCRIPTION: &str = "
CDI is a kubernetes extension that provides the ability to populate PVCs with VM images upon creation. Multiple image formats and sources are supported

_The CDI Operator does not support updates yet._
";

const TEXT_DESCRIPTOR: &str = "urn:alm:descriptor:text";

/// Name of the bundle for a given version
pub fn csv_name(csv_version: &str) -> String {
    format!("{}.{}", naming::CSV_NAME_PREFIX, csv_version)
}

fn parse_version(version: &str) -> Result<semver::Version> {
    semver::Version::parse(version).map_err(|source| ResourceError::InvalidVersion {
        version: version.to_string(),
        source,
    })
}

/// Sample operator-config resource advertised in `alm-examples`
pub fn alm_example() -> serde_json::Value {
    serde_json::json!({
        "apiVersion": format!("{}/{}", naming::CDI_GROUP, naming::cdi::VERSION_V1BETA1),
        "kind": naming::cdi::KIND,
        "metadata": {
            "name": "cdi",
            "namespace": "cdi"
        },
        "spec": {
            "imagePullPolicy": "IfNotPresent"
        }
    })
}

fn annotations() -> Result<BTreeMap<String, String>> {
    let examples = serde_json::to_string(&[alm_example()]).map_err(ResourceError::EncodingFailed)?;
    Ok(BTreeMap::from([
        ("capabilities".to_string(), "Full Lifecycle".to_string()),
        ("categories".to_string(), "Storage,Virtualization".to_string()),
        ("alm-examples".to_string(), examples),
        (
            "description".to_string(),
            "Creates and maintains CDI deployments".to_string(),
        ),
    ]))
}

fn owner_labels() -> BTreeMap<String, String> {
    BTreeMap::from([
        (labels::ALM_OWNER.to_string(), naming::OPERATOR_NAME.to_string()),
        (labels::OPERATED_BY.to_string(), naming::OPERATOR_NAME.to_string()),
    ])
}

fn install_modes() -> Vec<InstallMode> {
    InstallModeType::ALL
        .into_iter()
        .map(|type_| InstallMode {
            type_,
            supported: true,
        })
        .collect()
}

fn owned_crd() -> CrdDescription {
    CrdDescription {
        name: naming::cdi::CRD_NAME.to_string(),
        version: naming::cdi::VERSION_V1BETA1.to_string(),
        kind: naming::cdi::KIND.to_string(),
        display_name: "CDI deployment".to_string(),
        description: "Represents a CDI deployment".to_string(),
        resources: vec![ApiResourceReference {
            name: naming::LEADER_ELECTION_CONFIG_MAP.to_string(),
            kind: "ConfigMap".to_string(),
            version: "v1".to_string(),
        }],
        spec_descriptors: vec![
            Descriptor::new(
                "imageRegistry",
                "ImageRegistry",
                "The ImageRegistry to use for the CDI components.",
                TEXT_DESCRIPTOR,
            ),
            Descriptor::new(
                "imageTag",
                "ImageTag",
                "The ImageTag to use for the CDI components.",
                TEXT_DESCRIPTOR,
            ),
            Descriptor::new(
                "imagePullPolicy",
                "ImagePullPolicy",
                "The ImagePullPolicy to use for the CDI components.",
                "urn:alm:descriptor:io.kubernetes:imagePullPolicy",
            ),
        ],
        status_descriptors: vec![
            Descriptor::new(
                "phase",
                "Phase",
                "The deployment phase.",
                "urn:alm:descriptor:io.kubernetes.phase",
            ),
            Descriptor::new(
                "conditions",
                "Conditions",
                "Explanation for the current status of the CDI deployment.",
                "urn:alm:descriptor:io.kubernetes.conditions",
            ),
            Descriptor::new(
                "observedVersion",
                "Observed CDI Version",
                "The observed version of the CDI deployment.",
                TEXT_DESCRIPTOR,
            ),
            Descriptor::new(
                "targetVersion",
                "Target CDI Version",
                "The targeted version of the CDI deployment.",
                TEXT_DESCRIPTOR,
            ),
            Descriptor::new(
                "operatorVersion",
                "CDI Operator Version",
                "The version of the CDI Operator",
                TEXT_DESCRIPTOR,
            ),
        ],
    }
}

/// Install strategy payload: rule sets plus the operator deployment spec
pub fn strategy_details(
    config: &Config,
    rules: &dyn ClusterRulesProvider,
) -> StrategyDetailsDeployment {
    let deployment = operator_deployment(config);

    StrategyDetailsDeployment {
        permissions: vec![StrategyDeploymentPermissions {
            service_account_name: naming::SERVICE_ACCOUNT_NAME.to_string(),
            rules: namespaced_rules(),
        }],
        cluster_permissions: vec![StrategyDeploymentPermissions {
            service_account_name: naming::SERVICE_ACCOUNT_NAME.to_string(),
            rules: cluster_rules(rules),
        }],
        deployments: vec![StrategyDeploymentSpec {
            name: naming::OPERATOR_NAME.to_string(),
            spec: deployment.spec.unwrap_or_default(),
        }],
    }
}

/// Assemble the bundle using the CDI component rules
pub fn create_cluster_service_version(config: &Config) -> Result<ClusterServiceVersion> {
    create_cluster_service_version_with(config, &CdiComponentRules)
}

/// Assemble the bundle with a custom cluster-rules provider
///
/// Fails with `InvalidVersion` when `csv_version` (or a non-empty
/// `replaces_csv_version`) is not a semantic version, and with
/// `EncodingFailed` when the strategy payload cannot be serialized.
pub fn create_cluster_service_version_with(
    config: &Config,
    rules: &dyn ClusterRulesProvider,
) -> Result<ClusterServiceVersion> {
    let version = parse_version(&config.csv_version)?;
    let replaces = match config.replaces_csv_version.as_str() {
        "" => None,
        previous => {
            parse_version(previous)?;
            Some(previous.to_string())
        }
    };

    let install = NamedInstallStrategy::deployment(&strategy_details(config, rules))?;

    let spec = ClusterServiceVersionSpec {
        display_name: "CDI".to_string(),
        description: DESCRIPTION.to_string(),
        keywords: vec![
            "CDI".to_string(),
            "Virtualization".to_string(),
            "Storage".to_string(),
        ],
        version,
        maturity: "alpha".to_string(),
        replaces,
        maintainers: vec![Maintainer {
            name: "KubeVirt project".to_string(),
            email: "kubevirt-dev@googlegroups.com".to_string(),
        }],
        provider: AppLink {
            name: "KubeVirt/CDI project".to_string(),
            url: None,
        },
        links: vec![
            AppLink {
                name: "CDI".to_string(),
                url: Some(
                    "https://github.com/kubevirt/containerized-data-importer/blob/main/README.md"
                        .to_string(),
                ),
            },
            AppLink {
                name: "Source Code".to_string(),
                url: Some("https://github.com/kubevirt/containerized-data-importer".to_string()),
            },
        ],
        icon: vec![Icon {
            data: config.icon_base64.clone(),
            media_type: "image/png".to_string(),
        }],
        labels: owner_labels(),
        selector: LabelSelector {
            match_labels: Some(owner_labels()),
            ..Default::default()
        },
        install_modes: install_modes(),
        install,
        customresourcedefinitions: CustomResourceDefinitions {
            owned: vec![owned_crd()],
        },
    };

    let mut csv = ClusterServiceVersion::new(&csv_name(&config.csv_version), spec);
    csv.metadata = ObjectMeta {
        name: csv.metadata.name.take(),
        namespace: Some(config.namespace.clone()),
        annotations: Some(annotations()?),
        ..Default::default()
    };
    Ok(csv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use k8s_openapi::api::rbac::v1::PolicyRule;

    fn bundle_config() -> Config {
        Config::builder()
            .namespace("ns")
            .csv_version("1.2.3")
            .replaces_csv_version("1.2.2")
            .operator_version("v1.2.3")
            .build()
    }

    struct NoExtraRules;

    impl ClusterRulesProvider for NoExtraRules {
        fn cluster_rules(&self) -> Vec<PolicyRule> {
            Vec::new()
        }
    }

    #[test]
    fn test_bundle_metadata() {
        let csv = create_cluster_service_version(&bundle_config()).unwrap();
        assert_eq!(csv.metadata.name.as_deref(), Some("cdioperator.1.2.3"));
        assert_eq!(csv.metadata.namespace.as_deref(), Some("ns"));

        let annotations = csv.metadata.annotations.unwrap();
        assert_eq!(annotations["capabilities"], "Full Lifecycle");
        assert_eq!(annotations["categories"], "Storage,Virtualization");

        let examples: Vec<serde_json::Value> =
            serde_json::from_str(&annotations["alm-examples"]).unwrap();
        assert_eq!(examples, [alm_example()]);
    }

    #[test]
    fn test_bundle_spec() {
        let csv = create_cluster_service_version(&bundle_config()).unwrap();
        let spec = &csv.spec;

        assert_eq!(spec.version, semver::Version::new(1, 2, 3));
        assert_eq!(spec.replaces.as_deref(), Some("1.2.2"));
        assert_eq!(spec.install_modes.len(), 4);
        assert!(spec.install_modes.iter().all(|m| m.supported));
        assert_eq!(spec.labels, owner_labels());
        assert_eq!(spec.selector.match_labels.as_ref(), Some(&owner_labels()));

        let owned = &spec.customresourcedefinitions.owned;
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].name, "cdis.cdi.kubevirt.io");
        assert_eq!(owned[0].version, "v1beta1");
        assert_eq!(owned[0].kind, "CDI");
        assert_eq!(owned[0].spec_descriptors.len(), 3);
        assert_eq!(owned[0].status_descriptors.len(), 5);
    }

    #[test]
    fn test_replaces_omitted_when_empty() {
        let config = Config::builder().csv_version("1.0.0").build();
        let csv = create_cluster_service_version(&config).unwrap();
        assert!(csv.spec.replaces.is_none());

        let json = serde_json::to_value(&csv).unwrap();
        assert!(json["spec"].get("replaces").is_none());
        assert_eq!(json["spec"]["version"], "1.0.0");
        assert_eq!(json["kind"], "ClusterServiceVersion");
    }

    #[test]
    fn test_invalid_versions() {
        let config = Config::builder().csv_version("not-a-version").build();
        let err = create_cluster_service_version(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidVersion);

        let config = Config::builder()
            .csv_version("1.0.0")
            .replaces_csv_version("0.9")
            .build();
        let err = create_cluster_service_version(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidVersion);
        assert!(err.to_string().contains("0.9"));
    }

    #[test]
    fn test_strategy_uses_rules_provider() {
        let config = bundle_config();
        let default = strategy_details(&config, &CdiComponentRules);
        let bare = strategy_details(&config, &NoExtraRules);

        let extra = CdiComponentRules.cluster_rules().len();
        assert_eq!(
            default.cluster_permissions[0].rules.len(),
            bare.cluster_permissions[0].rules.len() + extra
        );
        assert_eq!(default.permissions, bare.permissions);
        assert_eq!(default.deployments, bare.deployments);
    }

    #[test]
    fn test_strategy_payload_decodes_to_deployment_spec() {
        let config = bundle_config();
        let csv = create_cluster_service_version(&config).unwrap();
        assert_eq!(csv.spec.install.strategy, "deployment");

        let details = csv.spec.install.decode_deployment().unwrap();
        assert_eq!(details.deployments.len(), 1);
        assert_eq!(details.deployments[0].name, "cdi-operator");
        assert_eq!(
            Some(details.deployments[0].spec.clone()),
            operator_deployment(&config).spec
        );
        assert_eq!(details.permissions[0].service_account_name, "cdi-operator");
    }
}
